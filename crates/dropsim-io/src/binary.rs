//! Binary mesh format.
//!
//! ```text
//! offset  size  field
//! 0       8     magic "DSMESH\0\0"
//! 8       4     version (u32)
//! 12      4     node count (u32)
//! 16      4     element count (u32)
//! 20      1     index base (u8, 0 or 1)
//! 21      24·n  positions (f64 x, y, z per node)
//! ..      16·e  connectivity (u32 × 4 per element)
//! ..      2·e   material ids (u16 per element)
//! ```
//!
//! All values are little-endian. Arrays follow the header without
//! padding, so they are decoded by copying into aligned buffers.

use dropsim_mesh::{IndexBase, TetMesh};
use dropsim_types::{DropError, DropResult};

pub const MAGIC: &[u8; 8] = b"DSMESH\0\0";
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 21;

/// Decoded header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub node_count: u32,
    pub element_count: u32,
    pub index_base: IndexBase,
}

impl Header {
    /// Total encoded length implied by the counts.
    ///
    /// Fails with `InvalidMesh` when the counts describe more bytes than
    /// the address space can hold.
    pub fn encoded_len(&self) -> DropResult<usize> {
        let n = self.node_count as usize;
        let e = self.element_count as usize;
        n.checked_mul(24)
            .zip(e.checked_mul(18))
            .and_then(|(nodes, elements)| nodes.checked_add(elements))
            .and_then(|body| body.checked_add(HEADER_LEN))
            .ok_or_else(|| {
                DropError::InvalidMesh(format!(
                    "Binary mesh header counts overflow ({} nodes, {} elements)",
                    self.node_count, self.element_count
                ))
            })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Parses and checks the header.
pub fn read_header(bytes: &[u8]) -> DropResult<Header> {
    if bytes.len() < HEADER_LEN {
        return Err(DropError::InvalidMesh(format!(
            "Binary mesh is {} bytes, shorter than its {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    if &bytes[..8] != MAGIC {
        return Err(DropError::InvalidMesh("Not a DSMESH file (bad magic)".into()));
    }
    let version = read_u32(bytes, 8);
    if version != VERSION {
        return Err(DropError::InvalidMesh(format!(
            "Unsupported DSMESH version {version} (expected {VERSION})"
        )));
    }
    Ok(Header {
        version,
        node_count: read_u32(bytes, 12),
        element_count: read_u32(bytes, 16),
        index_base: IndexBase::from_u8(bytes[20])?,
    })
}

/// Decodes a binary mesh into a validated, 0-based [`TetMesh`].
pub fn decode(bytes: &[u8]) -> DropResult<TetMesh> {
    let header = read_header(bytes)?;
    let expected = header.encoded_len()?;
    if bytes.len() != expected {
        return Err(DropError::InvalidMesh(format!(
            "Binary mesh length {} does not match header ({expected} bytes for {} nodes, {} elements)",
            bytes.len(),
            header.node_count,
            header.element_count
        )));
    }

    let n = header.node_count as usize;
    let e = header.element_count as usize;
    let (positions, rest) = bytes[HEADER_LEN..].split_at(24 * n);
    let (connectivity, material_ids) = rest.split_at(16 * e);

    let positions: Vec<f64> = bytemuck::pod_collect_to_vec::<u8, u64>(positions)
        .into_iter()
        .map(|bits| f64::from_bits(u64::from_le(bits)))
        .collect();
    let connectivity: Vec<u32> = bytemuck::pod_collect_to_vec::<u8, u32>(connectivity)
        .into_iter()
        .map(u32::from_le)
        .collect();
    let material_ids: Vec<u16> = bytemuck::pod_collect_to_vec::<u8, u16>(material_ids)
        .into_iter()
        .map(u16::from_le)
        .collect();

    TetMesh::from_interleaved(&positions, &connectivity, &material_ids, header.index_base)
}

/// Encodes `mesh`, writing connectivity counted from `base`.
pub fn encode(mesh: &TetMesh, base: IndexBase) -> Vec<u8> {
    let header = Header {
        version: VERSION,
        node_count: mesh.node_count() as u32,
        element_count: mesh.element_count() as u32,
        index_base: base,
    };
    let mut out = Vec::with_capacity(header.encoded_len().unwrap_or_default());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&header.version.to_le_bytes());
    out.extend_from_slice(&header.node_count.to_le_bytes());
    out.extend_from_slice(&header.element_count.to_le_bytes());
    out.push(base.as_u8());

    let positions: Vec<u64> = (0..mesh.node_count())
        .flat_map(|i| {
            let p = mesh.position(i);
            [p.x, p.y, p.z]
        })
        .map(|v| v.to_bits().to_le())
        .collect();
    out.extend_from_slice(bytemuck::cast_slice(&positions));

    let offset = base.offset();
    let connectivity: Vec<u32> = mesh
        .elements
        .iter()
        .flatten()
        .map(|&n| (n + offset).to_le())
        .collect();
    out.extend_from_slice(bytemuck::cast_slice(&connectivity));

    let material_ids: Vec<u16> = mesh.material_ids.iter().map(|m| m.0.to_le()).collect();
    out.extend_from_slice(bytemuck::cast_slice(&material_ids));
    out
}
