//! Integration tests for dropsim-io.

use approx::assert_relative_eq;
use dropsim_io::binary::{self, MAGIC};
use dropsim_io::{
    load_mesh, save_mesh, validate_request, validate_request_for_mesh, DropSpec, JsonMesh, MaterialSpec,
    PreparedRun, SensorSpec, SimulationRequest,
};
use dropsim_material::{Material, MaterialLibrary};
use dropsim_math::DVec3;
use dropsim_mesh::generators::box_mesh;
use dropsim_mesh::{IndexBase, TetMesh};
use dropsim_solver::{IntegratorStatus, Orientation};
use dropsim_types::constants::STANDARD_GRAVITY;
use dropsim_types::{DropError, Length, MaterialId};

fn cube() -> TetMesh {
    box_mesh([2; 3], DVec3::splat(0.05), DVec3::ZERO, MaterialId(0))
}

fn steel_request() -> SimulationRequest {
    SimulationRequest::new(
        DropSpec {
            height: Length::inches(12.0),
            orientation: Orientation::FlatFace,
            surface: Default::default(),
        },
        vec![MaterialSpec::Preset {
            preset: "steel".into(),
        }],
    )
}

const REQUEST_TOML: &str = r#"
name = "corner drop"
materials = [
    { preset = "pu_foam" },
    { model = "linear_elastic", youngs_modulus = 5.0e7, poisson_ratio = 0.3, density = 1200.0 },
]
snapshot_times = [0.002, 0.004]

[drop]
height = { value = 30.0, unit = "inches" }
orientation = { kind = "corner" }
surface = "concrete"

[solver]
duration = 0.01

[contact]
damping = 50.0

[[sensors]]
kind = "material"
name = "product"
material = 1
"#;

// ─── Binary Mesh Tests ────────────────────────────────────────

#[test]
fn binary_one_based_roundtrip() {
    let mesh = cube();
    let bytes = binary::encode(&mesh, IndexBase::One);
    assert_eq!(&bytes[..8], MAGIC);
    assert_eq!(bytes[20], 1);

    let header = binary::read_header(&bytes).unwrap();
    assert_eq!(header.node_count as usize, mesh.node_count());
    assert_eq!(header.encoded_len().unwrap(), bytes.len());

    let decoded = binary::decode(&bytes).unwrap();
    assert_eq!(decoded.elements, mesh.elements);
    assert_eq!(decoded.material_ids, mesh.material_ids);
    assert_eq!(decoded.pos_y, mesh.pos_y);
}

#[test]
fn binary_rejects_bad_magic() {
    let mut bytes = binary::encode(&cube(), IndexBase::Zero);
    bytes[0] = b'X';
    assert!(matches!(binary::decode(&bytes), Err(DropError::InvalidMesh(_))));
}

#[test]
fn binary_rejects_truncated_input() {
    let bytes = binary::encode(&cube(), IndexBase::Zero);
    assert!(binary::decode(&bytes[..bytes.len() - 1]).is_err());
    assert!(binary::decode(&bytes[..10]).is_err());
}

#[test]
fn binary_rejects_unknown_version() {
    let mut bytes = binary::encode(&cube(), IndexBase::Zero);
    bytes[8..12].copy_from_slice(&7u32.to_le_bytes());
    let err = binary::decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("version"));
}

fn header_only(node_count: u32, element_count: u32) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&binary::VERSION.to_le_bytes());
    bytes.extend_from_slice(&node_count.to_le_bytes());
    bytes.extend_from_slice(&element_count.to_le_bytes());
    bytes.push(0);
    bytes
}

#[test]
fn binary_rejects_huge_counts_without_panicking() {
    let bytes = header_only(u32::MAX, u32::MAX);
    let header = binary::read_header(&bytes).unwrap();
    match header.encoded_len() {
        // 64-bit targets can represent the length; it just never matches.
        Ok(len) => assert_eq!(len, 21 + 24 * u32::MAX as usize + 18 * u32::MAX as usize),
        Err(err) => assert!(matches!(err, DropError::InvalidMesh(_))),
    }
    assert!(matches!(binary::decode(&bytes), Err(DropError::InvalidMesh(_))));
}

#[cfg(target_pointer_width = "32")]
#[test]
fn binary_counts_overflowing_usize_are_invalid_mesh() {
    let header = binary::read_header(&header_only(u32::MAX, 0)).unwrap();
    assert!(matches!(header.encoded_len(), Err(DropError::InvalidMesh(_))));
}

#[test]
fn binary_rejects_bad_index_base() {
    let mut bytes = binary::encode(&cube(), IndexBase::Zero);
    bytes[20] = 2;
    assert!(binary::decode(&bytes).is_err());
}

// ─── JSON Mesh Tests ──────────────────────────────────────────

#[test]
fn json_mesh_requires_index_base() {
    let json = r#"{"positions":[[0,0,0]],"elements":[],"material_ids":[]}"#;
    assert!(matches!(JsonMesh::parse(json), Err(DropError::Serialization(_))));
}

#[test]
fn json_mesh_one_based_converts_to_zero_based() {
    let json = r#"{
        "index_base": 1,
        "positions": [[0,0,0],[1,0,0],[0,1,0],[0,0,1]],
        "elements": [[1,2,3,4]],
        "material_ids": [0]
    }"#;
    let mesh = JsonMesh::parse(json).unwrap().to_mesh().unwrap();
    assert_eq!(mesh.elements, vec![[0, 1, 2, 3]]);
}

#[test]
fn json_mesh_one_based_rejects_index_zero() {
    let json = r#"{
        "index_base": 1,
        "positions": [[0,0,0],[1,0,0],[0,1,0],[0,0,1]],
        "elements": [[0,1,2,3]],
        "material_ids": [0]
    }"#;
    assert!(matches!(
        JsonMesh::parse(json).unwrap().to_mesh(),
        Err(DropError::InvalidMesh(_))
    ));
}

#[test]
fn load_and_save_choose_codec_by_extension() {
    let dir = std::env::temp_dir().join(format!("dropsim-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let mesh = cube();

    for name in ["cube.json", "cube.dsmesh"] {
        let path = dir.join(name);
        save_mesh(&path, &mesh).unwrap();
        let loaded = load_mesh(&path).unwrap();
        assert_eq!(loaded.elements, mesh.elements);
    }
    let json = std::fs::read_to_string(dir.join("cube.json")).unwrap();
    assert!(json.contains("\"index_base\":0"));
    std::fs::remove_dir_all(&dir).unwrap();
}

// ─── Request Contract Tests ───────────────────────────────────

#[test]
fn toml_request_parses_units_and_defaults() {
    let request = SimulationRequest::from_toml_str(REQUEST_TOML).unwrap();
    assert_eq!(request.name, "corner drop");
    assert_relative_eq!(request.drop_spec.height.to_meters(), 0.762, max_relative = 1e-12);
    assert_eq!(request.drop_spec.orientation, Orientation::Corner);
    assert_eq!(request.gravity, STANDARD_GRAVITY);
    assert_eq!(request.contact.damping, 50.0);
    assert_eq!(request.solver.duration, 0.01);
    assert!(request.solver.timestep.is_none());

    let table = request.material_table(&MaterialLibrary::with_defaults()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.get(MaterialId(1)),
        Some(&Material::linear_elastic(5.0e7, 0.3, 1200.0))
    );
}

#[test]
fn request_json_roundtrip() {
    let request = SimulationRequest::from_toml_str(REQUEST_TOML).unwrap();
    let back = SimulationRequest::from_json_str(&request.to_json().unwrap()).unwrap();
    assert_eq!(back, request);
}

#[test]
fn request_toml_roundtrip() {
    let request = steel_request();
    let back = SimulationRequest::from_toml_str(&request.to_toml().unwrap()).unwrap();
    assert_eq!(back, request);
}

#[test]
fn solver_config_carries_request_gravity() {
    let mut request = steel_request();
    request.gravity = 1.62;
    let config = request.solver_config();
    assert_eq!(config.gravity, DVec3::new(0.0, -1.62, 0.0));
    assert_eq!(request.drop_setup().gravity, 1.62);
}

#[test]
fn missing_sensors_default_to_whole_body() {
    let mesh = cube();
    let sensors = steel_request().sensor_sets(&mesh);
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].nodes.len(), mesh.node_count());
}

// ─── Validation Tests ─────────────────────────────────────────

#[test]
fn valid_request_passes() {
    let library = MaterialLibrary::with_defaults();
    assert!(validate_request(&steel_request(), &library).is_ok());
    let request = SimulationRequest::from_toml_str(REQUEST_TOML).unwrap();
    assert!(validate_request(&request, &library).is_ok());
}

#[test]
fn validation_rejects_out_of_range_values() {
    let library = MaterialLibrary::with_defaults();

    let mut request = steel_request();
    request.drop_spec.height = Length::meters(-0.1);
    assert!(matches!(
        validate_request(&request, &library),
        Err(DropError::InvalidConfig(_))
    ));

    let mut request = steel_request();
    request.gravity = 0.0;
    assert!(validate_request(&request, &library).is_err());

    let mut request = steel_request();
    request.solver.duration = 60.0;
    assert!(validate_request(&request, &library).is_err());

    let mut request = steel_request();
    request.solver.timestep = Some(1.0);
    assert!(validate_request(&request, &library).is_err());

    let mut request = steel_request();
    request.snapshot_times = vec![0.01, 1.0];
    assert!(validate_request(&request, &library).is_err());

    let mut request = steel_request();
    request.contact.stiffness = Some(-1.0);
    assert!(validate_request(&request, &library).is_err());
}

#[test]
fn validation_rejects_bad_materials() {
    let library = MaterialLibrary::with_defaults();

    let mut request = steel_request();
    request.materials = vec![MaterialSpec::Preset {
        preset: "unobtainium".into(),
    }];
    assert!(matches!(
        validate_request(&request, &library),
        Err(DropError::InvalidMaterial(_))
    ));

    let mut request = steel_request();
    request.materials.clear();
    assert!(validate_request(&request, &library).is_err());

    let mut request = steel_request();
    request.materials = vec![MaterialSpec::Model(Material::linear_elastic(2.0e11, 0.5, 7850.0))];
    assert!(validate_request(&request, &library).is_err());
}

#[test]
fn validation_rejects_duplicate_sensor_names() {
    let mut request = steel_request();
    request.sensors = vec![
        SensorSpec::WholeBody { name: "a".into() },
        SensorSpec::Nodes {
            name: "a".into(),
            nodes: vec![0],
        },
    ];
    assert!(validate_request(&request, &MaterialLibrary::with_defaults()).is_err());
}

#[test]
fn mesh_validation_checks_materials_and_sensors() {
    let library = MaterialLibrary::with_defaults();
    let mesh = cube();
    assert!(validate_request_for_mesh(&steel_request(), &mesh, &library).is_ok());

    let two_materials = box_mesh([1; 3], DVec3::splat(0.05), DVec3::ZERO, MaterialId(1));
    assert!(matches!(
        validate_request_for_mesh(&steel_request(), &two_materials, &library),
        Err(DropError::InvalidMaterial(_))
    ));

    let mut request = steel_request();
    request.sensors = vec![SensorSpec::Nodes {
        name: "far".into(),
        nodes: vec![10_000],
    }];
    assert!(validate_request_for_mesh(&request, &mesh, &library).is_err());
}

// ─── Preparation Tests ────────────────────────────────────────

#[test]
fn prepare_places_body_on_the_surface() {
    let mut request = steel_request();
    request.drop_spec.orientation = Orientation::Edge;
    let mesh = box_mesh([1; 3], DVec3::splat(0.0508), DVec3::new(3.0, 5.0, 0.0), MaterialId(0));
    let run = PreparedRun::prepare(&request, &mesh, &MaterialLibrary::with_defaults()).unwrap();

    let (min, _) = run.mesh.bounding_box();
    assert!(min.y.abs() < 1e-12);
    let expected = (2.0 * STANDARD_GRAVITY * 0.3048).sqrt();
    assert_relative_eq!(run.impact_speed, expected, max_relative = 1e-12);
    assert_relative_eq!(run.initial_velocity.y, -expected, max_relative = 1e-12);
    assert_eq!(run.sensors.len(), 1);
    assert_eq!(run.element_count(), mesh.element_count());

    let integrator = run.integrator().unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Initialized);
    assert!(run.recorder().is_ok());
}

#[test]
fn prepare_rejects_invalid_request() {
    let mut request = steel_request();
    request.drop_spec.height = Length::meters(500.0);
    assert!(PreparedRun::prepare(&request, &cube(), &MaterialLibrary::with_defaults()).is_err());
}
