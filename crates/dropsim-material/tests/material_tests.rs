//! Integration tests for dropsim-material.

use approx::assert_relative_eq;
use dropsim_material::{
    cauchy_stress, strain_energy_density, ConstitutiveLaw, CrushableFoam, LinearElastic, Material,
    MaterialLibrary, MaterialTable, OgdenHyperfoam,
};
use dropsim_math::{DMat3, DQuat, DVec3};
use dropsim_types::constants::PASCALS_PER_PSI;
use dropsim_types::{DropError, MaterialId};

fn cushion_foam() -> Material {
    Material::ogden(15.0 * PASCALS_PER_PSI, 3.5, 0.0, 32.0)
}

fn compress_y(lambda: f64) -> DMat3 {
    DMat3::from_diagonal(DVec3::new(1.0, lambda, 1.0))
}

// ─── Linear Elastic Tests ─────────────────────────────────────

#[test]
fn linear_uniaxial_strain() {
    let steel = Material::linear_elastic(2.0e11, 0.3, 7850.0);
    let f = DMat3::from_diagonal(DVec3::new(1.001, 1.0, 1.0));
    let sigma = cauchy_stress(&steel, &f).unwrap();
    let (lambda, _) = LinearElastic::new(2.0e11, 0.3, 7850.0).lame();
    assert_relative_eq!(sigma.x_axis.x, steel.effective_modulus() * 1e-3, max_relative = 1e-9);
    assert_relative_eq!(sigma.y_axis.y, lambda * 1e-3, max_relative = 1e-9);
    assert_relative_eq!(sigma.x_axis.y, 0.0);
}

#[test]
fn linear_p_wave_modulus() {
    let steel = Material::linear_elastic(2.0e11, 0.3, 7850.0);
    assert_relative_eq!(steel.effective_modulus(), 2.0e11 * 0.7 / (1.3 * 0.4), max_relative = 1e-12);
    assert_relative_eq!(steel.wave_speed(), (steel.effective_modulus() / 7850.0).sqrt());
}

#[test]
fn linear_shear_is_symmetric() {
    let m = Material::linear_elastic(1.0e6, 0.25, 1000.0);
    let mut f = DMat3::IDENTITY;
    f.y_axis.x = 0.01;
    let sigma = cauchy_stress(&m, &f).unwrap();
    assert_relative_eq!(sigma.y_axis.x, sigma.x_axis.y);
    assert!(sigma.y_axis.x > 0.0);
}

// ─── Ogden Hyperfoam Tests ────────────────────────────────────

#[test]
fn ogden_uniaxial_compression_matches_closed_form() {
    let foam = cushion_foam();
    let mu = 15.0 * PASCALS_PER_PSI;
    let alpha: f64 = 3.5;
    let lambda: f64 = 0.5;
    let expected = 2.0 * mu / alpha * (lambda.powf(alpha) - 1.0) / lambda;

    let sigma = cauchy_stress(&foam, &compress_y(lambda)).unwrap();
    assert!(sigma.y_axis.y < 0.0);
    assert!((sigma.y_axis.y - expected).abs() / expected.abs() < 0.01);

    let Material::OgdenHyperfoam(law) = &foam else {
        unreachable!()
    };
    assert_relative_eq!(sigma.y_axis.y, law.uniaxial_strain_stress(lambda), max_relative = 1e-12);
}

#[test]
fn ogden_zero_beta_has_no_lateral_stress() {
    let sigma = cauchy_stress(&cushion_foam(), &compress_y(0.6)).unwrap();
    assert!(sigma.x_axis.x.abs() < 1e-6);
    assert!(sigma.z_axis.z.abs() < 1e-6);
}

#[test]
fn ogden_is_stress_free_at_rest() {
    let sigma = cauchy_stress(&cushion_foam(), &DMat3::IDENTITY).unwrap();
    assert!(sigma.abs_diff_eq(DMat3::ZERO, 1e-9));
    assert_relative_eq!(strain_energy_density(&cushion_foam(), &DMat3::IDENTITY).unwrap(), 0.0);
}

#[test]
fn ogden_is_objective() {
    let foam = Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![1.2e4, 3.0e3],
        alpha: vec![4.0, 8.0],
        beta: vec![0.1, 0.05],
        density: 40.0,
    });
    let stretch = DMat3::from_diagonal(DVec3::new(0.9, 0.7, 1.05));
    let r = DMat3::from_quat(DQuat::from_rotation_y(0.4) * DQuat::from_rotation_x(-0.3));
    let base = cauchy_stress(&foam, &stretch).unwrap();
    let rotated = cauchy_stress(&foam, &(r * stretch)).unwrap();
    let expected = r * base * r.transpose();
    assert!(rotated.abs_diff_eq(expected, 1e-6 * base.y_axis.y.abs()));
}

#[test]
fn ogden_energy_derivative_is_stress() {
    let foam = cushion_foam();
    let lambda = 0.55;
    let h = 1e-6;
    let w = |l: f64| strain_energy_density(&foam, &compress_y(l)).unwrap();
    let dw = (w(lambda + h) - w(lambda - h)) / (2.0 * h);
    // Laterally confined: nominal = Cauchy
    let sigma = cauchy_stress(&foam, &compress_y(lambda)).unwrap();
    assert_relative_eq!(dw, sigma.y_axis.y, max_relative = 1e-5);
}

#[test]
fn ogden_effective_modulus() {
    let foam = cushion_foam();
    assert_relative_eq!(foam.effective_modulus(), 2.0 * 15.0 * PASCALS_PER_PSI);
}

// ─── Crushable Foam Tests ─────────────────────────────────────

#[test]
fn crushable_plateau() {
    let foam = CrushableFoam::new(5.0e6, 1.2e5, 25.0);
    assert_relative_eq!(foam.compressive_stress(0.01), 5.0e4);
    assert_relative_eq!(foam.compressive_stress(0.5), 1.2e5);
    assert!(foam.compressive_stress(0.9) > 1.2e5);

    let sigma = foam.cauchy_stress(&compress_y(0.5), 0.5);
    assert_relative_eq!(sigma.y_axis.y, -1.2e5, max_relative = 1e-9);
    assert!(sigma.x_axis.x.abs() < 1e-6);
}

#[test]
fn crushable_energy_is_continuous() {
    let foam = CrushableFoam::new(5.0e6, 1.2e5, 25.0);
    let ey = foam.yield_strain();
    let ed = foam.densification_strain;
    for eps in [ey, ed] {
        let below = foam.compressive_energy(eps - 1e-9);
        let above = foam.compressive_energy(eps + 1e-9);
        assert_relative_eq!(below, above, max_relative = 1e-6);
    }
    assert_relative_eq!(
        foam.compressive_energy(0.5),
        0.5 * 1.2e5 * ey + 1.2e5 * (0.5 - ey),
        max_relative = 1e-12
    );
}

#[test]
fn crushable_tension_is_linear() {
    let foam = Material::crushable_foam(5.0e6, 1.2e5, 25.0);
    let sigma = cauchy_stress(&foam, &compress_y(1.01)).unwrap();
    // τ = k·0.01·λ, σ = τ/J with J = λ
    assert_relative_eq!(sigma.y_axis.y, 5.0e4, max_relative = 1e-9);
}

// ─── Failure Tests ────────────────────────────────────────────

#[test]
fn inverted_element_is_material_failure() {
    let f = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -0.5));
    for m in [
        cushion_foam(),
        Material::linear_elastic(1e6, 0.3, 1000.0),
        Material::crushable_foam(5.0e6, 1.2e5, 25.0),
    ] {
        assert!(matches!(
            cauchy_stress(&m, &f),
            Err(DropError::MaterialFailure { element: None, .. })
        ));
    }
}

#[test]
fn nan_gradient_is_material_failure() {
    let f = DMat3::from_diagonal(DVec3::new(f64::NAN, 1.0, 1.0));
    let err = cauchy_stress(&cushion_foam(), &f).unwrap_err().at_element(7);
    assert!(matches!(err, DropError::MaterialFailure { element: Some(7), .. }));
}

// ─── Validation Tests ─────────────────────────────────────────

#[test]
fn rejects_out_of_range_parameters() {
    let bad = [
        Material::linear_elastic(-1.0, 0.3, 1000.0),
        Material::linear_elastic(1e6, 0.5, 1000.0),
        Material::linear_elastic(1e6, -0.1, 1000.0),
        Material::linear_elastic(1e6, 0.3, 0.0),
        Material::ogden(0.0, 3.5, 0.0, 32.0),
        Material::ogden(1e5, 0.0, 0.0, 32.0),
        Material::ogden(1e5, 3.5, -0.1, 32.0),
        Material::crushable_foam(5.0e6, 0.0, 25.0),
        Material::CrushableFoam(CrushableFoam::new(5.0e6, 1.2e5, 25.0).with_densification_strain(1.0)),
    ];
    for m in &bad {
        assert!(
            matches!(m.validate(), Err(DropError::InvalidMaterial(_))),
            "{m:?} should be rejected"
        );
    }
}

#[test]
fn accepts_zero_poisson_ratio() {
    assert!(Material::linear_elastic(1e6, 0.0, 1000.0).validate().is_ok());
}

#[test]
fn ogden_terms_may_carry_negative_mu() {
    // Two-term fit with a softening term of opposite sign.
    let fit = Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![2.0e5, -1.0e4],
        alpha: vec![4.0, -2.0],
        beta: vec![0.0, 0.0],
        density: 32.0,
    });
    assert!(fit.validate().is_ok());
    let sigma = cauchy_stress(&fit, &compress_y(0.7)).unwrap();
    assert!(sigma.y_axis.y < 0.0);
}

#[test]
fn rejects_ogden_term_with_mismatched_signs() {
    let fit = Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![2.0e5, -1.0e4],
        alpha: vec![4.0, 2.0],
        beta: vec![0.0, 0.0],
        density: 32.0,
    });
    let err = fit.validate().unwrap_err();
    assert!(err.to_string().contains("share a sign"));
}

#[test]
fn rejects_ogden_fit_with_negative_shear_modulus() {
    let fit = Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![1.0e4, -2.0e4],
        alpha: vec![2.0, -2.0],
        beta: vec![0.0, 0.0],
        density: 32.0,
    });
    let err = fit.validate().unwrap_err();
    assert!(err.to_string().contains("shear modulus"));
}

#[test]
fn rejects_mismatched_ogden_lists() {
    let foam = Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![1e5, 2e4],
        alpha: vec![3.5],
        beta: vec![0.0, 0.0],
        density: 32.0,
    });
    let err = foam.validate().unwrap_err();
    assert!(err.to_string().contains("differ in length"));
}

#[test]
fn material_json_uses_model_tag() {
    let json = r#"{"model":"ogden_hyperfoam","mu":[103421.36],"alpha":[3.5],"beta":[0.0],"density":32.0}"#;
    let foam: Material = serde_json::from_str(json).unwrap();
    assert_eq!(foam.model_name(), "ogden_hyperfoam");
    assert!(foam.validate().is_ok());

    let crush = r#"{"model":"crushable_foam","modulus":5e6,"plateau_stress":1.2e5,"density":25.0}"#;
    let Material::CrushableFoam(c) = serde_json::from_str::<Material>(crush).unwrap() else {
        panic!("wrong variant");
    };
    assert_relative_eq!(c.densification_strain, 0.8);
}

// ─── MaterialTable Tests ──────────────────────────────────────

#[test]
fn table_lookup_and_assignment_check() {
    let mut table = MaterialTable::default();
    let foam = table.push(cushion_foam());
    let product = table.push(Material::linear_elastic(5.0e7, 0.3, 1000.0));
    assert_eq!(foam, MaterialId(0));
    assert_eq!(product, MaterialId(1));
    assert!(table.validate().is_ok());
    assert!(table.validate_assignments(&[MaterialId(0), MaterialId(1)]).is_ok());
    assert!(matches!(
        table.validate_assignments(&[MaterialId(0), MaterialId(2)]),
        Err(DropError::InvalidMaterial(_))
    ));
    assert!(table.get(MaterialId(5)).is_none());
}

#[test]
fn table_reports_offending_material() {
    let table = MaterialTable::new(vec![
        cushion_foam(),
        Material::linear_elastic(1e6, 0.7, 1000.0),
    ]);
    let msg = table.validate().unwrap_err().to_string();
    assert!(msg.contains("material 1"));
}

#[test]
fn softest_modulus_ignores_unused_materials() {
    let table = MaterialTable::new(vec![
        Material::linear_elastic(2.0e11, 0.3, 7850.0),
        cushion_foam(),
    ]);
    let steel_only = table.softest_modulus(&[MaterialId(0)]).unwrap();
    let both = table.softest_modulus(&[MaterialId(0), MaterialId(1)]).unwrap();
    assert!(steel_only > 1e11);
    assert_relative_eq!(both, 2.0 * 15.0 * PASCALS_PER_PSI);
}

#[test]
fn empty_table_is_invalid() {
    assert!(MaterialTable::default().validate().is_err());
}

// ─── MaterialLibrary Tests ────────────────────────────────────

#[test]
fn default_library_presets() {
    let lib = MaterialLibrary::with_defaults();
    assert_eq!(lib.len(), 7);
    assert_eq!(
        lib.names(),
        vec!["abs", "aluminium", "corrugated_board", "eps_foam", "pe_foam", "pu_foam", "steel"]
    );
    for name in lib.names() {
        assert!(lib.get(name).unwrap().validate().is_ok(), "{name}");
    }
}

#[test]
fn custom_material_overrides() {
    let mut lib = MaterialLibrary::empty();
    assert!(lib.is_empty());
    lib.register("steel", Material::linear_elastic(1.0, 0.3, 1.0));
    lib.register("steel", Material::linear_elastic(2.0e11, 0.3, 7850.0));
    assert_eq!(lib.len(), 1);
    assert_eq!(lib.get("steel").unwrap().density(), 7850.0);
    assert!(lib.get("unobtainium").is_none());
}
