use approx::assert_relative_eq;
use fea_kernel::math::shape::LAGRANGE9_NODES;
use fea_kernel::prelude::*;
use nalgebra::{DMatrix, DVector};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn elastic_bar(ea: f64) -> SectionModel {
    Section1d::new(UniaxialModel::from(ElasticUniaxial::new(ea).unwrap()), ResponseCode::P).into()
}

fn disp(values: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(values)
}

fn assert_symmetric(k: &DMatrix<f64>) {
    let scale = k.amax().max(1.0);
    assert_relative_eq!((k - k.transpose()).amax() / scale, 0.0, epsilon = 1e-12);
}

fn corot_bar_domain(section: SectionModel) -> Domain {
    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
    domain.add_node(2, Node::new(1.0, 0.0, 0.0, 3)).unwrap();
    let bar = CorotTrussSection::new(1, 3, [1, 2], section).unwrap();
    domain.add_element(Box::new(bar)).unwrap();
    domain
}

#[test]
fn corotational_strain_is_engineering_strain() {
    init_logging();
    let mut domain = corot_bar_domain(elastic_bar(100.0));
    domain.set_trial_displacement(2, &disp(&[0.1, 0.0, 0.0])).unwrap();
    domain.update().unwrap();

    let bar = domain.element_mut(1).unwrap();
    assert_relative_eq!(bar.response("strain").unwrap()[0], 0.1, epsilon = 1e-14);
    assert_relative_eq!(bar.response("axialDeformation").unwrap()[0], 0.1, epsilon = 1e-14);
    assert_relative_eq!(bar.response("currentLength").unwrap()[0], 1.1, epsilon = 1e-14);
    assert_relative_eq!(bar.response("axialForce").unwrap()[0], 10.0, epsilon = 1e-12);
    assert_symmetric(bar.tangent_stiffness());
}

#[test]
fn corotational_tangent_stays_symmetric_under_large_rotation() {
    init_logging();
    let steel = ElasticPerfectlyPlastic::new(200.0, 0.5).unwrap();
    let mut domain = corot_bar_domain(Section1d::new(UniaxialModel::from(steel), ResponseCode::P).into());
    for step in 1..=10 {
        let t = 0.15 * step as f64;
        let u = [1.02 * t.cos() - 1.0, 1.02 * t.sin(), 0.3 * t];
        domain.set_trial_displacement(2, &disp(&u)).unwrap();
        domain.update().unwrap();
        domain.commit_state().unwrap();
        let bar = domain.element_mut(1).unwrap();
        assert_symmetric(bar.tangent_stiffness());
        assert_symmetric(bar.initial_stiffness());
    }
}

#[test]
fn dead_element_scales_force_and_resumes_without_jump() {
    init_logging();
    let options = ElementOptions::default().with_dead_srf(1e-3);
    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
    domain.add_node(2, Node::new(2.0, 0.0, 0.0, 2)).unwrap();
    let bar = CorotTrussSection::new(5, 2, [1, 2], elastic_bar(40.0))
        .unwrap()
        .with_options(options);
    domain.add_element(Box::new(bar)).unwrap();

    domain.set_trial_displacement(2, &disp(&[0.02, 0.0])).unwrap();
    domain.update().unwrap();
    let before = domain.element_mut(5).unwrap().resisting_force().clone();
    assert_relative_eq!(before[2], 0.4, epsilon = 1e-12);

    domain.kill_elements(&[5]).unwrap();
    let dead = domain.element_mut(5).unwrap().resisting_force().clone();
    assert_relative_eq!(dead, before * 1e-3, epsilon = 1e-15);

    // the structure keeps moving while the bar is dead
    domain.set_trial_displacement(2, &disp(&[0.05, 0.0])).unwrap();
    domain.update().unwrap();
    domain.activate_elements(&[5]).unwrap();
    domain.update().unwrap();

    let bar = domain.element_mut(5).unwrap();
    assert_relative_eq!(bar.response("strain").unwrap()[0], 0.0, epsilon = 1e-15);
    assert_relative_eq!(bar.resisting_force().amax(), 0.0, epsilon = 1e-15);

    // further motion is measured from the reactivation point
    domain.set_trial_displacement(2, &disp(&[0.07, 0.0])).unwrap();
    domain.update().unwrap();
    let f = domain.element_mut(5).unwrap().resisting_force().clone();
    assert_relative_eq!(f[2], 40.0 * 0.01, epsilon = 1e-12);
}

#[test]
fn dead_shell_force_is_scaled() {
    init_logging();
    let mut domain = Domain::new();
    for (i, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].iter().enumerate() {
        domain.add_node(i + 1, Node::new(*x, *y, 0.0, 6)).unwrap();
    }
    let section = ElasticMembranePlateSection::new(1000.0, 0.25, 0.1, 0.0).unwrap();
    domain
        .add_element(Box::new(ShellMITC4::new(1, [1, 2, 3, 4], section.into()).unwrap()))
        .unwrap();
    domain
        .set_trial_displacement(3, &disp(&[1e-3, 2e-3, 5e-3, 1e-3, -2e-3, 1e-4]))
        .unwrap();
    domain.update().unwrap();
    let before = domain.element_mut(1).unwrap().resisting_force().clone();
    assert!(before.amax() > 0.0);

    domain.kill_elements(&[1]).unwrap();
    let dead = domain.element_mut(1).unwrap().resisting_force().clone();
    assert_relative_eq!(dead, before * 1e-6, epsilon = 1e-15);

    domain.activate_elements(&[1]).unwrap();
    domain.update().unwrap();
    let shell = domain.element_mut(1).unwrap();
    assert_relative_eq!(shell.response("meanStrain").unwrap().amax(), 0.0, epsilon = 1e-15);
    assert_relative_eq!(shell.resisting_force().amax(), 0.0, epsilon = 1e-12);
}

#[test]
fn corotational_shell_follows_quarter_turn_without_force() {
    init_logging();
    let mut domain = Domain::new();
    let corners = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)];
    for (i, (x, y)) in corners.iter().enumerate() {
        domain.add_node(i + 1, Node::new(*x, *y, 0.0, 6)).unwrap();
    }
    let section = ElasticMembranePlateSection::new(1000.0, 0.25, 0.1, 0.0).unwrap();
    domain
        .add_element(Box::new(CorotShellMITC4::new(1, [1, 2, 3, 4], section.into()).unwrap()))
        .unwrap();

    let angle = std::f64::consts::FRAC_PI_2;
    for (i, (x, y)) in corners.iter().enumerate() {
        let (c, s) = (angle.cos(), angle.sin());
        let u = [c * x - s * y - x, s * x + c * y - y, 0.0, 0.0, 0.0, angle];
        domain.set_trial_displacement(i + 1, &disp(&u)).unwrap();
    }
    domain.update().unwrap();
    let shell = domain.element_mut(1).unwrap();
    assert!(shell.resisting_force().amax() < 1e-9);
    assert_symmetric(shell.tangent_stiffness());
}

#[test]
fn bearing_yields_and_reverses_through_zero_length_element() {
    init_logging();
    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
    domain.add_node(2, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
    let bearing = Bidirectional::new(1000.0, 10.0, 50.0, 20.0, [ResponseCode::Vy, ResponseCode::Vz]).unwrap();
    domain
        .add_element(Box::new(ZeroLengthSection::new(1, 3, [1, 2], bearing.into()).unwrap()))
        .unwrap();

    domain.set_trial_displacement(2, &disp(&[0.0, 0.03, 0.0])).unwrap();
    domain.update().unwrap();
    domain.commit_state().unwrap();
    let shear = domain.element_mut(1).unwrap().response("shearForces").unwrap();
    assert_relative_eq!(shear[0], 10.0 + 70.0 * 20.0 / 1070.0, epsilon = 1e-9);
    assert_eq!(shear[1], 0.0);

    // plastic offset leaves a reversed force at zero displacement
    domain.set_trial_displacement(2, &disp(&[0.0, 0.0, 0.0])).unwrap();
    domain.update().unwrap();
    let bearing = domain.element_mut(1).unwrap();
    assert!(bearing.response("shearForces").unwrap()[0] < 0.0);
    assert!(bearing.resisting_force()[4] < 0.0);
    assert_symmetric(bearing.tangent_stiffness());
}

#[test]
fn rejected_strain_load_leaves_force_unchanged() {
    init_logging();
    let mut domain = Domain::new();
    let (a, b) = (1.5, 1.0);
    for (i, (r, s)) in LAGRANGE9_NODES.iter().enumerate() {
        domain
            .add_node(i + 1, Node::new(a * (1.0 + r), b * (1.0 + s), 0.0, 6))
            .unwrap();
    }
    let section = ElasticMembranePlateSection::new(1000.0, 0.25, 0.1, 0.0).unwrap();
    let nodes = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    domain
        .add_element(Box::new(ShellMITC9::new(3, nodes, section.into()).unwrap()))
        .unwrap();
    domain
        .set_trial_displacement(3, &disp(&[1e-3, 0.0, 2e-3, 0.0, 1e-3, 0.0]))
        .unwrap();
    domain.update().unwrap();
    let before = domain.element_mut(3).unwrap().resisting_force().clone();

    let strain = ShellStrainLoad::uniform(9, DVector::from_element(8, 1e-3)).unwrap();
    let err = domain
        .apply_load(&ElementalLoad::new(1, vec![3], strain), 1.0)
        .unwrap_err();
    assert!(matches!(
        err,
        FEAError::UnsupportedLoad { element: 3, element_type: "ShellMITC9", load: "ShellStrainLoad" }
    ));
    assert!(!err.is_configuration());

    domain.update().unwrap();
    let after = domain.element_mut(3).unwrap().resisting_force().clone();
    assert_eq!(before, after);
}

#[test]
fn truss_rejects_beam_point_load() {
    init_logging();
    let mut domain = corot_bar_domain(elastic_bar(10.0));
    domain.set_trial_displacement(2, &disp(&[0.01, 0.0, 0.0])).unwrap();
    domain.update().unwrap();
    let before = domain.element_mut(1).unwrap().resisting_force().clone();

    let point = BeamPointLoad2d::new(1.0, 0.0, 0.5).unwrap();
    assert!(domain.apply_load(&ElementalLoad::new(9, vec![1], point), 1.0).is_err());
    assert_eq!(domain.element_mut(1).unwrap().resisting_force(), &before);
}

#[test]
fn repeated_strain_loads_accumulate() {
    init_logging();
    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
    domain.add_node(2, Node::new(0.0, 3.0, 0.0, 2)).unwrap();
    domain
        .add_element(Box::new(TrussSection::new(1, 2, [1, 2], elastic_bar(50.0)).unwrap()))
        .unwrap();
    let pattern = LoadPattern::new("shrinkage")
        .with_factor(0.5)
        .with_load(ElementalLoad::new(1, vec![1], TrussStrainLoad::new(1e-3, 3e-3)));
    pattern.apply(&mut domain).unwrap();
    pattern.apply(&mut domain).unwrap();
    domain.update().unwrap();

    // free shortening of 2 * 0.5 * 2e-3 is resisted by the fixed nodes
    let bar = domain.element_mut(1).unwrap();
    assert_relative_eq!(bar.response("axialForce").unwrap()[0], -50.0 * 2e-3, epsilon = 1e-12);
}

#[test]
fn shell_thermal_patch_through_domain() {
    init_logging();
    let (e, nu, h) = (1000.0, 0.25, 0.1);
    let eps = 1e-3;
    let corners = [(0.0, 0.0), (2.0, 0.0), (2.5, 1.5), (-0.5, 1.0)];
    let mut domain = Domain::new();
    for (i, (x, y)) in corners.iter().enumerate() {
        domain.add_node(i + 1, Node::new(*x, *y, 0.0, 6)).unwrap();
    }
    let section = ElasticMembranePlateSection::new(e, nu, h, 0.0).unwrap();
    domain
        .add_element(Box::new(ShellMITC4::new(1, [1, 2, 3, 4], section.into()).unwrap()))
        .unwrap();

    let mut strain = DVector::zeros(8);
    strain[0] = eps;
    strain[1] = eps;
    LoadPattern::new("thermal")
        .with_load(ElementalLoad::new(1, vec![1], ShellStrainLoad::uniform(4, strain).unwrap()))
        .apply(&mut domain)
        .unwrap();

    // restrained: uniform biaxial compression, self-equilibrated forces
    domain.update().unwrap();
    let n = -e * h * eps / (1.0 - nu);
    {
        let shell = domain.element_mut(1).unwrap();
        let mean = shell.response("meanStress").unwrap();
        assert_relative_eq!(mean[0], n, epsilon = 1e-10);
        assert_relative_eq!(mean[1], n, epsilon = 1e-10);
        assert_relative_eq!(mean[2], 0.0, epsilon = 1e-10);
        let f = shell.resisting_force().clone();
        for dof in 0..3 {
            let total: f64 = (0..4).map(|node| f[6 * node + dof]).sum();
            assert_relative_eq!(total, 0.0, epsilon = 1e-10);
        }
    }

    // free expansion: stress-free
    for (i, (x, y)) in corners.iter().enumerate() {
        let u = disp(&[eps * x, eps * y, 0.0, 0.0, 0.0, 0.0]);
        domain.set_trial_displacement(i + 1, &u).unwrap();
    }
    domain.update().unwrap();
    let shell = domain.element_mut(1).unwrap();
    assert_relative_eq!(shell.response("meanStress").unwrap().amax(), 0.0, epsilon = 1e-10);
    assert_relative_eq!(shell.resisting_force().amax(), 0.0, epsilon = 1e-10);
}

#[test]
fn pack_and_unpack_restore_loaded_beam() {
    init_logging();
    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
    domain.add_node(2, Node::new(4.0, 0.0, 0.0, 3)).unwrap();
    let section = ElasticBeamSection::planar(200.0, 0.5, 0.02).unwrap();
    domain
        .add_element(Box::new(DispBeamColumn2d::new(1, [1, 2], section.into(), 4).unwrap()))
        .unwrap();
    domain
        .apply_load(&ElementalLoad::new(1, vec![1], BeamUniformLoad2d::new(-2.0, 0.0)), 1.0)
        .unwrap();
    domain.set_trial_displacement(2, &disp(&[1e-3, -4e-3, 1e-3])).unwrap();
    domain.update().unwrap();
    domain.commit_state().unwrap();

    let beam = domain.element_mut(1).unwrap();
    let force = beam.resisting_force().clone();
    let stiffness = beam.tangent_stiffness().clone();
    let packed = beam.pack().unwrap();

    let section = ElasticBeamSection::planar(1.0, 1.0, 1.0).unwrap();
    let mut restored = DispBeamColumn2d::new(1, [7, 8], section.into(), 2).unwrap();
    restored.unpack(&packed).unwrap();
    assert_eq!(restored.node_tags(), &[1, 2]);
    assert_relative_eq!(restored.resisting_force().clone(), force, epsilon = 1e-12);
    assert_relative_eq!(restored.tangent_stiffness().clone(), stiffness, epsilon = 1e-12);

    // another element type refuses the state
    let mut bar = TrussSection::new(2, 2, [1, 2], elastic_bar(1.0)).unwrap();
    assert!(matches!(bar.unpack(&packed), Err(FEAError::IncompatiblePack { .. })));
}

#[test]
fn options_are_read_from_json() {
    init_logging();
    let options = ElementOptions::from_json(r#"{ "dead_srf": 0.01 }"#).unwrap();
    assert_eq!(options.dead_srf, 0.01);
    assert_eq!(options.drilling_scale, ElementOptions::default().drilling_scale);
    assert!(ElementOptions::from_json(r#"{ "dead_srf": -1.0 }"#).is_err());
}
