//! FEA Kernel demo - plastic bar cycle and shell strain patch
//!
//! Run with `RUST_LOG=debug` to follow the element life cycle.

use anyhow::Context;
use fea_kernel::prelude::*;
use nalgebra::DVector;

fn plastic_bar_cycle() -> anyhow::Result<()> {
    println!("=== Corotational bar, elastic-perfectly-plastic section ===\n");

    let mut domain = Domain::new();
    domain.add_node(1, Node::new(0.0, 0.0, 0.0, 2))?;
    domain.add_node(2, Node::new(1.0, 0.5, 0.0, 2))?;

    // E = 200, fy = 0.5 -> yield strain 2.5e-3
    let steel = ElasticPerfectlyPlastic::new(200.0, 0.5)?;
    let section = Section1d::new(UniaxialModel::from(steel), ResponseCode::P);
    domain.add_element(Box::new(CorotTrussSection::new(1, 2, [1, 2], section.into())?))?;

    let axis = nalgebra::Vector2::new(1.0, 0.5).normalize();
    let amplitude = 0.006;
    let steps = 12;
    let path = (0..=steps)
        .map(|i| amplitude * i as f64 / steps as f64)
        .chain((0..=2 * steps).map(|i| amplitude * (1.0 - i as f64 / steps as f64)))
        .chain((0..=steps).map(|i| -amplitude * (1.0 - i as f64 / steps as f64)));

    println!("{:>12} {:>14} {:>14}", "elongation", "axial force", "k_axial");
    for d in path {
        let u = DVector::from_vec(vec![d * axis[0], d * axis[1]]);
        domain.set_trial_displacement(2, &u)?;
        domain.update()?;
        domain.commit_state()?;

        let element = domain.element_mut(1)?;
        let force = element.response("axialForce")?[0];
        let elongation = element.response("axialDeformation")?[0];
        let k = element.tangent_stiffness();
        let k_axial = axis[0] * (axis[0] * k[(2, 2)] + axis[1] * k[(2, 3)])
            + axis[1] * (axis[0] * k[(3, 2)] + axis[1] * k[(3, 3)]);
        println!("{elongation:>12.6} {force:>14.6} {k_axial:>14.4}");
    }
    Ok(())
}

fn shell_strain_patch() -> anyhow::Result<()> {
    println!("\n=== MITC4 shell, imposed thermal strain ===\n");

    let mut domain = Domain::new();
    let corners = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.5], [0.0, 1.5]];
    for (i, c) in corners.iter().enumerate() {
        domain.add_node(i + 1, Node::new(c[0], c[1], 0.0, 6))?;
    }
    let section = ElasticMembranePlateSection::new(30000.0, 0.2, 0.2, 2.5)?;
    domain.add_element(Box::new(ShellMITC4::new(10, [1, 2, 3, 4], section.into())?))?;

    let mut strain = DVector::zeros(8);
    strain[0] = 1e-4;
    strain[1] = 1e-4;
    let pattern = LoadPattern::new("thermal")
        .with_load(ElementalLoad::new(1, vec![10], ShellStrainLoad::uniform(4, strain)?))
        .with_load(ElementalLoad::new(2, vec![10], ShellUniformLoad::normal(-5.0)));
    pattern.apply(&mut domain).context("applying thermal pattern")?;
    domain.update()?;

    let shell = domain.element_mut(10)?;
    let mean = shell.response("meanStress")?;
    println!("mean n1 = {:.4}, n2 = {:.4}, n12 = {:.4}", mean[0], mean[1], mean[2]);
    let force = shell.resisting_force();
    for node in 0..4 {
        let f = force.rows(6 * node, 3);
        println!("node {}: F = [{:>10.4} {:>10.4} {:>10.4}]", node + 1, f[0], f[1], f[2]);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    plastic_bar_cycle()?;
    shell_strain_patch()?;
    Ok(())
}
