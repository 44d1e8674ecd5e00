//! Benchmarks for element state update and assembly

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fea_kernel::prelude::*;
use nalgebra::DVector;

/// Grid of `n x n` MITC4 shells over a unit square, every node displaced
fn create_shell_mesh(n: usize) -> Domain {
    let mut domain = Domain::new();
    let tag = |i: usize, j: usize| j * (n + 1) + i + 1;
    let h = 1.0 / n as f64;
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64 * h, j as f64 * h);
            domain.add_node(tag(i, j), Node::new(x, y, 0.0, 6)).unwrap();
            let u = DVector::from_vec(vec![1e-4 * x, -2e-4 * y, 1e-3 * x * y, 1e-4, 0.0, 1e-5 * x]);
            domain.set_trial_displacement(tag(i, j), &u).unwrap();
        }
    }
    let section: SectionModel = ElasticMembranePlateSection::new(200e3, 0.3, 0.01, 7.85e-9)
        .unwrap()
        .into();
    for j in 0..n {
        for i in 0..n {
            let nodes = [tag(i, j), tag(i + 1, j), tag(i + 1, j + 1), tag(i, j + 1)];
            let shell = ShellMITC4::new(j * n + i + 1, nodes, section.clone()).unwrap();
            domain.add_element(Box::new(shell)).unwrap();
        }
    }
    domain
}

/// Chain of corotational bars with plastic sections along a helix
fn create_truss_chain(count: usize) -> Domain {
    let mut domain = Domain::new();
    for k in 0..=count {
        let t = k as f64 * 0.3;
        domain.add_node(k + 1, Node::new(t.cos(), t.sin(), 0.1 * t, 3)).unwrap();
        let u = DVector::from_vec(vec![1e-3 * t, -5e-4, 2e-3 * t.sin()]);
        domain.set_trial_displacement(k + 1, &u).unwrap();
    }
    let steel = ElasticPerfectlyPlastic::new(200e3, 250.0).unwrap();
    let section: SectionModel = Section1d::new(UniaxialModel::from(steel), ResponseCode::P).into();
    for k in 0..count {
        let bar = CorotTrussSection::new(k + 1, 3, [k + 1, k + 2], section.clone()).unwrap();
        domain.add_element(Box::new(bar)).unwrap();
    }
    domain
}

fn assemble_all(domain: &mut Domain) -> f64 {
    let tags: Vec<usize> = domain.element_tags().collect();
    let mut trace = 0.0;
    for tag in tags {
        let element = domain.element_mut(tag).unwrap();
        trace += element.tangent_stiffness().trace();
        trace += element.resisting_force().sum();
    }
    trace
}

fn benchmark_shell_update(c: &mut Criterion) {
    let mut domain = create_shell_mesh(10);
    c.bench_function("mitc4_10x10_update", |b| {
        b.iter(|| {
            domain.update().unwrap();
            black_box(&domain);
        })
    });
}

fn benchmark_shell_assembly(c: &mut Criterion) {
    let mut domain = create_shell_mesh(10);
    domain.update().unwrap();
    c.bench_function("mitc4_10x10_tangent_and_force", |b| {
        b.iter(|| black_box(assemble_all(&mut domain)))
    });
}

fn benchmark_corot_truss(c: &mut Criterion) {
    let mut domain = create_truss_chain(200);
    c.bench_function("corot_truss_200_update_assemble", |b| {
        b.iter(|| {
            domain.update().unwrap();
            black_box(assemble_all(&mut domain));
        })
    });
}

criterion_group!(
    benches,
    benchmark_shell_update,
    benchmark_shell_assembly,
    benchmark_corot_truss,
);

criterion_main!(benches);
