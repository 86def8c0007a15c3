//! Benchmarks for entity resolution and assembly transform extraction.

use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use glam::{Mat3, Vec3};
use molimport::assembly::{
    extract_transforms, Assembly, AssemblyDescriptor, ChainTransform,
    TransformMode,
};
use molimport::structure::entity::{resolve_entity_ids, EntityChainGroups};

fn chain_label(i: usize) -> String {
    format!("C{i}")
}

fn entity_resolution_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_entity_ids");

    for chains in [4, 24, 120] {
        let mut groups = EntityChainGroups::new();
        // two chains per entity, like a homodimer repeated
        for e in 0..chains / 2 {
            let _ = groups.push_entity([chain_label(2 * e), chain_label(2 * e + 1)]);
        }
        let atom_chains: Vec<String> = (0..chains * 2_000)
            .map(|i| chain_label(i % chains))
            .collect();

        let _ = group.bench_function(format!("{chains}_chains"), |b| {
            b.iter(|| resolve_entity_ids(black_box(atom_chains.as_slice()), &groups));
        });
    }
    group.finish();
}

/// Icosahedral-capsid-sized assembly: 60 rotations about z.
fn capsid() -> AssemblyDescriptor {
    let transforms = (0..60)
        .map(|i| {
            ChainTransform::from_rotation_translation(
                ["A", "B", "C"],
                Mat3::from_rotation_z(TAU * i as f32 / 60.0),
                Vec3::new(0.0, 0.0, i as f32),
            )
        })
        .collect();
    AssemblyDescriptor::from_assemblies(vec![Assembly::new("1", transforms)])
        .unwrap_or_default()
}

fn transform_extraction_benchmark(c: &mut Criterion) {
    let descriptor = capsid();
    let labels: Vec<String> = ["A", "B", "C"].map(str::to_owned).to_vec();

    let _ = c.bench_function("extract_transforms_matrix", |b| {
        b.iter(|| {
            extract_transforms(Some(black_box(&descriptor)), "1", TransformMode::Matrix)
        });
    });
    let _ = c.bench_function("extract_transforms_quaternion_rows", |b| {
        b.iter(|| {
            extract_transforms(
                Some(black_box(&descriptor)),
                "1",
                TransformMode::Quaternion,
            )
            .map(|t| t.instance_rows(0, &labels))
        });
    });
}

criterion_group!(benches, entity_resolution_benchmark, transform_extraction_benchmark);
criterion_main!(benches);
