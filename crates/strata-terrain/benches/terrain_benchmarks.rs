use criterion::{Criterion, black_box, criterion_group, criterion_main};
use strata_coords::ChunkCoord;
use strata_terrain::*;

fn bench_generate_chunk(c: &mut Criterion) {
    let generator = HeightmapGenerator::new(HeightmapSettings::with_seed(12345)).unwrap();
    c.bench_function("generate_chunk", |bencher| {
        bencher.iter(|| black_box(generator.generate_chunk(black_box(ChunkCoord::new(3, -7)))))
    });

    let warped = HeightmapGenerator::new(HeightmapSettings {
        domain_warp: Some(1.5),
        terrace: Some(8),
        ..HeightmapSettings::with_seed(12345)
    })
    .unwrap();
    c.bench_function("generate_chunk_warped_terraced", |bencher| {
        bencher.iter(|| black_box(warped.generate_chunk(black_box(ChunkCoord::new(3, -7)))))
    });
}

fn bench_erosion(c: &mut Criterion) {
    let generator = HeightmapGenerator::new(HeightmapSettings::with_seed(12345)).unwrap();
    let grid = generator.generate_grid(128, 128).unwrap();
    let hydraulic = HydraulicErosion::new(ErosionSettings {
        iterations: 2_000,
        ..Default::default()
    })
    .unwrap();
    let thermal = ThermalErosion::new(ThermalSettings::default()).unwrap();

    c.bench_function("hydraulic_2k_droplets_128", |bencher| {
        bencher.iter(|| {
            let mut map = grid.clone();
            black_box(hydraulic.erode(&mut map, 1))
        })
    });
    c.bench_function("thermal_128", |bencher| {
        bencher.iter(|| {
            let mut map = grid.clone();
            black_box(thermal.erode(&mut map))
        })
    });
}

criterion_group!(benches, bench_generate_chunk, bench_erosion);
criterion_main!(benches);
