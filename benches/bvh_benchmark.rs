use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use photoncast::bvh::Bvh;
use photoncast::geometry::{Direction, Ray};
use photoncast::material::Material;
use photoncast::triangle::Triangle;

fn grid_of_triangles(n: usize) -> Vec<Triangle> {
    let material = Material::Diffuse { albedo: Vec3::splat(0.5) };
    let side = (n as f32).sqrt().ceil() as i32;
    let mut triangles = Vec::with_capacity(n);
    for i in 0..n {
        let x = (i as i32 % side) as f32 * 2.0;
        let z = (i as i32 / side) as f32 * 2.0;
        triangles.push(Triangle::new(
            Vec3::new(x, 0.0, z),
            Vec3::new(x + 1.0, 0.0, z),
            Vec3::new(x, 1.0, z),
            material,
        ));
    }
    triangles
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_build");
    for size in [64usize, 1024, 8192] {
        group.bench_function(format!("build_{size}"), |b| {
            b.iter(|| Bvh::build(black_box(grid_of_triangles(size))));
        });
    }
    group.finish();
}

fn bench_intersect(c: &mut Criterion) {
    let triangles = grid_of_triangles(4096);
    let bvh = Bvh::build(triangles);
    let ray = Ray::new(Vec3::new(0.5, 5.0, 0.5), Direction::new(Vec3::new(0.0, -1.0, 0.0)));

    c.bench_function("bvh_intersect_4096", |b| {
        b.iter(|| black_box(bvh.intersect(black_box(&ray))));
    });
}

criterion_group!(benches, bench_build, bench_intersect);
criterion_main!(benches);
