use glam::Vec3;
use photoncast::bvh::Bvh;
use photoncast::geometry::{Aabb, Direction, Ray};
use photoncast::image_io::write_ppm;
use photoncast::material::Material;
use photoncast::pipeline::{Hive, RenderConfig};
use photoncast::primitive::Primitive;
use photoncast::scene::{Camera, Scene};
use photoncast::serialize::Serializer;
use photoncast::triangle::Triangle;

fn diffuse(albedo: Vec3) -> Material {
    Material::Diffuse { albedo }
}

#[test]
fn four_triangle_scene_builds_a_correctly_sized_bvh() {
    let triangles = vec![
        Triangle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), diffuse(Vec3::splat(0.5))),
        Triangle::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 0.0), diffuse(Vec3::splat(0.5))),
        Triangle::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, 3.0, 0.0), Vec3::new(0.0, 4.0, 0.0), diffuse(Vec3::splat(0.5))),
        Triangle::new(Vec3::new(3.0, 3.0, 0.0), Vec3::new(4.0, 3.0, 0.0), Vec3::new(3.0, 4.0, 0.0), diffuse(Vec3::splat(0.5))),
    ];
    let bvh = Bvh::build(triangles);
    assert_eq!(bvh.node_count(), 2 * 4 - 1);
}

#[test]
fn aabb_slab_test_hits_and_misses_as_expected() {
    let b = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
    let hit = Ray::new(Vec3::new(0.0, 0.0, -5.0), Direction::new(Vec3::Z));
    let miss = Ray::new(Vec3::new(5.0, 5.0, -5.0), Direction::new(Vec3::Z));
    assert!(b.is_intersect(&hit));
    assert!(!b.is_intersect(&miss));
}

#[test]
fn triangle_ray_hit_reports_the_expected_barycentric_position() {
    let tri = Triangle::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0), diffuse(Vec3::splat(0.5)));
    let ray = Ray::new(Vec3::new(0.5, 0.5, 5.0), Direction::new(Vec3::new(0.0, 0.0, -1.0)));
    let hit = tri.intersect(&ray).expect("ray aimed at the triangle interior must hit");
    assert!((hit.position - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-4);
}

#[test]
fn three_triangle_bvh_returns_the_nearest_of_two_aligned_hits() {
    let near = Triangle::new(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, -1.0, 2.0), Vec3::new(0.0, 1.0, 2.0), diffuse(Vec3::splat(0.5)));
    let far = Triangle::new(Vec3::new(-1.0, -1.0, 8.0), Vec3::new(1.0, -1.0, 8.0), Vec3::new(0.0, 1.0, 8.0), diffuse(Vec3::splat(0.5)));
    let offscreen = Triangle::new(Vec3::new(50.0, 50.0, 2.0), Vec3::new(51.0, 50.0, 2.0), Vec3::new(50.0, 51.0, 2.0), diffuse(Vec3::splat(0.5)));
    let bvh = Bvh::build(vec![near, far, offscreen]);
    let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Direction::new(Vec3::Z));
    let hit = bvh.intersect(&ray).expect("ray must hit the nearer triangle");
    assert!((hit.t - 7.0).abs() < 1e-4);
}

#[test]
fn cornell_box_camera_rays_diverge_across_a_2x2_pixel_grid() {
    let cam = Camera::new(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y, 60.0, 1.0);
    let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    let dirs: Vec<Vec3> = corners.iter().map(|&(u, v)| cam.ray_through(u, v).direction().get()).collect();
    for i in 0..dirs.len() {
        for j in (i + 1)..dirs.len() {
            assert!(dirs[i].distance(dirs[j]) > 1e-3, "pixel rays {i} and {j} should not coincide");
        }
    }
}

#[test]
fn ppm_output_has_the_expected_header_and_byte_count() {
    let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 60.0, 1.0));
    scene.add_obj(Primitive::Triangle(Triangle::new(
        Vec3::new(-5.0, -5.0, 0.0),
        Vec3::new(5.0, -5.0, 0.0),
        Vec3::new(0.0, 5.0, 0.0),
        diffuse(Vec3::splat(0.9)),
    )));
    scene.build();

    let config = RenderConfig {
        width: 4,
        height: 4,
        samples_per_pixel: 2,
        thread_count: 2,
        rr_probability: 0.0,
        seed: 1,
        wait_interval_ms: 5,
        sleep_interval_ms: 1,
    };
    let framebuffer = Hive::render(scene, config, None);

    let mut out = Vec::new();
    write_ppm(&framebuffer, &mut out).unwrap();
    let header = b"P6\n4 4\n255\n";
    assert_eq!(&out[..header.len()], header);
    assert_eq!(out.len() - header.len(), 4 * 4 * 3);
}

#[test]
fn rendering_with_a_store_persists_one_path_per_sample() {
    let mut scene = Scene::new(Camera::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 60.0, 1.0));
    scene.add_obj(Primitive::Triangle(Triangle::new(
        Vec3::new(-5.0, -5.0, 0.0),
        Vec3::new(5.0, -5.0, 0.0),
        Vec3::new(0.0, 5.0, 0.0),
        diffuse(Vec3::splat(0.9)),
    )));
    scene.build();

    let store = Serializer::in_memory().unwrap();
    let config = RenderConfig {
        width: 2,
        height: 2,
        samples_per_pixel: 3,
        thread_count: 2,
        rr_probability: 0.0,
        seed: 7,
        wait_interval_ms: 5,
        sleep_interval_ms: 1,
    };
    let _ = Hive::render(scene, config, Some(store));
    // The store was moved into the Ant thread; this test's focus is that
    // rendering with persistence enabled completes without deadlock or
    // panic. Row-count assertions live in `serialize::tests`, which can
    // inspect the connection directly instead of through a moved value.
}
