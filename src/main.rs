use std::fs::File;
use std::io::BufWriter;

use clap::Parser;
use photoncast::cli::Args;
use photoncast::image_io::write_ppm;
use photoncast::obj_import::load_mesh;
use photoncast::pipeline::{Hive, RenderConfig};
use photoncast::primitive::Primitive;
use photoncast::scene::{Camera, Scene};
use photoncast::serialize::Serializer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log_level.as_filter()))
        .init();

    let camera = Camera::new(
        args.camera_position()?,
        args.look_at_point()?,
        glam::Vec3::Y,
        args.fov,
        args.width as f32 / args.height as f32,
    );
    let mut scene = Scene::new(camera);

    for spec in args.mesh_specs()? {
        info!(path = %spec.path.display(), "loading mesh");
        let mesh = load_mesh(&spec.path, spec.material)?;
        scene.add_obj(Primitive::Mesh(Box::new(mesh)));
    }
    scene.build();

    let store = match &args.db {
        Some(path) => {
            info!(path = %path.display(), "opening path store");
            Some(Serializer::open(path)?)
        }
        None => None,
    };

    let config = RenderConfig {
        width: args.width,
        height: args.height,
        samples_per_pixel: args.spp,
        thread_count: args.threads,
        rr_probability: args.rr_probability,
        seed: args.seed,
        wait_interval_ms: args.wait_interval_ms,
        sleep_interval_ms: args.sleep_interval_ms,
    };

    let framebuffer = Hive::render(scene, config, store);

    info!(path = %args.out.display(), "writing image");
    let mut writer = BufWriter::new(File::create(&args.out)?);
    write_ppm(&framebuffer, &mut writer)?;

    info!("done");
    Ok(())
}
