//! The worker pipeline: many `Bee` render threads filling a shared result
//! queue, one `Ant` thread draining it in batches under a database
//! transaction, and a `Hive` that wires the two together and waits for
//! completion. Grounded on the producer/consumer task scheduler this
//! renderer inherited its vocabulary from: per-worker task/result buffers
//! drained by a single consumer, woken by a condition variable with a
//! timeout rather than a busy loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::Vec3;
use parking_lot::{Condvar, Mutex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::path::Path;
use crate::scene::Scene;
use crate::serialize::Serializer;
use crate::trace::cast_ray;

/// Parameters controlling one render pass. Everything the CLI accepts maps
/// directly onto a field here.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub thread_count: usize,
    pub rr_probability: f32,
    pub seed: u64,
    /// How long the Ant waits on the condition variable before checking the
    /// queue anyway, bounding worst-case latency if a notify is missed.
    pub wait_interval_ms: u64,
    /// How long the Ant sleeps between drain batches once it has caught up,
    /// to avoid busy-polling an empty result queue.
    pub sleep_interval_ms: u64,
}

/// One pixel's worth of work: which pixel, and how many paths to average.
#[derive(Debug, Clone, Copy)]
struct PixelTask {
    x: u32,
    y: u32,
}

/// A finished pixel: its averaged radiance and every path traced for it,
/// carried through to the Ant for persistence and framebuffer writing.
struct PixelResult {
    x: u32,
    y: u32,
    radiance: Vec3,
    paths: Vec<Path>,
}

/// Shared state a `Bee` drains tasks from and fills results into.
struct Shared {
    tasks: Mutex<Vec<PixelTask>>,
    results: Mutex<Vec<PixelResult>>,
    results_ready: Condvar,
    bees_remaining: AtomicUsize,
}

/// A single render worker. Pops pixel tasks off the shared queue, traces
/// `samples_per_pixel` paths per pixel, and pushes the averaged result.
struct Bee {
    id: usize,
}

impl Bee {
    fn run(self, scene: Arc<Scene>, config: Arc<RenderConfig>, shared: Arc<Shared>) {
        let mut rng = SmallRng::seed_from_u64(config.seed ^ (self.id as u64).wrapping_mul(0x9E3779B97F4A7C15));
        loop {
            let task = {
                let mut tasks = shared.tasks.lock();
                tasks.pop()
            };
            let Some(task) = task else { break };

            let mut accum = Vec3::ZERO;
            let mut paths = Vec::with_capacity(config.samples_per_pixel as usize);
            for _ in 0..config.samples_per_pixel {
                let u = (task.x as f32 + rng.gen_range_01()) / config.width as f32;
                let v = (task.y as f32 + rng.gen_range_01()) / config.height as f32;
                let ray = scene.camera.ray_through(u, v);
                let (radiance, path) = cast_ray(&scene, &ray, &mut rng, config.rr_probability);
                accum += radiance;
                paths.push(path);
            }
            accum /= config.samples_per_pixel.max(1) as f32;

            let mut results = shared.results.lock();
            results.push(PixelResult { x: task.x, y: task.y, radiance: accum, paths });
            drop(results);
            shared.results_ready.notify_one();
        }
        shared.bees_remaining.fetch_sub(1, Ordering::SeqCst);
        shared.results_ready.notify_all();
        debug!(bee = self.id, "worker finished");
    }
}

/// Small `rand::Rng` convenience used by `Bee::run`; kept local so the
/// sampling call sites above read like the math they express.
trait UnitRange {
    fn gen_range_01(&mut self) -> f32;
}

impl<R: rand::Rng> UnitRange for R {
    fn gen_range_01(&mut self) -> f32 {
        self.gen_range(0.0..1.0)
    }
}

/// A linear RGB framebuffer, gamma-corrected to bytes on demand by the
/// image sink.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Self {
        Framebuffer { width, height, pixels: vec![Vec3::ZERO; (width * height) as usize] }
    }

    fn set(&mut self, x: u32, y: u32, value: Vec3) {
        let idx = (y * self.width + x) as usize;
        self.pixels[idx] = value;
    }
}

/// The single consumer: drains `results` in batches, persists every path
/// under one database transaction per batch, and writes pixel values into
/// the framebuffer. Runs until the Bees are done and the queue is empty.
fn run_ant(
    config: Arc<RenderConfig>,
    shared: Arc<Shared>,
    mut store: Option<Serializer>,
    framebuffer: &Mutex<Framebuffer>,
) {
    loop {
        let batch = {
            let mut results = shared.results.lock();
            if results.is_empty() {
                let timed_out = shared
                    .results_ready
                    .wait_for(&mut results, Duration::from_millis(config.wait_interval_ms))
                    .timed_out();
                if results.is_empty() {
                    if shared.bees_remaining.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    if timed_out {
                        continue;
                    }
                }
            }
            std::mem::take(&mut *results)
        };
        if batch.is_empty() {
            thread::sleep(Duration::from_millis(config.sleep_interval_ms));
            continue;
        }

        if let Some(store) = store.as_mut() {
            if let Err(err) = persist_batch(store, &batch) {
                tracing::error!(%err, "failed to persist render batch, continuing without storage for this batch");
            }
        }

        let mut fb = framebuffer.lock();
        for result in &batch {
            fb.set(result.x, result.y, result.radiance);
        }
        drop(fb);
        debug!(count = batch.len(), "ant drained batch");
    }
}

fn persist_batch(store: &mut Serializer, batch: &[PixelResult]) -> anyhow::Result<()> {
    store.begin_transaction()?;
    for result in batch {
        for path in &result.paths {
            // Nodes must exist before the path row can reference them:
            // insert camera-first (the path's own front-to-back order),
            // then fold the returned ids into `node_ids`.
            let mut node_ids = Vec::with_capacity(path.len());
            for node in path {
                node_ids.push(store.insert_path_node(node)?);
            }
            store.insert_path(result.y, result.x, &node_ids)?;
        }
    }
    store.commit_transaction()?;
    Ok(())
}

/// The coordinator: builds the task queue, spawns the Bees and the Ant,
/// and blocks until the whole image is rendered.
pub struct Hive;

impl Hive {
    /// Renders `scene` at the resolution and sample count in `config`,
    /// persisting every traced path into `store` if one is given.
    pub fn render(scene: Scene, config: RenderConfig, store: Option<Serializer>) -> Framebuffer {
        let scene = Arc::new(scene);
        let config = Arc::new(config);

        let mut tasks = Vec::with_capacity((config.width * config.height) as usize);
        for y in 0..config.height {
            for x in 0..config.width {
                tasks.push(PixelTask { x, y });
            }
        }
        info!(pixels = tasks.len(), threads = config.thread_count, "starting render");

        let shared = Arc::new(Shared {
            tasks: Mutex::new(tasks),
            results: Mutex::new(Vec::new()),
            results_ready: Condvar::new(),
            bees_remaining: AtomicUsize::new(config.thread_count),
        });
        let framebuffer = Arc::new(Mutex::new(Framebuffer::new(config.width, config.height)));

        let ant_config = Arc::clone(&config);
        let ant_shared = Arc::clone(&shared);
        let ant_framebuffer = Arc::clone(&framebuffer);
        let ant_handle = thread::spawn(move || {
            run_ant(ant_config, ant_shared, store, &ant_framebuffer);
        });

        let bee_handles: Vec<_> = (0..config.thread_count)
            .map(|id| {
                let scene = Arc::clone(&scene);
                let config = Arc::clone(&config);
                let shared = Arc::clone(&shared);
                thread::spawn(move || Bee { id }.run(scene, config, shared))
            })
            .collect();

        for handle in bee_handles {
            let _ = handle.join();
        }
        let _ = ant_handle.join();

        info!("render complete");
        Arc::try_unwrap(framebuffer).ok().expect("all bee/ant threads joined").into_inner()
    }
}

/// Maps a linear radiance channel to a gamma-corrected byte:
/// `255 * clamp(channel, 0, 1) ^ 0.6`.
pub fn channel_to_byte(channel: f32) -> u8 {
    let clamped = channel.clamp(0.0, 1.0);
    (255.0 * clamped.powf(0.6)).round().clamp(0.0, 255.0) as u8
}
