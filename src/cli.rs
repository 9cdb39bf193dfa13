//! Command-line surface: scene assembly, render parameters, and output
//! targets, all wired through `clap`'s derive API.

use clap::{Parser, ValueEnum};
use glam::Vec3;

use crate::material::Material;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// One `--mesh`/`--diffuse`/`--emissive` triple: an OBJ file and the
/// material to assign it, given explicitly at the call site rather than
/// defaulting to grey and being overwritten later.
#[derive(Debug, Clone)]
pub struct MeshSpec {
    pub path: std::path::PathBuf,
    pub material: Material,
}

/// Offline Monte-Carlo path tracer.
#[derive(Debug, Parser)]
#[command(name = "photoncast", version, about)]
pub struct Args {
    /// OBJ mesh to load. Repeatable; pair each occurrence with one
    /// `--diffuse` or `--emissive` flag, matched by position.
    #[arg(long = "mesh", value_name = "PATH")]
    pub meshes: Vec<std::path::PathBuf>,

    /// Diffuse albedo `r,g,b` for the mesh at the same position as this
    /// flag. Mutually paired with `--emissive` per mesh.
    #[arg(long = "diffuse", value_name = "R,G,B")]
    pub diffuse: Vec<String>,

    /// Emissive radiance `r,g,b` for the mesh at the same position as this
    /// flag. Mutually paired with `--diffuse` per mesh.
    #[arg(long = "emissive", value_name = "R,G,B")]
    pub emissive: Vec<String>,

    #[arg(long, default_value_t = 512)]
    pub width: u32,

    #[arg(long, default_value_t = 512)]
    pub height: u32,

    /// Vertical field of view, in degrees.
    #[arg(long, default_value_t = 60.0)]
    pub fov: f32,

    #[arg(long = "camera-pos", value_name = "X,Y,Z", default_value = "0,1,5")]
    pub camera_pos: String,

    #[arg(long = "look-at", value_name = "X,Y,Z", default_value = "0,1,0")]
    pub look_at: String,

    /// Samples traced per pixel.
    #[arg(long, default_value_t = 64)]
    pub spp: u32,

    /// Russian-roulette continuation probability for indirect bounces.
    #[arg(long = "rr-probability", default_value_t = 0.8)]
    pub rr_probability: f32,

    /// Render worker thread count.
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    #[arg(long, default_value = "out.ppm")]
    pub out: std::path::PathBuf,

    /// SQLite database to persist traced paths into. Skipped if omitted.
    #[arg(long)]
    pub db: Option<std::path::PathBuf>,

    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,

    #[arg(long = "wait-interval-ms", default_value_t = 50)]
    pub wait_interval_ms: u64,

    #[arg(long = "sleep-interval-ms", default_value_t = 5)]
    pub sleep_interval_ms: u64,

    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    /// Pairs `--mesh` occurrences with their `--diffuse`/`--emissive`
    /// counterpart by position, erroring if the counts don't line up.
    pub fn mesh_specs(&self) -> anyhow::Result<Vec<MeshSpec>> {
        if self.diffuse.len() + self.emissive.len() != self.meshes.len() {
            anyhow::bail!(
                "each --mesh needs exactly one --diffuse or --emissive (got {} meshes, {} diffuse, {} emissive)",
                self.meshes.len(),
                self.diffuse.len(),
                self.emissive.len()
            );
        }
        let mut diffuse_iter = self.diffuse.iter();
        let mut emissive_iter = self.emissive.iter();
        let mut specs = Vec::with_capacity(self.meshes.len());
        // Diffuse flags are consumed before emissive flags; since clap
        // preserves each flag's own relative order but not their
        // interleaving, callers are expected to pass meshes grouped by
        // material kind (all-diffuse meshes, then all-emissive meshes).
        for path in &self.meshes {
            if let Some(rgb) = diffuse_iter.next() {
                specs.push(MeshSpec { path: path.clone(), material: Material::Diffuse { albedo: parse_vec3(rgb)? } });
            } else if let Some(rgb) = emissive_iter.next() {
                specs.push(MeshSpec { path: path.clone(), material: Material::Emissive { radiance: parse_vec3(rgb)? } });
            }
        }
        Ok(specs)
    }

    pub fn camera_position(&self) -> anyhow::Result<Vec3> {
        parse_vec3(&self.camera_pos)
    }

    pub fn look_at_point(&self) -> anyhow::Result<Vec3> {
        parse_vec3(&self.look_at)
    }
}

fn parse_vec3(s: &str) -> anyhow::Result<Vec3> {
    let parts: Vec<&str> = s.split(',').collect();
    anyhow::ensure!(parts.len() == 3, "expected `x,y,z`, got `{s}`");
    Ok(Vec3::new(parts[0].trim().parse()?, parts[1].trim().parse()?, parts[2].trim().parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vec3_reads_comma_separated_floats() {
        let v = parse_vec3("1,2.5,-3").unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.5, -3.0));
    }

    #[test]
    fn parse_vec3_rejects_wrong_component_count() {
        assert!(parse_vec3("1,2").is_err());
    }
}
