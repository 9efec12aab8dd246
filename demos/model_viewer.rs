//! Model Viewer Example
//!
//! Loads one PLY scan (or a whole scene from a JSON configuration), composes
//! it headlessly against a recording backend and orbits the camera for a few
//! frames.
//!
//! ```text
//! cargo run --bin model_viewer -- models/chair.ply --orientation x,z --scale '{"x": 2}'
//! cargo run --bin model_viewer -- --config scene.json
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use plyscene_io::{ImageTextureSource, PlyFileSource};
use plyscene_viewer::{RecordingBackend, ScaleSpec, Viewer, ViewerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "model_viewer")]
#[command(about = "Compose a PLY scan into a scene and orbit around it")]
struct Args {
    /// PLY file to load
    model: Option<PathBuf>,

    /// Viewer configuration (JSON); replaces the model options
    #[arg(long, value_name = "FILE", conflicts_with = "model")]
    config: Option<PathBuf>,

    /// Comma separated quarter turns, e.g. "x,z" or "-y"
    #[arg(long, default_value = "z")]
    orientation: String,

    /// Uniform number or JSON object such as '{"x": 2}'
    #[arg(long)]
    scale: Option<String>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Frames to render
    #[arg(long, default_value_t = 120)]
    frames: usize,

    /// Orbit step per frame in radians
    #[arg(long, default_value_t = 0.01)]
    orbit: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match (&args.config, &args.model) {
        (Some(path), _) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        (None, Some(model)) => {
            let mut config =
                ViewerConfig::single(model, args.orientation.clone(), args.width, args.height);
            if let Some(scale) = &args.scale {
                config.models[0].scale = serde_json::from_str::<ScaleSpec>(scale)
                    .with_context(|| format!("Invalid scale {:?}", scale))?;
            }
            config
        }
        (None, None) => bail!("Either a model path or --config is required"),
    };

    println!("plyscene Model Viewer");
    println!("=====================");

    let mut viewer = Viewer::new(
        RecordingBackend::new(),
        PlyFileSource::new(),
        ImageTextureSource::new(),
        config,
    )?;
    viewer.mount();

    let loaded = viewer.geometry_source_mut().process_pending();
    let textures = viewer.texture_source_mut().process_pending();
    println!("Resolved {} geometry and {} texture request(s)", loaded, textures);

    for _ in 0..args.frames {
        viewer.orbit(args.orbit, 0.0);
        viewer.frame();
    }

    println!("State: {:?}", viewer.state());
    for object in viewer.composer().objects() {
        println!(
            "  {} {}: {}, {} ({} vertices)",
            object.role,
            object.source.display(),
            object.classification,
            object.material.variant_name(),
            object.vertex_count()
        );
    }
    for diagnostic in viewer.diagnostics() {
        println!("  warning: {}", diagnostic);
    }

    let camera = viewer.camera();
    println!(
        "Rendered {} frame(s), camera at ({:.1}, {:.1}, {:.1})",
        viewer.backend().frames_rendered(),
        camera.position.x,
        camera.position.y,
        camera.position.z
    );

    viewer.dispose();
    Ok(())
}
