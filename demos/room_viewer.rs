//! Room Viewer Example
//!
//! Places a subject scan inside a fixed room scan. The subject sits in its
//! own control group, so the camera can orbit it while the room stays put.

use anyhow::Result;
use clap::Parser;
use plyscene_io::{ImageTextureSource, PlyFileSource};
use plyscene_viewer::{
    ModelEntry, RecordingBackend, Role, Viewer, ViewerConfig, ViewerState, SUBJECT_GROUP,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "room_viewer")]
#[command(about = "Compose a subject scan inside a room scan")]
struct Args {
    /// PLY scan of the room
    room: PathBuf,

    /// PLY scan of the subject
    subject: PathBuf,

    #[arg(long, default_value = "x,y,z")]
    room_orientation: String,

    #[arg(long, default_value = "")]
    subject_orientation: String,

    /// Uniform room scale
    #[arg(long, default_value_t = 1.0)]
    room_scale: f32,

    /// Height of the subject's orbit centre
    #[arg(long, default_value_t = 0.0)]
    subject_height: f32,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 768)]
    height: u32,

    #[arg(long, default_value_t = 60)]
    frames: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let room = ModelEntry::new(Role::Room, &args.room)
        .with_orientation(args.room_orientation.clone())
        .with_scale(args.room_scale);
    let subject =
        ModelEntry::new(Role::Subject, &args.subject).with_orientation(args.subject_orientation.clone());

    let mut config = ViewerConfig::room_and_subject(room, subject, args.width, args.height);
    config.control_groups[0].anchor = [0.0, args.subject_height, 0.0];

    let mut viewer = Viewer::new(
        RecordingBackend::new(),
        PlyFileSource::new(),
        ImageTextureSource::new(),
        config,
    )?;
    viewer.mount();

    // Compose one model at a time, the way loads arrive in practice
    while viewer.geometry_source_mut().process_next() {
        viewer.frame();
        println!("Loading... {:.0}%", viewer.load_progress() * 100.0);
    }
    viewer.texture_source_mut().process_pending();

    if viewer.state() != ViewerState::Composed {
        log::warn!("Scene is {:?} after all loads resolved", viewer.state());
    }

    viewer.focus_group(SUBJECT_GROUP);
    for _ in 0..args.frames {
        viewer.orbit(0.02, 0.0);
        viewer.frame();
    }

    let composer = viewer.composer();
    println!("Composed {} of 2 model(s)", composer.len());
    for object in composer.objects() {
        let group = object
            .group
            .and_then(|id| composer.group(id))
            .map(|g| g.name.as_str())
            .unwrap_or("scene root");
        println!(
            "  {} in {}: {} ({} vertices)",
            object.role,
            group,
            object.material.variant_name(),
            object.vertex_count()
        );
    }
    drop(composer);

    for diagnostic in viewer.diagnostics() {
        println!("  warning: {}", diagnostic);
    }
    println!("Rendered {} frame(s)", viewer.backend().frames_rendered());

    viewer.dispose();
    Ok(())
}
