use clap::{Parser, Subcommand};
use frameline_common::{MaterialDesc, MeshDesc, ParticleEmitterDesc, TextureSet, Transform};
use frameline_engine::{Engine, EngineConfig};
use frameline_kernel::{GameObject, MeshPart};
use frameline_render::RecordingDevice;
use glam::{Quat, Vec3};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const FRAME_TIME: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "frameline-cli", about = "Headless driver for the frameline engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Run frames over a generated scene against the recording device
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Number of objects to spawn
        #[arg(short, long, default_value = "8")]
        objects: usize,
        /// Pipeline strategy: forward or deferred
        #[arg(short, long)]
        pipeline: Option<String>,
        /// Force FXAA on
        #[arg(long)]
        fxaa: bool,
        /// Engine config file; without it the built-in global bundle is used
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run one frame and dump the render scene table
    Scene {
        /// Number of objects to spawn
        #[arg(short, long, default_value = "4")]
        objects: usize,
    },
}

fn start_engine(
    config: Option<PathBuf>,
    pipeline: Option<String>,
    fxaa: bool,
) -> anyhow::Result<Engine<RecordingDevice>> {
    let mut engine_config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(pipeline) = pipeline {
        engine_config.pipeline = pipeline;
    }
    if fxaa {
        engine_config.enable_fxaa = Some(true);
    }

    let assets = engine_config.asset_manager();
    let engine = if assets.exists(&engine_config.global_rendering_res_url) {
        Engine::start(&engine_config, RecordingDevice::new())?
    } else {
        tracing::info!(
            url = %engine_config.global_rendering_res_url,
            "global rendering resource not found, using built-in bundle"
        );
        let render_config = engine_config.builtin_render_config()?;
        Engine::with_render_config(render_config, assets, RecordingDevice::new())?
    };
    Ok(engine)
}

/// Lay objects out on a grid, alternating meshes and materials.
fn populate(engine: &mut Engine<RecordingDevice>, objects: usize) {
    let stone = MaterialDesc::textured(TextureSet {
        base_color: "asset/texture/stone/albedo.png".into(),
        normal: "asset/texture/stone/normal.png".into(),
        ..TextureSet::default()
    });
    for i in 0..objects {
        let position = Vec3::new((i % 4) as f32 * 2.0 - 3.0, 0.0, -((i / 4) as f32) * 2.0);
        let (mesh, material) = if i % 2 == 0 {
            ("asset/mesh/cube.obj", MaterialDesc::untextured())
        } else {
            ("asset/mesh/sphere.obj", stone.clone())
        };
        let id = engine.world_mut().spawn(GameObject::new(
            format!("object-{i}"),
            Transform::from_position(position),
            vec![MeshPart::new(MeshDesc::new(mesh), material)],
        ));
        if i == 0 {
            engine.world_mut().spawn_emitter(ParticleEmitterDesc {
                owner: Some(id),
                position,
                ..ParticleEmitterDesc::default()
            });
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("frameline-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("engine: {}", frameline_engine::crate_info());
            println!("render: {}", frameline_render::crate_info());
        }
        Commands::Run {
            frames,
            objects,
            pipeline,
            fxaa,
            config,
        } => {
            let mut engine = start_engine(config, pipeline, fxaa)?;
            populate(&mut engine, objects);
            println!("Running {frames} frames over {objects} objects");

            let ids: Vec<_> = engine.world().objects().keys().copied().collect();
            for frame in 0..frames {
                if let Some(&first) = ids.first() {
                    if let Some(mut transform) = engine.world().get(first).map(|o| o.transform) {
                        transform.rotation = Quat::from_rotation_y(frame as f32 * 0.1);
                        engine.world_mut().set_transform(first, transform)?;
                    }
                }
                if frame == frames / 2 {
                    if let Some(&last) = ids.last() {
                        engine.world_mut().despawn(last);
                    }
                }

                let report = engine.tick_one_frame(FRAME_TIME);
                println!(
                    "frame {:>3}: {} entities, {} visible, +{} ~{} -{}, {} passes ({})",
                    report.frame_index,
                    report.entity_count,
                    report.visible,
                    report.drain.entities_created,
                    report.drain.entities_updated,
                    report.drain.entities_deleted,
                    report.passes.len(),
                    report.strategy
                );
            }

            println!("FPS (simulated): {}", engine.fps());
            print!("{}", engine.render().device().summary());
            engine.shutdown();
        }
        Commands::Scene { objects } => {
            let mut engine = start_engine(None, None, false)?;
            populate(&mut engine, objects);
            engine.tick_one_frame(FRAME_TIME);

            let scene = engine.render().scene();
            println!("=== Render scene ({} entities) ===", scene.entity_count());
            for entity in scene.entities() {
                let p = entity.model_matrix.w_axis;
                println!(
                    "  {} object={} part={} mesh={} material={} pos=({:.2}, {:.2}, {:.2}) visible={}",
                    entity.instance_id,
                    entity.object_id,
                    entity.part_index,
                    entity.mesh_asset_id,
                    entity.material_asset_id,
                    p.x,
                    p.y,
                    p.z,
                    entity.visible
                );
            }
        }
    }

    Ok(())
}
