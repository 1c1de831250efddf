#![cfg(not(target_arch = "wasm32"))]

use std::panic;

use log::{error, info, LevelFilter};

use tile_planner::camera::{Camera, OrbitController};
use tile_planner::{FloorPlanner, FsTextureLoader, PlannerConfig, PlannerError, PlannerInputs, TextureLoader};

const ASSET_ENV: &str = "TILE_PLANNER_ASSETS";

fn main() {
    setup_diagnostics();

    if let Err(e) = run() {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Command line switches that are not form fields.
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    tile: Option<String>,
    json: bool,
}

/// Applies `args` to `planner`. An `inputs=<file.json>` record is applied
/// first, so `field=value` pairs override it wherever they appear.
fn apply_args<L: TextureLoader>(
    planner: &FloorPlanner<L>,
    args: impl IntoIterator<Item = String>,
) -> tile_planner::Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut inputs_file = None;
    let mut fields = Vec::new();

    for arg in args {
        if arg == "--json" {
            options.json = true;
            continue;
        }
        let (name, value) = arg
            .split_once('=')
            .ok_or_else(|| PlannerError::custom(format!("expected field=value, got {arg:?}")))?;
        match name {
            "tile" => options.tile = Some(value.to_string()),
            "inputs" => inputs_file = Some(value.to_string()),
            _ => fields.push((name.to_string(), value.to_string())),
        }
    }

    if let Some(path) = inputs_file {
        planner.set_inputs(PlannerInputs::from_path(path)?);
    }
    for (name, value) in &fields {
        planner.set_named_input(name, value)?;
    }
    Ok(options)
}

/// Usage: `tile_planner [--json] [inputs=<file.json>] [field=value ...] [tile=<design name>]`
fn run() -> anyhow::Result<()> {
    let config = PlannerConfig::default().with_asset_base(asset_base()?);
    info!("Starting tile planner, assets at {}", config.asset_base);

    let planner = FloorPlanner::new(config, FsTextureLoader);
    let options = apply_args(&planner, std::env::args().skip(1))?;

    pollster::block_on(async {
        planner.init().await;
        if let Some(name) = &options.tile {
            planner.set_tile_by_name(name).await?;
        }
        Ok::<_, PlannerError>(())
    })?;

    let snapshot = planner
        .snapshot()
        .ok_or_else(|| PlannerError::custom("planner produced no scene"))?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.report)?);
        return Ok(());
    }
    println!("{}", snapshot.report);

    if let Some(floor) = &snapshot.floor {
        let material = &floor.material;
        println!(
            "floor: {:.2} x {:.2} m, base color {}{}",
            floor.width_m,
            floor.length_m,
            material.base_color.key(),
            if material.base_color.is_fallback() { " (fallback)" } else { "" }
        );
    }
    if let Some(grid) = &snapshot.grid {
        println!(
            "grid: {} x {} periods, step {:.3} x {:.3} m, {} segments",
            grid.lines_x,
            grid.lines_z,
            grid.step_x,
            grid.step_z,
            grid.segment_count()
        );
    }

    let mut camera = Camera::default();
    OrbitController::default().update_camera(&mut camera, &snapshot.inputs.room);
    println!(
        "camera: ({:.2}, {:.2}, {:.2}) looking at the room center",
        camera.position.x, camera.position.y, camera.position.z
    );
    Ok(())
}

fn asset_base() -> anyhow::Result<String> {
    if let Ok(base) = std::env::var(ASSET_ENV) {
        return Ok(base);
    }
    let cwd = std::env::current_dir()?;
    Ok(format!("file://{}/", cwd.display()))
}

/// Logger plus a panic hook that reports through it.
fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_default();
        error!("planner panicked at {location}");
        default_hook(panic_info);
    }));
}
