//! Pyramid Viewer - tile pyramid builder and viewport renderer.
//!
//! This binary builds tile sets, inspects them and renders viewport frames.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pyramid_viewer::{
    config::{BuildConfig, Cli, Command, InspectConfig, RenderConfig},
    load_source, spawn_build,
    store::{tile_path, TileStore},
    write_tile_set, BuildEvent, DirectoryTileStore, TileKey, ViewportRenderer,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Build(config) => run_build(config).await,
        Command::Inspect(config) => run_inspect(config).await,
        Command::Render(config) => run_render(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pyramid_viewer=debug"
    } else {
        "pyramid_viewer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Build Command
// =============================================================================

async fn run_build(config: BuildConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = config.build_options();
    info!("Loading {}", config.input.display());

    let input = config.input.clone();
    let source = match tokio::task::spawn_blocking(move || load_source(&input, &options)).await {
        Ok(Ok(source)) => source,
        Ok(Err(e)) => {
            error!("Failed to load {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Loader task failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("  Source: {}x{}", source.width(), source.height());
    info!("  Filter: {:?}", config.filter);

    let mut handle = spawn_build(source, options);
    let mut bar: Option<ProgressBar> = None;

    let pyramid = loop {
        match handle.next_event().await {
            Some(BuildEvent::Progress {
                level,
                total_levels,
            }) => {
                if config.no_progress {
                    continue;
                }
                let pb = bar.get_or_insert_with(|| level_bar(total_levels as u64));
                pb.set_position((total_levels - level) as u64);
            }
            Some(BuildEvent::Done(pyramid)) => break pyramid,
            Some(BuildEvent::Failed { message }) => {
                if let Some(pb) = bar.take() {
                    pb.abandon();
                }
                error!("Build failed: {}", message);
                return ExitCode::FAILURE;
            }
            None => {
                error!("Build ended without a result");
                return ExitCode::FAILURE;
            }
        }
    };
    if let Some(pb) = bar.take() {
        pb.finish();
    }

    info!(
        "Built {} level(s), {} tile(s)",
        pyramid.num_levels(),
        pyramid.tile_count()
    );

    if let Err(e) = write_tile_set(&pyramid, &config.output).await {
        error!("Failed to write tile set: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Saved to {}", config.output.display());
    ExitCode::SUCCESS
}

fn level_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Tiling [{bar:40}] {pos}/{len} levels")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

// =============================================================================
// Inspect Command
// =============================================================================

async fn run_inspect(config: InspectConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let store = match DirectoryTileStore::open(&config.dir).await {
        Ok(store) => store,
        Err(e) => {
            println!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let manifest = store.manifest();
    let layout = store.layout();

    println!("Tile Set {}", config.dir.display());
    println!("═════════════════════════════════");
    println!(
        "Original: {}x{}",
        manifest.original_dimensions.width, manifest.original_dimensions.height
    );
    println!("Levels:   {}", manifest.num_levels);
    println!("Tiles:    {}", layout.total_tiles());
    println!();
    println!("Level   Width   Height   Cols   Rows   Scale");
    println!("─────────────────────────────────────────────");
    for level in layout.levels() {
        println!(
            "{:>5} {:>7} {:>8} {:>6} {:>6} {:>6}x",
            level.index, level.width, level.height, level.cols, level.rows, level.scale
        );
    }

    if config.check_tiles {
        println!();
        print!("Checking tiles... ");
        let _ = std::io::stdout().flush();

        let mut missing = Vec::new();
        for level in layout.levels() {
            for row in 0..level.rows {
                for col in 0..level.cols {
                    let key = TileKey::new(level.index, row, col);
                    if !store.tile_file(key).is_file() {
                        missing.push(tile_path(key));
                    }
                }
            }
        }

        if missing.is_empty() {
            println!("✓ all present");
        } else {
            println!("✗ {} missing", missing.len());
            for path in missing.iter().take(10) {
                println!("  {}", path);
            }
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let store = match DirectoryTileStore::open(&config.dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open tile set: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut renderer = ViewportRenderer::fit_to_display(store, config.display);
    let frame = renderer.viewport().size();
    if frame.is_empty() {
        error!("Display area is too small for a frame");
        return ExitCode::FAILURE;
    }
    info!("  Frame: {}x{}", frame.width, frame.height);

    renderer.render();

    let at = config.click_point(frame);
    for _ in 0..config.zoom_in {
        if renderer.click(at, false).is_none() {
            warn!("Already at the finest level");
            break;
        }
    }
    for step in &config.pan {
        if !renderer.pan_by((*step).into()) {
            warn!("Pan {:?} had no effect", step);
        }
    }

    renderer.settle().await;

    if let Some(state) = renderer.viewport().state() {
        info!(
            "  Level {} ({}x zoom), pan ({:.1}, {:.1})",
            state.zoom_index,
            renderer.viewport().zoom_factor(),
            state.pan.x,
            state.pan.y
        );
    }

    if let Err(e) = renderer.surface().save(&config.output) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    println!("Saved to {}", config.output.display());
    ExitCode::SUCCESS
}
