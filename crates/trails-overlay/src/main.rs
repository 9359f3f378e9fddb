//! Cursor trail overlay entry point.
//!
//! Wires the infrastructure adapters to the render loop and runs until
//! Ctrl-C, or until a replayed input script has been played back and the
//! trail has faded out.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load settings  (TOML file + command-line overrides)
//!  └─ ConfigManager  (validate; refuse to start if invalid)
//!  └─ start services
//!       ├─ InputSource      (replay thread driving the simulated cursor, or idle)
//!       ├─ SettingsWatcher  (Tokio task, hot reload)
//!       └─ RenderLoop       (Tokio task: drain input, compose, present)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trails_core::{AssetProvider, ConfigManager};

use trails_overlay::application::recenter::CursorController;
use trails_overlay::application::render_loop::{RenderLoop, SessionClock};
use trails_overlay::application::session::OverlaySession;
use trails_overlay::infrastructure::assets::AssetRegistry;
use trails_overlay::infrastructure::cursor::SimulatedCursor;
use trails_overlay::infrastructure::display::{FrameSink, JsonLinesSurface, NullSurface};
use trails_overlay::infrastructure::input_capture::idle::IdleInputSource;
use trails_overlay::infrastructure::input_capture::replay::ReplayInputSource;
use trails_overlay::infrastructure::input_capture::{InputSource, InputSubscription};
use trails_overlay::infrastructure::storage::settings::{
    load_settings_from, settings_file_path, SettingsOverrides, SettingsWatcher,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Draws a fading trail behind the pointer.
#[derive(Debug, Parser)]
#[command(
    name = "trails-overlay",
    about = "Renders a fading cursor trail with press/release markers",
    version
)]
struct Cli {
    /// Settings file.  Defaults to the platform config directory.
    #[arg(long, env = "CURSOR_TRAILS_CONFIG")]
    config: Option<PathBuf>,

    /// Replay pointer input from a JSON-lines script instead of waiting idle.
    ///
    /// The overlay exits once the script has ended and the trail has faded.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Deliver replayed events as fast as possible instead of at their
    /// recorded times.
    #[arg(long, requires = "replay")]
    unpaced: bool,

    /// Write every frame as one JSON line to this file (`-` for stdout).
    #[arg(long)]
    frames_out: Option<PathBuf>,

    /// Trail style, overriding the settings file.
    #[arg(long)]
    style: Option<String>,

    /// Never warp the OS cursor, whatever the settings file says.
    #[arg(long)]
    no_recenter: bool,

    /// How often the settings file is checked for changes, in milliseconds.
    #[arg(long, default_value_t = 500, env = "CURSOR_TRAILS_WATCH_MS")]
    watch_interval_ms: u64,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            style: self.style.clone(),
            disable_recentering: self.no_recenter,
        }
    }

    fn settings_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => settings_file_path().context("no --config given"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.settings_path()?;
    let overrides = cli.overrides();
    let mut settings = load_settings_from(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;
    overrides.apply(&mut settings);

    // Logs go to stderr so `--frames-out -` keeps stdout clean.  `RUST_LOG`
    // wins over the settings file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(settings = %settings_path.display(), "cursor trail overlay starting");

    // ── Configuration ─────────────────────────────────────────────────────────
    let base_dir = settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let assets: Arc<dyn AssetProvider> = Arc::new(AssetRegistry::new(base_dir));
    let mut manager = ConfigManager::new();
    let candidate = settings
        .to_overlay_config(assets.as_ref())
        .context("settings are invalid; refusing to start")?;
    let config = manager
        .apply(candidate)
        .context("settings are invalid; refusing to start")?;

    // ── Services ──────────────────────────────────────────────────────────────
    let clock = SessionClock::start();
    let os_cursor = Arc::new(SimulatedCursor::new(config.recentering.screen));
    let cursor = Arc::clone(&os_cursor) as Arc<dyn CursorController>;

    let (source, drain): (Arc<dyn InputSource>, bool) = match &cli.replay {
        Some(path) => {
            let replay = ReplayInputSource::from_path(path, clock.epoch().into_std())
                .with_context(|| format!("failed to load replay script {}", path.display()))?
                .paced(!cli.unpaced)
                .driving(os_cursor);
            info!(events = replay.len(), "replaying input script");
            (Arc::new(replay), true)
        }
        None => {
            info!("no input script given; rendering until Ctrl-C");
            (Arc::new(IdleInputSource::new()), false)
        }
    };
    let (subscription, input) =
        InputSubscription::start(source).context("failed to start input source")?;

    let sink: Arc<dyn FrameSink> = match cli.frames_out.as_deref() {
        Some(path) if path == Path::new("-") => Arc::new(JsonLinesSurface::stdout()),
        Some(path) => Arc::new(
            JsonLinesSurface::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Arc::new(NullSurface::new()),
    };

    let (config_tx, config_rx) = watch::channel(Arc::clone(&config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let watcher = SettingsWatcher::new(&settings_path, Arc::clone(&assets), manager, overrides);
    let watcher_task = tokio::spawn(watcher.run(
        config_tx,
        Duration::from_millis(cli.watch_interval_ms.max(1)),
        shutdown_rx.clone(),
    ));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = signal_tx.send(true);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    // ── Render loop ───────────────────────────────────────────────────────────
    let session = OverlaySession::new(config, cursor);
    let stats = RenderLoop::new(session, sink, clock)
        .stop_when_drained(drain)
        .run(input, config_rx, shutdown_rx)
        .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = watcher_task.await {
        error!("settings watcher task failed: {e}");
    }
    drop(subscription);

    info!(
        frames = stats.frames,
        events = stats.events,
        reloads = stats.config_reloads,
        sink_failures = stats.sink_failures,
        "cursor trail overlay stopped"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
