//! tileview-client binary
//!
//! Replays newline-delimited snapshot JSON into a [`ViewerClient`] driven by
//! the headless engine at a fixed frame rate, logging viewer statistics.
//!
//! ## Configuration (env / TOML via `config` crate, CLI overrides)
//!
//! | Flag / key            | Env                         | Default | Description                     |
//! |-----------------------|-----------------------------|---------|---------------------------------|
//! | `--config`            | `TILEVIEW_CONFIG`           | –       | TOML file with `ViewerConfig`   |
//! | `--source`            | `TILEVIEW_SOURCE`           | `-`     | JSON-lines file (`-` = stdin)   |
//! | `--interval-ms`       | `TILEVIEW_INTERVAL_MS`      | `100`   | Delay between replayed messages |
//! | `--fps`               | `TILEVIEW_FPS`              | `60`    | Frame rate                      |
//! | `--mode`              | `TILEVIEW_MODE`             | `admin` | `admin` / `spectator` / `player`|
//! | `--view`              | `TILEVIEW_INITIAL_VIEW`     | `client`| Initial layer                   |
//! | `--orbit-rate`        | `TILEVIEW_ORBIT_RATE`       | `0`     | Camera orbit (rad/s)            |
//! | `--stats-every-secs`  | –                           | `5`     | Stats log period                |
//! | `--exit-when-done`    | –                           | off     | Stop once the source is drained |

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use tileview::{
    engine::HeadlessEngine, feed, ClientMode, ViewMode, ViewerClient, ViewerConfig,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Admin,
    Spectator,
    Player,
}

impl From<ModeArg> for ClientMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Admin => ClientMode::Admin,
            ModeArg::Spectator => ClientMode::Spectator,
            ModeArg::Player => ClientMode::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    Client,
    Counts,
    Values,
}

impl From<ViewArg> for ViewMode {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Client => ViewMode::Client,
            ViewArg::Counts => ViewMode::Counts,
            ViewArg::Values => ViewMode::Values,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tileview-client", about = "Tileview headless viewer", version)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "TILEVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot source: JSON lines file, or `-` for stdin
    #[arg(long, env = "TILEVIEW_SOURCE")]
    source: Option<PathBuf>,

    /// Delay between replayed messages (ms)
    #[arg(long, env = "TILEVIEW_INTERVAL_MS", default_value_t = 100)]
    interval_ms: u64,

    /// Frame rate (Hz)
    #[arg(long, env = "TILEVIEW_FPS")]
    fps: Option<f32>,

    /// Client mode
    #[arg(long, env = "TILEVIEW_MODE", value_enum)]
    mode: Option<ModeArg>,

    /// Initial view
    #[arg(long, env = "TILEVIEW_INITIAL_VIEW", value_enum)]
    view: Option<ViewArg>,

    /// Camera orbit speed around the grid centre (rad/s)
    #[arg(long, env = "TILEVIEW_ORBIT_RATE")]
    orbit_rate: Option<f32>,

    /// Seconds between statistics log lines
    #[arg(long, default_value_t = 5.0)]
    stats_every_secs: f32,

    /// Stop after the source is exhausted and the inbox drained
    #[arg(long)]
    exit_when_done: bool,
}

impl Args {
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(view) = self.view {
            config.initial_view = view.into();
        }
        if let Some(rate) = self.orbit_rate {
            config.orbit_rate = rate;
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tileview=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = ViewerConfig::load(args.config.as_deref())
        .context("failed to load viewer configuration")?;
    args.apply(&mut config);

    info!(
        "Starting tileview-client (mode={:?}, view={}, fps={}, orbit={})",
        config.mode, config.initial_view, config.fps, config.orbit_rate,
    );

    let span = tracing::info_span!("viewer", mode = ?config.mode);
    run(args, config).instrument(span).await
}

async fn run(args: Args, config: ViewerConfig) -> Result<()> {
    let mut engine = HeadlessEngine::new(&config);
    let mut client = ViewerClient::new(config.clone());

    let source = feed::open_source(args.source.as_deref())
        .await
        .context("failed to open snapshot source")?;
    let sender = client.sender();
    let interval = Duration::from_millis(args.interval_ms);
    let mut feeder =
        tokio::spawn(async move { feed::replay_lines(source, &sender, interval).await });
    let mut feed_done = false;

    let fps = if config.fps.is_finite() && config.fps > 0.0 {
        config.fps
    } else {
        60.0
    };
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(1.0 / fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let stats_every = Duration::from_secs_f32(args.stats_every_secs.max(0.1));
    let mut last_report = Instant::now();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted; shutting down");
                break;
            }

            joined = &mut feeder, if !feed_done => {
                feed_done = true;
                match joined {
                    Ok(Ok(n)) => info!("Snapshot source finished ({} messages)", n),
                    Ok(Err(e)) => warn!("Snapshot source failed: {}", e),
                    Err(e) => warn!("Replay task aborted: {}", e),
                }
            }

            _ = ticker.tick() => {
                let now = Instant::now();
                client.tick(&mut engine, now);

                if now.duration_since(last_report) >= stats_every {
                    info!("{:?}", client.stats());
                    last_report = now;
                }

                if args.exit_when_done && feed_done && client.pending() == 0 {
                    break;
                }
            }
        }
    }

    if !feed_done {
        feeder.abort();
    }

    info!(
        "Final stats: {:?} (entities={}, view={}, frames drawn={})",
        client.stats(),
        client.entities().len(),
        client.view(),
        engine.frames_drawn(),
    );
    Ok(())
}
