/*
 *  main.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *	(c) 2024-26 SWRPanel contributors
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::io::BufReader;
use tokio::task::JoinHandle;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use swrpanel::config::{self, Cli, Config};
use swrpanel::display::{MemorySurface, PpmSurface, Surface};
use swrpanel::level::{self, LevelReader};
use swrpanel::pacer::IntervalClock;
use swrpanel::panel::{self, PanelReader};
use swrpanel::{forward_clicks, stop_channel, ActionSender, ConnectionManager, LoopExit, RenderLoop, StopSignal};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

// the controller itself reports at most every 200ms
const SNAPSHOT_WRITES_PER_SEC: u32 = 5;

// how long scripted --action clicks wait for the first connection
const ACTION_WAIT: Duration = Duration::from_secs(30);

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
///
/// Once a signal is caught, it logs the event and returns, allowing for
/// graceful shutdown.
#[cfg(unix)]
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

/// Every non-empty stdin line is one click. Returns on EOF.
async fn read_clicks(sender: ActionSender) {
    let sent = forward_clicks(BufReader::new(tokio::io::stdin()), &sender).await;
    info!("stdin closed after {sent} clicks");
}

/// Build the render loop (bad meter settings are fatal here) and run it
/// on its own task. The surface is disposed when the loop ends.
fn start_render<S: Surface + 'static>(
    surface: S,
    cfg: &Config,
    level: LevelReader,
    panel: PanelReader,
    mut stop: StopSignal,
) -> anyhow::Result<JoinHandle<LoopExit>> {
    let mut render = RenderLoop::new(surface, cfg.meter_config(), cfg.meter_fraction(), level, panel)
        .context("level meter configuration")?;
    let mut clock = IntervalClock::new(cfg.fps());
    info!("rendering at {} fps", cfg.fps());

    Ok(tokio::spawn(async move {
        let exit = render.run(&mut clock, &mut stop).await;
        render.surface_mut().dispose();
        exit
    }))
}

async fn run(cli: Cli, cfg: Config) -> anyhow::Result<()> {
    let (level_tx, level_rx) = level::channel();
    let (panel_tx, panel_rx) = panel::channel();
    let (stop, signal) = stop_channel();

    let (width, height) = cfg.surface_size();
    let mut render = match cfg.snapshot() {
        Some(path) => {
            info!("snapshot {}x{} to {}", width, height, path.display());
            let surface = PpmSurface::new(path, width, height, SNAPSHOT_WRITES_PER_SEC);
            start_render(surface, &cfg, level_rx, panel_rx, signal)?
        }
        None => {
            info!("headless {}x{} panel", width, height);
            start_render(MemorySurface::new(width, height), &cfg, level_rx, panel_rx, signal)?
        }
    };

    let conn_cfg = cfg.connection_config();
    info!("controller at {}, reconnect every {:?}", conn_cfg.endpoint, conn_cfg.reconnect_delay);
    let connection = ConnectionManager::new(conn_cfg, level_tx, panel_tx).connect();

    if !cli.actions.is_empty() {
        let sender = connection.sender();
        let actions = cli.actions.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(ACTION_WAIT, sender.wait_connected()).await {
                Ok(Ok(())) => {
                    for action in actions {
                        if let Err(e) = sender.send(action.as_str()) {
                            warn!("scripted action {action:?} not sent: {e}");
                        }
                    }
                }
                Ok(Err(e)) => warn!("scripted actions dropped: {e}"),
                Err(_) => warn!("not connected after {:?}, scripted actions dropped", ACTION_WAIT),
            }
        });
    }

    // Main application loop. Closing stdin only ends click input unless
    // --exit-on-eof asks for a shutdown.
    let signals = signal_handler();
    let clicks = read_clicks(connection.sender());
    tokio::pin!(signals, clicks);
    let mut reading_clicks = true;
    let mut finished = None;
    loop {
        tokio::select! {
            res = &mut signals => {
                if let Err(e) = res {
                    error!("signal handling failed: {e}");
                }
                break;
            }
            () = &mut clicks, if reading_clicks => {
                reading_clicks = false;
                if cli.exit_on_eof {
                    info!("stdin closed. Initiating graceful shutdown.");
                    break;
                }
            }
            res = &mut render => {
                finished = Some(res);
                break;
            }
        }
    }

    stop.stop();
    let exit = match finished {
        Some(res) => res,
        None => render.await,
    };
    match exit {
        Ok(exit) => info!("render loop finished: {exit:?}"),
        Err(e) => error!("render task failed: {e}"),
    }

    connection.shutdown().await;
    info!("Main application exiting.");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_with(&cli).context("loading configuration")?;

    if cli.dump_config {
        println!("{}", cfg.to_yaml()?);
        return Ok(());
    }

    // Initialize the logger with the configured level, RUST_LOG wins
    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("{} - remote panel for the ESP32 SWR controller", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    // one thread: supervisor, render loop and stdin reader are all tasks on it
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the runtime")?;
    let result = runtime.block_on(run(cli, cfg));

    // the stdin reader may still be parked in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}
