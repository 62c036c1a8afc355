/*
 *  connection.rs
 *
 *  SWRPanel - remote panel for the ESP32 SWR controller
 *  (c) 2024-26 SWRPanel contributors
 *
 *  Websocket link to the controller: supervisor, inbound frames, clicks
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::level::LevelWriter;
use crate::message::{ActionCommand, DeviceMessage};
use crate::panel::PanelWriter;
use crate::render::{stop_channel, StopHandle, StopSignal};

pub const DEFAULT_ENDPOINT: &str = "ws://192.168.4.1/ws";
pub const DEFAULT_RECONNECT_MS: u64 = 2000;

type DeviceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not connected, command dropped")]
    NotConnected,

    #[error("device closed the connection")]
    Disconnected,

    #[error("connection manager has shut down")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_MS),
        }
    }
}

/// Owns the writing side of the level cell and the panel state, and keeps
/// a websocket to the controller open for as long as it runs.
pub struct ConnectionManager {
    config: ConnectionConfig,
    level: LevelWriter,
    panel: PanelWriter,
}

enum SessionEnd {
    Stopped,
    Lost(ConnectionError),
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, level: LevelWriter, panel: PanelWriter) -> Self {
        Self { config, level, panel }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Apply one inbound text frame. Fields that are present overwrite,
    /// absent fields leave the panel alone. Nothing changes on a bad frame.
    pub fn on_message(&self, text: &str) -> Result<(), ConnectionError> {
        let msg = DeviceMessage::parse(text)?;
        if let Some(raw) = &msg.level {
            self.level.set_raw(raw);
        }
        self.panel.send_if_modified(|panel| panel.apply(&msg));
        Ok(())
    }

    /// Spawn the supervisor on the current runtime.
    pub fn connect(self) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = watch::channel(false);
        let (stop, signal) = stop_channel();

        let task = tokio::spawn(self.supervise(rx, connected_tx, signal));

        ConnectionHandle {
            sender: ActionSender { tx, connected: connected_rx },
            stop,
            task,
        }
    }

    async fn supervise(
        self,
        mut outbound: mpsc::UnboundedReceiver<ActionCommand>,
        connected: watch::Sender<bool>,
        mut stop: StopSignal,
    ) {
        let endpoint = self.config.endpoint.clone();
        let mut attempt: u32 = 0;

        'supervisor: loop {
            attempt += 1;
            debug!("connecting to {endpoint} (attempt {attempt})");

            let connecting = tokio::select! {
                biased;
                _ = stop.stopped() => break 'supervisor,
                res = connect_async(endpoint.as_str()) => res,
            };

            match connecting {
                Ok((ws, _)) => {
                    info!("connected to {endpoint}");
                    attempt = 0;
                    connected.send_replace(true);
                    let end = self.session(ws, &mut outbound, &mut stop).await;
                    connected.send_replace(false);
                    match end {
                        SessionEnd::Stopped => break 'supervisor,
                        SessionEnd::Lost(e) => warn!("connection to {endpoint} lost: {e}"),
                    }
                }
                Err(e) => warn!("connect to {endpoint} failed: {e}"),
            }

            // fixed delay; clicks made while down are dropped, not replayed
            let pause = tokio::time::sleep(self.config.reconnect_delay);
            tokio::pin!(pause);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.stopped() => break 'supervisor,
                    _ = &mut pause => break,
                    Some(cmd) = outbound.recv() => {
                        warn!("not connected, dropping action {:?}", cmd.action);
                    }
                }
            }
        }

        connected.send_replace(false);
        info!("connection supervisor for {endpoint} stopped");
    }

    async fn session(
        &self,
        ws: DeviceStream,
        outbound: &mut mpsc::UnboundedReceiver<ActionCommand>,
        stop: &mut StopSignal,
    ) -> SessionEnd {
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!("close handshake failed: {e}");
                    }
                    return SessionEnd::Stopped;
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.on_message(&text) {
                            warn!("dropping frame from device: {e}");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Lost(ConnectionError::Disconnected);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Lost(e.into()),
                },
                Some(cmd) = outbound.recv() => {
                    let json = match cmd.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("cannot encode action {:?}: {e}", cmd.action);
                            continue;
                        }
                    };
                    debug!("-> {json}");
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        warn!("action {:?} not delivered", cmd.action);
                        return SessionEnd::Lost(e.into());
                    }
                }
            }
        }
    }
}

/// Cloneable click sender, for tasks other than the handle owner.
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: mpsc::UnboundedSender<ActionCommand>,
    connected: watch::Receiver<bool>,
}

impl ActionSender {
    /// Queue a click as `{"action": <action>}`. Dropped with a warning
    /// while the link is down.
    pub fn send(&self, action: impl Into<String>) -> Result<(), ConnectionError> {
        let cmd = ActionCommand::new(action);
        if !*self.connected.borrow() {
            warn!("not connected, dropping action {:?}", cmd.action);
            return Err(ConnectionError::NotConnected);
        }
        self.tx.send(cmd).map_err(|_| ConnectionError::Closed)
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Resolves once a session is up. `Closed` if the supervisor is gone.
    pub async fn wait_connected(&self) -> Result<(), ConnectionError> {
        let mut rx = self.connected.clone();
        rx.wait_for(|up| *up).await.map(|_| ()).map_err(|_| ConnectionError::Closed)
    }
}

/// Every non-empty line of `input` is one click. Returns the number of
/// clicks queued once `input` hits EOF or fails; the link is untouched.
pub async fn forward_clicks<R: AsyncBufRead + Unpin>(input: R, sender: &ActionSender) -> usize {
    let mut lines = input.lines();
    let mut sent = 0;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let action = line.trim();
                if action.is_empty() {
                    continue;
                }
                // a refused click is already logged by the sender
                if sender.send(action).is_ok() {
                    info!("action {action:?} sent");
                    sent += 1;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("click input read failed: {e}");
                break;
            }
        }
    }
    sent
}

/// Returned by `ConnectionManager::connect`. Dropping it stops the supervisor.
pub struct ConnectionHandle {
    sender: ActionSender,
    stop: StopHandle,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn send(&self, action: impl Into<String>) -> Result<(), ConnectionError> {
        self.sender.send(action)
    }

    pub fn sender(&self) -> ActionSender {
        self.sender.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_connected()
    }

    pub async fn wait_connected(&self) -> Result<(), ConnectionError> {
        self.sender.wait_connected().await
    }

    /// Close the socket and wait for the supervisor to finish.
    pub async fn shutdown(self) {
        self.stop.stop();
        if let Err(e) = self.task.await {
            warn!("connection supervisor ended abnormally: {e}");
        }
    }
}
