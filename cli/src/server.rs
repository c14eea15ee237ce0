use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use limit_battery_bridge::{BatteryBridge, EventSink, MethodReply, StreamEvent};
use limit_battery_platform::{PollWatch, SystemBattery};
use limit_battery_protocol::{
    BridgeRequest, BridgeResponse, DischargeLabel, VersionInfo, EVENT_CHANNEL,
    MIN_SUPPORTED_VERSION, PROTOCOL_VERSION,
};

use crate::config::{runtime_dir, LogLevel, UserConfig};

const SOCKET_NAME: &str = "limit-battery.sock";

pub fn socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_NAME)
}

pub fn is_server_running() -> bool {
    crate::client::BridgeClient::connect().is_ok()
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(color_eyre::Report),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

pub type Result<T> = std::result::Result<T, ServeError>;

type ClientId = u64;

enum ClientMessage {
    Request { request: BridgeRequest },
    Disconnect,
}

struct ClientHandle {
    response_tx: mpsc::Sender<BridgeResponse>,
    is_subscriber: bool,
}

/// Sink forwarding charging events onto one client's outbound queue.
///
/// The watcher thread calls this; `try_send` keeps it non-blocking and drops
/// the event when the subscriber has disconnected or cannot keep up.
struct ClientSink {
    channel: String,
    label: DischargeLabel,
    tx: mpsc::Sender<BridgeResponse>,
}

impl EventSink for ClientSink {
    fn emit(&self, event: StreamEvent) {
        let response = match event {
            StreamEvent::State(state) => BridgeResponse::Event {
                channel: self.channel.clone(),
                value: json!(state.wire_label(self.label)),
            },
            StreamEvent::Error(error) => BridgeResponse::ErrorEvent {
                channel: self.channel.clone(),
                error,
            },
        };
        let _ = self.tx.try_send(response);
    }
}

async fn client_reader_task(
    mut reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    msg_tx: mpsc::Sender<(ClientId, ClientMessage)>,
    client_id: ClientId,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
            Ok(_) => match BridgeRequest::from_json(line.trim()) {
                Ok(request) => {
                    if msg_tx
                        .send((client_id, ClientMessage::Request { request }))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!(client_id, error = %e, "Invalid request from client");
                }
            },
            Err(e) => {
                debug!(client_id, error = %e, "Client read error");
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
        }
    }
}

async fn client_writer_task(
    mut writer: tokio::net::unix::OwnedWriteHalf,
    mut response_rx: mpsc::Receiver<BridgeResponse>,
) {
    while let Some(response) = response_rx.recv().await {
        let json = match response.to_json() {
            Ok(j) => j,
            Err(_) => continue,
        };
        if writer
            .write_all(format!("{}\n", json).as_bytes())
            .await
            .is_err()
        {
            break;
        }
    }
}

pub fn run_server(
    foreground: bool,
    config: UserConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    let socket = socket_path();

    if socket.exists() {
        if is_server_running() {
            return Err(ServeError::AlreadyRunning);
        }
        fs::remove_file(&socket)?;
    }

    fs::create_dir_all(runtime_dir())?;

    if !foreground {
        match daemonize::Daemonize::new()
            .working_directory(runtime_dir())
            .start()
        {
            Ok(_) => {}
            Err(e) => return Err(ServeError::Daemonize(e.to_string())),
        }
        let _guard = crate::logging::init(
            config.log_level,
            crate::logging::LogMode::File,
            log_level_override,
        );
        std::mem::forget(_guard);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Server starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run_server_async(socket, config))
}

async fn run_server_async(socket: PathBuf, config: UserConfig) -> Result<()> {
    let source = SystemBattery::new().map_err(ServeError::Platform)?;
    let watch = PollWatch::new(Duration::from_millis(config.poll_interval_ms))
        .map_err(ServeError::Platform)?;
    let mut bridge = BatteryBridge::new(source, watch, config.emit_policy);
    bridge.attach();

    let listener = UnixListener::bind(&socket)?;
    info!(socket = ?socket, "Listening for connections");

    let (msg_tx, mut msg_rx) = mpsc::channel::<(ClientId, ClientMessage)>(256);
    let mut clients: HashMap<ClientId, ClientHandle> = HashMap::new();
    let mut next_client_id: ClientId = 1;
    let mut shutdown_requested = false;

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let client_id = next_client_id;
                        next_client_id += 1;
                        debug!(client_id, "Client connected");

                        let (reader, writer) = stream.into_split();
                        let (response_tx, response_rx) = mpsc::channel::<BridgeResponse>(64);

                        clients.insert(client_id, ClientHandle {
                            response_tx,
                            is_subscriber: false,
                        });

                        let msg_tx_clone = msg_tx.clone();
                        tokio::task::spawn_local(client_reader_task(
                            BufReader::new(reader),
                            msg_tx_clone,
                            client_id,
                        ));
                        tokio::task::spawn_local(client_writer_task(writer, response_rx));
                    }
                    Err(e) => {
                        error!(error = %e, "Socket accept error");
                    }
                }
            }
            Some((client_id, msg)) = msg_rx.recv() => {
                match msg {
                    ClientMessage::Disconnect => {
                        if let Some(client) = clients.remove(&client_id) {
                            if client.is_subscriber {
                                bridge.cancel(EVENT_CHANNEL).ok();
                                info!(client_id, "Subscriber disconnected");
                            }
                            debug!(client_id, count = clients.len(), "Client disconnected");
                        }
                    }
                    ClientMessage::Request { request } => {
                        debug!(client_id, request = ?request, "Handling request");

                        let response = handle_request(
                            &mut bridge,
                            &config,
                            &mut clients,
                            client_id,
                            request,
                            &mut shutdown_requested,
                        );

                        if let Some(client) = clients.get(&client_id) {
                            let _ = client.response_tx.send(response).await;
                        }

                        if shutdown_requested {
                            break;
                        }
                    }
                }
            }
        }
    }

    info!("Server shutting down");
    bridge.detach();
    fs::remove_file(&socket).ok();

    Ok(())
}

fn handle_request(
    bridge: &mut BatteryBridge<SystemBattery, PollWatch>,
    config: &UserConfig,
    clients: &mut HashMap<ClientId, ClientHandle>,
    client_id: ClientId,
    request: BridgeRequest,
    shutdown_requested: &mut bool,
) -> BridgeResponse {
    match request {
        BridgeRequest::MethodCall { channel, method } => {
            match bridge.handle_method(&channel, &method) {
                Ok(MethodReply::Success(value)) => BridgeResponse::MethodResult { channel, value },
                Ok(MethodReply::Error(error)) => BridgeResponse::MethodError { channel, error },
                Err(e) => BridgeResponse::Error(e.to_string()),
            }
        }
        BridgeRequest::Listen { channel } => {
            let Some(client) = clients.get(&client_id) else {
                return BridgeResponse::Error("Client not found".to_string());
            };

            let sink = Arc::new(ClientSink {
                channel: channel.clone(),
                label: config.discharge_label,
                tx: client.response_tx.clone(),
            });

            match bridge.listen(&channel, sink) {
                Ok(()) => {
                    // One subscriber at a time: a successful listen replaced
                    // whoever held the subscription before.
                    for handle in clients.values_mut() {
                        handle.is_subscriber = false;
                    }
                    if let Some(handle) = clients.get_mut(&client_id) {
                        handle.is_subscriber = true;
                    }
                    info!(client_id, "Subscriber added");
                    BridgeResponse::Listening { channel }
                }
                Err(e) => BridgeResponse::Error(e.to_string()),
            }
        }
        BridgeRequest::Cancel { channel } => {
            if channel != EVENT_CHANNEL {
                return BridgeResponse::Error(format!("Unknown channel: {}", channel));
            }

            let is_subscriber = clients
                .get(&client_id)
                .map(|c| c.is_subscriber)
                .unwrap_or(false);
            if is_subscriber {
                bridge.cancel(&channel).ok();
                if let Some(handle) = clients.get_mut(&client_id) {
                    handle.is_subscriber = false;
                }
                info!(client_id, "Subscriber removed");
            }
            // Cancelling without a subscription is a no-op.
            BridgeResponse::Cancelled { channel }
        }
        BridgeRequest::GetVersion => BridgeResponse::Version(VersionInfo {
            protocol_version: PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }),
        BridgeRequest::Shutdown => {
            info!("Shutdown requested by client");
            *shutdown_requested = true;
            BridgeResponse::Ok
        }
    }
}
