use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use limit_battery_protocol::{
    BridgeRequest, BridgeResponse, ErrorEnvelope, VersionInfo, EVENT_CHANNEL, GET_BATTERY_LEVEL,
    METHOD_CHANNEL, MIN_SUPPORTED_VERSION, PROTOCOL_VERSION,
};

use crate::server::socket_path;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("{}: {}", .0.code, .0.message)]
    Channel(ErrorEnvelope),

    #[error(
        "Protocol version mismatch: client uses protocol v{client}, server uses v{server}.\n\
         Restart the server: limit-battery stop && limit-battery serve"
    )]
    VersionMismatch { client: u32, server: u32 },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// One received emission on the charging stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChargingEvent {
    /// Wire state string: "charging", "full", and the configured discharge
    /// label ("discharging" or "unplugged").
    State(String),
    Error(ErrorEnvelope),
}

/// Checks that client and server speak compatible protocol versions.
pub fn check_version_compatibility(info: &VersionInfo) -> Result<()> {
    if PROTOCOL_VERSION < info.min_supported_version
        || info.protocol_version < MIN_SUPPORTED_VERSION
    {
        return Err(ClientError::VersionMismatch {
            client: PROTOCOL_VERSION,
            server: info.protocol_version,
        });
    }
    Ok(())
}

/// Blocking line-JSON client for the bridge socket.
pub struct BridgeClient {
    stream: UnixStream,
    read_buffer: Vec<u8>,
}

impl BridgeClient {
    pub fn connect() -> Result<Self> {
        let path = socket_path();
        let stream = UnixStream::connect(&path)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;
        Ok(Self {
            stream,
            read_buffer: Vec::with_capacity(8 * 1024),
        })
    }

    /// Connects and validates protocol version compatibility. Preferred for
    /// all subcommands.
    pub fn connect_with_version_check() -> Result<Self> {
        let mut client = Self::connect()?;
        let info = client.get_version()?;
        check_version_compatibility(&info)?;
        Ok(client)
    }

    fn read_line_blocking(&mut self) -> Result<String> {
        let mut temp_buf = [0u8; 8192];
        loop {
            if let Some(pos) = self.read_buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = self.read_buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line_bytes).to_string();
                return Ok(line);
            }
            let n = self.stream.read(&mut temp_buf)?;
            if n == 0 {
                return Err(ClientError::Protocol("Connection closed".into()));
            }
            self.read_buffer.extend_from_slice(&temp_buf[..n]);
        }
    }

    fn send_request(&mut self, request: BridgeRequest) -> Result<BridgeResponse> {
        let json = request
            .to_json()
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let line = self.read_line_blocking()?;
        BridgeResponse::from_json(&line).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    pub fn get_version(&mut self) -> Result<VersionInfo> {
        match self.send_request(BridgeRequest::GetVersion)? {
            BridgeResponse::Version(info) => Ok(info),
            BridgeResponse::Error(e) => Err(ClientError::Server(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    /// Invoke `getBatteryLevel` on the battery method channel.
    pub fn get_battery_level(&mut self) -> Result<i64> {
        let request = BridgeRequest::MethodCall {
            channel: METHOD_CHANNEL.to_string(),
            method: GET_BATTERY_LEVEL.to_string(),
        };
        match self.send_request(request)? {
            BridgeResponse::MethodResult { value, .. } => value
                .as_i64()
                .ok_or_else(|| ClientError::Protocol("Non-integer battery level".into())),
            BridgeResponse::MethodError { error, .. } => Err(ClientError::Channel(error)),
            BridgeResponse::Error(e) => Err(ClientError::Server(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    /// Attach to the charging event channel. Clears the read timeout so
    /// [`BridgeClient::next_event`] can wait indefinitely between changes.
    pub fn listen(&mut self) -> Result<()> {
        let request = BridgeRequest::Listen {
            channel: EVENT_CHANNEL.to_string(),
        };
        match self.send_request(request)? {
            BridgeResponse::Listening { .. } => {
                self.stream.set_read_timeout(None)?;
                Ok(())
            }
            BridgeResponse::Error(e) => Err(ClientError::Server(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        let request = BridgeRequest::Cancel {
            channel: EVENT_CHANNEL.to_string(),
        };
        match self.send_request(request)? {
            BridgeResponse::Cancelled { .. } => Ok(()),
            BridgeResponse::Error(e) => Err(ClientError::Server(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    /// Block until the next charging-stream emission.
    pub fn next_event(&mut self) -> Result<ChargingEvent> {
        loop {
            let line = self.read_line_blocking()?;
            let response = BridgeResponse::from_json(&line)
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
            match response {
                BridgeResponse::Event { value, .. } => {
                    let state = value
                        .as_str()
                        .ok_or_else(|| ClientError::Protocol("Non-string event".into()))?;
                    return Ok(ChargingEvent::State(state.to_string()));
                }
                BridgeResponse::ErrorEvent { error, .. } => {
                    return Ok(ChargingEvent::Error(error));
                }
                // Acks from a concurrent request on the same connection.
                other => {
                    tracing::trace!(response = ?other, "Skipping non-event response");
                }
            }
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        match self.send_request(BridgeRequest::Shutdown)? {
            BridgeResponse::Ok => Ok(()),
            BridgeResponse::Error(e) => Err(ClientError::Server(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_check_accepts_matching_versions() {
        let info = VersionInfo {
            protocol_version: PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
            server_version: "0.1.0".to_string(),
        };
        assert!(check_version_compatibility(&info).is_ok());
    }

    #[test]
    fn version_check_rejects_newer_server_minimum() {
        let info = VersionInfo {
            protocol_version: PROTOCOL_VERSION + 1,
            min_supported_version: PROTOCOL_VERSION + 1,
            server_version: "9.9.9".to_string(),
        };
        assert!(matches!(
            check_version_compatibility(&info),
            Err(ClientError::VersionMismatch { .. })
        ));
    }
}
