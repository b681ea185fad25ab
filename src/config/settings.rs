use std::time::Duration;

use serde::Deserialize;

use crate::peer::Peer;

/// Top-level configuration settings for the client and CLI.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub peer: PeerSettings,
    pub send: SendSettings,
    pub log: LogSettings,
}

/// The identity a client connects as.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PeerSettings {
    pub broker: String,
    pub id: String,
    pub secure: bool,
}

impl PeerSettings {
    pub fn peer(&self) -> Peer {
        Peer::with_secure(self.broker.clone(), self.id.clone(), self.secure)
    }
}

/// Defaults for one-shot delivery.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SendSettings {
    /// Request timeout in milliseconds; `0` disables it.
    pub timeout_ms: u64,
}

impl SendSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub(crate) struct PartialSettings {
    pub(crate) peer: Option<PartialPeerSettings>,
    pub(crate) send: Option<PartialSendSettings>,
    pub(crate) log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartialPeerSettings {
    pub(crate) broker: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) secure: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartialSendSettings {
    pub(crate) timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartialLogSettings {
    pub(crate) level: Option<String>,
}

impl PartialSettings {
    /// Fills every value missing from `self` with the one from `default`.
    pub(crate) fn merge(self, default: Settings) -> Settings {
        let peer = self.peer;
        let send = self.send;
        let log = self.log;

        Settings {
            peer: PeerSettings {
                broker: peer
                    .as_ref()
                    .and_then(|p| p.broker.clone())
                    .unwrap_or(default.peer.broker),
                id: peer
                    .as_ref()
                    .and_then(|p| p.id.clone())
                    .unwrap_or(default.peer.id),
                secure: peer
                    .as_ref()
                    .and_then(|p| p.secure)
                    .unwrap_or(default.peer.secure),
            },
            send: SendSettings {
                timeout_ms: send
                    .as_ref()
                    .and_then(|s| s.timeout_ms)
                    .unwrap_or(default.send.timeout_ms),
            },
            log: LogSettings {
                level: log
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.log.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            peer: PeerSettings {
                broker: "127.0.0.1:8080".to_string(),
                id: "0".to_string(),
                secure: true,
            },
            send: SendSettings { timeout_ms: 10_000 },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
