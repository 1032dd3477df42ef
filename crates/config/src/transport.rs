use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;

const DEFAULT_HOST: &str = "api.mixpanel.com";

/// How and where group requests are transmitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// API host name, without scheme.
    pub host: String,
    pub protocol: Protocol,
    /// Defaults to the protocol's well-known port.
    pub port: Option<u16>,
    /// Prefix prepended to every endpoint, e.g. when going through a proxy.
    pub path: String,
    /// Request timeout.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub keepalive: bool,
    /// Let the service resolve a location from the request's IP address.
    pub geolocate: bool,
    /// Ask the service for a JSON status body instead of a bare `1`/`0`.
    pub verbose: bool,
    /// Send requests in test mode.
    pub test: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            protocol: Protocol::default(),
            port: None,
            path: String::new(),
            timeout: Duration::from_secs(60),
            keepalive: true,
            geolocate: false,
            verbose: false,
            test: false,
        }
    }
}

impl TransportConfig {
    /// The configured port, or the protocol's default.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}
