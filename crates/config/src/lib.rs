mod error;
mod loader;
mod transport;

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

pub use error::Error;
pub use transport::{Protocol, TransportConfig};

pub type Result<T> = std::result::Result<T, error::Error>;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Config {
    /// Read, expand `{{ env.NAME }}` placeholders, deserialize and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Config> {
        loader::load(path)
    }

    /// Like [`Config::load`], from an in-memory TOML document.
    pub fn parse(content: &str) -> crate::Result<Config> {
        loader::parse(content)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Project token sent as `$token` with every request.
    pub token: SecretString,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::Config;

    #[test]
    fn all_values() {
        let config = indoc! {r#"
            [client]
            token = "abc"

            [transport]
            host = "api-eu.example.com"
            protocol = "http"
            port = 8080
            path = "/proxy"
            timeout = "5s"
            keepalive = false
            geolocate = true
            verbose = true
            test = true
        "#};

        let config: Config = toml::from_str(config).unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            client: ClientConfig {
                token: SecretBox<str>([REDACTED]),
            },
            transport: TransportConfig {
                host: "api-eu.example.com",
                protocol: Http,
                port: Some(
                    8080,
                ),
                path: "/proxy",
                timeout: 5s,
                keepalive: false,
                geolocate: true,
                verbose: true,
                test: true,
            },
        }
        "#);
    }

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("[client]\ntoken = \"abc\"").unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            client: ClientConfig {
                token: SecretBox<str>([REDACTED]),
            },
            transport: TransportConfig {
                host: "api.mixpanel.com",
                protocol: Https,
                port: None,
                path: "",
                timeout: 60s,
                keepalive: true,
                geolocate: false,
                verbose: false,
                test: false,
            },
        }
        "#);
    }

    #[test]
    fn token_is_required() {
        let error = toml::from_str::<Config>("[transport]\nverbose = true").unwrap_err();

        assert!(error.to_string().contains("missing field `client`"), "{error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let config = indoc! {r#"
            [client]
            token = "abc"
            secret = "nope"
        "#};

        let error = toml::from_str::<Config>(config).unwrap_err();

        assert!(error.to_string().contains("unknown field `secret`"), "{error}");
    }
}
