use std::{
    fmt::Write,
    path::Path,
    sync::LazyLock,
};

use regex::{Captures, Regex};
use secrecy::ExposeSecret;
use serde::Deserialize;
use toml::Value;

use crate::{Config, error::Error};

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern should be valid")
});

pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;

    parse(&content)
}

pub fn parse(content: &str) -> crate::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;

    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    if config.transport.test {
        log::warn!("Test mode is enabled; requests are sent with test=1");
    }

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> crate::Result<()> {
    if config.client.token.expose_secret().trim().is_empty() {
        return Err(Error::Invalid("client.token must not be empty".to_string()));
    }

    let host = &config.transport.host;

    if host.is_empty() {
        return Err(Error::Invalid("transport.host must not be empty".to_string()));
    }

    if host.contains("://") || host.contains('/') {
        return Err(Error::Invalid(format!(
            "transport.host must be a bare host name without scheme or path, got '{host}'"
        )));
    }

    let path = &config.transport.path;

    if !path.is_empty() && !path.starts_with('/') {
        return Err(Error::Invalid(format!(
            "transport.path must start with '/', got '{path}'"
        )));
    }

    Ok(())
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> crate::Result<()> {
    match value {
        Value::String(s) => match expand_env(s) {
            Ok(out) => *s = out,
            Err(reason) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => {
                            let _ = write!(p, "[{i}]");
                        }
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                return Err(Error::EnvVarSubstitution { path: p, reason });
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}

/// Replace every `{{ env.NAME }}` placeholder with the variable's value.
fn expand_env(input: &str) -> Result<String, String> {
    let mut missing = None;

    let expanded = ENV_PLACEHOLDER.replace_all(input, |captures: &Captures<'_>| {
        let name = &captures[1];

        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(format!("environment variable '{name}' is not set")),
        None => Ok(expanded.into_owned()),
    }
}
