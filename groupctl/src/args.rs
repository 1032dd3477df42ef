use std::path::PathBuf;

use clap::{Parser, Subcommand};
use groups::{GroupIdentity, GroupRequest, GroupsClient, Modifiers, Properties, PropertyMap};
use jiff::Timestamp;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "groupctl", version, about = "Update group profiles in the analytics service")]
pub(crate) struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "GROUPCTL_CONFIG", default_value = "groupctl.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. "info" or "groups=debug,transport=debug".
    #[arg(long, env = "GROUPCTL_LOG", default_value = "info")]
    pub log: String,

    /// Print the request instead of sending it.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Set properties, overwriting existing values.
    Set(SetArgs),
    /// Set properties that are not set yet.
    SetOnce(SetArgs),
    /// Delete the group profile.
    Delete(GroupArgs),
    /// Remove values from list properties.
    Remove(DataArgs),
    /// Merge values into list properties.
    Union(DataArgs),
    /// Unset properties.
    Unset(UnsetArgs),
}

#[derive(Debug, clap::Args)]
pub(crate) struct GroupArgs {
    /// Group key, e.g. "company".
    pub group_key: String,

    /// Group id. Numbers and booleans are sent as such, anything else as a string.
    #[arg(value_parser = parse_scalar)]
    pub group_id: Value,

    #[command(flatten)]
    pub modifiers: ModifierArgs,
}

#[derive(Debug, clap::Args)]
pub(crate) struct SetArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Properties as a JSON object.
    #[arg(value_parser = parse_object, required_unless_present = "name", conflicts_with = "name")]
    pub properties: Option<PropertyMap>,

    /// Name of a single property to set.
    #[arg(long, requires = "value")]
    pub name: Option<String>,

    /// Value of the single property; parsed as JSON when possible.
    #[arg(long, requires = "name", value_parser = parse_loose)]
    pub value: Option<Value>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct DataArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Payload as JSON, e.g. '{"tags": ["a", "b"]}'.
    #[arg(value_parser = parse_json)]
    pub data: Value,
}

#[derive(Debug, clap::Args)]
pub(crate) struct UnsetArgs {
    #[command(flatten)]
    pub group: GroupArgs,

    /// Property names to unset.
    #[arg(required = true, num_args = 1..)]
    pub names: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub(crate) struct ModifierArgs {
    /// IP address to attribute the update to.
    #[arg(long)]
    pub ip: Option<String>,

    /// Update time, in milliseconds since the epoch or as an RFC 3339 timestamp.
    #[arg(long, value_parser = parse_time)]
    pub time: Option<i64>,

    /// Do not update the profile's last seen time.
    #[arg(long)]
    pub ignore_time: bool,

    /// Do not resolve the group id through aliases.
    #[arg(long)]
    pub ignore_alias: bool,
}

impl ModifierArgs {
    fn to_modifiers(&self) -> Modifiers {
        Modifiers {
            ignore_alias: self.ignore_alias,
            ignore_time: self.ignore_time,
            ip: self.ip.clone(),
            time: self.time,
        }
    }
}

impl GroupArgs {
    fn identity(&self) -> GroupIdentity {
        GroupIdentity::new(self.group_key.clone(), self.group_id.clone())
    }
}

impl Command {
    /// Turn the subcommand into a pending request on `client`.
    pub(crate) fn into_request(self, client: &GroupsClient) -> GroupRequest<'_> {
        let (request, modifiers) = match self {
            Command::Set(args) => {
                let modifiers = args.group.modifiers.to_modifiers();
                (client.set(args.group.identity(), args.into_properties()), modifiers)
            }
            Command::SetOnce(args) => {
                let modifiers = args.group.modifiers.to_modifiers();
                (client.set_once(args.group.identity(), args.into_properties()), modifiers)
            }
            Command::Delete(args) => (client.delete_group(args.identity()), args.modifiers.to_modifiers()),
            Command::Remove(args) => (
                client.remove(args.group.identity(), args.data),
                args.group.modifiers.to_modifiers(),
            ),
            Command::Union(args) => (
                client.union(args.group.identity(), args.data),
                args.group.modifiers.to_modifiers(),
            ),
            Command::Unset(args) => (
                client.unset(args.group.identity(), args.names),
                args.group.modifiers.to_modifiers(),
            ),
        };

        request.modifiers(modifiers)
    }
}

impl SetArgs {
    fn into_properties(self) -> Properties {
        match (self.name, self.value, self.properties) {
            (Some(name), Some(value), _) => Properties::Single { name, value },
            (_, _, Some(map)) => Properties::Map(map),
            // clap enforces one of the two forms
            _ => Properties::Map(PropertyMap::new()),
        }
    }
}

fn parse_json(input: &str) -> Result<Value, String> {
    serde_json::from_str(input).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_object(input: &str) -> Result<PropertyMap, String> {
    match parse_json(input)? {
        Value::Object(map) => Ok(map),
        _ => Err("properties must be a JSON object".to_string()),
    }
}

fn parse_loose(input: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string())))
}

fn parse_scalar(input: &str) -> Result<Value, String> {
    match serde_json::from_str(input) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::String(_))) => Ok(value),
        _ => Ok(Value::String(input.to_string())),
    }
}

fn parse_time(input: &str) -> Result<i64, String> {
    if let Ok(millis) = input.parse::<i64>() {
        return Ok(millis);
    }

    input
        .parse::<Timestamp>()
        .map(|timestamp| timestamp.as_millisecond())
        .map_err(|e| format!("expected milliseconds or an RFC 3339 timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serde_json::json;

    use super::*;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn set_with_name_and_value() {
        let args = Args::try_parse_from([
            "groupctl", "set", "company", "Acme Inc.", "--name", "seats", "--value", "25", "--ip", "1.2.3.4",
        ])
        .unwrap();

        let Command::Set(set) = args.command else {
            unreachable!("expected set");
        };

        assert_eq!(set.group.group_id, json!("Acme Inc."));
        assert_eq!(set.group.modifiers.ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(set.into_properties(), Properties::single("seats", 25));
    }

    #[test]
    fn set_with_object_and_numeric_id() {
        let args = Args::try_parse_from(["groupctl", "set-once", "company", "42", r#"{"plan": "enterprise"}"#]).unwrap();

        let Command::SetOnce(set) = args.command else {
            unreachable!("expected set-once");
        };

        assert_eq!(set.group.group_id, json!(42));
        assert_eq!(
            set.into_properties(),
            Properties::Map(parse_object(r#"{"plan": "enterprise"}"#).unwrap())
        );
    }

    #[test]
    fn set_requires_properties() {
        assert!(Args::try_parse_from(["groupctl", "set", "company", "acme"]).is_err());
        assert!(Args::try_parse_from(["groupctl", "set", "company", "acme", "[1]"]).is_err());
    }

    #[test]
    fn unset_and_time() {
        let args = Args::try_parse_from([
            "groupctl",
            "--dry-run",
            "unset",
            "company",
            "acme",
            "plan",
            "seats",
            "--time",
            "2009-02-13T23:31:30Z",
        ])
        .unwrap();

        assert!(args.dry_run);

        let Command::Unset(unset) = args.command else {
            unreachable!("expected unset");
        };

        assert_eq!(unset.names, ["plan", "seats"]);
        assert_eq!(unset.group.modifiers.time, Some(1_234_567_890_000));
    }

    #[test]
    fn remove_accepts_any_json() {
        let args = Args::try_parse_from(["groupctl", "remove", "company", "acme", "[5]"]).unwrap();

        let Command::Remove(remove) = args.command else {
            unreachable!("expected remove");
        };

        assert_eq!(remove.data, json!([5]));
    }
}
