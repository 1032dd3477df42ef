use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::payload::Mutation;

/// Endpoint every group request is sent to.
pub const GROUPS_ENDPOINT: &str = "/groups";

/// HTTP method of a request descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the group entity an operation targets.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIdentity {
    /// Kind of group, e.g. `company`.
    pub group_key: String,
    /// Identifier of the group within its kind. Expected to be a scalar.
    pub group_id: Value,
}

impl GroupIdentity {
    pub fn new(group_key: impl Into<String>, group_id: impl Into<Value>) -> Self {
        Self {
            group_key: group_key.into(),
            group_id: group_id.into(),
        }
    }
}

/// A wire-ready request, handed to a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub endpoint: &'static str,
    pub data: Map<String, Value>,
}

impl RequestDescriptor {
    /// The operation key present in `data`, if any.
    pub fn operation_key(&self) -> Option<&str> {
        const KEYS: [&str; 6] = ["$set", "$set_once", "$delete", "$remove", "$union", "$unset"];

        KEYS.into_iter().find(|key| self.data.contains_key(*key))
    }
}

/// Assemble the request for a validated mutation.
pub(crate) fn build(
    token: &str,
    identity: &GroupIdentity,
    mutation: Mutation,
    modifiers: Map<String, Value>,
) -> RequestDescriptor {
    let mut data = Map::new();

    data.insert("$token".to_string(), Value::String(token.to_string()));
    data.insert("$group_key".to_string(), Value::String(identity.group_key.clone()));
    data.insert("$group_id".to_string(), identity.group_id.clone());

    let key = mutation.operation().wire_key();
    data.insert(key.to_string(), mutation.into_wire_value());

    // modifier keys never collide with the base or operation keys
    data.extend(modifiers);

    RequestDescriptor {
        method: Method::Get,
        endpoint: GROUPS_ENDPOINT,
        data,
    }
}
