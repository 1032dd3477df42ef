//! Payload shapes accepted by the group operations and their validation.
//!
//! Every operation resolves its input once, here, into a [`Mutation`]: the
//! normalized value that ends up under the operation key of the request.
//! Property maps handed to `set`, `set_once` and `remove` also give up their
//! reserved control keys at this point (see [`crate::modifiers`]).

use std::fmt;

use serde_json::{Map, Value};

use crate::{
    error::{GroupsError, GroupsResult},
    modifiers::{self, Staged},
    value::{ValueShape, classify},
};

/// Property map as sent on the wire.
pub type PropertyMap = Map<String, Value>;

/// The group operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    SetOnce,
    DeleteGroup,
    Remove,
    Union,
    Unset,
}

impl Operation {
    /// The `$`-prefixed key naming this operation in the request data.
    pub fn wire_key(self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::SetOnce => "$set_once",
            Self::DeleteGroup => "$delete",
            Self::Remove => "$remove",
            Self::Union => "$union",
            Self::Unset => "$unset",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::SetOnce => "set_once",
            Self::DeleteGroup => "delete_group",
            Self::Remove => "remove",
            Self::Union => "union",
            Self::Unset => "unset",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties given to `set` and `set_once`.
#[derive(Debug, Clone, PartialEq)]
pub enum Properties {
    /// One property name and its value.
    Single { name: String, value: Value },
    /// A whole property map. Reserved control keys are hoisted out of it.
    Map(PropertyMap),
}

impl Properties {
    pub fn single(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Single {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<K, V> From<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((name, value): (K, V)) -> Self {
        Self::single(name, value)
    }
}

impl From<PropertyMap> for Properties {
    fn from(map: PropertyMap) -> Self {
        Self::Map(map)
    }
}

/// A validated operation together with its normalized payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Set(PropertyMap),
    SetOnce(PropertyMap),
    Delete,
    Remove(PropertyMap),
    /// Every value is an array; scalars were wrapped during validation.
    Union(PropertyMap),
    Unset(Vec<String>),
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Set(_) => Operation::Set,
            Self::SetOnce(_) => Operation::SetOnce,
            Self::Delete => Operation::DeleteGroup,
            Self::Remove(_) => Operation::Remove,
            Self::Union(_) => Operation::Union,
            Self::Unset(_) => Operation::Unset,
        }
    }

    /// The value placed under [`Operation::wire_key`].
    pub(crate) fn into_wire_value(self) -> Value {
        match self {
            Self::Set(map) | Self::SetOnce(map) | Self::Remove(map) | Self::Union(map) => Value::Object(map),
            Self::Delete => Value::String(String::new()),
            Self::Unset(names) => Value::Array(names.into_iter().map(Value::String).collect()),
        }
    }
}

/// Raw operation input as received from the caller.
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Set { properties: Properties, once: bool },
    Delete,
    Remove(Value),
    Union(Value),
    Unset(Value),
}

/// Validate and normalize a payload. Control keys hoisted out of a property
/// map are returned alongside the mutation.
pub(crate) fn validate(payload: Payload) -> GroupsResult<(Mutation, Staged)> {
    match payload {
        Payload::Set { properties, once } => {
            let (map, staged) = match properties {
                Properties::Single { name, value } => {
                    let mut map = PropertyMap::new();
                    map.insert(name, value);
                    (map, Staged::default())
                }
                Properties::Map(mut map) => {
                    let staged = modifiers::extract(&mut map);
                    (map, staged)
                }
            };

            let mutation = if once { Mutation::SetOnce(map) } else { Mutation::Set(map) };

            Ok((mutation, staged))
        }
        Payload::Delete => Ok((Mutation::Delete, Staged::default())),
        Payload::Remove(value) => {
            let mut map = expect_object(Operation::Remove, value, "data must be an object with scalar values")?;

            // Control keys are checked too, so a hoisted `ip` is always a scalar.
            for (name, value) in &map {
                if classify(value) != ValueShape::Scalar {
                    return Err(GroupsError::invalid(
                        Operation::Remove,
                        format!("property '{name}' must be a scalar value"),
                    ));
                }
            }

            let staged = modifiers::extract(&mut map);

            Ok((Mutation::Remove(map), staged))
        }
        Payload::Union(value) => {
            let map = expect_object(
                Operation::Union,
                value,
                "data must be an object with scalar or array values",
            )?;

            let mut union = PropertyMap::new();

            for (name, value) in map {
                let value = match classify(&value) {
                    ValueShape::Scalar => Value::Array(vec![value]),
                    ValueShape::ArrayOfScalar => value,
                    ValueShape::Invalid => {
                        return Err(GroupsError::invalid(
                            Operation::Union,
                            format!("property '{name}' must be a scalar or an array of scalars"),
                        ));
                    }
                };

                union.insert(name, value);
            }

            Ok((Mutation::Union(union), Staged::default()))
        }
        Payload::Unset(value) => {
            let names = match value {
                Value::String(name) => vec![name],
                Value::Array(values) => values
                    .into_iter()
                    .map(|value| match value {
                        Value::String(name) => Ok(name),
                        _ => Err(GroupsError::invalid(
                            Operation::Unset,
                            "property names must be strings",
                        )),
                    })
                    .collect::<GroupsResult<Vec<_>>>()?,
                _ => {
                    return Err(GroupsError::invalid(
                        Operation::Unset,
                        "property must be a string or an array of strings",
                    ));
                }
            };

            Ok((Mutation::Unset(names), Staged::default()))
        }
    }
}

fn expect_object(operation: Operation, value: Value, reason: &str) -> GroupsResult<PropertyMap> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GroupsError::invalid(operation, reason)),
    }
}
