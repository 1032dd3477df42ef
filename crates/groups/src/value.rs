use serde_json::Value;

/// Shape of a property value, as far as the group operations care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A string, number or boolean.
    Scalar,
    /// An array where every element is a scalar.
    ArrayOfScalar,
    /// Objects, `null`, and arrays holding anything that is not a scalar.
    Invalid,
}

/// Classify a property value.
pub fn classify(value: &Value) -> ValueShape {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => ValueShape::Scalar,
        Value::Array(values) if values.iter().all(is_scalar) => ValueShape::ArrayOfScalar,
        Value::Array(_) | Value::Object(_) | Value::Null => ValueShape::Invalid,
    }
}

pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Loose truthiness used when deciding whether an inline flag is set.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
