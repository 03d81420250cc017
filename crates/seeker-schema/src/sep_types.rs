use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a field is a foreign reference into another index's schema
/// (spec §3 `sep_types` quadruple, first axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForeignType {
    #[default]
    NotForeign,
    Foreign,
}

/// Whether a field's value is wrapped in an object (spec §3, second axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectType {
    #[default]
    NotObject,
    Object,
}

/// Whether a field's value is wrapped in an array (spec §3, third axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArrayType {
    #[default]
    NotArray,
    Array,
}

/// The leaf concrete type (spec §3, fourth axis). `Empty` means not yet
/// resolved; `Script` is a field whose value is a script reference
/// rather than data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConcreteType {
    #[default]
    Empty,
    Boolean,
    Date,
    Time,
    Timedelta,
    Float,
    Integer,
    Positive,
    Geo,
    String,
    Term,
    Text,
    Uuid,
    Script,
}

/// A field's `sep_types`: the product of four independent axes,
/// materialized into a single canonical type-name string (spec §3,
/// §4.E "Polymorphism").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SepTypes {
    pub foreign: ForeignType,
    pub object: ObjectType,
    pub array: ArrayType,
    pub concrete: ConcreteType,
}

impl SepTypes {
    pub fn is_concrete(&self) -> bool {
        !matches!(self.concrete, ConcreteType::Empty)
    }
}

impl fmt::Display for SepTypes {
    /// Renders the canonical name, e.g. `"foreign/object"`,
    /// `"object/array/integer"`, matching the original's slash-joined
    /// type name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.foreign == ForeignType::Foreign {
            parts.push("foreign");
        }
        if self.object == ObjectType::Object {
            parts.push("object");
        }
        if self.array == ArrayType::Array {
            parts.push("array");
        }
        let concrete_name = match self.concrete {
            ConcreteType::Empty => None,
            ConcreteType::Boolean => Some("boolean"),
            ConcreteType::Date => Some("date"),
            ConcreteType::Time => Some("time"),
            ConcreteType::Timedelta => Some("timedelta"),
            ConcreteType::Float => Some("float"),
            ConcreteType::Integer => Some("integer"),
            ConcreteType::Positive => Some("positive"),
            ConcreteType::Geo => Some("geo"),
            ConcreteType::String => Some("string"),
            ConcreteType::Term => Some("term"),
            ConcreteType::Text => Some("text"),
            ConcreteType::Uuid => Some("uuid"),
            ConcreteType::Script => Some("script"),
        };
        if let Some(name) = concrete_name {
            parts.push(name);
        }
        if parts.is_empty() {
            write!(f, "empty")
        } else {
            write!(f, "{}", parts.join("/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_names() {
        let plain_integer = SepTypes { concrete: ConcreteType::Integer, ..Default::default() };
        assert_eq!(plain_integer.to_string(), "integer");

        let nested = SepTypes {
            object: ObjectType::Object,
            array: ArrayType::Array,
            concrete: ConcreteType::Integer,
            ..Default::default()
        };
        assert_eq!(nested.to_string(), "object/array/integer");

        let foreign_object =
            SepTypes { foreign: ForeignType::Foreign, object: ObjectType::Object, ..Default::default() };
        assert_eq!(foreign_object.to_string(), "foreign/object");
    }

    #[test]
    fn empty_has_no_concrete_type() {
        assert!(!SepTypes::default().is_concrete());
    }
}
