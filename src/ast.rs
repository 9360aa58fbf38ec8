use crate::document::ObjectEntity;
use crate::entities::{FormatText, Guid, LocalizedText, ObjectReference, PinReference};
use crate::schema::{schema_of, EntityKind, TypeTag};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// A parsed value. Every grammar produces one and every serializer consumes one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Integer64(i64),
    Real(Real),
    Byte(u8),
    String(String),
    Symbol(String),
    Guid(Guid),
    ObjectReference(ObjectReference),
    LocalizedText(LocalizedText),
    FormatText(FormatText),
    InvariantText(String),
    PinReference(PinReference),
    Array(Vec<Value>),
    Entity(Box<Entity>),
    Object(Box<ObjectEntity>),
}

impl Value {
    /// The registry key whose serializer writes this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Integer(_) => TypeTag::Integer,
            Value::Integer64(_) => TypeTag::Integer64,
            Value::Real(_) => TypeTag::Real,
            Value::Byte(_) => TypeTag::Byte,
            Value::String(_) => TypeTag::String,
            Value::Symbol(_) => TypeTag::Symbol,
            Value::Guid(_) => TypeTag::Guid,
            Value::ObjectReference(_) => TypeTag::ObjectReference,
            Value::LocalizedText(_) => TypeTag::LocalizedText,
            Value::FormatText(_) => TypeTag::FormatText,
            Value::InvariantText(_) => TypeTag::InvariantText,
            Value::PinReference(_) => TypeTag::PinReference,
            Value::Array(_) => TypeTag::Array,
            Value::Entity(entity) => TypeTag::Entity(entity.kind),
            Value::Object(_) => TypeTag::Object,
        }
    }

    pub fn entity(entity: Entity) -> Self {
        Value::Entity(Box::new(entity))
    }

    pub fn real(value: f64) -> Self {
        Value::Real(Real::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view over every number-like variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(f64::from(*i)),
            Value::Integer64(i) => Some(*i as f64),
            Value::Real(r) => Some(r.value),
            Value::Byte(b) => Some(f64::from(*b)),
            _ => None,
        }
    }

    /// Text of strings, symbols and invariant text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) | Value::InvariantText(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<&Guid> {
        match self {
            Value::Guid(guid) => Some(guid),
            _ => None,
        }
    }

    pub fn as_object_reference(&self) -> Option<&ObjectReference> {
        match self {
            Value::ObjectReference(reference) => Some(reference),
            _ => None,
        }
    }

    /// The human readable form of text-like values, as an editor would display them.
    pub fn display_text(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::InvariantText(s) | Value::Symbol(s) => Some(s.clone()),
            Value::LocalizedText(text) => Some(text.value.clone()),
            Value::FormatText(text) => Some(text.resolved.clone()),
            Value::Real(real) => Some(real.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Integer64(i) => Some(i.to_string()),
            Value::Byte(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Value::entity(value)
    }
}

/// A floating point number that remembers how many fractional digits it was written with.
#[derive(Debug, Clone, Copy)]
pub struct Real {
    pub value: f64,
    pub precision: Option<usize>,
}

impl Real {
    /// A number written in its shortest form.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            precision: None,
        }
    }

    pub fn with_precision(value: f64, precision: usize) -> Self {
        Self {
            value,
            precision: Some(precision),
        }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Display for Real {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.value.is_infinite() {
            return f.write_str(if self.value > 0.0 { "inf" } else { "-inf" });
        }
        match self.precision {
            Some(precision) => write!(f, "{:.*}", precision, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

impl Serialize for Real {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.value)
    }
}

impl From<f64> for Real {
    fn from(value: f64) -> Self {
        Real::new(value)
    }
}

/// One `key=value` attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pair {
    pub key: String,
    pub value: Value,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A schema-described, parenthesized value: `[Lookbehind](Key=Value,...)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookbehind: Option<String>,
    pub attributes: Vec<Pair>,
}

impl Entity {
    /// An entity with no attributes at all; see [`Entity::with_defaults`] for a populated one.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            lookbehind: None,
            attributes: Vec::new(),
        }
    }

    /// An entity holding the declared default of every attribute that has one.
    pub fn with_defaults(kind: EntityKind) -> Self {
        let mut entity = Entity::new(kind);
        for attribute in schema_of(kind).attributes {
            if let Some(value) = attribute.default.to_value() {
                entity.attributes.push(Pair::new(attribute.name, value));
            }
        }
        entity
    }

    pub fn with_lookbehind(mut self, lookbehind: impl Into<String>) -> Self {
        self.lookbehind = Some(lookbehind.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| &pair.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.attributes
            .iter_mut()
            .find(|pair| pair.key == key)
            .map(|pair| &mut pair.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces an existing attribute in place or appends a new one. Declared attributes that
    /// were absent are inserted at their schema position so the written order stays stable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
            return;
        }
        let schema = schema_of(self.kind);
        let index = match schema.attribute_index(&key) {
            Some(declared) => self
                .attributes
                .iter()
                .position(|pair| {
                    schema
                        .attribute_index(&pair.key)
                        .map_or(true, |other| other > declared)
                })
                .unwrap_or(self.attributes.len()),
            None => self.attributes.len(),
        };
        self.attributes.insert(index, Pair { key, value });
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.attributes.iter().position(|pair| pair.key == key)?;
        Some(self.attributes.remove(index).value)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.get(key).and_then(Value::as_entity)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|pair| pair.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_display_keeps_precision() {
        assert_eq!(Real::with_precision(0.0, 6).to_string(), "0.000000");
        assert_eq!(Real::with_precision(-0.0, 0).to_string(), "-0");
        assert_eq!(Real::new(3.5).to_string(), "3.5");
        assert_eq!(Real::new(f64::NEG_INFINITY).to_string(), "-inf");
    }

    #[test]
    fn test_real_equality_ignores_precision() {
        assert_eq!(Real::with_precision(1.0, 6), Real::new(1.0));
        assert_ne!(Real::new(1.0), Real::new(1.5));
    }

    #[test]
    fn test_set_inserts_declared_attribute_in_schema_order() {
        let mut vector = Entity::new(EntityKind::Vector);
        vector.set("Z", 3.0);
        vector.set("X", 1.0);
        vector.set("Y", 2.0);
        let keys: Vec<&str> = vector.keys().collect();
        assert_eq!(keys, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let mut entity = Entity::new(EntityKind::UnknownKeys);
        entity.set("A", 1);
        entity.set("B", 2);
        entity.set("A", 3);
        assert_eq!(entity.get("A"), Some(&Value::Integer(3)));
        assert_eq!(entity.attributes.len(), 2);
    }
}
