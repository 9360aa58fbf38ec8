use crate::ast::{Entity, Real, Value};
use crate::color::LinearColor;
use crate::config::Options;
use crate::document::{self, Document, ObjectEntity};
use crate::entities::{
    Byte, FormatText, Guid, KeyBinding, LocalizedText, ObjectReference, PinReference, Rotator,
    Symbol, Vector, Vector2D,
};
use crate::error::BlueprintError;
use crate::parser::Parser;
use crate::pin::Pin;
use crate::registry;
use crate::sanitizer;
use crate::schema::{EntityKind, TypeTag};
use crate::serialization::Writer;

/// A Rust type with a registered grammar and serializer.
pub trait Readable: Sized {
    /// The registry entry used to read and write values of this type.
    fn type_tag() -> TypeTag;
    fn from_value(value: Value) -> Option<Self>;
    fn to_value(&self) -> Value;
}

macro_rules! readable {
    ($ty:ty, $tag:expr, $variant:ident) => {
        impl Readable for $ty {
            fn type_tag() -> TypeTag {
                $tag
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    };
}

macro_rules! readable_entity {
    ($ty:ty, $kind:expr) => {
        impl Readable for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::Entity($kind)
            }

            fn from_value(value: Value) -> Option<Self> {
                value.as_entity().and_then(<$ty>::from_entity)
            }

            fn to_value(&self) -> Value {
                Value::entity(self.to_entity())
            }
        }
    };
}

readable!(bool, TypeTag::Boolean, Boolean);
readable!(i32, TypeTag::Integer, Integer);
readable!(i64, TypeTag::Integer64, Integer64);
readable!(Real, TypeTag::Real, Real);
readable!(String, TypeTag::String, String);
readable!(Guid, TypeTag::Guid, Guid);
readable!(ObjectReference, TypeTag::ObjectReference, ObjectReference);
readable!(LocalizedText, TypeTag::LocalizedText, LocalizedText);
readable!(FormatText, TypeTag::FormatText, FormatText);
readable!(PinReference, TypeTag::PinReference, PinReference);
readable!(Vec<Value>, TypeTag::Array, Array);

readable_entity!(LinearColor, EntityKind::LinearColor);
readable_entity!(Vector, EntityKind::Vector);
readable_entity!(Vector2D, EntityKind::Vector2D);
readable_entity!(Rotator, EntityKind::Rotator);
readable_entity!(KeyBinding, EntityKind::KeyBinding);

impl Readable for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Real
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_value(&self) -> Value {
        Value::real(*self)
    }
}

impl Readable for Byte {
    fn type_tag() -> TypeTag {
        TypeTag::Byte
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Byte(byte) => Some(Byte::new(byte)),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Byte(self.value())
    }
}

impl Readable for Symbol {
    fn type_tag() -> TypeTag {
        TypeTag::Symbol
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Symbol(symbol) => Some(Symbol(symbol)),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Symbol(self.0.clone())
    }
}

impl Readable for Pin {
    fn type_tag() -> TypeTag {
        TypeTag::Entity(EntityKind::Pin)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Entity(entity) => Pin::from_entity(*entity),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::entity(self.entity().clone())
    }
}

impl Readable for ObjectEntity {
    fn type_tag() -> TypeTag {
        TypeTag::Object
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(*object),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Object(Box::new(self.clone()))
    }
}

impl Readable for () {
    fn type_tag() -> TypeTag {
        TypeTag::Null
    }

    fn from_value(value: Value) -> Option<Self> {
        value.is_null().then_some(())
    }

    fn to_value(&self) -> Value {
        Value::Null
    }
}

/// Reads a single value of type `T` from the whole of `text`.
///
/// Leading and trailing whitespace is allowed; anything else left over is an error.
///
/// # Errors
///
/// Returns a `BlueprintError` if the text does not match the grammar of `T`.
pub fn read<T: Readable>(text: &str) -> Result<T, BlueprintError> {
    read_with(text, &Options::default())
}

/// Like [`read`], with explicit options.
///
/// # Errors
///
/// Returns a `BlueprintError` if the text does not match the grammar of `T`.
pub fn read_with<T: Readable>(text: &str, options: &Options) -> Result<T, BlueprintError> {
    let value = read_value_with(T::type_tag(), text, options)?;
    let found = value.type_tag();
    T::from_value(value)
        .ok_or_else(|| BlueprintError::mismatch(T::type_tag().to_string(), found.to_string()))
}

/// Writes `value` in its paste text form. `inside_string` adds the escaping needed when the
/// result is embedded in a quoted string.
///
/// # Errors
///
/// Returns a `BlueprintError` if some nested value has no registered serializer.
pub fn write<T: Readable>(value: &T, inside_string: bool) -> Result<String, BlueprintError> {
    write_value(&value.to_value(), inside_string)
}

/// Reads a value with the grammar registered for `tag`.
///
/// # Errors
///
/// Returns a `BlueprintError` if the text does not match, or `tag` is not registered.
pub fn read_value(tag: TypeTag, text: &str) -> Result<Value, BlueprintError> {
    read_value_with(tag, text, &Options::default())
}

fn read_value_with(tag: TypeTag, text: &str, options: &Options) -> Result<Value, BlueprintError> {
    log::debug!("reading `{tag}` from {} bytes", text.len());
    let mut parser = Parser::new(text, registry::global()).with_max_depth(options.max_depth);
    parser.parse_complete(|p| p.parse_tag(tag))
}

/// # Errors
///
/// Returns a `BlueprintError` if some nested value has no registered serializer.
pub fn write_value(value: &Value, inside_string: bool) -> Result<String, BlueprintError> {
    Writer::new(registry::global()).write_value(value, inside_string)
}

/// Reads an entity of the given kind.
///
/// # Errors
///
/// Returns a `BlueprintError` if the text does not match the kind's grammar.
pub fn read_entity(kind: EntityKind, text: &str) -> Result<Entity, BlueprintError> {
    match read_value(TypeTag::Entity(kind), text)? {
        Value::Entity(entity) => Ok(*entity),
        other => Err(BlueprintError::mismatch(
            kind.name(),
            other.type_tag().to_string(),
        )),
    }
}

/// Reads every `Begin Object ... End Object` block of a paste buffer, sanitizing it first.
///
/// # Errors
///
/// Returns a `BlueprintError` if any block fails to parse.
pub fn read_multiple(text: &str) -> Result<Vec<ObjectEntity>, BlueprintError> {
    read_multiple_with(text, &Options::default())
}

/// Like [`read_multiple`], with explicit options.
///
/// # Errors
///
/// Returns a `BlueprintError` if any block fails to parse.
pub fn read_multiple_with(
    text: &str,
    options: &Options,
) -> Result<Vec<ObjectEntity>, BlueprintError> {
    log::debug!("reading paste buffer of {} bytes", text.len());
    let sanitized;
    let text = if options.sanitize {
        sanitized = sanitizer::pre_parse(text);
        sanitized.as_str()
    } else {
        text
    };
    let mut parser = Parser::new(text, registry::global()).with_max_depth(options.max_depth);
    let objects = parser.parse_complete(document::parse_objects)?;
    log::debug!("read {} object(s)", objects.len());
    Ok(objects)
}

/// Writes object blocks back to a paste buffer.
///
/// # Errors
///
/// Returns a `BlueprintError` if some attribute value has no registered serializer.
pub fn write_multiple(objects: &[ObjectEntity]) -> Result<String, BlueprintError> {
    write_multiple_with(objects, &Options::default())
}

/// Like [`write_multiple`], with explicit options.
///
/// # Errors
///
/// Returns a `BlueprintError` if some attribute value has no registered serializer.
pub fn write_multiple_with(
    objects: &[ObjectEntity],
    options: &Options,
) -> Result<String, BlueprintError> {
    let writer = Writer::new(registry::global()).with_indentation(options.indentation.clone());
    let mut text = String::new();
    for object in objects {
        text.push_str(&object.write(&writer, "")?);
    }
    Ok(sanitizer::post_write(&text))
}

/// Reads a paste buffer into a [`Document`] that can resolve pin links.
///
/// # Errors
///
/// Returns a `BlueprintError` if any block fails to parse.
pub fn read_document(text: &str) -> Result<Document, BlueprintError> {
    read_multiple(text).map(Document::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_read_and_write() {
        assert_eq!(read::<i32>("+555").unwrap(), 555);
        assert!(read::<bool>(" true ").unwrap());
        assert_eq!(write(&false, false).unwrap(), "False");
        assert_eq!(read::<()>("()").unwrap(), ());
        assert_eq!(read::<Symbol>("EGPD_Output").unwrap(), Symbol("EGPD_Output".to_string()));
    }

    #[test]
    fn test_max_depth_option_is_honored() {
        let err = read_with::<Vector>(
            "(X=1,Y=2,Z=3)",
            &Options {
                max_depth: 0,
                ..Options::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::Parser(crate::error::ParserError::TooDeeplyNested { limit: 0, .. })
        ));
    }

    #[test]
    fn test_read_multiple_sanitizes() {
        let text = "Begin Object Name=\"A\"\n   R=True\n   X=NaN\nEnd Object\n";
        let objects = read_multiple(text).unwrap();
        assert_eq!(objects[0].get("R"), Some(&Value::Boolean(true)));
        assert_eq!(objects[0].get("X"), Some(&Value::Real(Real::new(0.0))));
        assert_eq!(
            write_multiple(&objects).unwrap(),
            "Begin Object Name=\"A\"\n   R=True\n   X=0\nEnd Object\n"
        );
    }
}
