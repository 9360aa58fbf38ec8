use crate::ast::Value;
use crate::document;
use crate::error::BlueprintError;
use crate::leaf;
use crate::parser::{Alternative, PResult, Parser};
use crate::schema::{schema_of, AttrType, EntityKind, Schema, TypeTag};
use crate::serialization::{self, EntitySerializer, WriteFn, Writer};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Parses one value of a registered type.
pub trait Grammar: Send + Sync {
    fn parse(&self, parser: &mut Parser<'_>) -> PResult<Value>;
}

/// Writes one value of a registered type.
pub trait Serializer: Send + Sync {
    fn write(
        &self,
        writer: &Writer<'_>,
        value: &Value,
        inside_string: bool,
    ) -> Result<String, BlueprintError>;
}

/// A grammar given as a plain function.
pub struct FnGrammar(pub Alternative);

impl Grammar for FnGrammar {
    fn parse(&self, parser: &mut Parser<'_>) -> PResult<Value> {
        (self.0)(parser)
    }
}

/// A serializer given as a plain function.
pub struct FnSerializer(pub WriteFn);

impl Serializer for FnSerializer {
    fn write(
        &self,
        writer: &Writer<'_>,
        value: &Value,
        inside_string: bool,
    ) -> Result<String, BlueprintError> {
        (self.0)(writer, value, inside_string)
    }
}

/// The grammar derived from a schema's attribute table.
pub struct EntityGrammar(pub &'static Schema);

impl Grammar for EntityGrammar {
    fn parse(&self, parser: &mut Parser<'_>) -> PResult<Value> {
        parser.parse_entity(self.0).map(Value::entity)
    }
}

struct ArrayGrammar;

impl Grammar for ArrayGrammar {
    fn parse(&self, parser: &mut Parser<'_>) -> PResult<Value> {
        parser
            .parse_array(&AttrType::Of(TypeTag::Unknown))
            .map(Value::Array)
    }
}

pub struct Registration {
    pub grammar: Box<dyn Grammar>,
    pub serializer: Box<dyn Serializer>,
}

/// Maps every [`TypeTag`] to the grammar that reads it and the serializer that writes it.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeTag, Registration>,
}

impl Registry {
    /// An empty registry. Nothing can be read or written until types are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in type.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        registry.register_fn(TypeTag::Null, leaf::null, serialization::write_null);
        registry.register_fn(TypeTag::Boolean, leaf::boolean, serialization::write_boolean);
        registry.register_fn(TypeTag::Integer, leaf::integer, serialization::write_number);
        registry.register_fn(TypeTag::Integer64, leaf::integer64, serialization::write_number);
        registry.register_fn(TypeTag::Real, leaf::real, serialization::write_number);
        registry.register_fn(TypeTag::Byte, leaf::byte, serialization::write_number);
        registry.register_fn(TypeTag::String, leaf::string, serialization::write_string);
        registry.register_fn(TypeTag::Symbol, leaf::symbol, serialization::write_symbol);
        registry.register_fn(TypeTag::Guid, leaf::guid, serialization::write_symbol);
        registry.register_fn(
            TypeTag::ObjectReference,
            leaf::object_reference,
            serialization::write_object_reference,
        );
        registry.register_fn(
            TypeTag::LocalizedText,
            leaf::localized_text,
            serialization::write_localized_text,
        );
        registry.register_fn(
            TypeTag::FormatText,
            leaf::format_text,
            serialization::write_format_text,
        );
        registry.register_fn(
            TypeTag::InvariantText,
            leaf::invariant_text,
            serialization::write_invariant_text,
        );
        registry.register_fn(
            TypeTag::PinReference,
            leaf::pin_reference,
            serialization::write_pin_reference,
        );
        registry.register(
            TypeTag::Array,
            ArrayGrammar,
            FnSerializer(serialization::write_array),
        );
        registry.register_fn(TypeTag::Unknown, leaf::unknown_value, serialization::write_any);
        registry.register_fn(TypeTag::Object, document::object_block, document::write_object);

        for kind in EntityKind::ALL {
            let tag = TypeTag::Entity(kind);
            match kind {
                EntityKind::KeyBinding => {
                    registry.register(tag, FnGrammar(leaf::key_binding), EntitySerializer)
                }
                EntityKind::SimpleSerializationVector => registry.register(
                    tag,
                    FnGrammar(leaf::simple_vector),
                    FnSerializer(serialization::write_simple_vector),
                ),
                EntityKind::SimpleSerializationVector2D => registry.register(
                    tag,
                    FnGrammar(leaf::simple_vector_2d),
                    FnSerializer(serialization::write_simple_vector),
                ),
                EntityKind::SimpleSerializationRotator => registry.register(
                    tag,
                    FnGrammar(leaf::simple_rotator),
                    FnSerializer(serialization::write_simple_vector),
                ),
                _ => registry.register(tag, EntityGrammar(schema_of(kind)), EntitySerializer),
            }
        }
        registry
    }

    /// Registers (or replaces) the grammar and serializer of `tag`.
    pub fn register(
        &mut self,
        tag: TypeTag,
        grammar: impl Grammar + 'static,
        serializer: impl Serializer + 'static,
    ) {
        self.entries.insert(
            tag,
            Registration {
                grammar: Box::new(grammar),
                serializer: Box::new(serializer),
            },
        );
    }

    pub fn register_fn(&mut self, tag: TypeTag, grammar: Alternative, serializer: WriteFn) {
        self.register(tag, FnGrammar(grammar), FnSerializer(serializer));
    }

    pub fn resolve(&self, tag: TypeTag) -> Result<&Registration, BlueprintError> {
        self.entries
            .get(&tag)
            .ok_or_else(|| BlueprintError::UnregisteredType {
                type_name: tag.to_string(),
            })
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    static ref GLOBAL: Registry = {
        let registry = Registry::with_builtins();
        log::debug!("built-in registry ready with {} types", registry.len());
        registry
    };
}

/// The process-wide registry of built-in types. Built on first use, read-only afterwards.
pub fn global() -> &'static Registry {
    &GLOBAL
}
