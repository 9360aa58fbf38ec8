use crate::ast::{Entity, Value};
use crate::error::BlueprintError;
use crate::registry::{Registry, Serializer};
use crate::schema::{schema_of, Attribute, EntityKind, Lookbehind};
use crate::utils::{escape_quotes, escape_string};

pub type WriteFn =
    for<'w, 'r, 'v> fn(&'w Writer<'r>, &'v Value, bool) -> Result<String, BlueprintError>;

pub const DEFAULT_INDENTATION: &str = "   ";

/// Turns values back into paste text, dispatching every value through the registry.
pub struct Writer<'a> {
    registry: &'a Registry,
    indentation: String,
}

impl<'a> Writer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            indentation: DEFAULT_INDENTATION.to_string(),
        }
    }

    pub fn with_indentation(mut self, indentation: impl Into<String>) -> Self {
        self.indentation = indentation.into();
        self
    }

    pub fn indentation(&self) -> &str {
        &self.indentation
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn write_value(&self, value: &Value, inside_string: bool) -> Result<String, BlueprintError> {
        let registration = self.registry.resolve(value.type_tag())?;
        registration.serializer.write(self, value, inside_string)
    }

    /// `Lookbehind(Key=Value,...)` with defaults suppressed where the schema asks for it.
    pub fn write_entity(&self, entity: &Entity, inside_string: bool) -> Result<String, BlueprintError> {
        let schema = schema_of(entity.kind);
        let items = self.write_attributes(entity, inside_string)?;
        let mut result = String::new();
        if let Lookbehind::Keyword(keyword) = schema.lookbehind {
            result.push_str(keyword);
            result.push(' ');
        } else if let Some(lookbehind) = &entity.lookbehind {
            result.push_str(lookbehind);
        }
        result.push('(');
        result.push_str(&items.join(","));
        if schema.trailing_comma && !items.is_empty() {
            result.push(',');
        }
        result.push(')');
        Ok(result)
    }

    /// Every attribute as a `Key=Value` item, inlined children flattened into the parent's
    /// key space.
    pub fn write_attributes(
        &self,
        entity: &Entity,
        inside_string: bool,
    ) -> Result<Vec<String>, BlueprintError> {
        let mut items = Vec::with_capacity(entity.attributes.len());
        self.collect_attributes(entity, inside_string, "", &mut items)?;
        Ok(items)
    }

    fn collect_attributes(
        &self,
        entity: &Entity,
        inside_string: bool,
        prefix: &str,
        items: &mut Vec<String>,
    ) -> Result<(), BlueprintError> {
        let schema = schema_of(entity.kind);
        for pair in &entity.attributes {
            let key = format!("{prefix}{}", pair.key);
            let Some(attribute) = schema.attribute(&pair.key) else {
                items.push(format!("{key}={}", self.write_value(&pair.value, inside_string)?));
                continue;
            };
            if attribute.suppress_default && attribute.default.matches(&pair.value) {
                continue;
            }
            match &pair.value {
                Value::Entity(child) if attribute.inlined_kind().is_some() => {
                    self.collect_attributes(child, inside_string, &format!("{key}."), items)?;
                }
                Value::Array(values) if attribute.inlined_item().is_some() => {
                    for (index, value) in values.iter().enumerate() {
                        let value = self.write_attribute_value(attribute, value, inside_string)?;
                        items.push(format!("{key}({index})={value}"));
                    }
                }
                value => {
                    let value = self.write_attribute_value(attribute, value, inside_string)?;
                    items.push(format!("{key}={value}"));
                }
            }
        }
        Ok(())
    }

    fn write_attribute_value(
        &self,
        attribute: &Attribute,
        value: &Value,
        inside_string: bool,
    ) -> Result<String, BlueprintError> {
        if attribute.serialized && !matches!(value, Value::String(_)) {
            return Ok(format!("\"{}\"", self.write_value(value, true)?));
        }
        self.write_value(value, inside_string)
    }
}

/// Writes any entity through its schema.
pub struct EntitySerializer;

impl Serializer for EntitySerializer {
    fn write(
        &self,
        writer: &Writer<'_>,
        value: &Value,
        inside_string: bool,
    ) -> Result<String, BlueprintError> {
        let entity = value
            .as_entity()
            .ok_or_else(|| BlueprintError::mismatch("entity", value.type_tag().to_string()))?;
        // A key binding holding only its key is written in the bare form
        if entity.kind == EntityKind::KeyBinding {
            if let [pair] = entity.attributes.as_slice() {
                if pair.key == "Key" {
                    return writer.write_value(&pair.value, inside_string);
                }
            }
        }
        writer.write_entity(entity, inside_string)
    }
}

fn mismatch(expected: &str, value: &Value) -> BlueprintError {
    BlueprintError::mismatch(expected, value.type_tag().to_string())
}

/// Re-escapes already serialized text for nesting inside another string.
fn nest(text: String, inside_string: bool) -> String {
    if inside_string {
        escape_quotes(&text)
    } else {
        text
    }
}

pub fn write_null(_: &Writer<'_>, value: &Value, _: bool) -> Result<String, BlueprintError> {
    match value {
        Value::Null => Ok("()".to_string()),
        other => Err(mismatch("Null", other)),
    }
}

pub fn write_boolean(_: &Writer<'_>, value: &Value, _: bool) -> Result<String, BlueprintError> {
    match value {
        Value::Boolean(true) => Ok("True".to_string()),
        Value::Boolean(false) => Ok("False".to_string()),
        other => Err(mismatch("Boolean", other)),
    }
}

pub fn write_number(_: &Writer<'_>, value: &Value, _: bool) -> Result<String, BlueprintError> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Integer64(i) => Ok(i.to_string()),
        Value::Real(r) => Ok(r.to_string()),
        Value::Byte(b) => Ok(b.to_string()),
        other => Err(mismatch("number", other)),
    }
}

pub fn write_string(
    _: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let Value::String(text) = value else {
        return Err(mismatch("String", value));
    };
    let escaped = escape_string(text);
    if inside_string {
        Ok(format!("\\\"{}\\\"", escape_quotes(&escaped)))
    } else {
        Ok(format!("\"{escaped}\""))
    }
}

pub fn write_symbol(_: &Writer<'_>, value: &Value, _: bool) -> Result<String, BlueprintError> {
    match value {
        Value::Symbol(symbol) => Ok(symbol.clone()),
        Value::Guid(guid) => Ok(guid.to_string()),
        other => Err(mismatch("Symbol", other)),
    }
}

pub fn write_object_reference(
    _: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    match value {
        Value::ObjectReference(reference) => {
            Ok(nest(reference.full().to_string(), inside_string))
        }
        other => Err(mismatch("ObjectReference", other)),
    }
}

pub fn write_localized_text(
    _: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let Value::LocalizedText(text) = value else {
        return Err(mismatch("LocalizedText", value));
    };
    let written = format!(
        "NSLOCTEXT(\"{}\", \"{}\", \"{}\")",
        escape_string(&text.namespace),
        escape_string(&text.key),
        escape_string(&text.value)
    );
    Ok(nest(written, inside_string))
}

pub fn write_invariant_text(
    _: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let Value::InvariantText(text) = value else {
        return Err(mismatch("InvariantText", value));
    };
    Ok(nest(
        format!("INVTEXT(\"{}\")", escape_string(text)),
        inside_string,
    ))
}

pub fn write_format_text(
    writer: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let Value::FormatText(text) = value else {
        return Err(mismatch("FormatText", value));
    };
    let arguments = text
        .arguments
        .iter()
        .map(|argument| writer.write_value(argument, inside_string))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}({})", text.kind.macro_name(), arguments.join(", ")))
}

pub fn write_pin_reference(
    _: &Writer<'_>,
    value: &Value,
    _: bool,
) -> Result<String, BlueprintError> {
    match value {
        Value::PinReference(reference) => {
            Ok(format!("{} {}", reference.object_name, reference.pin_guid))
        }
        other => Err(mismatch("PinReference", other)),
    }
}

/// `(a,b,)`; the empty array is `()`.
pub fn write_array(
    writer: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let Value::Array(values) = value else {
        return Err(mismatch("Array", value));
    };
    let mut result = String::from("(");
    for item in values {
        result.push_str(&writer.write_value(item, inside_string)?);
        result.push(',');
    }
    result.push(')');
    Ok(result)
}

/// Values read by the unknown-value grammar are written by their own serializer.
pub fn write_any(
    writer: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    writer.write_value(value, inside_string)
}

/// `X, Y, Z`, `X, Y` or `P, Y, R`.
pub fn write_simple_vector(
    writer: &Writer<'_>,
    value: &Value,
    inside_string: bool,
) -> Result<String, BlueprintError> {
    let entity = value
        .as_entity()
        .ok_or_else(|| mismatch("simple serialization vector", value))?;
    let keys: &[&str] = match entity.kind {
        EntityKind::SimpleSerializationVector => &["X", "Y", "Z"],
        EntityKind::SimpleSerializationVector2D => &["X", "Y"],
        EntityKind::SimpleSerializationRotator => &["P", "Y", "R"],
        _ => return writer.write_entity(entity, inside_string),
    };
    let mut components = Vec::with_capacity(keys.len());
    for key in keys {
        match entity.get(key) {
            Some(component) => components.push(writer.write_value(component, inside_string)?),
            None => return writer.write_entity(entity, inside_string),
        }
    }
    Ok(components.join(", "))
}
