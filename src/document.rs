use crate::ast::{Entity, Pair, Value};
use crate::entities::{Guid, ObjectReference, PinReference};
use crate::error::BlueprintError;
use crate::leaf;
use crate::parser::{PResult, Parser, Reason};
use crate::pin::Pin;
use crate::schema::{EntityKind, TypeTag, OBJECT};
use crate::serialization::Writer;
use serde::Serialize;

/// One `Begin Object ... End Object` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ObjectReference>,
    /// A `String` or a `Symbol`, so the original quoting survives a round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<ObjectReference>,
    pub sub_objects: Vec<ObjectEntity>,
    pub attributes: Entity,
    pub custom_properties: Vec<Pin>,
}

impl Default for ObjectEntity {
    fn default() -> Self {
        Self {
            class: None,
            name: None,
            archetype: None,
            export_path: None,
            sub_objects: Vec::new(),
            attributes: Entity::new(EntityKind::Object),
            custom_properties: Vec::new(),
        }
    }
}

impl ObjectEntity {
    pub fn new(class: ObjectReference, name: impl Into<String>) -> Self {
        Self {
            class: Some(class),
            name: Some(Value::String(name.into())),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.set(key, value);
    }

    pub fn pins(&self) -> &[Pin] {
        &self.custom_properties
    }

    pub fn add_pin(&mut self, pin: Pin) {
        self.custom_properties.push(pin);
    }

    pub fn find_pin(&self, pin_id: &Guid) -> Option<&Pin> {
        self.custom_properties
            .iter()
            .find(|pin| pin.pin_id().is_some_and(|id| id.same_as(pin_id)))
    }

    pub fn find_pin_mut(&mut self, pin_id: &Guid) -> Option<&mut Pin> {
        self.custom_properties
            .iter_mut()
            .find(|pin| pin.pin_id().is_some_and(|id| id.same_as(pin_id)))
    }

    pub fn find_pin_by_name(&self, name: &str) -> Option<&Pin> {
        self.custom_properties.iter().find(|pin| pin.pin_name() == name)
    }

    /// `NodePosX` and `NodePosY`, when both are present.
    pub fn node_position(&self) -> Option<(i32, i32)> {
        let coordinate = |key| match self.attributes.get(key) {
            Some(Value::Integer(value)) => Some(*value),
            _ => None,
        };
        Some((coordinate("NodePosX")?, coordinate("NodePosY")?))
    }

    pub fn set_node_position(&mut self, x: i32, y: i32) {
        self.attributes.set("NodePosX", x);
        self.attributes.set("NodePosY", y);
    }

    /// The block as paste text, every line prefixed with `indent`.
    pub fn write(&self, writer: &Writer<'_>, indent: &str) -> Result<String, BlueprintError> {
        let inner = format!("{indent}{}", writer.indentation());
        let mut result = format!("{indent}Begin Object");
        if let Some(class) = &self.class {
            result.push_str(&format!(" Class={}", class.full()));
        }
        if let Some(name) = &self.name {
            result.push_str(&format!(" Name={}", writer.write_value(name, false)?));
        }
        if let Some(archetype) = &self.archetype {
            result.push_str(&format!(" Archetype={}", archetype.full()));
        }
        if let Some(export_path) = &self.export_path {
            result.push_str(&format!(" ExportPath={}", export_path.full()));
        }
        result.push('\n');
        for sub_object in &self.sub_objects {
            result.push_str(&sub_object.write(writer, &inner)?);
        }
        for item in writer.write_attributes(&self.attributes, false)? {
            result.push_str(&format!("{inner}{item}\n"));
        }
        for pin in &self.custom_properties {
            let pin = writer.write_entity(pin.entity(), false)?;
            result.push_str(&format!("{inner}CustomProperties {pin}\n"));
        }
        result.push_str(&format!("{indent}End Object\n"));
        Ok(result)
    }
}

/// A whole paste buffer. Owns its objects and resolves the weak pin links between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub objects: Vec<ObjectEntity>,
}

impl Document {
    pub fn new(objects: Vec<ObjectEntity>) -> Self {
        Self { objects }
    }

    pub fn find_object(&self, name: &str) -> Option<&ObjectEntity> {
        self.objects.iter().find(|object| object.name() == Some(name))
    }

    pub fn find_object_mut(&mut self, name: &str) -> Option<&mut ObjectEntity> {
        self.objects
            .iter_mut()
            .find(|object| object.name() == Some(name))
    }

    pub fn find_pin(&self, object_name: &str, pin_id: &Guid) -> Option<&Pin> {
        self.find_object(object_name)?.find_pin(pin_id)
    }

    pub fn resolve_link(&self, link: &PinReference) -> Option<&Pin> {
        self.find_pin(&link.object_name, &link.pin_guid)
    }

    /// Every pin `pin` links to that exists in this document. Dangling links are skipped.
    pub fn linked_pins<'d>(&'d self, pin: &'d Pin) -> impl Iterator<Item = &'d Pin> + 'd {
        pin.links().filter_map(|link| self.resolve_link(link))
    }

    /// Links two pins in both directions. Returns `false` when either end is missing.
    pub fn connect(
        &mut self,
        (from_object, from_pin): (&str, &Guid),
        (to_object, to_pin): (&str, &Guid),
    ) -> bool {
        if self.find_pin(from_object, from_pin).is_none() || self.find_pin(to_object, to_pin).is_none() {
            return false;
        }
        let forward = PinReference::new(to_object, to_pin.clone());
        let backward = PinReference::new(from_object, from_pin.clone());
        if let Some(pin) = self
            .find_object_mut(from_object)
            .and_then(|object| object.find_pin_mut(from_pin))
        {
            pin.add_link(forward);
        }
        if let Some(pin) = self
            .find_object_mut(to_object)
            .and_then(|object| object.find_pin_mut(to_pin))
        {
            pin.add_link(backward);
        }
        true
    }

    pub fn write(&self, writer: &Writer<'_>) -> Result<String, BlueprintError> {
        self.objects
            .iter()
            .map(|object| object.write(writer, ""))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, BlueprintError> {
        serde_json::to_string_pretty(self).map_err(|e| BlueprintError::Export {
            message: e.to_string(),
        })
    }

    pub fn to_yaml(&self) -> Result<String, BlueprintError> {
        serde_yaml::to_string(self).map_err(|e| BlueprintError::Export {
            message: e.to_string(),
        })
    }
}

// === Grammar ===

/// The `Object` grammar of the registry.
pub fn object_block(p: &mut Parser<'_>) -> PResult<Value> {
    parse_object(p).map(|object| Value::Object(Box::new(object)))
}

/// Object ::= "Begin" \s+ "Object" Header { \s+ BodyLine } \s+ "End" \s+ "Object"
pub fn parse_object(p: &mut Parser<'_>) -> PResult<ObjectEntity> {
    begin_object(p)?;
    p.nested(object_body)
}

/// Objects ::= Object { \s+ Object }
pub fn parse_objects(p: &mut Parser<'_>) -> PResult<Vec<ObjectEntity>> {
    let mut objects = vec![parse_object(p)?];
    loop {
        match p.attempt(|p| {
            whitespace(p)?;
            parse_object(p)
        }) {
            Ok(object) => objects.push(object),
            Err(failure) if failure.is_fatal() => return Err(failure),
            Err(_) => break,
        }
    }
    Ok(objects)
}

fn whitespace(p: &mut Parser<'_>) -> PResult<()> {
    if p.lexer().skip_whitespace() == 0 {
        return p.expected("whitespace");
    }
    Ok(())
}

fn begin_object(p: &mut Parser<'_>) -> PResult<()> {
    p.attempt(|p| {
        p.expect_keyword("Begin")?;
        whitespace(p)?;
        p.expect_keyword("Object")
    })
}

fn end_object(p: &mut Parser<'_>) -> PResult<()> {
    p.attempt(|p| {
        p.expect_keyword("End")?;
        whitespace(p)?;
        p.expect_keyword("Object")
    })
}

fn object_body(p: &mut Parser<'_>) -> PResult<ObjectEntity> {
    let start = p.position();
    let mut object = ObjectEntity::default();
    parse_header(p, &mut object)?;

    let mut pairs: Vec<Pair> = Vec::new();
    loop {
        whitespace(p)?;
        if p.optional(end_object)?.is_some() {
            break;
        }
        if p.optional(begin_object)?.is_some() {
            object.sub_objects.push(p.nested(object_body)?);
            continue;
        }
        if p.optional(custom_properties)?.is_some() {
            let value = p.parse_tag(TypeTag::Entity(EntityKind::Pin))?;
            match value {
                Value::Entity(entity) => {
                    if let Some(pin) = Pin::from_entity(*entity) {
                        object.custom_properties.push(pin);
                    }
                }
                _ => return p.expected("a pin"),
            }
            continue;
        }
        pairs.push(p.parse_pair(&OBJECT)?);
    }
    object.attributes = p.build_entity(&OBJECT, pairs, start, "")?;
    Ok(object)
}

fn custom_properties(p: &mut Parser<'_>) -> PResult<()> {
    p.expect_keyword("CustomProperties")?;
    whitespace(p)
}

/// Header ::= { [ \t]+ HeaderKey "=" HeaderValue }
fn parse_header(p: &mut Parser<'_>, object: &mut ObjectEntity) -> PResult<()> {
    loop {
        let mark = p.position();
        if p.lexer().skip_inline_whitespace() == 0 {
            return Ok(());
        }
        let key_start = p.position();
        let Some(key) = p.lexer().read_symbol() else {
            p.reset(mark);
            return Ok(());
        };
        if !p.lexer().eat_char('=') {
            p.reset(mark);
            return Ok(());
        }
        match key {
            "Class" => object.class = Some(reference(p)?),
            "Name" => object.name = Some(p.first_of(&[leaf::string, leaf::symbol], "an object name")?),
            "Archetype" => object.archetype = Some(reference(p)?),
            "ExportPath" => object.export_path = Some(reference(p)?),
            other => {
                let end = key_start + other.len();
                return p.fail_span(key_start, end, Reason::UnexpectedAttribute(other.to_string()));
            }
        }
    }
}

fn reference(p: &mut Parser<'_>) -> PResult<ObjectReference> {
    match p.parse_tag(TypeTag::ObjectReference)? {
        Value::ObjectReference(reference) => Ok(reference),
        _ => p.expected("an object reference"),
    }
}

/// The `Object` serializer of the registry.
pub fn write_object(
    writer: &Writer<'_>,
    value: &Value,
    _: bool,
) -> Result<String, BlueprintError> {
    match value {
        Value::Object(object) => object.write(writer, ""),
        other => Err(BlueprintError::mismatch(
            "Object",
            other.type_tag().to_string(),
        )),
    }
}
