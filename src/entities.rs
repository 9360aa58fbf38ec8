use crate::ast::{Entity, Real, Value};
use crate::error::BlueprintError;
use crate::schema::EntityKind;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A 32 hex digit identifier, kept with its original casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    pub const LENGTH: usize = 32;

    pub fn new(value: impl Into<String>) -> Result<Self, BlueprintError> {
        let value = value.into();
        if value.len() != Self::LENGTH || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BlueprintError::Range {
                message: format!("`{value}` is not a GUID of {} hex digits", Self::LENGTH),
            });
        }
        Ok(Self(value))
    }

    pub(crate) fn new_unchecked(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(format!("{value:032X}"))
    }

    pub fn zero() -> Self {
        Self::from_u128(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// GUIDs compare case-insensitively when used as identity.
    pub fn same_as(&self, other: &Guid) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bare identifier such as an enum value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to an object, class or function by name.
///
/// `full` is the exact text the reference was read from (or the canonical text for references
/// built in code) and is what gets written back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectReference {
    #[serde(rename = "type")]
    type_name: String,
    path: String,
    full: String,
}

impl ObjectReference {
    pub fn new(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let path = path.into();
        let full = if type_name.contains('/') || !path.is_empty() {
            if path.is_empty() {
                format!("\"{type_name}\"")
            } else {
                format!("\"{type_name}'{path}'\"")
            }
        } else {
            type_name.clone()
        };
        Self {
            type_name,
            path,
            full,
        }
    }

    pub(crate) fn from_parts(
        type_name: impl Into<String>,
        path: impl Into<String>,
        full: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            path: path.into(),
            full: full.into(),
        }
    }

    pub fn none() -> Self {
        Self::from_parts("None", "", "None")
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn is_none(&self) -> bool {
        self.type_name == "None" && self.path.is_empty()
    }

    /// The last segment of the path (or type when there is no path), without a `_C` class
    /// suffix.
    pub fn name(&self) -> &str {
        let source = if self.path.is_empty() {
            &self.type_name
        } else {
            &self.path
        };
        let source = source.strip_suffix("_C").unwrap_or(source);
        source
            .rsplit(['/', '.', ':'])
            .next()
            .unwrap_or(source)
    }

    /// Same target, regardless of spelling.
    pub fn same_target(&self, other: &ObjectReference) -> bool {
        self.type_name == other.type_name && self.path == other.path
    }
}

impl Display for ObjectReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// `NSLOCTEXT("namespace", "key", "value")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

impl LocalizedText {
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Display for LocalizedText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatKind {
    Named,
    Ordered,
}

impl FormatKind {
    pub fn macro_name(self) -> &'static str {
        match self {
            FormatKind::Named => "LOCGEN_FORMAT_NAMED",
            FormatKind::Ordered => "LOCGEN_FORMAT_ORDERED",
        }
    }
}

/// `LOCGEN_FORMAT_NAMED(...)` / `LOCGEN_FORMAT_ORDERED(...)`: a base text and its arguments,
/// with the substituted display string computed once at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatText {
    pub kind: FormatKind,
    pub arguments: Vec<Value>,
    pub resolved: String,
}

impl FormatText {
    pub fn new(kind: FormatKind, arguments: Vec<Value>) -> Self {
        let resolved = resolve_format(kind, &arguments);
        Self {
            kind,
            arguments,
            resolved,
        }
    }
}

impl Display for FormatText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.resolved)
    }
}

/// Substitutes `{Name}` / `{0}` placeholders of the first argument. Placeholders without a
/// matching argument are left as written.
fn resolve_format(kind: FormatKind, arguments: &[Value]) -> String {
    let Some(pattern) = arguments.first().and_then(Value::display_text) else {
        return String::new();
    };
    let rest = &arguments[1..];
    let lookup = |name: &str| -> Option<String> {
        match kind {
            FormatKind::Named => rest
                .chunks(2)
                .find(|pair| pair[0].display_text().as_deref() == Some(name))
                .and_then(|pair| pair.get(1))
                .and_then(Value::display_text),
            FormatKind::Ordered => name
                .parse::<usize>()
                .ok()
                .and_then(|index| rest.get(index))
                .and_then(Value::display_text),
        }
    };
    let mut result = String::with_capacity(pattern.len());
    let mut remaining = pattern.as_str();
    while let Some(open) = remaining.find('{') {
        result.push_str(&remaining[..open]);
        let after = &remaining[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push('{');
                        result.push_str(name);
                        result.push('}');
                    }
                }
                remaining = &after[close + 1..];
            }
            None => {
                result.push_str(&remaining[open..]);
                remaining = "";
            }
        }
    }
    result.push_str(remaining);
    result
}

/// A weak link to a pin: the owning object's name and the pin's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PinReference {
    pub object_name: String,
    pub pin_guid: Guid,
}

impl PinReference {
    pub fn new(object_name: impl Into<String>, pin_guid: Guid) -> Self {
        Self {
            object_name: object_name.into(),
            pin_guid,
        }
    }

    pub fn targets(&self, object_name: &str, pin_guid: &Guid) -> bool {
        self.object_name == object_name && self.pin_guid.same_as(pin_guid)
    }
}

/// An 8 bit unsigned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Byte(u8);

impl Byte {
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Truncates the fractional part and stores the result when it fits in a byte.
    /// Out of range values are rejected and the previous value is kept.
    pub fn set(&mut self, value: f64) -> Result<(), BlueprintError> {
        let truncated = value.trunc();
        if !(0.0..256.0).contains(&truncated) {
            return Err(BlueprintError::Range {
                message: format!("{value} does not fit in a byte (0 to 255)"),
            });
        }
        self.0 = truncated as u8;
        Ok(())
    }
}

fn component(entity: &Entity, key: &str) -> Option<f64> {
    entity.f64(key)
}

fn unit_real(value: f64) -> Value {
    Value::Real(Real::with_precision(value, 6))
}

/// `(X=..,Y=..,Z=..)`; also the typed view of `X, Y, Z` simple serialization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_entity(entity: &Entity) -> Option<Self> {
        match entity.kind {
            EntityKind::Vector | EntityKind::SimpleSerializationVector => Some(Self {
                x: component(entity, "X")?,
                y: component(entity, "Y")?,
                z: component(entity, "Z")?,
            }),
            _ => None,
        }
    }

    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(EntityKind::Vector);
        entity.set("X", unit_real(self.x));
        entity.set("Y", unit_real(self.y));
        entity.set("Z", unit_real(self.z));
        entity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_entity(entity: &Entity) -> Option<Self> {
        match entity.kind {
            EntityKind::Vector2D | EntityKind::SimpleSerializationVector2D => Some(Self {
                x: component(entity, "X")?,
                y: component(entity, "Y")?,
            }),
            _ => None,
        }
    }

    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(EntityKind::Vector2D);
        entity.set("X", unit_real(self.x));
        entity.set("Y", unit_real(self.y));
        entity
    }
}

/// Roll, pitch and yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotator {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Rotator {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn from_entity(entity: &Entity) -> Option<Self> {
        match entity.kind {
            EntityKind::Rotator | EntityKind::SimpleSerializationRotator => Some(Self {
                roll: component(entity, "R")?,
                pitch: component(entity, "P")?,
                yaw: component(entity, "Y")?,
            }),
            _ => None,
        }
    }

    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::new(EntityKind::Rotator);
        entity.set("R", unit_real(self.roll));
        entity.set("P", unit_real(self.pitch));
        entity.set("Y", unit_real(self.yaw));
        entity
    }
}

/// A keyboard shortcut, written either as a bare key or as `(bCtrl=True,Key=A)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct KeyBinding {
    pub action_name: String,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub cmd: bool,
    pub key: String,
}

impl KeyBinding {
    pub fn from_entity(entity: &Entity) -> Option<Self> {
        if entity.kind != EntityKind::KeyBinding {
            return None;
        }
        Some(Self {
            action_name: entity.str("ActionName").unwrap_or_default().to_string(),
            shift: entity.bool("bShift").unwrap_or(false),
            ctrl: entity.bool("bCtrl").unwrap_or(false),
            alt: entity.bool("bAlt").unwrap_or(false),
            cmd: entity.bool("bCmd").unwrap_or(false),
            key: entity.str("Key")?.to_string(),
        })
    }

    pub fn to_entity(&self) -> Entity {
        let mut entity = Entity::with_defaults(EntityKind::KeyBinding);
        entity.set("ActionName", self.action_name.as_str());
        entity.set("bShift", self.shift);
        entity.set("bCtrl", self.ctrl);
        entity.set("bAlt", self.alt);
        entity.set("bCmd", self.cmd);
        entity.set("Key", Value::Symbol(self.key.clone()));
        entity
    }
}
