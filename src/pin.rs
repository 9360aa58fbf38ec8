use crate::ast::{Entity, Value};
use crate::color::LinearColor;
use crate::entities::{Guid, ObjectReference, PinReference};
use crate::schema::EntityKind;
use serde::Serialize;

const OUTPUT_DIRECTION: &str = "EGPD_Output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinDirection {
    Input,
    Output,
    Hidden,
}

/// A `CustomProperties Pin (...)` entry of a node.
///
/// Links to other pins are weak: each is the owning object's name plus the target pin's id,
/// resolved against a [`Document`](crate::document::Document) when needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Pin(Entity);

impl Pin {
    /// A pin with every declared default and the given identity.
    pub fn new(pin_id: Guid, name: impl Into<String>) -> Self {
        let mut entity = Entity::with_defaults(EntityKind::Pin);
        entity.set("PinId", Value::Guid(pin_id));
        entity.set("PinName", name.into());
        Self(entity)
    }

    /// Wraps a parsed Pin entity. Repeated links to the same (object, pin) pair are collapsed
    /// to their first occurrence.
    pub fn from_entity(mut entity: Entity) -> Option<Self> {
        if entity.kind != EntityKind::Pin {
            return None;
        }
        if let Some(Value::Array(links)) = entity.get_mut("LinkedTo") {
            let before = links.len();
            let mut seen: Vec<PinReference> = Vec::with_capacity(before);
            links.retain(|value| match value {
                Value::PinReference(link) => {
                    if seen
                        .iter()
                        .any(|kept| kept.targets(&link.object_name, &link.pin_guid))
                    {
                        return false;
                    }
                    seen.push(link.clone());
                    true
                }
                _ => true,
            });
            if links.len() < before {
                log::debug!("dropped {} repeated pin link(s)", before - links.len());
            }
        }
        Some(Self(entity))
    }

    pub fn entity(&self) -> &Entity {
        &self.0
    }

    pub fn into_entity(self) -> Entity {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.set(key, value);
    }

    pub fn pin_id(&self) -> Option<&Guid> {
        self.0.get("PinId").and_then(Value::as_guid)
    }

    pub fn pin_name(&self) -> &str {
        self.0.str("PinName").unwrap_or_default()
    }

    /// The friendly name when there is one, otherwise the pin name.
    pub fn display_name(&self) -> String {
        self.0
            .get("PinFriendlyName")
            .and_then(Value::display_text)
            .unwrap_or_else(|| self.pin_name().to_string())
    }

    pub fn is_hidden(&self) -> bool {
        self.0.bool("bHidden").unwrap_or(false)
    }

    pub fn direction(&self) -> PinDirection {
        if self.is_hidden() {
            PinDirection::Hidden
        } else if self.0.str("Direction") == Some(OUTPUT_DIRECTION) {
            PinDirection::Output
        } else {
            PinDirection::Input
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction() == PinDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction() == PinDirection::Output
    }

    pub fn pin_type(&self) -> Option<&Entity> {
        self.0.entity("PinType")
    }

    pub fn category(&self) -> &str {
        self.pin_type()
            .and_then(|pin_type| pin_type.str("PinCategory"))
            .unwrap_or_default()
    }

    pub fn sub_category_object(&self) -> Option<&ObjectReference> {
        self.pin_type()?
            .get("PinSubCategoryObject")
            .and_then(Value::as_object_reference)
    }

    pub fn links(&self) -> impl Iterator<Item = &PinReference> {
        self.0
            .get("LinkedTo")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(|value| match value {
                Value::PinReference(reference) => Some(reference),
                _ => None,
            })
    }

    pub fn is_linked(&self) -> bool {
        self.links().next().is_some()
    }

    /// Adds a link unless the same (object, pin) pair is already present.
    pub fn add_link(&mut self, reference: PinReference) -> bool {
        if self
            .links()
            .any(|link| link.targets(&reference.object_name, &reference.pin_guid))
        {
            return false;
        }
        match self.0.get_mut("LinkedTo") {
            Some(Value::Array(links)) => links.push(Value::PinReference(reference)),
            _ => self.0.set(
                "LinkedTo",
                Value::Array(vec![Value::PinReference(reference)]),
            ),
        }
        true
    }

    /// Links this pin to `target`, owned by the object named `object_name`.
    pub fn link_to(&mut self, object_name: &str, target: &Pin) -> bool {
        match target.pin_id() {
            Some(pin_id) => self.add_link(PinReference::new(object_name, pin_id.clone())),
            None => false,
        }
    }

    /// Removes the link to `target`. The `LinkedTo` attribute goes away with its last link.
    pub fn unlink_from(&mut self, object_name: &str, target: &Pin) -> bool {
        let Some(pin_id) = target.pin_id().cloned() else {
            return false;
        };
        let Some(Value::Array(links)) = self.0.get_mut("LinkedTo") else {
            return false;
        };
        let Some(index) = links.iter().position(|value| {
            matches!(value, Value::PinReference(link) if link.targets(object_name, &pin_id))
        }) else {
            return false;
        };
        links.remove(index);
        if links.is_empty() {
            self.0.remove("LinkedTo");
        }
        true
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.0.get("DefaultValue")
    }

    pub fn default_color(&self) -> Option<LinearColor> {
        self.default_value()?
            .as_entity()
            .and_then(LinearColor::from_entity)
    }

    pub fn set_default_value(&mut self, value: impl Into<Value>) {
        self.0.set("DefaultValue", value);
    }
}
