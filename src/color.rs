use crate::ast::{Entity, Pair, Real, Value};
use crate::error::BlueprintError;
use crate::leaf;
use crate::parser::Parser;
use crate::registry;
use crate::schema::EntityKind;
use serde::Serialize;

/// A color with four unit-interval channels, as stored in `(R=..,G=..,B=..,A=..)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::white()
    }
}

impl LinearColor {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    pub fn from_rgba_bytes([r, g, b, a]: [u8; 4]) -> Self {
        let unit = |channel: u8| f64::from(channel) / 255.0;
        Self::new(unit(r), unit(g), unit(b), unit(a))
    }

    /// Reads `#RRGGBB[AA]`, `rgb(..)`, `rgba(..)` or a bare byte list.
    pub fn from_any_format(text: &str) -> Result<Self, BlueprintError> {
        let mut parser = Parser::new(text, registry::global()).with_name("color");
        let value = parser.parse_complete(leaf::linear_color_any)?;
        value
            .as_entity()
            .and_then(LinearColor::from_entity)
            .ok_or_else(|| BlueprintError::mismatch("LinearColor", value.type_tag().to_string()))
    }

    /// Reads the channels of a `LinearColor` entity; `A` defaults to opaque.
    pub fn from_entity(entity: &Entity) -> Option<Self> {
        if entity.kind != EntityKind::LinearColor {
            return None;
        }
        Some(Self {
            r: entity.f64("R")?,
            g: entity.f64("G")?,
            b: entity.f64("B")?,
            a: entity.f64("A").unwrap_or(1.0),
        })
    }

    pub fn to_entity(&self) -> Entity {
        let channel = |value: f64| Value::Real(Real::with_precision(value, 6));
        Entity {
            kind: EntityKind::LinearColor,
            lookbehind: None,
            attributes: vec![
                Pair::new("R", channel(self.r)),
                Pair::new("G", channel(self.g)),
                Pair::new("B", channel(self.b)),
                Pair::new("A", channel(self.a)),
            ],
        }
    }

    /// Channels scaled to bytes, rounded and clamped.
    pub fn to_rgba(&self) -> [u8; 4] {
        let byte = |channel: f64| (channel * 255.0).round().clamp(0.0, 255.0) as u8;
        [byte(self.r), byte(self.g), byte(self.b), byte(self.a)]
    }

    /// `RRGGBBAA` in upper case hex.
    pub fn to_rgba_string(&self) -> String {
        self.to_rgba()
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect()
    }

    /// The RGBA bytes packed big-endian into a signed 32 bit integer.
    pub fn to_number(&self) -> i32 {
        u32::from_be_bytes(self.to_rgba()) as i32
    }

    /// Hue, saturation, value and alpha, all in `0..=1`.
    pub fn to_hsva(&self) -> [f64; 4] {
        let Self { r, g, b, a } = *self;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let saturation = if max == 0.0 { 0.0 } else { delta / max };
        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        [hue / 6.0, saturation, max, a]
    }

    pub fn set_from_hsva(&mut self, [h, s, v, a]: [f64; 4]) {
        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - f * s);
        let t = v * (1.0 - (1.0 - f) * s);
        let (r, g, b) = match (sector as i64).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        *self = Self::new(r, g, b, a);
    }
}
