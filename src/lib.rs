pub mod api;
pub mod ast;
pub mod color;
pub mod config;
pub mod document;
pub mod entities;
pub mod error;
pub mod leaf;
pub mod lexer;
pub mod parser;
pub mod pin;
pub mod registry;
pub mod sanitizer;
pub mod schema;
pub mod serialization;
pub mod utils;

pub use api::{
    read, read_document, read_entity, read_multiple, read_multiple_with, read_value, read_with,
    write, write_multiple, write_multiple_with, write_value, Readable,
};
pub use ast::{Entity, Pair, Real, Value};
pub use color::LinearColor;
pub use config::Options;
pub use document::{Document, ObjectEntity};
pub use entities::{
    Byte, FormatKind, FormatText, Guid, KeyBinding, LocalizedText, ObjectReference, PinReference,
    Rotator, Symbol, Vector, Vector2D,
};
pub use error::{BlueprintError, ParserError};
pub use pin::{Pin, PinDirection};
pub use schema::{EntityKind, TypeTag};
