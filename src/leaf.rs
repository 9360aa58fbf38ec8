//! Hand written grammars for the irregular leaf formats of the paste text.
//!
//! Every grammar has the [`Alternative`] signature so it can be registered directly or listed
//! in an ordered alternation.

use crate::ast::{Entity, Real, Value};
use crate::color::LinearColor;
use crate::entities::{FormatKind, FormatText, Guid, LocalizedText, ObjectReference, PinReference};
use crate::lexer::{Lexer, NumberText};
use crate::parser::{Alternative, PResult, Parser, Reason};
use crate::schema::{schema_of, AttrType, EntityKind, TypeTag};
use crate::utils::unescape_string;

// === Primitives ===

/// Null ::= "(" \s* ")"
pub fn null(p: &mut Parser<'_>) -> PResult<Value> {
    p.parse_null()
}

/// Boolean ::= "true" | "false"    (any letter case)
pub fn boolean(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let value = if p.lexer().eat_str_ignore_case("true") {
        true
    } else if p.lexer().eat_str_ignore_case("false") {
        false
    } else {
        return p.expected("a boolean");
    };
    if p.lexer().next_is_word_char() {
        p.reset(start);
        return p.expected_at(start, "a boolean");
    }
    Ok(Value::Boolean(value))
}

/// `[+-]?\d+(\.\d+)?` not followed by another `.`.
fn number_text<'a>(p: &mut Parser<'a>, what: &str) -> PResult<NumberText<'a>> {
    let start = p.position();
    match p.lexer().read_number_text() {
        Some(text) if p.lexer().peek() != Some('.') => Ok(text),
        _ => {
            p.reset(start);
            p.expected_at(start, what)
        }
    }
}

fn whole_number<'a>(p: &mut Parser<'a>, what: &str) -> PResult<&'a str> {
    let start = p.position();
    let text = number_text(p, what)?;
    if text.fraction_digits.is_some() {
        p.reset(start);
        return p.expected_at(start, what);
    }
    Ok(text.text)
}

fn out_of_range<T>(p: &mut Parser<'_>, start: usize, message: String) -> PResult<T> {
    let end = p.position();
    p.reset(start);
    p.fail_span(start, end, Reason::OutOfRange(message))
}

/// Integer ::= [+-]? Digits
pub fn integer(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let text = whole_number(p, "an integer")?;
    match text.parse::<i32>() {
        Ok(value) => Ok(Value::Integer(value)),
        Err(_) => out_of_range(p, start, format!("`{text}` does not fit in a 32 bit integer")),
    }
}

/// Integer64 ::= [+-]? Digits
pub fn integer64(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let text = whole_number(p, "an integer")?;
    match text.parse::<i64>() {
        Ok(value) => Ok(Value::Integer64(value)),
        Err(_) => out_of_range(p, start, format!("`{text}` does not fit in a 64 bit integer")),
    }
}

/// Real ::= [+-]? Digits [ "." Digits ] | [+-]? "inf"
pub fn real(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let negative = p.lexer().eat_char('-');
    if !negative {
        p.lexer().eat_char('+');
    }
    if p.lexer().eat_str("inf") && !p.lexer().next_is_word_char() {
        let value = if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return Ok(Value::Real(Real::new(value)));
    }
    p.reset(start);
    let text = number_text(p, "a number")?;
    match text.text.parse::<f64>() {
        Ok(value) => Ok(Value::Real(Real::with_precision(
            value,
            text.fraction_digits.unwrap_or(0),
        ))),
        Err(_) => out_of_range(p, start, format!("`{}` is not a number", text.text)),
    }
}

/// Byte ::= ["+"] Digits    (0 to 255)
pub fn byte(p: &mut Parser<'_>) -> PResult<Value> {
    read_byte(p).map(Value::Byte)
}

fn read_byte(p: &mut Parser<'_>) -> PResult<u8> {
    let start = p.position();
    p.lexer().eat_char('+');
    let digits = p.lexer().read_digits();
    if digits.is_empty() || p.lexer().peek() == Some('.') {
        p.reset(start);
        return p.expected_at(start, "a byte");
    }
    match digits.parse::<u8>() {
        Ok(value) => Ok(value),
        Err(_) => out_of_range(p, start, format!("`{digits}` does not fit in a byte (0 to 255)")),
    }
}

/// String ::= '"' { Char | "\" Char } '"'
pub fn string(p: &mut Parser<'_>) -> PResult<Value> {
    quoted_string(p).map(Value::String)
}

fn quoted_string(p: &mut Parser<'_>) -> PResult<String> {
    match p.lexer().read_quoted() {
        Some(raw) => Ok(unescape_string(raw)),
        None => p.expected("a string"),
    }
}

/// Symbol ::= [A-Za-z_] { Word }
pub fn symbol(p: &mut Parser<'_>) -> PResult<Value> {
    match p.lexer().read_symbol() {
        Some(symbol) => Ok(Value::Symbol(symbol.to_string())),
        None => p.expected("a symbol"),
    }
}

// === Identifiers ===

/// Guid ::= HexDigit{32}
pub fn guid(p: &mut Parser<'_>) -> PResult<Value> {
    read_guid(p, true).map(Value::Guid)
}

/// The GUID alternative of an unknown value: a hex run of another length is just not a GUID.
fn guid_token(p: &mut Parser<'_>) -> PResult<Value> {
    read_guid(p, false).map(Value::Guid)
}

fn read_guid(p: &mut Parser<'_>, strict: bool) -> PResult<Guid> {
    let start = p.position();
    let run = p.lexer().read_word_run();
    let all_hex = !run.is_empty() && run.chars().all(|c| c.is_ascii_hexdigit());
    if all_hex && run.len() == Guid::LENGTH {
        return Ok(Guid::new_unchecked(run));
    }
    if strict && all_hex {
        let message = format!(
            "a GUID has {} hex digits, `{run}` has {}",
            Guid::LENGTH,
            run.len()
        );
        return out_of_range(p, start, message);
    }
    p.reset(start);
    p.expected_at(start, "a GUID")
}

/// PinReference ::= Symbol \s+ Guid
pub fn pin_reference(p: &mut Parser<'_>) -> PResult<Value> {
    let Some(object_name) = p.lexer().read_symbol() else {
        return p.expected("an object name");
    };
    if p.lexer().skip_whitespace() == 0 {
        return p.expected("whitespace");
    }
    let pin_guid = read_guid(p, true)?;
    Ok(Value::PinReference(PinReference::new(object_name, pin_guid)))
}

// === Object References ===

/// PathFragment ::= Symbol { ( "." | ":" ) Symbol }
fn read_path_fragment(lexer: &mut Lexer<'_>) -> bool {
    if lexer.read_symbol().is_none() {
        return false;
    }
    loop {
        let mark = lexer.position();
        if !(lexer.eat_char('.') || lexer.eat_char(':')) {
            break;
        }
        if lexer.read_symbol().is_none() {
            lexer.set_position(mark);
            break;
        }
    }
    true
}

/// Path ::= "/" PathFragment "/" PathFragment { "/" PathFragment }
fn read_path<'a>(lexer: &mut Lexer<'a>) -> Option<&'a str> {
    let start = lexer.position();
    let mut segments = 0;
    loop {
        let mark = lexer.position();
        if !lexer.eat_char('/') {
            break;
        }
        if !read_path_fragment(lexer) {
            lexer.set_position(mark);
            break;
        }
        segments += 1;
    }
    if segments < 2 {
        lexer.set_position(start);
        return None;
    }
    Some(lexer.slice(start, lexer.position()))
}

/// DottedSymbol ::= Symbol { "." Symbol }
fn read_dotted_symbol<'a>(lexer: &mut Lexer<'a>) -> Option<&'a str> {
    let start = lexer.position();
    lexer.read_symbol()?;
    loop {
        let mark = lexer.position();
        if !lexer.eat_char('.') {
            break;
        }
        if lexer.read_symbol().is_none() {
            lexer.set_position(mark);
            break;
        }
    }
    Some(lexer.slice(start, lexer.position()))
}

/// SerializedReference ::= '"' Type [ "'" Path "'" ] '"'
fn serialized_reference(p: &mut Parser<'_>) -> PResult<ObjectReference> {
    let start = p.position();
    let Some(content) = p.lexer().read_quoted() else {
        return p.expected("a quoted object reference");
    };
    let end = p.position();
    let full = p.lexer().slice(start, end);
    let reference = match content.find('\'') {
        Some(quote) if content.len() > quote + 1 && content.ends_with('\'') => {
            ObjectReference::from_parts(
                &content[..quote],
                &content[quote + 1..content.len() - 1],
                full,
            )
        }
        _ => ObjectReference::from_parts(content, "", full),
    };
    Ok(reference)
}

/// FullReference ::= ( Path | Symbol ) [ Blank ] ( "'" '"' Inside '"' "'" | "'" Inside "'" )
fn full_reference(p: &mut Parser<'_>) -> PResult<ObjectReference> {
    let start = p.position();
    let lexer = p.lexer();
    let Some(type_name) = read_path(lexer).or_else(|| lexer.read_symbol()) else {
        return p.expected("an object type");
    };
    lexer.skip_inline_whitespace();
    let quote = p.position();
    let lexer = p.lexer();
    let mut path = None;
    if lexer.eat_char('\'') && lexer.peek() == Some('"') {
        path = lexer.read_quoted().filter(|_| lexer.eat_char('\''));
    }
    if path.is_none() {
        lexer.set_position(quote);
        path = lexer.read_single_quoted();
    }
    let Some(path) = path else {
        return p.expected("a quoted path");
    };
    let end = p.position();
    let full = p.lexer().slice(start, end);
    Ok(ObjectReference::from_parts(type_name, path, full))
}

/// TypeReference ::= Path | DottedSymbol
fn type_reference(p: &mut Parser<'_>) -> PResult<ObjectReference> {
    let lexer = p.lexer();
    match read_path(lexer).or_else(|| read_dotted_symbol(lexer)) {
        Some(type_name) => Ok(ObjectReference::from_parts(type_name, "", type_name)),
        None => p.expected("an object reference"),
    }
}

/// ObjectReference ::= SerializedReference | FullReference | TypeReference
pub fn object_reference(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let reference = if let Some(reference) = p.optional(serialized_reference)? {
        reference
    } else if let Some(reference) = p.optional(full_reference)? {
        reference
    } else if let Some(reference) = p.optional(type_reference)? {
        reference
    } else {
        return p.expected_at(start, "an object reference");
    };
    Ok(Value::ObjectReference(reference))
}

fn none_reference(p: &mut Parser<'_>) -> PResult<Value> {
    p.expect_keyword("None")?;
    Ok(Value::ObjectReference(ObjectReference::none()))
}

fn full_object_reference(p: &mut Parser<'_>) -> PResult<Value> {
    full_reference(p).map(Value::ObjectReference)
}

fn path_reference(p: &mut Parser<'_>) -> PResult<Value> {
    match read_path(p.lexer()) {
        Some(path) => Ok(Value::ObjectReference(ObjectReference::from_parts(
            path, "", path,
        ))),
        None => p.expected("a path"),
    }
}

// === Text ===

fn text_macro_open(p: &mut Parser<'_>, keyword: &str) -> PResult<()> {
    p.expect_keyword(keyword)?;
    p.skip_ws();
    p.expect_char('(')?;
    p.skip_ws();
    Ok(())
}

/// LocalizedText ::= "NSLOCTEXT" "(" String "," String "," String [ "," ] ")"
pub fn localized_text(p: &mut Parser<'_>) -> PResult<Value> {
    text_macro_open(p, "NSLOCTEXT")?;
    let namespace = quoted_string(p)?;
    p.comma_separator()?;
    let key = quoted_string(p)?;
    p.comma_separator()?;
    let value = quoted_string(p)?;
    p.optional_trailing_comma();
    p.expect_char(')')?;
    Ok(Value::LocalizedText(LocalizedText::new(namespace, key, value)))
}

/// InvariantText ::= "INVTEXT" "(" String ")"
pub fn invariant_text(p: &mut Parser<'_>) -> PResult<Value> {
    text_macro_open(p, "INVTEXT")?;
    let value = quoted_string(p)?;
    p.skip_ws();
    p.expect_char(')')?;
    Ok(Value::InvariantText(value))
}

const FORMAT_ARGUMENTS: &[Alternative] =
    &[localized_text, format_text, invariant_text, string, real];

/// FormatText ::= ( "LOCGEN_FORMAT_NAMED" | "LOCGEN_FORMAT_ORDERED" ) "(" Argument { "," Argument } [ "," ] ")"
/// Argument ::= LocalizedText | FormatText | InvariantText | String | Real
pub fn format_text(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let kind = if p.optional(|p| text_macro_open(p, FormatKind::Named.macro_name()))?.is_some() {
        FormatKind::Named
    } else if p.optional(|p| text_macro_open(p, FormatKind::Ordered.macro_name()))?.is_some() {
        FormatKind::Ordered
    } else {
        return p.expected_at(start, "a format text macro");
    };
    let arguments = p.nested(|p| {
        let mut arguments = vec![p.first_of(FORMAT_ARGUMENTS, "a format argument")?];
        loop {
            match p.attempt(|p| {
                p.comma_separator()?;
                p.first_of(FORMAT_ARGUMENTS, "a format argument")
            }) {
                Ok(argument) => arguments.push(argument),
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(_) => break,
            }
        }
        p.optional_trailing_comma();
        p.expect_char(')')?;
        Ok(arguments)
    })?;
    Ok(Value::FormatText(FormatText::new(kind, arguments)))
}

// === Structured Leaves ===

fn entity(p: &mut Parser<'_>, kind: EntityKind) -> PResult<Value> {
    p.parse_tag(TypeTag::Entity(kind))
}

/// KeyBinding ::= Symbol | Entity
pub fn key_binding(p: &mut Parser<'_>) -> PResult<Value> {
    if let Some(key) = p.lexer().read_symbol() {
        let mut binding = Entity::new(EntityKind::KeyBinding);
        binding.set("Key", Value::Symbol(key.to_string()));
        return Ok(Value::entity(binding));
    }
    p.parse_entity(schema_of(EntityKind::KeyBinding))
        .map(Value::entity)
}

/// Comma separated reals stored under `keys`, in the order they appear.
fn number_list(p: &mut Parser<'_>, kind: EntityKind, keys: &[&str]) -> PResult<Value> {
    p.attempt(|p| {
        let mut entity = Entity::new(kind);
        for (index, key) in keys.iter().enumerate() {
            if index > 0 {
                p.comma_separator()?;
            }
            let component = real(p)?;
            entity.set(*key, component);
        }
        Ok(Value::entity(entity))
    })
}

fn number_list_or_entity(p: &mut Parser<'_>, kind: EntityKind, keys: &[&str]) -> PResult<Value> {
    if let Some(list) = p.optional(|p| number_list(p, kind, keys))? {
        return Ok(list);
    }
    p.parse_entity(schema_of(kind)).map(Value::entity)
}

/// SimpleVector ::= Real "," Real "," Real | Entity
pub fn simple_vector(p: &mut Parser<'_>) -> PResult<Value> {
    number_list_or_entity(p, EntityKind::SimpleSerializationVector, &["X", "Y", "Z"])
}

/// SimpleVector2D ::= Real "," Real | Entity
pub fn simple_vector_2d(p: &mut Parser<'_>) -> PResult<Value> {
    number_list_or_entity(p, EntityKind::SimpleSerializationVector2D, &["X", "Y"])
}

/// SimpleRotator ::= Pitch "," Yaw "," Roll | Entity
pub fn simple_rotator(p: &mut Parser<'_>) -> PResult<Value> {
    number_list_or_entity(p, EntityKind::SimpleSerializationRotator, &["P", "Y", "R"])
}

// === Colors ===

fn byte_list(p: &mut Parser<'_>, count: usize) -> PResult<[u8; 4]> {
    p.attempt(|p| {
        let mut channels = [255u8; 4];
        for (index, channel) in channels.iter_mut().take(count).enumerate() {
            if index > 0 {
                p.comma_separator()?;
            }
            *channel = read_byte(p)?;
        }
        Ok(channels)
    })
}

/// "rgb(" ByteList ")" and friends.
fn byte_function(p: &mut Parser<'_>, name: &str, count: usize) -> PResult<[u8; 4]> {
    p.attempt(|p| {
        if !p.lexer().eat_str(name) {
            return p.expected(&format!("`{name}(`"));
        }
        p.skip_ws();
        p.expect_char('(')?;
        p.skip_ws();
        let channels = byte_list(p, count)?;
        p.skip_ws();
        p.expect_char(')')?;
        Ok(channels)
    })
}

/// HexColor ::= "#" HexDigit{6} [ HexDigit{2} ]
fn hex_color(p: &mut Parser<'_>) -> PResult<[u8; 4]> {
    let start = p.position();
    if !p.lexer().eat_char('#') {
        return p.expected("`#`");
    }
    let digits = p.lexer().read_while(|c| c.is_ascii_hexdigit());
    if digits.len() != 6 && digits.len() != 8 {
        p.reset(start);
        return p.expected_at(start, "6 or 8 hex digits");
    }
    let mut channels = [255u8; 4];
    for (channel, pair) in channels.iter_mut().zip(digits.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(pair).unwrap_or_default();
        *channel = u8::from_str_radix(pair, 16).unwrap_or_default();
    }
    Ok(channels)
}

/// ColorText ::= HexColor | "rgba(" ByteList ")" | "rgb(" ByteList ")" | ByteList
///
/// Every spelling becomes a `LinearColor` entity with unit channels.
pub fn linear_color_any(p: &mut Parser<'_>) -> PResult<Value> {
    let start = p.position();
    let channels = if let Some(channels) = p.optional(hex_color)? {
        channels
    } else if let Some(channels) = p.optional(|p| byte_function(p, "rgba", 4))? {
        channels
    } else if let Some(channels) = p.optional(|p| byte_function(p, "rgb", 3))? {
        channels
    } else if let Some(channels) = p.optional(|p| byte_list(p, 4))? {
        channels
    } else if let Some(channels) = p.optional(|p| byte_list(p, 3))? {
        channels
    } else {
        return p.expected_at(start, "a color");
    };
    Ok(Value::entity(
        LinearColor::from_rgba_bytes(channels).to_entity(),
    ))
}

// === Unknown Values ===

fn vector(p: &mut Parser<'_>) -> PResult<Value> {
    entity(p, EntityKind::Vector)
}

fn rotator(p: &mut Parser<'_>) -> PResult<Value> {
    entity(p, EntityKind::Rotator)
}

fn linear_color(p: &mut Parser<'_>) -> PResult<Value> {
    entity(p, EntityKind::LinearColor)
}

fn vector_2d(p: &mut Parser<'_>) -> PResult<Value> {
    entity(p, EntityKind::Vector2D)
}

fn unknown_keys(p: &mut Parser<'_>) -> PResult<Value> {
    entity(p, EntityKind::UnknownKeys)
}

fn unknown_array(p: &mut Parser<'_>) -> PResult<Value> {
    p.parse_array(&AttrType::Of(TypeTag::Unknown))
        .map(Value::Array)
}

/// The order matters: earlier alternatives shadow later ones that would also match.
const UNKNOWN_ALTERNATIVES: &[Alternative] = &[
    boolean,
    guid_token,
    none_reference,
    null,
    real,
    string,
    localized_text,
    format_text,
    invariant_text,
    pin_reference,
    vector,
    rotator,
    linear_color,
    vector_2d,
    full_object_reference,
    path_reference,
    unknown_keys,
    unknown_array,
    symbol,
];

/// The value of an undeclared attribute: whatever the first matching alternative makes of it.
pub fn unknown_value(p: &mut Parser<'_>) -> PResult<Value> {
    p.first_of(UNKNOWN_ALTERNATIVES, "a value")
}
