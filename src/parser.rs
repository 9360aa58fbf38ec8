use crate::ast::{Entity, Pair, Value};
use crate::error::{BlueprintError, ParserError};
use crate::lexer::Lexer;
use crate::registry::Registry;
use crate::sanitizer;
use crate::schema::{
    schema_of, AttrType, Lookbehind, Route, Schema, TypeTag, UnknownKeys, ValueGrammar,
};
use crate::utils::get_line_and_column;
use miette::NamedSource;

pub type PResult<T> = Result<T, Failure>;

/// A grammar written as a plain function over the parser.
pub type Alternative = for<'p, 'a> fn(&'p mut Parser<'a>) -> PResult<Value>;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Why a grammar did not match.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    Expected(String),
    MissingAttribute(String),
    UnexpectedAttribute(String),
    OutOfRange(String),
    TooDeeplyNested(usize),
    Unregistered(TypeTag),
}

/// A failed match over `start..end` of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub start: usize,
    pub end: usize,
    pub reason: Reason,
}

impl Failure {
    /// Fatal failures abort every enclosing alternation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.reason,
            Reason::TooDeeplyNested(_) | Reason::Unregistered(_)
        )
    }
}

/// A backtracking recursive descent parser over the paste text.
///
/// Grammars are looked up in a [`Registry`] by [`TypeTag`]; entity grammars are derived from
/// their schema by [`Parser::parse_entity`]. On overall failure the furthest failure seen
/// becomes the reported error.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    registry: &'a Registry,
    name: String,
    depth: usize,
    max_depth: usize,
    furthest: Option<Failure>,
    fatal: Option<Failure>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, registry: &'a Registry) -> Self {
        Self {
            lexer: Lexer::new(source),
            registry,
            name: "paste.t3d".to_string(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            furthest: None,
            fatal: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn lexer(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn source(&self) -> &'a str {
        self.lexer.input()
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    pub fn reset(&mut self, position: usize) {
        self.lexer.set_position(position);
    }

    pub fn skip_ws(&mut self) {
        self.lexer.skip_whitespace();
    }

    // === Failure Bookkeeping ===

    /// Records a failure over `start..end` and returns it.
    pub fn fail_span<T>(&mut self, start: usize, end: usize, reason: Reason) -> PResult<T> {
        let failure = Failure {
            start,
            end: end.max(start),
            reason,
        };
        self.record(&failure);
        Err(failure)
    }

    /// A failure at the current position.
    pub fn expected<T>(&mut self, what: &str) -> PResult<T> {
        let position = self.position();
        self.expected_at(position, what)
    }

    pub fn expected_at<T>(&mut self, position: usize, what: &str) -> PResult<T> {
        self.fail_span(position, position, Reason::Expected(what.to_string()))
    }

    fn record(&mut self, failure: &Failure) {
        if failure.is_fatal() {
            if self.fatal.is_none() {
                self.fatal = Some(failure.clone());
            }
            return;
        }
        let Some(current) = &mut self.furthest else {
            self.furthest = Some(failure.clone());
            return;
        };
        if failure.end > current.end {
            *current = failure.clone();
            return;
        }
        if failure.end < current.end {
            return;
        }
        match (&mut current.reason, &failure.reason) {
            (Reason::Expected(existing), Reason::Expected(other)) => {
                let known = existing.split(" or ").any(|part| part == other);
                if !known && existing.matches(" or ").count() < 4 {
                    existing.push_str(" or ");
                    existing.push_str(other);
                }
            }
            // Semantic failures explain more than a missing token at the same spot
            (Reason::Expected(_), _) => *current = failure.clone(),
            _ => {}
        }
    }

    // === Combinators ===

    /// Runs `f`, rewinding the input when it fails.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let start = self.position();
        let result = f(self);
        if result.is_err() {
            self.reset(start);
        }
        result
    }

    /// Like [`Parser::attempt`], but a non-fatal failure becomes `None`.
    pub fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        match self.attempt(f) {
            Ok(value) => Ok(Some(value)),
            Err(failure) if failure.is_fatal() => Err(failure),
            Err(_) => Ok(None),
        }
    }

    /// Tries every alternative in order; the first match wins.
    pub fn first_of(&mut self, alternatives: &[Alternative], what: &str) -> PResult<Value> {
        let start = self.position();
        for alternative in alternatives {
            match self.attempt(|p| alternative(p)) {
                Ok(value) => return Ok(value),
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(failure) => log::trace!("alternative failed at {}: {:?}", failure.start, failure.reason),
            }
        }
        self.expected_at(start, what)
    }

    /// Guards one level of nesting against `max_depth`.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_depth {
            let position = self.position();
            return self.fail_span(position, position, Reason::TooDeeplyNested(self.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub fn expect_char(&mut self, expected: char) -> PResult<()> {
        if self.lexer.eat_char(expected) {
            Ok(())
        } else {
            self.expected(&format!("`{expected}`"))
        }
    }

    /// A keyword that is not the prefix of a longer word.
    pub fn expect_keyword(&mut self, keyword: &str) -> PResult<()> {
        let start = self.position();
        if self.lexer.eat_str(keyword) && !self.lexer.next_is_word_char() {
            return Ok(());
        }
        self.reset(start);
        self.expected(&format!("`{keyword}`"))
    }

    /// CommaSeparation ::= \s* "," \s*
    pub fn comma_separator(&mut self) -> PResult<()> {
        self.attempt(|p| {
            p.skip_ws();
            p.expect_char(',')?;
            p.skip_ws();
            Ok(())
        })
    }

    /// Consumes `\s*(,\s*)?`.
    pub fn optional_trailing_comma(&mut self) {
        self.skip_ws();
        if self.lexer.eat_char(',') {
            self.skip_ws();
        }
    }

    // === Type Dispatch ===

    /// Parses one value with the grammar registered for `tag`.
    pub fn parse_tag(&mut self, tag: TypeTag) -> PResult<Value> {
        let registry = self.registry;
        match registry.resolve(tag) {
            Ok(registration) => registration.grammar.parse(self),
            Err(_) => {
                let position = self.position();
                self.fail_span(position, position, Reason::Unregistered(tag))
            }
        }
    }

    pub fn parse_type(&mut self, ty: &AttrType) -> PResult<Value> {
        match ty {
            AttrType::Of(tag) => self.parse_tag(*tag),
            AttrType::Array(item) => self.parse_array(item).map(Value::Array),
            AttrType::Union(alternatives) => {
                self.parse_alternatives(alternatives, |p, alternative| p.parse_type(alternative))
            }
        }
    }

    fn parse_alternatives(
        &mut self,
        alternatives: &[AttrType],
        each: impl Fn(&mut Self, &AttrType) -> PResult<Value>,
    ) -> PResult<Value> {
        let start = self.position();
        for alternative in alternatives {
            match self.attempt(|p| each(p, alternative)) {
                Ok(value) => return Ok(value),
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(failure) => {
                    log::trace!("{} failed at {}: {:?}", alternative.describe(), start, failure.reason)
                }
            }
        }
        let description = alternatives
            .iter()
            .map(AttrType::describe)
            .collect::<Vec<_>>()
            .join(" or ");
        self.expected_at(start, &description)
    }

    /// Null ::= "(" \s* ")"
    pub fn parse_null(&mut self) -> PResult<Value> {
        self.attempt(|p| {
            p.expect_char('(')?;
            p.skip_ws();
            p.expect_char(')')?;
            Ok(Value::Null)
        })
    }

    /// Array ::= "(" [ Value { "," Value } [ "," ] ] ")"
    pub fn parse_array(&mut self, item: &AttrType) -> PResult<Vec<Value>> {
        self.expect_char('(')?;
        self.nested(|p| {
            p.skip_ws();
            let mut values = Vec::new();
            if p.lexer.eat_char(')') {
                return Ok(values);
            }
            values.push(p.parse_type(item)?);
            loop {
                match p.attempt(|p| {
                    p.comma_separator()?;
                    p.parse_type(item)
                }) {
                    Ok(value) => values.push(value),
                    Err(failure) if failure.is_fatal() => return Err(failure),
                    Err(_) => break,
                }
            }
            p.optional_trailing_comma();
            p.expect_char(')')?;
            Ok(values)
        })
    }

    /// Parses the value of one attribute, honoring its nullable and quoted forms.
    pub fn parse_value_grammar(&mut self, grammar: ValueGrammar) -> PResult<Value> {
        if grammar.nullable {
            if let Some(null) = self.optional(|p| p.parse_null())? {
                return Ok(null);
            }
        }
        if grammar.serialized {
            self.parse_serialized(grammar.ty)
        } else {
            self.parse_type(grammar.ty)
        }
    }

    /// Serialized ::= '"' Value '"'
    ///
    /// Values that are already strings (or have no grammar of their own) are read as plain
    /// strings.
    fn parse_serialized(&mut self, ty: &AttrType) -> PResult<Value> {
        match ty {
            AttrType::Of(TypeTag::String) | AttrType::Of(TypeTag::Unknown) => {
                self.parse_tag(TypeTag::String)
            }
            AttrType::Union(alternatives) => {
                self.parse_alternatives(alternatives, |p, alternative| p.parse_serialized(alternative))
            }
            other => self.attempt(|p| {
                p.expect_char('"')?;
                let value = p.parse_type(other)?;
                p.expect_char('"')?;
                Ok(value)
            }),
        }
    }

    // === Entities ===

    /// Entity ::= [ Lookbehind ] "(" Pair { "," Pair } [ "," ] ")"
    pub fn parse_entity(&mut self, schema: &'static Schema) -> PResult<Entity> {
        let start = self.position();
        let lookbehind = match schema.lookbehind {
            Lookbehind::None => None,
            Lookbehind::Keyword(keyword) => {
                self.expect_keyword(keyword)?;
                self.skip_ws();
                None
            }
            Lookbehind::Any => {
                let symbol = self.lexer.read_symbol().map(str::to_string);
                if symbol.is_some() {
                    self.skip_ws();
                }
                symbol
            }
        };
        self.expect_char('(')?;
        self.nested(|p| {
            p.skip_ws();
            let pairs = p.parse_pairs(schema)?;
            p.optional_trailing_comma();
            p.expect_char(')')?;
            let mut entity = p.build_entity(schema, pairs, start, "")?;
            entity.lookbehind = lookbehind;
            Ok(entity)
        })
    }

    fn parse_pairs(&mut self, schema: &'static Schema) -> PResult<Vec<Pair>> {
        let mut pairs = vec![self.parse_pair(schema)?];
        loop {
            match self.attempt(|p| {
                p.comma_separator()?;
                p.parse_pair(schema)
            }) {
                Ok(pair) => pairs.push(pair),
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(_) => break,
            }
        }
        Ok(pairs)
    }

    /// Pair ::= Key \s* "=" \s* Value
    pub(crate) fn parse_pair(&mut self, schema: &'static Schema) -> PResult<Pair> {
        let key_start = self.position();
        let key = self.parse_attribute_key()?;
        // A closed schema fails here, before the value is read
        if schema.unknown_keys == UnknownKeys::Reject && matches!(schema.route(&key), Route::Unknown) {
            let key_end = self.position();
            return self.fail_span(key_start, key_end, Reason::UnexpectedAttribute(key));
        }
        self.skip_ws();
        self.expect_char('=')?;
        self.skip_ws();
        let value = match schema.value_grammar(&key) {
            Some(grammar) => self.parse_value_grammar(grammar)?,
            None => self.parse_tag(TypeTag::Unknown)?,
        };
        Ok(Pair { key, value })
    }

    /// Key ::= Symbol { "." Symbol } [ "(" Digits ")" ]
    pub fn parse_attribute_key(&mut self) -> PResult<String> {
        let start = self.position();
        if self.lexer.read_symbol().is_none() {
            return self.expected("an attribute name");
        }
        loop {
            let mark = self.position();
            if !self.lexer.eat_char('.') {
                break;
            }
            if self.lexer.read_symbol().is_none() {
                self.reset(mark);
                break;
            }
        }
        let mark = self.position();
        if self.lexer.eat_char('(') {
            let digits = self.lexer.read_digits();
            if digits.is_empty() || !self.lexer.eat_char(')') {
                self.reset(mark);
            }
        }
        Ok(self.lexer.slice(start, self.position()).to_string())
    }

    /// Regroups flattened keys, validates the pair set against `schema` and fills defaults.
    /// `prefix` qualifies attribute names in errors raised for inlined children.
    pub(crate) fn build_entity(
        &mut self,
        schema: &'static Schema,
        pairs: Vec<Pair>,
        start: usize,
        prefix: &str,
    ) -> PResult<Entity> {
        let end = self.position();
        let attributes = schema.attributes;
        let mut declared: Vec<Option<Value>> = vec![None; attributes.len()];
        let mut inlined: Vec<Vec<Pair>> = vec![Vec::new(); attributes.len()];
        let mut items: Vec<Vec<(usize, Value)>> = vec![Vec::new(); attributes.len()];
        let mut unknown: Vec<Pair> = Vec::new();

        for Pair { key, value } in pairs {
            match schema.route(&key) {
                Route::Declared(index) => declared[index] = Some(value),
                Route::Inlined { index, rest } => inlined[index].push(Pair::new(rest, value)),
                Route::Indexed { index, item } => items[index].push((item, value)),
                Route::Unknown => {
                    let key = sanitizer::strip_marker(&key).to_string();
                    match unknown.iter_mut().find(|pair| pair.key == key) {
                        Some(existing) => existing.value = value,
                        None => unknown.push(Pair { key, value }),
                    }
                }
            }
        }

        let mut entity = Entity::new(schema.kind);
        for (index, attribute) in attributes.iter().enumerate() {
            let value = if let Some(kind) = attribute.inlined_kind() {
                match declared[index].take() {
                    Some(value) => Some(value),
                    None if inlined[index].is_empty() => None,
                    None => {
                        let children = std::mem::take(&mut inlined[index]);
                        let child_prefix = format!("{prefix}{}.", attribute.name);
                        let child =
                            self.build_entity(schema_of(kind), children, start, &child_prefix)?;
                        Some(Value::entity(child))
                    }
                }
            } else if attribute.inlined_item().is_some() && !items[index].is_empty() {
                let mut collected = std::mem::take(&mut items[index]);
                collected.sort_by_key(|(item, _)| *item);
                Some(Value::Array(
                    collected.into_iter().map(|(_, value)| value).collect(),
                ))
            } else {
                declared[index].take()
            };

            match value {
                Some(value) => entity.attributes.push(Pair::new(attribute.name, value)),
                None if attribute.required => {
                    let name = format!("{prefix}{}", attribute.name);
                    return self.fail_span(start, end, Reason::MissingAttribute(name));
                }
                None => {
                    if let Some(default) = attribute.default.to_value() {
                        entity.attributes.push(Pair::new(attribute.name, default));
                    }
                }
            }
        }

        if !schema.unknown_keys.allows(unknown.len()) {
            let name = unknown
                .first()
                .map(|pair| format!("{prefix}{}", pair.key))
                .unwrap_or_default();
            return self.fail_span(start, end, Reason::UnexpectedAttribute(name));
        }
        entity.attributes.extend(unknown);
        Ok(entity)
    }

    // === Completion ===

    /// Runs `f` over the whole input: leading and trailing whitespace is allowed, anything
    /// else left over is an error.
    pub fn parse_complete<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> Result<T, BlueprintError> {
        self.skip_ws();
        let result = match f(self) {
            Ok(value) => {
                self.skip_ws();
                if self.lexer.is_eof() {
                    Ok(value)
                } else {
                    self.expected("end of input")
                }
            }
            Err(failure) => Err(failure),
        };
        result.map_err(|failure| self.error_for(failure))
    }

    /// Converts the most informative failure seen so far into a diagnostic.
    pub fn error_for(&self, failure: Failure) -> BlueprintError {
        let failure = self
            .fatal
            .clone()
            .or_else(|| self.furthest.clone())
            .unwrap_or(failure);
        let source = self.source();
        let src = || NamedSource::new(self.name.clone(), source.to_string());
        let span = (failure.start, failure.end - failure.start);
        let error = match failure.reason {
            Reason::Expected(expected) if failure.start >= source.len() => {
                ParserError::UnexpectedEof {
                    src: src(),
                    span: (source.len(), 0).into(),
                    expected,
                }
            }
            Reason::Expected(expected) => {
                let (line, column) = get_line_and_column(source, failure.start);
                let width = source[failure.start..]
                    .chars()
                    .next()
                    .map_or(0, char::len_utf8);
                ParserError::UnexpectedToken {
                    src: src(),
                    span: (failure.start, width).into(),
                    expected,
                    line,
                    column,
                }
            }
            Reason::MissingAttribute(name) => ParserError::MissingRequiredAttribute {
                src: src(),
                span: span.into(),
                name,
            },
            Reason::UnexpectedAttribute(name) => ParserError::UnexpectedAttribute {
                src: src(),
                span: span.into(),
                name,
            },
            Reason::OutOfRange(message) => ParserError::OutOfRange {
                src: src(),
                span: span.into(),
                message,
            },
            Reason::TooDeeplyNested(limit) => ParserError::TooDeeplyNested {
                src: src(),
                span: span.into(),
                limit,
            },
            Reason::Unregistered(tag) => {
                return BlueprintError::UnregisteredType {
                    type_name: tag.to_string(),
                }
            }
        };
        error.into()
    }
}
