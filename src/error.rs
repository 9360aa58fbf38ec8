use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Every failure surfaced by `read`, `write` and the registry.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum BlueprintError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error("No grammar or serializer registered for type `{type_name}`")]
    #[diagnostic(
        code(registry::unregistered_type),
        help("Register the type before parsing or writing values of it.")
    )]
    UnregisteredType { type_name: String },

    #[error("{message}")]
    #[diagnostic(code(value::out_of_range))]
    Range { message: String },

    #[error("Expected a value of type `{expected}`, found `{found}`")]
    #[diagnostic(
        code(value::type_mismatch),
        help("The text parsed, but the grammar produced a different kind of value.")
    )]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(config::invalid))]
    Config { message: String },

    #[error("Could not export the document: {message}")]
    #[diagnostic(code(document::export))]
    Export { message: String },
}

impl BlueprintError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        BlueprintError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Unexpected input at line {line}, column {column}: expected {expected}")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("No alternative of the grammar matched at this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("Unexpected end of input: expected {expected}")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The text ended before the value was complete.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended here")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Missing required attribute `{name}`")]
    #[diagnostic(
        code(parser::missing_attribute),
        help("This entity cannot be built without the attribute.")
    )]
    MissingRequiredAttribute {
        #[source_code]
        src: NamedSource<String>,
        #[label("`{name}` is missing from this entity")]
        span: SourceSpan,
        name: String,
    },

    #[error("Unexpected attribute `{name}`")]
    #[diagnostic(
        code(parser::unexpected_attribute),
        help("This entity does not accept attributes outside of its schema.")
    )]
    UnexpectedAttribute {
        #[source_code]
        src: NamedSource<String>,
        #[label("`{name}` is not declared for this entity")]
        span: SourceSpan,
        name: String,
    },

    #[error("{message}")]
    #[diagnostic(code(parser::out_of_range))]
    OutOfRange {
        #[source_code]
        src: NamedSource<String>,
        #[label("Value out of range")]
        span: SourceSpan,
        message: String,
    },

    #[error("Input is too deeply nested (limit is {limit})")]
    #[diagnostic(
        code(parser::too_deeply_nested),
        help("Raise `max_depth` in the options if the input is legitimate.")
    )]
    TooDeeplyNested {
        #[source_code]
        src: NamedSource<String>,
        #[label("Nesting limit reached here")]
        span: SourceSpan,
        limit: usize,
    },
}
