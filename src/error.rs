use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Serialize(#[from] SerializeError),

    #[error("i/o error while writing configuration")]
    #[diagnostic(code(libconfig::io))]
    Io(#[from] std::io::Error),
}

/// Errors raised while tokenizing, resolving includes, or parsing.
/// Parsing aborts on the first error; no partial trees are produced.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ParseError {
    #[error("couldn't load config in {file:?} row {row}, column {column}: {context:?}")]
    #[diagnostic(
        code(libconfig::parse::bad_token),
        help("no lexical rule matches the input at this position")
    )]
    BadToken {
        file: String,
        row: usize,
        column: usize,
        context: String,
    },

    #[error("unexpected token {token}; expected {expected}")]
    #[diagnostic(code(libconfig::parse::unexpected_token))]
    UnexpectedToken { token: String, expected: String },

    #[error("unexpected end of input; expected {expected}")]
    #[diagnostic(code(libconfig::parse::unexpected_eof))]
    UnexpectedEof { expected: String },

    #[error("integer out of range in {file:?} row {row}, column {column}: {text:?}")]
    #[diagnostic(
        code(libconfig::parse::integer_overflow),
        help("integer values must fit 64-bit signed storage")
    )]
    IntegerOverflow {
        file: String,
        row: usize,
        column: usize,
        text: String,
    },

    #[error("circular include: {file:?}")]
    #[diagnostic(code(libconfig::parse::circular_include))]
    CircularInclude { file: String },

    #[error("could not open include file {path:?}: {reason}")]
    #[diagnostic(code(libconfig::parse::include_not_found))]
    IncludeNotFound { path: String, reason: String },

    #[error("could not read {file:?}: {reason}")]
    #[diagnostic(code(libconfig::parse::read))]
    Read { file: String, reason: String },
}

/// Errors raised while rendering a value tree back to libconfig text.
/// Serialization aborts on the first offending value.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SerializeError {
    #[error("the top-level value must be a group, not {kind}")]
    #[diagnostic(code(libconfig::serialize::non_group_root))]
    NonGroupRoot { kind: &'static str },

    #[error("invalid setting name {key:?}")]
    #[diagnostic(
        code(libconfig::serialize::invalid_key),
        help("setting names must match [A-Za-z*][-A-Za-z0-9_*]*")
    )]
    InvalidKey { key: String },

    #[error("unsupported value: {detail}")]
    #[diagnostic(code(libconfig::serialize::unsupported_value))]
    UnsupportedValue { detail: String },
}
