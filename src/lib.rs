pub mod api;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod serialization;
pub mod stream;
pub mod value;

pub use api::{dump, dumps, load, loads, loads_with};
pub use error::{ConfigError, ParseError, SerializeError};
pub use value::{Group, Value};
