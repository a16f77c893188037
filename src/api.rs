use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::error::{ConfigError, ParseError};
use crate::parser::Parser;
use crate::serialization;
use crate::stream::TokenStream;
use crate::value::Group;

/// Parse a configuration from a string.
///
/// The filename in error messages is `"<string>"` and `@include` paths
/// resolve against the current directory; use [`loads_with`] to control
/// both.
///
/// # Errors
///
/// Returns a [`ConfigError`] on any lexical, include, or grammar error.
///
/// # Examples
///
/// ```
/// let config = libconfig::loads("window: { title: \"example\"; };").unwrap();
/// assert_eq!(config["window"]["title"].as_str(), Some("example"));
/// ```
pub fn loads(source: &str) -> Result<Group, ConfigError> {
    loads_with(source, "<string>", Path::new(""))
}

/// Parse a configuration from a string, resolving `@include` directives
/// against `include_dir`. `filename` is used only in error messages and
/// for circular-include detection.
///
/// # Errors
///
/// Returns a [`ConfigError`] on any lexical, include, or grammar error.
pub fn loads_with(
    source: &str,
    filename: &str,
    include_dir: &Path,
) -> Result<Group, ConfigError> {
    let stream = TokenStream::from_reader(
        source.as_bytes(),
        filename,
        include_dir,
        &HashSet::new(),
    )?;
    Ok(Parser::new(stream).parse()?)
}

/// Open and parse a configuration file, resolving `@include` directives
/// against `include_dir`.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the file cannot be read or on any
/// lexical, include, or grammar error.
pub fn load(path: impl AsRef<Path>, include_dir: &Path) -> Result<Group, ConfigError> {
    let path = path.as_ref();
    let filename = path.to_string_lossy().into_owned();
    let file = File::open(path).map_err(|e| ParseError::Read {
        file: filename.clone(),
        reason: e.to_string(),
    })?;
    let stream = TokenStream::from_reader(
        BufReader::new(file),
        &filename,
        include_dir,
        &HashSet::new(),
    )?;
    Ok(Parser::new(stream).parse()?)
}

/// Render a configuration to libconfig text.
///
/// # Errors
///
/// Returns a [`ConfigError`] when a key is not name-shaped or a value
/// cannot be represented (container inside an array, non-finite float).
pub fn dumps(root: &Group) -> Result<String, ConfigError> {
    Ok(serialization::to_string_group(root)?)
}

/// Render a configuration to a writer.
///
/// # Errors
///
/// Like [`dumps`], plus i/o errors from the writer.
pub fn dump<W: Write>(root: &Group, writer: &mut W) -> Result<(), ConfigError> {
    let text = serialization::to_string_group(root)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

impl Group {
    /// Export the configuration as pretty-printed JSON, preserving entry
    /// order.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the configuration as YAML, preserving entry order.
    ///
    /// # Errors
    ///
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
