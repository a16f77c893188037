use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SerializeError;
use crate::value::{Group, Value};

/// Spaces per nesting level, applied uniformly to group and container
/// bodies.
const INDENT: usize = 4;

/// Setting names must re-tokenize as a single `name` token.
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[A-Za-z\*][-A-Za-z0-9_\*]*\z").unwrap());

/// Render a value tree whose root is a group. Fails when the root is not
/// a group; see [`to_string_group`] for the statically-typed entry point.
pub fn to_string(root: &Value) -> Result<String, SerializeError> {
    match root {
        Value::Group(group) => to_string_group(group),
        other => Err(SerializeError::NonGroupRoot {
            kind: other.kind_name(),
        }),
    }
}

/// Render a group as a complete configuration document. The top level has
/// no enclosing braces.
pub fn to_string_group(root: &Group) -> Result<String, SerializeError> {
    let mut out = String::new();
    write_group_body(root, &mut out, 0)?;
    Ok(out)
}

fn write_group_body(group: &Group, out: &mut String, indent: usize) -> Result<(), SerializeError> {
    for (key, value) in group.iter() {
        if !NAME.is_match(key) {
            return Err(SerializeError::InvalidKey {
                key: key.to_string(),
            });
        }
        write_setting(key, value, out, indent)?;
    }
    Ok(())
}

fn write_setting(
    key: &str,
    value: &Value,
    out: &mut String,
    indent: usize,
) -> Result<(), SerializeError> {
    match value {
        Value::Group(group) => {
            let _ = writeln!(out, "{:indent$}{key} =", "");
            let _ = writeln!(out, "{:indent$}{{", "");
            write_group_body(group, out, indent + INDENT)?;
            let _ = writeln!(out, "{:indent$}}};", "");
        }
        Value::Array(items) => {
            check_array_elements(items)?;
            let _ = writeln!(out, "{:indent$}{key} =", "");
            let _ = writeln!(out, "{:indent$}[", "");
            write_collection(items, out, indent + INDENT)?;
            let _ = writeln!(out, "\n{:indent$}];", "");
        }
        Value::List(items) => {
            let _ = writeln!(out, "{:indent$}{key} =", "");
            let _ = writeln!(out, "{:indent$}(", "");
            write_collection(items, out, indent + INDENT)?;
            let _ = writeln!(out, "\n{:indent$});", "");
        }
        scalar => {
            let _ = writeln!(out, "{:indent$}{key} = {};", "", scalar_text(scalar)?);
        }
    }
    Ok(())
}

/// One element per line, comma after all but the last, no trailing
/// newline. Container elements recurse one indent level deeper.
fn write_collection(
    values: &[Value],
    out: &mut String,
    indent: usize,
) -> Result<(), SerializeError> {
    for (i, value) in values.iter().enumerate() {
        match value {
            Value::Group(group) => {
                let _ = writeln!(out, "{:indent$}{{", "");
                write_group_body(group, out, indent + INDENT)?;
                let _ = write!(out, "{:indent$}}}", "");
            }
            Value::Array(items) => {
                check_array_elements(items)?;
                let _ = writeln!(out, "{:indent$}[", "");
                write_collection(items, out, indent + INDENT)?;
                let _ = write!(out, "\n{:indent$}]", "");
            }
            Value::List(items) => {
                let _ = writeln!(out, "{:indent$}(", "");
                write_collection(items, out, indent + INDENT)?;
                let _ = write!(out, "\n{:indent$})", "");
            }
            scalar => {
                let _ = write!(out, "{:indent$}{}", "", scalar_text(scalar)?);
            }
        }
        if i + 1 < values.len() {
            out.push_str(",\n");
        }
    }
    Ok(())
}

fn check_array_elements(items: &[Value]) -> Result<(), SerializeError> {
    match items.iter().find(|item| !item.is_scalar()) {
        Some(item) => Err(SerializeError::UnsupportedValue {
            detail: format!("array elements must be scalars, found {}", item.kind_name()),
        }),
        None => Ok(()),
    }
}

fn scalar_text(value: &Value) -> Result<String, SerializeError> {
    match value {
        Value::Bool(true) => Ok("true".to_string()),
        Value::Bool(false) => Ok("false".to_string()),
        Value::Int(i) => Ok(i.to_string()),
        // The suffix is kept even for small values so the setting
        // reloads with 64-bit storage.
        Value::Int64(i) => Ok(format!("{i}L")),
        Value::Float(f) => float_text(*f),
        Value::Str(s) => Ok(string_text(s)),
        other => Err(SerializeError::UnsupportedValue {
            detail: format!("{} is not a scalar", other.kind_name()),
        }),
    }
}

/// Shortest decimal text that parses back to exactly the same `f64`. A
/// `.0` is appended when the text carries neither a dot nor an exponent,
/// so the value re-tokenizes as a float rather than an integer.
fn float_text(f: f64) -> Result<String, SerializeError> {
    if !f.is_finite() {
        return Err(SerializeError::UnsupportedValue {
            detail: format!("non-finite float {f}"),
        });
    }
    let mut text = f.to_string();
    if !text.contains('.') && !text.contains('e') && !text.contains('E') {
        text.push_str(".0");
    }
    Ok(text)
}

/// Quote and escape a string: `\\` and `\"`, named escapes for the
/// common control characters, `\xHH` for the remaining non-printable
/// bytes. Characters at or above 0x80 pass through unescaped.
fn string_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7F => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
