use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::lexer::{decode_escapes, Token, TokenKind, Tokenizer};

static INCLUDE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\A@include "(.*)"\z"#).unwrap());

/// A parsing-oriented view over a flat token sequence: lookahead,
/// conditional consumption, and error reporting.
///
/// [`TokenStream::from_reader`] is the preferred way to read input files,
/// as it expands `@include` directives, which the [`Tokenizer`] does not.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Tokenize a string, expanding includes against `include_dir`.
    pub fn from_str(
        input: &str,
        filename: &str,
        include_dir: &Path,
    ) -> Result<Self, ParseError> {
        Self::from_reader(input.as_bytes(), filename, include_dir, &HashSet::new())
    }

    /// Build a token stream by reading `reader` line by line.
    ///
    /// A line holding only `@include "path"` splices in the tokens of the
    /// named file, resolved against `include_dir`. The include line is
    /// replaced by an equal-length blank line so row/column accounting of
    /// the following tokens stays correct. `seen` holds the filenames
    /// currently being expanded; each recursion branch gets its own copy,
    /// so sibling includes of the same file are legal while cycles fail.
    pub fn from_reader<R: BufRead>(
        mut reader: R,
        filename: &str,
        include_dir: &Path,
        seen: &HashSet<String>,
    ) -> Result<Self, ParseError> {
        if seen.contains(filename) {
            return Err(ParseError::CircularInclude {
                file: filename.to_string(),
            });
        }
        let mut seen = seen.clone();
        seen.insert(filename.to_string());

        let mut tokenizer = Tokenizer::new(filename);
        let mut tokens = Vec::new();
        let mut pending = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(|e| ParseError::Read {
                file: filename.to_string(),
                reason: e.to_string(),
            })?;
            if read == 0 {
                break;
            }

            let Some(captures) = INCLUDE_LINE.captures(line.trim()) else {
                pending.push_str(&line);
                continue;
            };

            tokenizer.tokenize(&pending, &mut tokens)?;
            pending.clear();
            pending.extend(line.chars().map(|c| if c.is_whitespace() { c } else { ' ' }));

            let raw_path = captures.get(1).map_or("", |m| m.as_str());
            let include_path = include_dir.join(decode_escapes(raw_path));
            let include_name = include_path.to_string_lossy().into_owned();
            log::debug!("expanding include {include_name:?} from {filename:?}");

            let file = File::open(&include_path).map_err(|e| ParseError::IncludeNotFound {
                path: include_name.clone(),
                reason: e.to_string(),
            })?;
            let nested =
                Self::from_reader(BufReader::new(file), &include_name, include_dir, &seen)?;
            tokens.extend(nested.tokens);
        }
        tokenizer.tokenize(&pending, &mut tokens)?;

        Ok(Self::new(tokens))
    }

    /// The next token, without consuming it. `None` at end of input.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Consume and return the next token if its kind is one of `kinds`,
    /// otherwise leave the position untouched.
    pub fn accept(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        let token = self.tokens.get(self.position)?;
        if kinds.contains(&token.kind) {
            let token = token.clone();
            self.position += 1;
            Some(token)
        } else {
            None
        }
    }

    /// Like [`accept`](Self::accept), but a non-matching token or end of
    /// input is a syntax error naming the expected kinds.
    pub fn expect(&mut self, kinds: &[TokenKind]) -> Result<Token, ParseError> {
        match self.accept(kinds) {
            Some(token) => Ok(token),
            None => Err(self.error(&describe_kinds(kinds))),
        }
    }

    /// A syntax error at the current position, naming the current token
    /// or the end of input.
    pub fn error(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                token: token.to_string(),
                expected: expected.to_string(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    pub fn finished(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

fn describe_kinds(kinds: &[TokenKind]) -> String {
    kinds
        .iter()
        .map(|k| k.describe())
        .collect::<Vec<_>>()
        .join(" or ")
}
