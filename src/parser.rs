use crate::error::ParseError;
use crate::lexer::{Token, TokenKind, TokenValue};
use crate::stream::TokenStream;
use crate::value::{Group, Value};

/// A recursive descent parser for the libconfig grammar.
///
/// Alternatives are tried in a fixed order as capability checks returning
/// `Ok(None)` on "this production does not start here"; the first success
/// wins and there is no backtracking once a production is entered, which
/// keeps error positions precise.
#[derive(Debug)]
pub struct Parser {
    tokens: TokenStream,
}

impl Parser {
    pub fn new(tokens: TokenStream) -> Self {
        Self { tokens }
    }

    /// configuration := setting_list EOF
    pub fn parse(&mut self) -> Result<Group, ParseError> {
        let root = self.setting_list()?;
        if !self.tokens.finished() {
            return Err(self.tokens.error("end of input"));
        }
        Ok(root)
    }

    /// setting_list := setting*
    fn setting_list(&mut self) -> Result<Group, ParseError> {
        let mut group = Group::new();
        while let Some((name, value)) = self.setting()? {
            // Duplicates overwrite in place, keeping the first position.
            group.insert(name, value);
        }
        Ok(group)
    }

    /// setting := name (':'|'=') value (';'|',')?
    fn setting(&mut self) -> Result<Option<(String, Value)>, ParseError> {
        let name = match self.tokens.accept(&[TokenKind::Name]) {
            Some(token) => token.text,
            None => return Ok(None),
        };
        self.tokens.expect(&[TokenKind::Colon, TokenKind::Equals])?;
        let value = match self.value()? {
            Some(value) => value,
            None => return Err(self.tokens.error("a value")),
        };
        // The terminator is tolerated, not required.
        self.tokens.accept(&[TokenKind::Semicolon, TokenKind::Comma]);
        Ok(Some((name, value)))
    }

    /// value := scalar | array | list | group
    fn value(&mut self) -> Result<Option<Value>, ParseError> {
        if let Some(value) = self.scalar_value()? {
            return Ok(Some(value));
        }
        if let Some(value) = self.array()? {
            return Ok(Some(value));
        }
        if let Some(value) = self.list()? {
            return Ok(Some(value));
        }
        self.group()
    }

    /// scalar := boolean | integer64 | integer | hex64 | hex | float | string+
    fn scalar_value(&mut self) -> Result<Option<Value>, ParseError> {
        if let Some(token) = self.tokens.accept(&[
            TokenKind::Boolean,
            TokenKind::Integer,
            TokenKind::Integer64,
            TokenKind::Hex,
            TokenKind::Hex64,
            TokenKind::Float,
        ]) {
            return Ok(Some(scalar_from_token(&token)));
        }
        self.string()
    }

    /// Adjacent string tokens concatenate into a single string value;
    /// comments between them are already gone after tokenizing.
    fn string(&mut self) -> Result<Option<Value>, ParseError> {
        let Some(first) = self.tokens.accept(&[TokenKind::Str]) else {
            return Ok(None);
        };
        let mut joined = match first.value {
            TokenValue::Str(s) => s,
            _ => unreachable!("string token without a string payload"),
        };
        while let Some(token) = self.tokens.accept(&[TokenKind::Str]) {
            if let TokenValue::Str(s) = token.value {
                joined.push_str(&s);
            }
        }
        Ok(Some(Value::Str(joined)))
    }

    /// array := '[' (scalar (',' scalar)*)? ']'
    fn array(&mut self) -> Result<Option<Value>, ParseError> {
        if self.tokens.accept(&[TokenKind::LBracket]).is_none() {
            return Ok(None);
        }
        let values = self.comma_separated(Self::scalar_value)?;
        self.tokens.expect(&[TokenKind::RBracket])?;
        Ok(Some(Value::Array(values)))
    }

    /// list := '(' (value (',' value)*)? ')'
    fn list(&mut self) -> Result<Option<Value>, ParseError> {
        if self.tokens.accept(&[TokenKind::LParen]).is_none() {
            return Ok(None);
        }
        let values = self.comma_separated(Self::value)?;
        self.tokens.expect(&[TokenKind::RParen])?;
        Ok(Some(Value::List(values)))
    }

    /// group := '{' setting_list '}'
    fn group(&mut self) -> Result<Option<Value>, ParseError> {
        if self.tokens.accept(&[TokenKind::LBrace]).is_none() {
            return Ok(None);
        }
        let body = self.setting_list()?;
        self.tokens.expect(&[TokenKind::RBrace])?;
        Ok(Some(Value::Group(body)))
    }

    /// Comma-separated elements, possibly empty. A comma is only accepted
    /// after at least one element, and each comma must be followed by
    /// another element, so trailing commas are rejected.
    fn comma_separated(
        &mut self,
        mut element: impl FnMut(&mut Self) -> Result<Option<Value>, ParseError>,
    ) -> Result<Vec<Value>, ParseError> {
        let mut values = Vec::new();
        loop {
            match element(self)? {
                Some(value) => values.push(value),
                None if values.is_empty() => return Ok(values),
                None => return Err(self.tokens.error("a value after ','")),
            }
            if self.tokens.accept(&[TokenKind::Comma]).is_none() {
                return Ok(values);
            }
        }
    }
}

/// Convert a numeric or boolean token into its value. Integer tokens
/// become `Int64` when they carry an `L` suffix or don't fit `i32`.
fn scalar_from_token(token: &Token) -> Value {
    match token.value {
        TokenValue::Bool(b) => Value::Bool(b),
        TokenValue::Float(f) => Value::Float(f),
        TokenValue::Int { value, is_long } => match i32::try_from(value) {
            Ok(narrow) if !is_long => Value::Int(narrow),
            _ => Value::Int64(value),
        },
        TokenValue::Str(ref s) => Value::Str(s.clone()),
        TokenValue::None => unreachable!("scalar token without a decoded value"),
    }
}
