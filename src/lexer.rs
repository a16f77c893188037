use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

/// The kinds of tokens the libconfig tokenizer can produce.
///
/// The numeric kinds mirror the lexical rules: `Hex64`/`Integer64` are the
/// `L`/`LL`-suffixed forms that force 64-bit storage on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Float,
    Hex64,
    Hex,
    Integer64,
    Integer,
    Boolean,
    Str,
    Name,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Equals,
    Colon,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Float => "a float",
            TokenKind::Hex64 => "a 64-bit hex integer",
            TokenKind::Hex => "a hex integer",
            TokenKind::Integer64 => "a 64-bit integer",
            TokenKind::Integer => "an integer",
            TokenKind::Boolean => "a boolean",
            TokenKind::Str => "a string",
            TokenKind::Name => "a name",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Equals => "'='",
            TokenKind::Colon => "':'",
        }
    }
}

/// The decoded payload of a token. Punctuation and names carry `None`;
/// a name's payload is its literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Int { value: i64, is_long: bool },
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The literal text as matched in the input, escapes undecoded.
    pub text: String,
    pub value: TokenValue,
    /// Source file this token came from; include expansion means tokens of
    /// one stream may name different files.
    pub file: String,
    /// 1-based.
    pub row: usize,
    /// 1-based.
    pub column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} in {:?}, row {}, column {}",
            self.text, self.file, self.row, self.column
        )
    }
}

/// Whitespace, line comments (`#`, `//`) and block comments, skipped
/// between tokens. Block comments may span lines.
static SKIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(\s+|#[^\n]*|//[^\n]*|/\*(?s:.)*?\*/)").unwrap());

/// Lexical rules in priority order. Floats come before integers so `1.0`
/// is one float token, and the `L`-suffixed rules come before their
/// unsuffixed counterparts. The first matching rule wins.
static RULES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    [
        (
            TokenKind::Float,
            r"(([-+]?([0-9]+)?\.[0-9]*([eE][-+]?[0-9]+)?)|([-+]?([0-9]+)(\.[0-9]*)?[eE][-+]?[0-9]+))",
        ),
        (TokenKind::Hex64, r"0[Xx][0-9A-Fa-f]+L(L)?"),
        (TokenKind::Hex, r"0[Xx][0-9A-Fa-f]+"),
        (TokenKind::Integer64, r"[-+]?[0-9]+L(L)?"),
        (TokenKind::Integer, r"[-+]?[0-9]+"),
        (
            TokenKind::Boolean,
            r"(([Tt][Rr][Uu][Ee])|([Ff][Aa][Ll][Ss][Ee]))",
        ),
        (TokenKind::Str, r#""([^"\\]|\\.)*""#),
        (TokenKind::Name, r"[A-Za-z\*][-A-Za-z0-9_\*]*"),
        (TokenKind::RBrace, r"\}"),
        (TokenKind::LBrace, r"\{"),
        (TokenKind::RParen, r"\)"),
        (TokenKind::LParen, r"\("),
        (TokenKind::RBracket, r"\]"),
        (TokenKind::LBracket, r"\["),
        (TokenKind::Comma, r","),
        (TokenKind::Semicolon, r";"),
        (TokenKind::Equals, r"="),
        (TokenKind::Colon, r":"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(&format!(r"\A{pattern}")).unwrap()))
    .collect()
});

/// Decode libconfig string-literal escapes: `\xHH` two-digit hex escapes
/// and the single-character escapes `\\ \' \" \a \b \f \n \r \t \v`.
/// Anything else after a backslash is preserved verbatim, so a `\u`
/// sequence stays a literal backslash sequence while raw Unicode
/// characters pass through untouched.
pub(crate) fn decode_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 == chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let (decoded, consumed) = match chars[i + 1] {
            'x' if i + 3 < chars.len()
                && chars[i + 2].is_ascii_hexdigit()
                && chars[i + 3].is_ascii_hexdigit() =>
            {
                let code = (chars[i + 2].to_digit(16).unwrap() << 4)
                    | chars[i + 3].to_digit(16).unwrap();
                (char::from_u32(code).unwrap(), 4)
            }
            '\\' => ('\\', 2),
            '\'' => ('\'', 2),
            '"' => ('"', 2),
            'a' => ('\u{07}', 2),
            'b' => ('\u{08}', 2),
            'f' => ('\u{0C}', 2),
            'n' => ('\n', 2),
            'r' => ('\r', 2),
            't' => ('\t', 2),
            'v' => ('\u{0B}', 2),
            _ => ('\\', 1),
        };
        out.push(decoded);
        i += consumed;
    }
    out
}

/// Tokenizes libconfig input text.
///
/// The filename is used only in error messages; no data is read from it.
/// Row/column state survives across `tokenize` calls so the include
/// resolver can feed one file in several chunks.
///
/// Include directives are not handled here, see [`TokenStream`].
///
/// [`TokenStream`]: crate::stream::TokenStream
#[derive(Debug)]
pub struct Tokenizer {
    file: String,
    row: usize,
    column: usize,
}

impl Tokenizer {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            row: 1,
            column: 1,
        }
    }

    /// Append the tokens of `input` to `tokens`, or fail on the first
    /// stretch of text no lexical rule matches.
    pub fn tokenize(&mut self, input: &str, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let mut rest = input;
        'scan: while !rest.is_empty() {
            if let Some(m) = SKIP.find(rest) {
                let skipped = m.as_str();
                match skipped.rfind('\n') {
                    Some(last) => {
                        self.row += skipped.matches('\n').count();
                        self.column = 1 + skipped[last + 1..].chars().count();
                    }
                    None => self.column += skipped.chars().count(),
                }
                rest = &rest[m.end()..];
                continue;
            }

            for (kind, rule) in RULES.iter() {
                if let Some(m) = rule.find(rest) {
                    let text = m.as_str();
                    let value = self.decode(*kind, text)?;
                    tokens.push(Token {
                        kind: *kind,
                        text: text.to_string(),
                        value,
                        file: self.file.clone(),
                        row: self.row,
                        column: self.column,
                    });
                    self.column += text.chars().count();
                    rest = &rest[m.end()..];
                    continue 'scan;
                }
            }

            return Err(ParseError::BadToken {
                file: self.file.clone(),
                row: self.row,
                column: self.column,
                context: rest.chars().take(20).collect(),
            });
        }
        Ok(())
    }

    fn decode(&self, kind: TokenKind, text: &str) -> Result<TokenValue, ParseError> {
        let value = match kind {
            TokenKind::Float => {
                let parsed = text.parse::<f64>().map_err(|_| ParseError::BadToken {
                    file: self.file.clone(),
                    row: self.row,
                    column: self.column,
                    context: text.to_string(),
                })?;
                TokenValue::Float(parsed)
            }
            TokenKind::Hex | TokenKind::Hex64 => {
                let digits = &text.trim_end_matches('L')[2..];
                let parsed =
                    u64::from_str_radix(digits, 16).map_err(|_| self.overflow(text))?;
                TokenValue::Int {
                    value: parsed as i64,
                    is_long: kind == TokenKind::Hex64,
                }
            }
            TokenKind::Integer | TokenKind::Integer64 => {
                let parsed = text
                    .trim_end_matches('L')
                    .parse::<i64>()
                    .map_err(|_| self.overflow(text))?;
                TokenValue::Int {
                    value: parsed,
                    is_long: kind == TokenKind::Integer64,
                }
            }
            TokenKind::Boolean => TokenValue::Bool(text.starts_with(['t', 'T'])),
            TokenKind::Str => TokenValue::Str(decode_escapes(&text[1..text.len() - 1])),
            _ => TokenValue::None,
        };
        Ok(value)
    }

    fn overflow(&self, text: &str) -> ParseError {
        ParseError::IntegerOverflow {
            file: self.file.clone(),
            row: self.row,
            column: self.column,
            text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        Tokenizer::new("<memory>")
            .tokenize(input, &mut tokens)
            .unwrap();
        tokens
    }

    fn lex_err(input: &str) -> ParseError {
        let mut tokens = Vec::new();
        Tokenizer::new("<memory>")
            .tokenize(input, &mut tokens)
            .unwrap_err()
    }

    fn floats(tokens: &[Token]) -> Vec<f64> {
        tokens
            .iter()
            .map(|t| match t.value {
                TokenValue::Float(f) => f,
                _ => panic!("not a float: {t}"),
            })
            .collect()
    }

    fn ints(tokens: &[Token]) -> Vec<i64> {
        tokens
            .iter()
            .map(|t| match t.value {
                TokenValue::Int { value, .. } => value,
                _ => panic!("not an integer: {t}"),
            })
            .collect()
    }

    #[test]
    fn test_float_forms() {
        let tokens = lex(
            " 2.  .5  0.75  1.0E1 \
              +2. +.5 +0.75 +1.0E1 \
              -2. -.5 -0.75 -1.0E1 \
              2.E3 .5E6 0.75E9 1.0E1 \
              2.E+3 .5E+6 0.75E+9 1.0E+1 \
              2.E-3 .5E-6 0.75E-9 1.0E-1 \
              2E1 -2e1 +2e1 5e-1 ",
        );
        assert_eq!(tokens.len(), 28);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Float));
        let values = floats(&tokens);
        assert_eq!(&values[0..4], &[2.0, 0.5, 0.75, 10.0]);
        assert_eq!(&values[4..8], &[2.0, 0.5, 0.75, 10.0]);
        assert_eq!(&values[8..12], &[-2.0, -0.5, -0.75, -10.0]);
        assert_eq!(&values[12..16], &[2E3, 0.5E6, 0.75E9, 10.0]);
        assert_eq!(&values[16..20], &[2E3, 0.5E6, 0.75E9, 10.0]);
        assert_eq!(&values[20..24], &[2E-3, 0.5E-6, 0.75E-9, 0.1]);
        assert_eq!(&values[24..28], &[20.0, -20.0, 20.0, 0.5]);
    }

    #[test]
    fn test_float_has_priority_over_integer() {
        let tokens = lex("1.0");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].value, TokenValue::Float(1.0));
    }

    #[test]
    fn test_hex64() {
        let tokens = lex("0x13AL 0XbcdL 0xefLL 0X456789ABLL");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Hex64));
        assert_eq!(ints(&tokens), vec![0x13A, 0xBCD, 0xEF, 0x456789AB]);
    }

    #[test]
    fn test_hex() {
        let tokens = lex("0x13A 0Xbcd 0xef 0X456789AB");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Hex));
        assert_eq!(ints(&tokens), vec![0x13A, 0xBCD, 0xEF, 0x456789AB]);
    }

    #[test]
    fn test_integer64() {
        let tokens = lex("10L +30L -15000000000LL");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Integer64));
        assert_eq!(ints(&tokens), vec![10, 30, -15000000000]);
    }

    #[test]
    fn test_integer() {
        let tokens = lex("10 +30 -15000000000");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Integer));
        assert_eq!(ints(&tokens), vec![10, 30, -15000000000]);
    }

    #[test]
    fn test_boolean_any_case() {
        let tokens = lex("true TRUE TrUe false FALSE FaLsE");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Boolean));
        let values: Vec<bool> = tokens
            .iter()
            .map(|t| match t.value {
                TokenValue::Bool(b) => b,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![true, true, true, false, false, false]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""abc" "ab\"cd" "" "\x20\\\f\n\r\t""#);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Str));
        let values: Vec<&str> = tokens
            .iter()
            .map(|t| match &t.value {
                TokenValue::Str(s) => s.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec!["abc", "ab\"cd", "", " \\\u{0C}\n\r\t"]);
    }

    #[test]
    fn test_unknown_escapes_are_preserved() {
        let tokens = lex(r#""snow ☃ \x2 end""#);
        assert_eq!(
            tokens[0].value,
            TokenValue::Str(r"snow ☃ \x2 end".to_string())
        );
    }

    #[test]
    fn test_names() {
        let tokens = lex("ident IdenT I I32A version-long a_b*");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Name));
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["ident", "IdenT", "I", "I32A", "version-long", "a_b*"]);
    }

    #[test]
    fn test_punctuation() {
        let tokens = lex("}]){[(=:,;");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::RBrace,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::LBracket,
                TokenKind::LParen,
                TokenKind::Equals,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = lex("\n    0   1\n        2");
        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.row, t.column)).collect();
        assert_eq!(positions, vec![(2, 5), (2, 9), (3, 9)]);
    }

    #[test]
    fn test_positions_across_block_comment() {
        let tokens = lex("a /* two\nlines */ b");
        assert_eq!((tokens[0].row, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].row, tokens[1].column), (2, 10));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = lex("# line\n// other\n/* block */ 7");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Integer);
    }

    #[test]
    fn test_invalid_token() {
        let err = lex_err("\n\n        `xvz");
        match err {
            ParseError::BadToken {
                file,
                row,
                column,
                context,
            } => {
                assert_eq!(file, "<memory>");
                assert_eq!(row, 3);
                assert_eq!(column, 9);
                assert_eq!(context, "`xvz");
            }
            other => panic!("expected BadToken, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_overflow() {
        let err = lex_err("99999999999999999999999");
        assert!(matches!(err, ParseError::IntegerOverflow { .. }));
    }

    #[test]
    fn test_state_survives_chunked_input() {
        let mut tokenizer = Tokenizer::new("<memory>");
        let mut tokens = Vec::new();
        tokenizer.tokenize("a = 1;\n", &mut tokens).unwrap();
        tokenizer.tokenize("b = 2;", &mut tokens).unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.row, b.column), (2, 1));
    }
}
