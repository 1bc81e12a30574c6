//! JSON token model

use serde_json::Number;
use std::fmt;

/// A single lexical unit of a JSON document
///
/// Separators (`,` and `:`) are never surfaced; the decoder consumes and
/// validates them between tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// Object member name
    Name(String),
    /// String value
    String(String),
    /// Number value
    Number(Number),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
}

impl Token {
    /// Compare two tokens by value, treating member names and string values alike
    ///
    /// `Name("items")` matches `String("items")`: a search for a key is satisfied
    /// by any token carrying the same text at the right depth.
    pub fn matches(&self, other: &Token) -> bool {
        match (self.text(), other.text()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// Text of a name or string token
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Name(text) | Token::String(text) => Some(text),
            _ => None,
        }
    }

    /// True for `[` and `{`
    pub fn is_open(&self) -> bool {
        matches!(self, Token::BeginArray | Token::BeginObject)
    }

    /// True for `]` and `}`
    pub fn is_close(&self) -> bool {
        matches!(self, Token::EndArray | Token::EndObject)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::BeginArray => f.write_str("["),
            Token::EndArray => f.write_str("]"),
            Token::BeginObject => f.write_str("{"),
            Token::EndObject => f.write_str("}"),
            Token::Name(name) => write!(f, "{:?}", name),
            Token::String(value) => write!(f, "{:?}", value),
            Token::Number(number) => write!(f, "{}", number),
            Token::Bool(value) => write!(f, "{}", value),
            Token::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::String(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::String(value)
    }
}

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Token::Bool(value)
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Token::Number(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_strings_match_by_text() {
        let key = Token::from("items");
        assert!(key.matches(&Token::Name("items".to_string())));
        assert!(key.matches(&Token::String("items".to_string())));
        assert!(!key.matches(&Token::Name("other".to_string())));
        assert!(!key.matches(&Token::BeginArray));
    }

    #[test]
    fn non_text_tokens_match_by_value() {
        assert!(Token::Null.matches(&Token::Null));
        assert!(Token::from(3).matches(&Token::Number(3.into())));
        assert!(!Token::from(true).matches(&Token::Bool(false)));
        assert!(!Token::BeginArray.matches(&Token::BeginObject));
    }

    #[test]
    fn display_renders_json_like_text() {
        assert_eq!(Token::BeginObject.to_string(), "{");
        assert_eq!(Token::Name("id".to_string()).to_string(), "\"id\"");
        assert_eq!(Token::from(42).to_string(), "42");
        assert_eq!(Token::Null.to_string(), "null");
    }
}
