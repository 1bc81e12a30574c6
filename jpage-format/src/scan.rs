//! Locating the target array inside a JSON envelope
//!
//! Both operations work on the token stream directly: a single linear pass,
//! no backtracking and no document tree.

use crate::decoder::TokenDecoder;
use crate::error::{PageError, Result};
use crate::token::Token;
use std::io::Read;

/// Where the array of interest lives in each page
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Structural depth at which `token` must appear; 0 means the document root
    pub depth: usize,
    /// Token announcing the array, usually a member name
    pub token: Token,
}

impl Target {
    /// The array is the document itself
    pub fn root() -> Self {
        Self {
            depth: 0,
            token: Token::BeginArray,
        }
    }

    /// The array follows `token` at `depth`
    pub fn key(token: impl Into<Token>, depth: usize) -> Self {
        Self {
            depth,
            token: token.into(),
        }
    }

    /// True when no search is needed
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::root()
    }
}

/// Advance `decoder` to just past `target.token` at `target.depth`
///
/// Returns `Ok(false)` when the input ends without a match. Depth 0 succeeds
/// without reading anything. Closing delimiters are drained even after
/// `more()` turns false so the depth counter stays exact.
pub fn locate<R: Read>(decoder: &mut TokenDecoder<R>, target: &Target) -> Result<bool> {
    if target.is_root() {
        return Ok(true);
    }

    let mut level = 0usize;
    while decoder.more()? || level != 0 {
        let Some(token) = decoder.next_token()? else {
            break;
        };
        if level == target.depth && token.matches(&target.token) {
            return Ok(true);
        }
        if token.is_open() {
            level += 1;
        } else if token.is_close() {
            level = level.saturating_sub(1);
        }
    }

    Ok(false)
}

/// Consume one token and require it to open an array
pub fn expect_array_start<R: Read>(decoder: &mut TokenDecoder<R>) -> Result<()> {
    match decoder.next_token()? {
        Some(Token::BeginArray) => Ok(()),
        Some(other) => Err(PageError::Structural {
            offset: decoder.input_offset(),
            found: other.to_string(),
        }),
        None => Err(PageError::Structural {
            offset: decoder.input_offset(),
            found: "end of input".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seek(body: &str, target: Target) -> Result<bool> {
        let mut decoder = TokenDecoder::new(body.as_bytes());
        locate(&mut decoder, &target)
    }

    fn ensure(body: &str) -> Result<()> {
        let mut decoder = TokenDecoder::new(body.as_bytes());
        expect_array_start(&mut decoder)
    }

    #[test]
    fn root_target_matches_without_reading() {
        let mut decoder = TokenDecoder::new("[]".as_bytes());
        assert!(locate(&mut decoder, &Target::root()).unwrap());
        assert_eq!(decoder.input_offset(), 0);
    }

    #[test]
    fn empty_body_is_not_found() {
        assert!(!seek("", Target::key("items", 1)).unwrap());
    }

    #[test]
    fn empty_object_is_not_found() {
        assert!(!seek("{}", Target::key("items", 1)).unwrap());
    }

    #[test]
    fn bad_json_object_fails() {
        assert!(seek("{[", Target::key("items", 1)).is_err());
        assert!(seek("{=", Target::key("items", 1)).is_err());
    }

    #[test]
    fn finds_key_at_depth_one() {
        assert!(seek(r#"{"items":[]}"#, Target::key("items", 1)).unwrap());
        assert!(seek(r#"{"error": null, "items":[]}"#, Target::key("items", 1)).unwrap());
    }

    #[test]
    fn finds_key_at_depth_two() {
        let body = r#"{
            "error": null,
            "result": {
                "date": "2021-11-28",
                "items": []
            }
        }"#;
        assert!(seek(body, Target::key("items", 2)).unwrap());
    }

    #[test]
    fn key_at_other_depth_is_not_found() {
        let body = r#"{"result": {"items": [1]}, "count": 1}"#;
        assert!(!seek(body, Target::key("items", 1)).unwrap());
        assert!(!seek(body, Target::key("items", 3)).unwrap());
    }

    #[test]
    fn string_value_at_depth_also_matches() {
        let body = r#"{"label": "items", "items": [1]}"#;
        let mut decoder = TokenDecoder::new(body.as_bytes());
        assert!(locate(&mut decoder, &Target::key("items", 1)).unwrap());
        // positioned after the string value, not the member
        assert_eq!(decoder.next_token().unwrap(), Some(Token::Name("items".into())));
    }

    #[test]
    fn leaves_decoder_before_value() {
        let mut decoder = TokenDecoder::new(r#"{"meta": {"n": 2}, "items": [7, 8]}"#.as_bytes());
        assert!(locate(&mut decoder, &Target::key("items", 1)).unwrap());
        expect_array_start(&mut decoder).unwrap();
        assert_eq!(decoder.decode::<u8>().unwrap(), 7);
        assert_eq!(decoder.decode::<u8>().unwrap(), 8);
        assert!(!decoder.more().unwrap());
    }

    #[test]
    fn expect_array_start_cases() {
        assert!(matches!(ensure("="), Err(PageError::Syntax { .. })));
        assert!(matches!(ensure("{"), Err(PageError::Structural { .. })));
        assert!(matches!(ensure(""), Err(PageError::Structural { .. })));
        assert!(ensure("[").is_ok());
    }

    #[test]
    fn object_in_place_of_array_reports_offset() {
        let mut decoder = TokenDecoder::new(r#"{"items":{}}"#.as_bytes());
        assert!(locate(&mut decoder, &Target::key("items", 1)).unwrap());
        match expect_array_start(&mut decoder) {
            Err(PageError::Structural { offset, found }) => {
                assert_eq!(offset, 10);
                assert_eq!(found, "{");
            }
            other => panic!("expected Structural, got {:?}", other),
        }
    }
}
