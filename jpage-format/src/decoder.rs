//! Incremental JSON token decoder
//!
//! The decoder reads a byte stream exactly once, front to back. It surfaces
//! structural and scalar tokens one at a time and can decode a single complete
//! value into any `Deserialize` type, buffering only that value's bytes.

use crate::error::{PageError, Result};
use crate::limits::Limits;
use crate::token::Token;
use serde::de::DeserializeOwned;
use serde_json::Number;
use std::io::{self, BufRead, BufReader, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Array,
    Object,
}

/// What the decoder accepts next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Top-level value or clean end of input
    TopValue,
    /// Right after `[`: element or `]`
    ArrayStart,
    /// After `,` in an array: element
    ArrayValue,
    /// After an element: `,` or `]`
    ArrayComma,
    /// Right after `{`: member name or `}`
    ObjectStart,
    /// After `,` in an object: member name
    ObjectKey,
    /// After a member name: `:`
    ObjectColon,
    /// After `:`: member value
    ObjectValue,
    /// After a member value: `,` or `}`
    ObjectComma,
}

/// First failure that left the input at an unknown position
#[derive(Debug, Clone)]
struct Halt {
    offset: u64,
    cause: String,
}

/// Pull-style JSON token reader over any `Read`
///
/// An error that stops partway through the input halts the decoder: every
/// later call fails with [`PageError::Halted`]. Only a [`PageError::Decode`]
/// failure on a completely read value leaves it usable.
pub struct TokenDecoder<R> {
    reader: BufReader<R>,
    offset: u64,
    scopes: Vec<Scope>,
    state: State,
    limits: Limits,
    halted: Option<Halt>,
}

impl<R: Read> TokenDecoder<R> {
    /// Create a decoder with default limits
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    /// Create a decoder enforcing the supplied limits
    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self {
            reader: BufReader::new(reader),
            offset: 0,
            scopes: Vec::new(),
            state: State::TopValue,
            limits,
            halted: None,
        }
    }

    /// Number of bytes consumed from the input so far
    pub fn input_offset(&self) -> u64 {
        self.offset
    }

    /// True once an earlier error made the input position unreliable
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Give back the underlying reader, discarding buffered input
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Report whether another element follows in the current array or object
    ///
    /// At top level this reports whether any further input is available.
    pub fn more(&mut self) -> Result<bool> {
        self.check_halted()?;
        let next = self.peek_non_ws();
        let next = self.record(next)?;
        Ok(matches!(next, Some(byte) if byte != b']' && byte != b'}'))
    }

    /// Read the next token
    ///
    /// Returns `None` at a clean end of input between top-level values.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.check_halted()?;
        let token = self.read_token();
        self.record(token)
    }

    /// Decode the next complete value into `T`
    ///
    /// A pending `,` or `:` separator is consumed first. Only the bytes of this
    /// one value are buffered. A value that does not fit `T` is still consumed,
    /// so decoding can continue with the next one.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.check_halted()?;
        let raw = self.capture_next();
        let raw = self.record(raw)?;
        self.finish_value();
        serde_json::from_slice(&raw).map_err(PageError::Decode)
    }

    fn check_halted(&self) -> Result<()> {
        match &self.halted {
            Some(halt) => Err(PageError::Halted {
                offset: halt.offset,
                cause: halt.cause.clone(),
            }),
            None => Ok(()),
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.halted = Some(Halt {
                offset: self.offset,
                cause: err.to_string(),
            });
        }
        result
    }

    fn read_token(&mut self) -> Result<Option<Token>> {
        loop {
            let Some(byte) = self.peek_non_ws()? else {
                return if self.state == State::TopValue {
                    Ok(None)
                } else {
                    Err(self.eof())
                };
            };

            match byte {
                b'[' => {
                    self.expect_value_position(byte)?;
                    self.push(Scope::Array)?;
                    self.bump();
                    self.state = State::ArrayStart;
                    return Ok(Some(Token::BeginArray));
                }
                b'{' => {
                    self.expect_value_position(byte)?;
                    self.push(Scope::Object)?;
                    self.bump();
                    self.state = State::ObjectStart;
                    return Ok(Some(Token::BeginObject));
                }
                b']' => {
                    if !matches!(self.state, State::ArrayStart | State::ArrayComma) {
                        return Err(self.unexpected(byte));
                    }
                    self.bump();
                    self.pop();
                    return Ok(Some(Token::EndArray));
                }
                b'}' => {
                    if !matches!(self.state, State::ObjectStart | State::ObjectComma) {
                        return Err(self.unexpected(byte));
                    }
                    self.bump();
                    self.pop();
                    return Ok(Some(Token::EndObject));
                }
                b',' => match self.state {
                    State::ArrayComma => {
                        self.bump();
                        self.state = State::ArrayValue;
                    }
                    State::ObjectComma => {
                        self.bump();
                        self.state = State::ObjectKey;
                    }
                    _ => return Err(self.unexpected(byte)),
                },
                b':' => {
                    if self.state != State::ObjectColon {
                        return Err(self.unexpected(byte));
                    }
                    self.bump();
                    self.state = State::ObjectValue;
                }
                b'"' if matches!(self.state, State::ObjectStart | State::ObjectKey) => {
                    let name = self.read_string()?;
                    self.state = State::ObjectColon;
                    return Ok(Some(Token::Name(name)));
                }
                _ => {
                    self.expect_value_position(byte)?;
                    let token = self.read_scalar(byte)?;
                    self.finish_value();
                    return Ok(Some(token));
                }
            }
        }
    }

    fn capture_next(&mut self) -> Result<Vec<u8>> {
        let first = self.prepare_for_value()?;
        self.capture_value(first)
    }

    fn prepare_for_value(&mut self) -> Result<u8> {
        let byte = self.peek_non_ws()?.ok_or_else(|| self.eof())?;
        match (self.state, byte) {
            (State::ArrayComma, b',') => {
                self.bump();
                self.state = State::ArrayValue;
            }
            (State::ObjectColon, b':') => {
                self.bump();
                self.state = State::ObjectValue;
            }
            _ => {}
        }

        let byte = self.peek_non_ws()?.ok_or_else(|| self.eof())?;
        self.expect_value_position(byte)?;
        if byte == b']' || byte == b'}' {
            return Err(self.syntax(format!(
                "invalid character {} looking for beginning of value",
                describe(byte)
            )));
        }
        Ok(byte)
    }

    fn capture_value(&mut self, first: u8) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        match first {
            b'{' | b'[' => {
                let mut depth = 0usize;
                loop {
                    let byte = self.peek_byte()?.ok_or_else(|| self.eof())?;
                    match byte {
                        b'"' => {
                            self.capture_string(&mut raw)?;
                            continue;
                        }
                        b'{' | b'[' => {
                            depth += 1;
                            if self.scopes.len() + depth > self.limits.max_nesting_depth {
                                return Err(self.nesting_exceeded());
                            }
                        }
                        b'}' | b']' => depth -= 1,
                        _ => {}
                    }
                    self.push_raw(&mut raw, byte)?;
                    if depth == 0 {
                        break;
                    }
                }
            }
            b'"' => self.capture_string(&mut raw)?,
            _ => self.capture_literal(&mut raw)?,
        }
        Ok(raw)
    }

    fn capture_string(&mut self, raw: &mut Vec<u8>) -> Result<()> {
        // opening quote
        self.push_raw(raw, b'"')?;
        loop {
            let byte = self.peek_byte()?.ok_or_else(|| self.eof())?;
            self.push_raw(raw, byte)?;
            match byte {
                b'"' => return Ok(()),
                b'\\' => {
                    let escaped = self.peek_byte()?.ok_or_else(|| self.eof())?;
                    self.push_raw(raw, escaped)?;
                }
                _ => {}
            }
        }
    }

    fn capture_literal(&mut self, raw: &mut Vec<u8>) -> Result<()> {
        while let Some(byte) = self.peek_byte()? {
            if is_delimiter(byte) {
                break;
            }
            self.push_raw(raw, byte)?;
        }
        Ok(())
    }

    fn read_string(&mut self) -> Result<String> {
        let start = self.offset;
        let mut raw = Vec::new();
        self.capture_string(&mut raw)?;
        serde_json::from_slice(&raw).map_err(|err| PageError::Syntax {
            offset: start,
            message: format!("invalid string literal: {}", err),
        })
    }

    fn read_scalar(&mut self, first: u8) -> Result<Token> {
        match first {
            b'"' => Ok(Token::String(self.read_string()?)),
            b't' | b'f' | b'n' => {
                let start = self.offset;
                let mut raw = Vec::new();
                self.capture_literal(&mut raw)?;
                match raw.as_slice() {
                    b"true" => Ok(Token::Bool(true)),
                    b"false" => Ok(Token::Bool(false)),
                    b"null" => Ok(Token::Null),
                    other => Err(PageError::Syntax {
                        offset: start,
                        message: format!(
                            "invalid literal '{}'",
                            String::from_utf8_lossy(other)
                        ),
                    }),
                }
            }
            b'-' | b'0'..=b'9' => {
                let start = self.offset;
                let mut raw = Vec::new();
                self.capture_literal(&mut raw)?;
                let number: Number =
                    serde_json::from_slice(&raw).map_err(|err| PageError::Syntax {
                        offset: start,
                        message: format!(
                            "invalid number literal '{}': {}",
                            String::from_utf8_lossy(&raw),
                            err
                        ),
                    })?;
                Ok(Token::Number(number))
            }
            other => Err(self.syntax(format!(
                "invalid character {} looking for beginning of value",
                describe(other)
            ))),
        }
    }

    fn expect_value_position(&self, byte: u8) -> Result<()> {
        let expected = match self.state {
            State::TopValue | State::ArrayStart | State::ArrayValue | State::ObjectValue => {
                return Ok(())
            }
            State::ArrayComma => "after array element",
            State::ObjectStart | State::ObjectKey => "looking for beginning of object key string",
            State::ObjectColon => "after object key",
            State::ObjectComma => "after object key:value pair",
        };
        Err(self.syntax(format!("invalid character {} {}", describe(byte), expected)))
    }

    fn push(&mut self, scope: Scope) -> Result<()> {
        if self.scopes.len() >= self.limits.max_nesting_depth {
            return Err(self.nesting_exceeded());
        }
        self.scopes.push(scope);
        Ok(())
    }

    fn pop(&mut self) {
        self.scopes.pop();
        self.finish_value();
    }

    fn finish_value(&mut self) {
        self.state = match self.scopes.last() {
            None => State::TopValue,
            Some(Scope::Array) => State::ArrayComma,
            Some(Scope::Object) => State::ObjectComma,
        };
    }

    fn push_raw(&mut self, raw: &mut Vec<u8>, byte: u8) -> Result<()> {
        if raw.len() >= self.limits.max_element_bytes {
            return Err(PageError::LimitExceeded(format!(
                "value at offset {} exceeds max_element_bytes {}",
                self.offset, self.limits.max_element_bytes
            )));
        }
        raw.push(byte);
        self.bump();
        Ok(())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(PageError::Io(err)),
            }
        }
    }

    fn peek_non_ws(&mut self) -> Result<Option<u8>> {
        while let Some(byte) = self.peek_byte()? {
            if !is_whitespace(byte) {
                return Ok(Some(byte));
            }
            self.bump();
        }
        Ok(None)
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.offset += 1;
    }

    fn eof(&self) -> PageError {
        PageError::UnexpectedEof {
            offset: self.offset,
        }
    }

    fn unexpected(&self, byte: u8) -> PageError {
        match self.expect_value_position(byte) {
            Err(err) => err,
            Ok(()) => self.syntax(format!(
                "invalid character {} looking for beginning of value",
                describe(byte)
            )),
        }
    }

    fn syntax(&self, message: String) -> PageError {
        PageError::Syntax {
            offset: self.offset,
            message,
        }
    }

    fn nesting_exceeded(&self) -> PageError {
        PageError::LimitExceeded(format!(
            "nesting depth at offset {} exceeds max_nesting_depth {}",
            self.offset, self.limits.max_nesting_depth
        ))
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || matches!(byte, b',' | b':' | b']' | b'}')
}

fn describe(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("0x{:02x}", byte)
    }
}
