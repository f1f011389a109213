//! Lazy JSON array streaming
//!
//! Reads a top-level JSON array one element at a time. Only the bytes of
//! the current element are buffered; each element is decoded on its own
//! with simd-json, so one malformed element surfaces as an
//! [`Element::Invalid`] marker instead of failing the whole document.

use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Why a stream could not be opened
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("the document is empty")]
    Empty,

    #[error("expected a JSON array, found {0:?}")]
    NotAnArray(char),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An element whose bytes could not be decoded into an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Zero-based array index of the element
    pub index: usize,
    /// Byte offset where the element (or the offending token) starts
    pub offset: u64,
    pub message: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "element {} at byte {}: {}",
            self.index, self.offset, self.message
        )
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Object(Map<String, Value>),
    Invalid(DecodeError),
}

/// One array element, keyed by its index
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    pub key: usize,
    pub element: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    First,
    Next,
    Done,
}

/// Streams the elements of a top-level JSON array
pub struct JsonArrayStream<R> {
    reader: R,
    position: u64,
    index: usize,
    state: State,
    buffer: Vec<u8>,
}

impl JsonArrayStream<BufReader<File>> {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> JsonArrayStream<R> {
    /// Open a stream, consuming everything up to and including the `[`.
    pub fn new(reader: R) -> Result<Self, OpenError> {
        let mut stream = JsonArrayStream {
            reader,
            position: 0,
            index: 0,
            state: State::First,
            buffer: Vec::new(),
        };

        stream.skip_bom()?;
        match stream.skip_whitespace()? {
            None => Err(OpenError::Empty),
            Some(b'[') => {
                stream.bump();
                Ok(stream)
            }
            Some(b) => Err(OpenError::NotAnArray(b as char)),
        }
    }

    /// Bytes consumed from the source so far
    pub fn offset(&self) -> u64 {
        self.position
    }

    fn next_item(&mut self) -> io::Result<Option<StreamItem>> {
        match self.state {
            State::Done => return Ok(None),
            State::First => match self.skip_whitespace()? {
                Some(b']') => return Ok(self.close()),
                None => return Ok(Some(self.fail("unexpected end of input, expected a value or `]`"))),
                Some(_) => {}
            },
            State::Next => {
                match self.skip_whitespace()? {
                    Some(b',') => self.bump(),
                    Some(b']') => return Ok(self.close()),
                    Some(b) => {
                        let message = format!("expected `,` or `]`, found {:?}", b as char);
                        return Ok(Some(self.fail(message)));
                    }
                    None => return Ok(Some(self.fail("unexpected end of input, expected `,` or `]`"))),
                }
                match self.skip_whitespace()? {
                    Some(b']') => return Ok(Some(self.fail("trailing comma before `]`"))),
                    None => return Ok(Some(self.fail("unexpected end of input after `,`"))),
                    Some(_) => {}
                }
            }
        }

        let offset = self.position;
        if let Err(message) = self.read_element()? {
            return Ok(Some(self.fail_at(offset, message)));
        }

        self.state = State::Next;
        let key = self.index;
        self.index += 1;

        let element = match decode_object(&mut self.buffer) {
            Ok(object) => Element::Object(object),
            Err(message) => Element::Invalid(DecodeError {
                index: key,
                offset,
                message,
            }),
        };

        Ok(Some(StreamItem { key, element }))
    }

    /// Buffer the raw bytes of the next element.
    ///
    /// The inner `Err` is a structural problem: the element has no end.
    fn read_element(&mut self) -> io::Result<Result<(), String>> {
        self.buffer.clear();

        let first = match self.peek()? {
            Some(b) => b,
            None => return Ok(Err("unexpected end of input".to_string())),
        };

        match first {
            b'{' | b'[' => self.read_container(),
            b'"' => {
                self.take()?;
                self.read_string_tail()
            }
            _ => self.read_scalar(),
        }
    }

    fn read_container(&mut self) -> io::Result<Result<(), String>> {
        let mut depth = 0usize;
        loop {
            let b = match self.take()? {
                Some(b) => b,
                None => return Ok(Err("unexpected end of input inside element".to_string())),
            };
            match b {
                b'"' => {
                    if let Err(message) = self.read_string_tail()? {
                        return Ok(Err(message));
                    }
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Ok(()));
                    }
                }
                _ => {}
            }
        }
    }

    /// Read up to and including the closing quote of a string whose
    /// opening quote is already buffered.
    fn read_string_tail(&mut self) -> io::Result<Result<(), String>> {
        let mut escaped = false;
        loop {
            let b = match self.take()? {
                Some(b) => b,
                None => return Ok(Err("unexpected end of input inside string".to_string())),
            };
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                return Ok(Ok(()));
            }
        }
    }

    fn read_scalar(&mut self) -> io::Result<Result<(), String>> {
        while let Some(b) = self.peek()? {
            if is_whitespace(b) || matches!(b, b',' | b']' | b'}' | b'[' | b'{' | b'"') {
                break;
            }
            self.take()?;
        }
        if self.buffer.is_empty() {
            let found = self.peek()?.map(|b| b as char);
            return Ok(Err(format!("unexpected character {:?}", found.unwrap_or(' '))));
        }
        Ok(Ok(()))
    }

    fn close(&mut self) -> Option<StreamItem> {
        self.bump();
        self.state = State::Done;
        None
    }

    fn fail(&mut self, message: impl Into<String>) -> StreamItem {
        let offset = self.position;
        self.fail_at(offset, message)
    }

    /// Emit a marker and end the stream; the structure can't be resumed.
    fn fail_at(&mut self, offset: u64, message: impl Into<String>) -> StreamItem {
        self.state = State::Done;
        let key = self.index;
        self.index += 1;
        StreamItem {
            key,
            element: Element::Invalid(DecodeError {
                index: key,
                offset,
                message: message.into(),
            }),
        }
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.position += 1;
    }

    /// Consume one byte into the element buffer
    fn take(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if let Some(b) = b {
            self.bump();
            self.buffer.push(b);
        }
        Ok(b)
    }

    fn skip_whitespace(&mut self) -> io::Result<Option<u8>> {
        while let Some(b) = self.peek()? {
            if !is_whitespace(b) {
                return Ok(Some(b));
            }
            self.bump();
        }
        Ok(None)
    }

    fn skip_bom(&mut self) -> io::Result<()> {
        let has_bom = self.reader.fill_buf()?.starts_with(&[0xEF, 0xBB, 0xBF]);
        if has_bom {
            self.reader.consume(3);
            self.position += 3;
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for JsonArrayStream<R> {
    type Item = io::Result<StreamItem>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_item() {
            Ok(item) => item.map(Ok),
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn decode_object(bytes: &mut [u8]) -> Result<Map<String, Value>, String> {
    match simd_json::serde::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        // `null` counts as an empty element
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(format!("expected an object, found {}", type_name(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
