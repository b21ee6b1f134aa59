//! PDF Lexer
//!
//! Tokenizes PDF object syntax according to ISO 32000-1 Section 7.2. The lexer
//! works over the whole file held in memory so the reader can jump to any
//! cross-reference offset.

use super::{ParseError, ParseResult};

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal)
    String(Vec<u8>),

    /// Name object (e.g., /Type)
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Stream keyword
    Stream,

    /// Endstream keyword
    EndStream,

    /// Obj keyword
    Obj,

    /// Endobj keyword
    EndObj,

    /// StartXRef keyword
    StartXRef,

    /// Null object
    Null,

    /// Any other bare keyword (`R`, `xref`, `trailer`, ...)
    Keyword(String),

    /// Comment (usually ignored)
    Comment(Vec<u8>),

    /// End of input
    Eof,
}

pub(crate) fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

pub(crate) fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// PDF Lexer over an in-memory buffer
pub struct Lexer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a lexer positioned at `offset`
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            position: offset.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }

    fn peek_char(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn consume_char(&mut self) -> Option<u8> {
        let ch = self.peek_char()?;
        self.position += 1;
        Some(ch)
    }

    /// Skip whitespace and return the number of bytes skipped
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.position;
        while matches!(self.peek_char(), Some(ch) if is_whitespace(ch)) {
            self.position += 1;
        }
        self.position - start
    }

    /// Next token, skipping comments
    pub fn next_token(&mut self) -> ParseResult<Token> {
        loop {
            match self.next_raw_token()? {
                Token::Comment(_) => continue,
                token => return Ok(token),
            }
        }
    }

    /// Look at the next token without consuming it
    pub fn peek_token(&mut self) -> ParseResult<Token> {
        let saved = self.position;
        let token = self.next_token();
        self.position = saved;
        token
    }

    /// Next token including comments
    pub fn next_raw_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'%' => Ok(self.read_comment()),
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => self.read_angle_bracket(),
            b'>' => {
                self.consume_char();
                if self.peek_char() == Some(b'>') {
                    self.consume_char();
                    Ok(Token::DictEnd)
                } else {
                    Err(ParseError::syntax(self.position, "Expected '>' after '>'"))
                }
            }
            b'[' => {
                self.consume_char();
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.consume_char();
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'0'..=b'9' | b'.' => self.read_number(),
            _ if !is_delimiter(ch) => Ok(self.read_keyword()),
            _ => Err(ParseError::syntax(
                self.position,
                format!("Unexpected character: {}", ch as char),
            )),
        }
    }

    /// Read a comment (from % to end of line)
    fn read_comment(&mut self) -> Token {
        self.consume_char();
        let start = self.position;
        while !matches!(self.peek_char(), None | Some(b'\n') | Some(b'\r')) {
            self.position += 1;
        }
        Token::Comment(self.data[start..self.position].to_vec())
    }

    /// Read a name object (e.g., /Type)
    fn read_name(&mut self) -> ParseResult<Token> {
        self.consume_char();
        let mut name = String::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.consume_char();

            // Hex codes in names (e.g., /A#20B means /A B)
            if ch == b'#' {
                let digits = self.data.get(self.position..self.position + 2);
                let value = digits
                    .and_then(|d| std::str::from_utf8(d).ok())
                    .and_then(|d| u8::from_str_radix(d, 16).ok());
                match value {
                    Some(value) => {
                        self.position += 2;
                        name.push(value as char);
                    }
                    // A lone '#' is kept literally, as most readers do
                    None => name.push('#'),
                }
            } else {
                name.push(ch as char);
            }
        }

        Ok(Token::Name(name))
    }

    /// Read a literal string (parentheses)
    fn read_literal_string(&mut self) -> ParseResult<Token> {
        self.consume_char();
        let mut string = Vec::new();
        let mut paren_depth = 1;

        loop {
            let ch = self
                .consume_char()
                .ok_or_else(|| ParseError::syntax(self.position, "Unterminated string"))?;

            match ch {
                b'\\' => {
                    let escaped = self
                        .consume_char()
                        .ok_or_else(|| ParseError::syntax(self.position, "Unterminated string"))?;
                    match escaped {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(b'\x08'),
                        b'f' => string.push(b'\x0C'),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek_char() {
                                    Some(next @ b'0'..=b'7') => {
                                        self.consume_char();
                                        value = value * 8 + u32::from(next - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            string.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.peek_char() == Some(b'\n') {
                                self.consume_char();
                            }
                        }
                        b'\n' => {}
                        other => string.push(other),
                    }
                }
                b'(' => {
                    paren_depth += 1;
                    string.push(ch);
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        break;
                    }
                    string.push(ch);
                }
                _ => string.push(ch),
            }
        }

        Ok(Token::String(string))
    }

    /// Read angle bracket tokens (hex strings or dict markers)
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        self.consume_char();

        if self.peek_char() == Some(b'<') {
            self.consume_char();
            return Ok(Token::DictStart);
        }

        let mut nibbles = Vec::new();
        loop {
            let ch = self
                .consume_char()
                .ok_or_else(|| ParseError::syntax(self.position, "Unterminated hex string"))?;
            match ch {
                b'>' => break,
                _ if ch.is_ascii_hexdigit() => nibbles.push(hex_value(ch)),
                _ if is_whitespace(ch) => {}
                _ => {
                    return Err(ParseError::syntax(
                        self.position,
                        "Invalid character in hex string",
                    ))
                }
            }
        }

        // Odd digit count: the missing final digit is 0
        if nibbles.len() % 2 != 0 {
            nibbles.push(0);
        }

        Ok(Token::String(
            nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect(),
        ))
    }

    /// Read an integer or real number
    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let signed = matches!(self.peek_char(), Some(b'+') | Some(b'-'));
        if signed {
            self.consume_char();
        }

        let mut is_real = false;
        while let Some(ch) = self.peek_char() {
            match ch {
                b'0'..=b'9' => {}
                b'.' => is_real = true,
                // Some producers emit doubled signs, e.g. "--5"; ignore them
                b'-' | b'+' if signed && self.position == start + 1 => {}
                _ => break,
            }
            self.consume_char();
        }

        let text: String = self.data[start..self.position]
            .iter()
            .filter(|&&b| b != b'+')
            .map(|&b| b as char)
            .collect();
        let text = if text.starts_with("--") { &text[1..] } else { &text[..] };

        if text.is_empty() || text == "-" || text == "." || text == "-." {
            // A bare sign or dot reads as zero
            return Ok(Token::Integer(0));
        }

        if is_real {
            text.parse::<f64>()
                .map(Token::Real)
                .map_err(|_| ParseError::syntax(start, format!("Invalid number: {text}")))
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(Token::Integer(value)),
                // Out-of-range integers degrade to reals
                Err(_) => text
                    .parse::<f64>()
                    .map(Token::Real)
                    .map_err(|_| ParseError::syntax(start, format!("Invalid number: {text}"))),
            }
        }
    }

    /// Read a bare keyword (`obj`, `true`, `R`, ...)
    fn read_keyword(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }

        let word = String::from_utf8_lossy(&self.data[start..self.position]);
        match word.as_ref() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "obj" => Token::Obj,
            "endobj" => Token::EndObj,
            "stream" => Token::Stream,
            "endstream" => Token::EndStream,
            "startxref" => Token::StartXRef,
            other => Token::Keyword(other.to_string()),
        }
    }

    /// Consume the end-of-line marker that must follow `stream`
    pub fn read_stream_eol(&mut self) {
        match self.peek_char() {
            Some(b'\r') => {
                self.consume_char();
                if self.peek_char() == Some(b'\n') {
                    self.consume_char();
                }
            }
            Some(b'\n') => {
                self.consume_char();
            }
            _ => {}
        }
    }

    /// Read exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| ParseError::syntax(self.position, "Unexpected end of data"))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Consume the next token and require it to be `keyword`
    pub fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        let token = self.next_token()?;
        let matches = match (&token, keyword) {
            (Token::Obj, "obj")
            | (Token::EndObj, "endobj")
            | (Token::Stream, "stream")
            | (Token::EndStream, "endstream")
            | (Token::StartXRef, "startxref") => true,
            (Token::Keyword(word), _) => word == keyword,
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: keyword.to_string(),
                found: format!("{token:?}"),
            })
        }
    }
}

fn hex_value(ch: u8) -> u8 {
    match ch {
        b'0'..=b'9' => ch - b'0',
        b'a'..=b'f' => ch - b'a' + 10,
        b'A'..=b'F' => ch - b'A' + 10,
        _ => 0,
    }
}

/// First occurrence of `needle` in `haystack`
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Last occurrence of `needle` in `haystack`
pub(crate) fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
