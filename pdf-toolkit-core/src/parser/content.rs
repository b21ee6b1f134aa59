//! PDF Content Stream Parser
//!
//! Parses the page content-stream mini-language into [`ContentOperation`]s.
//! Only the operators needed to position text and ruling lines are kept;
//! any other operator is skipped together with its operands. Inline images
//! (`BI … ID … EI`) are skipped as a unit.

use super::{ParseError, ParseResult};

/// Represents a single operator in a PDF content stream
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    // Text object operators
    BeginText, // BT
    EndText,   // ET

    // Text state operators
    SetCharSpacing(f32),       // Tc
    SetWordSpacing(f32),       // Tw
    SetHorizontalScaling(f32), // Tz
    SetLeading(f32),           // TL
    SetFont(String, f32),      // Tf
    SetTextRise(f32),          // Ts

    // Text positioning operators
    MoveText(f32, f32),                          // Td
    MoveTextSetLeading(f32, f32),                // TD
    SetTextMatrix(f32, f32, f32, f32, f32, f32), // Tm
    NextLine,                                    // T*

    // Text showing operators
    ShowText(Vec<u8>),                             // Tj
    ShowTextArray(Vec<TextElement>),               // TJ
    NextLineShowText(Vec<u8>),                     // '
    SetSpacingNextLineShowText(f32, f32, Vec<u8>), // "

    // Graphics state operators
    SaveGraphicsState,                                // q
    RestoreGraphicsState,                             // Q
    SetTransformMatrix(f32, f32, f32, f32, f32, f32), // cm

    // Path construction operators
    MoveTo(f32, f32),                      // m
    LineTo(f32, f32),                      // l
    CurveTo(f32, f32, f32, f32, f32, f32), // c
    CurveToV(f32, f32, f32, f32),          // v
    CurveToY(f32, f32, f32, f32),          // y
    ClosePath,                             // h
    Rectangle(f32, f32, f32, f32),         // re

    // Path painting operators
    Stroke,                 // S
    CloseStroke,            // s
    Fill,                   // f or F
    FillEvenOdd,            // f*
    FillStroke,             // B
    FillStrokeEvenOdd,      // B*
    CloseFillStroke,        // b
    CloseFillStrokeEvenOdd, // b*
    EndPath,                // n

    // XObject operators
    PaintXObject(String), // Do
}

/// Represents a text element in a TJ array
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    Text(Vec<u8>),
    Spacing(f32),
}

/// Token types in content streams
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Number(f32),
    Integer(i32),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Operator(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

fn is_content_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'\0' | b'(' | b')' | b'<' | b'>' | b'['
            | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_content_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'\0')
}

/// Content stream tokenizer
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> ContentTokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Get the next token from the stream
    pub(super) fn next_token(&mut self) -> ParseResult<Option<Token>> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(None);
        }

        let ch = self.input[self.position];

        match ch {
            // Numbers
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),

            // Strings
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.peek_next() == Some(b'<') {
                    self.position += 2;
                    Ok(Some(Token::DictStart))
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'>') {
                    self.position += 2;
                    Ok(Some(Token::DictEnd))
                } else {
                    Err(ParseError::syntax(self.position, "Unexpected '>'"))
                }
            }

            // Arrays
            b'[' => {
                self.position += 1;
                Ok(Some(Token::ArrayStart))
            }
            b']' => {
                self.position += 1;
                Ok(Some(Token::ArrayEnd))
            }

            // Names
            b'/' => self.read_name(),

            // Stray closing delimiters carry no meaning here
            b')' | b'{' | b'}' => {
                self.position += 1;
                self.next_token()
            }

            // Operators or other tokens
            _ => self.read_operator(),
        }
    }

    /// Skip inline image data after an `ID` operator, up to and including the
    /// `EI` that is surrounded by whitespace.
    pub(super) fn skip_inline_image_data(&mut self) {
        // One whitespace byte separates ID from the data
        self.position = (self.position + 1).min(self.input.len());

        while self.position + 1 < self.input.len() {
            let at_ei = &self.input[self.position..self.position + 2] == b"EI";
            let before_ok = self.position == 0 || is_content_whitespace(self.input[self.position - 1]);
            let after_ok = self
                .input
                .get(self.position + 2)
                .map_or(true, |&b| is_content_delimiter(b));

            if at_ei && before_ok && after_ok {
                self.position += 2;
                return;
            }
            self.position += 1;
        }

        self.position = self.input.len();
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() {
            match self.input[self.position] {
                ch if is_content_whitespace(ch) => self.position += 1,
                b'%' => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while self.position < self.input.len()
            && self.input[self.position] != b'\n'
            && self.input[self.position] != b'\r'
        {
            self.position += 1;
        }
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn read_number(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;
        let mut has_dot = false;

        // Handle optional sign
        if matches!(self.input[self.position], b'+' | b'-') {
            self.position += 1;
        }

        // Read digits and optional decimal point
        while self.position < self.input.len() {
            match self.input[self.position] {
                b'0'..=b'9' => self.position += 1,
                b'.' if !has_dot => {
                    has_dot = true;
                    self.position += 1;
                }
                _ => break,
            }
        }

        let num_str = std::str::from_utf8(&self.input[start..self.position])
            .map_err(|_| ParseError::syntax(start, "Invalid number format"))?;

        // A lone sign or dot reads as zero, as most viewers do
        if matches!(num_str, "+" | "-" | "." | "+." | "-.") {
            return Ok(Some(Token::Integer(0)));
        }

        if has_dot {
            let value = num_str
                .parse::<f32>()
                .map_err(|_| ParseError::syntax(start, "Invalid float number"))?;
            Ok(Some(Token::Number(value)))
        } else {
            match num_str.parse::<i32>() {
                Ok(value) => Ok(Some(Token::Integer(value))),
                // Out of i32 range
                Err(_) => num_str
                    .parse::<f32>()
                    .map(|value| Some(Token::Number(value)))
                    .map_err(|_| ParseError::syntax(start, "Invalid integer number")),
            }
        }
    }

    fn read_literal_string(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip opening '('
        let mut result = Vec::new();
        let mut paren_depth = 1;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;

            match ch {
                b'\\' => {
                    let Some(&escaped) = self.input.get(self.position) else {
                        break;
                    };
                    self.position += 1;
                    match escaped {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(b'\x08'),
                        b'f' => result.push(b'\x0C'),
                        b'0'..=b'7' => {
                            self.position -= 1;
                            result.push(self.read_octal_escape());
                        }
                        // Line continuation
                        b'\r' => {
                            if self.input.get(self.position) == Some(&b'\n') {
                                self.position += 1;
                            }
                        }
                        b'\n' => {}
                        other => result.push(other),
                    }
                }
                b'(' => {
                    paren_depth += 1;
                    result.push(ch);
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        return Ok(Some(Token::String(result)));
                    }
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        Err(ParseError::syntax(self.position, "Unterminated string"))
    }

    fn read_octal_escape(&mut self) -> u8 {
        let mut value = 0u8;
        let mut count = 0;

        while count < 3 && self.position < self.input.len() {
            match self.input[self.position] {
                digit @ b'0'..=b'7' => {
                    value = value.wrapping_mul(8).wrapping_add(digit - b'0');
                    self.position += 1;
                    count += 1;
                }
                _ => break,
            }
        }

        value
    }

    fn read_hex_string(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip opening '<'
        let mut result = Vec::new();
        let mut nibble = None;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;

            let digit = match ch {
                b'>' => {
                    // Odd number of hex digits: the last one is followed by 0
                    if let Some(n) = nibble {
                        result.push(n << 4);
                    }
                    return Ok(Some(Token::HexString(result)));
                }
                b'0'..=b'9' => ch - b'0',
                b'A'..=b'F' => ch - b'A' + 10,
                b'a'..=b'f' => ch - b'a' + 10,
                ch if is_content_whitespace(ch) => continue,
                _ => {
                    return Err(ParseError::syntax(
                        self.position - 1,
                        format!("Invalid character in hex string: {:?}", ch as char),
                    ));
                }
            };

            match nibble.take() {
                Some(high) => result.push((high << 4) | digit),
                None => nibble = Some(digit),
            }
        }

        Err(ParseError::syntax(self.position, "Unterminated hex string"))
    }

    fn read_name(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip '/'
        let start = self.position;

        while self.position < self.input.len() && !is_content_delimiter(self.input[self.position]) {
            self.position += 1;
        }

        let name = decode_name(&self.input[start..self.position]);
        Ok(Some(Token::Name(name)))
    }

    fn read_operator(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;

        while self.position < self.input.len() && !is_content_delimiter(self.input[self.position]) {
            self.position += 1;
        }

        let op = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        Ok(Some(Token::Operator(op)))
    }
}

/// Resolve `#xx` escapes in a name
fn decode_name(bytes: &[u8]) -> String {
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'#' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok());
            if let Some(value) = hex {
                result.push(value);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Content stream parser
pub struct ContentParser;

impl ContentParser {
    /// Parse a content stream into a vector of operators
    pub fn parse(content: &[u8]) -> ParseResult<Vec<ContentOperation>> {
        let mut tokenizer = ContentTokenizer::new(content);
        let mut operations = Vec::new();
        let mut operands: Vec<Token> = Vec::new();
        let mut skipped = 0usize;

        while let Some(token) = tokenizer.next_token()? {
            let Token::Operator(op) = token else {
                operands.push(token);
                continue;
            };

            match op.as_str() {
                "BI" => {
                    operands.clear();
                    // Dictionary entries up to ID
                    while let Some(token) = tokenizer.next_token()? {
                        if token == Token::Operator("ID".to_string()) {
                            tokenizer.skip_inline_image_data();
                            break;
                        }
                    }
                    continue;
                }
                _ => match parse_operator(&op, &mut operands) {
                    Some(operation) => operations.push(operation),
                    None => skipped += 1,
                },
            }
            operands.clear();
        }

        if skipped > 0 {
            tracing::trace!("Skipped {} content stream operators", skipped);
        }

        Ok(operations)
    }
}

/// Map one operator and its operands. `None` for unsupported operators and
/// operand lists that do not fit the operator.
fn parse_operator(op: &str, operands: &mut Vec<Token>) -> Option<ContentOperation> {
    let operation = match op {
        // Text object operators
        "BT" => ContentOperation::BeginText,
        "ET" => ContentOperation::EndText,

        // Text state operators
        "Tc" => ContentOperation::SetCharSpacing(pop_number(operands)?),
        "Tw" => ContentOperation::SetWordSpacing(pop_number(operands)?),
        "Tz" => ContentOperation::SetHorizontalScaling(pop_number(operands)?),
        "TL" => ContentOperation::SetLeading(pop_number(operands)?),
        "Ts" => ContentOperation::SetTextRise(pop_number(operands)?),
        "Tf" => {
            let size = pop_number(operands)?;
            let font = pop_name(operands)?;
            ContentOperation::SetFont(font, size)
        }

        // Text positioning operators
        "Td" => {
            let [tx, ty] = pop_numbers(operands)?;
            ContentOperation::MoveText(tx, ty)
        }
        "TD" => {
            let [tx, ty] = pop_numbers(operands)?;
            ContentOperation::MoveTextSetLeading(tx, ty)
        }
        "Tm" => {
            let [a, b, c, d, e, f] = pop_numbers(operands)?;
            ContentOperation::SetTextMatrix(a, b, c, d, e, f)
        }
        "T*" => ContentOperation::NextLine,

        // Text showing operators
        "Tj" => ContentOperation::ShowText(pop_string(operands)?),
        "TJ" => ContentOperation::ShowTextArray(pop_text_array(operands)?),
        "'" => ContentOperation::NextLineShowText(pop_string(operands)?),
        "\"" => {
            let text = pop_string(operands)?;
            let [word_spacing, char_spacing] = pop_numbers(operands)?;
            ContentOperation::SetSpacingNextLineShowText(word_spacing, char_spacing, text)
        }

        // Graphics state operators
        "q" => ContentOperation::SaveGraphicsState,
        "Q" => ContentOperation::RestoreGraphicsState,
        "cm" => {
            let [a, b, c, d, e, f] = pop_numbers(operands)?;
            ContentOperation::SetTransformMatrix(a, b, c, d, e, f)
        }

        // Path construction operators
        "m" => {
            let [x, y] = pop_numbers(operands)?;
            ContentOperation::MoveTo(x, y)
        }
        "l" => {
            let [x, y] = pop_numbers(operands)?;
            ContentOperation::LineTo(x, y)
        }
        "c" => {
            let [x1, y1, x2, y2, x3, y3] = pop_numbers(operands)?;
            ContentOperation::CurveTo(x1, y1, x2, y2, x3, y3)
        }
        "v" => {
            let [x2, y2, x3, y3] = pop_numbers(operands)?;
            ContentOperation::CurveToV(x2, y2, x3, y3)
        }
        "y" => {
            let [x1, y1, x3, y3] = pop_numbers(operands)?;
            ContentOperation::CurveToY(x1, y1, x3, y3)
        }
        "h" => ContentOperation::ClosePath,
        "re" => {
            let [x, y, width, height] = pop_numbers(operands)?;
            ContentOperation::Rectangle(x, y, width, height)
        }

        // Path painting operators
        "S" => ContentOperation::Stroke,
        "s" => ContentOperation::CloseStroke,
        "f" | "F" => ContentOperation::Fill,
        "f*" => ContentOperation::FillEvenOdd,
        "B" => ContentOperation::FillStroke,
        "B*" => ContentOperation::FillStrokeEvenOdd,
        "b" => ContentOperation::CloseFillStroke,
        "b*" => ContentOperation::CloseFillStrokeEvenOdd,
        "n" => ContentOperation::EndPath,

        // XObject operators
        "Do" => ContentOperation::PaintXObject(pop_name(operands)?),

        _ => return None,
    };

    Some(operation)
}

fn token_number(token: &Token) -> Option<f32> {
    match token {
        Token::Number(n) => Some(*n),
        Token::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

fn pop_number(operands: &mut Vec<Token>) -> Option<f32> {
    token_number(&operands.pop()?)
}

/// The last `N` operands as numbers, in stream order
fn pop_numbers<const N: usize>(operands: &mut Vec<Token>) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let start = operands.len() - N;
    let mut values = [0f32; N];
    for (value, token) in values.iter_mut().zip(operands.drain(start..)) {
        *value = token_number(&token)?;
    }
    Some(values)
}

fn pop_name(operands: &mut Vec<Token>) -> Option<String> {
    match operands.pop()? {
        Token::Name(name) => Some(name),
        _ => None,
    }
}

fn pop_string(operands: &mut Vec<Token>) -> Option<Vec<u8>> {
    match operands.pop()? {
        Token::String(s) | Token::HexString(s) => Some(s),
        _ => None,
    }
}

fn pop_text_array(operands: &mut Vec<Token>) -> Option<Vec<TextElement>> {
    if operands.pop()? != Token::ArrayEnd {
        return None;
    }
    let start = operands.iter().rposition(|token| *token == Token::ArrayStart)?;

    let elements = operands
        .drain(start..)
        .skip(1)
        .filter_map(|token| match token {
            Token::String(s) | Token::HexString(s) => Some(TextElement::Text(s)),
            other => token_number(&other).map(TextElement::Spacing),
        })
        .collect();
    Some(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers() {
        let input = b"123 -45 3.14 -0.5 .5";
        let mut tokenizer = ContentTokenizer::new(input);

        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Integer(123)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Integer(-45)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Number(3.14)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Number(-0.5)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Number(0.5)));
        assert_eq!(tokenizer.next_token().unwrap(), None);
    }

    #[test]
    fn test_tokenize_strings() {
        let input = br"(Hello \(World\)) (line\nbreak) (\101\102) (nested (paren))";
        let mut tokenizer = ContentTokenizer::new(input);

        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"Hello (World)".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"line\nbreak".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"AB".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"nested (paren)".to_vec()))
        );
    }

    #[test]
    fn test_tokenize_hex_strings() {
        let mut tokenizer = ContentTokenizer::new(b"<48656C6C6F> <4 1 4> <ABC>");
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::HexString(b"Hello".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::HexString(vec![0x41, 0x40]))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::HexString(vec![0xAB, 0xC0]))
        );
    }

    #[test]
    fn test_tokenize_names() {
        let mut tokenizer = ContentTokenizer::new(b"/F1 /Name#20With#20Space /A/B");
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("F1".to_string()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("Name With Space".to_string()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("A".to_string()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("B".to_string()))
        );
    }

    #[test]
    fn test_unterminated_hex_string() {
        let mut tokenizer = ContentTokenizer::new(b"<4142");
        assert!(tokenizer.next_token().is_err());
    }

    #[test]
    fn test_parse_text_operators() {
        let content = b"BT /F1 12 Tf 100 200 Td (Hello) Tj 0 -14 TD [(A) -250 (B)] TJ T* ET";
        let ops = ContentParser::parse(content).unwrap();

        assert_eq!(
            ops,
            vec![
                ContentOperation::BeginText,
                ContentOperation::SetFont("F1".to_string(), 12.0),
                ContentOperation::MoveText(100.0, 200.0),
                ContentOperation::ShowText(b"Hello".to_vec()),
                ContentOperation::MoveTextSetLeading(0.0, -14.0),
                ContentOperation::ShowTextArray(vec![
                    TextElement::Text(b"A".to_vec()),
                    TextElement::Spacing(-250.0),
                    TextElement::Text(b"B".to_vec()),
                ]),
                ContentOperation::NextLine,
                ContentOperation::EndText,
            ]
        );
    }

    #[test]
    fn test_parse_quote_operators() {
        let ops = ContentParser::parse(b"(one) ' 2 1 (two) \"").unwrap();
        assert_eq!(
            ops,
            vec![
                ContentOperation::NextLineShowText(b"one".to_vec()),
                ContentOperation::SetSpacingNextLineShowText(2.0, 1.0, b"two".to_vec()),
            ]
        );
    }

    #[test]
    fn test_parse_graphics_operators() {
        let content = b"q 1 0 0 1 50 50 cm 0 0 m 100 0 l S 10 10 80 20 re f Q";
        let ops = ContentParser::parse(content).unwrap();

        assert_eq!(
            ops,
            vec![
                ContentOperation::SaveGraphicsState,
                ContentOperation::SetTransformMatrix(1.0, 0.0, 0.0, 1.0, 50.0, 50.0),
                ContentOperation::MoveTo(0.0, 0.0),
                ContentOperation::LineTo(100.0, 0.0),
                ContentOperation::Stroke,
                ContentOperation::Rectangle(10.0, 10.0, 80.0, 20.0),
                ContentOperation::Fill,
                ContentOperation::RestoreGraphicsState,
            ]
        );
    }

    #[test]
    fn test_unknown_operators_are_skipped() {
        let content = b"/GS0 gs 1 0 0 rg 0.5 g /P <</MCID 0>> BDC BT (x) Tj ET EMC";
        let ops = ContentParser::parse(content).unwrap();
        assert_eq!(
            ops,
            vec![
                ContentOperation::BeginText,
                ContentOperation::ShowText(b"x".to_vec()),
                ContentOperation::EndText,
            ]
        );
    }

    #[test]
    fn test_operands_do_not_leak_into_next_operator() {
        // "w" is unsupported; its operands must not become the Tj string
        let ops = ContentParser::parse(b"(stale) 1 w (fresh) Tj").unwrap();
        assert_eq!(ops, vec![ContentOperation::ShowText(b"fresh".to_vec())]);
    }

    #[test]
    fn test_malformed_operands_skip_operator() {
        let ops = ContentParser::parse(b"(a) Td 10 20 Td").unwrap();
        assert_eq!(ops, vec![ContentOperation::MoveText(10.0, 20.0)]);
    }

    #[test]
    fn test_inline_image_skipped() {
        let mut content = b"BT (before) Tj ET BI /W 2 /H 2 /BPC 8 /CS /G ID ".to_vec();
        content.extend_from_slice(&[0x00, b')', b'(', 0xFF]);
        content.extend_from_slice(b" EI BT (after) Tj ET");

        let ops = ContentParser::parse(&content).unwrap();
        assert_eq!(
            ops,
            vec![
                ContentOperation::BeginText,
                ContentOperation::ShowText(b"before".to_vec()),
                ContentOperation::EndText,
                ContentOperation::BeginText,
                ContentOperation::ShowText(b"after".to_vec()),
                ContentOperation::EndText,
            ]
        );
    }

    #[test]
    fn test_paint_xobject() {
        let ops = ContentParser::parse(b"q 100 0 0 50 0 0 cm /Im1 Do Q").unwrap();
        assert_eq!(ops[2], ContentOperation::PaintXObject("Im1".to_string()));
    }
}
