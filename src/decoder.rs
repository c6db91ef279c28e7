//! Attribute file decoder

use crate::attribute::{Attribute, AttributeTable};
use crate::error::{Error, Result};

// Skipped before every token
const WHITESPACE: &[u8] = b" \r";
// Single-byte field separators
const SEPARATORS: &[u8] = b"\t\n";
// Bytes that end a text token
const DELIMITERS: &[u8] = b"\t\r\n";

const TAB: u8 = b'\t';
const NUL: u8 = 0;

/// Parsing strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Malformed records are reported as [`Error::Parse`]
    #[default]
    Strict,
    /// Malformed records are skipped or repaired silently
    Lenient,
}

/// Configuration for attribute file decoding
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    pub mode: ParseMode,
}

impl ParserConfig {
    pub fn lenient() -> Self {
        Self {
            mode: ParseMode::Lenient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Name/value separator
    Tab,
    /// End of record
    Newline,
    /// Field content
    Text,
}

/// A half-open byte range `[start, end)` into the lexed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Tokenizer for tab separated attribute files.
///
/// Spaces and carriage returns are skipped before each token. A tab or a
/// newline is a one byte token of its own; anything else runs up to the next
/// tab, carriage return or newline. Lexing stops at the end of the buffer or
/// at a NUL byte.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len() || self.input[self.pos] == NUL
    }

    pub fn next_token(&mut self) -> Option<Token> {
        while !self.at_end() && WHITESPACE.contains(&self.input[self.pos]) {
            self.pos += 1;
        }

        if self.at_end() {
            return None;
        }

        let start = self.pos;
        let first = self.input[start];

        if SEPARATORS.contains(&first) {
            self.pos += 1;
            let kind = if first == TAB { TokenKind::Tab } else { TokenKind::Newline };
            return Some(Token { kind, start, end: self.pos });
        }

        let len = self.input[start..]
            .iter()
            .position(|b| DELIMITERS.contains(b) || *b == NUL)
            .unwrap_or(self.input.len() - start);
        self.pos = start + len;

        Some(Token {
            kind: TokenKind::Text,
            start,
            end: self.pos,
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    ParsingName,
    ParsingValue,
}

/// Record-building state machine fed by the lexer
struct AttributeParser<'a> {
    input: &'a [u8],
    mode: ParseMode,
    state: ParseState,
    name: Vec<u8>,
    value: Vec<u8>,
    record_start: usize,
    attributes: Vec<Attribute>,
}

impl<'a> AttributeParser<'a> {
    fn new(input: &'a [u8], mode: ParseMode) -> Self {
        Self {
            input,
            mode,
            state: ParseState::ParsingName,
            name: Vec::new(),
            value: Vec::new(),
            record_start: 0,
            attributes: Vec::new(),
        }
    }

    fn strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }

    fn feed(&mut self, token: Token) -> Result<()> {
        tracing::trace!(?token, state = ?self.state, "attribute token");
        match self.state {
            ParseState::ParsingName => self.handle_name(token),
            ParseState::ParsingValue => self.handle_value(token),
        }
    }

    fn handle_name(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::Tab => {
                if self.name.is_empty() && self.strict() {
                    return Err(Error::parse(token.start, "attribute name is empty"));
                }
                self.state = ParseState::ParsingValue;
                Ok(())
            }
            TokenKind::Newline => {
                if self.strict() {
                    let message = if self.name.is_empty() {
                        "blank line"
                    } else {
                        "record has no tab between name and value"
                    };
                    return Err(Error::parse(token.start, message));
                }
                self.reset();
                Ok(())
            }
            TokenKind::Text => {
                if self.name.is_empty() {
                    self.record_start = token.start;
                }
                self.name.extend_from_slice(&self.input[token.start..token.end]);
                Ok(())
            }
        }
    }

    fn handle_value(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::Newline => {
                self.finish_record()?;
                self.state = ParseState::ParsingName;
                Ok(())
            }
            TokenKind::Tab => {
                if self.strict() {
                    return Err(Error::parse(token.start, "unexpected tab in attribute value"));
                }
                Ok(())
            }
            TokenKind::Text => {
                self.value.extend_from_slice(&self.input[token.start..token.end]);
                Ok(())
            }
        }
    }

    fn finish_record(&mut self) -> Result<()> {
        let name = std::mem::take(&mut self.name);
        let value = std::mem::take(&mut self.value);
        let name = self.field_to_string(name)?;
        let value = self.field_to_string(value)?;
        self.attributes.push(Attribute { name, value });
        self.reset();
        Ok(())
    }

    fn field_to_string(&self, bytes: Vec<u8>) -> Result<String> {
        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(e) if self.strict() => Err(Error::parse(
                self.record_start,
                format!("attribute is not valid UTF-8: {}", e.utf8_error()),
            )),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    fn reset(&mut self) {
        self.name.clear();
        self.value.clear();
        self.state = ParseState::ParsingName;
    }

    fn finish(mut self, end: usize) -> Result<Vec<Attribute>> {
        match self.state {
            ParseState::ParsingValue => {
                if self.strict() {
                    return Err(Error::parse(end, "unterminated record at end of input"));
                }
                self.finish_record()?;
            }
            ParseState::ParsingName if !self.name.is_empty() && self.strict() => {
                return Err(Error::parse(end, "record has no tab between name and value"));
            }
            ParseState::ParsingName => {}
        }
        Ok(self.attributes)
    }
}

/// Decodes attribute files into attribute tables
pub struct Decoder {
    config: ParserConfig,
}

impl Decoder {
    /// Create a new strict decoder
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Decode an attribute file into a list of attributes, in document order
    pub fn decode(&self, input: &[u8]) -> Result<Vec<Attribute>> {
        let mut lexer = Lexer::new(input);
        let mut parser = AttributeParser::new(input, self.config.mode);

        while let Some(token) = lexer.next_token() {
            parser.feed(token)?;
        }

        parser.finish(lexer.position())
    }

    /// Decode an attribute file and append its records to `table`.
    ///
    /// The table is left untouched when decoding fails.
    pub fn decode_into(&self, input: &[u8], table: &mut AttributeTable) -> Result<()> {
        let attributes = self.decode(input)?;
        tracing::debug!(kind = %table.kind(), count = attributes.len(), "decoded attributes");
        table.extend(attributes);
        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;

    fn tokens(input: &[u8]) -> Vec<(TokenKind, &[u8])> {
        Lexer::new(input)
            .map(|t| (t.kind, &input[t.start..t.end]))
            .collect()
    }

    #[test]
    fn test_lex_single_record() {
        assert_eq!(
            tokens(b"name\tvalue\n"),
            vec![
                (TokenKind::Text, &b"name"[..]),
                (TokenKind::Tab, &b"\t"[..]),
                (TokenKind::Text, &b"value"[..]),
                (TokenKind::Newline, &b"\n"[..]),
            ]
        );
    }

    #[test]
    fn test_lex_empty_input() {
        let mut lexer = Lexer::new(b"");
        assert_eq!(lexer.next_token(), None);
    }

    #[test]
    fn test_lex_skips_spaces_and_carriage_returns() {
        assert_eq!(
            tokens(b"  Part Number\t 10 k\r\n"),
            vec![
                (TokenKind::Text, &b"Part Number"[..]),
                (TokenKind::Tab, &b"\t"[..]),
                (TokenKind::Text, &b"10 k"[..]),
                (TokenKind::Newline, &b"\n"[..]),
            ]
        );
    }

    #[test]
    fn test_lex_stops_at_nul() {
        assert_eq!(
            tokens(b"a\tb\n\0c\td\n"),
            vec![
                (TokenKind::Text, &b"a"[..]),
                (TokenKind::Tab, &b"\t"[..]),
                (TokenKind::Text, &b"b"[..]),
                (TokenKind::Newline, &b"\n"[..]),
            ]
        );
    }

    #[test]
    fn test_lex_token_offsets() {
        let tokens: Vec<_> = Lexer::new(b" ab\tc").collect();
        assert_eq!(tokens[0], Token { kind: TokenKind::Text, start: 1, end: 3 });
        assert_eq!(tokens[1], Token { kind: TokenKind::Tab, start: 3, end: 4 });
        assert_eq!(tokens[2], Token { kind: TokenKind::Text, start: 4, end: 5 });
    }

    #[test]
    fn test_decode_single_attribute() {
        let attrs = Decoder::new().decode(b"name\tvalue\n").unwrap();
        assert_eq!(attrs, vec![Attribute::new("name", "value")]);
    }

    #[test]
    fn test_decode_empty_input() {
        let attrs = Decoder::new().decode(b"").unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_decode_multiple_records_in_order() {
        let input = b"Name\tLM358\nPackage\tDIP-8\nDescription\tDual op-amp\n";
        let attrs = Decoder::new().decode(input).unwrap();

        assert_eq!(
            attrs,
            vec![
                Attribute::new("Name", "LM358"),
                Attribute::new("Package", "DIP-8"),
                Attribute::new("Description", "Dual op-amp"),
            ]
        );
    }

    #[test]
    fn test_decode_crlf_line_endings() {
        let attrs = Decoder::new().decode(b"Vcc\t32V\r\nGBW\t1MHz\r\n").unwrap();
        assert_eq!(attrs, vec![Attribute::new("Vcc", "32V"), Attribute::new("GBW", "1MHz")]);
    }

    #[test]
    fn test_decode_empty_value() {
        let attrs = Decoder::new().decode(b"Notes\t\n").unwrap();
        assert_eq!(attrs, vec![Attribute::new("Notes", "")]);
    }

    #[test]
    fn test_decode_carriage_return_splits_are_joined() {
        let attrs = Decoder::new().decode(b"Na\rme\tva\rlue\n").unwrap();
        assert_eq!(attrs, vec![Attribute::new("Name", "value")]);
    }

    #[test]
    fn test_strict_unterminated_record() {
        let err = Decoder::new().decode(b"a\tb\nc\td").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 7, .. }));
    }

    #[test]
    fn test_strict_blank_line() {
        let err = Decoder::new().decode(b"a\tb\n\nc\td\n").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 4, .. }));
    }

    #[test]
    fn test_strict_missing_name() {
        let err = Decoder::new().decode(b"\tvalue\n").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 0, .. }));
    }

    #[test]
    fn test_strict_missing_tab() {
        let err = Decoder::new().decode(b"lonely\n").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 6, .. }));
    }

    #[test]
    fn test_strict_second_tab_in_value() {
        let err = Decoder::new().decode(b"a\tb\tc\n").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 3, .. }));
    }

    #[test]
    fn test_strict_invalid_utf8() {
        let err = Decoder::new().decode(b"ok\tfine\nbad\t\xff\n").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 8, .. }));
    }

    #[test]
    fn test_lenient_tolerates_malformed_records() {
        let decoder = Decoder::with_config(ParserConfig::lenient());
        let attrs = decoder.decode(b"\nlonely\na\tb\tc\n\nlast\tone").unwrap();

        assert_eq!(attrs, vec![Attribute::new("a", "bc"), Attribute::new("last", "one")]);
    }

    #[test]
    fn test_lenient_lossy_utf8() {
        let decoder = Decoder::with_config(ParserConfig::lenient());
        let attrs = decoder.decode(b"bad\t\xff\n").unwrap();
        assert_eq!(attrs, vec![Attribute::new("bad", "\u{FFFD}")]);
    }

    #[test]
    fn test_decode_into_appends() {
        let mut table = AttributeTable::new(AttributeKind::Parameters);
        table.push(Attribute::new("existing", "1"));

        Decoder::new().decode_into(b"new\t2\n", &mut table).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get_index(1), Some(&Attribute::new("new", "2")));
    }

    #[test]
    fn test_decode_into_failure_leaves_table_untouched() {
        let mut table = AttributeTable::new(AttributeKind::Manifest);
        let err = Decoder::new().decode_into(b"a\tb\nbroken", &mut table);

        assert!(err.is_err());
        assert!(table.is_empty());
    }
}
