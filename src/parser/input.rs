//! Low-level input handling for the XML parser.
//!
//! [`ParserInput`] owns the decoded text, tracks position (line, column,
//! byte offset), and provides the scanning primitives the tree builder is
//! written in terms of: peeking, advancing, taking whitespace runs and
//! delimited spans, name parsing, and entity decoding.
//!
//! Every primitive hands out slices of the original input so the builder
//! can keep the exact source spelling alongside decoded values.
//!
//! # Recovery
//!
//! Well-formedness problems go through [`ParserInput::recoverable`], which
//! fails in strict mode and otherwise logs a `tracing` debug event and lets
//! the caller continue with its recovery path.
//!
//! # Security
//!
//! Nesting depth is tracked and limited regardless of strictness, so a
//! deeply nested document cannot exhaust the stack. No external entity is
//! ever loaded.

use crate::error::{ParseError, SourceLocation};
use crate::util::qname::{is_name_char, is_name_start_char};

// -------------------------------------------------------------------------
// Security defaults
// -------------------------------------------------------------------------

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

// -------------------------------------------------------------------------
// Position checkpointing (for backtracking)
// -------------------------------------------------------------------------

/// A snapshot of the input position (byte offset, line, column).
///
/// Obtained via [`ParserInput::save_position`] and restored via
/// [`ParserInput::restore_position`]. Used when a speculative parse (an
/// attribute without `=`, a start tag that turns out to be text) has to be
/// undone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SavedPosition {
    pos: usize,
    line: u32,
    column: u32,
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Low-level input state for the parser.
pub(crate) struct ParserInput<'a> {
    /// The decoded input, without any byte order mark.
    input: &'a str,

    /// Current byte offset in `input`. Always on a char boundary.
    pos: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based, in characters).
    column: u32,

    /// Current element nesting depth.
    depth: u32,

    /// Maximum allowed nesting depth.
    max_depth: u32,

    /// Whether recoverable problems are fatal.
    strict: bool,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }

    /// Sets the maximum nesting depth.
    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    /// Enables or disables strict mode.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Returns whether strict mode is enabled.
    pub fn strict(&self) -> bool {
        self.strict
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the input between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Returns the unconsumed input.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Saves the current position so it can be restored later with
    /// [`restore_position`](Self::restore_position).
    pub fn save_position(&self) -> SavedPosition {
        SavedPosition {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Restores a previously saved position. All progress since the
    /// [`save_position`](Self::save_position) call is discarded.
    pub fn restore_position(&mut self, saved: SavedPosition) {
        self.pos = saved.pos;
        self.line = saved.line;
        self.column = saved.column;
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.remaining().as_bytes().starts_with(s)
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    ///
    /// `count` must land on a character boundary.
    pub fn advance(&mut self, count: usize) {
        let end = (self.pos + count).min(self.input.len());
        for ch in self.input[self.pos..end].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    /// Consumes characters while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remaining();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.advance(len);
        &rest[..len]
    }

    /// Consumes a run of XML whitespace and returns it (possibly empty).
    pub fn take_whitespace(&mut self) -> &'a str {
        self.take_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
    }

    /// Consumes input up to and including `delimiter`, returning the text
    /// before it. Returns `None` without consuming anything if `delimiter`
    /// does not occur.
    pub fn take_until(&mut self, delimiter: &str) -> Option<&'a str> {
        let rest = self.remaining();
        let len = rest.find(delimiter)?;
        self.advance(len + delimiter.len());
        Some(&rest[..len])
    }

    /// Consumes and returns all remaining input.
    pub fn take_rest(&mut self) -> &'a str {
        let rest = self.remaining();
        self.advance(rest.len());
        rest
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name`. Returns `None` without consuming anything if
    /// the input does not start with a name start character.
    pub fn parse_name(&mut self) -> Option<&'a str> {
        let first = self.peek_char()?;
        if !is_name_start_char(first) {
            return None;
        }
        let rest = self.remaining();
        let len = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        self.advance(len);
        Some(&rest[..len])
    }

    // -- Reference decoding (XML 1.0 §4.1) --

    /// Decodes the five built-in entities and character references in
    /// `raw`.
    ///
    /// Unknown entities and bare `&` are kept literally, which is an error
    /// in strict mode.
    pub fn decode_entities(&self, raw: &str) -> Result<String, ParseError> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            rest = &rest[amp..];

            let reference = rest[1..]
                .find(|c: char| c == ';' || c == '&' || c == '<' || c.is_whitespace())
                .filter(|&end| rest[1..].as_bytes()[end] == b';')
                .map(|end| &rest[1..=end]);
            let Some(name) = reference else {
                self.recoverable("'&' not followed by a reference")?;
                out.push('&');
                rest = &rest[1..];
                continue;
            };

            match resolve_reference(name) {
                Some(ch) => out.push(ch),
                None => {
                    self.recoverable(format!("undefined entity '&{name};'"))?;
                    out.push('&');
                    out.push_str(name);
                    out.push(';');
                }
            }
            rest = &rest[name.len() + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }

    // -- Error helpers --

    /// Creates a fatal `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }

    /// Reports a well-formedness problem: an error in strict mode, a debug
    /// event otherwise.
    pub fn recoverable(&self, message: impl Into<String>) -> Result<(), ParseError> {
        let message = message.into();
        if self.strict {
            return Err(self.fatal(message));
        }
        tracing::debug!(
            line = self.line,
            column = self.column,
            "recovering from malformed input: {message}"
        );
        Ok(())
    }
}

/// Resolves the name of a reference (the text between `&` and `;`).
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code).filter(|&c| c != '\0')
        }
    }
}

// -------------------------------------------------------------------------
// Markup constructs
// -------------------------------------------------------------------------

/// Parses a comment (`<!-- ... -->`), returning the content text.
///
/// The opening `<!--` must not have been consumed yet. An unterminated
/// comment runs to the end of input.
pub(crate) fn parse_comment_content<'a>(
    input: &mut ParserInput<'a>,
) -> Result<&'a str, ParseError> {
    input.advance(4);
    let content = match input.take_until("-->") {
        Some(content) => content,
        None => {
            input.recoverable("unterminated comment")?;
            input.take_rest()
        }
    };
    // XML 1.0 forbids -- inside comments
    if content.contains("--") {
        input.recoverable("'--' not allowed inside comments")?;
    }
    Ok(content)
}

/// Parses a CDATA section (`<![CDATA[ ... ]]>`), returning the content text.
///
/// The opening `<![CDATA[` must not have been consumed yet.
pub(crate) fn parse_cdata_content<'a>(
    input: &mut ParserInput<'a>,
) -> Result<&'a str, ParseError> {
    input.advance(9);
    match input.take_until("]]>") {
        Some(content) => Ok(content),
        None => {
            input.recoverable("unterminated CDATA section")?;
            Ok(input.take_rest())
        }
    }
}

/// The pieces of a processing instruction, as written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PiParts<'a> {
    pub target: &'a str,
    pub whitespace: &'a str,
    pub data: &'a str,
}

/// Parses a processing instruction (`<?target data?>`).
///
/// The opening `<?` must not have been consumed yet.
pub(crate) fn parse_pi_content<'a>(
    input: &mut ParserInput<'a>,
) -> Result<PiParts<'a>, ParseError> {
    input.advance(2);
    let target = match input.parse_name() {
        Some(name) => name,
        None => {
            input.recoverable("processing instruction without a target")?;
            input.take_while(|c| !matches!(c, ' ' | '\t' | '\r' | '\n' | '?'))
        }
    };
    let whitespace = input.take_whitespace();
    let data = match input.take_until("?>") {
        Some(data) => data,
        None => {
            input.recoverable("unterminated processing instruction")?;
            input.take_rest()
        }
    };
    if whitespace.is_empty() && !data.is_empty() {
        input.recoverable("whitespace required after processing instruction target")?;
    }
    Ok(PiParts {
        target,
        whitespace,
        data,
    })
}

/// A parsed XML declaration.
#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration<'a> {
    /// The declaration exactly as written.
    pub raw: &'a str,
    pub version: Option<&'a str>,
    pub encoding: Option<&'a str>,
    pub standalone: Option<bool>,
}

/// Parses an XML declaration (`<?xml version="1.0" ...?>`).
///
/// The opening `<?xml` must not have been consumed yet (but should be
/// verified by the caller).
pub(crate) fn parse_xml_decl<'a>(
    input: &mut ParserInput<'a>,
) -> Result<XmlDeclaration<'a>, ParseError> {
    let start = input.pos();
    input.advance(5);
    let body = match input.take_until("?>") {
        Some(body) => body,
        None => {
            input.recoverable("unterminated XML declaration")?;
            input.take_rest()
        }
    };
    let raw = input.slice(start, input.pos());

    let mut decl = XmlDeclaration {
        raw,
        version: None,
        encoding: None,
        standalone: None,
    };
    let mut rest = body;
    loop {
        rest = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        if rest.is_empty() {
            break;
        }
        let Some((name, value, after)) = pseudo_attribute(rest) else {
            input.recoverable("malformed XML declaration")?;
            break;
        };
        match name {
            "version" => decl.version = Some(value),
            "encoding" => decl.encoding = Some(value),
            "standalone" => match value {
                "yes" => decl.standalone = Some(true),
                "no" => decl.standalone = Some(false),
                _ => input.recoverable("standalone must be 'yes' or 'no'")?,
            },
            other => input.recoverable(format!("unknown XML declaration field '{other}'"))?,
        }
        rest = after;
    }
    if decl.version.is_none() {
        input.recoverable("XML declaration without version")?;
    }
    Ok(decl)
}

/// Splits `name = "value"` off the front of `s`, returning the name, the
/// value and the text after the closing quote.
fn pseudo_attribute(s: &str) -> Option<(&str, &str, &str)> {
    let name_len = s.find(|c: char| !is_name_char(c)).unwrap_or(s.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = s.split_at(name_len);
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some((name, &rest[..end], &rest[end + 1..]))
}

/// Scans a document type declaration and returns its full text.
///
/// The internal subset is skipped by bracket depth, ignoring brackets and
/// `>` inside quoted literals. The opening `<!DOCTYPE` must not have been
/// consumed yet.
pub(crate) fn scan_doctype<'a>(input: &mut ParserInput<'a>) -> Result<&'a str, ParseError> {
    let start = input.pos();
    let rest = input.remaining();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut end = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => {
                end = Some(i + 1);
                break;
            }
            _ => {}
        }
    }
    match end {
        Some(len) => input.advance(len),
        None => {
            input.recoverable("unterminated DOCTYPE declaration")?;
            input.take_rest();
        }
    }
    Ok(input.slice(start, input.pos()))
}
