//! text to tokens
//!
//! [Lexer::next_token] produces one positioned [Token] per call until [TokenKind::Eof]. Comments and whitespace
//! are skipped and never show up as tokens. The lexer stops at the first character sequence it does not
//! understand.
//!
//! Heredocs (`<<EOF` / `<<-EOF`) are read in a dedicated sub-mode, see [Heredoc].
use crate::error::ParseError;
use crate::grammar::Terminal;

/// Location of a character in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct Position {
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
    /// byte offset
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident,
    /// decoded contents of a quoted string
    String(String),
    /// decoded (and possibly indentation-stripped) heredoc body
    Heredoc(String),
    /// integer or decimal, see the lexeme for which one
    Number,
    True,
    False,
    Null,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Equals,
    Colon,
    Comma,
    Eof,
}

impl TokenKind {
    pub fn terminal(&self) -> Terminal {
        match self {
            TokenKind::Ident => Terminal::Ident,
            TokenKind::String(_) => Terminal::String,
            TokenKind::Heredoc(_) => Terminal::Heredoc,
            TokenKind::Number => Terminal::Number,
            TokenKind::True => Terminal::True,
            TokenKind::False => Terminal::False,
            TokenKind::Null => Terminal::Null,
            TokenKind::LeftBrace => Terminal::LeftBrace,
            TokenKind::RightBrace => Terminal::RightBrace,
            TokenKind::LeftBracket => Terminal::LeftBracket,
            TokenKind::RightBracket => Terminal::RightBracket,
            TokenKind::Equals => Terminal::Equals,
            TokenKind::Colon => Terminal::Colon,
            TokenKind::Comma => Terminal::Comma,
            TokenKind::Eof => Terminal::Eof,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// raw source text of the token
    pub lexeme: &'a str,
    /// position of the first character
    pub position: Position,
}

impl Token<'_> {
    /// Short human readable description used in diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Heredoc(_) => "heredoc".to_string(),
            _ => format!("`{}`", self.lexeme),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    /// end of the last real token, where [TokenKind::Eof] is reported
    last_end: Position,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            last_end: Position::START,
            done: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        self.skip_trivia()?;

        let start = self.here();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", self.last_end));
        };

        let kind = match c {
            '{' => self.punctuation(TokenKind::LeftBrace),
            '}' => self.punctuation(TokenKind::RightBrace),
            '[' => self.punctuation(TokenKind::LeftBracket),
            ']' => self.punctuation(TokenKind::RightBracket),
            '=' => self.punctuation(TokenKind::Equals),
            ':' => self.punctuation(TokenKind::Colon),
            ',' => self.punctuation(TokenKind::Comma),
            '"' => self.string(start)?,
            '<' if self.rest().starts_with("<<") => self.heredoc(start)?,
            '0'..='9' | '-' | '+' => self.number(start)?,
            c if is_ident_start(c) => self.ident(),
            c => {
                return Err(ParseError::lex(
                    format!("unexpected character `{}`", c.escape_debug()),
                    start,
                ))
            }
        };

        let lexeme = &self.source[start.offset..self.offset];
        self.last_end = self.here();
        Ok(Token::new(kind, lexeme, start))
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(&predicate) {
            self.bump();
            count += 1;
        }
        count
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('#') => {
                    self.bump_while(|c| c != '\n');
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    self.bump_while(|c| c != '\n');
                }
                Some('/') if self.peek_nth(1) == Some('*') => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    loop {
                        if self.rest().starts_with("*/") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(ParseError::lex("unterminated block comment", start));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn punctuation(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.offset;
        self.bump_while(is_ident_continue);

        match &self.source[start..self.offset] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        }
    }

    fn number(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }

        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let sign = &self.source[start.offset..self.offset];
            return Err(ParseError::lex(
                format!("unexpected character `{sign}`"),
                start,
            ));
        }

        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            if self.bump_while(|c| c.is_ascii_hexdigit()) == 0 {
                return Err(ParseError::lex(
                    "expected hexadecimal digit",
                    self.here(),
                ));
            }
        } else {
            self.bump_while(|c| c.is_ascii_digit());

            if self.peek() == Some('.') {
                self.bump();
                if self.bump_while(|c| c.is_ascii_digit()) == 0 {
                    return Err(ParseError::lex(
                        "expected digit after decimal point",
                        self.here(),
                    ));
                }
            }

            if matches!(self.peek(), Some('e' | 'E')) {
                self.bump();
                if matches!(self.peek(), Some('-' | '+')) {
                    self.bump();
                }
                if self.bump_while(|c| c.is_ascii_digit()) == 0 {
                    return Err(ParseError::lex(
                        "expected digit in exponent",
                        self.here(),
                    ));
                }
            }
        }

        if self.peek().is_some_and(is_ident_continue) {
            return Err(ParseError::lex(
                format!(
                    "invalid number literal `{}`",
                    &self.source[start.offset..self.offset]
                ),
                start,
            ));
        }

        Ok(TokenKind::Number)
    }

    fn string(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        self.bump();

        let mut value = String::new();
        loop {
            let at = self.here();
            match self.bump() {
                None | Some('\n') => return Err(ParseError::lex("unterminated string", start)),
                Some('"') => break,
                Some('\\') => value.push(self.escape(at, start)?),
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    /// Decode the escape sequence following a backslash at `at`
    fn escape(&mut self, at: Position, string_start: Position) -> Result<char, ParseError> {
        let Some(c) = self.bump() else {
            return Err(ParseError::lex("unterminated string", string_start));
        };

        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'u' => {
                let mut code = self.hex_escape(4, at)?;
                if (0xD800..0xDC00).contains(&code) {
                    // high surrogate, JSON encodes astral characters as a pair
                    if !self.rest().starts_with("\\u") {
                        return Err(ParseError::lex("unpaired surrogate in unicode escape", at));
                    }
                    self.bump();
                    self.bump();
                    let low = self.hex_escape(4, at)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(ParseError::lex("unpaired surrogate in unicode escape", at));
                    }
                    code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                }
                char::from_u32(code).ok_or_else(|| ParseError::lex("invalid unicode escape", at))?
            }
            'U' => char::from_u32(self.hex_escape(8, at)?)
                .ok_or_else(|| ParseError::lex("invalid unicode escape", at))?,
            other => {
                return Err(ParseError::lex(
                    format!("invalid escape sequence `\\{}`", other.escape_debug()),
                    at,
                ))
            }
        };

        Ok(decoded)
    }

    fn hex_escape(&mut self, digits: usize, at: Position) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| ParseError::lex("invalid unicode escape", at))?;
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn heredoc(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        self.bump();
        self.bump();
        let strip_indent = self.peek() == Some('-');
        if strip_indent {
            self.bump();
        }

        let marker_start = self.offset;
        self.bump_while(is_ident_continue);
        let marker = &self.source[marker_start..self.offset];
        if marker.is_empty() || !marker.starts_with(is_ident_start) {
            return Err(ParseError::lex("expected heredoc marker after `<<`", start));
        }

        self.bump_while(|c| c == ' ' || c == '\t' || c == '\r');
        if self.bump() != Some('\n') {
            return Err(ParseError::lex(
                "heredoc marker must be followed by a newline",
                start,
            ));
        }

        let mut mode = Heredoc::new(marker, strip_indent);
        loop {
            let Some(line) = self.rest().split_inclusive('\n').next() else {
                return Err(ParseError::lex(
                    format!("unterminated heredoc, expected closing `{marker}`"),
                    start,
                ));
            };

            if mode.is_terminator(line) {
                let end = self.offset + (line.len() - line.trim_start().len()) + marker.len();
                while self.offset < end {
                    self.bump();
                }
                break;
            }

            mode.push(line);
            for _ in line.chars() {
                self.bump();
            }
        }

        Ok(TokenKind::Heredoc(mode.finish()))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.next_token();
        self.done = match &token {
            Ok(token) => token.kind == TokenKind::Eof,
            Err(_) => true,
        };
        Some(token)
    }
}

/// Lexer sub-mode for one heredoc body
///
/// Collects body lines until the terminator and tracks the smallest indentation of all non-blank lines.
#[derive(Debug)]
struct Heredoc<'a> {
    marker: &'a str,
    strip_indent: bool,
    lines: Vec<&'a str>,
    indent: Option<usize>,
}

impl<'a> Heredoc<'a> {
    fn new(marker: &'a str, strip_indent: bool) -> Self {
        Self {
            marker,
            strip_indent,
            lines: Vec::new(),
            indent: None,
        }
    }

    fn is_terminator(&self, line: &str) -> bool {
        line.trim() == self.marker
    }

    fn push(&mut self, line: &'a str) {
        if self.strip_indent && !line.trim().is_empty() {
            let indent = leading_whitespace(line);
            self.indent = Some(self.indent.map_or(indent, |current| current.min(indent)));
        }
        self.lines.push(line);
    }

    fn finish(self) -> String {
        let strip = if self.strip_indent {
            self.indent.unwrap_or(0)
        } else {
            0
        };

        self.lines
            .into_iter()
            .map(|line| &line[leading_whitespace(line).min(strip)..])
            .collect()
    }
}

/// Number of leading spaces/tabs (all single byte)
fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches(|c: char| c == ' ' || c == '\t').len()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}
