//! structured parse errors
//!
//! Every stage of the pipeline fails with the same [ParseError]. The first error aborts the parse, there is no
//! recovery and no partial result.
use crate::lexer::Position;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// invalid character, unterminated string/heredoc/comment, bad escape
    Lex,
    /// token not accepted by the automaton in its current state
    Syntax,
    /// literal that has no value representation
    Value,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lex => f.write_str("LexError"),
            ErrorKind::Syntax => f.write_str("SyntaxError"),
            ErrorKind::Value => f.write_str("ValueError"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind} at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
    /// byte offset into the input
    pub offset: usize,
    /// the source line containing the error (attached by the parser facade)
    pub snippet: Option<String>,
    /// terminals the automaton would have accepted (syntax errors only)
    pub expected: Vec<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
            offset: position.offset,
            snippet: None,
            expected: Vec::new(),
        }
    }

    pub fn lex(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Lex, message, position)
    }

    pub fn syntax(message: impl Into<String>, position: Position, expected: Vec<String>) -> Self {
        Self {
            expected,
            ..Self::new(ErrorKind::Syntax, message, position)
        }
    }

    pub fn value(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Value, message, position)
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// Attach the offending source line
    pub fn with_source(mut self, source: &str) -> Self {
        self.snippet = source
            .lines()
            .nth(self.line.saturating_sub(1))
            .map(|line| line.trim_end_matches('\r').to_string());
        self
    }

    /// Render the error with its snippet and a caret under the offending column
    ///
    /// ```text
    /// SyntaxError at line 1, column 6: unexpected end of input, ...
    ///   |
    /// 1 | foo =
    ///   |      ^
    /// ```
    pub fn render(&self) -> String {
        let Some(snippet) = &self.snippet else {
            return self.to_string();
        };

        let gutter = " ".repeat(self.line.to_string().len());
        let pad: String = snippet
            .chars()
            .take(self.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let pad = format!("{pad:<width$}", width = self.column.saturating_sub(1));

        format!(
            "{self}\n{gutter} |\n{line} | {snippet}\n{gutter} | {pad}^",
            line = self.line,
        )
    }
}
