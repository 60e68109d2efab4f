//! parser facade
//!
//! A [Parser] owns shared, read-only parse tables. Parsing keeps all of its state on the stack, so one parser
//! can serve any number of threads. [default_parser] is created on first use from [ParserConfig::from_env] and
//! lives for the rest of the process.
use crate::ast::Document;
use crate::automaton;
use crate::cache::TableCache;
use crate::config::{CacheMode, ParserConfig};
use crate::error::ParseError;
use crate::table::ParseTable;
use crate::transform::transform;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static DEFAULT_PARSER: OnceCell<Parser> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct Parser {
    table: Arc<ParseTable>,
}

impl Parser {
    pub fn new(table: Arc<ParseTable>) -> Self {
        Self { table }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        let table = match &config.cache {
            CacheMode::Disabled => ParseTable::build(),
            CacheMode::File(path) => TableCache::new(path.clone()).load_or_build(),
        };
        Self::new(Arc::new(table))
    }

    pub fn table(&self) -> &Arc<ParseTable> {
        &self.table
    }

    /// Parse `text` into a [Value]
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = text.len()))]
    pub fn parse(&self, text: &str) -> Result<Value, ParseError> {
        let document = self.parse_document(text)?;
        transform(document).map_err(|err| err.with_source(text))
    }

    /// Parse `text` into its parse tree without evaluating literals
    pub fn parse_document(&self, text: &str) -> Result<Document, ParseError> {
        automaton::parse(&self.table, text).map_err(|err| {
            tracing::debug!(error = %err, "parse failed");
            err.with_source(text)
        })
    }
}

/// Process-wide parser, initialised once
pub fn default_parser() -> &'static Parser {
    DEFAULT_PARSER.get_or_init(|| Parser::from_config(&ParserConfig::from_env()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn parser() -> Parser {
        Parser::from_config(&ParserConfig::without_cache())
    }

    #[test]
    fn errors_carry_the_source_line() {
        let error = parser().parse("a = 1\nb = }").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Syntax);
        assert_eq!((error.line, error.column), (2, 5));
        assert_eq!(error.snippet.as_deref(), Some("b = }"));
    }

    #[test]
    fn lex_errors_carry_the_source_line() {
        let error = parser().parse("ok = 1\nbad = \"\\q\"").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Lex);
        assert_eq!((error.line, error.column), (2, 8));
        assert_eq!(error.snippet.as_deref(), Some("bad = \"\\q\""));
    }

    #[test]
    fn integers_beyond_i64_parse() {
        let value = parser().parse("big = 99999999999999999999").unwrap();
        assert_eq!(value.get("big"), Some(&Value::Int(99999999999999999999)));
    }

    #[test]
    fn shared_between_threads() {
        let parser = parser();
        std::thread::scope(|scope| {
            for n in 0..4i64 {
                let parser = &parser;
                scope.spawn(move || {
                    let value = parser.parse(&format!("n = {n}")).unwrap();
                    assert_eq!(value.get("n"), Some(&Value::from(n)));
                });
            }
        });
    }

    #[test]
    fn cached_tables_match_built_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = ParserConfig::with_cache_file(dir.path().join("parsetab.bin"));

        let cold = Parser::from_config(&config);
        let warm = Parser::from_config(&config);
        assert_eq!(cold.table(), warm.table());
        assert_eq!(**warm.table(), ParseTable::build());
    }

    #[test]
    fn default_parser_is_shared() {
        assert!(std::ptr::eq(default_parser(), default_parser()));
    }
}
