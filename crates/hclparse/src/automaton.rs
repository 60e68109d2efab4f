//! table-driven LR driver
//!
//! Pulls tokens from the [Lexer] on demand and runs them through a [ParseTable]. Reductions build the parse
//! tree bottom-up. The first token without an action ends the parse with a syntax error listing every
//! terminal the current state would have accepted.
//!
//! Nesting is capped at [MAX_DEPTH] levels of the resulting value. Every `{` or `[` opens one level, a block
//! additionally opens one per label.
use crate::ast::{
    Attribute, Block, Body, Document, Expr, Key, ListExpr, Literal, ObjectExpr, Scalar, Structure,
};
use crate::error::ParseError;
use crate::grammar::Rule;
use crate::lexer::{Lexer, Position, Token, TokenKind};
use crate::table::{Action, ParseTable};

pub const MAX_DEPTH: usize = 128;

/// Value stack entry, one per grammar symbol
#[derive(Debug)]
enum Frame<'a> {
    Token(Token<'a>),
    Document(Document),
    Body(Body),
    Structure(Structure),
    Labels(Vec<Key>),
    Key(Key),
    Assign,
    Expr(Expr),
    Literal(Literal),
    Object(ObjectExpr),
    Entries(Vec<Attribute>),
    Entry(Attribute),
    List(ListExpr),
    Elements(Vec<Expr>),
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn parse(table: &ParseTable, source: &str) -> Result<Document, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut states: Vec<u32> = vec![0];
    let mut frames: Vec<(Frame, Position)> = Vec::new();
    // value levels opened by each unclosed `{` / `[`
    let mut open: Vec<usize> = Vec::new();
    let mut depth = 0;
    let mut lookahead = lexer.next_token()?;

    loop {
        let state = top(&states);
        match table.action(state, lookahead.kind.terminal()) {
            Action::Shift(next) => {
                tracing::trace!(state, next, token = %lookahead.describe(), "shift");
                match lookahead.kind {
                    TokenKind::LeftBrace | TokenKind::LeftBracket => {
                        let levels = match frames.last() {
                            Some((Frame::Labels(labels), _)) => 1 + labels.len(),
                            _ => 1,
                        };
                        depth += levels;
                        if depth > MAX_DEPTH {
                            return Err(ParseError::syntax(
                                format!("nesting deeper than {MAX_DEPTH} levels"),
                                lookahead.position,
                                vec![],
                            ));
                        }
                        open.push(levels);
                    }
                    TokenKind::RightBrace | TokenKind::RightBracket => {
                        depth -= open.pop().unwrap_or(0);
                    }
                    _ => {}
                }
                let following = lexer.next_token()?;
                let token = std::mem::replace(&mut lookahead, following);
                let position = token.position;
                frames.push((Frame::Token(token), position));
                states.push(next);
            }
            Action::Reduce(index) => {
                let rule = Rule::from_index(index as usize)
                    .ok_or_else(|| out_of_sync(lookahead.position))?;
                let arity = rule.rhs().len();
                if frames.len() < arity {
                    return Err(out_of_sync(lookahead.position));
                }

                let children = frames.split_off(frames.len() - arity);
                states.truncate(states.len() - arity);
                let position = children
                    .first()
                    .map_or(lookahead.position, |(_, position)| *position);

                let frame = reduce(rule, children.into_iter().map(|(frame, _)| frame), position)
                    .ok_or_else(|| out_of_sync(position))?;
                let next = table
                    .goto(top(&states), rule.lhs())
                    .ok_or_else(|| out_of_sync(position))?;

                tracing::trace!(%rule, next, "reduce");
                frames.push((frame, position));
                states.push(next);
            }
            Action::Accept => {
                return match frames.pop() {
                    Some((Frame::Document(document), _)) => Ok(document),
                    _ => Err(out_of_sync(lookahead.position)),
                };
            }
            Action::Error => return Err(unexpected(table, state, &lookahead)),
        }
    }
}

fn top(states: &[u32]) -> u32 {
    states.last().copied().unwrap_or(0)
}

fn unexpected(table: &ParseTable, state: u32, token: &Token) -> ParseError {
    let expected: Vec<String> = table
        .expected(state)
        .into_iter()
        .map(|terminal| terminal.describe().to_string())
        .collect();

    let message = match expected.as_slice() {
        [] => format!("unexpected {}", token.describe()),
        [single] => format!("unexpected {}, expected {single}", token.describe()),
        many => format!(
            "unexpected {}, expected one of {}",
            token.describe(),
            many.join(", ")
        ),
    };

    ParseError::syntax(message, token.position, expected)
}

/// The table does not fit the grammar compiled into this binary
fn out_of_sync(position: Position) -> ParseError {
    ParseError::syntax("parse table does not match the grammar", position, vec![])
}

/// Pop the next child frame of the given variant or bail out
macro_rules! take {
    ($children:ident, $variant:ident) => {
        match $children.next() {
            Some(Frame::$variant(value)) => value,
            _ => return None,
        }
    };
}

fn reduce<'a>(
    rule: Rule,
    mut children: impl Iterator<Item = Frame<'a>>,
    position: Position,
) -> Option<Frame<'a>> {
    let frame = match rule {
        Rule::Accept => return None,
        Rule::DocumentBody => Frame::Document(Document::Body(take!(children, Body))),
        Rule::DocumentObject => {
            let object = take!(children, Object);
            Frame::Document(Document::Body(Body {
                structures: object
                    .entries
                    .into_iter()
                    .map(Structure::Attribute)
                    .collect(),
                position: object.position,
            }))
        }
        Rule::DocumentList => Frame::Document(Document::List(take!(children, List))),
        Rule::BodyEmpty => Frame::Body(Body {
            structures: Vec::new(),
            position,
        }),
        Rule::BodyAppend => {
            let mut body = take!(children, Body);
            body.structures.push(take!(children, Structure));
            Frame::Body(body)
        }
        Rule::Attribute | Rule::AttributeComma => {
            let key = take!(children, Key);
            children.next()?;
            let value = take!(children, Expr);
            Frame::Structure(Structure::Attribute(Attribute {
                key,
                value,
                position,
            }))
        }
        Rule::Block => {
            let ident = take!(children, Key);
            let labels = take!(children, Labels);
            children.next()?;
            let body = take!(children, Body);
            Frame::Structure(Structure::Block(Block {
                ident,
                labels,
                body,
                position,
            }))
        }
        Rule::LabelsEmpty => Frame::Labels(Vec::new()),
        Rule::LabelsAppend => {
            let mut labels = take!(children, Labels);
            labels.push(take!(children, Key));
            Frame::Labels(labels)
        }
        Rule::KeyIdent => {
            let token = take!(children, Token);
            Frame::Key(Key::new(token.lexeme.to_string(), token.position))
        }
        Rule::KeyString => {
            let token = take!(children, Token);
            let TokenKind::String(name) = token.kind else {
                return None;
            };
            Frame::Key(Key::new(name, token.position))
        }
        Rule::AssignEquals | Rule::AssignColon => Frame::Assign,
        Rule::ExprLiteral => Frame::Expr(Expr::Literal(take!(children, Literal))),
        Rule::ExprObject => Frame::Expr(Expr::Object(take!(children, Object))),
        Rule::ExprList => Frame::Expr(Expr::List(take!(children, List))),
        Rule::LiteralString
        | Rule::LiteralHeredoc
        | Rule::LiteralNumber
        | Rule::LiteralTrue
        | Rule::LiteralFalse
        | Rule::LiteralNull => {
            let token = take!(children, Token);
            let scalar = match token.kind {
                TokenKind::String(text) => Scalar::String(text),
                TokenKind::Heredoc(text) => Scalar::Heredoc(text),
                TokenKind::Number => Scalar::Number(token.lexeme.to_string()),
                TokenKind::True => Scalar::Bool(true),
                TokenKind::False => Scalar::Bool(false),
                TokenKind::Null => Scalar::Null,
                _ => return None,
            };
            Frame::Literal(Literal::new(scalar, token.position))
        }
        Rule::Object => {
            children.next()?;
            let entries = take!(children, Entries);
            Frame::Object(ObjectExpr { entries, position })
        }
        Rule::EntriesEmpty => Frame::Entries(Vec::new()),
        Rule::EntriesAppend => {
            let mut entries = take!(children, Entries);
            entries.push(take!(children, Entry));
            Frame::Entries(entries)
        }
        Rule::Entry | Rule::EntryComma => {
            let key = take!(children, Key);
            children.next()?;
            let value = take!(children, Expr);
            Frame::Entry(Attribute {
                key,
                value,
                position,
            })
        }
        Rule::List => {
            children.next()?;
            let elements = take!(children, Elements);
            Frame::List(ListExpr { elements, position })
        }
        Rule::ElementsEmpty => Frame::Elements(Vec::new()),
        Rule::ElementsAppend | Rule::ElementsAppendComma => {
            let mut elements = take!(children, Elements);
            elements.push(take!(children, Expr));
            Frame::Elements(elements)
        }
    };

    Some(frame)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn tree(source: &str) -> Document {
        parse(&ParseTable::build(), source).expect("must parse")
    }

    fn syntax_error(source: &str) -> ParseError {
        let error = parse(&ParseTable::build(), source).expect_err("must fail");
        assert_eq!(error.kind, ErrorKind::Syntax);
        error
    }

    fn body(document: Document) -> Body {
        match document {
            Document::Body(body) => body,
            Document::List(_) => panic!("expected a body"),
        }
    }

    #[test]
    fn empty_input_is_empty_body() {
        let body = body(tree("  # nothing\n"));
        assert!(body.structures.is_empty());
    }

    #[test]
    fn attribute() {
        let body = body(tree("foo = \"bar\""));
        assert_eq!(
            body.structures,
            vec![Structure::Attribute(Attribute {
                key: Key::new("foo".into(), Position::new(1, 1, 0)),
                value: Expr::Literal(Literal::new(
                    Scalar::String("bar".into()),
                    Position::new(1, 7, 6)
                )),
                position: Position::new(1, 1, 0),
            })]
        );
    }

    #[test]
    fn block_with_labels() {
        let body = body(tree("resource \"aws\" web {\n  count = 2\n}"));
        let [Structure::Block(block)] = body.structures.as_slice() else {
            panic!("expected one block");
        };
        assert_eq!(block.ident.name, "resource");
        assert_eq!(
            block.labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["aws", "web"]
        );
        assert_eq!(block.body.structures.len(), 1);
        assert_eq!(block.body.structures[0].position(), Position::new(2, 3, 23));
    }

    #[test]
    fn optional_commas() {
        let body = body(tree("a = [1 2, 3,]\nb = { x = 1, y = 2 z = 3 },"));
        let Structure::Attribute(list) = &body.structures[0] else {
            panic!("expected attribute");
        };
        let Expr::List(list) = &list.value else {
            panic!("expected list");
        };
        assert_eq!(list.elements.len(), 3);

        let Structure::Attribute(object) = &body.structures[1] else {
            panic!("expected attribute");
        };
        let Expr::Object(object) = &object.value else {
            panic!("expected object");
        };
        assert_eq!(object.entries.len(), 3);
    }

    #[test]
    fn json_object_document() {
        let body = body(tree(r#"{"a": 1, "b": {"c": [true, null]}}"#));
        assert_eq!(body.structures.len(), 2);
        assert!(matches!(body.structures[0], Structure::Attribute(_)));
    }

    #[test]
    fn json_array_document() {
        let Document::List(list) = tree(r#"[{"a": 1}, "b"]"#) else {
            panic!("expected a list document");
        };
        assert_eq!(list.elements.len(), 2);
    }

    #[test]
    fn missing_value() {
        let error = syntax_error("foo = ");
        assert_eq!((error.line, error.column), (1, 6));
        assert_eq!(
            error.message,
            "unexpected end of input, expected one of string, heredoc, number, `true`, `false`, `null`, `{`, `[`"
        );
    }

    #[test]
    fn unexpected_closing_brace() {
        let error = syntax_error("a = 1 }");
        assert_eq!((error.line, error.column), (1, 7));
        assert_eq!(
            error.expected,
            vec!["identifier", "string", "`,`", "end of input"]
        );
    }

    #[test]
    fn block_without_body() {
        let error = syntax_error("foo bar");
        assert_eq!((error.line, error.column), (1, 8));
        assert_eq!(
            error.message,
            "unexpected end of input, expected one of identifier, string, `{`"
        );
    }

    #[test]
    fn unclosed_block() {
        let error = syntax_error("foo {\n  a = 1\n");
        assert_eq!((error.line, error.column), (2, 8));
        assert_eq!(
            error.expected,
            vec!["identifier", "string", "`}`", "`,`"]
        );
    }

    #[test]
    fn scalar_document_is_rejected() {
        let error = syntax_error("42");
        assert_eq!(error.message.split(',').next(), Some("unexpected `42`"));
    }

    #[test]
    fn lex_errors_pass_through() {
        let error = parse(&ParseTable::build(), "a = \"open").expect_err("must fail");
        assert_eq!(error.kind, ErrorKind::Lex);
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let source = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(matches!(tree(&source), Document::List(_)));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let source = format!("a = {}{}", "[".repeat(100_000), "]".repeat(100_000));
        let error = syntax_error(&source);
        assert_eq!(error.message, "nesting deeper than 128 levels");
        assert_eq!((error.line, error.column), (1, 5 + MAX_DEPTH));
    }

    #[test]
    fn labels_count_towards_nesting() {
        let labels = "l ".repeat(MAX_DEPTH);
        let error = syntax_error(&format!("block {labels}{{}}"));
        assert_eq!(error.message, "nesting deeper than 128 levels");

        let labels = "l ".repeat(MAX_DEPTH - 1);
        assert!(parse(&ParseTable::build(), &format!("block {labels}{{}}")).is_ok());
    }

    #[test]
    fn closed_brackets_release_their_levels() {
        let source = "a = [[]]\n".repeat(MAX_DEPTH * 2);
        assert!(parse(&ParseTable::build(), &source).is_ok());
    }
}
