//! parse tree
//!
//! Produced by [crate::automaton] and consumed by [crate::transform]. Nodes own their data and carry the
//! position they originate from.
use crate::lexer::Position;

/// Root of a parse tree
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// block-style document, also a top-level JSON object
    Body(Body),
    /// top-level JSON array
    List(ListExpr),
}

/// Ordered attributes and blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub structures: Vec<Structure>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Attribute(Attribute),
    Block(Block),
}

impl Structure {
    pub fn position(&self) -> Position {
        match self {
            Structure::Attribute(attribute) => attribute.position,
            Structure::Block(block) => block.position,
        }
    }
}

/// `key = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: Key,
    pub value: Expr,
    pub position: Position,
}

/// `ident "label" label { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub ident: Key,
    pub labels: Vec<Key>,
    pub body: Body,
    pub position: Position,
}

/// Bare identifier or quoted string used as a name
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Key {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Object(ObjectExpr),
    List(ListExpr),
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Literal(literal) => literal.position,
            Expr::Object(object) => object.position,
            Expr::List(list) => list.position,
        }
    }
}

/// `{ key = value, ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub entries: Vec<Attribute>,
    pub position: Position,
}

/// `[ value, ... ]`
#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr {
    pub elements: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Literal {
    pub scalar: Scalar,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// decoded quoted string
    String(String),
    /// decoded heredoc body
    Heredoc(String),
    /// number exactly as written
    Number(String),
    Bool(bool),
    Null,
}
