//! the fixed grammar
//!
//! ```text
//! Start     -> Document
//! Document  -> Body | Object | List
//! Body      -> ε | Body Structure
//! Structure -> Key Assign Expr | Key Assign Expr ","          (attribute)
//!            | Key Labels "{" Body "}"                        (block)
//! Labels    -> ε | Labels Key
//! Key       -> IDENT | STRING
//! Assign    -> "=" | ":"
//! Expr      -> Literal | Object | List
//! Literal   -> STRING | HEREDOC | NUMBER | true | false | null
//! Object    -> "{" Entries "}"
//! Entries   -> ε | Entries Entry
//! Entry     -> Key Assign Expr | Key Assign Expr ","
//! List      -> "[" Elements "]"
//! Elements  -> ε | Elements Expr | Elements Expr ","
//! ```
//!
//! `Document -> Object | List` is what makes plain JSON documents valid input.
//!
//! Every production is a [Rule]. Its position in [Rule::ALL] is the index stored in the parse tables, so the
//! [Fingerprint] covers the rule order as well as the rules themselves.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bumped whenever the table layout or construction changes in a way the rules do not capture
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terminal {
    Ident,
    String,
    Heredoc,
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

impl Terminal {
    pub const ALL: [Terminal; 15] = [
        Terminal::Ident,
        Terminal::String,
        Terminal::Heredoc,
        Terminal::Number,
        Terminal::True,
        Terminal::False,
        Terminal::Null,
        Terminal::LeftBrace,
        Terminal::RightBrace,
        Terminal::LeftBracket,
        Terminal::RightBracket,
        Terminal::Equals,
        Terminal::Colon,
        Terminal::Comma,
        Terminal::Eof,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in "expected one of" diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            Terminal::Ident => "identifier",
            Terminal::String => "string",
            Terminal::Heredoc => "heredoc",
            Terminal::Number => "number",
            Terminal::True => "`true`",
            Terminal::False => "`false`",
            Terminal::Null => "`null`",
            Terminal::LeftBrace => "`{`",
            Terminal::RightBrace => "`}`",
            Terminal::LeftBracket => "`[`",
            Terminal::RightBracket => "`]`",
            Terminal::Equals => "`=`",
            Terminal::Colon => "`:`",
            Terminal::Comma => "`,`",
            Terminal::Eof => "end of input",
        }
    }
}

impl std::fmt::Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Terminal::Ident => "IDENT",
            Terminal::String => "STRING",
            Terminal::Heredoc => "HEREDOC",
            Terminal::Number => "NUMBER",
            Terminal::True => "true",
            Terminal::False => "false",
            Terminal::Null => "null",
            Terminal::LeftBrace => "\"{\"",
            Terminal::RightBrace => "\"}\"",
            Terminal::LeftBracket => "\"[\"",
            Terminal::RightBracket => "\"]\"",
            Terminal::Equals => "\"=\"",
            Terminal::Colon => "\":\"",
            Terminal::Comma => "\",\"",
            Terminal::Eof => "$",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NonTerminal {
    Start,
    Document,
    Body,
    Structure,
    Labels,
    Key,
    Assign,
    Expr,
    Literal,
    Object,
    Entries,
    Entry,
    List,
    Elements,
}

impl NonTerminal {
    pub const ALL: [NonTerminal; 14] = [
        NonTerminal::Start,
        NonTerminal::Document,
        NonTerminal::Body,
        NonTerminal::Structure,
        NonTerminal::Labels,
        NonTerminal::Key,
        NonTerminal::Assign,
        NonTerminal::Expr,
        NonTerminal::Literal,
        NonTerminal::Object,
        NonTerminal::Entries,
        NonTerminal::Entry,
        NonTerminal::List,
        NonTerminal::Elements,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    T(Terminal),
    N(NonTerminal),
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::T(terminal) => terminal.fmt(f),
            Symbol::N(non_terminal) => non_terminal.fmt(f),
        }
    }
}

/// One production of the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    Accept,
    DocumentBody,
    DocumentObject,
    DocumentList,
    BodyEmpty,
    BodyAppend,
    Attribute,
    AttributeComma,
    Block,
    LabelsEmpty,
    LabelsAppend,
    KeyIdent,
    KeyString,
    AssignEquals,
    AssignColon,
    ExprLiteral,
    ExprObject,
    ExprList,
    LiteralString,
    LiteralHeredoc,
    LiteralNumber,
    LiteralTrue,
    LiteralFalse,
    LiteralNull,
    Object,
    EntriesEmpty,
    EntriesAppend,
    Entry,
    EntryComma,
    List,
    ElementsEmpty,
    ElementsAppend,
    ElementsAppendComma,
}

impl Rule {
    pub const ALL: [Rule; 33] = [
        Rule::Accept,
        Rule::DocumentBody,
        Rule::DocumentObject,
        Rule::DocumentList,
        Rule::BodyEmpty,
        Rule::BodyAppend,
        Rule::Attribute,
        Rule::AttributeComma,
        Rule::Block,
        Rule::LabelsEmpty,
        Rule::LabelsAppend,
        Rule::KeyIdent,
        Rule::KeyString,
        Rule::AssignEquals,
        Rule::AssignColon,
        Rule::ExprLiteral,
        Rule::ExprObject,
        Rule::ExprList,
        Rule::LiteralString,
        Rule::LiteralHeredoc,
        Rule::LiteralNumber,
        Rule::LiteralTrue,
        Rule::LiteralFalse,
        Rule::LiteralNull,
        Rule::Object,
        Rule::EntriesEmpty,
        Rule::EntriesAppend,
        Rule::Entry,
        Rule::EntryComma,
        Rule::List,
        Rule::ElementsEmpty,
        Rule::ElementsAppend,
        Rule::ElementsAppendComma,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Rule> {
        Rule::ALL.get(index).copied()
    }

    pub fn lhs(self) -> NonTerminal {
        use NonTerminal as N;
        match self {
            Rule::Accept => N::Start,
            Rule::DocumentBody | Rule::DocumentObject | Rule::DocumentList => N::Document,
            Rule::BodyEmpty | Rule::BodyAppend => N::Body,
            Rule::Attribute | Rule::AttributeComma | Rule::Block => N::Structure,
            Rule::LabelsEmpty | Rule::LabelsAppend => N::Labels,
            Rule::KeyIdent | Rule::KeyString => N::Key,
            Rule::AssignEquals | Rule::AssignColon => N::Assign,
            Rule::ExprLiteral | Rule::ExprObject | Rule::ExprList => N::Expr,
            Rule::LiteralString
            | Rule::LiteralHeredoc
            | Rule::LiteralNumber
            | Rule::LiteralTrue
            | Rule::LiteralFalse
            | Rule::LiteralNull => N::Literal,
            Rule::Object => N::Object,
            Rule::EntriesEmpty | Rule::EntriesAppend => N::Entries,
            Rule::Entry | Rule::EntryComma => N::Entry,
            Rule::List => N::List,
            Rule::ElementsEmpty | Rule::ElementsAppend | Rule::ElementsAppendComma => N::Elements,
        }
    }

    pub fn rhs(self) -> &'static [Symbol] {
        use NonTerminal as N;
        use Symbol::{N as Nt, T};
        use Terminal as Tm;
        match self {
            Rule::Accept => &[Nt(N::Document)],
            Rule::DocumentBody => &[Nt(N::Body)],
            Rule::DocumentObject => &[Nt(N::Object)],
            Rule::DocumentList => &[Nt(N::List)],
            Rule::BodyEmpty => &[],
            Rule::BodyAppend => &[Nt(N::Body), Nt(N::Structure)],
            Rule::Attribute => &[Nt(N::Key), Nt(N::Assign), Nt(N::Expr)],
            Rule::AttributeComma => &[Nt(N::Key), Nt(N::Assign), Nt(N::Expr), T(Tm::Comma)],
            Rule::Block => &[
                Nt(N::Key),
                Nt(N::Labels),
                T(Tm::LeftBrace),
                Nt(N::Body),
                T(Tm::RightBrace),
            ],
            Rule::LabelsEmpty => &[],
            Rule::LabelsAppend => &[Nt(N::Labels), Nt(N::Key)],
            Rule::KeyIdent => &[T(Tm::Ident)],
            Rule::KeyString => &[T(Tm::String)],
            Rule::AssignEquals => &[T(Tm::Equals)],
            Rule::AssignColon => &[T(Tm::Colon)],
            Rule::ExprLiteral => &[Nt(N::Literal)],
            Rule::ExprObject => &[Nt(N::Object)],
            Rule::ExprList => &[Nt(N::List)],
            Rule::LiteralString => &[T(Tm::String)],
            Rule::LiteralHeredoc => &[T(Tm::Heredoc)],
            Rule::LiteralNumber => &[T(Tm::Number)],
            Rule::LiteralTrue => &[T(Tm::True)],
            Rule::LiteralFalse => &[T(Tm::False)],
            Rule::LiteralNull => &[T(Tm::Null)],
            Rule::Object => &[T(Tm::LeftBrace), Nt(N::Entries), T(Tm::RightBrace)],
            Rule::EntriesEmpty => &[],
            Rule::EntriesAppend => &[Nt(N::Entries), Nt(N::Entry)],
            Rule::Entry => &[Nt(N::Key), Nt(N::Assign), Nt(N::Expr)],
            Rule::EntryComma => &[Nt(N::Key), Nt(N::Assign), Nt(N::Expr), T(Tm::Comma)],
            Rule::List => &[T(Tm::LeftBracket), Nt(N::Elements), T(Tm::RightBracket)],
            Rule::ElementsEmpty => &[],
            Rule::ElementsAppend => &[Nt(N::Elements), Nt(N::Expr)],
            Rule::ElementsAppendComma => &[Nt(N::Elements), Nt(N::Expr), T(Tm::Comma)],
        }
    }

    /// All rules producing `non_terminal`, in index order
    pub fn producing(non_terminal: NonTerminal) -> impl Iterator<Item = Rule> {
        Rule::ALL
            .into_iter()
            .filter(move |rule| rule.lhs() == non_terminal)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.lhs())?;
        if self.rhs().is_empty() {
            return f.write_str(" ε");
        }
        for symbol in self.rhs() {
            write!(f, " {symbol}")?;
        }
        Ok(())
    }
}

/// SHA-256 over [FORMAT_VERSION] and the textual form of every rule in index order
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_grammar() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(FORMAT_VERSION.to_le_bytes());
        for rule in Rule::ALL {
            hasher.update(rule.to_string().as_bytes());
            hasher.update(b"\n");
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
