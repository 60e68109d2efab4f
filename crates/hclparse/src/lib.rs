//! # hclparse - HCL to native values
//!
//! Parses HCL (a human friendly superset of JSON) into a [Value]: maps, lists, strings, numbers, booleans and
//! null. Nothing is evaluated, `${...}` stays literal text.
//!
//! ```
//! let value = hclparse::parse(r#"
//!     region = "eu-west-1"
//!
//!     service "web" {
//!         port = 8080
//!     }
//! "#).unwrap();
//!
//! assert_eq!(
//!     serde_json::to_string(&value).unwrap(),
//!     r#"{"region":"eu-west-1","service":{"web":{"port":8080}}}"#
//! );
//! ```
//!
//! ## Introduction for developers
//!
//! ### HCL Terms
//!
//! In hcl terms...
//! - a file gets parsed as a `body`
//! - ...which is just a list of `structures`
//! - ...where there are two kinds:
//!   - `attribute`: a "key = value" pair
//!   - or `block`:
//!     - 1 `identifier`
//!     - followed by 0 or more `labels`
//!     - and a `body` enclosed in `{` and `}`
//!
//! A document may also be a plain JSON object or array.
//!
//! ### Pipeline
//!
//! 1. [lexer::Lexer] turns text into positioned tokens. Comments are dropped, strings and heredocs are decoded.
//! 2. [automaton::parse] drives an LR(1) [table::ParseTable] over the tokens and builds a parse tree ([ast]).
//!    The table is generated from [grammar] once per process, or loaded from the [cache].
//! 3. [transform::transform] turns the tree into a [Value]: blocks become nested maps and repeated keys are
//!    collected into lists ([merge]).
//!
//! The first error of any stage ends the parse with a [ParseError].
//!
//! ### Output
//!
//! [Value] implements [serde::Serialize]. [emit::to_hcl] writes a value back as canonical HCL.
//!
pub mod ast;
pub mod automaton;
pub mod cache;
pub mod config;
pub mod emit;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod merge;
pub mod parser;
pub mod table;
pub mod transform;
pub mod value;

pub use config::{CacheMode, ParserConfig};
pub use error::{ErrorKind, ParseError};
pub use parser::{default_parser, Parser};
pub use table::ParseTable;
pub use value::Value;

/// Parse `text` with the process-wide [default_parser]
pub fn parse(text: &str) -> Result<Value, ParseError> {
    default_parser().parse(text)
}

/// Utility macro to parse text into a [Value]
///
/// ```
/// # use hclparse::{hcl, Value};
/// let value = hcl!("attribute = 42");
/// assert_eq!(value.get("attribute"), Some(&Value::Int(42)));
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use hclparse::hcl;
/// hcl!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! hcl {
    { $expr:expr } => {
        $crate::parse($expr).expect("text must parse")
    };
}
