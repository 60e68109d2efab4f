//! parse tree to [Value]
//!
//! Blocks become nested single-key maps, `T L1 L2 { body }` turns into `{T: {L1: {L2: body}}}`, and every body
//! or object is folded through [merge_duplicates].
//!
//! Every literal the lexer accepts has a value. Integers too wide for [Value::Int] fall back to the nearest
//! [Value::Float] and float literals beyond the `f64` range become infinite.
use crate::ast::{Block, Body, Document, Expr, Literal, Scalar, Structure};
use crate::error::ParseError;
use crate::merge::merge_duplicates;
use crate::value::{Map, Value};

#[tracing::instrument(level = "trace", skip_all)]
pub fn transform(document: Document) -> Result<Value, ParseError> {
    match document {
        Document::Body(body) => transform_body(body).map(Value::Map),
        Document::List(list) => list
            .elements
            .into_iter()
            .map(transform_expr)
            .collect::<Result<_, _>>()
            .map(Value::List),
    }
}

fn transform_body(body: Body) -> Result<Map, ParseError> {
    let pairs = body
        .structures
        .into_iter()
        .map(|structure| -> Result<(String, Value), ParseError> {
            match structure {
                Structure::Attribute(attribute) => {
                    Ok((attribute.key.name, transform_expr(attribute.value)?))
                }
                Structure::Block(block) => transform_block(block),
            }
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(merge_duplicates(pairs))
}

fn transform_block(block: Block) -> Result<(String, Value), ParseError> {
    let mut value = Value::Map(transform_body(block.body)?);
    for label in block.labels.into_iter().rev() {
        value = Value::Map(Map::from([(label.name, value)]));
    }
    Ok((block.ident.name, value))
}

fn transform_expr(expr: Expr) -> Result<Value, ParseError> {
    match expr {
        Expr::Literal(literal) => transform_literal(literal),
        Expr::Object(object) => {
            let pairs = object
                .entries
                .into_iter()
                .map(|entry| -> Result<(String, Value), ParseError> {
                    Ok((entry.key.name, transform_expr(entry.value)?))
                })
                .collect::<Result<Vec<_>, ParseError>>()?;
            Ok(Value::Map(merge_duplicates(pairs)))
        }
        Expr::List(list) => list
            .elements
            .into_iter()
            .map(transform_expr)
            .collect::<Result<_, _>>()
            .map(Value::List),
    }
}

fn transform_literal(literal: Literal) -> Result<Value, ParseError> {
    Ok(match literal.scalar {
        Scalar::String(text) | Scalar::Heredoc(text) => Value::String(text),
        Scalar::Bool(value) => Value::Bool(value),
        Scalar::Null => Value::Null,
        Scalar::Number(text) => number(&text).map_err(|message| {
            ParseError::value(format!("{message} `{text}`"), literal.position)
        })?,
    })
}

/// Integer unless the literal has a fraction or exponent
fn number(text: &str) -> Result<Value, &'static str> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let int = i128::from_str_radix(hex, 16)
            .ok()
            .and_then(|magnitude| if negative { magnitude.checked_neg() } else { Some(magnitude) });
        if let Some(int) = int {
            return Ok(Value::Int(int));
        }

        let magnitude = hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0.0, |acc, digit| acc * 16.0 + f64::from(digit));
        return Ok(Value::Float(if negative { -magnitude } else { magnitude }));
    }

    if !digits.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        if let Ok(int) = text.trim_start_matches('+').parse::<i128>() {
            return Ok(Value::Int(int));
        }
    }

    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| "invalid number literal")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::automaton;
    use crate::table::ParseTable;
    use pretty_assertions::assert_eq;

    fn value(source: &str) -> Value {
        let document = automaton::parse(&ParseTable::build(), source).expect("must parse");
        transform(document).expect("must transform")
    }

    fn json(source: &str) -> serde_json::Value {
        serde_json::to_value(value(source)).unwrap()
    }

    #[test]
    fn scenario_attribute() {
        assert_eq!(json(r#"foo = "bar""#), serde_json::json!({"foo": "bar"}));
    }

    #[test]
    fn scenario_block() {
        assert_eq!(json("foo { bar = 1 }"), serde_json::json!({"foo": {"bar": 1}}));
    }

    #[test]
    fn scenario_repeated_blocks() {
        assert_eq!(
            json("foo { a = 1 }\nfoo { a = 2 }"),
            serde_json::json!({"foo": [{"a": 1}, {"a": 2}]})
        );
    }

    #[test]
    fn scenario_list() {
        assert_eq!(json("nums = [1, 2, 3]"), serde_json::json!({"nums": [1, 2, 3]}));
    }

    #[test]
    fn labels_nest() {
        assert_eq!(
            json(r#"resource "aws_instance" "web" { ami = "abc" }"#),
            serde_json::json!({"resource": {"aws_instance": {"web": {"ami": "abc"}}}})
        );
    }

    #[test]
    fn same_block_type_with_different_labels_merges_into_list() {
        assert_eq!(
            json("svc a { port = 1 }\nsvc b { port = 2 }"),
            serde_json::json!({"svc": [{"a": {"port": 1}}, {"b": {"port": 2}}]})
        );
    }

    #[test]
    fn attribute_and_block_share_a_key() {
        assert_eq!(
            json("k = 1\nk { x = true }"),
            serde_json::json!({"k": [1, {"x": true}]})
        );
    }

    #[test]
    fn object_duplicates_merge() {
        assert_eq!(
            json("o = { a = 1, a = 2, b = 3 }"),
            serde_json::json!({"o": {"a": [1, 2], "b": 3}})
        );
    }

    #[test]
    fn key_order_follows_first_occurrence() {
        let value = value("b = 1\na = 2\nb = 3");
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn numbers() {
        let value = value("a = 1\nb = 1.0\nc = 1e3\nd = -7\ne = 0x1F\nf = +2\ng = -0x10");
        assert_eq!(value.get("a"), Some(&Value::Int(1)));
        assert_eq!(value.get("b"), Some(&Value::Float(1.0)));
        assert_eq!(value.get("c"), Some(&Value::Float(1000.0)));
        assert_eq!(value.get("d"), Some(&Value::Int(-7)));
        assert_eq!(value.get("e"), Some(&Value::Int(31)));
        assert_eq!(value.get("f"), Some(&Value::Int(2)));
        assert_eq!(value.get("g"), Some(&Value::Int(-16)));
    }

    #[test]
    fn integer_bounds() {
        let value = value("max = 9223372036854775807\nmin = -9223372036854775808");
        assert_eq!(value.get("max"), Some(&Value::from(i64::MAX)));
        assert_eq!(value.get("min"), Some(&Value::from(i64::MIN)));
    }

    #[test]
    fn wide_integers_stay_exact() {
        let value = value(
            "u = 18446744073709551615\nneg = -9223372036854775809\nhex = 0xFFFFFFFFFFFFFFFFFF\ntop = 170141183460469231731687303715884105727",
        );
        assert_eq!(value.get("u"), Some(&Value::from(u64::MAX)));
        assert_eq!(value.get("neg"), Some(&Value::Int(-9223372036854775809)));
        assert_eq!(value.get("hex"), Some(&Value::Int((1 << 72) - 1)));
        assert_eq!(value.get("top"), Some(&Value::Int(i128::MAX)));
    }

    #[test]
    fn out_of_range_numbers_become_floats() {
        let value = value(
            "int = 170141183460469231731687303715884105728\nneg = -200000000000000000000000000000000000000\nhex = 0x1000000000000000000000000000000000\nbig = 1e999\nsmall = -1e999",
        );
        assert_eq!(value.get("int"), Some(&Value::Float(2f64.powi(127))));
        assert_eq!(value.get("neg"), Some(&Value::Float(-2e38)));
        assert_eq!(value.get("hex"), Some(&Value::Float(2f64.powi(132))));
        assert_eq!(value.get("big"), Some(&Value::Float(f64::INFINITY)));
        assert_eq!(value.get("small"), Some(&Value::Float(f64::NEG_INFINITY)));
    }

    #[test]
    fn negative_zero() {
        let value = value("int = -0\nfloat = -0.0");
        assert_eq!(value.get("int"), Some(&Value::Int(0)));
        match value.get("float") {
            Some(Value::Float(zero)) => assert!(*zero == 0.0 && zero.is_sign_negative()),
            other => panic!("expected a float, got {other:?}"),
        }
    }

    #[test]
    fn scalars() {
        assert_eq!(
            json("t = true\nf = false\nn = null\ns = \"a\\tb\"\nh = <<EOF\nline\nEOF\n"),
            serde_json::json!({"t": true, "f": false, "n": null, "s": "a\tb", "h": "line\n"})
        );
    }

    #[test]
    fn top_level_list() {
        assert_eq!(json("[1, {\"a\": 2}]"), serde_json::json!([1, {"a": 2}]));
    }

    #[test]
    fn empty_block_is_empty_map() {
        assert_eq!(json("a {}"), serde_json::json!({"a": {}}));
    }
}
