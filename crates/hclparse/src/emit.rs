//! canonical HCL output
//!
//! [to_hcl] writes a [Value] back as HCL text that parses to an equal value. Maps are written as attributes
//! with object expressions, never as blocks, so repeated keys and labels do not come back. Strings are always
//! quoted, heredocs are never produced.
//!
//! Infinite floats are written as `1e999` / `-1e999`, which parse back to infinity. NaN has no literal and is
//! written as `null`.
use crate::value::{Map, Value};
use std::fmt::Write;

const INDENT: usize = 2;

pub fn to_hcl(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Map(map) => write_body(&mut out, map, 0),
        other => {
            write_expr(&mut out, other, 0);
            out.push('\n');
        }
    }
    out
}

fn write_body(out: &mut String, map: &Map, indent: usize) {
    for (key, value) in map {
        pad(out, indent);
        write_key(out, key);
        out.push_str(" = ");
        write_expr(out, value, indent);
        out.push('\n');
    }
}

fn write_expr(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        Value::Int(value) => {
            let _ = write!(out, "{value}");
        }
        Value::Float(value) if value.is_finite() => {
            let _ = write!(out, "{value:?}");
        }
        Value::Float(value) if value.is_nan() => out.push_str("null"),
        Value::Float(value) => out.push_str(if *value > 0.0 { "1e999" } else { "-1e999" }),
        Value::String(value) => write_string(out, value),
        Value::List(list) if list.is_empty() => out.push_str("[]"),
        Value::List(list) => {
            out.push_str("[\n");
            for element in list {
                pad(out, indent + INDENT);
                write_expr(out, element, indent + INDENT);
                out.push_str(",\n");
            }
            pad(out, indent);
            out.push(']');
        }
        Value::Map(map) if map.is_empty() => out.push_str("{}"),
        Value::Map(map) => {
            out.push_str("{\n");
            write_body(out, map, indent + INDENT);
            pad(out, indent);
            out.push('}');
        }
    }
}

fn write_key(out: &mut String, key: &str) {
    if is_bare_key(key) {
        out.push_str(key);
    } else {
        write_string(out, key);
    }
}

/// Keys the lexer reads back as a single identifier
fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    let starts_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ident
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !matches!(key, "true" | "false" | "null")
}

fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn body_layout() {
        let value: Value = [
            ("name", Value::from("web")),
            ("port", Value::Int(8080)),
            ("ratio", Value::Float(0.5)),
            ("tags", Value::from(vec!["a", "b"])),
            ("empty", Value::List(vec![])),
            (
                "nested",
                [("enabled", Value::Bool(true)), ("x", Value::Null)]
                    .into_iter()
                    .collect(),
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            to_hcl(&value),
            r#"name = "web"
port = 8080
ratio = 0.5
tags = [
  "a",
  "b",
]
empty = []
nested = {
  enabled = true
  x = null
}
"#
        );
    }

    #[test]
    fn keys_are_quoted_when_needed() {
        let value: Value = [
            ("plain-key.v2", Value::Int(1)),
            ("with space", Value::Int(2)),
            ("true", Value::Int(3)),
            ("9lives", Value::Int(4)),
            ("", Value::Int(5)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            to_hcl(&value),
            "plain-key.v2 = 1\n\"with space\" = 2\n\"true\" = 3\n\"9lives\" = 4\n\"\" = 5\n"
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            to_hcl(&Value::from("q\"b\\n\nt\tc\u{1}é")),
            "\"q\\\"b\\\\n\\nt\\tc\\u0001é\"\n"
        );
    }

    #[test]
    fn floats_keep_a_float_form() {
        assert_eq!(to_hcl(&Value::Float(1.0)), "1.0\n");
        assert_eq!(to_hcl(&Value::Float(-2.5e300)), "-2.5e300\n");
        assert_eq!(to_hcl(&Value::Float(f64::INFINITY)), "1e999\n");
        assert_eq!(to_hcl(&Value::Float(f64::NEG_INFINITY)), "-1e999\n");
        assert_eq!(to_hcl(&Value::Float(f64::NAN)), "null\n");
    }

    #[test]
    fn wide_numbers_parse_back() {
        let value: Value = [
            ("u", Value::from(u64::MAX)),
            ("i", Value::Int(i128::MIN)),
            ("inf", Value::Float(f64::INFINITY)),
        ]
        .into_iter()
        .collect();
        assert_eq!(crate::parse(&to_hcl(&value)).unwrap(), value);
    }

    #[test]
    fn output_parses_back() {
        let source = "svc \"a\" { port = 1 }\nsvc \"b\" { port = 2 }\nmsg = \"hi\\nthere\"\n";
        let value = crate::parse(source).unwrap();
        assert_eq!(crate::parse(&to_hcl(&value)).unwrap(), value);
    }
}
