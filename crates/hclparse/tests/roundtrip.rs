//! Canonical HCL output parses back to the value it was written from
use hclparse::emit::to_hcl;
use hclparse::Value;
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<i128>().prop_map(Value::Int),
        (-4_000_000i64..4_000_000).prop_map(|n| Value::Float(n as f64 / 4.0)),
        any::<String>().prop_map(Value::String),
        "[a-z_][a-z0-9_.-]{0,8}".prop_map(Value::String),
    ]
}

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_.-]{0,8}",
        any::<String>(),
        Just("true".to_string()),
        Just("null".to_string()),
    ]
}

fn container(inner: impl Strategy<Value = Value> + Clone) -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
        prop::collection::btree_map(key(), inner, 0..6)
            .prop_map(|map| Value::Map(map.into_iter().collect())),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    container(leaf().prop_recursive(3, 48, 6, |inner| container(inner)))
}

proptest! {
    #[test]
    fn canonical_output_round_trips(value in document()) {
        let text = to_hcl(&value);
        let parsed = hclparse::parse(&text)
            .map_err(|err| TestCaseError::fail(format!("{}\n{text}", err.render())))?;
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn canonical_output_is_stable(value in document()) {
        let text = to_hcl(&value);
        let parsed = hclparse::parse(&text)
            .map_err(|err| TestCaseError::fail(err.render()))?;
        prop_assert_eq!(to_hcl(&parsed), text);
    }
}
