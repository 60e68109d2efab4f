//! duplicate key merging
//!
//! A body or object may name the same key more than once. Nothing is overwritten: every value of a repeated key
//! is collected, in source order, into one [Value::List]. Keys that occur once keep their value as is.
//!
//! ```hcl
//! foo { a = 1 }
//! foo { a = 2 }
//! bar = 3
//! ```
//!
//! becomes `{"foo": [{"a": 1}, {"a": 2}], "bar": 3}`.
//!
//! Attributes and blocks are not distinguished here, `foo = 1` followed by `foo { a = 1 }` yields
//! `{"foo": [1, {"a": 1}]}`.
use crate::value::{Map, Value};
use indexmap::IndexMap;

/// Fold ordered `(key, value)` pairs into a map, collecting repeated keys into lists
///
/// Keys keep the order of their first occurrence.
pub fn merge_duplicates<I>(pairs: I) -> Map
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().push(value);
    }

    groups
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::List(values)
            };
            (key, value)
        })
        .collect()
}
