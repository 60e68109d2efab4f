//! value representation
//!
//! The parser output model contains the following data types
//! - null
//! - boolean (true/false)
//! - integer (signed, i128, wide enough for every `i64` and `u64`)
//! - float (f64)
//! - string (utf-8)
//! - list (ordered sequence of values)
//! - map (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! Additionally:
//! - `1` and `1.0` are different values: [Value::Int] and [Value::Float] never compare equal
//! - integer literals beyond the [Value::Int] range become a [Value::Float]
//! - a map holds every key once, repeated keys in the source have already been merged into a [Value::List]
//!
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

pub type Map = IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    /// Look up a key of a [Value::Map]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl std::str::FromStr for Value {
    type Err = crate::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse(s)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => {
                // most formats stop at 64 bits
                if let Ok(value) = i64::try_from(*value) {
                    serializer.serialize_i64(value)
                } else if let Ok(value) = u64::try_from(*value) {
                    serializer.serialize_u64(value)
                } else {
                    serializer.serialize_f64(*value as f64)
                }
            }
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Map(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_and_float_differ() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let value: Value = [
            ("z", Value::Int(1)),
            ("a", Value::List(vec![Value::Null, Value::Float(0.5)])),
            ("m", Value::from("text")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"z":1,"a":[null,0.5],"m":"text"}"#
        );
    }

    #[test]
    fn wide_integers_serialize_like_json() {
        let value = Value::from(vec![
            Value::Int(-1),
            Value::from(u64::MAX),
            Value::Int(1i128 << 100),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            serde_json::json!([-1, u64::MAX, 2f64.powi(100)])
        );
    }

    #[test]
    fn accessors() {
        let value: Value = [("list", Value::from(vec![true, false]))].into_iter().collect();
        assert_eq!(value.get("list").and_then(Value::as_list).map(<[_]>::len), Some(2));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert_eq!(Value::Int(3).get("anything"), None);
    }
}
