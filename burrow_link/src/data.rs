use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single table row: a mapping of field name to value. Records are built
/// ad hoc per call; the store imposes no schema on them.
pub type Record = HashMap<String, Data>;

static NULL: Data = Data::Null;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),

    Array(Vec<Data>),
    Map(HashMap<String, Data>),
}

impl Data {
    /// Look up a property of this value. Indexes arrays by parsing the
    /// property as a number. Anything that does not resolve is Null.
    pub fn get_property(&self, property: &str) -> &Self {
        match self {
            Data::Array(arr) => match property.parse::<usize>() {
                Ok(index) => match arr.get(index) {
                    Some(elem) => elem,
                    None => &NULL,
                },
                Err(_) => &NULL,
            },
            Data::Map(map) => match map.get(property) {
                Some(elem) => elem,
                None => &NULL,
            },
            _ => &NULL,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Data::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Data::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Data>> {
        match self {
            Data::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Null => write!(f, "<null>"),
            Data::Bool(b) => write!(f, "{}", b),
            Data::Int(i) => write!(f, "{}", i),
            Data::Float(x) => write!(f, "{}", x),
            Data::String(s) => write!(f, "{}", s),
            Data::Array(a) => write!(f, "{:?}", a),
            Data::Map(m) => write!(f, "{:?}", m),
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Bool(b)
    }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self {
        Data::Int(i)
    }
}

impl From<i32> for Data {
    fn from(i: i32) -> Self {
        Data::Int(i as i64)
    }
}

impl From<f64> for Data {
    fn from(x: f64) -> Self {
        Data::Float(x)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::String(s.to_owned())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::String(s)
    }
}

impl From<Vec<Data>> for Data {
    fn from(v: Vec<Data>) -> Self {
        Data::Array(v)
    }
}

impl From<Record> for Data {
    fn from(r: Record) -> Self {
        Data::Map(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_lookup() {
        let mut map = HashMap::new();
        map.insert("device".to_string(), Data::from("probe-1"));
        map.insert("values".to_string(), Data::from(vec![Data::from(11), Data::from(12)]));
        let data = Data::Map(map);

        assert_eq!(data.get_property("device").as_str(), Some("probe-1"));
        assert_eq!(data.get_property("values").get_property("1").as_int(), Some(12));
        assert!(data.get_property("missing").is_null());
        assert!(data.get_property("values").get_property("7").is_null());
    }

    #[test]
    fn scalar_accessors() {
        assert_eq!(Data::from(17).as_int(), Some(17));
        assert_eq!(Data::from(true).as_bool(), Some(true));
        assert_eq!(Data::from("x").as_int(), None);
    }
}
