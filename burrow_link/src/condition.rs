use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::{Data, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A filter over one field of a record. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    field: String,
    op: Op,
    value: Data,
}

impl Condition {
    pub fn new<F, V>(field: F, op: Op, value: V) -> Self
    where
        F: Into<String>,
        V: Into<Data>,
    {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shortcut for the most common filter, field equality.
    pub fn eq<F, V>(field: F, value: V) -> Self
    where
        F: Into<String>,
        V: Into<Data>,
    {
        Self::new(field, Op::Eq, value)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn value(&self) -> &Data {
        &self.value
    }

    /// Test this condition against a record. A field the record does not
    /// have reads as Null. The ordered operators apply to ints, floats and
    /// strings; any other pairing is simply not a match.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = match record.get(&self.field) {
            Some(value) => value,
            None => &Data::Null,
        };
        match self.op {
            Op::Eq => actual == &self.value,
            Op::Neq => actual != &self.value,
            Op::Gt | Op::Gte | Op::Lt | Op::Lte => match compare(actual, &self.value) {
                Some(ordering) => match self.op {
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Gte => ordering != Ordering::Less,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Lte => ordering != Ordering::Greater,
                    _ => unreachable!(),
                },
                None => false,
            },
        }
    }
}

fn compare(a: &Data, b: &Data) -> Option<Ordering> {
    match (a, b) {
        (Data::Int(a), Data::Int(b)) => Some(a.cmp(b)),
        (Data::Float(a), Data::Float(b)) => a.partial_cmp(b),
        (Data::Int(a), Data::Float(b)) => (*a as f64).partial_cmp(b),
        (Data::Float(a), Data::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Data::String(a), Data::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(field: &str, value: Data) -> Record {
        let mut record = Record::new();
        record.insert(field.to_string(), value);
        record
    }

    #[test]
    fn equality() {
        let cond = Condition::eq("username", "a");
        assert!(cond.matches(&record("username", Data::from("a"))));
        assert!(!cond.matches(&record("username", Data::from("b"))));
        assert!(!cond.matches(&Record::new()));
    }

    #[test]
    fn missing_field_reads_as_null() {
        let cond = Condition::new("deleted", Op::Eq, Data::Null);
        assert!(cond.matches(&Record::new()));
    }

    #[test]
    fn ordered_operators() {
        let cond = Condition::new("value", Op::Gte, 11);
        assert!(cond.matches(&record("value", Data::from(11))));
        assert!(cond.matches(&record("value", Data::from(20.5))));
        assert!(!cond.matches(&record("value", Data::from(10))));
        // ordering against a non-numeric value is not a match
        assert!(!cond.matches(&record("value", Data::from("12"))));
    }
}
