//! Common value and row types passed through the driver seam

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Positional query parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Bytes(Vec<u8>),
	/// Bound as an RFC 3339 string; the generic driver has no native timestamp type
	Timestamp(chrono::DateTime<chrono::Utc>),
}

impl QueryValue {
	pub fn is_null(&self) -> bool {
		matches!(self, QueryValue::Null)
	}

	/// Integer view of the value, if it holds one
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			QueryValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			QueryValue::String(s) => Some(s),
			_ => None,
		}
	}
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		QueryValue::String(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		QueryValue::String(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		QueryValue::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		QueryValue::Int(i as i64)
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		QueryValue::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		QueryValue::Bool(b)
	}
}

impl From<Vec<u8>> for QueryValue {
	fn from(b: Vec<u8>) -> Self {
		QueryValue::Bytes(b)
	}
}

impl From<chrono::DateTime<chrono::Utc>> for QueryValue {
	fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
		QueryValue::Timestamp(dt)
	}
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(QueryValue::Null)
	}
}

/// Row from a query result, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
	pub data: BTreeMap<String, QueryValue>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
		self.data.insert(key.into(), value);
	}

	pub fn get(&self, key: &str) -> Option<&QueryValue> {
		self.data.get(key)
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(QueryValue::from(7_i32), QueryValue::Int(7))]
	#[case(QueryValue::from("alice"), QueryValue::String("alice".to_string()))]
	#[case(QueryValue::from(None::<i64>), QueryValue::Null)]
	#[case(QueryValue::from(Some(true)), QueryValue::Bool(true))]
	fn test_query_value_conversions(#[case] actual: QueryValue, #[case] expected: QueryValue) {
		assert_eq!(actual, expected);
	}

	#[rstest]
	fn test_row_lookup() {
		// Arrange
		let mut row = Row::new();
		row.insert("id", QueryValue::Int(1));
		row.insert("email", QueryValue::from("a@example.com"));

		// Act
		let id = row.get("id").and_then(QueryValue::as_i64);
		let missing = row.get("name");

		// Assert
		assert_eq!(id, Some(1));
		assert!(missing.is_none());
		assert_eq!(row.len(), 2);
	}
}
