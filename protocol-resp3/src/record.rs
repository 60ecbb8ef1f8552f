//! Projection of record types onto text-keyed maps.
//!
//! A [`Record`] lists its public fields by name in declaration order. The
//! projection is a [`Map::Text`], so it encodes as `%<fields * 2>\r\n` followed
//! by one `+<name>\r\n<value>` pair per field.
//!
//! ```
//! use protocol_resp3::{Record, RecordResponse};
//!
//! let response = RecordResponse::new("OK", 200);
//! assert_eq!(
//!     response.encode(),
//!     "%4\r\n+Value\r\n+OK\r\n+Code\r\n:200\r\n"
//! );
//! ```

use crate::value::{Map, Value};

/// A type with named fields that encodes as a map.
pub trait Record {
    /// Field names and values, in declaration order. Private fields are left out.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Project this record onto a text-keyed map value.
    fn to_value(&self) -> Value {
        let entries = self
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Value::Map(Map::Text(entries))
    }

    /// Encode this record into its wire form.
    fn encode(&self) -> String {
        self.to_value().encode()
    }
}

/// A stored value together with its metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScalarRecord {
    #[cfg_attr(feature = "serde", serde(rename = "Value"))]
    pub value: Value,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub kind: u8,
    /// Last access time, in milliseconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(rename = "LAT"))]
    pub lat: i64,
    /// Expiry time, in milliseconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(rename = "Expiry"))]
    pub expiry: i64,
}

impl Record for ScalarRecord {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Value", self.value.clone()),
            ("Type", Value::from(self.kind)),
            ("LAT", Value::Integer(self.lat)),
            ("Expiry", Value::Integer(self.expiry)),
        ]
    }
}

/// A reply value paired with a status code.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordResponse {
    #[cfg_attr(feature = "serde", serde(rename = "Value"))]
    pub value: Value,
    #[cfg_attr(feature = "serde", serde(rename = "Code"))]
    pub code: u32,
}

impl RecordResponse {
    pub fn new(value: impl Into<Value>, code: u32) -> Self {
        Self {
            value: value.into(),
            code,
        }
    }
}

impl Record for RecordResponse {
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![("Value", self.value.clone()), ("Code", Value::from(self.code))]
    }
}
