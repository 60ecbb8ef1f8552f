//! Conversion from native Rust values into [`Value`] via serde.
//!
//! Any `Serialize` type can be encoded. Integers of every width become wire
//! integers, `f32`/`f64` become floats, strings and chars become text, `None`
//! and `()` become null, sequences and tuples become arrays, maps keep their
//! iteration order and structs become text-keyed maps in field order.
//! `std::time::SystemTime` becomes milliseconds since the Unix epoch.
//!
//! Enum variants carrying data have no encoding and are rejected with
//! [`EncodeError::UnsupportedType`].
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let wire = protocol_resp3::encode(&Point { x: 1, y: -2 }).unwrap();
//! assert_eq!(wire, "%4\r\n+x\r\n:1\r\n+y\r\n:-2\r\n");
//! ```

use crate::error::EncodeError;
use crate::value::{Map, Value};
use serde::ser::{self, Impossible, Serialize};

/// Newtype names that carry error values through serde unchanged.
const SIMPLE_ERROR_TOKEN: &str = "$protocol_resp3::SimpleError";
const BLOB_ERROR_TOKEN: &str = "$protocol_resp3::BlobError";

/// Convert any serializable value into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    value.serialize(ValueSerializer)
}

/// Encode any serializable value into its wire form.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodeError> {
    Ok(to_value(value)?.encode())
}

impl Serialize for Value {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) | Value::VerbatimString(s) => {
                serializer.serialize_str(s)
            }
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
            Value::SimpleError(msg) => serializer.serialize_newtype_struct(SIMPLE_ERROR_TOKEN, msg),
            Value::BlobError(msg) => serializer.serialize_newtype_struct(BLOB_ERROR_TOKEN, msg),
            Value::Array(elements) => serializer.collect_seq(elements),
            Value::Map(Map::Text(entries)) => {
                serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
            }
            Value::Map(Map::Integer(entries)) => {
                serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
            }
            Value::Map(Map::Mixed(entries)) => {
                serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
            }
        }
    }
}

/// Serializer whose output is a [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

fn integer<T>(n: T) -> Result<Value, EncodeError>
where
    T: Copy + std::fmt::Display,
    i64: TryFrom<T>,
{
    i64::try_from(n)
        .map(Value::Integer)
        .map_err(|_| EncodeError::IntegerOutOfRange(n.to_string()))
}

fn unsupported_variant(name: &str, variant: &str) -> EncodeError {
    EncodeError::UnsupportedType(format!("{name}::{variant}"))
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = Impossible<Value, EncodeError>;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = Impossible<Value, EncodeError>;

    fn serialize_bool(self, v: bool) -> Result<Value, EncodeError> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, EncodeError> {
        Ok(Value::Integer(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, EncodeError> {
        integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, EncodeError> {
        integer(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Value, EncodeError> {
        integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value, EncodeError> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, EncodeError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, EncodeError> {
        Ok(Value::text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, EncodeError> {
        Ok(Value::text(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, EncodeError> {
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, EncodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, EncodeError> {
        Ok(Value::Map(Map::default()))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, EncodeError> {
        Ok(Value::text(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError> {
        let inner = value.serialize(self)?;
        let wrap: fn(String) -> Value = match name {
            SIMPLE_ERROR_TOKEN => Value::SimpleError,
            BLOB_ERROR_TOKEN => Value::BlobError,
            _ => return Ok(inner),
        };
        inner
            .into_text()
            .map(wrap)
            .ok_or_else(|| EncodeError::Custom(format!("{name} must wrap a string")))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Value, EncodeError> {
        Err(unsupported_variant(name, variant))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, EncodeError> {
        Ok(SeqBuilder::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, EncodeError> {
        Ok(SeqBuilder::with_capacity(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, EncodeError> {
        Ok(SeqBuilder::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, EncodeError> {
        Err(unsupported_variant(name, variant))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, EncodeError> {
        Ok(MapBuilder {
            pairs: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<StructBuilder, EncodeError> {
        Ok(StructBuilder {
            name,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, EncodeError> {
        Err(unsupported_variant(name, variant))
    }
}

// ============================================================================
// Compound builders
// ============================================================================

/// Collects sequence and tuple elements into an array.
#[derive(Debug)]
pub struct SeqBuilder {
    elements: Vec<Value>,
}

impl SeqBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.elements.push(value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.elements))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.elements))
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.elements))
    }
}

/// Collects map entries in iteration order.
#[derive(Debug)]
pub struct MapBuilder {
    pairs: Vec<(Value, Value)>,
    next_key: Option<Value>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodeError> {
        self.next_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| EncodeError::Custom("map value without a key".to_string()))?;
        self.pairs.push((key, value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Map(Map::from_pairs(self.pairs)))
    }
}

/// Collects struct fields into a text-keyed map.
#[derive(Debug)]
pub struct StructBuilder {
    name: &'static str,
    fields: Vec<(String, Value)>,
}

impl StructBuilder {
    /// `SystemTime` serializes as seconds and nanoseconds since the epoch.
    fn system_time_millis(&self) -> Option<i64> {
        if self.name != "SystemTime" {
            return None;
        }
        match self.fields.as_slice() {
            [(secs_key, Value::Integer(secs)), (nanos_key, Value::Integer(nanos))]
                if secs_key == "secs_since_epoch" && nanos_key == "nanos_since_epoch" =>
            {
                Some(secs.saturating_mul(1000).saturating_add(nanos / 1_000_000))
            }
            _ => None,
        }
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.fields.push((key.to_string(), value.serialize(ValueSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        if let Some(millis) = self.system_time_millis() {
            return Ok(Value::Integer(millis));
        }
        Ok(Value::Map(Map::Text(self.fields)))
    }
}
