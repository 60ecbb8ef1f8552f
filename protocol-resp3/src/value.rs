//! RESP3 value types.
//!
//! Every decoded record is expressed as a [`Value`], and every encode input is
//! classified into one before it is framed:
//! - Simple String: `+OK\r\n`
//! - Bulk String: `$6\r\nfoobar\r\n`
//! - Verbatim String: `=15\r\ntxt:Some string\r\n`
//! - Integer: `:1000\r\n`
//! - Float: `,3.140000\r\n`
//! - Boolean: `#t\r\n` or `#f\r\n`
//! - Null: `_\r\n`, `$-1\r\n` or `*-1\r\n`
//! - Simple Error: `-ERR message\r\n`
//! - Blob Error: `!<len>\r\n<error>\r\n`
//! - Array: `*<count>\r\n<elem>...`
//! - Map: `%<count>\r\n<key><val>...` (count is twice the number of pairs)

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::time::{SystemTime, UNIX_EPOCH};

/// A RESP3 protocol value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Simple string: `+OK\r\n`
    SimpleString(String),
    /// Bulk string: `$6\r\nfoobar\r\n`
    BulkString(String),
    /// Verbatim string: `=<len>\r\ntxt:<data>\r\n`
    ///
    /// The format tag is not retained. When decoding, any payload whose fourth
    /// byte is `:` loses its first four bytes, so `=9\r\nkey:value\r\n`
    /// decodes to `"value"`.
    VerbatimString(String),
    /// Integer: `:1000\r\n`
    Integer(i64),
    /// Double-precision floating point: `,3.140000\r\n`
    Float(f64),
    /// Boolean: `#t\r\n` or `#f\r\n`
    Boolean(bool),
    /// Null value, also produced by null bulk strings, arrays and maps.
    Null,
    /// Simple error: `-ERR message\r\n`
    SimpleError(String),
    /// Blob error: `!<len>\r\n<error>\r\n`
    BlobError(String),
    /// Array: `*2\r\n...`
    Array(Vec<Value>),
    /// Map: `%4\r\n...`
    Map(Map),
}

/// The coarse shape of a [`Value`], used when classifying sequences and map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Text,
    Integer,
    Float,
    Boolean,
    Null,
    Error,
    Array,
    Map,
}

impl Kind {
    /// Returns true for single-valued kinds that have a concrete native type.
    #[inline]
    pub fn is_scalar(self) -> bool {
        matches!(self, Kind::Text | Kind::Integer | Kind::Float | Kind::Boolean)
    }
}

/// A RESP3 map, in the most specific container its keys allow.
///
/// Pairs keep the order in which their keys first appeared. Inserting a key
/// that is already present replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Map {
    /// Every key is text.
    Text(Vec<(String, Value)>),
    /// Every key is an integer.
    Integer(Vec<(i64, Value)>),
    /// Keys of differing kinds, kept as values.
    Mixed(Vec<(Value, Value)>),
}

impl Default for Map {
    fn default() -> Self {
        Map::Text(Vec::new())
    }
}

impl Map {
    /// Build a map from ordered pairs, choosing the container from the keys.
    ///
    /// If every key is text the map is text-keyed, otherwise if every key is an
    /// integer it is integer-keyed, otherwise it is mixed. An empty input yields
    /// an empty text-keyed map. Duplicate keys keep their first position and
    /// their last value.
    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Self {
        let mut all_text = true;
        let mut all_integer = true;
        for (key, _) in &pairs {
            match key.kind() {
                Kind::Text => all_integer = false,
                Kind::Integer => all_text = false,
                _ => {
                    all_text = false;
                    all_integer = false;
                }
            }
        }

        if all_text {
            let mut entries: OrderedEntries<String> = OrderedEntries::with_capacity(pairs.len());
            for (key, value) in pairs {
                if let Some(key) = key.into_text() {
                    entries.insert(key, value);
                }
            }
            Map::Text(entries.finish())
        } else if all_integer {
            let mut entries: OrderedEntries<i64> = OrderedEntries::with_capacity(pairs.len());
            for (key, value) in pairs {
                if let Value::Integer(key) = key {
                    entries.insert(key, value);
                }
            }
            Map::Integer(entries.finish())
        } else {
            let mut entries: OrderedEntries<Value, KeyId> =
                OrderedEntries::with_capacity(pairs.len());
            for (key, value) in pairs {
                entries.insert_with(KeyId::of(&key), key, value);
            }
            Map::Mixed(entries.finish())
        }
    }

    /// Number of pairs in the map.
    pub fn len(&self) -> usize {
        match self {
            Map::Text(entries) => entries.len(),
            Map::Integer(entries) => entries.len(),
            Map::Mixed(entries) => entries.len(),
        }
    }

    /// Returns true if the map has no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a value by text key.
    pub fn get_text(&self, key: &str) -> Option<&Value> {
        match self {
            Map::Text(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Map::Mixed(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            Map::Integer(_) => None,
        }
    }

    /// Look up a value by integer key.
    pub fn get_integer(&self, key: i64) -> Option<&Value> {
        match self {
            Map::Integer(entries) => entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v),
            Map::Mixed(entries) => entries
                .iter()
                .find(|(k, _)| k.as_integer() == Some(key))
                .map(|(_, v)| v),
            Map::Text(_) => None,
        }
    }

    /// Flatten the map into key/value pairs with keys as values.
    pub fn into_pairs(self) -> Vec<(Value, Value)> {
        match self {
            Map::Text(entries) => entries
                .into_iter()
                .map(|(k, v)| (Value::text(k), v))
                .collect(),
            Map::Integer(entries) => entries
                .into_iter()
                .map(|(k, v)| (Value::Integer(k), v))
                .collect(),
            Map::Mixed(entries) => entries,
        }
    }
}

/// Insertion-ordered pairs with last-write-wins on duplicate keys.
///
/// Keys are looked up through an index of type `I`, which is the key itself
/// for text and integer maps and a [`KeyId`] for mixed maps.
struct OrderedEntries<K, I = K> {
    index: HashMap<I, usize>,
    entries: Vec<(K, Value)>,
}

impl<K, I: Eq + Hash> OrderedEntries<K, I> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    fn insert_with(&mut self, id: I, key: K, value: Value) {
        match self.index.entry(id) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 = value,
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    fn finish(self) -> Vec<(K, Value)> {
        self.entries
    }
}

impl<K: Clone + Eq + Hash> OrderedEntries<K> {
    fn insert(&mut self, key: K, value: Value) {
        self.insert_with(key.clone(), key, value);
    }
}

/// Hashable identity of a mixed-map key.
///
/// The three text variants share one identity, as do the two error variants.
/// Floats compare by bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyId {
    Text(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Null,
    Error(String),
    Array(Vec<KeyId>),
    Map(Vec<(KeyId, KeyId)>),
}

impl KeyId {
    fn of(value: &Value) -> Self {
        match value {
            Value::SimpleString(s) | Value::BulkString(s) | Value::VerbatimString(s) => {
                KeyId::Text(s.clone())
            }
            Value::Integer(n) => KeyId::Integer(*n),
            Value::Float(f) if *f == 0.0 => KeyId::Float(0),
            Value::Float(f) => KeyId::Float(f.to_bits()),
            Value::Boolean(b) => KeyId::Boolean(*b),
            Value::Null => KeyId::Null,
            Value::SimpleError(msg) | Value::BlobError(msg) => KeyId::Error(msg.clone()),
            Value::Array(elements) => KeyId::Array(elements.iter().map(KeyId::of).collect()),
            Value::Map(map) => KeyId::Map(match map {
                Map::Text(entries) => entries
                    .iter()
                    .map(|(k, v)| (KeyId::Text(k.clone()), KeyId::of(v)))
                    .collect(),
                Map::Integer(entries) => entries
                    .iter()
                    .map(|(k, v)| (KeyId::Integer(*k), KeyId::of(v)))
                    .collect(),
                Map::Mixed(entries) => entries
                    .iter()
                    .map(|(k, v)| (KeyId::of(k), KeyId::of(v)))
                    .collect(),
            }),
        }
    }
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a text value, framed the way the encoder frames standalone text:
    /// a simple string up to 16 bytes, a bulk string beyond that.
    #[inline]
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.len() <= crate::encode::SIMPLE_STRING_MAX_LEN {
            Value::SimpleString(s)
        } else {
            Value::BulkString(s)
        }
    }

    /// Create a simple error value.
    #[inline]
    pub fn error(msg: impl Into<String>) -> Self {
        Value::SimpleError(msg.into())
    }

    /// Create a blob error value.
    #[inline]
    pub fn blob_error(msg: impl Into<String>) -> Self {
        Value::BlobError(msg.into())
    }

    /// Create an error value from any error's message.
    #[inline]
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Value::SimpleError(err.to_string())
    }

    /// Create an array value.
    #[inline]
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(elements)
    }

    /// Create a map value from ordered pairs. See [`Map::from_pairs`].
    #[inline]
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        Value::Map(Map::from_pairs(pairs))
    }

    /// Create an integer value holding milliseconds since the Unix epoch.
    /// Times before the epoch are negative.
    pub fn timestamp(time: SystemTime) -> Self {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        Value::Integer(millis)
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    /// Returns the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Value::SimpleString(_) | Value::BulkString(_) | Value::VerbatimString(_) => Kind::Text,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Boolean(_) => Kind::Boolean,
            Value::Null => Kind::Null,
            Value::SimpleError(_) | Value::BlobError(_) => Kind::Error,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
        }
    }

    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a simple or blob error.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::SimpleError(_) | Value::BlobError(_))
    }

    /// Returns true if this is any of the three text values.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind() == Kind::Text
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the text of a string value.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) | Value::VerbatimString(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the message of an error value.
    #[inline]
    pub fn as_error(&self) -> Option<&str> {
        match self {
            Value::SimpleError(msg) | Value::BlobError(msg) => Some(msg),
            _ => None,
        }
    }

    /// Returns the value as an integer.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an array.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns the value as a map.
    #[inline]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes a text value, returning its string.
    #[inline]
    pub fn into_text(self) -> Option<String> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) | Value::VerbatimString(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions from native values
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(n: $t) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<SystemTime> for Value {
    fn from(time: SystemTime) -> Self {
        Value::timestamp(time)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(elements: Vec<T>) -> Self {
        Value::Array(elements.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_text_threshold() {
        assert_eq!(Value::text("hello"), Value::SimpleString("hello".into()));
        assert_eq!(
            Value::text("exactly 16 bytes"),
            Value::SimpleString("exactly 16 bytes".into())
        );
        assert_eq!(
            Value::text("seventeen bytes!!"),
            Value::BulkString("seventeen bytes!!".into())
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(Value::VerbatimString("x".into()).kind(), Kind::Text);
        assert_eq!(Value::BlobError("x".into()).kind(), Kind::Error);
        assert_eq!(Value::Null.kind(), Kind::Null);
        assert!(Kind::Float.is_scalar());
        assert!(!Kind::Array.is_scalar());
        assert!(!Kind::Null.is_scalar());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(42).as_integer(), Some(42));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::error("boom").as_error(), Some("boom"));
        assert_eq!(Value::Integer(1).as_str(), None);
        assert!(Value::from(()).is_null());
        assert!(Value::blob_error("x").is_error());
    }

    #[test]
    fn test_from_option_and_vec() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7u8)), Value::Integer(7));
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_timestamp() {
        let time = UNIX_EPOCH + Duration::from_millis(1_620_832_335_000);
        assert_eq!(Value::from(time), Value::Integer(1_620_832_335_000));
        let before = UNIX_EPOCH - Duration::from_millis(1500);
        assert_eq!(Value::timestamp(before), Value::Integer(-1500));
    }

    #[test]
    fn test_map_classification() {
        let text = Map::from_pairs(vec![("a".into(), 1.into()), ("b".into(), 2.into())]);
        assert!(matches!(text, Map::Text(_)));

        let ints = Map::from_pairs(vec![(1.into(), "x".into()), (2.into(), "y".into())]);
        assert!(matches!(ints, Map::Integer(_)));

        let mixed = Map::from_pairs(vec![("a".into(), 1.into()), (2.into(), "b".into())]);
        assert!(matches!(mixed, Map::Mixed(_)));
        assert_eq!(mixed.get_text("a"), Some(&Value::Integer(1)));
        assert_eq!(mixed.get_integer(2), Some(&Value::from("b")));

        assert_eq!(Map::from_pairs(vec![]), Map::Text(vec![]));
    }

    #[test]
    fn test_map_duplicate_keys_overwrite_in_place() {
        let map = Map::from_pairs(vec![
            ("a".into(), 1.into()),
            ("b".into(), 2.into()),
            ("a".into(), 3.into()),
        ]);
        assert_eq!(
            map,
            Map::Text(vec![
                ("a".to_string(), Value::Integer(3)),
                ("b".to_string(), Value::Integer(2)),
            ])
        );

        let mixed = Map::from_pairs(vec![
            (true.into(), 1.into()),
            (1.into(), 2.into()),
            (true.into(), 3.into()),
        ]);
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed.into_pairs()[0], (Value::Boolean(true), Value::Integer(3)));
    }

    #[test]
    fn test_mixed_map_key_identity() {
        let map = Map::from_pairs(vec![
            (1.into(), "a".into()),
            (Value::SimpleString("k".into()), 1.into()),
            (Value::Float(0.0), 2.into()),
            (Value::BulkString("k".into()), 3.into()),
            (Value::Float(-0.0), 4.into()),
            (vec![1, 2].into(), 5.into()),
            (vec![1, 2].into(), 6.into()),
        ]);
        assert_eq!(
            map,
            Map::Mixed(vec![
                (Value::Integer(1), Value::from("a")),
                (Value::SimpleString("k".into()), Value::Integer(3)),
                (Value::Float(0.0), Value::Integer(4)),
                (Value::from(vec![1, 2]), Value::Integer(6)),
            ])
        );
    }

    #[test]
    fn test_large_mixed_map_keeps_every_key() {
        let count = 200_000;
        let mut pairs = vec![(Value::from("k"), Value::Null)];
        pairs.extend((0..count).map(|i| (Value::Integer(i), Value::Integer(i))));
        pairs.push((Value::Integer(7), Value::from("last")));
        let map = Map::from_pairs(pairs);
        assert!(matches!(map, Map::Mixed(_)));
        assert_eq!(map.len(), count as usize + 1);
        assert_eq!(map.get_integer(7), Some(&Value::from("last")));
    }

    #[test]
    fn test_simple_and_bulk_keys_are_both_text() {
        let map = Map::from_pairs(vec![
            (Value::SimpleString("k".into()), 1.into()),
            (Value::BulkString("k".into()), 2.into()),
        ]);
        assert_eq!(map, Map::Text(vec![("k".to_string(), Value::Integer(2))]));
    }
}
