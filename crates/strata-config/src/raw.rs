//! Untyped configuration data produced by sources.
//!
//! Sources never build application types. They return a [`RawValue`] tree whose
//! leaves are strings, and the loader's transform step turns that tree into
//! the typed configuration. [`RawValue::deserialize`] is the serde-based
//! transform: scalars are parsed on demand, so `"7000"` deserializes into a
//! `u16` and `"true"` into a `bool`.

use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::str::FromStr;

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::error::{ConfigError, ConfigResult};

/// A node of raw configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawValue {
    /// An explicit null (empty YAML value).
    #[default]
    Null,
    /// A leaf value, always kept in string form.
    Scalar(String),
    /// An ordered sequence.
    List(Vec<RawValue>),
    /// A nested associative structure.
    Map(RawMap),
}

impl RawValue {
    /// Returns the scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the nested map, if this is a map.
    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value and returns the map, if this is a map.
    pub fn into_map(self) -> Option<RawMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is [`RawValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Deserialize this raw tree into a typed value.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Deserialize;
    /// use strata_config::{RawMap, RawValue};
    ///
    /// #[derive(Deserialize)]
    /// struct Server {
    ///     port: u16,
    ///     verbose: bool,
    /// }
    ///
    /// let raw = RawValue::Map(RawMap::from_iter([("port", "7000"), ("verbose", "yes")]));
    /// let server: Server = raw.deserialize().unwrap();
    /// assert_eq!(server.port, 7000);
    /// assert!(server.verbose);
    /// ```
    pub fn deserialize<T: DeserializeOwned>(self) -> ConfigResult<T> {
        T::deserialize(self)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<RawMap> for RawValue {
    fn from(value: RawMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(value: Vec<RawValue>) -> Self {
        Self::List(value)
    }
}

/// An ordered string-keyed map of raw values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMap {
    entries: BTreeMap<String, RawValue>,
}

impl RawMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value under that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Option<RawValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    /// Look up a top-level scalar.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RawValue::as_str)
    }

    /// Look up a dotted path through nested maps (`"server.port"`).
    pub fn get_path(&self, path: &str) -> Option<&RawValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Parse a top-level scalar with [`FromStr`].
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn parse<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None | Some(RawValue::Null) => Ok(None),
            Some(RawValue::Scalar(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, format!("`{text}`: {e}"))),
            Some(_) => Err(ConfigError::invalid_value(key, "expected a scalar value")),
        }
    }

    /// Remove a top-level entry, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.entries.remove(key)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over top-level entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, RawValue> {
        self.entries.iter()
    }

    /// Iterate over top-level keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Split every key on `separator` and rebuild the map as a tree.
    ///
    /// `{"server_port": "80"}` nested on `_` becomes `{server: {port: "80"}}`.
    /// Empty segments are dropped. A key that is both a leaf and a parent of
    /// another key is malformed.
    pub fn nest(&self, separator: char) -> ConfigResult<RawMap> {
        let mut nested = RawMap::new();
        for (key, value) in &self.entries {
            let segments: Vec<&str> = key.split(separator).filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                continue;
            }
            insert_path(&mut nested, &segments, value.clone(), key)?;
        }
        Ok(nested)
    }
}

fn insert_path(target: &mut RawMap, segments: &[&str], value: RawValue, key: &str) -> ConfigResult<()> {
    match segments {
        [] => Ok(()),
        [leaf] => {
            if target.entries.contains_key(*leaf) {
                return Err(conflicting_key(key));
            }
            target.entries.insert((*leaf).to_string(), value);
            Ok(())
        }
        [head, rest @ ..] => {
            let child = target
                .entries
                .entry((*head).to_string())
                .or_insert_with(|| RawValue::Map(RawMap::new()));
            match child {
                RawValue::Map(child) => insert_path(child, rest, value, key),
                _ => Err(conflicting_key(key)),
            }
        }
    }
}

fn conflicting_key(key: &str) -> ConfigError {
    ConfigError::malformed(
        format!("key `{key}`"),
        "key is used both as a value and as a parent of other keys",
    )
}

impl<K, V> FromIterator<(K, V)> for RawMap
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for RawMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for RawMap {
    type Item = (String, RawValue);
    type IntoIter = btree_map::IntoIter<String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a RawMap {
    type Item = (&'a String, &'a RawValue);
    type IntoIter = btree_map::Iter<'a, String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse a boolean from a string.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                match self {
                    RawValue::Scalar(text) => {
                        let parsed: $ty = text.trim().parse().map_err(|_| {
                            ConfigError::Decode(format!(
                                "invalid {} value `{}`",
                                stringify!($ty),
                                text
                            ))
                        })?;
                        visitor.$visit(parsed)
                    }
                    other => other.deserialize_any(visitor),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for RawValue {
    type Error = ConfigError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Null => visitor.visit_unit(),
            RawValue::Scalar(text) => visitor.visit_string(text),
            RawValue::List(items) => {
                let mut seq = SeqDeserializer::<_, ConfigError>::new(items.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            RawValue::Map(map) => {
                let mut entries = MapDeserializer::<_, ConfigError>::new(map.into_iter());
                let value = visitor.visit_map(&mut entries)?;
                entries.end()?;
                Ok(value)
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Scalar(text) => match parse_bool(&text) {
                Some(flag) => visitor.visit_bool(flag),
                None => Err(ConfigError::Decode(format!("invalid bool value `{text}`"))),
            },
            other => other.deserialize_any(visitor),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Null => visitor.visit_unit(),
            RawValue::Scalar(text) if text.trim().is_empty() => visitor.visit_unit(),
            other => other.deserialize_any(visitor),
        }
    }

    // Scalars requested as sequences are comma separated lists.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Null => RawValue::List(Vec::new()).deserialize_any(visitor),
            RawValue::Scalar(text) => {
                let items = if text.trim().is_empty() {
                    Vec::new()
                } else {
                    text.split(',')
                        .map(|item| RawValue::Scalar(item.trim().to_string()))
                        .collect()
                };
                RawValue::List(items).deserialize_any(visitor)
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            RawValue::Scalar(text) => {
                let variant: StringDeserializer<ConfigError> = text.into_deserializer();
                visitor.visit_enum(variant)
            }
            RawValue::Map(map) if map.len() == 1 => {
                let entries = MapDeserializer::<_, ConfigError>::new(map.into_iter());
                visitor.visit_enum(MapAccessDeserializer::new(entries))
            }
            _ => Err(ConfigError::Decode(
                "expected a variant name or a single-entry map".to_string(),
            )),
        }
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit_struct tuple tuple_struct
        map struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, ConfigError> for RawValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}
