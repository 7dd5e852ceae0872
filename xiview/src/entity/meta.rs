use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single metadata value as attached to matches, cross-links, and proteins.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// A flag
    Flag(bool),
    /// A numeric value
    Number(f64),
    /// A textual value
    Text(String),
}

impl MetaValue {
    /// Get the numeric value, text is parsed if it holds a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => t.trim().parse().ok(),
            Self::Flag(_) => None,
        }
    }

    /// Get the textual value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => write!(f, "{t}"),
        }
    }
}

/// The metadata of an entity, keyed on field name
pub type MetaMap = BTreeMap<String, MetaValue>;

/// Generalised access to the metadata of any entity
pub trait MetaData {
    /// Get all metadata
    fn meta_map(&self) -> &MetaMap;

    /// Get a single metadata field
    fn meta(&self, field: &str) -> Option<&MetaValue> {
        self.meta_map().get(field)
    }

    /// Get a single metadata field as number
    fn meta_number(&self, field: &str) -> Option<f64> {
        self.meta(field).and_then(MetaValue::as_number)
    }
}

macro_rules! impl_ref {
    ($t:ty) => {
        impl<T: MetaData> MetaData for $t {
            fn meta_map(&self) -> &MetaMap {
                (**self).meta_map()
            }
        }
    };
}

impl_ref!(&T);
impl_ref!(std::rc::Rc<T>);
impl_ref!(std::sync::Arc<T>);

impl MetaData for Box<dyn MetaData + '_> {
    fn meta_map(&self) -> &MetaMap {
        (**self).meta_map()
    }
}
