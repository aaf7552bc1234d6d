//! Ordered build parameter bag.

use serde::{Deserialize, Serialize};

/// A single `name = value` build parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Ordered set of build parameters with unique names.
///
/// Serialized in the server's `{"count": n, "property": [...]}` shape. Used both
/// when reading parameters of an existing build and when building a trigger
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireProperties", into = "WireProperties")]
pub struct ParameterBag {
    entries: Vec<Parameter>,
}

#[derive(Serialize, Deserialize, Default)]
struct WireProperties {
    #[serde(default)]
    count: usize,
    #[serde(default)]
    property: Vec<Parameter>,
}

impl ParameterBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter. An existing name keeps its position and gets the
    /// new value; the previous value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.entries.push(Parameter { name, value });
                None
            }
        }
    }

    /// Look up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Returns true if the bag holds exactly `name = value`.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name) == Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.entries.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

impl<'a> IntoIterator for &'a ParameterBag {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<WireProperties> for ParameterBag {
    fn from(wire: WireProperties) -> Self {
        wire.property
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect()
    }
}

impl From<ParameterBag> for WireProperties {
    fn from(bag: ParameterBag) -> Self {
        Self {
            count: bag.entries.len(),
            property: bag.entries,
        }
    }
}
