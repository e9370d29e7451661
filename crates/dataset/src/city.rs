//! City display name to dataset id mapping

use std::collections::BTreeMap;

/// Fixed name→id table used by the dashboard's city selector
#[derive(Debug, Clone, PartialEq)]
pub struct CityTable {
    /// Lowercased display name -> city id
    ids: BTreeMap<String, String>,
}

impl CityTable {
    /// Build a table from `(name, id)` pairs
    pub fn new<I, N, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<String>,
    {
        Self {
            ids: entries
                .into_iter()
                .map(|(name, id)| (name.as_ref().trim().to_lowercase(), id.into()))
                .collect(),
        }
    }

    /// Resolve a city parameter to a dataset id.
    ///
    /// Known names map through the table; anything else is taken to already be an id.
    pub fn resolve(&self, city: &str) -> String {
        let key = city.trim().to_lowercase();
        self.ids
            .get(&key)
            .cloned()
            .unwrap_or_else(|| city.trim().to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for CityTable {
    fn default() -> Self {
        Self::new([("Indore", "1"), ("Delhi", "2"), ("Assam", "3")])
    }
}
