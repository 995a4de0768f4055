use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FlavorKey;

/// Generated text keyed by subject. Serialized as a list because JSON object keys must be strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FlavorEntry>", into = "Vec<FlavorEntry>")]
pub struct FlavorCache {
    entries: BTreeMap<FlavorKey, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorEntry {
    pub key: FlavorKey,
    pub text: String,
}

impl FlavorCache {
    pub fn get(&self, key: &FlavorKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &FlavorKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Later text for the same key replaces earlier text.
    pub fn insert(&mut self, key: FlavorKey, text: String) {
        self.entries.insert(key, text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<FlavorEntry>> for FlavorCache {
    fn from(entries: Vec<FlavorEntry>) -> Self {
        Self { entries: entries.into_iter().map(|entry| (entry.key, entry.text)).collect() }
    }
}

impl From<FlavorCache> for Vec<FlavorEntry> {
    fn from(cache: FlavorCache) -> Self {
        cache.entries.into_iter().map(|(key, text)| FlavorEntry { key, text }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::FlavorSubject;

    #[test]
    fn cache_survives_a_json_round_trip() {
        let mut cache = FlavorCache::default();
        let key = FlavorKey {
            seed: 9,
            floor: 2,
            subject: FlavorSubject::Enemy("Rat".to_owned()),
            index: 4,
        };
        cache.insert(key.clone(), "It squeaks.".to_owned());
        let json = serde_json::to_string(&cache).expect("cache serializes");
        let restored: FlavorCache = serde_json::from_str(&json).expect("cache deserializes");
        assert_eq!(restored.get(&key), Some("It squeaks."));
        assert_eq!(restored, cache);
    }
}
