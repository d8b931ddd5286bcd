pub mod store;

pub use store::MappingStore;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// One link and, once downloaded, its path relative to the output folder
/// root. The path is never rewritten after it has been set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub link: String,
    pub local_path: Option<String>,
}

/// Insertion-ordered link→local-path table. Order matters because the table
/// is persisted as an ordered JSON object and diffed incrementally across
/// runs; a plain map type would shuffle keys on every save.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.index.contains_key(link)
    }

    pub fn local_path(&self, link: &str) -> Option<Option<&str>> {
        self.index
            .get(link)
            .map(|&i| self.entries[i].local_path.as_deref())
    }

    /// Adds a link with no local path. Existing entries, set or unset, are
    /// left untouched so re-scans never disturb prior progress.
    pub fn insert_link<S: Into<String>>(&mut self, link: S) {
        let link = link.into();
        if self.index.contains_key(&link) {
            return;
        }

        self.index.insert(link.clone(), self.entries.len());
        self.entries.push(MappingEntry {
            link,
            local_path: None,
        });
    }

    /// Records the downloaded location for a link. Only called after a fetch
    /// succeeded, so a crash can never persist a path that was not written.
    pub fn set_local_path(&mut self, link: &str, local_path: String) {
        if let Some(&i) = self.index.get(link) {
            self.entries[i].local_path = Some(local_path);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    pub fn unset_count(&self) -> usize {
        self.entries.iter().filter(|e| e.local_path.is_none()).count()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Mapping {}

impl FromIterator<String> for Mapping {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut mapping = Mapping::new();
        for link in iter {
            mapping.insert_link(link);
        }
        mapping
    }
}

// Persisted as a JSON object `{ "<link>": "<path>" | null, ... }` in entry
// order, matching the human-inspectable format documented for the mapping
// file. Deserialization reads entries in document order.
impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.link, &entry.local_path)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = Mapping;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of link strings to local paths or null")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut mapping = Mapping::new();

                while let Some((link, local_path)) =
                    access.next_entry::<String, Option<String>>()?
                {
                    mapping.insert_link(link.clone());
                    if let Some(path) = local_path {
                        mapping.set_local_path(&link, path);
                    }
                }

                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
