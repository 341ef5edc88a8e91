use serde::ser::{Serialize, SerializeMap, Serializer};

/// Entities partitioned by a string key. Groups keep the order in which their
/// key was first seen, and members keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    groups: Vec<(String, Vec<T>)>,
}

impl<T> Grouped<T> {
    pub fn group_by<I, F>(items: I, mut key: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> &str,
    {
        let mut groups: Vec<(String, Vec<T>)> = Vec::new();

        for item in items {
            let k = key(&item);
            match groups.iter().position(|(existing, _)| existing == k) {
                Some(idx) => groups[idx].1.push(item),
                None => {
                    let k = k.to_string();
                    groups.push((k, vec![item]));
                }
            }
        }

        Self { groups }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, members)| members.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.groups
            .iter()
            .map(|(k, members)| (k.as_str(), members.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All members, group by group.
    pub fn flatten(self) -> Vec<T> {
        self.groups
            .into_iter()
            .flat_map(|(_, members)| members)
            .collect()
    }
}

impl<T> Default for Grouped<T> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<T: Serialize> Serialize for Grouped<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (key, members) in &self.groups {
            map.serialize_entry(key, members)?;
        }
        map.end()
    }
}
