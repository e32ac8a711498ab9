//! Serde helpers for canonical text
//!
//! Hash-based containers iterate in an unspecified order, which would make
//! the text of two equal nodes differ. Fields of those types are written
//! through these helpers, which emit the entries sorted by key.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;

use serde::{Serialize, Serializer};

/// Serialize a `HashMap<K, V>` with its entries sorted by key
pub fn ordered_map<S, K, V, H>(map: &HashMap<K, V, H>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Serialize + Ord,
    V: Serialize,
    H: BuildHasher,
{
    let sorted: BTreeMap<&K, &V> = map.iter().collect();
    sorted.serialize(serializer)
}

/// Serialize a `HashSet<T>` as a sorted sequence
pub fn ordered_set<S, T, H>(set: &HashSet<T, H>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + Ord,
    H: BuildHasher,
{
    let sorted: BTreeSet<&T> = set.iter().collect();
    sorted.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Tags {
        #[serde(serialize_with = "ordered_map")]
        weights: HashMap<String, u32>,
        #[serde(serialize_with = "ordered_set")]
        labels: HashSet<&'static str>,
    }

    #[test]
    fn test_entries_sorted() {
        let weights = ["zeta", "alpha", "mid"]
            .iter()
            .enumerate()
            .map(|(i, k)| (k.to_string(), i as u32))
            .collect();
        let labels = ["b", "c", "a"].into_iter().collect();
        let text = serde_json::to_string(&Tags { weights, labels }).unwrap();
        assert_eq!(text, r#"{"weights":{"alpha":1,"mid":2,"zeta":0},"labels":["a","b","c"]}"#);
    }
}
