//! Hash collections used across Lumina.
//!
//! Font tables are keyed by small integers (glyph ids, tags), where AHash is
//! considerably faster than SipHash.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert(7u16, "glyph");
        assert_eq!(map.get(&7), Some(&"glyph"));
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        set.insert(42u16);
        assert!(set.contains(&42));
        assert!(!set.insert(42));
    }
}
