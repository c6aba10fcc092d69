use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Storage behind a `LoaderWorker`.
///
/// Only two operations add entries: [`Cache::get_or_insert`], used when a dispatch completes, and
/// [`Cache::replace`], used when a caller primes a value. Everything else reads or removes.
pub trait Cache {
    type K;
    type V;

    fn get(&self, key: &Self::K) -> Option<&Self::V>;

    /// Inserts `value` unless the key is already present. Returns the value that ends up cached.
    fn get_or_insert(&mut self, key: Self::K, value: Self::V) -> &Self::V;

    /// Inserts `value`, overwriting any existing entry.
    fn replace(&mut self, key: Self::K, value: Self::V);

    fn remove(&mut self, keys: &[Self::K]);
    fn flush(&mut self);
}

impl<K, V, S: BuildHasher> Cache for HashMap<K, V, S>
where
    K: Eq + Hash,
{
    type K = K;
    type V = V;

    fn get(&self, key: &Self::K) -> Option<&Self::V> {
        HashMap::get(self, key)
    }

    fn get_or_insert(&mut self, key: Self::K, value: Self::V) -> &Self::V {
        self.entry(key).or_insert(value)
    }

    fn replace(&mut self, key: Self::K, value: Self::V) {
        self.insert(key, value);
    }

    fn remove(&mut self, keys: &[Self::K]) {
        for key in keys.iter() {
            HashMap::remove(self, key);
        }
    }

    fn flush(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_keeps_existing_entry() {
        let mut cache: HashMap<String, u32> = HashMap::new();
        cache.replace("a".to_owned(), 1);
        assert_eq!(*Cache::get_or_insert(&mut cache, "a".to_owned(), 2), 1);
        assert_eq!(*Cache::get_or_insert(&mut cache, "b".to_owned(), 3), 3);
    }

    #[test]
    fn replace_overwrites_and_remove_clears() {
        let mut cache: HashMap<String, u32> = HashMap::new();
        cache.replace("a".to_owned(), 1);
        cache.replace("a".to_owned(), 2);
        assert_eq!(Cache::get(&cache, &"a".to_owned()), Some(&2));

        Cache::remove(&mut cache, &["a".to_owned()]);
        assert_eq!(Cache::get(&cache, &"a".to_owned()), None);

        cache.replace("b".to_owned(), 1);
        cache.flush();
        assert!(cache.is_empty());
    }
}
