// Encoder-side string cache backing shared-string back-references.
//
// Maps string content to the offset where it was last written. Entries are
// kept per `CacheKind`: a `Standalone` offset points at raw UTF-8 bytes, a
// `PrefixLengthVarintPlusOne` offset points at a length-prefixed string (or
// at a pointer to one). The decoder needs no cache; it follows distances.

use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Strings shorter than this are cheaper to repeat than to reference.
pub const DEFAULT_MIN_STRING_LENGTH: usize = 3;

/// Upper bound on the total content held by the cache (20 MiB).
pub const DEFAULT_MAX_BYTE_SIZE: usize = 20 * 1024 * 1024;

/// Tuning knobs for the string cache. Changing them affects output size,
/// never decodability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Strings shorter than this many bytes are never recorded.
    pub min_string_length: usize,
    /// Total recorded bytes stay below this; oldest entries are evicted.
    pub max_byte_size: usize,
}

impl CacheConfig {
    /// A configuration that records nothing, so no string is ever shared.
    pub const fn disabled() -> Self {
        Self {
            min_string_length: usize::MAX,
            max_byte_size: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_string_length: DEFAULT_MIN_STRING_LENGTH,
            max_byte_size: DEFAULT_MAX_BYTE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// What a recorded offset points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Standalone,
    PrefixLengthVarintPlusOne,
}

impl CacheKind {
    #[inline]
    fn slot(self) -> usize {
        match self {
            CacheKind::Standalone => 0,
            CacheKind::PrefixLengthVarintPlusOne => 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cache {
    config: CacheConfig,
    entries: [HashMap<String, u64>; 2],
    /// Offset -> entry, oldest first.
    order: BTreeMap<u64, (CacheKind, String)>,
    byte_size: usize,
}

impl Cache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            entries: [HashMap::new(), HashMap::new()],
            order: BTreeMap::new(),
            byte_size: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of recorded entries across both kinds.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total content bytes currently recorded.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Offset of the most recent recording of `value` as `kind`.
    pub fn find(&self, value: &str, kind: CacheKind) -> Option<u64> {
        if !self.is_cacheable(value) {
            return None;
        }
        self.entries[kind.slot()].get(value).copied()
    }

    /// Record `value` as written at `offset`.
    ///
    /// Existing entries move forward to a later offset and are otherwise
    /// left alone. Strings outside the configured size window are ignored.
    pub fn record(&mut self, value: &str, offset: u64, kind: CacheKind) {
        if !self.is_cacheable(value) {
            return;
        }

        if let Some(&previous) = self.entries[kind.slot()].get(value) {
            if offset > previous {
                self.order.remove(&previous);
                self.insert_order(offset, kind, value);
                self.entries[kind.slot()].insert(value.to_owned(), offset);
            }
            return;
        }

        while !self.order.is_empty() && self.byte_size + value.len() >= self.config.max_byte_size {
            self.evict_oldest();
        }

        self.byte_size += value.len();
        self.insert_order(offset, kind, value);
        self.entries[kind.slot()].insert(value.to_owned(), offset);
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(HashMap::clear);
        self.order.clear();
        self.byte_size = 0;
    }

    /// Empty strings occupy no bytes, so two of them could share an offset.
    #[inline]
    fn is_cacheable(&self, value: &str) -> bool {
        !value.is_empty()
            && value.len() >= self.config.min_string_length
            && value.len() < self.config.max_byte_size
    }

    fn insert_order(&mut self, offset: u64, kind: CacheKind, value: &str) {
        let displaced = self.order.insert(offset, (kind, value.to_owned()));
        debug_assert!(displaced.is_none(), "two cache entries at offset {offset}");
    }

    fn evict_oldest(&mut self) {
        if let Some((offset, (kind, value))) = self.order.pop_first() {
            log::trace!("string cache: evicting {} bytes recorded at {offset}", value.len());
            self.entries[kind.slot()].remove(&value);
            self.byte_size -= value.len();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_finds_by_kind() {
        let mut cache = Cache::new();
        assert_eq!(cache.find("foo", CacheKind::Standalone), None);
        cache.record("foo", 1, CacheKind::Standalone);
        assert_eq!(cache.find("foo", CacheKind::Standalone), Some(1));
        assert_eq!(cache.find("foo", CacheKind::PrefixLengthVarintPlusOne), None);

        cache.record("foo", 0, CacheKind::PrefixLengthVarintPlusOne);
        assert_eq!(cache.find("foo", CacheKind::PrefixLengthVarintPlusOne), Some(0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn short_strings_are_never_recorded() {
        let mut cache = Cache::new();
        cache.record("ab", 0, CacheKind::Standalone);
        cache.record("", 5, CacheKind::Standalone);
        assert!(cache.is_empty());
        assert_eq!(cache.find("ab", CacheKind::Standalone), None);

        let mut permissive = Cache::with_config(CacheConfig {
            min_string_length: 0,
            max_byte_size: 64,
        });
        permissive.record("", 5, CacheKind::Standalone);
        permissive.record("", 5, CacheKind::PrefixLengthVarintPlusOne);
        assert!(permissive.is_empty());
    }

    #[test]
    fn later_offsets_bump_entries() {
        let mut cache = Cache::new();
        cache.record("hello", 10, CacheKind::Standalone);
        cache.record("hello", 4, CacheKind::Standalone);
        assert_eq!(cache.find("hello", CacheKind::Standalone), Some(10));
        cache.record("hello", 30, CacheKind::Standalone);
        assert_eq!(cache.find("hello", CacheKind::Standalone), Some(30));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.byte_size(), 5);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = Cache::with_config(CacheConfig {
            min_string_length: 3,
            max_byte_size: 10,
        });
        cache.record("aaaa", 0, CacheKind::Standalone);
        cache.record("bbbb", 4, CacheKind::Standalone);
        assert_eq!(cache.byte_size(), 8);
        // 8 + 4 >= 10: the oldest entry goes.
        cache.record("cccc", 8, CacheKind::Standalone);
        assert_eq!(cache.find("aaaa", CacheKind::Standalone), None);
        assert_eq!(cache.find("bbbb", CacheKind::Standalone), Some(4));
        assert_eq!(cache.find("cccc", CacheKind::Standalone), Some(8));
        assert_eq!(cache.byte_size(), 8);

        // Too large to ever record.
        cache.record("0123456789", 12, CacheKind::Standalone);
        assert_eq!(cache.find("0123456789", CacheKind::Standalone), None);
    }

    #[test]
    fn disabled_cache_records_nothing() {
        let mut cache = Cache::with_config(CacheConfig::disabled());
        cache.record("hello", 0, CacheKind::Standalone);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_resets_state() {
        let mut cache = Cache::new();
        cache.record("hello", 0, CacheKind::Standalone);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.byte_size(), 0);
        assert_eq!(cache.find("hello", CacheKind::Standalone), None);
    }
}
