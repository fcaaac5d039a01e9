//! In-process section cache
//!
//! Sections live in a sharded map. An update holds the section's shard
//! lock for the whole merge/replace, so a concurrent reader sees either
//! the previous or the next value, never a half-merged one. Updates to
//! different sections do not wait on each other unless they share a shard.

use dashmap::DashMap;

use super::section::{ContentSnapshot, Section, SectionName, SectionUpdate};

#[derive(Debug)]
pub struct SectionCache {
    sections: DashMap<SectionName, Section>,
}

impl SectionCache {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        let sections = DashMap::with_capacity(SectionName::ALL.len());
        for section in snapshot.iter() {
            sections.insert(section.name(), section.clone());
        }
        Self { sections }
    }

    /// Cache holding the default seed content.
    pub fn seeded() -> Self {
        Self::new(ContentSnapshot::defaults())
    }

    pub fn get(&self, name: SectionName) -> Section {
        self.sections
            .get(&name)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Section::defaults(name))
    }

    /// Copy of every section.
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot::from_sections(
            self.sections
                .iter()
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>(),
        )
    }

    /// Apply the update atomically and return the resulting section.
    pub fn apply(&self, update: SectionUpdate) -> Section {
        let name = update.name();
        let mut entry = self
            .sections
            .entry(name)
            .or_insert_with(|| Section::defaults(name));
        entry.value_mut().apply(update);
        entry.value().clone()
    }

    /// Overwrite every section, e.g. after loading from a durable backend.
    pub fn replace_all(&self, snapshot: &ContentSnapshot) {
        for section in snapshot.iter() {
            self.sections.insert(section.name(), section.clone());
        }
    }
}

impl Default for SectionCache {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn hero_patch(value: serde_json::Value) -> SectionUpdate {
        SectionUpdate::parse(SectionName::Hero, value)
    }

    #[test]
    fn test_seeded_cache_matches_defaults() {
        let cache = SectionCache::seeded();
        assert_eq!(cache.snapshot(), ContentSnapshot::defaults());
    }

    #[test]
    fn test_apply_returns_merged_section() {
        let cache = SectionCache::seeded();
        let section = cache.apply(hero_patch(json!({"title": "New Title"})));
        assert_eq!(section.field("title"), Some(&json!("New Title")));
        assert_eq!(cache.get(SectionName::Hero), section);
    }

    #[test]
    fn test_concurrent_updates_to_different_sections() {
        let cache = Arc::new(SectionCache::seeded());
        std::thread::scope(|s| {
            s.spawn(|| cache.apply(hero_patch(json!({"title": "Concurrent"}))));
            s.spawn(|| {
                cache.apply(SectionUpdate::Services(vec![json!({"id": 7})]));
            });
        });

        let snapshot = cache.snapshot();
        assert_eq!(
            snapshot.get(SectionName::Hero).unwrap().field("title"),
            Some(&json!("Concurrent"))
        );
        assert_eq!(
            snapshot.get(SectionName::Services).unwrap().items().unwrap(),
            &[json!({"id": 7})]
        );
    }

    #[test]
    fn test_readers_never_see_partial_merge() {
        let cache = Arc::new(SectionCache::seeded());
        cache.apply(hero_patch(json!({"a": 0, "b": 0})));

        std::thread::scope(|s| {
            let writer = Arc::clone(&cache);
            s.spawn(move || {
                for i in 1..=500 {
                    writer.apply(hero_patch(json!({"a": i, "b": i})));
                }
            });
            for _ in 0..4 {
                let reader = Arc::clone(&cache);
                s.spawn(move || {
                    for _ in 0..500 {
                        let hero = reader.get(SectionName::Hero);
                        assert_eq!(hero.field("a"), hero.field("b"));
                    }
                });
            }
        });
    }

    #[test]
    fn test_replace_all_overwrites_sections() {
        let cache = SectionCache::seeded();
        let stored = ContentSnapshot::from_value(json!({"philosophy": {"title": "Stored"}})).unwrap();
        cache.replace_all(&stored);
        assert_eq!(
            cache.get(SectionName::Philosophy).field("title"),
            Some(&json!("Stored"))
        );
    }
}
