//! Section model
//!
//! The site content is a fixed set of named sections. Each section kind
//! carries its own update rule:
//!
//! | Section      | Shape            | Update rule |
//! |--------------|------------------|-------------|
//! | `hero`       | object of fields | merge       |
//! | `services`   | ordered list     | replace     |
//! | `philosophy` | object of fields | merge       |
//!
//! Field values are opaque JSON. Payloads are never rejected: an object
//! sent to a merge section is merged, and any other payload replaces the
//! section and is stored exactly as sent ([`RawSection`]). A `null` sent to
//! a merge section changes nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use thiserror::Error;
use utoipa::ToSchema;

/// Field name -> opaque value.
pub type Fields = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("stored content is not a JSON object")]
    MalformedDocument,
}

// ============================================================================
// Section names
// ============================================================================

/// Stable identifier of a content section.
///
/// Ordering follows the page layout, which is also the key order of
/// serialized snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionName {
    Hero,
    Services,
    Philosophy,
}

/// How an update payload is applied to the stored section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Payload keys overwrite same-named fields, other fields are kept.
    Merge,
    /// Payload substitutes the whole section.
    Replace,
}

impl SectionName {
    pub const ALL: [SectionName; 3] = [
        SectionName::Hero,
        SectionName::Services,
        SectionName::Philosophy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Services => "services",
            Self::Philosophy => "philosophy",
        }
    }

    pub fn update_rule(self) -> UpdateRule {
        match self {
            Self::Hero | Self::Philosophy => UpdateRule::Merge,
            Self::Services => UpdateRule::Replace,
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hero" => Ok(Self::Hero),
            "services" => Ok(Self::Services),
            "philosophy" => Ok(Self::Philosophy),
            other => Err(SectionError::UnknownSection(other.to_string())),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HeroSection(pub Fields);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ServiceListSection(pub Vec<Value>);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PhilosophySection(pub Fields);

/// Section value whose shape does not match its kind, kept as sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub name: SectionName,
    pub value: Value,
}

/// Stored value of one section. Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Hero(HeroSection),
    Services(ServiceListSection),
    Philosophy(PhilosophySection),
    Raw(RawSection),
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Hero(section) => section.serialize(serializer),
            Self::Services(section) => section.serialize(serializer),
            Self::Philosophy(section) => section.serialize(serializer),
            Self::Raw(raw) => raw.value.serialize(serializer),
        }
    }
}

impl Section {
    pub fn name(&self) -> SectionName {
        match self {
            Self::Hero(_) => SectionName::Hero,
            Self::Services(_) => SectionName::Services,
            Self::Philosophy(_) => SectionName::Philosophy,
            Self::Raw(raw) => raw.name,
        }
    }

    /// Seed value used when the store starts empty.
    pub fn defaults(name: SectionName) -> Self {
        match name {
            SectionName::Hero => Self::Hero(HeroSection(object(json!({
                "subtitle": "The Conscious Architect",
                "title": "Karmic Intelligence",
                "description": "Blending ancient Vedic wisdom with modern insights, Karmic Intelligence empowers personal and professional growth."
            })))),
            SectionName::Services => Self::Services(ServiceListSection(vec![
                json!({
                    "id": 1,
                    "title": "Astro-Vastu Consultation",
                    "description": "Optimize your residential and commercial spaces using astronomical and architectural alignment.",
                    "icon": "Building2"
                }),
                json!({
                    "id": 2,
                    "title": "Education (Astro Granth)",
                    "description": "Advanced vedic knowledge with 8,800+ students and 9+ courses.",
                    "icon": "Book"
                }),
            ])),
            SectionName::Philosophy => Self::Philosophy(PhilosophySection(object(json!({
                "title": "Our Philosophy",
                "content": "Blending ancient wisdom with modern science..."
            })))),
        }
    }

    /// Rebuild a section from its persisted JSON value.
    pub fn from_value(name: SectionName, value: Value) -> Self {
        match (name.update_rule(), value) {
            (UpdateRule::Merge, Value::Null) => Self::Raw(RawSection {
                name,
                value: Value::Null,
            }),
            (_, value) => SectionUpdate::parse(name, value).into_section(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Hero(HeroSection(fields)) | Self::Philosophy(PhilosophySection(fields)) => {
                Value::Object(fields.clone())
            }
            Self::Services(ServiceListSection(items)) => Value::Array(items.clone()),
            Self::Raw(raw) => raw.value.clone(),
        }
    }

    /// Field lookup for object-shaped sections.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Hero(HeroSection(fields)) | Self::Philosophy(PhilosophySection(fields)) => {
                fields.get(key)
            }
            Self::Services(_) | Self::Raw(_) => None,
        }
    }

    /// Items of a list-shaped section.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Self::Services(ServiceListSection(items)) => Some(items),
            _ => None,
        }
    }

    /// Apply an update in place according to the section's rule.
    pub fn apply(&mut self, update: SectionUpdate) {
        match (self, update) {
            (_, SectionUpdate::Hero(patch) | SectionUpdate::Philosophy(patch))
                if patch.is_empty() => {}
            (Self::Hero(HeroSection(fields)), SectionUpdate::Hero(patch))
            | (Self::Philosophy(PhilosophySection(fields)), SectionUpdate::Philosophy(patch)) => {
                fields.extend(patch);
            }
            (slot, update) => *slot = update.into_section(),
        }
    }
}

fn object(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}

// ============================================================================
// Updates
// ============================================================================

/// A write request for one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    /// Partial hero fields.
    Hero(Fields),
    /// Full ordered service list.
    Services(Vec<Value>),
    /// Partial philosophy fields.
    Philosophy(Fields),
    /// Payload of another shape; replaces the section as sent.
    Raw(RawSection),
}

impl SectionUpdate {
    /// Classify a payload by the section kind. Never fails.
    pub fn parse(name: SectionName, payload: Value) -> Self {
        match (name, payload) {
            (SectionName::Hero, Value::Object(fields)) => Self::Hero(fields),
            (SectionName::Philosophy, Value::Object(fields)) => Self::Philosophy(fields),
            (SectionName::Hero, Value::Null) => Self::Hero(Fields::new()),
            (SectionName::Philosophy, Value::Null) => Self::Philosophy(Fields::new()),
            (SectionName::Services, Value::Array(items)) => Self::Services(items),
            (name, value) => Self::Raw(RawSection { name, value }),
        }
    }

    pub fn name(&self) -> SectionName {
        match self {
            Self::Hero(_) => SectionName::Hero,
            Self::Services(_) => SectionName::Services,
            Self::Philosophy(_) => SectionName::Philosophy,
            Self::Raw(raw) => raw.name,
        }
    }

    pub fn rule(&self) -> UpdateRule {
        match self {
            Self::Raw(_) => UpdateRule::Replace,
            other => other.name().update_rule(),
        }
    }

    pub fn into_section(self) -> Section {
        match self {
            Self::Hero(fields) => Section::Hero(HeroSection(fields)),
            Self::Services(items) => Section::Services(ServiceListSection(items)),
            Self::Philosophy(fields) => Section::Philosophy(PhilosophySection(fields)),
            Self::Raw(raw) => Section::Raw(raw),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Full section mapping, as returned to readers and persisted by the
/// document layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContentSnapshot(BTreeMap<SectionName, Section>);

impl ContentSnapshot {
    pub fn defaults() -> Self {
        Self::from_sections(std::iter::empty())
    }

    /// Build a snapshot from the given sections; any section missing from
    /// the input is filled with its default.
    pub fn from_sections(sections: impl IntoIterator<Item = Section>) -> Self {
        let mut map: BTreeMap<SectionName, Section> = sections
            .into_iter()
            .map(|section| (section.name(), section))
            .collect();
        for name in SectionName::ALL {
            map.entry(name).or_insert_with(|| Section::defaults(name));
        }
        Self(map)
    }

    /// Parse a persisted `{ "hero": {...}, "services": [...], ... }` document.
    /// Unknown keys are skipped.
    pub fn from_value(value: Value) -> Result<Self, SectionError> {
        let Value::Object(entries) = value else {
            return Err(SectionError::MalformedDocument);
        };
        let mut sections = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match key.parse::<SectionName>() {
                Ok(name) => sections.push(Section::from_value(name, value)),
                Err(_) => tracing::warn!(key = %key, "ignoring unknown section in stored document"),
            }
        }
        Ok(Self::from_sections(sections))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, section)| (name.to_string(), section.to_value()))
                .collect(),
        )
    }

    pub fn get(&self, name: SectionName) -> Option<&Section> {
        self.0.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(snapshot: &ContentSnapshot) -> &Section {
        snapshot.get(SectionName::Hero).unwrap()
    }

    #[test]
    fn test_defaults_cover_every_section() {
        let snapshot = ContentSnapshot::defaults();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            hero(&snapshot).field("title"),
            Some(&json!("Karmic Intelligence"))
        );
        assert_eq!(
            snapshot
                .get(SectionName::Services)
                .and_then(Section::items)
                .map(<[Value]>::len),
            Some(2)
        );
    }

    #[test]
    fn test_snapshot_serializes_in_layout_order() {
        let json = serde_json::to_string(&ContentSnapshot::defaults()).unwrap();
        let hero = json.find("\"hero\"").unwrap();
        let services = json.find("\"services\"").unwrap();
        let philosophy = json.find("\"philosophy\"").unwrap();
        assert!(hero < services && services < philosophy);
    }

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut section = Section::defaults(SectionName::Hero);
        let update = SectionUpdate::parse(SectionName::Hero, json!({"title": "New Title"}));
        section.apply(update);

        assert_eq!(section.field("title"), Some(&json!("New Title")));
        assert_eq!(
            section.field("subtitle"),
            Some(&json!("The Conscious Architect"))
        );
        assert!(section.field("description").is_some());
    }

    #[test]
    fn test_merge_adds_new_fields() {
        let mut section = Section::defaults(SectionName::Philosophy);
        section.apply(SectionUpdate::Philosophy(object(json!({"quote": "Be still"}))));
        assert_eq!(section.field("quote"), Some(&json!("Be still")));
        assert_eq!(section.field("title"), Some(&json!("Our Philosophy")));
    }

    #[test]
    fn test_services_replace_whole_list() {
        let mut section = Section::defaults(SectionName::Services);
        let update = SectionUpdate::parse(
            SectionName::Services,
            json!([{"id": 9, "title": "Only", "description": "", "icon": "Star"}]),
        );
        section.apply(update);

        let items = section.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], json!(9));
    }

    #[test]
    fn test_wrong_shape_is_stored_as_sent() {
        let mut services = Section::defaults(SectionName::Services);
        services.apply(SectionUpdate::parse(SectionName::Services, json!({"id": 1})));
        assert_eq!(services.name(), SectionName::Services);
        assert_eq!(services.to_value(), json!({"id": 1}));
        assert_eq!(services.items(), None);

        let mut hero = Section::defaults(SectionName::Hero);
        hero.apply(SectionUpdate::parse(SectionName::Hero, json!(["a"])));
        assert_eq!(hero.to_value(), json!(["a"]));
        assert_eq!(serde_json::to_value(&hero).unwrap(), json!(["a"]));

        let update = SectionUpdate::parse(SectionName::Philosophy, json!("text"));
        assert_eq!(update.rule(), UpdateRule::Replace);
        assert_eq!(update.into_section().to_value(), json!("text"));
    }

    #[test]
    fn test_object_after_raw_value_starts_fresh() {
        let mut hero = Section::defaults(SectionName::Hero);
        hero.apply(SectionUpdate::parse(SectionName::Hero, json!(42)));
        hero.apply(SectionUpdate::parse(SectionName::Hero, json!({"title": "Back"})));
        assert_eq!(hero.to_value(), json!({"title": "Back"}));
    }

    #[test]
    fn test_null_or_empty_patch_changes_nothing() {
        let mut hero = Section::defaults(SectionName::Hero);
        hero.apply(SectionUpdate::parse(SectionName::Hero, Value::Null));
        hero.apply(SectionUpdate::parse(SectionName::Hero, json!({})));
        assert_eq!(hero, Section::defaults(SectionName::Hero));

        let mut services = Section::defaults(SectionName::Services);
        services.apply(SectionUpdate::parse(SectionName::Services, Value::Null));
        assert_eq!(services.to_value(), Value::Null);
    }

    #[test]
    fn test_opaque_field_values_are_kept() {
        let payload = json!({"title": 42, "cta": {"label": "Book", "href": "/book"}});
        let section = Section::from_value(SectionName::Hero, payload.clone());
        assert_eq!(section.to_value(), payload);
    }

    #[test]
    fn test_snapshot_from_value_fills_missing_and_skips_unknown() {
        let snapshot = ContentSnapshot::from_value(json!({
            "hero": {"title": "Stored"},
            "footer": {"text": "ignored"}
        }))
        .unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(hero(&snapshot).field("title"), Some(&json!("Stored")));
        assert_eq!(hero(&snapshot).field("subtitle"), None);
        assert_eq!(
            snapshot.get(SectionName::Philosophy),
            Some(&Section::defaults(SectionName::Philosophy))
        );
    }

    #[test]
    fn test_stored_values_of_any_shape_load() {
        let snapshot = ContentSnapshot::from_value(json!({
            "hero": null,
            "services": "oops"
        }))
        .unwrap();
        assert_eq!(hero(&snapshot).to_value(), Value::Null);
        assert_eq!(
            snapshot.get(SectionName::Services).map(Section::to_value),
            Some(json!("oops"))
        );
    }

    #[test]
    fn test_section_name_round_trip_and_unknown() {
        for name in SectionName::ALL {
            assert_eq!(name.as_str().parse::<SectionName>().unwrap(), name);
        }
        assert_eq!(
            "footer".parse::<SectionName>(),
            Err(SectionError::UnknownSection("footer".into()))
        );
    }
}
