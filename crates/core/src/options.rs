//! Filter option catalogs
//!
//! Catalog sources arrive in three shapes (bare tokens, value/label pairs,
//! full entries); all three normalize to the same [`SelectableOption`]
//! record. Counted catalogs back-fill missing counts with 0 so the option
//! list is stable across refreshes even when a dimension drops to zero
//! observed items.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::filters::{DateBucket, SortKey, ALLOWED_PAGE_SIZES};
use crate::types::AdFormat;

/// One selectable entry of a filter catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub selected: bool,
    /// Icon or logo URL shown next to the option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Group tag for catalogs rendered in sections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Explicit sort position overriding source order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    /// Nested options for hierarchical catalogs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SelectableOption>>,
}

/// A catalog entry with an explicit value and label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// The input shapes a catalog source may take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    /// Bare tokens; value and label are the same string
    Tokens(Vec<String>),
    /// (value, label) pairs
    Labeled(Vec<(String, String)>),
    /// Structured entries
    Entries(Vec<OptionEntry>),
}

impl OptionSource {
    fn entries(&self) -> Vec<OptionEntry> {
        match self {
            Self::Tokens(tokens) => tokens
                .iter()
                .map(|t| OptionEntry {
                    value: t.clone(),
                    label: t.clone(),
                    ..OptionEntry::default()
                })
                .collect(),
            Self::Labeled(pairs) => pairs
                .iter()
                .map(|(value, label)| OptionEntry {
                    value: value.clone(),
                    label: label.clone(),
                    ..OptionEntry::default()
                })
                .collect(),
            Self::Entries(entries) => entries.clone(),
        }
    }
}

/// Normalize a catalog source into options, marking membership in `selected`
///
/// Entries with an empty value are skipped.
pub fn build(source: &OptionSource, selected: &HashSet<String>) -> Vec<SelectableOption> {
    source
        .entries()
        .into_iter()
        .filter(|entry| !entry.value.is_empty())
        .map(|entry| SelectableOption {
            selected: selected.contains(&entry.value),
            value: entry.value,
            label: entry.label,
            count: None,
            logo: entry.logo,
            group: entry.group,
            sort_order: entry.sort_order,
            children: None,
        })
        .collect()
}

/// Like [`build`], attaching an observed count to each option
///
/// Options with no entry in `counts` get 0, never a missing field.
pub fn build_with_counts(
    source: &OptionSource,
    selected: &HashSet<String>,
    counts: &HashMap<String, u64>,
) -> Vec<SelectableOption> {
    build(source, selected)
        .into_iter()
        .map(|mut option| {
            option.count = Some(counts.get(&option.value).copied().unwrap_or(0));
            option
        })
        .collect()
}

/// Sort catalog (canonical keys only; legacy aliases are accepted on input
/// but never offered)
pub fn sort_source() -> OptionSource {
    OptionSource::Labeled(vec![
        (SortKey::Default.as_str().to_string(), "Default".to_string()),
        (
            SortKey::Creation.as_str().to_string(),
            "By creation date".to_string(),
        ),
        (
            SortKey::Activity.as_str().to_string(),
            "By activity".to_string(),
        ),
        (
            SortKey::Popularity.as_str().to_string(),
            "By popularity".to_string(),
        ),
    ])
}

/// Date-range catalog over every bucket
pub fn date_range_source() -> OptionSource {
    let label = |bucket: DateBucket| match bucket {
        DateBucket::Default => "All time",
        DateBucket::Today => "Today",
        DateBucket::Yesterday => "Yesterday",
        DateBucket::Last7 => "Last 7 days",
        DateBucket::Last30 => "Last 30 days",
        DateBucket::Last90 => "Last 90 days",
        DateBucket::ThisMonth => "This month",
        DateBucket::LastMonth => "Last month",
        DateBucket::ThisYear => "This year",
        DateBucket::LastYear => "Last year",
    };
    OptionSource::Labeled(
        DateBucket::ALL
            .iter()
            .map(|bucket| (bucket.as_str().to_string(), label(*bucket).to_string()))
            .collect(),
    )
}

/// Page-size catalog
pub fn per_page_source() -> OptionSource {
    OptionSource::Tokens(ALLOWED_PAGE_SIZES.iter().map(|n| n.to_string()).collect())
}

/// Image aspect-ratio catalog
pub fn image_size_source() -> OptionSource {
    OptionSource::Tokens(
        ["1x1", "2x3", "3x2", "4x3", "9x16", "16x9", "21x9"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

/// Tab catalog, one entry per ad format
pub fn tab_source() -> OptionSource {
    OptionSource::Tokens(
        AdFormat::ALL
            .iter()
            .map(|format| format.as_str().to_string())
            .collect(),
    )
}
