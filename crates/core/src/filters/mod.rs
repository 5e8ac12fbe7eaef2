//! Filter model and normalization for the discovery engine
//!
//! [`FilterSet`] is the canonical, trusted form of a discovery request. Raw
//! key-value input crosses the trust boundary exactly once, through
//! [`rules::normalize`], in either Strict or Safe mode. Everything downstream
//! (pagination, caching, querying) consumes only the canonical form.

mod rules;

pub use rules::{normalize, Mode, ValidationReport};

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::cache::CountryAllowList;
use crate::error::Result;
use crate::types::AdFormat;

/// Page sizes callers may request, ascending
pub const ALLOWED_PAGE_SIZES: [u32; 5] = [6, 12, 24, 48, 96];

/// Upper bound on the page number
pub const MAX_PAGE: u32 = 10_000;

/// Maximum keyword length in characters
pub const MAX_KEYWORD_LEN: usize = 255;

/// Sort orderings, with legacy aliases accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Default,
    Creation,
    Activity,
    Popularity,
    ByCreationDate,
    ByActivity,
    ByPopularity,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "creation" => Some(Self::Creation),
            "activity" => Some(Self::Activity),
            "popularity" => Some(Self::Popularity),
            "byCreationDate" => Some(Self::ByCreationDate),
            "byActivity" => Some(Self::ByActivity),
            "byPopularity" => Some(Self::ByPopularity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Creation => "creation",
            Self::Activity => "activity",
            Self::Popularity => "popularity",
            Self::ByCreationDate => "byCreationDate",
            Self::ByActivity => "byActivity",
            Self::ByPopularity => "byPopularity",
        }
    }

    /// Collapse legacy aliases onto their canonical ordering
    pub fn canonical(&self) -> Self {
        match self {
            Self::ByCreationDate => Self::Creation,
            Self::ByActivity => Self::Activity,
            Self::ByPopularity => Self::Popularity,
            other => *other,
        }
    }
}

/// Relative date-range buckets used by creation and display filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateBucket {
    Default,
    Today,
    Yesterday,
    Last7,
    Last30,
    Last90,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
}

impl DateBucket {
    pub const ALL: [DateBucket; 10] = [
        DateBucket::Default,
        DateBucket::Today,
        DateBucket::Yesterday,
        DateBucket::Last7,
        DateBucket::Last30,
        DateBucket::Last90,
        DateBucket::ThisMonth,
        DateBucket::LastMonth,
        DateBucket::ThisYear,
        DateBucket::LastYear,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "last7" => Some(Self::Last7),
            "last30" => Some(Self::Last30),
            "last90" => Some(Self::Last90),
            "thisMonth" => Some(Self::ThisMonth),
            "lastMonth" => Some(Self::LastMonth),
            "thisYear" => Some(Self::ThisYear),
            "lastYear" => Some(Self::LastYear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7 => "last7",
            Self::Last30 => "last30",
            Self::Last90 => "last90",
            Self::ThisMonth => "thisMonth",
            Self::LastMonth => "lastMonth",
            Self::ThisYear => "thisYear",
            Self::LastYear => "lastYear",
        }
    }

    /// Half-open `[start, end)` time range this bucket denotes, relative to
    /// `now`; `None` for [`DateBucket::Default`] (no constraint)
    pub fn range(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day_start = |t: DateTime<Utc>| {
            Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
                .single()
                .unwrap_or(t)
        };
        let month_start = |year: i32, month: u32| {
            Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
                .single()
                .unwrap_or(now)
        };
        let year_start = |year: i32| month_start(year, 1);

        let today = day_start(now);
        let tomorrow = today + Duration::days(1);

        match self {
            Self::Default => None,
            Self::Today => Some((today, tomorrow)),
            Self::Yesterday => Some((today - Duration::days(1), today)),
            Self::Last7 => Some((now - Duration::days(7), tomorrow)),
            Self::Last30 => Some((now - Duration::days(30), tomorrow)),
            Self::Last90 => Some((now - Duration::days(90), tomorrow)),
            Self::ThisMonth => Some((month_start(now.year(), now.month()), tomorrow)),
            Self::LastMonth => {
                let this = month_start(now.year(), now.month());
                let prev = if now.month() == 1 {
                    month_start(now.year() - 1, 12)
                } else {
                    month_start(now.year(), now.month() - 1)
                };
                Some((prev, this))
            }
            Self::ThisYear => Some((year_start(now.year()), tomorrow)),
            Self::LastYear => Some((year_start(now.year() - 1), year_start(now.year()))),
        }
    }

    /// Whether `t` falls in the bucket; `Default` matches everything
    pub fn contains(&self, t: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.range(now) {
            None => true,
            Some((start, end)) => t >= start && t < end,
        }
    }
}

/// Canonical discovery filter set
///
/// Multi-value fields hold deduplicated, sorted tokens; the serialized field
/// order is fixed, so the JSON form is canonical and [`FilterSet::cache_key`]
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub search_keyword: String,
    pub country: String,
    pub date_creation: DateBucket,
    pub sort_by: SortKey,
    pub period_display: DateBucket,
    pub only_adult: bool,
    pub is_detailed_visible: bool,
    pub page: u32,
    pub per_page: u32,
    pub active_tab: AdFormat,
    pub advertising_networks: Vec<String>,
    pub languages: Vec<String>,
    pub operating_systems: Vec<String>,
    pub browsers: Vec<String>,
    pub devices: Vec<String>,
    pub image_sizes: Vec<String>,
    pub saved_settings: Vec<String>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            search_keyword: String::new(),
            country: "default".to_string(),
            date_creation: DateBucket::Default,
            sort_by: SortKey::Default,
            period_display: DateBucket::Default,
            only_adult: false,
            is_detailed_visible: false,
            page: 1,
            per_page: 12,
            active_tab: AdFormat::Push,
            advertising_networks: Vec::new(),
            languages: Vec::new(),
            operating_systems: Vec::new(),
            browsers: Vec::new(),
            devices: Vec::new(),
            image_sizes: Vec::new(),
            saved_settings: Vec::new(),
        }
    }
}

/// Fields that never count as "active" filters: pagination and UI state
const PRESENTATION_FIELDS: [&str; 4] = ["page", "perPage", "activeTab", "isDetailedVisible"];

impl FilterSet {
    /// The filters that differ from their defaults, excluding presentation
    /// fields (page, perPage, activeTab, isDetailedVisible)
    pub fn active_filters(&self) -> Map<String, Value> {
        let defaults = serde_json::to_value(FilterSet::default())
            .expect("default filter set serializes");
        let current = serde_json::to_value(self).expect("filter set serializes");

        let mut active = Map::new();
        if let (Value::Object(defaults), Value::Object(current)) = (defaults, current) {
            for (key, value) in current {
                if PRESENTATION_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                if defaults.get(&key) != Some(&value) {
                    active.insert(key, value);
                }
            }
        }
        active
    }

    pub fn active_filter_count(&self) -> usize {
        self.active_filters().len()
    }

    pub fn has_active_filters(&self) -> bool {
        !self.active_filters().is_empty()
    }

    pub fn has_search(&self) -> bool {
        !self.search_keyword.is_empty()
    }

    /// Content-derived cache key: hex SHA-256 of the canonical JSON form
    pub fn cache_key(&self) -> String {
        let canonical = serde_json::to_string(self).expect("filter set serializes");
        let digest = Sha256::digest(canonical.as_bytes());
        format!("{digest:x}")
    }

    /// Zero-based item offset of the current page
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Back to defaults, keeping the selected tab
    pub fn reset(&self) -> Self {
        Self {
            active_tab: self.active_tab,
            ..Self::default()
        }
    }

    /// Applied-filter snapshot: every scalar field, with empty multi-value
    /// sets left out
    pub fn to_compact_map(&self) -> Map<String, Value> {
        let current = serde_json::to_value(self).expect("filter set serializes");

        let mut compact = Map::new();
        if let Value::Object(current) = current {
            for (key, value) in current {
                if matches!(&value, Value::Array(items) if items.is_empty()) {
                    continue;
                }
                compact.insert(key, value);
            }
        }
        compact
    }
}

/// Normalizer facade that resolves the country allow-list before applying
/// the per-field rules
pub struct FilterNormalizer {
    countries: Arc<CountryAllowList>,
}

impl FilterNormalizer {
    pub fn new(countries: Arc<CountryAllowList>) -> Self {
        Self { countries }
    }

    /// Safe mode: coerce every invalid field to its default, never fail
    pub async fn sanitize(&self, raw: &Map<String, Value>) -> Result<FilterSet> {
        let countries = self.countries.snapshot().await?;
        Ok(sanitize_with(raw, &countries))
    }

    /// Strict mode: reject invalid input with every field failure reported
    pub async fn validate(&self, raw: &Map<String, Value>) -> Result<FilterSet> {
        let countries = self.countries.snapshot().await?;
        Ok(rules::normalize(raw, Mode::Strict, &countries)?)
    }

    /// Strict mode, surfacing the report instead of failing the call
    pub async fn check(
        &self,
        raw: &Map<String, Value>,
    ) -> Result<std::result::Result<FilterSet, ValidationReport>> {
        let countries = self.countries.snapshot().await?;
        Ok(rules::normalize(raw, Mode::Strict, &countries))
    }
}

/// Pure Safe-mode normalization against a known country set
pub fn sanitize_with(raw: &Map<String, Value>, countries: &HashSet<String>) -> FilterSet {
    match rules::normalize(raw, Mode::Safe, countries) {
        Ok(filters) => filters,
        // Safe mode coerces every failure; this arm is unreachable
        Err(_) => FilterSet::default(),
    }
}
