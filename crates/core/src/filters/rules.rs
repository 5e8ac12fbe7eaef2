//! Per-field normalization rules shared by Strict and Safe modes
//!
//! Each field declares its parse/validate logic and its coercion fallback in
//! one place. Strict mode collects every failure into a [`ValidationReport`];
//! Safe mode applies the fallback silently and never fails.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::filters::{DateBucket, FilterSet, SortKey, ALLOWED_PAGE_SIZES, MAX_KEYWORD_LEN, MAX_PAGE};
use crate::types::AdFormat;

/// Normalization mode: reject-with-report or coerce-to-default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Safe,
}

/// Aggregated field-level validation failures from Strict mode
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", messages.join(", "))]
pub struct ValidationReport {
    pub messages: Vec<String>,
}

impl ValidationReport {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Outcome of one field rule: the value to use, or an error plus fallback
type FieldOutcome<T> = std::result::Result<T, (String, T)>;

struct Collector {
    mode: Mode,
    errors: Vec<String>,
}

impl Collector {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Resolve a field outcome under the current mode
    fn resolve<T>(&mut self, outcome: FieldOutcome<T>) -> T {
        match outcome {
            Ok(value) => value,
            Err((message, fallback)) => {
                if self.mode == Mode::Strict {
                    self.errors.push(message);
                }
                fallback
            }
        }
    }
}

/// Normalize raw key-value input into a [`FilterSet`]
///
/// `countries` is the active-country allow-list (upper-case ISO-2 codes).
/// Returns the filter set and, in Strict mode, every validation failure.
pub fn normalize(
    raw: &Map<String, Value>,
    mode: Mode,
    countries: &HashSet<String>,
) -> std::result::Result<FilterSet, ValidationReport> {
    let mut collector = Collector::new(mode);

    let filters = FilterSet {
        search_keyword: collector.resolve(keyword_rule(raw.get("searchKeyword"))),
        country: collector.resolve(country_rule(raw.get("country"), countries)),
        date_creation: collector.resolve(bucket_rule(raw.get("dateCreation"), "dateCreation")),
        sort_by: collector.resolve(sort_rule(raw.get("sortBy"))),
        period_display: collector.resolve(bucket_rule(raw.get("periodDisplay"), "periodDisplay")),
        only_adult: collector.resolve(bool_rule(raw.get("onlyAdult"), "onlyAdult")),
        is_detailed_visible: collector.resolve(bool_rule(
            raw.get("isDetailedVisible"),
            "isDetailedVisible",
        )),
        page: collector.resolve(page_rule(raw.get("page"))),
        per_page: collector.resolve(per_page_rule(raw.get("perPage"))),
        active_tab: collector.resolve(tab_rule(raw.get("activeTab"))),
        advertising_networks: collector
            .resolve(set_rule(raw.get("advertisingNetworks"), "advertisingNetworks")),
        languages: collector.resolve(set_rule(raw.get("languages"), "languages")),
        operating_systems: collector
            .resolve(set_rule(raw.get("operatingSystems"), "operatingSystems")),
        browsers: collector.resolve(set_rule(raw.get("browsers"), "browsers")),
        devices: collector.resolve(set_rule(raw.get("devices"), "devices")),
        image_sizes: collector.resolve(set_rule(raw.get("imageSizes"), "imageSizes")),
        saved_settings: collector.resolve(set_rule(raw.get("savedSettings"), "savedSettings")),
    };

    if collector.errors.is_empty() {
        Ok(filters)
    } else {
        Err(ValidationReport::new(collector.errors))
    }
}

/// Trimmed, tag-stripped keyword bounded to [`MAX_KEYWORD_LEN`] characters
fn keyword_rule(value: Option<&Value>) -> FieldOutcome<String> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(String::new()),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err((
                "searchKeyword must be a string".to_string(),
                String::new(),
            ))
        }
    };

    let cleaned = strip_tags(raw).trim().to_string();
    if cleaned.chars().count() > MAX_KEYWORD_LEN {
        let truncated: String = cleaned.chars().take(MAX_KEYWORD_LEN).collect();
        return Err((
            format!("searchKeyword must be less than {MAX_KEYWORD_LEN} characters"),
            truncated,
        ));
    }
    Ok(cleaned)
}

/// Remove markup tags from user input, dropping any dangling open tag
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// "default" or a known active ISO-2 code, case-insensitive, stored upper-case
fn country_rule(value: Option<&Value>, countries: &HashSet<String>) -> FieldOutcome<String> {
    let raw = match value {
        None | Some(Value::Null) => return Ok("default".to_string()),
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err((
                format!("Invalid country: {other}"),
                "default".to_string(),
            ))
        }
    };

    if raw == "default" {
        return Ok(raw.to_string());
    }
    let upper = raw.to_uppercase();
    if countries.contains(&upper) {
        Ok(upper)
    } else {
        Err((format!("Invalid country: {raw}"), "default".to_string()))
    }
}

fn bucket_rule(value: Option<&Value>, field: &str) -> FieldOutcome<DateBucket> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(DateBucket::Default),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err((format!("Invalid {field} option"), DateBucket::Default)),
    };
    DateBucket::parse(raw).ok_or_else(|| (format!("Invalid {field} option"), DateBucket::Default))
}

fn sort_rule(value: Option<&Value>) -> FieldOutcome<SortKey> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(SortKey::Default),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(("Invalid sortBy option".to_string(), SortKey::Default)),
    };
    SortKey::parse(raw).ok_or_else(|| ("Invalid sortBy option".to_string(), SortKey::Default))
}

fn tab_rule(value: Option<&Value>) -> FieldOutcome<AdFormat> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(AdFormat::Push),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(("Invalid activeTab value".to_string(), AdFormat::Push)),
    };
    AdFormat::parse(raw).ok_or_else(|| ("Invalid activeTab value".to_string(), AdFormat::Push))
}

/// Booleans accept native bools, the 0/1 numbers, and a small string vocabulary
fn bool_rule(value: Option<&Value>, field: &str) -> FieldOutcome<bool> {
    const TRUTHY: [&str; 4] = ["true", "1", "on", "yes"];
    const FALSY: [&str; 4] = ["false", "0", "off", "no"];

    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err((format!("{field} must be boolean"), false)),
        },
        Some(Value::String(s)) => {
            let token = s.trim().to_lowercase();
            if TRUTHY.contains(&token.as_str()) {
                Ok(true)
            } else if FALSY.contains(&token.as_str()) {
                Ok(false)
            } else {
                Err((format!("{field} must be boolean"), false))
            }
        }
        Some(_) => Err((format!("{field} must be boolean"), false)),
    }
}

/// Integer page in [1, MAX_PAGE]; Safe mode clamps instead of rejecting
fn page_rule(value: Option<&Value>) -> FieldOutcome<u32> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(v) => parse_integer(v),
    };

    match parsed {
        Some(page) if (1..=MAX_PAGE as i64).contains(&page) => Ok(page as u32),
        Some(page) => Err((
            format!("page must be between 1 and {MAX_PAGE}"),
            page.clamp(1, MAX_PAGE as i64) as u32,
        )),
        None => Err((format!("page must be between 1 and {MAX_PAGE}"), 1)),
    }
}

/// Page size from the fixed enumeration; Safe mode snaps to the nearest value
///
/// The snap is a stable minimal-distance scan over the ascending enumeration,
/// so equidistant inputs resolve to the smaller value.
fn per_page_rule(value: Option<&Value>) -> FieldOutcome<u32> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(12),
        Some(v) => parse_integer(v).unwrap_or(0),
    };

    if ALLOWED_PAGE_SIZES.contains(&(parsed as u32)) && parsed > 0 {
        return Ok(parsed as u32);
    }

    let mut closest = ALLOWED_PAGE_SIZES[0];
    for allowed in ALLOWED_PAGE_SIZES {
        if (parsed - allowed as i64).abs() < (parsed - closest as i64).abs() {
            closest = allowed;
        }
    }
    Err((format!("Invalid perPage: {parsed}"), closest))
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Multi-value sets keep non-empty string entries, deduplicated and sorted
fn set_rule(value: Option<&Value>, field: &str) -> FieldOutcome<Vec<String>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err((format!("{field} must be an array"), Vec::new())),
    };

    let set: BTreeSet<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect();
    Ok(set.into_iter().collect())
}
