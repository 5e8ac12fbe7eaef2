//! Response envelope for discovery results
//!
//! [`ResponsePayload`] carries items, pagination, and filter metadata in one
//! structure with an explicit lifecycle status. `to_wire()` flattens it into
//! the JSON contract consumed by clients, omitting optional sections when
//! they are empty.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::filters::FilterSet;
use crate::options::SelectableOption;
use crate::pagination::PageInfo;

/// Lifecycle status of a discovery response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Loading,
    Empty,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Loading => "loading",
            Self::Empty => "empty",
        }
    }
}

/// Assembled discovery response, prior to wire flattening
#[derive(Debug, Clone)]
pub struct ResponsePayload<T> {
    pub status: ResponseStatus,
    pub items: Vec<T>,
    pub pagination: PageInfo,
    pub filters: FilterSet,
    /// Catalogs keyed by dimension name; omitted from the wire when empty
    pub filter_options: BTreeMap<String, Vec<SelectableOption>>,
    /// Names of dimensions the caller may still filter on; omitted when empty
    pub available_filters: Vec<String>,
    pub error: Option<String>,
    /// Raw input echoed back on error/loading, before normalization
    original_input: Option<Map<String, Value>>,
}

impl<T: Serialize> ResponsePayload<T> {
    /// Successful result page
    pub fn success(items: Vec<T>, filters: FilterSet, total: u64) -> Self {
        let pagination = PageInfo::compute(total, filters.per_page, filters.page);
        Self {
            status: ResponseStatus::Success,
            items,
            pagination,
            filters,
            filter_options: BTreeMap::new(),
            available_filters: Vec::new(),
            error: None,
            original_input: None,
        }
    }

    /// Failed request; echoes the raw input so clients can surface it
    pub fn error<S: Into<String>>(message: S, original_input: Map<String, Value>) -> Self {
        let filters = FilterSet::default();
        Self {
            status: ResponseStatus::Error,
            items: Vec::new(),
            pagination: PageInfo::empty(filters.per_page),
            filters,
            filter_options: BTreeMap::new(),
            available_filters: Vec::new(),
            error: Some(message.into()),
            original_input: Some(original_input),
        }
    }

    /// Placeholder while a result is being computed
    pub fn loading(original_input: Map<String, Value>) -> Self {
        let filters = FilterSet::default();
        Self {
            status: ResponseStatus::Loading,
            items: Vec::new(),
            pagination: PageInfo::empty(filters.per_page),
            filters,
            filter_options: BTreeMap::new(),
            available_filters: Vec::new(),
            error: None,
            original_input: Some(original_input),
        }
    }

    /// Valid request that matched nothing
    pub fn empty(filters: FilterSet) -> Self {
        Self {
            status: ResponseStatus::Empty,
            items: Vec::new(),
            pagination: PageInfo::empty(filters.per_page),
            filters,
            filter_options: BTreeMap::new(),
            available_filters: Vec::new(),
            error: None,
            original_input: None,
        }
    }

    pub fn with_filter_options(
        mut self,
        options: BTreeMap<String, Vec<SelectableOption>>,
    ) -> Self {
        self.filter_options = options;
        self
    }

    pub fn with_available_filters(mut self, names: Vec<String>) -> Self {
        self.available_filters = names;
        self
    }

    /// Flatten into the wire contract
    ///
    /// Optional sections (`filterOptions`, `availableFilters`, `isLoading`,
    /// `error`) appear only when they carry content.
    pub fn to_wire(&self) -> Value {
        let applied_filters = match &self.original_input {
            Some(raw) => Value::Object(raw.clone()),
            None => Value::Object(self.filters.to_compact_map()),
        };

        let mut data = json!({
            "items": self.items,
            "pagination": self.pagination,
            "meta": {
                "hasSearch": self.filters.has_search(),
                "activeFiltersCount": self.filters.active_filter_count(),
                "hasActiveFilters": self.filters.has_active_filters(),
                "cacheKey": self.filters.cache_key(),
                "appliedFilters": applied_filters,
                "activeFilters": Value::Object(self.filters.active_filters()),
                "timestamp": Utc::now().to_rfc3339(),
            },
        });
        if !self.filter_options.is_empty() {
            data["filterOptions"] =
                serde_json::to_value(&self.filter_options).unwrap_or(Value::Null);
        }
        if !self.available_filters.is_empty() {
            data["availableFilters"] =
                serde_json::to_value(&self.available_filters).unwrap_or(Value::Null);
        }
        if self.status == ResponseStatus::Loading {
            data["isLoading"] = json!(true);
        }

        let mut wire = json!({
            "status": self.status.as_str(),
            "data": data,
        });
        if let Some(error) = &self.error {
            wire["error"] = json!(error);
        }
        wire
    }

    /// Compact summary for logging
    pub fn stats(&self) -> Map<String, Value> {
        let mut stats = Map::new();
        stats.insert("status".to_string(), json!(self.status.as_str()));
        stats.insert("itemCount".to_string(), json!(self.items.len()));
        stats.insert("total".to_string(), json!(self.pagination.total));
        stats.insert(
            "activeFiltersCount".to_string(),
            json!(self.filters.active_filter_count()),
        );
        stats.insert("hasError".to_string(), json!(self.error.is_some()));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{test_support, CreativeCard};
    use serde_json::json;

    fn cards(n: usize) -> Vec<CreativeCard> {
        (1..=n as u64)
            .map(|id| CreativeCard::from_creative(&test_support::creative(id), false))
            .collect()
    }

    #[test]
    fn test_success_wire_shape() {
        let filters = FilterSet {
            search_keyword: "vpn".to_string(),
            ..FilterSet::default()
        };
        let payload = ResponsePayload::success(cards(3), filters, 25);
        let wire = payload.to_wire();

        assert_eq!(wire["status"], "success");
        assert!(wire.get("error").is_none());
        assert_eq!(wire["data"]["items"].as_array().unwrap().len(), 3);
        assert_eq!(wire["data"]["pagination"]["total"], 25);
        assert_eq!(wire["data"]["pagination"]["lastPage"], 3);

        let meta = &wire["data"]["meta"];
        assert_eq!(meta["hasSearch"], true);
        assert_eq!(meta["activeFiltersCount"], 1);
        assert_eq!(meta["hasActiveFilters"], true);
        assert_eq!(meta["cacheKey"].as_str().unwrap().len(), 64);
        assert_eq!(meta["appliedFilters"]["searchKeyword"], "vpn");
        assert_eq!(meta["activeFilters"]["searchKeyword"], "vpn");
        assert!(meta["timestamp"].as_str().unwrap().contains('T'));

        // optional sections absent when empty
        assert!(wire["data"].get("filterOptions").is_none());
        assert!(wire["data"].get("availableFilters").is_none());
        assert!(wire["data"].get("isLoading").is_none());
    }

    #[test]
    fn test_error_carries_message_and_echoes_input() {
        let raw = json!({"sortBy": "bogus"}).as_object().unwrap().clone();
        let payload: ResponsePayload<CreativeCard> =
            ResponsePayload::error("Invalid sortBy option", raw);
        let wire = payload.to_wire();

        assert_eq!(wire["status"], "error");
        assert_eq!(wire["error"], "Invalid sortBy option");
        assert!(wire["data"]["items"].as_array().unwrap().is_empty());
        assert_eq!(wire["data"]["pagination"]["total"], 0);
        assert_eq!(wire["data"]["meta"]["appliedFilters"]["sortBy"], "bogus");
    }

    #[test]
    fn test_loading_flag_present_only_when_loading() {
        let raw = Map::new();
        let payload: ResponsePayload<CreativeCard> = ResponsePayload::loading(raw);
        let wire = payload.to_wire();
        assert_eq!(wire["status"], "loading");
        assert_eq!(wire["data"]["isLoading"], true);
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn test_empty_result_keeps_filters() {
        let filters = FilterSet {
            only_adult: true,
            per_page: 24,
            ..FilterSet::default()
        };
        let payload: ResponsePayload<CreativeCard> = ResponsePayload::empty(filters);
        let wire = payload.to_wire();

        assert_eq!(wire["status"], "empty");
        assert_eq!(wire["data"]["pagination"]["perPage"], 24);
        assert_eq!(wire["data"]["pagination"]["from"], 0);
        assert_eq!(wire["data"]["meta"]["activeFilters"]["onlyAdult"], true);
    }

    #[test]
    fn test_filter_options_section_included_when_present() {
        let mut options = BTreeMap::new();
        options.insert(
            "perPage".to_string(),
            crate::options::build(
                &crate::options::per_page_source(),
                &std::collections::HashSet::new(),
            ),
        );
        let payload = ResponsePayload::success(cards(1), FilterSet::default(), 1)
            .with_filter_options(options)
            .with_available_filters(vec!["languages".to_string()]);
        let wire = payload.to_wire();

        assert_eq!(
            wire["data"]["filterOptions"]["perPage"]
                .as_array()
                .unwrap()
                .len(),
            5
        );
        assert_eq!(wire["data"]["availableFilters"][0], "languages");
    }

    #[test]
    fn test_stats_summary() {
        let payload = ResponsePayload::success(cards(2), FilterSet::default(), 40);
        let stats = payload.stats();
        assert_eq!(stats["status"], "success");
        assert_eq!(stats["itemCount"], 2);
        assert_eq!(stats["total"], 40);
        assert_eq!(stats["hasError"], false);
    }
}
