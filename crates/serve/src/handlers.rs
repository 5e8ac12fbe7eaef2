//! HTTP handlers for the AdScout serve crate

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Map, Value};

use adscout_core::{
    options, CountryAllowList, CreativeCard, CreativeId, CreativeStore, EngineConfig, EngineError,
    FavoriteResolver, FavoriteStore, FilterNormalizer, FilterSet, FormatCountCache, MemoryStore,
    NetworkCountCache, Recommender, ResponsePayload, SelectableOption, UserId,
};
use adscout_core::store::AccessProvider;

/// Filter fields that arrive as repeated query parameters
const SET_FIELDS: [&str; 7] = [
    "advertisingNetworks",
    "languages",
    "operatingSystems",
    "browsers",
    "devices",
    "imageSizes",
    "savedSettings",
];

/// Query parameters that are not filter input
const CONTROL_PARAMS: [&str; 3] = ["viewer", "limit", "offset"];

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: crate::ServerConfig,
    pub store: Arc<dyn CreativeStore>,
    pub normalizer: Arc<FilterNormalizer>,
    pub favorites: Arc<FavoriteResolver>,
    pub recommender: Arc<Recommender>,
    pub countries: Arc<CountryAllowList>,
    pub network_counts: Arc<NetworkCountCache>,
    pub format_counts: Arc<FormatCountCache>,
}

impl AppState {
    /// Wire the engine against explicit store and identity ports
    pub fn new(
        config: crate::ServerConfig,
        engine: EngineConfig,
        store: Arc<dyn CreativeStore>,
        favorite_store: Arc<dyn FavoriteStore>,
        access: Arc<dyn AccessProvider>,
    ) -> Self {
        let countries = Arc::new(CountryAllowList::new(Arc::clone(&store), &engine.cache));
        let network_counts = Arc::new(NetworkCountCache::new(Arc::clone(&store), &engine.cache));
        let format_counts = Arc::new(FormatCountCache::new(Arc::clone(&store), &engine.cache));
        let normalizer = Arc::new(FilterNormalizer::new(Arc::clone(&countries)));
        let favorites = Arc::new(FavoriteResolver::new(Arc::clone(&favorite_store)));
        let recommender = Arc::new(Recommender::new(
            Arc::clone(&store),
            access,
            FavoriteResolver::new(favorite_store),
            engine.similar,
        ));

        Self {
            config,
            store,
            normalizer,
            favorites,
            recommender,
            countries,
            network_counts,
            format_counts,
        }
    }

    /// State backed by the in-memory store, optionally seeded with demo data
    pub async fn demo(config: crate::ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        if config.seed_demo {
            store.seed_demo().await;
            store.grant_similar_access(1).await;
        }
        Self::new(
            config,
            EngineConfig::default(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// Option catalogs for every filterable dimension, with selection state
    /// taken from `filters` and counts from the short-TTL caches
    async fn catalogs(
        &self,
        filters: &FilterSet,
    ) -> adscout_core::Result<BTreeMap<String, Vec<SelectableOption>>> {
        let single = |value: &str| -> HashSet<String> { HashSet::from([value.to_string()]) };
        let set = |values: &[String]| -> HashSet<String> { values.iter().cloned().collect() };

        let mut catalogs = BTreeMap::new();
        catalogs.insert(
            "sortOptions".to_string(),
            options::build(&options::sort_source(), &single(filters.sort_by.as_str())),
        );
        catalogs.insert(
            "dateRanges".to_string(),
            options::build(
                &options::date_range_source(),
                &single(filters.date_creation.as_str()),
            ),
        );
        catalogs.insert(
            "perPage".to_string(),
            options::build(
                &options::per_page_source(),
                &single(&filters.per_page.to_string()),
            ),
        );
        catalogs.insert(
            "imageSizes".to_string(),
            options::build(&options::image_size_source(), &set(&filters.image_sizes)),
        );

        let format_counts = self.format_counts.counts().await?;
        let by_token: std::collections::HashMap<String, u64> = format_counts
            .into_iter()
            .map(|(format, count)| (format.as_str().to_string(), count))
            .collect();
        catalogs.insert(
            "tabs".to_string(),
            options::build_with_counts(
                &options::tab_source(),
                &single(filters.active_tab.as_str()),
                &by_token,
            ),
        );

        let network_counts = self.network_counts.counts().await?;
        let mut networks: Vec<String> = network_counts.keys().cloned().collect();
        networks.sort();
        catalogs.insert(
            "advertisingNetworks".to_string(),
            options::build_with_counts(
                &options::OptionSource::Tokens(networks),
                &set(&filters.advertising_networks),
                &network_counts,
            ),
        );

        let mut countries: Vec<String> = self.countries.snapshot().await?.into_iter().collect();
        countries.sort();
        catalogs.insert(
            "countries".to_string(),
            options::build(
                &options::OptionSource::Tokens(countries),
                &single(&filters.country),
            ),
        );
        Ok(catalogs)
    }
}

/// Split raw query pairs into filter input, honoring repeated multi-value keys
pub(crate) fn raw_filter_map(params: &[(String, String)]) -> Map<String, Value> {
    let mut raw = Map::new();
    for (key, value) in params {
        let key = key.strip_suffix("[]").unwrap_or(key);
        if CONTROL_PARAMS.contains(&key) {
            continue;
        }
        if SET_FIELDS.contains(&key) {
            match raw
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(Value::String(value.clone())),
                _ => {}
            }
        } else {
            raw.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    raw
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn viewer_from(params: &[(String, String)]) -> Option<UserId> {
    param(params, "viewer").and_then(|v| v.parse().ok())
}

/// Map an engine error onto a status code and error envelope
fn engine_error_response(
    err: EngineError,
    raw: Map<String, Value>,
) -> (StatusCode, Json<Value>) {
    let status = match &err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(status = %status, error = %err, "request failed");
    let payload: ResponsePayload<CreativeCard> = ResponsePayload::error(err.to_string(), raw);
    (status, Json(payload.to_wire()))
}

/// Handler for the creative listing
pub async fn list_creatives(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let raw = raw_filter_map(&params);
    let viewer = viewer_from(&params);

    match list_inner(&state, &raw, viewer).await {
        Ok(wire) => (StatusCode::OK, Json(wire)),
        Err(err) => engine_error_response(err, raw),
    }
}

async fn list_inner(
    state: &AppState,
    raw: &Map<String, Value>,
    viewer: Option<UserId>,
) -> adscout_core::Result<Value> {
    let filters = state.normalizer.sanitize(raw).await?;
    let total = state.store.count(&filters).await?;
    let catalogs = state.catalogs(&filters).await?;

    if total == 0 {
        let payload: ResponsePayload<CreativeCard> =
            ResponsePayload::empty(filters).with_filter_options(catalogs);
        return Ok(payload.to_wire());
    }

    let creatives = state.store.search(&filters).await?;
    let cards = state.favorites.annotate(viewer, &creatives).await?;
    let payload =
        ResponsePayload::success(cards, filters, total).with_filter_options(catalogs);
    tracing::info!(stats = ?payload.stats(), "creatives listed");
    Ok(payload.to_wire())
}

/// Handler for strict filter validation
pub async fn validate_filters(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let raw = raw_filter_map(&params);

    match state.normalizer.check(&raw).await {
        Ok(Ok(filters)) => {
            let cache_key = filters.cache_key();
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "data": {
                        "valid": true,
                        "filters": filters,
                        "cacheKey": cache_key,
                    },
                })),
            )
        }
        Ok(Err(report)) => {
            let messages = report.messages.clone();
            let payload: ResponsePayload<CreativeCard> =
                ResponsePayload::error(report.to_string(), raw);
            let mut wire = payload.to_wire();
            wire["errors"] = json!(messages);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(wire))
        }
        Err(err) => engine_error_response(err, raw),
    }
}

/// Handler for the filter option catalogs
pub async fn filter_options(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let raw = raw_filter_map(&params);

    let result = async {
        let filters = state.normalizer.sanitize(&raw).await?;
        let catalogs = state.catalogs(&filters).await?;
        let format_counts = state.format_counts.counts().await?;
        let by_token: BTreeMap<String, u64> = format_counts
            .into_iter()
            .map(|(format, count)| (format.as_str().to_string(), count))
            .collect();
        Ok::<_, EngineError>(json!({
            "status": "success",
            "data": {
                "options": catalogs,
                "formatCounts": by_token,
            },
        }))
    }
    .await;

    match result {
        Ok(wire) => (StatusCode::OK, Json(wire)),
        Err(err) => engine_error_response(err, raw),
    }
}

/// Handler for similar creatives
pub async fn similar_creatives(
    State(state): State<AppState>,
    Path(id): Path<CreativeId>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let viewer = viewer_from(&params);
    let limit = param(&params, "limit").and_then(|v| v.parse::<usize>().ok());
    let offset = param(&params, "offset")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let result = async {
        let reference = state
            .store
            .find_ready(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("creative {id}")))?;
        state
            .recommender
            .recommend_page(&reference, viewer, offset, limit)
            .await
    }
    .await;

    match result {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": {
                    "items": page.items,
                    "total": page.total,
                    "hasMore": page.has_more,
                    "fallbackUsed": page.fallback_used,
                },
            })),
        ),
        Err(err) => engine_error_response(err, Map::new()),
    }
}

/// Health check endpoint
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "version": crate::VERSION,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscout_core::{AdFormat, Creative, CreativeStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn creative(id: CreativeId) -> Creative {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Creative {
            id,
            format: AdFormat::Push,
            status: CreativeStatus::Active,
            title: format!("Creative {id}"),
            description: "A push offer".to_string(),
            country: Some("US".to_string()),
            language: Some("en".to_string()),
            network: Some("pushhouse".to_string()),
            browser: Some("chrome".to_string()),
            operating_system: Some("android".to_string()),
            device: Some("mobile".to_string()),
            image_size: Some("16x9".to_string()),
            is_adult: false,
            is_processed: true,
            is_valid: true,
            main_image_url: None,
            icon_url: None,
            video_url: None,
            has_video: false,
            social_likes: id,
            social_comments: 0,
            social_shares: 0,
            created_at: ts - Duration::days(id as i64),
            external_created_at: ts - Duration::days(id as i64),
            last_seen_at: ts,
        }
    }

    async fn state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        store.insert_all((1..=30).map(creative).collect()).await;
        store
            .set_countries(vec!["US".to_string(), "GB".to_string()])
            .await;
        store.grant_similar_access(1).await;
        store.add_favorite(1, 2).await;
        AppState::new(
            crate::ServerConfig::default(),
            EngineConfig::default(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    fn query(pairs: &[(&str, &str)]) -> Query<Vec<(String, String)>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_list_returns_success_envelope() {
        let state = state().await;
        let (status, Json(wire)) =
            list_creatives(State(state), query(&[("viewer", "1")])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["status"], "success");
        assert_eq!(wire["data"]["items"].as_array().unwrap().len(), 12);
        assert_eq!(wire["data"]["pagination"]["total"], 30);
        assert_eq!(wire["data"]["meta"]["cacheKey"].as_str().unwrap().len(), 64);
        assert!(wire["data"]["filterOptions"]["tabs"].is_array());

        let favorite = wire["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["id"] == 2)
            .unwrap();
        assert_eq!(favorite["isFavorite"], true);
    }

    #[tokio::test]
    async fn test_list_no_matches_is_empty_status() {
        let state = state().await;
        let (status, Json(wire)) = list_creatives(
            State(state),
            query(&[("searchKeyword", "nonexistent-keyword")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["status"], "empty");
        assert!(wire["data"]["items"].as_array().unwrap().is_empty());
        assert_eq!(wire["data"]["pagination"]["from"], 0);
    }

    #[tokio::test]
    async fn test_list_coerces_invalid_input() {
        let state = state().await;
        let (status, Json(wire)) = list_creatives(
            State(state),
            query(&[("sortBy", "bogus"), ("perPage", "30"), ("page", "0")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["status"], "success");
        assert_eq!(wire["data"]["pagination"]["perPage"], 24);
        assert_eq!(wire["data"]["pagination"]["currentPage"], 1);
    }

    #[tokio::test]
    async fn test_repeated_set_params_collected() {
        let raw = raw_filter_map(&[
            ("languages[]".to_string(), "en".to_string()),
            ("languages[]".to_string(), "de".to_string()),
            ("country".to_string(), "US".to_string()),
            ("viewer".to_string(), "1".to_string()),
        ]);
        assert_eq!(raw["languages"], json!(["en", "de"]));
        assert_eq!(raw["country"], json!("US"));
        assert!(!raw.contains_key("viewer"));
    }

    #[tokio::test]
    async fn test_validate_rejects_with_all_errors() {
        let state = state().await;
        let (status, Json(wire)) = validate_filters(
            State(state),
            query(&[("sortBy", "bogus"), ("country", "atlantis")]),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(wire["status"], "error");
        assert_eq!(wire["errors"].as_array().unwrap().len(), 2);
        assert_eq!(wire["data"]["meta"]["appliedFilters"]["sortBy"], "bogus");
    }

    #[tokio::test]
    async fn test_validate_accepts_clean_input() {
        let state = state().await;
        let (status, Json(wire)) = validate_filters(
            State(state),
            query(&[("country", "gb"), ("perPage", "24")]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["data"]["valid"], true);
        assert_eq!(wire["data"]["filters"]["country"], "GB");
        assert_eq!(wire["data"]["cacheKey"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_filter_options_catalogs() {
        let state = state().await;
        let (status, Json(wire)) =
            filter_options(State(state), query(&[("activeTab", "push")])).await;

        assert_eq!(status, StatusCode::OK);
        let options = &wire["data"]["options"];
        assert_eq!(options["perPage"].as_array().unwrap().len(), 5);
        assert_eq!(options["countries"].as_array().unwrap().len(), 2);

        let networks = options["advertisingNetworks"].as_array().unwrap();
        assert_eq!(networks[0]["value"], "pushhouse");
        assert_eq!(networks[0]["count"], 30);

        let tabs = options["tabs"].as_array().unwrap();
        let push = tabs.iter().find(|t| t["value"] == "push").unwrap();
        assert_eq!(push["count"], 30);
        assert_eq!(push["selected"], true);
        assert_eq!(wire["data"]["formatCounts"]["tiktok"], 0);
    }

    #[tokio::test]
    async fn test_similar_unknown_id_is_not_found() {
        let state = state().await;
        let (status, Json(wire)) =
            similar_creatives(State(state), Path(999), query(&[])).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(wire["status"], "error");
        assert!(wire["error"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_similar_respects_capability() {
        let state = state().await;

        let (status, Json(wire)) = similar_creatives(
            State(state.clone()),
            Path(1),
            query(&[("viewer", "1"), ("limit", "4")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["data"]["items"].as_array().unwrap().len(), 4);
        assert_eq!(wire["data"]["hasMore"], true);

        // viewer 2 has no similar-creatives capability
        let (status, Json(wire)) =
            similar_creatives(State(state), Path(1), query(&[("viewer", "2")])).await;
        assert_eq!(status, StatusCode::OK);
        assert!(wire["data"]["items"].as_array().unwrap().is_empty());
        assert_eq!(wire["data"]["total"], 0);
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let (status, Json(wire)) = health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wire["status"], "healthy");
        assert_eq!(wire["version"], crate::VERSION);
    }
}
