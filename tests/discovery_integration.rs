//! Integration tests for the discovery flow
//!
//! These tests run the full pipeline end to end: raw input normalization,
//! store search, favorite annotation, envelope assembly, and the
//! similar-creative recommender, all against the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use adscout_core::{
    options, CacheConfig, Creative, CreativeCard, CountryAllowList, CreativeStore,
    FavoriteResolver, FilterNormalizer, MemoryStore, Recommender, ResponsePayload, SimilarConfig,
};

fn creative(id: u64, country: &str, likes: u64) -> Creative {
    use adscout_core::{AdFormat, CreativeStatus};
    use chrono::{Duration, TimeZone, Utc};

    let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    Creative {
        id,
        format: AdFormat::Push,
        status: CreativeStatus::Active,
        title: format!("Sweepstakes offer {id}"),
        description: "Win big today".to_string(),
        country: Some(country.to_string()),
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
        social_likes: likes,
        social_comments: 0,
        social_shares: 0,
        created_at: ts - Duration::days(id as i64),
        external_created_at: ts - Duration::days(id as i64),
        last_seen_at: ts - Duration::hours(id as i64),
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let mut batch = Vec::new();
    for id in 1..=20u64 {
        let country = if id % 2 == 0 { "US" } else { "GB" };
        batch.push(creative(id, country, id * 5));
    }
    store.insert_all(batch).await;
    store
        .set_countries(vec!["US".to_string(), "GB".to_string()])
        .await;
    store
}

fn raw(value: Value) -> Map<String, Value> {
    value.as_object().expect("object literal").clone()
}

/// Raw query in, wire-format envelope out
#[tokio::test]
async fn test_listing_pipeline_end_to_end() {
    let store = seeded_store().await;
    store.add_favorite(7, 2).await;

    let countries = Arc::new(CountryAllowList::new(
        store.clone(),
        &CacheConfig::default(),
    ));
    let normalizer = FilterNormalizer::new(countries);
    let favorites = FavoriteResolver::new(store.clone());

    let input = raw(json!({
        "country": "us",
        "perPage": "30",
        "sortBy": "popularity",
        "languages": ["en"],
    }));
    let filters = normalizer.sanitize(&input).await.unwrap();
    assert_eq!(filters.country, "US");
    assert_eq!(filters.per_page, 24);

    let total = store.count(&filters).await.unwrap();
    let creatives = store.search(&filters).await.unwrap();
    assert_eq!(total, 10);

    // popularity ordering puts the most-liked creative first
    assert_eq!(creatives[0].id, 20);

    let cards = favorites.annotate(Some(7), &creatives).await.unwrap();
    let payload = ResponsePayload::success(cards, filters, total);
    let wire = payload.to_wire();

    assert_eq!(wire["status"], "success");
    assert_eq!(wire["data"]["pagination"]["total"], 10);
    assert_eq!(wire["data"]["pagination"]["lastPage"], 1);
    assert_eq!(wire["data"]["meta"]["hasActiveFilters"], true);
    // country, sortBy, languages differ from defaults; perPage never counts
    assert_eq!(wire["data"]["meta"]["activeFiltersCount"], 3);

    let favorite = wire["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == 2)
        .unwrap();
    assert_eq!(favorite["isFavorite"], true);
}

/// Strict-mode failures surface every field error in one envelope
#[tokio::test]
async fn test_strict_validation_error_envelope() {
    let store = seeded_store().await;
    let countries = Arc::new(CountryAllowList::new(
        store.clone(),
        &CacheConfig::default(),
    ));
    let normalizer = FilterNormalizer::new(countries);

    let input = raw(json!({
        "country": "atlantis",
        "perPage": 33,
        "page": 0,
    }));
    let report = normalizer.check(&input).await.unwrap().unwrap_err();
    assert_eq!(report.messages.len(), 3);

    let payload: ResponsePayload<CreativeCard> =
        ResponsePayload::error(report.to_string(), input);
    let wire = payload.to_wire();
    assert_eq!(wire["status"], "error");
    assert!(wire["error"].as_str().unwrap().contains("atlantis"));
    assert!(wire["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(wire["data"]["pagination"]["total"], 0);
}

/// Recommender widens once and annotates favorites
#[tokio::test]
async fn test_similar_pipeline_with_fallback() {
    let store = seeded_store().await;
    store.grant_similar_access(7).await;
    store.add_favorite(7, 4).await;

    let recommender = Recommender::new(
        store.clone(),
        store.clone(),
        FavoriteResolver::new(store.clone()),
        SimilarConfig::default(),
    );

    // reference is a US creative; 9 strict matches, fallback opens up GB
    let reference = store.find_ready(2).await.unwrap().unwrap();
    let page = recommender
        .recommend_page(&reference, Some(7), 0, Some(12))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 12);
    assert!(page.fallback_used);
    assert_eq!(page.total, 19);
    assert!(page.has_more);
    assert!(page.items.iter().any(|card| card.id == 4 && card.is_favorite));

    // a viewer without the capability sees nothing
    let denied = recommender
        .recommend_page(&reference, Some(8), 0, Some(12))
        .await
        .unwrap();
    assert!(denied.items.is_empty());
    assert_eq!(denied.total, 0);
}

/// Catalog selection state reflects the active filter set
#[tokio::test]
async fn test_option_catalog_selection() {
    let store = seeded_store().await;
    let countries = Arc::new(CountryAllowList::new(
        store.clone(),
        &CacheConfig::default(),
    ));
    let normalizer = FilterNormalizer::new(countries);

    let filters = normalizer
        .sanitize(&raw(json!({"sortBy": "activity", "country": "GB"})))
        .await
        .unwrap();

    let selected = BTreeMap::from([(
        "sortOptions",
        options::build(
            &options::sort_source(),
            &std::collections::HashSet::from([filters.sort_by.as_str().to_string()]),
        ),
    )]);
    let sort_options = &selected["sortOptions"];
    let active = sort_options.iter().find(|o| o.value == "activity").unwrap();
    assert!(active.selected);
    assert_eq!(sort_options.iter().filter(|o| o.selected).count(), 1);
}
