//! In-memory store implementation
//!
//! Implements every port against plain vectors behind `tokio` locks. Used by
//! the test suite and as the demo data source for the server binary.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::{AccessProvider, CandidateOrder, CandidateQuery, CreativeStore, FavoriteStore};
use crate::error::Result;
use crate::filters::{FilterSet, SortKey};
use crate::types::{AdFormat, Creative, CreativeId, CreativeStatus, UserId};

#[derive(Default)]
pub struct MemoryStore {
    creatives: RwLock<Vec<Creative>>,
    favorites: RwLock<HashMap<UserId, HashSet<CreativeId>>>,
    similar_viewers: RwLock<HashSet<UserId>>,
    countries: RwLock<Vec<String>>,
    networks: RwLock<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, creative: Creative) {
        self.creatives.write().await.push(creative);
    }

    pub async fn insert_all(&self, creatives: Vec<Creative>) {
        self.creatives.write().await.extend(creatives);
    }

    /// Replace the active-country allow-list source data
    pub async fn set_countries(&self, codes: Vec<String>) {
        *self.countries.write().await = codes;
    }

    /// Replace the known-network roster
    pub async fn set_networks(&self, names: Vec<String>) {
        *self.networks.write().await = names;
    }

    pub async fn add_favorite(&self, viewer: UserId, id: CreativeId) {
        self.favorites.write().await.entry(viewer).or_default().insert(id);
    }

    pub async fn grant_similar_access(&self, viewer: UserId) {
        self.similar_viewers.write().await.insert(viewer);
    }

    /// Seed a small cross-format data set for the demo server
    pub async fn seed_demo(&self) {
        let now = Utc::now();
        let networks = ["pushhouse", "evadav", "richads"];
        let countries = ["US", "GB", "DE", "BR"];
        let languages = ["en", "de", "pt"];

        let mut batch = Vec::new();
        for id in 1..=48u64 {
            let format = AdFormat::ALL[(id % 4) as usize];
            let age = Duration::days((id % 40) as i64);
            batch.push(Creative {
                id,
                format,
                status: if id % 5 == 0 {
                    CreativeStatus::Paused
                } else {
                    CreativeStatus::Active
                },
                title: format!("Sample {} offer {}", format, id),
                description: format!("Demo creative {} for the {} tab", id, format),
                country: Some(countries[(id % 4) as usize].to_string()),
                language: Some(languages[(id % 3) as usize].to_string()),
                network: Some(networks[(id % 3) as usize].to_string()),
                browser: Some(if id % 2 == 0 { "chrome" } else { "firefox" }.to_string()),
                operating_system: Some(if id % 2 == 0 { "android" } else { "windows" }.to_string()),
                device: Some(if id % 2 == 0 { "mobile" } else { "desktop" }.to_string()),
                image_size: Some(if id % 2 == 0 { "16x9" } else { "1x1" }.to_string()),
                is_adult: id % 8 == 0,
                is_processed: true,
                is_valid: id % 11 != 0,
                main_image_url: Some(format!("https://cdn.example.com/{id}/main.jpg")),
                icon_url: Some(format!("https://cdn.example.com/{id}/icon.png")),
                video_url: None,
                has_video: false,
                social_likes: id * 3,
                social_comments: id,
                social_shares: id / 2,
                created_at: now - age,
                external_created_at: now - age,
                last_seen_at: now - Duration::hours((id % 72) as i64),
            });
        }
        self.insert_all(batch).await;
        self.set_countries(countries.iter().map(|c| c.to_string()).collect())
            .await;
        self.set_networks(networks.iter().map(|n| n.to_string()).collect())
            .await;
    }

    fn matches(creative: &Creative, filters: &FilterSet) -> bool {
        if !creative.is_ready() || creative.format != filters.active_tab {
            return false;
        }
        if filters.only_adult && !creative.is_adult {
            return false;
        }
        if !filters.search_keyword.is_empty() {
            let needle = filters.search_keyword.to_lowercase();
            let haystack =
                format!("{} {}", creative.title, creative.description).to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        if filters.country != "default" && creative.country.as_deref() != Some(&filters.country) {
            return false;
        }
        let now = Utc::now();
        if !filters
            .date_creation
            .contains(creative.external_created_at, now)
        {
            return false;
        }
        if !filters.period_display.contains(creative.last_seen_at, now) {
            return false;
        }

        let in_set = |set: &[String], value: &Option<String>| {
            set.is_empty() || value.as_deref().is_some_and(|v| set.iter().any(|s| s == v))
        };
        in_set(&filters.advertising_networks, &creative.network)
            && in_set(&filters.languages, &creative.language)
            && in_set(&filters.operating_systems, &creative.operating_system)
            && in_set(&filters.browsers, &creative.browser)
            && in_set(&filters.devices, &creative.device)
            && in_set(&filters.image_sizes, &creative.image_size)
    }

    fn sort_results(results: &mut [Creative], sort_by: SortKey) {
        results.sort_by(|a, b| {
            let ordering = match sort_by.canonical() {
                SortKey::Activity => b.last_seen_at.cmp(&a.last_seen_at),
                SortKey::Popularity => b
                    .engagement()
                    .cmp(&a.engagement())
                    .then(b.last_seen_at.cmp(&a.last_seen_at)),
                _ => b.external_created_at.cmp(&a.external_created_at),
            };
            ordering.then(b.id.cmp(&a.id))
        });
    }

    fn candidate_matches(creative: &Creative, query: &CandidateQuery) -> bool {
        if !creative.is_ready() || query.exclude_ids.contains(&creative.id) {
            return false;
        }
        if query.exclude_adult && creative.is_adult {
            return false;
        }
        let attr_matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            None => true,
            Some(w) => actual.as_deref() == Some(w.as_str()),
        };
        query.format.map_or(true, |f| creative.format == f)
            && attr_matches(&query.country, &creative.country)
            && attr_matches(&query.network, &creative.network)
            && attr_matches(&query.language, &creative.language)
    }

    fn sort_candidates(results: &mut [Creative], order: CandidateOrder) {
        results.sort_by(|a, b| {
            let active = b.is_active().cmp(&a.is_active());
            let ordering = match order {
                CandidateOrder::ActivityRecency => active
                    .then(b.last_seen_at.cmp(&a.last_seen_at))
                    .then(b.external_created_at.cmp(&a.external_created_at)),
                CandidateOrder::EngagementRecency => active
                    .then(b.engagement().cmp(&a.engagement()))
                    .then(b.last_seen_at.cmp(&a.last_seen_at)),
            };
            ordering.then(b.id.cmp(&a.id))
        });
    }

    fn page(results: Vec<Creative>, offset: u64, limit: usize) -> Vec<Creative> {
        results.into_iter().skip(offset as usize).take(limit).collect()
    }
}

#[async_trait]
impl CreativeStore for MemoryStore {
    async fn search(&self, filters: &FilterSet) -> Result<Vec<Creative>> {
        let creatives = self.creatives.read().await;
        let mut results: Vec<Creative> = creatives
            .iter()
            .filter(|c| Self::matches(c, filters))
            .cloned()
            .collect();
        Self::sort_results(&mut results, filters.sort_by);
        Ok(Self::page(
            results,
            filters.offset(),
            filters.per_page as usize,
        ))
    }

    async fn count(&self, filters: &FilterSet) -> Result<u64> {
        let creatives = self.creatives.read().await;
        Ok(creatives.iter().filter(|c| Self::matches(c, filters)).count() as u64)
    }

    async fn find_ready(&self, id: CreativeId) -> Result<Option<Creative>> {
        let creatives = self.creatives.read().await;
        Ok(creatives.iter().find(|c| c.id == id && c.is_ready()).cloned())
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Creative>> {
        let creatives = self.creatives.read().await;
        let mut results: Vec<Creative> = creatives
            .iter()
            .filter(|c| Self::candidate_matches(c, query))
            .cloned()
            .collect();
        Self::sort_candidates(&mut results, query.order);
        Ok(Self::page(results, query.offset, query.limit))
    }

    async fn count_candidates(&self, query: &CandidateQuery) -> Result<u64> {
        let creatives = self.creatives.read().await;
        Ok(creatives
            .iter()
            .filter(|c| Self::candidate_matches(c, query))
            .count() as u64)
    }

    async fn active_countries(&self) -> Result<Vec<String>> {
        let configured = self.countries.read().await;
        if !configured.is_empty() {
            return Ok(configured.clone());
        }
        let creatives = self.creatives.read().await;
        let mut codes: Vec<String> = creatives
            .iter()
            .filter(|c| c.is_ready())
            .filter_map(|c| c.country.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        codes.sort();
        Ok(codes)
    }

    async fn network_names(&self) -> Result<Vec<String>> {
        let configured = self.networks.read().await;
        if !configured.is_empty() {
            return Ok(configured.clone());
        }
        let creatives = self.creatives.read().await;
        let mut names: Vec<String> = creatives
            .iter()
            .filter_map(|c| c.network.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort();
        Ok(names)
    }

    async fn network_counts(&self) -> Result<HashMap<String, u64>> {
        let creatives = self.creatives.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for creative in creatives.iter().filter(|c| c.is_ready()) {
            if let Some(network) = &creative.network {
                *counts.entry(network.clone()).or_default() += 1;
            }
        }
        Ok(counts)
    }

    async fn format_counts(&self) -> Result<HashMap<AdFormat, u64>> {
        let creatives = self.creatives.read().await;
        let mut counts: HashMap<AdFormat, u64> = HashMap::new();
        for creative in creatives.iter().filter(|c| c.is_ready()) {
            *counts.entry(creative.format).or_default() += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn favorites_among(
        &self,
        viewer: UserId,
        ids: &[CreativeId],
    ) -> Result<HashSet<CreativeId>> {
        let favorites = self.favorites.read().await;
        Ok(favorites
            .get(&viewer)
            .map(|set| ids.iter().filter(|id| set.contains(id)).copied().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl AccessProvider for MemoryStore {
    async fn can_view_similar(&self, viewer: UserId) -> Result<bool> {
        Ok(self.similar_viewers.read().await.contains(&viewer))
    }
}
