//! Pluggable backing-store and identity ports
//!
//! The engine talks to its data through these traits only. [`memory`] holds a
//! complete in-memory implementation used by tests and the demo server.

pub mod memory;

pub use memory::MemoryStore;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::filters::FilterSet;
use crate::types::{AdFormat, Creative, CreativeId, UserId};

/// Ordering applied to a candidate query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrder {
    /// Active first, then most recently seen, then original creation time
    ActivityRecency,
    /// Active first, then engagement metric, then most recently seen
    EngagementRecency,
}

/// Predicate for similar-creative candidate lookups
///
/// Only ready creatives are ever candidates; that constraint is part of the
/// port contract, not a query field. Optional attributes narrow the match
/// when present and impose nothing when `None`.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub exclude_ids: Vec<CreativeId>,
    pub format: Option<AdFormat>,
    pub country: Option<String>,
    pub network: Option<String>,
    pub language: Option<String>,
    /// Drop adult-flagged candidates entirely
    pub exclude_adult: bool,
    pub order: CandidateOrder,
    pub offset: u64,
    pub limit: usize,
}

impl CandidateQuery {
    /// Query matching every ready creative, newest activity first
    pub fn any(limit: usize) -> Self {
        Self {
            exclude_ids: Vec::new(),
            format: None,
            country: None,
            network: None,
            language: None,
            exclude_adult: false,
            order: CandidateOrder::ActivityRecency,
            offset: 0,
            limit,
        }
    }
}

/// Creative search, lookup, and aggregate source data
#[async_trait]
pub trait CreativeStore: Send + Sync {
    /// One page of ready creatives matching the filter set, in sort order
    async fn search(&self, filters: &FilterSet) -> Result<Vec<Creative>>;

    /// Total ready creatives matching the filter set
    async fn count(&self, filters: &FilterSet) -> Result<u64>;

    /// A ready creative by id; `None` when absent or not ready
    async fn find_ready(&self, id: CreativeId) -> Result<Option<Creative>>;

    /// Ready creatives matching a candidate predicate, ordered and paged
    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Creative>>;

    /// Total ready creatives matching a candidate predicate
    async fn count_candidates(&self, query: &CandidateQuery) -> Result<u64>;

    /// ISO-2 codes of countries with active inventory, upper case
    async fn active_countries(&self) -> Result<Vec<String>>;

    /// Every known advertising-network token, whether or not it currently
    /// has inventory
    async fn network_names(&self) -> Result<Vec<String>>;

    /// Ready-creative counts per network token
    async fn network_counts(&self) -> Result<HashMap<String, u64>>;

    /// Ready-creative counts per ad format
    async fn format_counts(&self) -> Result<HashMap<AdFormat, u64>>;
}

/// Favorite membership storage
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// The subset of `ids` the viewer has favorited, in one lookup
    async fn favorites_among(
        &self,
        viewer: UserId,
        ids: &[CreativeId],
    ) -> Result<HashSet<CreativeId>>;
}

/// Viewer capability checks
#[async_trait]
pub trait AccessProvider: Send + Sync {
    /// Whether the viewer may see similar-creative recommendations
    async fn can_view_similar(&self, viewer: UserId) -> Result<bool>;
}
