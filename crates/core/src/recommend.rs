//! Similar-creative recommendations
//!
//! Two-stage pipeline: a primary query narrowed by every non-null reference
//! attribute, then a single format-only fallback when the primary set comes
//! up short. Format is the strongest relevance signal and is never relaxed;
//! the ready-state requirement is a correctness constraint and is never
//! relaxed either.

use std::sync::Arc;

use tracing::debug;

use crate::config::SimilarConfig;
use crate::error::Result;
use crate::favorites::FavoriteResolver;
use crate::store::{AccessProvider, CandidateOrder, CandidateQuery, CreativeStore};
use crate::types::{Creative, CreativeCard, CreativeId, UserId};

/// One page of similar creatives with pagination state
#[derive(Debug, Clone)]
pub struct SimilarPage {
    pub items: Vec<CreativeCard>,
    pub total: u64,
    pub has_more: bool,
    /// True whenever the widening query executed, even if it added nothing
    pub fallback_used: bool,
}

impl SimilarPage {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
            fallback_used: false,
        }
    }
}

pub struct Recommender {
    store: Arc<dyn CreativeStore>,
    access: Arc<dyn AccessProvider>,
    favorites: FavoriteResolver,
    config: SimilarConfig,
}

impl Recommender {
    pub fn new(
        store: Arc<dyn CreativeStore>,
        access: Arc<dyn AccessProvider>,
        favorites: FavoriteResolver,
        config: SimilarConfig,
    ) -> Self {
        Self {
            store,
            access,
            favorites,
            config,
        }
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit)
    }

    /// Primary predicate: narrow by each reference attribute that is present
    fn primary_query(reference: &Creative, offset: u64, limit: usize) -> CandidateQuery {
        CandidateQuery {
            exclude_ids: vec![reference.id],
            format: Some(reference.format),
            country: reference.country.clone(),
            network: reference.network.clone(),
            language: reference.language.clone(),
            exclude_adult: !reference.is_adult,
            order: CandidateOrder::ActivityRecency,
            offset,
            limit,
        }
    }

    /// Fallback predicate: format only, engagement-ordered
    fn fallback_query(
        reference: &Creative,
        exclude: Vec<CreativeId>,
        limit: usize,
    ) -> CandidateQuery {
        CandidateQuery {
            exclude_ids: exclude,
            format: Some(reference.format),
            country: None,
            network: None,
            language: None,
            exclude_adult: !reference.is_adult,
            order: CandidateOrder::EngagementRecency,
            offset: 0,
            limit,
        }
    }

    async fn viewer_allowed(&self, viewer: Option<UserId>) -> Result<bool> {
        match viewer {
            Some(viewer) => self.access.can_view_similar(viewer).await,
            None => Ok(true),
        }
    }

    /// Up to `limit` creatives similar to `reference`, annotated for `viewer`
    ///
    /// Viewers lacking the similar-creatives capability get an empty list,
    /// not an error.
    pub async fn recommend(
        &self,
        reference: &Creative,
        viewer: Option<UserId>,
        limit: Option<usize>,
    ) -> Result<Vec<CreativeCard>> {
        if !self.viewer_allowed(viewer).await? {
            debug!(reference = reference.id, "similar creatives denied by capability");
            return Ok(Vec::new());
        }
        let limit = self.clamp_limit(limit);
        let (candidates, fallback_used) = self.gather(reference, 0, limit).await?;
        debug!(
            reference = reference.id,
            count = candidates.len(),
            fallback_used,
            "similar creatives resolved"
        );
        self.favorites.annotate(viewer, &candidates).await
    }

    /// Paginated variant reporting total and has-more state
    pub async fn recommend_page(
        &self,
        reference: &Creative,
        viewer: Option<UserId>,
        offset: u64,
        limit: Option<usize>,
    ) -> Result<SimilarPage> {
        if !self.viewer_allowed(viewer).await? {
            return Ok(SimilarPage::empty());
        }
        let limit = self.clamp_limit(limit);

        let (candidates, fallback_used) = self.gather(reference, offset, limit).await?;
        let strict_total = self
            .store
            .count_candidates(&Self::primary_query(reference, 0, limit))
            .await?;

        // When fallback ran for an offset-0 page, the strict count undercounts
        // what the caller can actually page through; reconcile against the
        // format-only count.
        let total = if fallback_used && offset == 0 {
            let format_only = self
                .store
                .count_candidates(&Self::fallback_query(reference, vec![reference.id], limit))
                .await?;
            strict_total.max(format_only)
        } else {
            strict_total
        };

        let returned = candidates.len() as u64;
        let items = self.favorites.annotate(viewer, &candidates).await?;
        Ok(SimilarPage {
            items,
            total,
            has_more: offset + returned < total,
            fallback_used,
        })
    }

    /// Run the primary query, widening once through the fallback if short
    async fn gather(
        &self,
        reference: &Creative,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<Creative>, bool)> {
        let mut candidates = self
            .store
            .find_candidates(&Self::primary_query(reference, offset, limit))
            .await?;

        if candidates.len() >= limit {
            return Ok((candidates, false));
        }

        let mut exclude: Vec<CreativeId> = vec![reference.id];
        exclude.extend(candidates.iter().map(|c| c.id));
        let fallback = self
            .store
            .find_candidates(&Self::fallback_query(
                reference,
                exclude,
                limit - candidates.len(),
            ))
            .await?;
        candidates.extend(fallback);
        Ok((candidates, true))
    }
}
