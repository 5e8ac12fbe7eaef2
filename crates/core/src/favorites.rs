//! Batch favorite resolution
//!
//! Annotating a result page touches the favorite store once per page, never
//! once per item.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::store::FavoriteStore;
use crate::types::{Creative, CreativeCard, CreativeId, UserId};

pub struct FavoriteResolver {
    store: Arc<dyn FavoriteStore>,
}

impl FavoriteResolver {
    pub fn new(store: Arc<dyn FavoriteStore>) -> Self {
        Self { store }
    }

    /// The subset of `ids` the viewer has favorited, in one store lookup
    pub async fn resolve(
        &self,
        viewer: UserId,
        ids: &[CreativeId],
    ) -> Result<HashSet<CreativeId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        self.store.favorites_among(viewer, ids).await
    }

    /// Build viewer-annotated cards for a page of creatives
    ///
    /// Anonymous viewers get `is_favorite = false` on every card without
    /// touching the store.
    pub async fn annotate(
        &self,
        viewer: Option<UserId>,
        creatives: &[Creative],
    ) -> Result<Vec<CreativeCard>> {
        let favorites = match viewer {
            Some(viewer) => {
                let ids: Vec<CreativeId> = creatives.iter().map(|c| c.id).collect();
                self.resolve(viewer, &ids).await?
            }
            None => HashSet::new(),
        };
        Ok(creatives
            .iter()
            .map(|c| CreativeCard::from_creative(c, favorites.contains(&c.id)))
            .collect())
    }
}
