use crate::catalog::amenity::AmenityIndex;
use crate::catalog::InventorySource;
use crate::domain::criteria::Selection;
use crate::domain::recommendation::Diagnostic;
use crate::domain::unit::{CandidateKey, UnitCandidate};
use crate::error::RecommendError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    /// Unique by key, in key order.
    pub candidates: Vec<UnitCandidate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns inventory segments into the per-request candidate set.
pub struct CandidateGenerator<'a> {
    inventory: &'a dyn InventorySource,
    amenities: &'a AmenityIndex,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(inventory: &'a dyn InventorySource, amenities: &'a AmenityIndex) -> Self {
        Self {
            inventory,
            amenities,
        }
    }

    pub async fn generate(&self, selection: &Selection) -> Result<CandidateBatch, RecommendError> {
        let source = self.inventory.source_name();
        let batch = self.inventory.fetch_segments().await.map_err(|err| {
            RecommendError::DataUnavailable(
                err.context(format!("inventory source {source} unavailable")),
            )
        })?;
        let fetched = batch.segments.len();
        let rejected = batch.rejected.len();

        let mut diagnostics = batch.rejected;
        let mut duplicates = 0usize;
        let mut by_key: BTreeMap<CandidateKey, UnitCandidate> = BTreeMap::new();

        for mut segment in batch.segments {
            let key = segment.key();
            if !selection.admits(&key) {
                continue;
            }
            if let Err(err) = segment.validate() {
                tracing::warn!(%key, error = %err, "skipping malformed inventory segment");
                diagnostics.push(Diagnostic {
                    subject: key.to_string(),
                    detail: format!("malformed inventory segment: {err:#}"),
                });
                continue;
            }
            if by_key.contains_key(&key) {
                duplicates += 1;
                continue;
            }

            if let Some(coordinate) = segment.coordinate {
                segment.amenities = segment
                    .amenities
                    .or(self.amenities.distances_from(coordinate));
            }
            by_key.insert(key, segment);
        }

        tracing::debug!(
            source,
            fetched,
            rejected,
            selected = by_key.len(),
            duplicates,
            "generated candidates"
        );

        Ok(CandidateBatch {
            candidates: by_key.into_values().collect(),
            diagnostics,
        })
    }
}
