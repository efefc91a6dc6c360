use crate::catalog::http::HttpJsonInventory;
use crate::catalog::inventory::{JsonFileInventory, ReferenceInventory};
use crate::catalog::{Catalog, InventorySource};
use crate::config::Settings;
use crate::domain::criteria::SearchCriteria;
use crate::domain::recommendation::{
    Diagnostic, MatchStatus, PriceProjection, RecommendationSet,
};
use crate::domain::unit::UnitCandidate;
use crate::engine::candidates::CandidateGenerator;
use crate::engine::filter::{FilterStage, FilterStats};
use crate::engine::scoring;
use crate::engine::travel::DestinationAggregator;
use crate::engine::EngineOptions;
use crate::error::RecommendError;
use crate::oracle::projection::projection_from;
use crate::oracle::trend::TrendTable;
use crate::oracle::{oracle_from_settings, UnitDescription, ValuationOracle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Public entry point: candidate generation, filtering, valuation, travel aggregation, scoring.
#[derive(Clone)]
pub struct RecommendationService {
    inventory: Arc<dyn InventorySource>,
    oracle: Arc<dyn ValuationOracle>,
    catalog: Arc<Catalog>,
    trend: Option<TrendTable>,
    options: EngineOptions,
}

impl RecommendationService {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        oracle: Arc<dyn ValuationOracle>,
        catalog: Arc<Catalog>,
        options: EngineOptions,
    ) -> Self {
        Self {
            inventory,
            oracle,
            catalog,
            trend: None,
            options,
        }
    }

    pub fn with_trend_table(mut self, trend: Option<TrendTable>) -> Self {
        self.trend = trend;
        self
    }

    pub fn from_settings(settings: &Settings, options: EngineOptions) -> anyhow::Result<Self> {
        let catalog = Arc::new(Catalog::from_settings(settings)?);
        let trend = TrendTable::from_settings(settings)?;
        let oracle = oracle_from_settings(settings, trend.clone())?;
        let inventory = inventory_from_settings(settings)?;
        tracing::info!(
            inventory = inventory.source_name(),
            oracle = %oracle.kind(),
            top_k = options.top_k,
            max_concurrency = options.max_concurrency,
            "recommendation service ready"
        );
        Ok(Self::new(inventory, oracle, catalog, options).with_trend_table(trend))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn oracle(&self) -> &dyn ValuationOracle {
        self.oracle.as_ref()
    }

    pub fn trend_table(&self) -> Option<&TrendTable> {
        self.trend.as_ref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Ranked top-K for `criteria`. An empty filter result is `Ok` with
    /// [`MatchStatus::NoCandidatesMatched`].
    pub async fn recommend(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<RecommendationSet, RecommendError> {
        criteria.validate().map_err(RecommendError::invalid)?;

        let budget = self.options.request_timeout;
        match tokio::time::timeout(budget, self.run(criteria)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?budget, "recommendation timed out; in-flight valuations abandoned");
                Err(RecommendError::Timeout(budget))
            }
        }
    }

    async fn run(&self, criteria: &SearchCriteria) -> Result<RecommendationSet, RecommendError> {
        let generator = CandidateGenerator::new(self.inventory.as_ref(), self.catalog.amenities());
        let batch = generator.generate(&criteria.selection).await?;
        let mut diagnostics = batch.diagnostics;

        let filter = FilterStage::new(criteria);
        let mut stats = FilterStats::default();
        let candidates = filter.retain_static(batch.candidates, &mut stats);
        if candidates.is_empty() {
            tracing::info!(rejected = stats.rejected_total(), "no candidates left before valuation");
            return Ok(RecommendationSet::no_matches(sorted(diagnostics)));
        }

        let valued = self
            .value_all(candidates, criteria.target_year, &mut diagnostics)
            .await?;

        let mut price_stats = FilterStats::default();
        let priced = filter.retain_priced(valued, &mut price_stats);
        if priced.is_empty() {
            tracing::info!(
                rejected = stats.rejected_total() + price_stats.rejected_total(),
                "no candidates within budget"
            );
            return Ok(RecommendationSet::no_matches(sorted(diagnostics)));
        }

        let aggregator = DestinationAggregator::new(&criteria.destinations);
        diagnostics.extend_from_slice(aggregator.diagnostics());

        let (mut recommendations, scoring_diagnostics) =
            scoring::score_candidates(priced, criteria, &aggregator);
        diagnostics.extend(scoring_diagnostics);

        scoring::rank(&mut recommendations);
        let total_candidates = recommendations.len();
        recommendations.truncate(self.options.top_k);

        tracing::info!(
            total_candidates,
            returned = recommendations.len(),
            diagnostics = diagnostics.len(),
            "recommendation ranked"
        );

        Ok(RecommendationSet {
            status: MatchStatus::Ranked,
            total_candidates,
            recommendations,
            diagnostics: sorted(diagnostics),
        })
    }

    /// Values every candidate at `year` with bounded concurrency. Per-candidate failures are
    /// recorded and dropped; only a total failure is an error.
    async fn value_all(
        &self,
        candidates: Vec<UnitCandidate>,
        year: i32,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<(UnitCandidate, PriceProjection)>, RecommendError> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let sem = Arc::clone(&semaphore);
            let unit = UnitDescription::from(candidate);
            tasks.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => oracle
                        .predict(&unit, year)
                        .await
                        .and_then(|v| projection_from(&unit, year, &v)),
                    Err(err) => Err(anyhow::Error::new(err).context("valuation pool closed")),
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<PriceProjection>> = vec![None; candidates.len()];
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(projection))) => slots[index] = Some(projection),
                Ok((index, Err(err))) => {
                    failed += 1;
                    let key = candidates[index].key();
                    tracing::warn!(%key, error = %format!("{err:#}"), "valuation failed; candidate dropped");
                    diagnostics.push(Diagnostic {
                        subject: key.to_string(),
                        detail: format!("valuation failed: {err:#}"),
                    });
                }
                Err(join_err) => {
                    failed += 1;
                    tracing::error!(error = %join_err, "valuation task aborted");
                    diagnostics.push(Diagnostic {
                        subject: "valuation".to_string(),
                        detail: format!("valuation task aborted: {join_err}"),
                    });
                }
            }
        }

        let valued: Vec<_> = candidates
            .into_iter()
            .zip(slots)
            .filter_map(|(candidate, slot)| slot.map(|p| (candidate, p)))
            .collect();

        if valued.is_empty() && failed > 0 {
            return Err(RecommendError::NoCandidatesScored { failed });
        }
        Ok(valued)
    }
}

fn sorted(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort();
    diagnostics.dedup();
    diagnostics
}

/// `INVENTORY_BASE_URL`, then `INVENTORY_FILE`, then the built-in reference inventory.
pub fn inventory_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn InventorySource>> {
    if settings.inventory_base_url.is_some() {
        return Ok(Arc::new(HttpJsonInventory::from_settings(settings)?));
    }
    if let Some(path) = settings.inventory_file.as_deref() {
        return Ok(Arc::new(JsonFileInventory::new(path)));
    }
    Ok(Arc::new(ReferenceInventory))
}
