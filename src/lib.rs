//! Guest review risk dashboard: loads a processed review table, applies the
//! analyst's filters, and computes the metrics a host UI draws.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;

use helpers::body::Json;
use helpers::BadRequest;

pub mod dataset;
pub mod filter;
pub mod helpers;
pub mod metrics;
pub mod topics;
pub mod view;

#[cfg(test)]
mod testing;

pub use dataset::{load, Dataset, DatasetCache, ListingId, LoadError, ReviewRecord, SentimentBinary};
pub use filter::{DateRange, FilterOptions, FilterRequest, FilterState, Selection};
pub use topics::{label_topics, Theme, TopicLabels};
pub use view::{render, render_seeded, RenderOptions, Section, ViewModel};

pub const SETTINGS_HEADER: &str = "x-dashboard-settings";

/// Serves dashboard views over one cached dataset.
#[derive(Debug, Default)]
pub struct Dashboard {
    cache: DatasetCache,
}

impl Dashboard {
    pub fn new(cache: DatasetCache) -> Self {
        Self { cache }
    }

    /// Dashboard over the CSV at `path` with the default theme labels.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(DatasetCache::new(path, TopicLabels::default()))
    }

    pub fn cache_mut(&mut self) -> &mut DatasetCache {
        &mut self.cache
    }

    /// Raw entry point for a host: JSON bytes in, JSON bytes out.
    pub fn serve(&mut self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        helpers::run(req, |req| self.handle(req))
    }

    pub fn handle(
        &mut self,
        req: http::Request<Json<Option<FilterRequest>>>,
    ) -> Result<http::Response<Json<ViewModel>>> {
        let settings = Settings::from_req(&req).map_err(|err| BadRequest(format!("{err:#}")))?;
        let Json(request) = req.into_body();
        let request = request.unwrap_or_default();

        let dataset = self.cache.get().context("loading review dataset")?;
        let filter = request
            .resolve(&dataset)
            .map_err(|err| BadRequest(err.to_string()))?;

        let view = render_seeded(&dataset, &filter, &settings.render_options());
        tracing::debug!(
            reviews = view.kpis.count,
            topic = %filter.topic,
            listing = %filter.listing,
            "rendered dashboard"
        );

        http::Response::builder()
            .status(200)
            .body(Json(view))
            .map_err(Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub sample_size: usize,
    pub top_listings: usize,
    pub sample_seed: u64,
}

impl Settings {
    pub fn new(headers: &http::header::HeaderMap) -> Result<Self> {
        let value = headers
            .get(SETTINGS_HEADER)
            .ok_or_else(|| anyhow::anyhow!("Missing '{SETTINGS_HEADER}' header"))
            .and_then(|value| value.to_str().map_err(Into::into))?;
        let data: HashMap<String, String> = serde_json::from_str(value)?;
        let defaults = RenderOptions::default();

        let sample_size = data
            .get("sample_size")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.sample_size);

        let top_listings = data
            .get("top_listings")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.top_listings);

        let sample_seed = data
            .get("sample_seed")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.sample_seed);

        Ok(Self {
            sample_size,
            top_listings,
            sample_seed,
        })
    }

    pub fn from_req<B>(req: &http::Request<B>) -> Result<Self> {
        Self::new(req.headers())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            sample_size: self.sample_size,
            top_listings: self.top_listings,
            sample_seed: self.sample_seed,
        }
    }
}
