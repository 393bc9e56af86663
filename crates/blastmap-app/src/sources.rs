//! HTTP clients for the two external services: the Overpass feature query
//! API and an OpenTopoData-style elevation lookup.

use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use blastmap_core::enums::Interpolation;
use blastmap_core::types::GeoPoint;
use blastmap_features::{ElementCollection, FeatureQuery};
use blastmap_terrain::elevation::{ElevationBatch, ElevationSource};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_ELEVATION_URL: &str = "https://api.opentopodata.org/v1/srtm90m";

/// Failure talking to an external data source.
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Overpass API client.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Run a feature query and parse the `{"elements": [...]}` response.
    pub async fn fetch(&self, query: &FeatureQuery) -> Result<ElementCollection, SourceError> {
        let body = query.to_overpass_ql();
        debug!(endpoint = %self.endpoint, bytes = body.len(), "sending overpass query");

        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| SourceError::with_source("overpass request failed", e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::new(format!(
                "overpass returned {status} from {}",
                self.endpoint
            )));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| SourceError::with_source("failed to read overpass response", e))?;

        ElementCollection::from_json(&text)
            .map_err(|e| SourceError::with_source("malformed overpass response", e))
    }
}

/// Elevation lookup against an OpenTopoData-compatible endpoint,
/// e.g. `https://api.opentopodata.org/v1/srtm90m`.
#[derive(Debug, Clone)]
pub struct OpenTopoDataSource {
    client: Client,
    endpoint: String,
}

impl OpenTopoDataSource {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn request(
        &self,
        points: Vec<GeoPoint>,
        interpolation: Interpolation,
    ) -> Result<Vec<Option<f64>>, SourceError> {
        let locations = format_locations(&points);
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("locations", locations.as_str()),
                ("interpolation", interpolation.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::with_source("elevation request failed", e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SourceError::with_source("failed to read elevation response", e))?;
        if !status.is_success() {
            return Err(SourceError::new(format!(
                "elevation service returned {status}: {}",
                text.trim()
            )));
        }
        parse_elevation_response(&text)
    }
}

impl ElevationSource for OpenTopoDataSource {
    fn name(&self) -> &str {
        "opentopodata"
    }

    fn lookup(
        &self,
        points: Vec<GeoPoint>,
        interpolation: Interpolation,
    ) -> BoxFuture<'_, ElevationBatch> {
        Box::pin(async move { Ok(self.request(points, interpolation).await?) })
    }
}

/// `lat,lon|lat,lon|...`
pub fn format_locations(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat, p.lon))
        .collect::<Vec<_>>()
        .join("|")
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    results: Vec<ElevationResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: Option<f64>,
}

/// Parse an OpenTopoData response body. Points without data map to `None`.
pub fn parse_elevation_response(body: &str) -> Result<Vec<Option<f64>>, SourceError> {
    let parsed: ElevationResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::with_source("malformed elevation response", e))?;
    if let Some(error) = parsed.error {
        return Err(SourceError::new(format!("elevation service error: {error}")));
    }
    Ok(parsed.results.into_iter().map(|r| r.elevation).collect())
}
