//! HTTP client for pulling a place's reviews from the Places API.

use std::time::Duration;

use reviewpulse_core::RawReview;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com/v1";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";
const FIELD_MASK: &str = "displayName,reviews";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    #[serde(rename = "displayName")]
    display_name: Option<LocalizedText>,
    reviews: Option<Vec<RawReview>>,
}

/// Reviews of one place, in provider order.
#[derive(Debug, Clone, Default)]
pub struct PlaceReviews {
    pub display_name: Option<String>,
    pub reviews: Vec<RawReview>,
}

/// Parse a place details response body. A body with no `reviews` key yields
/// an empty review list.
pub fn parse_place_response(body: &str) -> Result<PlaceReviews, FetchError> {
    let details: PlaceDetails = serde_json::from_str(body)?;
    Ok(PlaceReviews {
        display_name: details.display_name.and_then(|d| d.text),
        reviews: details.reviews.unwrap_or_default(),
    })
}

/// Places API client. One GET per place.
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    /// Create a client against the public Places API.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, timeout)
    }

    /// `base_url` should be like `https://places.googleapis.com/v1` (no trailing slash).
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn place_url(&self, place_id: &str) -> String {
        format!("{}/places/{}", self.base_url, place_id.trim())
    }

    /// Fetch the reviews of one place.
    pub async fn fetch_reviews(&self, place_id: &str) -> Result<PlaceReviews, FetchError> {
        let url = self.place_url(place_id);

        debug!(url = %url, "fetching place reviews");
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, FIELD_MASK)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let place = parse_place_response(&body)?;
        info!(
            place_id,
            name = place.display_name.as_deref().unwrap_or("-"),
            count = place.reviews.len(),
            "fetched reviews"
        );
        Ok(place)
    }
}
