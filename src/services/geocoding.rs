use crate::errors::ServiceError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const MILES_PER_METER: f64 = 1.0 / 1_609.344;
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic point resolved from a postcode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Response envelope of the postcode lookup service
#[derive(Debug, Deserialize)]
struct PostcodeLookupResponse {
    status: u16,
    result: Option<PostcodeResult>,
}

#[derive(Debug, Deserialize)]
struct PostcodeResult {
    latitude: f64,
    longitude: f64,
}

/// Client for the UK postcode lookup service (postcodes.io API shape).
///
/// `GET {base}/postcodes/{postcode}` returns
/// `{ "status": 200, "result": { "latitude": .., "longitude": .. } }`.
#[derive(Debug, Clone)]
pub struct PostcodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostcodeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a postcode to coordinates.
    ///
    /// An unknown postcode (HTTP 404 or a non-200 payload status) maps
    /// to `InvalidPostcode`; transport failures map to
    /// `GeocodingError`.
    #[instrument(skip(self))]
    pub async fn lookup(&self, postcode: &str) -> Result<Coordinates, ServiceError> {
        let trimmed = postcode.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::InvalidPostcode(postcode.to_string()));
        }

        let url = format!("{}/postcodes/{}", self.base_url, trimmed);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::GeocodingError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::InvalidPostcode(trimmed.to_string()));
        }
        if !response.status().is_success() {
            return Err(ServiceError::GeocodingError(format!(
                "postcode lookup returned HTTP {}",
                response.status()
            )));
        }

        let body: PostcodeLookupResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GeocodingError(e.to_string()))?;

        if body.status != 200 {
            return Err(ServiceError::InvalidPostcode(trimmed.to_string()));
        }

        let result = body
            .result
            .ok_or_else(|| ServiceError::GeocodingError("lookup result missing".to_string()))?;

        Ok(Coordinates {
            latitude: result.latitude,
            longitude: result.longitude,
        })
    }
}

/// Great-circle distance between two points in miles.
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_METERS * c * MILES_PER_METER
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };
    const MANCHESTER: Coordinates = Coordinates {
        latitude: 53.4808,
        longitude: -2.2426,
    };

    #[test]
    fn distance_to_self_is_zero() {
        assert!(haversine_miles(LONDON, LONDON) < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = haversine_miles(LONDON, MANCHESTER);
        let back = haversine_miles(MANCHESTER, LONDON);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn london_to_manchester_is_about_163_miles() {
        let miles = haversine_miles(LONDON, MANCHESTER);
        assert!((155.0..175.0).contains(&miles), "got {miles}");
    }
}
