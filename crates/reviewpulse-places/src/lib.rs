//! Review provider layer: Google Places API (v1) place details client.

pub mod http;

pub use http::{FetchError, PlaceReviews, PlacesClient, parse_place_response};
