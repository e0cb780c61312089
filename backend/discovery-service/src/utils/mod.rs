// Utility functions for discovery-service

pub mod geo;
pub mod text_match;

pub use geo::{haversine_km, InvalidGeoParameter, ValidGeo};
pub use text_match::{matches_query, trigram_similarity, SIMILARITY_FLOOR};
