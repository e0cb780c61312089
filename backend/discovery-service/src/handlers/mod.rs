/// HTTP handlers for discovery-service
pub mod feed;
pub mod interactions;

pub use feed::{
    get_feed, get_most_commented, get_recent, get_recommended, get_trending, FeedHandlerState,
    FeedQueryParams,
};
pub use interactions::{
    record_comment, record_read, toggle_favorite, toggle_like, InteractionHandlerState,
};
