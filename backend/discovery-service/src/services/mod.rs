pub mod candidate_filter;
pub mod feed;
pub mod ledger;
pub mod memory_store;
pub mod paginator;
pub mod ranker;
pub mod scoring;

pub use candidate_filter::{CandidateFilter, FilterOutcome, Personalization};
pub use feed::FeedService;
pub use ledger::{ContentStore, InteractionLedger, InterestProvider, ItemPredicate, VisibilityProvider};
pub use memory_store::InMemoryStore;
pub use paginator::{paginate, Page, PageRequest, PageToken};
pub use ranker::{Ranker, ScoredCandidate};
pub use scoring::{ScoreWeights, ScoringPreset};
