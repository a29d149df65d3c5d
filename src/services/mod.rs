pub mod coalescer;
pub mod debouncer;
pub mod fetcher;
pub mod social_graph;

pub use coalescer::FollowCheckCoalescer;
pub use debouncer::MutationDebouncer;
pub use fetcher::BatchFetcher;
pub use social_graph::SocialGraphService;
