// Core algorithm exports
pub mod ranker;
pub mod scoring;
pub mod taxonomy;

pub use ranker::{RankResult, Ranker, DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_N};
pub use scoring::score_restaurant;
pub use taxonomy::expand;
