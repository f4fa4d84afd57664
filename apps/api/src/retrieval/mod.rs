// Template retrieval: query -> nearest templates -> similarity scores ->
// threshold/fallback policy -> ranked matches.

pub mod handlers;
pub mod inspect;
pub mod models;
pub mod preview;
pub mod ranker;
pub mod scoring;
