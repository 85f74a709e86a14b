//! # Inspector Search
//!
//! Fuzzy ranking for the type and tag pickers.
//!
//! - [`Candidate`] - a pickable entry with name, category and synonyms
//! - [`score_candidate`] - heuristic score of one candidate
//! - [`SearchEngine`] - multi-threaded ranking into a best match plus
//!   secondary results
//! - [`type_candidates`] / [`tag_candidates`] - candidate builders
//!
//! ## Example
//!
//! ```
//! use inspector_search::{Candidate, SearchEngine};
//!
//! let candidates = [
//!     Candidate::new("Player Health"),
//!     Candidate::new("Player Mana"),
//!     Candidate::new("Enemy Health"),
//! ];
//! let results = SearchEngine::default().rank(&candidates, "ph");
//! assert_eq!(results.best.map(|b| b.index), Some(0));
//! ```

mod candidate;
mod engine;
mod error;
mod score;
mod settings;

pub use candidate::{Candidate, tag_candidates, type_candidates};
pub use engine::{ScoredCandidate, SearchEngine, SearchResults};
pub use error::{SearchError, SearchResult};
pub use score::{FieldMatch, Pattern, score_candidate, score_field, tokenize};
pub use settings::SearchSettings;
