//! Fuzzy application matching.
//!
//! A search term is expanded into many encoded-query variants
//! ([`expand`]), each variant is sent to a [`RecordSearch`] backend, and the
//! combined hits are deduplicated by record id and ranked by a relevance
//! score ([`score`]) before the scores are stripped ([`aggregate`]).
//!
//! The matcher performs no I/O of its own; everything network-facing lives
//! behind [`RecordSearch`].

mod aggregate;
mod expand;
mod score;

use std::future::Future;

pub use aggregate::{aggregate, aggregate_with, find_matches, MatchOutcome, MatchReport, ScorePolicy};
pub use expand::{escape_query_value, expand, normalized_variants};
pub use score::{score, similarity};

use crate::error::PrismError;
use crate::models::CandidateRecord;

/// A backend that can run one encoded query and return matching records.
///
/// Implementations own transport, authentication and table selection.
/// A failed call only affects the variant that issued it.
pub trait RecordSearch: Send + Sync {
    /// Runs `filter` (a ServiceNow encoded query) and returns the hits.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError`] if the query could not be executed.
    fn search(
        &self,
        filter: &str,
    ) -> impl Future<Output = Result<Vec<CandidateRecord>, PrismError>> + Send;
}
