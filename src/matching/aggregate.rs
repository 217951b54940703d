//! Result aggregation: run every query variant, merge by record id, rank.
//!
//! Variants are issued one at a time in generation order. A variant whose
//! search fails is logged and skipped; the remaining variants still run.

use std::collections::HashMap;
use std::str::FromStr;

use super::{expand, score, RecordSearch};
use crate::error::PrismError;
use crate::models::CandidateRecord;

/// How a record found by several variants is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Keep the highest score any variant produced for the record.
    #[default]
    Max,
    /// Keep the score from the first variant that found the record.
    FirstSeen,
}

impl FromStr for ScorePolicy {
    type Err = PrismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(ScorePolicy::Max),
            "first-seen" | "first_seen" | "first" => Ok(ScorePolicy::FirstSeen),
            other => Err(PrismError::invalid_config(format!(
                "unknown score policy {:?} (expected \"max\" or \"first-seen\")",
                other
            ))),
        }
    }
}

/// Ranked matches for one search term.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// The term as the caller supplied it.
    pub search_term: String,
    /// Number of records in `records`.
    pub count: usize,
    /// Records ordered by descending relevance.
    pub records: Vec<CandidateRecord>,
}

/// Result of [`find_matches`].
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// At least one record matched.
    Found(MatchReport),
    /// Every variant ran and nothing matched.
    NotFound {
        /// The term that was searched for.
        search_term: String,
    },
}

struct ScoredRecord {
    record: CandidateRecord,
    relevance_score: f64,
}

/// Insertion-ordered map from record id to its best-known score.
struct ResultSet {
    entries: Vec<ScoredRecord>,
    positions: HashMap<String, usize>,
    policy: ScorePolicy,
}

impl ResultSet {
    fn new(policy: ScorePolicy) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            policy,
        }
    }

    fn insert<F>(&mut self, term: &str, record: CandidateRecord, scorer: &F)
    where
        F: Fn(&str, Option<&str>, Option<&str>) -> f64,
    {
        let relevance = |r: &CandidateRecord| {
            scorer(term, r.name.as_deref(), r.description.as_deref())
        };

        match self.positions.get(&record.id) {
            Some(&pos) => {
                if self.policy == ScorePolicy::FirstSeen {
                    return;
                }
                let candidate = relevance(&record);
                let existing = &mut self.entries[pos];
                if candidate > existing.relevance_score {
                    existing.relevance_score = candidate;
                    existing.record = record;
                }
            }
            None => {
                let relevance_score = relevance(&record);
                self.positions.insert(record.id.clone(), self.entries.len());
                self.entries.push(ScoredRecord {
                    record,
                    relevance_score,
                });
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sorts by descending score (stable, so ties keep discovery order) and
    /// drops the scores.
    fn into_ranked(mut self) -> Vec<CandidateRecord> {
        self.entries
            .sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        self.entries.into_iter().map(|e| e.record).collect()
    }
}

/// Runs every variant through `search` and ranks the merged hits with
/// [`score`].
///
/// See [`aggregate_with`] for the merge rules.
pub async fn aggregate<S>(
    term: &str,
    variants: &[String],
    search: &S,
    policy: ScorePolicy,
) -> Vec<CandidateRecord>
where
    S: RecordSearch,
{
    aggregate_with(term, variants, search, policy, score).await
}

/// Runs every variant through `search` and ranks the merged hits with
/// `scorer`.
///
/// Records are keyed by id; a record with an empty id has no identity and is
/// dropped. Failed variants are skipped. The returned records are sorted by
/// descending score with ties in the order they were first found.
pub async fn aggregate_with<S, F>(
    term: &str,
    variants: &[String],
    search: &S,
    policy: ScorePolicy,
    scorer: F,
) -> Vec<CandidateRecord>
where
    S: RecordSearch,
    F: Fn(&str, Option<&str>, Option<&str>) -> f64,
{
    let mut results = ResultSet::new(policy);
    let mut failed = 0usize;

    for variant in variants {
        let records = match search.search(variant).await {
            Ok(records) => records,
            Err(e) => {
                failed += 1;
                tracing::warn!(error = %e, "Query variant failed, skipping");
                tracing::debug!(query = %variant, "Failed query variant");
                continue;
            }
        };

        tracing::trace!(query = %variant, hits = records.len(), "Query variant returned");

        for record in records {
            if record.id.is_empty() {
                tracing::debug!(query = %variant, "Dropping record without an id");
                continue;
            }
            results.insert(term, record, &scorer);
        }
    }

    tracing::debug!(
        variants = variants.len(),
        failed,
        unique = results.len(),
        "Aggregated query variants"
    );

    results.into_ranked()
}

/// Finds and ranks the records matching a free-text search term.
///
/// # Errors
///
/// Returns `PrismError::Validation` if `term` is empty or only whitespace.
/// Backend failures on individual variants are not errors; if every variant
/// fails or nothing matches the result is [`MatchOutcome::NotFound`].
pub async fn find_matches<S>(
    term: &str,
    search: &S,
    policy: ScorePolicy,
) -> Result<MatchOutcome, PrismError>
where
    S: RecordSearch,
{
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(PrismError::validation("search term is required and cannot be empty"));
    }

    let variants = expand(trimmed);
    tracing::debug!(term = %trimmed, variants = variants.len(), "Expanded search term");

    let records = aggregate(trimmed, &variants, search, policy).await;

    if records.is_empty() {
        return Ok(MatchOutcome::NotFound {
            search_term: term.to_string(),
        });
    }

    Ok(MatchOutcome::Found(MatchReport {
        search_term: term.to_string(),
        count: records.len(),
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Canned backend keyed by exact query text.
    #[derive(Default)]
    struct StubSearch {
        responses: HashMap<String, Vec<CandidateRecord>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSearch {
        fn respond(mut self, query: &str, records: Vec<CandidateRecord>) -> Self {
            self.responses.insert(query.to_string(), records);
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.failing.insert(query.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RecordSearch for StubSearch {
        async fn search(&self, filter: &str) -> Result<Vec<CandidateRecord>, PrismError> {
            self.calls.lock().unwrap().push(filter.to_string());
            if self.failing.contains(filter) {
                return Err(PrismError::validation(format!("bad filter {filter}")));
            }
            Ok(self.responses.get(filter).cloned().unwrap_or_default())
        }
    }

    fn ids(records: &[CandidateRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_equal_scores_keep_discovery_order() {
        let search = StubSearch::default()
            .respond("nameLIKEpayment", vec![CandidateRecord::new("1", "Payment Gateway")])
            .respond(
                "short_descriptionLIKEpayment",
                vec![CandidateRecord::new("2", "Payments API")],
            );

        let outcome = find_matches("Payment", &search, ScorePolicy::Max).await.unwrap();

        let MatchOutcome::Found(report) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(report.search_term, "Payment");
        assert_eq!(report.count, 2);
        assert_eq!(ids(&report.records), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_higher_score_ranks_first_regardless_of_order() {
        let search = StubSearch::default()
            .respond("nameLIKEpayment", vec![CandidateRecord::new("1", "Legacy Payment Hub")])
            .respond(
                "short_descriptionLIKEpayment",
                vec![CandidateRecord::new("2", "Payment")],
            );

        let outcome = find_matches("payment", &search, ScorePolicy::Max).await.unwrap();
        let MatchOutcome::Found(report) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(ids(&report.records), vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_padded_term_still_scores_exact_name() {
        let search = StubSearch::default().respond(
            "nameLIKEpayment",
            vec![
                CandidateRecord::new("1", "Payment Gateway"),
                CandidateRecord::new("2", "Payment"),
            ],
        );

        let outcome = find_matches("  payment ", &search, ScorePolicy::Max).await.unwrap();
        let MatchOutcome::Found(report) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(ids(&report.records), vec!["2", "1"]);
        assert_eq!(report.search_term, "  payment ");
    }

    #[tokio::test]
    async fn test_not_found_echoes_term() {
        let search = StubSearch::default();
        let outcome = find_matches("zzz-nonexistent", &search, ScorePolicy::Max)
            .await
            .unwrap();

        match outcome {
            MatchOutcome::NotFound { search_term } => assert_eq!(search_term, "zzz-nonexistent"),
            MatchOutcome::Found(_) => panic!("expected not found"),
        }
        assert_eq!(search.calls(), expand("zzz-nonexistent"));
    }

    #[tokio::test]
    async fn test_failed_variant_is_skipped() {
        let search = StubSearch::default()
            .fail("name=foo")
            .respond("nameLIKEfoo", vec![CandidateRecord::new("7", "Foo Service")]);

        let outcome = find_matches("foo", &search, ScorePolicy::Max).await.unwrap();

        let MatchOutcome::Found(report) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(ids(&report.records), vec!["7"]);
        assert_eq!(
            search.calls(),
            vec!["name=foo", "sys_id=foo", "nameLIKEfoo", "short_descriptionLIKEfoo"]
        );
    }

    #[tokio::test]
    async fn test_all_variants_failing_is_not_found() {
        let term = "foo";
        let mut search = StubSearch::default();
        for q in expand(term) {
            search = search.fail(&q);
        }
        let outcome = find_matches(term, &search, ScorePolicy::Max).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_term_rejected_before_searching() {
        let search = StubSearch::default();
        let err = find_matches("   ", &search, ScorePolicy::Max).await.unwrap_err();
        assert!(matches!(err, PrismError::Validation(_)));
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_duplicate_ids() {
        let record = CandidateRecord::new("42", "Dev Banking");
        let search = StubSearch::default()
            .respond("name=dev banking", vec![record.clone()])
            .respond("nameLIKEdev", vec![record.clone(), CandidateRecord::new("43", "Dev Tools")])
            .respond("nameLIKEdev-banking", vec![record]);

        let outcome = find_matches("dev banking", &search, ScorePolicy::Max).await.unwrap();
        let MatchOutcome::Found(report) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(ids(&report.records), vec!["42", "43"]);
    }

    #[tokio::test]
    async fn test_records_without_id_are_dropped() {
        let anonymous = CandidateRecord::new("", "Ghost App");
        let search = StubSearch::default().respond("nameLIKEghost", vec![anonymous]);

        let outcome = find_matches("ghost", &search, ScorePolicy::Max).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NotFound { .. }));
    }

    /// Record "1" is first found through its description, then again by a
    /// later variant that returns it with its real name.
    fn billing_search() -> StubSearch {
        StubSearch::default()
            .respond(
                "sys_id=billing",
                vec![CandidateRecord::new("1", "Invoicing").with_description("billing")],
            )
            .respond(
                "nameLIKEbilling",
                vec![
                    CandidateRecord::new("1", "Billing"),
                    CandidateRecord::new("2", "Billing Portal"),
                ],
            )
    }

    #[tokio::test]
    async fn test_max_policy_keeps_best_score() {
        let variants = expand("billing");
        let ranked = aggregate("billing", &variants, &billing_search(), ScorePolicy::Max).await;
        assert_eq!(ids(&ranked), vec!["1", "2"]);
        assert_eq!(ranked[0].name.as_deref(), Some("Billing"));
    }

    #[tokio::test]
    async fn test_first_seen_policy_keeps_first_score() {
        let variants = expand("billing");
        let ranked =
            aggregate("billing", &variants, &billing_search(), ScorePolicy::FirstSeen).await;
        assert_eq!(ids(&ranked), vec!["2", "1"]);
        assert_eq!(ranked[1].name.as_deref(), Some("Invoicing"));
    }

    #[tokio::test]
    async fn test_injected_scorer_controls_rank() {
        let fixed: HashMap<&str, f64> =
            [("low", 0.1), ("mid", 0.5), ("high", 0.95)].into_iter().collect();
        let search = StubSearch::default().respond(
            "q",
            vec![
                CandidateRecord::new("a", "low"),
                CandidateRecord::new("b", "high"),
                CandidateRecord::new("c", "mid"),
            ],
        );

        let ranked = aggregate_with(
            "ignored",
            &["q".to_string()],
            &search,
            ScorePolicy::Max,
            |_, name, _| fixed[name.unwrap_or_default()],
        )
        .await;

        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_score_policy_from_str() {
        assert_eq!("max".parse::<ScorePolicy>().unwrap(), ScorePolicy::Max);
        assert_eq!("First-Seen".parse::<ScorePolicy>().unwrap(), ScorePolicy::FirstSeen);
        assert!("latest".parse::<ScorePolicy>().is_err());
    }
}
