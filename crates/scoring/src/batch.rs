//! Concurrent batch scoring. Each visitor becomes one fetch-then-score
//! task; results are joined in input order, so index `i` of the output
//! always corresponds to visitor `i` regardless of completion order.

use std::future::Future;
use std::sync::Arc;

use leadscope_core::types::{Event, Session, Visitor};
use tracing::warn;

use crate::engine::{LeadScoreResult, ScoringEngine};

/// Fans out one task per visitor. `fetch` resolves a visitor to their
/// session and event collections (normally a call into the external data
/// store). A panicked task degrades to the zero result instead of taking
/// the whole batch down.
pub async fn score_concurrently<F, Fut>(
    engine: Arc<ScoringEngine>,
    visitors: Vec<Visitor>,
    fetch: F,
) -> Vec<LeadScoreResult>
where
    F: Fn(Visitor) -> Fut,
    Fut: Future<Output = (Visitor, Vec<Session>, Vec<Event>)> + Send + 'static,
{
    let handles: Vec<_> = visitors
        .into_iter()
        .map(|visitor| {
            let engine = Arc::clone(&engine);
            let unit = fetch(visitor);
            tokio::spawn(async move {
                let (visitor, sessions, events) = unit.await;
                engine.score(&visitor, &sessions, &events, None)
            })
        })
        .collect();

    // Awaiting handles in spawn order keeps results positional no matter
    // which task finishes first.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(error = %e, "scoring task failed, emitting zero result");
                results.push(LeadScoreResult::degraded(
                    None,
                    format!("scoring task failed: {e}"),
                ));
            }
        }
    }
    results
}
