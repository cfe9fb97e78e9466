//! Result merger.
//!
//! Collapses the attempts of one multi-pass call into a single result. A clearly dominant pass wins
//! outright; otherwise words are fused slot by slot, a slot being the exact top-left corner of a
//! word's bounding box.
//!
//! Reassembled text follows first-encountered slot order, which only approximates reading order.

use indexmap::IndexMap;

use crate::ocr::orchestrator::StrategyAttempt;
use crate::types::{RecognitionResult, Word};

/// Confidence lead over the runner-up above which the top attempt is returned as-is.
pub const DOMINANCE_MARGIN: f64 = 10.0;

/// Merge a set of attempts into one result.
///
/// Returns an empty result for an empty slice.
pub fn merge(attempts: &[StrategyAttempt]) -> RecognitionResult {
    match attempts {
        [] => return RecognitionResult::default(),
        [only] => return only.result.clone(),
        _ => {}
    }

    let mut ranked: Vec<&StrategyAttempt> = attempts.iter().collect();
    // sort_by is stable, so equal confidences keep execution order
    ranked.sort_by(|a, b| b.result.confidence.total_cmp(&a.result.confidence));

    let best = &ranked[0].result;
    let runner_up = &ranked[1].result;
    if best.confidence - runner_up.confidence > DOMINANCE_MARGIN {
        tracing::debug!(
            best = best.confidence,
            runner_up = runner_up.confidence,
            "dominant attempt selected without fusion"
        );
        return best.clone();
    }

    let mut slots: IndexMap<(i32, i32), Vec<&Word>> = IndexMap::new();
    for attempt in &ranked {
        for word in &attempt.result.words {
            slots.entry(word.bbox.origin()).or_default().push(word);
        }
    }

    let selected: Vec<Word> = slots
        .values()
        .filter_map(|candidates| pick_word(candidates))
        .cloned()
        .collect();

    let text = selected
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let confidence = if selected.is_empty() {
        0.0
    } else {
        selected.iter().map(|word| word.confidence).sum::<f64>() / selected.len() as f64
    };

    tracing::debug!(
        attempts = attempts.len(),
        slots = selected.len(),
        confidence,
        "fused attempts by word position"
    );

    RecognitionResult {
        text,
        confidence,
        words: selected,
        lines: best.lines.clone(),
        merge_count: Some(attempts.len()),
    }
}

/// Highest-confidence candidate; the earliest one wins a tie.
fn pick_word<'a>(candidates: &[&'a Word]) -> Option<&'a Word> {
    candidates.iter().copied().fold(None, |chosen, word| match chosen {
        Some(current) if current.confidence >= word.confidence => Some(current),
        _ => Some(word),
    })
}
