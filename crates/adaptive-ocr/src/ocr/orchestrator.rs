//! Multi-pass orchestration.
//!
//! Runs pass 1, assesses it, and when enhancement was requested and the pass looks weak, re-runs
//! recognition with a toggled page segmentation mode and alternative threshold strategies. Every
//! retry trigger reads pass 1's assessment only, so at most four passes run. All passes share one
//! engine session and run one after another.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::ocr::engine::RecognitionEngine;
use crate::ocr::merge::merge;
use crate::ocr::quality::{QualityAssessment, assess};
use crate::ocr::strategy::{EngineParams, PSM_AUTO, PSM_SINGLE_BLOCK, ThresholdStrategy};
use crate::types::{ImageSource, RecognitionResult, Region};

/// Pass 1 scores below this add an adaptive-threshold pass.
pub const ADAPTIVE_RETRY_SCORE: f64 = 75.0;
/// Pass 1 scores below this, with low word-confidence spread, add a Sauvola pass.
pub const SAUVOLA_RETRY_SCORE: f64 = 80.0;
pub const SAUVOLA_MAX_STD_DEV: f64 = 15.0;

/// One engine invocation within a top-level call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub result: RecognitionResult,
    pub strategy: ThresholdStrategy,
    pub psm: u8,
}

impl StrategyAttempt {
    /// Short label such as `otsu/psm6`.
    pub fn label(&self) -> String {
        format!("{}/psm{}", self.strategy, self.psm)
    }
}

/// Settings for one adaptive recognition call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub language: String,
    pub psm: u8,
    pub oem: u8,
    pub enhance: bool,
    pub region: Option<Region>,
}

/// A pass scheduled by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPass {
    pub psm: u8,
    pub strategy: ThresholdStrategy,
}

/// Outcome of [`recognize_adaptive`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveOutcome {
    /// Pass 1 result, or the merged result when retries ran.
    pub result: RecognitionResult,
    pub initial_quality: QualityAssessment,
    pub final_quality: QualityAssessment,
    /// In execution order, pass 1 first.
    pub attempts: Vec<StrategyAttempt>,
}

impl AdaptiveOutcome {
    pub fn is_multi_pass(&self) -> bool {
        self.attempts.len() > 1
    }

    /// Final confidence minus pass 1 confidence.
    pub fn improvement(&self) -> f64 {
        self.result.confidence - self.initial_quality.average_confidence
    }

    pub fn strategies_used(&self) -> Vec<String> {
        self.attempts.iter().map(StrategyAttempt::label).collect()
    }
}

/// Page segmentation mode tried by the second pass.
pub fn toggled_psm(psm: u8) -> u8 {
    if psm == PSM_AUTO { PSM_SINGLE_BLOCK } else { PSM_AUTO }
}

/// Decide the retry passes that follow a weak pass 1.
///
/// Always includes the toggled-psm pass; adaptive and Sauvola passes depend on pass 1's score and
/// spread.
pub fn plan_retries(initial_psm: u8, initial: &QualityAssessment) -> Vec<PlannedPass> {
    let mut passes = vec![PlannedPass {
        psm: toggled_psm(initial_psm),
        strategy: ThresholdStrategy::Otsu,
    }];

    if initial.score < ADAPTIVE_RETRY_SCORE {
        passes.push(PlannedPass {
            psm: initial_psm,
            strategy: ThresholdStrategy::Adaptive,
        });
    }

    if initial.confidence_std_dev < SAUVOLA_MAX_STD_DEV && initial.score < SAUVOLA_RETRY_SCORE {
        passes.push(PlannedPass {
            psm: initial_psm,
            strategy: ThresholdStrategy::Sauvola,
        });
    }

    passes
}

fn run_pass(
    engine: &mut dyn RecognitionEngine,
    image: &ImageSource,
    region: Option<&Region>,
    params: &EngineParams,
) -> Result<StrategyAttempt> {
    engine.configure(params)?;
    let result = engine.recognize(image, region)?;
    tracing::debug!(
        psm = params.psm,
        strategy = %params.strategy(),
        confidence = result.confidence,
        words = result.words.len(),
        "recognition pass complete"
    );
    Ok(StrategyAttempt {
        result,
        strategy: params.strategy(),
        psm: params.psm,
    })
}

/// Run exactly one pass with an explicit parameter bundle.
pub fn recognize_once(
    engine: &mut dyn RecognitionEngine,
    image: &ImageSource,
    region: Option<&Region>,
    params: &EngineParams,
) -> Result<AdaptiveOutcome> {
    let attempt = run_pass(engine, image, region, params)?;
    let quality = assess(&attempt.result);
    Ok(AdaptiveOutcome {
        result: attempt.result.clone(),
        initial_quality: quality,
        final_quality: quality,
        attempts: vec![attempt],
    })
}

/// Recognize an image with the adaptive multi-pass policy.
///
/// Any engine failure aborts the call; attempts gathered so far are discarded. The caller owns the
/// session and is responsible for releasing it.
pub fn recognize_adaptive(
    engine: &mut dyn RecognitionEngine,
    image: &ImageSource,
    request: &RecognitionRequest,
) -> Result<AdaptiveOutcome> {
    let region = request.region.as_ref();
    let base = EngineParams::build(
        request.psm,
        request.oem,
        &request.language,
        request.enhance,
        ThresholdStrategy::Otsu,
    );

    let first = run_pass(engine, image, region, &base)?;
    let initial_quality = assess(&first.result);
    tracing::debug!(
        score = initial_quality.score,
        level = %initial_quality.classification,
        "initial quality assessed"
    );

    if !request.enhance || !initial_quality.needs_improvement {
        return Ok(AdaptiveOutcome {
            result: first.result.clone(),
            initial_quality,
            final_quality: initial_quality,
            attempts: vec![first],
        });
    }

    let mut attempts = vec![first];
    for pass in plan_retries(request.psm, &initial_quality) {
        let params = if pass.strategy == ThresholdStrategy::Otsu {
            base.with_psm(pass.psm)
        } else {
            EngineParams::build(pass.psm, request.oem, &request.language, true, pass.strategy)
        };
        attempts.push(run_pass(engine, image, region, &params)?);
    }

    let result = merge(&attempts);
    let final_quality = assess(&result);

    tracing::info!(
        attempts = attempts.len(),
        initial_confidence = initial_quality.average_confidence,
        final_confidence = result.confidence,
        merged = result.is_merged(),
        "multi-pass recognition complete"
    );

    Ok(AdaptiveOutcome {
        result,
        initial_quality,
        final_quality,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::quality::QualityLevel;

    fn assessment(score: f64, std_dev: f64) -> QualityAssessment {
        QualityAssessment {
            score,
            average_confidence: score,
            confidence_std_dev: std_dev,
            word_count: 10,
            needs_improvement: score < 85.0,
            classification: QualityLevel::from_score(score),
        }
    }

    #[test]
    fn test_toggled_psm() {
        assert_eq!(toggled_psm(3), 6);
        assert_eq!(toggled_psm(6), 3);
        assert_eq!(toggled_psm(11), 3);
    }

    #[test]
    fn test_plan_weak_low_spread_runs_all_retries() {
        let plan = plan_retries(3, &assessment(60.0, 10.0));
        assert_eq!(
            plan,
            vec![
                PlannedPass { psm: 6, strategy: ThresholdStrategy::Otsu },
                PlannedPass { psm: 3, strategy: ThresholdStrategy::Adaptive },
                PlannedPass { psm: 3, strategy: ThresholdStrategy::Sauvola },
            ]
        );
    }

    #[test]
    fn test_plan_weak_high_spread_skips_sauvola() {
        let plan = plan_retries(3, &assessment(60.0, 25.0));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].strategy, ThresholdStrategy::Adaptive);
    }

    #[test]
    fn test_plan_moderate_score() {
        // 78: no adaptive pass, but sauvola with low spread
        let plan = plan_retries(6, &assessment(78.0, 5.0));
        assert_eq!(
            plan,
            vec![
                PlannedPass { psm: 3, strategy: ThresholdStrategy::Otsu },
                PlannedPass { psm: 6, strategy: ThresholdStrategy::Sauvola },
            ]
        );
    }

    #[test]
    fn test_plan_near_threshold_only_toggles_psm() {
        let plan = plan_retries(3, &assessment(82.0, 5.0));
        assert_eq!(plan, vec![PlannedPass { psm: 6, strategy: ThresholdStrategy::Otsu }]);
    }

    #[test]
    fn test_plan_never_exceeds_three_retries() {
        for score in [0.0, 40.0, 74.9, 79.9, 84.9] {
            for std_dev in [0.0, 14.9, 15.0, 30.0] {
                assert!(plan_retries(3, &assessment(score, std_dev)).len() <= 3);
            }
        }
    }

    #[test]
    fn test_attempt_label() {
        let attempt = StrategyAttempt {
            result: RecognitionResult::default(),
            strategy: ThresholdStrategy::Sauvola,
            psm: 3,
        };
        assert_eq!(attempt.label(), "sauvola/psm3");
    }
}
