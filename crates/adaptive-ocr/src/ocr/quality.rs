//! Recognition quality assessment.
//!
//! Scores a single [`RecognitionResult`] from its engine-reported confidence, penalized for unstable
//! per-word confidence and for suspiciously short, over-confident output.

use serde::{Deserialize, Serialize};

use crate::types::RecognitionResult;

/// Word-confidence standard deviation above which a pass is treated as unstable.
pub const HIGH_VARIANCE_THRESHOLD: f64 = 20.0;
pub const HIGH_VARIANCE_PENALTY: f64 = 10.0;

/// Fewer words than this at very high confidence is treated as noise read as text.
pub const SPARSE_WORD_COUNT: usize = 3;
pub const SPARSE_CONFIDENCE_CEILING: f64 = 90.0;
pub const SPARSE_PENALTY: f64 = 5.0;

/// Scores below this trigger the retry policy.
pub const IMPROVEMENT_THRESHOLD: f64 = 85.0;

/// Quality classification derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    /// `>= 90` excellent, `>= 80` good, `>= 70` fair, otherwise poor.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityLevel::Excellent
        } else if score >= 80.0 {
            QualityLevel::Good
        } else if score >= 70.0 {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality assessment of one recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Clamped to `[0, 100]`.
    pub score: f64,
    pub average_confidence: f64,
    /// Population standard deviation of word confidences.
    pub confidence_std_dev: f64,
    pub word_count: usize,
    pub needs_improvement: bool,
    pub classification: QualityLevel,
}

/// Assess a recognition result.
pub fn assess(result: &RecognitionResult) -> QualityAssessment {
    let average_confidence = result.confidence;
    let word_count = result.words.len();

    let confidence_std_dev = if word_count > 0 {
        let n = word_count as f64;
        let mean = result.words.iter().map(|w| w.confidence).sum::<f64>() / n;
        let variance = result
            .words
            .iter()
            .map(|w| (w.confidence - mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    } else {
        0.0
    };

    let mut score = average_confidence;
    if confidence_std_dev > HIGH_VARIANCE_THRESHOLD {
        score -= HIGH_VARIANCE_PENALTY;
    }
    if word_count < SPARSE_WORD_COUNT && average_confidence > SPARSE_CONFIDENCE_CEILING {
        score -= SPARSE_PENALTY;
    }
    let score = score.clamp(0.0, 100.0);

    QualityAssessment {
        score,
        average_confidence,
        confidence_std_dev,
        word_count,
        needs_improvement: score < IMPROVEMENT_THRESHOLD,
        classification: QualityLevel::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Word};

    fn result_with(confidence: f64, word_confidences: &[f64]) -> RecognitionResult {
        let words = word_confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| Word {
                text: format!("w{}", i),
                confidence: c,
                bbox: BoundingBox::new(i as i32 * 10, 0, i as i32 * 10 + 8, 10),
            })
            .collect();
        RecognitionResult {
            text: String::new(),
            confidence,
            words,
            lines: vec![],
            merge_count: None,
        }
    }

    #[test]
    fn test_zero_words_is_poor() {
        let q = assess(&result_with(0.0, &[]));
        assert_eq!(q.score, 0.0);
        assert_eq!(q.confidence_std_dev, 0.0);
        assert_eq!(q.word_count, 0);
        assert!(q.needs_improvement);
        assert_eq!(q.classification, QualityLevel::Poor);
    }

    #[test]
    fn test_uniform_confident_words_are_excellent() {
        let q = assess(&result_with(95.0, &[95.0, 95.0, 95.0, 95.0]));
        assert_eq!(q.score, 95.0);
        assert_eq!(q.confidence_std_dev, 0.0);
        assert!(!q.needs_improvement);
        assert_eq!(q.classification, QualityLevel::Excellent);
    }

    #[test]
    fn test_population_std_dev() {
        // mean 50, deviations +-10 -> population std dev exactly 10
        let q = assess(&result_with(50.0, &[40.0, 60.0, 40.0, 60.0]));
        assert!((q.confidence_std_dev - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_variance_penalty() {
        // std dev 30 > 20
        let q = assess(&result_with(80.0, &[50.0, 110.0, 50.0, 110.0]));
        assert!((q.confidence_std_dev - 30.0).abs() < 1e-9);
        assert_eq!(q.score, 70.0);
        assert_eq!(q.classification, QualityLevel::Fair);
    }

    #[test]
    fn test_sparse_overconfident_penalty() {
        let q = assess(&result_with(96.0, &[96.0, 96.0]));
        assert_eq!(q.score, 91.0);

        // exactly 90 average does not trigger the penalty
        let q = assess(&result_with(90.0, &[90.0]));
        assert_eq!(q.score, 90.0);
    }

    #[test]
    fn test_wordless_overconfident_result_is_good() {
        let q = assess(&result_with(92.0, &[]));
        assert_eq!(q.score, 87.0);
        assert_eq!(q.classification, QualityLevel::Good);
    }

    #[test]
    fn test_score_clamped_to_zero() {
        // both penalties cannot apply together below zero, but variance alone can
        let q = assess(&result_with(4.0, &[0.0, 80.0, 0.0, 80.0]));
        assert_eq!(q.score, 0.0);
        assert_eq!(q.classification, QualityLevel::Poor);
    }

    #[test]
    fn test_score_clamped_to_hundred() {
        let q = assess(&result_with(130.0, &[130.0, 130.0, 130.0]));
        assert_eq!(q.score, 100.0);
    }

    #[test]
    fn test_score_always_in_range() {
        let samples: [(f64, &[f64]); 6] = [
            (-50.0, &[-50.0, 10.0]),
            (0.0, &[100.0, 0.0, 100.0]),
            (99.9, &[99.9]),
            (150.0, &[]),
            (85.0, &[20.0, 90.0, 95.0, 30.0]),
            (12.5, &[12.5, 12.5, 12.5]),
        ];
        for (confidence, words) in samples {
            let q = assess(&result_with(confidence, words));
            assert!((0.0..=100.0).contains(&q.score), "score {} out of range", q.score);
        }
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(QualityLevel::from_score(90.0), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_score(89.999), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(80.0), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(79.999), QualityLevel::Fair);
        assert_eq!(QualityLevel::from_score(70.0), QualityLevel::Fair);
        assert_eq!(QualityLevel::from_score(69.999), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_score(0.0), QualityLevel::Poor);
    }

    #[test]
    fn test_needs_improvement_boundary() {
        assert!(!assess(&result_with(85.0, &[85.0, 85.0, 85.0])).needs_improvement);
        assert!(assess(&result_with(84.9, &[84.9, 84.9, 84.9])).needs_improvement);
    }

    #[test]
    fn test_quality_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&QualityLevel::Excellent).unwrap(), "\"excellent\"");
    }
}
