//! Response rendering.
//!
//! Reports are plain serde structs; JSON output is their pretty-printed serialization and text
//! output is a human-readable summary of the same fields. Multi-pass provenance is always carried
//! when more than one pass ran.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::ocr::orchestrator::AdaptiveOutcome;
use crate::ocr::quality::{QualityAssessment, QualityLevel};
use crate::ocr::strategy::ThresholdStrategy;
use crate::ocr::validation::SUPPORTED_LANGUAGES;
use crate::types::{Line, OutputFormat, Region, Word};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub score: f64,
    pub level: QualityLevel,
    /// Word-confidence standard deviation.
    pub variance: f64,
    pub word_count: usize,
}

impl From<&QualityAssessment> for QualitySummary {
    fn from(quality: &QualityAssessment) -> Self {
        Self {
            score: quality.score,
            level: quality.classification,
            variance: quality.confidence_std_dev,
            word_count: quality.word_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStrategySummary {
    pub enabled: bool,
    pub strategies_used: usize,
    /// Attempt labels in execution order, e.g. `otsu/psm6`.
    pub strategies: Vec<String>,
    pub initial_confidence: f64,
    pub final_confidence: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub enabled: bool,
    pub merge_count: usize,
}

/// Rendered outcome of one recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionReport {
    pub text: String,
    pub confidence: f64,
    pub language: String,
    pub psm: u8,
    pub enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_strategy: Option<ThresholdStrategy>,
    pub quality: QualitySummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_strategy: Option<MultiStrategySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged: Option<MergeSummary>,
    pub words: Vec<Word>,
    pub lines: Vec<Line>,
}

impl RecognitionReport {
    pub fn from_outcome(outcome: &AdaptiveOutcome, language: &str, psm: u8, enhanced: bool) -> Self {
        let result = &outcome.result;

        let multi_strategy = outcome.is_multi_pass().then(|| MultiStrategySummary {
            enabled: true,
            strategies_used: outcome.attempts.len(),
            strategies: outcome.strategies_used(),
            initial_confidence: outcome.initial_quality.average_confidence,
            final_confidence: result.confidence,
            improvement: outcome.improvement(),
        });

        let merged = result.merge_count.map(|merge_count| MergeSummary {
            enabled: true,
            merge_count,
        });

        Self {
            text: result.text.clone(),
            confidence: result.confidence,
            language: language.to_string(),
            psm,
            enhanced,
            region: None,
            preprocessing: None,
            threshold_strategy: None,
            quality: QualitySummary::from(&outcome.final_quality),
            multi_strategy,
            merged,
            words: result.words.clone(),
            lines: result.lines.clone(),
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_preprocessing(mut self, steps: Vec<String>, strategy: ThresholdStrategy) -> Self {
        self.preprocessing = Some(steps);
        self.threshold_strategy = Some(strategy);
        self
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.to_text()),
        }
    }

    fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(if self.enhanced { "OCR result (enhanced):" } else { "OCR result:" });
        out.push_str("\n\n");
        out.push_str(self.text.trim_end());
        out.push_str("\n\n");
        out.push_str(&format!("Confidence: {:.2}%\n", self.confidence));
        out.push_str(&format!("Language: {}\n", self.language));
        out.push_str(&format!("PSM: {}", self.psm));

        if let Some(region) = &self.region {
            out.push_str(&format!(
                "\nRegion: x={}, y={}, width={}, height={}",
                region.x, region.y, region.width, region.height
            ));
        }

        if let Some(steps) = &self.preprocessing {
            out.push_str(&format!("\nPreprocessing: {}", steps.join(", ")));
        }

        out.push_str(&format!(
            "\nQuality: {} ({:.1}/100)",
            self.quality.level, self.quality.score
        ));

        if let Some(multi) = &self.multi_strategy {
            out.push_str("\n\nMulti-strategy recognition:");
            out.push_str(&format!(
                "\n- Strategies used: {} ({})",
                multi.strategies_used,
                multi.strategies.join(", ")
            ));
            out.push_str(&format!("\n- Initial confidence: {:.2}%", multi.initial_confidence));
            out.push_str(&format!("\n- Final confidence: {:.2}%", multi.final_confidence));
            out.push_str(&format!("\n- Improvement: {:+.2}%", multi.improvement));
        }

        if let Some(merged) = &self.merged {
            out.push_str(&format!(
                "\nConfidence-weighted merge: {} results merged",
                merged.merge_count
            ));
        }

        out
    }
}

/// Counts of batch items per quality level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl QualityDistribution {
    pub fn record(&mut self, level: QualityLevel) {
        match level {
            QualityLevel::Excellent => self.excellent += 1,
            QualityLevel::Good => self.good += 1,
            QualityLevel::Fair => self.fair += 1,
            QualityLevel::Poor => self.poor += 1,
        }
    }
}

/// One image of a batch: either a summary of its recognition or the error that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub path: String,
    pub text: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    pub fn success(path: impl Into<String>, outcome: &AdaptiveOutcome) -> Self {
        Self {
            path: path.into(),
            text: outcome.result.text.clone(),
            confidence: outcome.result.confidence,
            word_count: Some(outcome.result.words.len()),
            quality: Some(outcome.final_quality.classification),
            quality_score: Some(outcome.final_quality.score),
            attempts: Some(outcome.attempts.len()),
            error: None,
        }
    }

    pub fn failure(path: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            text: String::new(),
            confidence: 0.0,
            word_count: None,
            quality: None,
            quality_score: None,
            attempts: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of a batch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// Mean confidence over successful items, rounded to two decimals.
    pub average_confidence: f64,
    pub enhanced: bool,
    pub quality_distribution: QualityDistribution,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    pub fn from_items(results: Vec<BatchItem>, enhanced: bool) -> Self {
        let mut quality_distribution = QualityDistribution::default();
        let mut total_confidence = 0.0;
        let mut success = 0;

        for item in results.iter().filter(|item| item.is_success()) {
            success += 1;
            total_confidence += item.confidence;
            if let Some(level) = item.quality {
                quality_distribution.record(level);
            }
        }

        let average_confidence = if success > 0 {
            (total_confidence / success as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            total: results.len(),
            success,
            failed: results.len() - success,
            average_confidence,
            enhanced,
            quality_distribution,
            results,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.to_text()),
        }
    }

    fn to_text(&self) -> String {
        let dist = &self.quality_distribution;
        let summary = format!(
            "Batch OCR complete{}\nTotal: {} | Success: {} | Failed: {} | Average confidence: {:.2}%\nQuality distribution: excellent {}, good {}, fair {}, poor {}",
            if self.enhanced { " (enhanced)" } else { "" },
            self.total,
            self.success,
            self.failed,
            self.average_confidence,
            dist.excellent,
            dist.good,
            dist.fair,
            dist.poor,
        );

        let sections = self
            .results
            .iter()
            .enumerate()
            .map(|(i, item)| match &item.error {
                Some(error) => format!("Image {}: {}\nError: {}", i + 1, item.path, error),
                None => format!(
                    "Image {}: {}\n{}\nConfidence: {:.2}%\nQuality: {}\nWords: {}",
                    i + 1,
                    item.path,
                    item.text.trim_end(),
                    item.confidence,
                    item.quality.map(|q| q.as_str()).unwrap_or("unknown"),
                    item.word_count.unwrap_or(0),
                ),
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        format!("{}\n\n{}", summary, sections)
    }
}

/// Render the advertised language list.
pub fn render_languages(format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let languages: Vec<serde_json::Value> = SUPPORTED_LANGUAGES
                .iter()
                .map(|(code, name)| serde_json::json!({ "code": code, "name": name }))
                .collect();
            Ok(serde_json::to_string_pretty(&serde_json::json!({
                "count": languages.len(),
                "languages": languages,
            }))?)
        }
        OutputFormat::Text => {
            let list = SUPPORTED_LANGUAGES
                .iter()
                .map(|(code, name)| format!("  {:<10} - {}", code, name))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!(
                "Supported OCR languages ({}):\n\n{}\n\nTips:\n- Join several codes with +, e.g. eng+chi_sim\n- Enable enhance_quality for higher accuracy on difficult images",
                SUPPORTED_LANGUAGES.len(),
                list
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::orchestrator::StrategyAttempt;
    use crate::ocr::quality::assess;
    use crate::types::{BoundingBox, RecognitionResult};

    fn result(text: &str, confidence: f64, merge_count: Option<usize>) -> RecognitionResult {
        RecognitionResult {
            text: text.to_string(),
            confidence,
            words: (0..3)
                .map(|i| Word {
                    text: text.to_string(),
                    confidence,
                    bbox: BoundingBox::new(i * 20, 0, i * 20 + 10, 10),
                })
                .collect(),
            lines: vec![],
            merge_count,
        }
    }

    fn single_pass(confidence: f64) -> AdaptiveOutcome {
        let res = result("hello", confidence, None);
        let quality = assess(&res);
        AdaptiveOutcome {
            result: res.clone(),
            initial_quality: quality,
            final_quality: quality,
            attempts: vec![StrategyAttempt {
                result: res,
                strategy: ThresholdStrategy::Otsu,
                psm: 3,
            }],
        }
    }

    fn multi_pass() -> AdaptiveOutcome {
        let first = result("he1lo", 60.0, None);
        let second = result("hello", 70.0, None);
        let merged = result("hello", 70.0, Some(2));
        AdaptiveOutcome {
            initial_quality: assess(&first),
            final_quality: assess(&merged),
            result: merged,
            attempts: vec![
                StrategyAttempt { result: first, strategy: ThresholdStrategy::Otsu, psm: 3 },
                StrategyAttempt { result: second, strategy: ThresholdStrategy::Otsu, psm: 6 },
            ],
        }
    }

    #[test]
    fn test_single_pass_text_report() {
        let report = RecognitionReport::from_outcome(&single_pass(92.0), "eng", 3, false);
        let text = report.render(OutputFormat::Text).unwrap();
        assert!(text.starts_with("OCR result:\n\nhello\n\n"));
        assert!(text.contains("Confidence: 92.00%"));
        assert!(text.contains("Language: eng"));
        assert!(text.contains("PSM: 3"));
        assert!(text.contains("Quality: excellent"));
        assert!(!text.contains("Multi-strategy"));
        assert!(!text.contains("merge"));
    }

    #[test]
    fn test_multi_pass_text_report() {
        let report = RecognitionReport::from_outcome(&multi_pass(), "eng", 3, true);
        let text = report.render(OutputFormat::Text).unwrap();
        assert!(text.starts_with("OCR result (enhanced):"));
        assert!(text.contains("Strategies used: 2 (otsu/psm3, otsu/psm6)"));
        assert!(text.contains("Initial confidence: 60.00%"));
        assert!(text.contains("Final confidence: 70.00%"));
        assert!(text.contains("Improvement: +10.00%"));
        assert!(text.contains("Confidence-weighted merge: 2 results merged"));
    }

    #[test]
    fn test_json_report_keys() {
        let report = RecognitionReport::from_outcome(&multi_pass(), "eng", 3, true);
        let json: serde_json::Value = serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["text"], "hello");
        assert_eq!(json["enhanced"], true);
        assert_eq!(json["quality"]["level"], "fair");
        assert_eq!(json["quality"]["word_count"], 3);
        assert_eq!(json["multi_strategy"]["strategies_used"], 2);
        assert_eq!(json["multi_strategy"]["improvement"], 10.0);
        assert_eq!(json["merged"]["merge_count"], 2);
        assert_eq!(json["words"][0]["bbox"]["x1"], 10);
        assert!(json.get("region").is_none());
    }

    #[test]
    fn test_json_single_pass_omits_provenance() {
        let report = RecognitionReport::from_outcome(&single_pass(92.0), "eng", 3, false);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("multi_strategy").is_none());
        assert!(json.get("merged").is_none());
    }

    #[test]
    fn test_region_and_preprocessing_annotations() {
        let report = RecognitionReport::from_outcome(&single_pass(88.0), "eng", 6, false)
            .with_region(Region { x: 1, y: 2, width: 3, height: 4 })
            .with_preprocessing(vec!["noise removal".to_string()], ThresholdStrategy::Adaptive);
        let text = report.render(OutputFormat::Text).unwrap();
        assert!(text.contains("Region: x=1, y=2, width=3, height=4"));
        assert!(text.contains("Preprocessing: noise removal"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["threshold_strategy"], "adaptive");
    }

    #[test]
    fn test_batch_report_stats() {
        let items = vec![
            BatchItem::success("a.png", &single_pass(92.0)),
            BatchItem::failure("b.png", "Image file not found: b.png"),
            BatchItem::success("c.png", &single_pass(81.0)),
        ];
        let report = BatchReport::from_items(items, false);
        assert_eq!(report.total, 3);
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.average_confidence, 86.5);
        assert_eq!(report.quality_distribution.excellent, 1);
        assert_eq!(report.quality_distribution.good, 1);
        assert_eq!(report.quality_distribution.poor, 0);
    }

    #[test]
    fn test_batch_report_text() {
        let items = vec![
            BatchItem::success("a.png", &single_pass(92.0)),
            BatchItem::failure("b.png", "Image file not found: b.png"),
        ];
        let text = BatchReport::from_items(items, true).render(OutputFormat::Text).unwrap();
        assert!(text.starts_with("Batch OCR complete (enhanced)"));
        assert!(text.contains("Total: 2 | Success: 1 | Failed: 1"));
        assert!(text.contains("Image 1: a.png\nhello"));
        assert!(text.contains("\n\n---\n\nImage 2: b.png\nError: Image file not found: b.png"));
    }

    #[test]
    fn test_empty_batch() {
        let report = BatchReport::from_items(vec![], false);
        assert_eq!(report.total, 0);
        assert_eq!(report.average_confidence, 0.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["quality_distribution"]["fair"], 0);
    }

    #[test]
    fn test_render_languages() {
        let text = render_languages(OutputFormat::Text).unwrap();
        assert!(text.starts_with("Supported OCR languages (18):"));
        assert!(text.contains("  chi_sim    - Simplified Chinese"));

        let json: serde_json::Value = serde_json::from_str(&render_languages(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["count"], 18);
        assert_eq!(json["languages"][0]["code"], "eng");
    }
}
