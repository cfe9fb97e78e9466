//! Shared test helpers: a scripted recognition engine that records every call.

#![allow(dead_code)]

use adaptive_ocr::ocr::{EngineFactory, EngineParams, RecognitionEngine, StrategyAttempt, ThresholdStrategy};
use adaptive_ocr::{AdaptiveOcrError, BoundingBox, ImageSource, RecognitionResult, Region, Result, Word};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a result with one word per entry, laid out left to right at fixed 60px steps.
///
/// Overall confidence is the mean word confidence, like the native engine reports it.
pub fn result_of(words: &[(&str, f64)]) -> RecognitionResult {
    let words: Vec<Word> = words
        .iter()
        .enumerate()
        .map(|(i, &(text, confidence))| Word {
            text: text.to_string(),
            confidence,
            bbox: BoundingBox::new(i as i32 * 60, 10, i as i32 * 60 + 50, 30),
        })
        .collect();

    let confidence = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.confidence).sum::<f64>() / words.len() as f64
    };

    RecognitionResult {
        text: words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "),
        confidence,
        words,
        lines: vec![],
        merge_count: None,
    }
}

pub fn attempt(result: RecognitionResult, strategy: ThresholdStrategy, psm: u8) -> StrategyAttempt {
    StrategyAttempt { result, strategy, psm }
}

/// Calls observed across every session a [`ScriptedFactory`] created.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub sessions: AtomicUsize,
    pub configures: AtomicUsize,
    pub recognitions: AtomicUsize,
    pub releases: AtomicUsize,
    pub configured: Mutex<Vec<(u8, ThresholdStrategy)>>,
    pub regions: Mutex<Vec<Option<Region>>>,
}

impl EngineStats {
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn configures(&self) -> usize {
        self.configures.load(Ordering::SeqCst)
    }

    pub fn recognitions(&self) -> usize {
        self.recognitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn configured(&self) -> Vec<(u8, ThresholdStrategy)> {
        self.configured.lock().unwrap().clone()
    }

    pub fn regions(&self) -> Vec<Option<Region>> {
        self.regions.lock().unwrap().clone()
    }
}

/// Factory whose sessions replay a fixed script of pass results.
///
/// Pass `n` of a session returns `script[n - 1]`; passes beyond the script repeat its last entry.
pub struct ScriptedFactory {
    script: Vec<RecognitionResult>,
    fail_on_pass: Option<usize>,
    pub stats: Arc<EngineStats>,
}

impl ScriptedFactory {
    pub fn new(script: Vec<RecognitionResult>) -> Self {
        Self {
            script,
            fail_on_pass: None,
            stats: Arc::new(EngineStats::default()),
        }
    }

    /// Make pass `pass` (1-based) of every session fail during recognition.
    pub fn failing_on(mut self, pass: usize) -> Self {
        self.fail_on_pass = Some(pass);
        self
    }
}

impl EngineFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create_session(&self, _language: &str, _oem: u8) -> Result<Box<dyn RecognitionEngine>> {
        self.stats.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            script: self.script.clone(),
            fail_on_pass: self.fail_on_pass,
            pass: 0,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct ScriptedEngine {
    script: Vec<RecognitionResult>,
    fail_on_pass: Option<usize>,
    pass: usize,
    stats: Arc<EngineStats>,
}

impl RecognitionEngine for ScriptedEngine {
    fn configure(&mut self, params: &EngineParams) -> Result<()> {
        self.stats.configures.fetch_add(1, Ordering::SeqCst);
        self.stats.configured.lock().unwrap().push((params.psm, params.strategy()));
        Ok(())
    }

    fn recognize(&mut self, _image: &ImageSource, region: Option<&Region>) -> Result<RecognitionResult> {
        self.stats.recognitions.fetch_add(1, Ordering::SeqCst);
        self.stats.regions.lock().unwrap().push(region.copied());
        self.pass += 1;

        if self.fail_on_pass == Some(self.pass) {
            return Err(AdaptiveOcrError::ocr(format!("scripted failure on pass {}", self.pass)));
        }

        let index = (self.pass - 1).min(self.script.len().saturating_sub(1));
        Ok(self.script.get(index).cloned().unwrap_or_default())
    }

    fn release(&mut self) -> Result<()> {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Write a placeholder image file; the scripted engine never decodes it.
pub fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"placeholder image").unwrap();
    path
}
