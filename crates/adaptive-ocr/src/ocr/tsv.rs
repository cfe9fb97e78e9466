use indexmap::IndexMap;

use super::error::OcrError;
use crate::types::{BoundingBox, Line, RecognitionResult, Word};

/// Tesseract TSV row level for words.
pub const TSV_WORD_LEVEL: u32 = 5;
/// Minimum number of fields in a TSV row carrying text.
pub const TSV_MIN_FIELDS: usize = 12;

/// Build a [`RecognitionResult`] from Tesseract TSV output and the plain-text rendering.
///
/// Words come from level-5 rows with a non-negative confidence and non-empty text. Lines group
/// words by `(block, paragraph, line)` in first-seen order. Overall confidence is the mean word
/// confidence, 0 when no words were found.
pub fn parse_tsv(tsv_data: &str, text: &str) -> Result<RecognitionResult, OcrError> {
    let mut words = Vec::new();
    let mut line_groups: IndexMap<(u32, u32, u32), Vec<usize>> = IndexMap::new();

    for (line_num, row) in tsv_data.lines().enumerate() {
        if line_num == 0 && row.starts_with("level") {
            continue;
        }

        let row = row.trim_end_matches(['\r', '\n']);
        if row.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let conf = fields[10].trim().parse::<f64>().unwrap_or(-1.0);
        if conf < 0.0 {
            continue;
        }

        let word_text = fields[11].trim();
        if word_text.is_empty() {
            continue;
        }

        let left: i32 = parse_field(fields[6], "left")?;
        let top: i32 = parse_field(fields[7], "top")?;
        let width: i32 = parse_field(fields[8], "width")?;
        let height: i32 = parse_field(fields[9], "height")?;

        let key = (
            fields[2].parse().unwrap_or(0),
            fields[3].parse().unwrap_or(0),
            fields[4].parse().unwrap_or(0),
        );
        line_groups.entry(key).or_default().push(words.len());

        words.push(Word {
            text: word_text.to_string(),
            confidence: conf,
            bbox: BoundingBox::new(left, top, left + width, top + height),
        });
    }

    let lines = line_groups
        .values()
        .map(|indices| build_line(&words, indices))
        .collect();

    let confidence = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.confidence).sum::<f64>() / words.len() as f64
    };

    Ok(RecognitionResult {
        text: text.to_string(),
        confidence,
        words,
        lines,
        merge_count: None,
    })
}

fn parse_field(value: &str, name: &str) -> Result<i32, OcrError> {
    value
        .trim()
        .parse()
        .map_err(|e| OcrError::ProcessingFailed(format!("Malformed TSV {} value '{}': {}", name, value, e)))
}

fn build_line(words: &[Word], indices: &[usize]) -> Line {
    let members: Vec<&Word> = indices.iter().map(|&i| &words[i]).collect();

    let bbox = members
        .iter()
        .map(|w| w.bbox)
        .reduce(|acc, b| BoundingBox::new(acc.x0.min(b.x0), acc.y0.min(b.y0), acc.x1.max(b.x1), acc.y1.max(b.y1)))
        .unwrap_or_default();

    let text = members.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
    let confidence = members.iter().map(|w| w.confidence).sum::<f64>() / members.len().max(1) as f64;

    Line { text, confidence, bbox }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_words_basic() {
        let data = tsv(&[
            "5\t1\t1\t1\t1\t1\t100\t50\t80\t30\t95.5\tHello",
            "5\t1\t1\t1\t1\t2\t190\t50\t70\t30\t92.5\tWorld",
        ]);

        let result = parse_tsv(&data, "Hello World\n").unwrap();
        assert_eq!(result.words.len(), 2);
        assert_eq!(result.words[0].text, "Hello");
        assert_eq!(result.words[0].bbox, BoundingBox::new(100, 50, 180, 80));
        assert_eq!(result.words[1].bbox, BoundingBox::new(190, 50, 260, 80));
        assert_eq!(result.confidence, 94.0);
        assert_eq!(result.text, "Hello World\n");
        assert!(!result.is_merged());
    }

    #[test]
    fn test_non_word_rows_skipped() {
        let data = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t",
            "4\t1\t1\t1\t1\t0\t100\t50\t160\t30\t-1\t",
            "5\t1\t1\t1\t1\t1\t100\t50\t80\t30\t90\tHello",
            "5\t1\t1\t1\t1\t2\t190\t50\t70\t30\t-1\t ",
        ]);

        let result = parse_tsv(&data, "Hello").unwrap();
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.confidence, 90.0);
    }

    #[test]
    fn test_lines_grouped_in_first_seen_order() {
        let data = tsv(&[
            "5\t1\t1\t1\t1\t1\t10\t10\t40\t20\t90\tfirst",
            "5\t1\t1\t1\t1\t2\t60\t12\t40\t20\t80\tline",
            "5\t1\t1\t1\t2\t1\t10\t40\t50\t20\t70\tsecond",
        ]);

        let result = parse_tsv(&data, "").unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].text, "first line");
        assert_eq!(result.lines[0].confidence, 85.0);
        assert_eq!(result.lines[0].bbox, BoundingBox::new(10, 10, 100, 32));
        assert_eq!(result.lines[1].text, "second");
    }

    #[test]
    fn test_empty_output() {
        let result = parse_tsv(HEADER, "").unwrap();
        assert!(result.words.is_empty());
        assert!(result.lines.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_short_rows_ignored() {
        let data = tsv(&["5\t1\t1\t1", "garbage"]);
        let result = parse_tsv(&data, "").unwrap();
        assert!(result.words.is_empty());
    }

    #[test]
    fn test_malformed_geometry_is_error() {
        let data = tsv(&["5\t1\t1\t1\t1\t1\tabc\t50\t80\t30\t95\tHello"]);
        let err = parse_tsv(&data, "").unwrap_err();
        assert!(matches!(err, OcrError::ProcessingFailed(_)));
    }
}
