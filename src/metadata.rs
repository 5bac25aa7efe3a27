//! Page metadata extraction module
//!
//! Pulls the collection timestamp and the test item label out of a report
//! page's plain text. Both lookups are pattern searches that resolve to
//! fixed sentinel strings when nothing matches, so slide titles are always
//! printable and extraction never fails.

use regex::Regex;

// ============================================================
// Constants
// ============================================================

/// Sentinel used when no timestamp pattern matches
pub const TIMESTAMP_SENTINEL: &str = "date-not-found";

/// Sentinel used when no label field matches
pub const LABEL_SENTINEL: &str = "item-not-found";

/// Field marker preceding the test item label on report pages
const DEFAULT_LABEL_KEYWORD: &str = "检验项目";

/// Calendar date followed by a clock time, e.g. `2024-03-15 08:30`
const TIMESTAMP_PATTERN: &str = r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}";

/// Characters of the matched timestamp kept for the slide title (date part)
const DATE_LEN: usize = 10;

// ============================================================
// Types
// ============================================================

/// Metadata extracted from one report page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    /// Collection date (`YYYY-MM-DD`) or [`TIMESTAMP_SENTINEL`]
    pub timestamp: String,
    /// Test item label or [`LABEL_SENTINEL`]
    pub label: String,
}

impl PageMetadata {
    /// Slide title line: label followed by the date
    pub fn title(&self) -> String {
        format!("{} {}", self.label, self.timestamp)
    }

    /// Whether neither field matched
    pub fn is_all_sentinels(&self) -> bool {
        self.timestamp == TIMESTAMP_SENTINEL && self.label == LABEL_SENTINEL
    }
}

/// Pattern-based page metadata extractor
///
/// Regexes are compiled once at construction and reused across pages.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    timestamp_re: Regex,
    label_re: Regex,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_KEYWORD)
    }
}

impl MetadataExtractor {
    /// Create an extractor for the given label field keyword
    ///
    /// The keyword is matched literally, followed by an ASCII or full-width
    /// colon; the label runs non-greedily to the next line break.
    pub fn new(label_keyword: &str) -> Self {
        let timestamp_re = Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is valid");
        let label_pattern = format!(r"{}[:：]\s*(.*?)(?:\n)", regex::escape(label_keyword));
        let label_re = Regex::new(&label_pattern).expect("escaped label pattern is valid");

        Self {
            timestamp_re,
            label_re,
        }
    }

    /// Extract metadata from one page's plain text
    ///
    /// Absence of a match is a normal outcome encoded as a sentinel, never
    /// an error. Deterministic for identical input.
    pub fn extract(&self, page_text: &str) -> PageMetadata {
        let timestamp = self
            .timestamp_re
            .find(page_text)
            .map(|m| m.as_str().chars().take(DATE_LEN).collect())
            .unwrap_or_else(|| TIMESTAMP_SENTINEL.to_string());

        let label = self
            .label_re
            .captures(page_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| LABEL_SENTINEL.to_string());

        PageMetadata { timestamp, label }
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_both_fields() {
        let extractor = MetadataExtractor::default();
        let meta = extractor.extract("采集时间: 2024-03-15 08:30 检验项目：血常规\n");

        assert_eq!(meta.timestamp, "2024-03-15");
        assert_eq!(meta.label, "血常规");
    }

    #[test]
    fn test_extract_no_match_returns_sentinels() {
        let extractor = MetadataExtractor::default();
        let meta = extractor.extract("no matching fields here");

        assert_eq!(meta.timestamp, TIMESTAMP_SENTINEL);
        assert_eq!(meta.label, LABEL_SENTINEL);
        assert!(meta.is_all_sentinels());
    }

    #[test]
    fn test_extract_empty_text() {
        let meta = MetadataExtractor::default().extract("");
        assert!(meta.is_all_sentinels());
    }

    #[test]
    fn test_timestamp_keeps_date_part_only() {
        let meta = MetadataExtractor::default().extract("printed 2023-11-02 17:45:59\n");
        assert_eq!(meta.timestamp, "2023-11-02");
    }

    #[test]
    fn test_first_timestamp_wins() {
        let text = "采集 2024-01-05 09:00 审核 2024-01-06 10:00\n";
        let meta = MetadataExtractor::default().extract(text);
        assert_eq!(meta.timestamp, "2024-01-05");
    }

    #[test]
    fn test_label_ascii_colon() {
        let meta = MetadataExtractor::default().extract("检验项目: 尿常规\nother\n");
        assert_eq!(meta.label, "尿常规");
    }

    #[test]
    fn test_label_stops_at_line_break() {
        let meta = MetadataExtractor::default().extract("检验项目：肝功能 生化\n第二行\n");
        assert_eq!(meta.label, "肝功能 生化");
    }

    #[test]
    fn test_label_requires_line_break() {
        // A label at end-of-text with no trailing newline has no terminator.
        let meta = MetadataExtractor::default().extract("检验项目：血常规");
        assert_eq!(meta.label, LABEL_SENTINEL);
    }

    #[test]
    fn test_partial_timestamp_rejected() {
        let meta = MetadataExtractor::default().extract("date 2024-03-15 without time\n");
        assert_eq!(meta.timestamp, TIMESTAMP_SENTINEL);
    }

    #[test]
    fn test_custom_keyword() {
        let extractor = MetadataExtractor::new("Test item");
        let meta = extractor.extract("Test item: CBC panel\n");
        assert_eq!(meta.label, "CBC panel");
    }

    #[test]
    fn test_keyword_with_regex_metacharacters() {
        // Keyword is escaped, so metacharacters match literally.
        let extractor = MetadataExtractor::new("item (primary)");
        let meta = extractor.extract("item (primary): CRP\n");
        assert_eq!(meta.label, "CRP");
    }

    #[test]
    fn test_title_join() {
        let meta = PageMetadata {
            timestamp: "2024-03-15".to_string(),
            label: "血常规".to_string(),
        };
        assert_eq!(meta.title(), "血常规 2024-03-15");
    }

    #[test]
    fn test_title_with_sentinels() {
        let meta = MetadataExtractor::default().extract("nothing useful");
        assert_eq!(meta.title(), "item-not-found date-not-found");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = MetadataExtractor::default();
        let text = "采集时间: 2024-03-15 08:30 检验项目：血常规\n";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}
