//! Text normalization and term extraction

use crate::error::{DocumentRole, Result, ResumeRankerError};
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Converts raw extracted document text into clean, sentence-bounded text.
///
/// Normalization is the single validated entry condition for every later
/// stage: once a [`NormalizedText`] exists its text is non-empty, and no
/// downstream component checks emptiness again.
pub struct TextNormalizer {
    stop_words: HashSet<&'static str>,
    whitespace_regex: Regex,
    repeated_punct_regex: Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    raw: String,
    text: String,
    sentences: Vec<String>,
    char_count: usize,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `(raw, normalized)` text.
    pub fn into_parts(self) -> (String, String) {
        (self.raw, self.text)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");
        let repeated_punct_regex = Regex::new(r"([.!?]){2,}").expect("Invalid punctuation regex");

        Self {
            stop_words: stop_words(),
            whitespace_regex,
            repeated_punct_regex,
        }
    }

    /// Normalize raw text, failing with `EmptyDocument` when nothing is left.
    pub fn normalize(&self, raw: &str, role: DocumentRole) -> Result<NormalizedText> {
        let stripped = Self::strip_control_chars(raw);
        let unified = Self::normalize_unicode(&stripped);
        let punctuated = self.repeated_punct_regex.replace_all(&unified, "$1");
        let collapsed = self.whitespace_regex.replace_all(&punctuated, " ");
        let collapsed = collapsed.trim();

        if collapsed.is_empty() {
            return Err(ResumeRankerError::empty(role));
        }

        // Re-join on sentence boundaries so every sentence is separated by exactly one space
        let sentences: Vec<String> = collapsed
            .unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let text = sentences.join(" ");
        let char_count = text.chars().count();

        Ok(NormalizedText {
            raw: raw.to_string(),
            text,
            sentences,
            char_count,
        })
    }

    /// Lowercased content terms with stop words and single characters removed
    pub fn terms(&self, text: &str) -> Vec<String> {
        let mut terms = Vec::new();

        for word in text.unicode_words() {
            let normalized = word.to_lowercase();

            if normalized.chars().count() > 1
                && !self.stop_words.contains(normalized.as_str())
                && normalized.chars().any(|c| c.is_alphanumeric())
            {
                terms.push(normalized);
            }
        }

        terms
    }

    /// Whitespace controls become spaces, every other control or zero-width char is dropped
    fn strip_control_chars(text: &str) -> String {
        text.chars()
            .filter_map(|c| match c {
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => None,
                c if c.is_control() && c.is_whitespace() => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect()
    }

    fn normalize_unicode(text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2022}' | '\u{25CF}' | '\u{25AA}' => ' ',
                '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
                '\u{2026}' => '.',
                _ => c,
            })
            .collect()
    }
}

pub(crate) fn stop_words() -> HashSet<&'static str> {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
        "each", "etc", "few", "for", "from", "further", "had", "has", "have", "having", "he",
        "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "me", "more", "most", "my", "myself",
        "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
        "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so", "some",
        "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
        "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
        "up", "very", "via", "was", "we", "were", "what", "when", "where", "which", "while",
        "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
        "yourselves", "also", "may", "must", "well", "within", "without",
    ]
    .into_iter()
    .collect()
}
