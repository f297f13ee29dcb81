//! Token tagging

use crate::processing::normalizer::stop_words;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Word,
    Number,
    Symbol,
    Punctuation,
}

/// A tagged token. `start` and `end` are byte offsets into the tagged text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
    pub is_stop: bool,
}

/// Linguistic tagger shared read-only by every worker.
pub trait Tagger: Send + Sync {
    fn name(&self) -> &str;

    fn tag(&self, text: &str) -> Vec<Token>;
}

/// Rule based tagger built on Unicode word boundaries (UAX #29).
///
/// Keeps compound technical terms such as `node.js` or `b.e` together as a
/// single word, while `c++` and `ci/cd` come out as word and symbol tokens.
pub struct RuleTagger {
    stop_words: HashSet<&'static str>,
}

impl Default for RuleTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTagger {
    pub fn new() -> Self {
        Self {
            stop_words: stop_words(),
        }
    }

    fn classify(segment: &str) -> TokenKind {
        if segment.chars().any(|c| c.is_alphabetic()) {
            TokenKind::Word
        } else if segment.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            && segment.chars().any(|c| c.is_ascii_digit())
        {
            TokenKind::Number
        } else if segment
            .chars()
            .all(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '"' | '\''))
        {
            TokenKind::Punctuation
        } else {
            TokenKind::Symbol
        }
    }
}

impl Tagger for RuleTagger {
    fn name(&self) -> &str {
        "rule-uax29"
    }

    fn tag(&self, text: &str) -> Vec<Token> {
        text.split_word_bound_indices()
            .filter(|(_, segment)| !segment.chars().all(char::is_whitespace))
            .map(|(start, segment)| {
                let kind = Self::classify(segment);
                let is_stop = kind == TokenKind::Word
                    && self.stop_words.contains(segment.to_lowercase().as_str());
                Token {
                    text: segment.to_string(),
                    start,
                    end: start + segment.len(),
                    kind,
                    is_stop,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_offsets_point_into_text() {
        let tagger = RuleTagger::new();
        let text = "Built REST APIs with Node.js and C++.";

        let tokens = tagger.tag(text);

        for token in &tokens {
            assert_eq!(&text[token.start..token.end], token.text);
        }
        assert_eq!(
            texts(&tokens),
            vec!["Built", "REST", "APIs", "with", "Node.js", "and", "C", "+", "+", "."]
        );
    }

    #[test]
    fn test_token_kinds() {
        let tagger = RuleTagger::new();
        let tokens = tagger.tag("GPA 3.8, C# and the ci/cd");

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds[0], TokenKind::Word);
        assert_eq!(kinds[1], TokenKind::Number);
        assert_eq!(kinds[2], TokenKind::Punctuation);
        assert_eq!(tokens[4].text, "#");
        assert_eq!(tokens[4].kind, TokenKind::Symbol);

        let the = tokens.iter().find(|t| t.text == "the").unwrap();
        assert!(the.is_stop);
    }
}
