//! Skill extraction against a canonical taxonomy

use crate::config::SkillDefinition;
use crate::error::{Result, ResumeRankerError};
use crate::processing::tagger::{Tagger, Token, TokenKind};
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Canonical skill names. Ordered so output and iteration are deterministic.
pub type SkillSet = BTreeSet<String>;

/// A canonical skill and every surface form that counts as a mention of it.
/// Only synonyms are matched, so ambiguous canonical names like `Go` are safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub canonical: String,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillTaxonomy {
    entries: Vec<SkillEntry>,
}

impl SkillTaxonomy {
    pub fn new(entries: Vec<SkillEntry>) -> Self {
        Self { entries }
    }

    /// Built-in taxonomy extended with configured definitions.
    ///
    /// A configured entry whose canonical name already exists adds its
    /// synonyms to that entry instead of creating a duplicate.
    pub fn with_extra(extra: &[SkillDefinition]) -> Self {
        let mut taxonomy = Self::builtin();
        for definition in extra {
            let canonical = definition.canonical.trim();
            if canonical.is_empty() {
                continue;
            }
            let mut synonyms: Vec<String> = definition
                .synonyms
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            synonyms.push(canonical.to_lowercase());

            match taxonomy
                .entries
                .iter_mut()
                .find(|e| e.canonical.eq_ignore_ascii_case(canonical))
            {
                Some(entry) => entry.synonyms.extend(synonyms),
                None => taxonomy.entries.push(SkillEntry {
                    canonical: canonical.to_string(),
                    synonyms,
                }),
            }
        }
        for entry in &mut taxonomy.entries {
            entry.synonyms.sort();
            entry.synonyms.dedup();
        }
        taxonomy
    }

    pub fn entries(&self) -> &[SkillEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn builtin() -> Self {
        let table: &[(&str, &[&str])] = &[
            // Programming languages
            ("Python", &["python"]),
            ("Java", &["java"]),
            ("C++", &["c++", "cpp"]),
            ("C#", &["c#", "csharp"]),
            ("JavaScript", &["javascript", "js", "ecmascript"]),
            ("TypeScript", &["typescript"]),
            ("Rust", &["rust"]),
            ("Go", &["golang"]),
            ("Ruby", &["ruby"]),
            ("PHP", &["php"]),
            ("Swift", &["swift"]),
            ("Kotlin", &["kotlin"]),
            ("Scala", &["scala"]),
            // Data stores
            ("SQL", &["sql"]),
            ("MySQL", &["mysql"]),
            ("PostgreSQL", &["postgresql", "postgres"]),
            ("MongoDB", &["mongodb", "mongo"]),
            ("SQLite", &["sqlite"]),
            ("Redis", &["redis"]),
            ("Elasticsearch", &["elasticsearch"]),
            ("Firebase", &["firebase"]),
            // Web
            ("HTML", &["html", "html5"]),
            ("CSS", &["css", "css3"]),
            ("React", &["react", "react.js", "reactjs"]),
            ("Vue", &["vue", "vue.js", "vuejs"]),
            ("Angular", &["angular", "angularjs"]),
            ("Next.js", &["next.js", "nextjs"]),
            ("Node.js", &["node.js", "nodejs"]),
            ("Express", &["express.js", "expressjs"]),
            ("Django", &["django"]),
            ("Flask", &["flask"]),
            ("FastAPI", &["fastapi"]),
            ("REST API", &["rest api", "rest apis", "restful"]),
            ("GraphQL", &["graphql"]),
            // Data science and ML
            ("Machine Learning", &["machine learning", "ml"]),
            ("Deep Learning", &["deep learning"]),
            ("TensorFlow", &["tensorflow"]),
            ("Keras", &["keras"]),
            ("PyTorch", &["pytorch"]),
            ("scikit-learn", &["scikit-learn", "sklearn"]),
            ("Pandas", &["pandas"]),
            ("NumPy", &["numpy"]),
            ("Spark", &["apache spark", "pyspark"]),
            ("Kafka", &["kafka"]),
            // Infrastructure
            ("Docker", &["docker"]),
            ("Kubernetes", &["kubernetes", "k8s"]),
            ("AWS", &["aws", "amazon web services"]),
            ("Azure", &["azure"]),
            ("GCP", &["gcp", "google cloud"]),
            ("Terraform", &["terraform"]),
            ("Linux", &["linux"]),
            ("Git", &["git"]),
            ("CI/CD", &["ci/cd", "cicd"]),
            // Soft skills and practices
            ("Communication", &["communication"]),
            ("Leadership", &["leadership"]),
            ("Problem Solving", &["problem solving", "problem-solving"]),
            ("Teamwork", &["teamwork", "team player"]),
            ("Agile", &["agile"]),
            ("Scrum", &["scrum"]),
        ];

        Self::new(
            table
                .iter()
                .map(|(canonical, synonyms)| SkillEntry {
                    canonical: canonical.to_string(),
                    synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        )
    }
}

/// A phrase match aligned to token boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseHit {
    pub label: usize,
    pub start: usize,
    pub end: usize,
}

/// Case-insensitive multi-pattern matcher that only accepts matches lining up
/// with token boundaries, so `java` never matches inside `javascript` and
/// `sql` never matches inside `mysql`. A match may span stop words
/// (`ruby on rails`) but never a sentence break.
pub struct PhraseMatcher {
    automaton: AhoCorasick,
    pattern_labels: Vec<usize>,
}

impl PhraseMatcher {
    /// `labelled` pairs each pattern with the index of the label it reports.
    pub fn new<S: AsRef<str>>(labelled: &[(usize, S)]) -> Result<Self> {
        let patterns: Vec<&str> = labelled.iter().map(|(_, p)| p.as_ref()).collect();
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .map_err(|e| ResumeRankerError::Processing(format!("Failed to build phrase matcher: {}", e)))?;

        Ok(Self {
            automaton,
            pattern_labels: labelled.iter().map(|(label, _)| *label).collect(),
        })
    }

    /// All boundary-aligned hits ordered by position. A hit may span stop
    /// words but never a sentence break.
    pub fn find_all(&self, text: &str, tokens: &[Token]) -> Vec<PhraseHit> {
        let starts: HashSet<usize> = tokens.iter().map(|t| t.start).collect();
        let ends: HashSet<usize> = tokens.iter().map(|t| t.end).collect();
        let breaks: Vec<usize> = tokens.iter().filter(|t| is_sentence_break(t)).map(|t| t.start).collect();

        let mut hits: Vec<PhraseHit> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| starts.contains(&m.start()) && ends.contains(&m.end()))
            .filter(|m| !breaks.iter().any(|b| m.start() <= *b && *b < m.end()))
            .map(|m| PhraseHit {
                label: self.pattern_labels[m.pattern().as_usize()],
                start: m.start(),
                end: m.end(),
            })
            .collect();

        hits.sort_by_key(|h| (h.start, std::cmp::Reverse(h.end), h.label));
        hits
    }

    /// Earliest hit, preferring the longest one at that position.
    pub fn find_first(&self, text: &str, tokens: &[Token]) -> Option<PhraseHit> {
        self.find_all(text, tokens).into_iter().next()
    }
}

fn is_sentence_break(token: &Token) -> bool {
    token.kind == TokenKind::Punctuation && matches!(token.text.as_str(), "." | "!" | "?" | ";" | ":")
}

/// Maps normalized text to the set of canonical skills it mentions.
pub struct SkillExtractor {
    taxonomy: SkillTaxonomy,
    matcher: PhraseMatcher,
    tagger: Arc<dyn Tagger>,
}

impl SkillExtractor {
    pub fn new(taxonomy: SkillTaxonomy, tagger: Arc<dyn Tagger>) -> Result<Self> {
        let labelled: Vec<(usize, String)> = taxonomy
            .entries()
            .iter()
            .enumerate()
            .flat_map(|(idx, entry)| {
                entry.synonyms.iter().map(move |s| (idx, s.to_lowercase()))
            })
            .collect();

        if labelled.is_empty() {
            return Err(ResumeRankerError::Configuration(
                "skill taxonomy has no entries".to_string(),
            ));
        }

        let matcher = PhraseMatcher::new(&labelled)?;

        Ok(Self {
            taxonomy,
            matcher,
            tagger,
        })
    }

    pub fn extract(&self, text: &str) -> SkillSet {
        let tokens = self.tagger.tag(text);
        self.extract_tagged(text, &tokens)
    }

    pub fn extract_tagged(&self, text: &str, tokens: &[Token]) -> SkillSet {
        self.matcher
            .find_all(text, tokens)
            .into_iter()
            .map(|hit| self.taxonomy.entries()[hit.label].canonical.clone())
            .collect()
    }
}
