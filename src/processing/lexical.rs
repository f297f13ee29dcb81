//! TF-IDF lexical similarity between a resume and a job description

use std::collections::BTreeMap;

/// Term frequencies for one document. `BTreeMap` keeps iteration order stable
/// so repeated runs produce bit-identical floating point sums.
pub type TermCounts = BTreeMap<String, f64>;

pub fn term_counts<S: AsRef<str>>(terms: &[S]) -> TermCounts {
    let mut counts = TermCounts::new();
    for term in terms {
        *counts.entry(term.as_ref().to_string()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Scores term overlap with TF-IDF vectors fitted on exactly the two
/// documents being compared, using smoothed inverse document frequency:
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1` with `n = 2`.
#[derive(Debug, Clone, Default)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    const DOCUMENTS: f64 = 2.0;

    pub fn new() -> Self {
        Self
    }

    /// Similarity on a 0-100 scale. Zero when either side has no terms.
    pub fn score(&self, resume: &TermCounts, job: &TermCounts) -> f64 {
        if resume.is_empty() || job.is_empty() {
            return 0.0;
        }

        let resume_vec = Self::weigh(resume, job);
        let job_vec = Self::weigh(job, resume);

        let dot: f64 = resume_vec
            .iter()
            .filter_map(|(term, w)| job_vec.get(term).map(|v| w * v))
            .sum();
        let resume_norm = resume_vec.values().map(|w| w * w).sum::<f64>().sqrt();
        let job_norm = job_vec.values().map(|w| w * w).sum::<f64>().sqrt();

        if resume_norm == 0.0 || job_norm == 0.0 {
            return 0.0;
        }

        (dot / (resume_norm * job_norm) * 100.0).clamp(0.0, 100.0)
    }

    pub fn score_terms<S: AsRef<str>>(&self, resume_terms: &[S], job_terms: &[S]) -> f64 {
        self.score(&term_counts(resume_terms), &term_counts(job_terms))
    }

    fn weigh(own: &TermCounts, other: &TermCounts) -> BTreeMap<String, f64> {
        own.iter()
            .map(|(term, tf)| {
                let df = if other.contains_key(term) { 2.0 } else { 1.0 };
                let idf = ((1.0 + Self::DOCUMENTS) / (1.0 + df)).ln() + 1.0;
                (term.clone(), tf * idf)
            })
            .collect()
    }
}
