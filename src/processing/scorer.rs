//! Hybrid score fusion

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::processing::skills::SkillSet;
use serde::{Deserialize, Serialize};

/// The three independent signals plus their weighted fusion, all on 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub skill_score: f64,
    pub lexical_score: f64,
    pub semantic_score: f64,
    pub hybrid_score: f64,
}

#[derive(Debug, Clone)]
pub struct SkillComparison {
    pub matched: SkillSet,
    pub missing: SkillSet,
    pub score: f64,
}

pub struct HybridScorer {
    weights: ScoringConfig,
}

impl HybridScorer {
    pub fn new(weights: ScoringConfig) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringConfig {
        &self.weights
    }

    /// Share of the job's skills the resume covers. A job with no recognised
    /// skills yields 0 rather than a division by zero.
    pub fn compare_skills(&self, resume: &SkillSet, job: &SkillSet) -> SkillComparison {
        let matched: SkillSet = job.intersection(resume).cloned().collect();
        let missing: SkillSet = job.difference(resume).cloned().collect();
        let score = 100.0 * matched.len() as f64 / job.len().max(1) as f64;

        SkillComparison {
            matched,
            missing,
            score,
        }
    }

    pub fn combine(&self, skill_score: f64, lexical_score: f64, semantic_score: f64) -> ScoreResult {
        let skill_score = skill_score.clamp(0.0, 100.0);
        let lexical_score = lexical_score.clamp(0.0, 100.0);
        let semantic_score = semantic_score.clamp(0.0, 100.0);

        let weighted = self.weights.skill_weight * skill_score
            + self.weights.lexical_weight * lexical_score
            + self.weights.semantic_weight * semantic_score;

        ScoreResult {
            skill_score,
            lexical_score,
            semantic_score,
            hybrid_score: round_to_tenth(weighted).clamp(0.0, 100.0),
        }
    }
}

/// Round half away from zero to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
