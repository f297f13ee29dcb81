//! Structured field extraction (grades, experience, degree, branch)

use crate::error::Result;
use crate::processing::skills::PhraseMatcher;
use crate::processing::tagger::Tagger;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFields {
    pub cgpa: Option<f32>,
    pub experience_years: Option<u32>,
    pub degree: Option<String>,
    pub branch: Option<String>,
}

impl DocumentFields {
    pub fn is_empty(&self) -> bool {
        self.cgpa.is_none()
            && self.experience_years.is_none()
            && self.degree.is_none()
            && self.branch.is_none()
    }
}

const DEGREES: &[(&str, &[&str])] = &[
    ("B.Tech", &["btech", "b.tech", "b tech"]),
    ("M.Tech", &["mtech", "m.tech", "m tech"]),
    ("B.E", &["b.e"]),
    ("M.E", &["m.e"]),
    ("Bachelor", &["bachelor", "bachelors", "bachelor's"]),
    ("Master", &["master", "masters", "master's"]),
    ("PhD", &["phd", "ph.d"]),
];

const BRANCHES: &[(&str, &[&str])] = &[
    ("Computer Science", &["computer science", "cse"]),
    ("Information Technology", &["information technology"]),
    ("Mechanical", &["mechanical"]),
    ("Electrical", &["electrical"]),
    ("Electronics", &["electronics", "ece"]),
    ("Civil", &["civil"]),
];

/// Pulls the optional structured fields recruiters filter on out of free text.
pub struct FieldExtractor {
    cgpa_regex: Regex,
    experience_regex: Regex,
    degrees: PhraseMatcher,
    branches: PhraseMatcher,
    tagger: Arc<dyn Tagger>,
}

impl FieldExtractor {
    pub fn new(tagger: Arc<dyn Tagger>) -> Result<Self> {
        let cgpa_regex = Regex::new(r"(?:cgpa|gpa)[^0-9]{0,5}([0-9](?:\.[0-9]+)?)").expect("Invalid CGPA regex");
        let experience_regex =
            Regex::new(r"(\d+)\+?\s*(?:years|yrs)\s+(?:of\s+)?experience").expect("Invalid experience regex");

        Ok(Self {
            cgpa_regex,
            experience_regex,
            degrees: PhraseMatcher::new(&labelled(DEGREES))?,
            branches: PhraseMatcher::new(&labelled(BRANCHES))?,
            tagger,
        })
    }

    pub fn extract(&self, text: &str) -> DocumentFields {
        let lowered = text.to_lowercase();

        let cgpa = self
            .cgpa_regex
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok());

        let experience_years = self
            .experience_regex
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());

        let tokens = self.tagger.tag(text);
        let degree = self
            .degrees
            .find_first(text, &tokens)
            .map(|hit| DEGREES[hit.label].0.to_string());
        let branch = self
            .branches
            .find_first(text, &tokens)
            .map(|hit| BRANCHES[hit.label].0.to_string());

        DocumentFields {
            cgpa,
            experience_years,
            degree,
            branch,
        }
    }
}

fn labelled(table: &[(&'static str, &'static [&'static str])]) -> Vec<(usize, &'static str)> {
    table
        .iter()
        .enumerate()
        .flat_map(|(idx, (_, forms))| forms.iter().map(move |f| (idx, *f)))
        .collect()
}
