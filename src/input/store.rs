//! Candidate document stores

use crate::batch::{CandidateDocument, CandidateFailure, FailureReason};
use crate::error::{Result, ResumeRankerError};
use crate::input::manager::InputManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source of `(identity, resume text)` pairs for batch ranking.
pub trait CandidateStore {
    fn load_candidates(&self) -> impl std::future::Future<Output = Result<LoadedCandidates>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct LoadedCandidates {
    pub documents: Vec<CandidateDocument>,
    /// Entries whose file could not be read. Hand these to the batch so
    /// they are reported as excluded candidates.
    pub failures: Vec<CandidateFailure>,
}

/// TOML manifest listing candidate files:
///
/// ```toml
/// [[candidates]]
/// identity = "jane@example.com"
/// path = "resumes/jane.pdf"
/// submitted_at = "2024-05-01T09:30:00Z"
/// ```
///
/// Relative paths resolve against the manifest's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub candidates: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub identity: String,
    pub path: PathBuf,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

pub struct ManifestStore {
    manifest_path: PathBuf,
}

impl ManifestStore {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    pub async fn read_manifest(&self) -> Result<Manifest> {
        let content = tokio::fs::read_to_string(&self.manifest_path).await?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| {
            ResumeRankerError::InvalidInput(format!(
                "Invalid manifest {}: {}",
                self.manifest_path.display(),
                e
            ))
        })?;

        if let Some(entry) = manifest.candidates.iter().find(|c| c.identity.trim().is_empty()) {
            return Err(ResumeRankerError::InvalidInput(format!(
                "Manifest entry for {} has an empty identity",
                entry.path.display()
            )));
        }

        Ok(manifest)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.manifest_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }
}

impl CandidateStore for ManifestStore {
    async fn load_candidates(&self) -> Result<LoadedCandidates> {
        let manifest = self.read_manifest().await?;
        let mut input = InputManager::new();
        let mut loaded = LoadedCandidates::default();

        for entry in manifest.candidates {
            let path = self.resolve(&entry.path);
            let identity = entry.identity.trim().to_string();
            let document_id = entry
                .document_id
                .unwrap_or_else(|| entry.path.display().to_string());

            match input.extract_text(&path).await {
                Ok(resume_text) => loaded.documents.push(CandidateDocument {
                    identity,
                    document_id,
                    resume_text,
                    submitted_at: entry.submitted_at,
                }),
                Err(e) => {
                    log::warn!("Could not read {} for {}: {}", path.display(), identity, e);
                    loaded.failures.push(CandidateFailure {
                        identity,
                        document_id,
                        reason: FailureReason::Extraction(e.to_string()),
                    });
                }
            }
        }

        log::info!(
            "Loaded {} candidate documents from {} ({} unreadable)",
            loaded.documents.len(),
            self.manifest_path.display(),
            loaded.failures.len()
        );

        Ok(loaded)
    }
}

/// In-memory store, mostly for embedding the engine in other programs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<CandidateDocument>,
}

impl MemoryStore {
    pub fn new(documents: Vec<CandidateDocument>) -> Self {
        Self { documents }
    }

    pub fn push(&mut self, document: CandidateDocument) {
        self.documents.push(document);
    }
}

impl CandidateStore for MemoryStore {
    async fn load_candidates(&self) -> Result<LoadedCandidates> {
        Ok(LoadedCandidates {
            documents: self.documents.clone(),
            failures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_resolves_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("resumes")).unwrap();
        std::fs::write(temp_dir.path().join("resumes/jane.txt"), "Python and Django").unwrap();
        std::fs::write(temp_dir.path().join("resumes/joe.md"), "# Joe\n\nSQL").unwrap();
        let manifest = temp_dir.path().join("candidates.toml");
        std::fs::write(
            &manifest,
            r#"
[[candidates]]
identity = "jane@example.com"
path = "resumes/jane.txt"
submitted_at = "2024-05-01T09:30:00Z"

[[candidates]]
identity = "joe@example.com"
path = "resumes/joe.md"
document_id = "joe-v2"

[[candidates]]
identity = "ghost@example.com"
path = "resumes/missing.txt"
"#,
        )
        .unwrap();

        let loaded = ManifestStore::new(&manifest).load_candidates().await.unwrap();

        assert_eq!(loaded.documents.len(), 2);
        assert_eq!(loaded.documents[0].resume_text, "Python and Django");
        assert_eq!(loaded.documents[0].document_id, "resumes/jane.txt");
        assert!(loaded.documents[0].submitted_at.is_some());
        assert_eq!(loaded.documents[1].document_id, "joe-v2");
        assert_eq!(loaded.documents[1].resume_text, "Joe\nSQL");
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].identity, "ghost@example.com");
        assert_eq!(loaded.failures[0].document_id, "resumes/missing.txt");
        assert!(matches!(loaded.failures[0].reason, FailureReason::Extraction(_)));
    }

    #[tokio::test]
    async fn test_manifest_rejects_blank_identity() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("candidates.toml");
        std::fs::write(&manifest, "[[candidates]]\nidentity = \" \"\npath = \"a.txt\"\n").unwrap();

        let result = ManifestStore::new(&manifest).load_candidates().await;
        assert!(matches!(result, Err(ResumeRankerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let mut store = MemoryStore::default();
        store.push(CandidateDocument {
            identity: "a@x.com".to_string(),
            document_id: "1".to_string(),
            resume_text: "Rust".to_string(),
            submitted_at: None,
        });

        let loaded = store.load_candidates().await.unwrap();
        assert_eq!(loaded.documents.len(), 1);
    }
}
