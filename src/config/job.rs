use std::path::Path;

use serde::Deserialize;

use crate::error::GaitError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let job_file: JobFile = serde_yml::from_str(yaml)
            .map_err(|e| GaitError::config(format!("Failed to parse job YAML: {e}")))?;
        for job in &job_file.jobs {
            job.validate()?;
        }
        Ok(job_file)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// 1つのPDFレポートと、その被験者ID。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub input: String,
    pub subject_id: String,
    /// `false` でこのジョブだけキャッシュを使わない。
    pub cache: Option<bool>,
}

impl Job {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.subject_id.trim().is_empty() {
            return Err(GaitError::config(format!(
                "job '{}': subject_id cannot be empty",
                self.input
            )));
        }
        Ok(())
    }
}
