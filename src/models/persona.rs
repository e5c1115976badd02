// file: src/models/persona.rs
// description: persona and job-to-be-done input loading
// reference: serde-based input schema validation

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PersonaFile {
    persona: RoleField,
    job_to_be_done: TaskField,
}

#[derive(Debug, Deserialize)]
struct RoleField {
    role: String,
}

#[derive(Debug, Deserialize)]
struct TaskField {
    task: String,
}

/// Flattened persona input: who is asking, and what they need done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaInput {
    pub persona: String,
    pub job_to_be_done: String,
}

impl PersonaInput {
    pub fn new(persona: impl Into<String>, job_to_be_done: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            job_to_be_done: job_to_be_done.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PipelineError::InputLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json(&raw).map_err(|e| match e {
            PipelineError::InputLoad(message) => {
                PipelineError::InputLoad(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: PersonaFile = serde_json::from_str(raw)
            .map_err(|e| PipelineError::InputLoad(format!("invalid persona json ({})", e)))?;

        Ok(Self {
            persona: parsed.persona.role,
            job_to_be_done: parsed.job_to_be_done.task,
        })
    }
}
