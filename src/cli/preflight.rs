//! Pre-flight checks before commands that call hosted models.
//!
//! Fails fast with a readable message instead of midway through a request.

use crate::config::Settings;
use crate::error::{PensumError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs the generation key and, for the search tool, the embedding key.
    Query,
    /// Indexing embeds course content.
    Index,
    /// Listing courses reads the local store only.
    Courses,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Query => {
            check_env_key(&settings.generation.api_key_env)?;
            check_env_key("OPENAI_API_KEY")?;
        }
        Operation::Index => {
            check_env_key("OPENAI_API_KEY")?;
        }
        Operation::Courses => {}
    }
    Ok(())
}

/// Check that an API key variable is set and non-empty.
fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(PensumError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(PensumError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courses_has_no_requirements() {
        assert!(check(Operation::Courses, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_generation_key_is_reported() {
        let mut settings = Settings::default();
        settings.generation.api_key_env = "PENSUM_PREFLIGHT_UNSET_KEY".to_string();

        let err = check(Operation::Query, &settings).unwrap_err();
        assert!(err.to_string().contains("PENSUM_PREFLIGHT_UNSET_KEY not set"));
    }
}
