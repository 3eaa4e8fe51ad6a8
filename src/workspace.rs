use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::logger::Logger;

pub const PLAN_FILE: &str = "spacelift.plan.json";
pub const STATE_BEFORE_FILE: &str = "spacelift.state.before.json";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?} as JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON artifact left in the workspace by the plan/apply step, or the
/// marker for its absence.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextDocument {
    Loaded(Value),
    Missing,
}

impl ContextDocument {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Loaded(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for ContextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(v) => write!(f, "{v}"),
            Self::Missing => f.write_str("<missing>"),
        }
    }
}

/// Reads the optional plan/state documents from the workspace root.
#[derive(Debug, Clone)]
pub struct ContextLoader {
    root: PathBuf,
    logger: Logger,
}

impl ContextLoader {
    pub fn new(root: impl Into<PathBuf>, logger: Logger) -> Self {
        Self {
            root: root.into(),
            logger,
        }
    }

    pub fn plan_json(&self) -> Result<ContextDocument, ContextError> {
        self.load(PLAN_FILE)
    }

    pub fn state_before_json(&self) -> Result<ContextDocument, ContextError> {
        self.load(STATE_BEFORE_FILE)
    }

    fn load(&self, name: &str) -> Result<ContextDocument, ContextError> {
        let path = self.root.join(name);
        if !path.exists() {
            self.logger.error(format!("{name} does not exist."));
            return Ok(ContextDocument::Missing);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ContextError::Read {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_str(&content)
            .map_err(|source| ContextError::Parse { path, source })?;
        Ok(ContextDocument::Loaded(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn loader(root: &Path) -> ContextLoader {
        let sink = std::io::sink();
        ContextLoader::new(root, Logger::new("t", &Default::default()).to_writer(sink))
    }

    #[test]
    fn loads_present_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PLAN_FILE), r#"{"resource_changes": []}"#).unwrap();
        std::fs::write(dir.path().join(STATE_BEFORE_FILE), "[1, 2]").unwrap();

        let loader = loader(dir.path());
        assert_eq!(
            loader.plan_json().unwrap(),
            ContextDocument::Loaded(json!({"resource_changes": []}))
        );
        assert_eq!(
            loader.state_before_json().unwrap().into_value(),
            Some(json!([1, 2]))
        );
    }

    #[test]
    fn missing_documents_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        assert!(loader.plan_json().unwrap().is_missing());
        assert!(loader.state_before_json().unwrap().is_missing());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PLAN_FILE), "{not json").unwrap();
        let err = loader(dir.path()).plan_json().unwrap_err();
        assert!(matches!(err, ContextError::Parse { .. }));
    }

    #[test]
    fn display() {
        assert_eq!(ContextDocument::Missing.to_string(), "<missing>");
        assert_eq!(ContextDocument::Loaded(json!({"a": 1})).to_string(), r#"{"a":1}"#);
    }
}
