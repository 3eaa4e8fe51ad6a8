use std::path::PathBuf;
use thiserror::Error;

pub const RUN_ID_VAR: &str = "TF_VAR_spacelift_run_id";
pub const DEBUG_VAR: &str = "SPACELIFT_DEBUG";
pub const API_TOKEN_VAR: &str = "SPACELIFT_API_TOKEN";
pub const DOMAIN_VAR: &str = "SPACELIFT_DOMAIN";
pub const WORKSPACE_ROOT_VAR: &str = "WORKSPACE_ROOT";

/// Run id used when the pipeline did not export one.
pub const LOCAL_RUN_ID: &str = "local";

const HTTPS_PREFIX: &str = "https://";

/// Everything the harness needs from the outside world, resolved once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub run_id: String,
    pub debug: bool,
    pub api_token: Option<String>,
    pub domain: Option<String>,
    pub workspace_root: PathBuf,
}

impl RunConfig {
    /// Read the process environment. The current directory is the workspace
    /// root unless `WORKSPACE_ROOT` overrides it.
    pub fn from_env() -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::from_lookup(|key| std::env::var(key).ok(), cwd))
    }

    /// Populate from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, cwd: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            run_id: var(RUN_ID_VAR).unwrap_or_else(|| LOCAL_RUN_ID.to_string()),
            debug: var(DEBUG_VAR).map(|v| parse_flag(&v)).unwrap_or(false),
            api_token: var(API_TOKEN_VAR),
            domain: var(DOMAIN_VAR),
            workspace_root: var(WORKSPACE_ROOT_VAR).map(PathBuf::from).unwrap_or(cwd),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: LOCAL_RUN_ID.to_string(),
            debug: false,
            api_token: None,
            domain: None,
            workspace_root: PathBuf::from("."),
        }
    }
}

/// Truthy unless the value is one of the usual spellings of "off".
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("SPACELIFT_DOMAIN does not start with https://, api calls will fail.")]
    MissingHttpsScheme(String),
}

/// Require an https scheme and strip trailing slashes.
pub fn normalize_domain(raw: &str) -> Result<String, DomainError> {
    let host = raw
        .strip_prefix(HTTPS_PREFIX)
        .ok_or_else(|| DomainError::MissingHttpsScheme(raw.to_string()))?;
    Ok(format!("{HTTPS_PREFIX}{}", host.trim_end_matches('/')))
}
