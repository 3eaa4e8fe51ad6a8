//! Capability injection.
//!
//! A plugin declares which capabilities it wants up front; the harness builds
//! only those and hands them over in an [`Injected`] bundle. Nothing that was
//! not requested is constructed, so unused context files are never read and a
//! plugin that does not talk to the API runs fine without credentials.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::api::ApiClient;
use crate::config::{normalize_domain, RunConfig};
use crate::logger::Logger;
use crate::workspace::{ContextDocument, ContextError, ContextLoader};

pub const HARNESS_NAME: &str = "spacehook";

const API_DISABLED_MESSAGE: &str =
    "API is not enabled, please export \"SPACELIFT_API_TOKEN\" and \"SPACELIFT_DOMAIN\".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Logger,
    QueryApi,
    PlanJson,
    StateBeforeJson,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Logger,
        Capability::QueryApi,
        Capability::PlanJson,
        Capability::StateBeforeJson,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::Logger => "logger",
            Capability::QueryApi => "query_api",
            Capability::PlanJson => "plan_json",
            Capability::StateBeforeJson => "state_before_json",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The capabilities a plugin asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[Capability]> for CapabilitySet {
    fn from(capabilities: &[Capability]) -> Self {
        capabilities.iter().copied().collect()
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(capabilities: [Capability; N]) -> Self {
        capabilities.into_iter().collect()
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("capability '{capability}' is unavailable: {reason}")]
    CapabilityUnavailable {
        capability: Capability,
        reason: String,
    },
    #[error("capability '{0}' was not requested")]
    NotRequested(Capability),
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// What the callback receives: exactly the capabilities it requested.
#[derive(Debug, Default)]
pub struct Injected {
    logger: Option<Logger>,
    query_api: Option<ApiClient>,
    plan_json: Option<ContextDocument>,
    state_before_json: Option<ContextDocument>,
}

impl Injected {
    pub fn logger(&self) -> Result<&Logger, HarnessError> {
        self.logger
            .as_ref()
            .ok_or(HarnessError::NotRequested(Capability::Logger))
    }

    pub fn query_api(&self) -> Result<&ApiClient, HarnessError> {
        self.query_api
            .as_ref()
            .ok_or(HarnessError::NotRequested(Capability::QueryApi))
    }

    pub fn plan_json(&self) -> Result<&ContextDocument, HarnessError> {
        self.plan_json
            .as_ref()
            .ok_or(HarnessError::NotRequested(Capability::PlanJson))
    }

    pub fn state_before_json(&self) -> Result<&ContextDocument, HarnessError> {
        self.state_before_json
            .as_ref()
            .ok_or(HarnessError::NotRequested(Capability::StateBeforeJson))
    }

    /// The set of capabilities actually present.
    pub fn provided(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        if self.logger.is_some() {
            set = set.with(Capability::Logger);
        }
        if self.query_api.is_some() {
            set = set.with(Capability::QueryApi);
        }
        if self.plan_json.is_some() {
            set = set.with(Capability::PlanJson);
        }
        if self.state_before_json.is_some() {
            set = set.with(Capability::StateBeforeJson);
        }
        set
    }
}

/// Resolved run state plus the prebuilt logger and (when credentials allow)
/// API client. Consumed by [`Harness::run`], so a harness invokes at most one
/// callback.
#[derive(Debug)]
pub struct Harness {
    logger: Logger,
    api: Option<ApiClient>,
    loader: ContextLoader,
}

impl Harness {
    /// Validate the domain and decide whether the API is usable. A domain
    /// without an https scheme only disables the API; it is not an error.
    pub fn new(config: &RunConfig, logger: Logger) -> Self {
        logger.log(format!(
            "Starting {HARNESS_NAME} {}",
            env!("CARGO_PKG_VERSION")
        ));

        let domain = match config.domain.as_deref().map(normalize_domain) {
            Some(Ok(domain)) => Some(domain),
            Some(Err(err)) => {
                logger.warn(err);
                None
            }
            None => None,
        };

        let api = match (config.api_token.as_deref(), domain) {
            (Some(token), Some(domain)) => Some(ApiClient::new(&domain, token, logger.clone())),
            _ => None,
        };

        Self {
            loader: ContextLoader::new(&config.workspace_root, logger.clone()),
            logger,
            api,
        }
    }

    pub fn api_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Build the requested capabilities and invoke `callback` once with them.
    ///
    /// Requesting `query_api` without a usable token and domain fails before
    /// anything else is built and the callback is never called.
    pub fn run<F, R>(self, requested: impl Into<CapabilitySet>, callback: F) -> Result<R, HarnessError>
    where
        F: FnOnce(Injected) -> R,
    {
        let requested = requested.into();
        let mut injected = Injected::default();

        if requested.contains(Capability::QueryApi) {
            match self.api {
                Some(api) => injected.query_api = Some(api),
                None => {
                    self.logger.error(API_DISABLED_MESSAGE);
                    return Err(HarnessError::CapabilityUnavailable {
                        capability: Capability::QueryApi,
                        reason: API_DISABLED_MESSAGE.to_string(),
                    });
                }
            }
        }
        if requested.contains(Capability::Logger) {
            injected.logger = Some(self.logger.clone());
        }
        if requested.contains(Capability::PlanJson) {
            injected.plan_json = Some(self.loader.plan_json()?);
        }
        if requested.contains(Capability::StateBeforeJson) {
            injected.state_before_json = Some(self.loader.state_before_json()?);
        }

        Ok(callback(injected))
    }
}

/// Run a plugin from its `main`.
///
/// Reads the environment, names the logger after the running executable, and
/// exits the process with status 1 when a requested capability cannot be
/// provided. Any other failure is returned to the caller.
pub fn run_plugin<F>(requested: impl Into<CapabilitySet>, callback: F) -> anyhow::Result<()>
where
    F: FnOnce(Injected) -> anyhow::Result<()>,
{
    use anyhow::Context;

    let config = RunConfig::from_env().context("failed to resolve run configuration")?;
    let logger = Logger::new(plugin_name(), &config);
    match Harness::new(&config, logger).run(requested, callback) {
        Ok(result) => result,
        Err(HarnessError::CapabilityUnavailable { .. }) => std::process::exit(1),
        Err(err) => Err(err.into()),
    }
}

/// File stem of the current executable, or the harness name if unknown.
pub fn plugin_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| HARNESS_NAME.to_string())
}
