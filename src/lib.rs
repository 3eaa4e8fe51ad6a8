//! Run small plugins inside a Spacelift pipeline.
//!
//! A plugin is an ordinary binary whose `main` hands a callback to
//! [`run_plugin`] together with the capabilities it needs:
//!
//! ```no_run
//! use spacehook::{run_plugin, Capability};
//!
//! fn main() -> anyhow::Result<()> {
//!     run_plugin([Capability::Logger, Capability::PlanJson], |injected| {
//!         let logger = injected.logger()?;
//!         logger.log(injected.plan_json()?);
//!         Ok(())
//!     })
//! }
//! ```
//!
//! The `spacehook` binary starts such plugins and generates the OpenTofu
//! configuration that attaches them to a context.

pub mod api;
pub mod backends;
pub mod cli;
pub mod config;
pub mod harness;
pub mod logger;
pub mod plugin;
pub mod util;
pub mod workspace;

pub use api::{ApiClient, ApiError, GraphqlRequest};
pub use config::RunConfig;
pub use harness::{run_plugin, Capability, CapabilitySet, Harness, HarnessError, Injected};
pub use logger::Logger;
pub use workspace::{ContextDocument, ContextError, ContextLoader};
