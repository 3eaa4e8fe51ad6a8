//! Emits the OpenTofu configuration that mounts a plugin into a Spacelift
//! context and hooks `spacehook start` into one lifecycle phase.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::logger::Logger;
use crate::plugin::launcher::MANIFEST;
use crate::util::{interpolate, write_artifact};

pub const OUTPUT_FILE: &str = "main.tf";

const MAIN_TF: &str = r#"
terraform {
  required_providers {
    spacelift = {
      source  = "spacelift-io/spacelift"
      version = ">= 0.0.1"
    }
  }
}

variable "name" {
  type        = string
  description = "Name of the context"
  default     = "{{plugin_name}}"
}

variable "space_id" {
  type        = string
  description = "ID of the space"
  default     = "root"
}

variable "spacelift_domain" {
  type        = string
  description = "fqdn of the spacelift instance (https://spacelift-solutions.app.spacelift.io)"
}

resource "spacelift_context" "this" {
  name = var.name

  labels   = ["autoattach:{{plugin_name}}"]
  space_id = var.space_id

  {{phase}} = [
    "chmod +x /mnt/workspace/{{plugin_name}}/spacehook",
    "/mnt/workspace/{{plugin_name}}/spacehook start {{plugin_name}}"
  ]
}

resource "spacelift_mounted_file" "spacehook" {
  context_id    = spacelift_context.this.id
  relative_path = "{{plugin_name}}/spacehook"
  content       = filebase64("${path.module}/spacehook")
  write_only    = false
}
{{plugin_files}}
resource "spacelift_environment_variable" "domain" {
  context_id = spacelift_context.this.id
  name       = "SPACELIFT_DOMAIN"
  value      = var.spacelift_domain
  write_only = false
}

resource "spacelift_environment_variable" "color" {
  context_id = spacelift_context.this.id
  name       = "CLICOLOR_FORCE"
  value      = "1"
  write_only = false
}
"#;

const PREBUILT_FILES: &str = r#"
resource "spacelift_mounted_file" "plugin" {
  context_id    = spacelift_context.this.id
  relative_path = "{{plugin_name}}/{{plugin_name}}"
  content       = filebase64("${path.module}/{{plugin_name}}")
  write_only    = false
}
"#;

const SOURCE_FILES: &str = r#"
resource "spacelift_mounted_file" "manifest" {
  context_id    = spacelift_context.this.id
  relative_path = "{{plugin_name}}/Cargo.toml"
  content       = filebase64("${path.module}/Cargo.toml")
  write_only    = false
}

resource "spacelift_mounted_file" "plugin" {
  context_id    = spacelift_context.this.id
  relative_path = "{{plugin_name}}/src/main.rs"
  content       = filebase64("${path.module}/src/main.rs")
  write_only    = false
}
"#;

/// Context hook a plugin can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeforeInit,
    AfterInit,
    BeforePlan,
    AfterPlan,
    BeforeApply,
    AfterApply,
    BeforePerform,
    AfterPerform,
    BeforeDestroy,
    AfterDestroy,
    AfterRun,
}

impl Phase {
    pub const ALL: [Phase; 11] = [
        Phase::BeforeInit,
        Phase::AfterInit,
        Phase::BeforePlan,
        Phase::AfterPlan,
        Phase::BeforeApply,
        Phase::AfterApply,
        Phase::BeforePerform,
        Phase::AfterPerform,
        Phase::BeforeDestroy,
        Phase::AfterDestroy,
        Phase::AfterRun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::BeforeInit => "before_init",
            Phase::AfterInit => "after_init",
            Phase::BeforePlan => "before_plan",
            Phase::AfterPlan => "after_plan",
            Phase::BeforeApply => "before_apply",
            Phase::AfterApply => "after_apply",
            Phase::BeforePerform => "before_perform",
            Phase::AfterPerform => "after_perform",
            Phase::BeforeDestroy => "before_destroy",
            Phase::AfterDestroy => "after_destroy",
            Phase::AfterRun => "after_run",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown phase '{0}'")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

/// How the plugin itself gets into the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginSource {
    /// A compiled `<name>` binary next to `main.tf`.
    Prebuilt,
    /// `Cargo.toml` + `src/main.rs`, built on first start.
    Source,
}

impl PluginSource {
    pub fn detect(dir: &Path) -> Self {
        if dir.join(MANIFEST).exists() {
            PluginSource::Source
        } else {
            PluginSource::Prebuilt
        }
    }
}

pub fn render(plugin_name: &str, phase: Phase, source: PluginSource) -> String {
    let name = HashMap::from([("plugin_name", plugin_name.to_string())]);
    let files = match source {
        PluginSource::Prebuilt => PREBUILT_FILES,
        PluginSource::Source => SOURCE_FILES,
    };

    let values = HashMap::from([
        ("plugin_name", plugin_name.to_string()),
        ("phase", phase.to_string()),
        ("plugin_files", interpolate(files, &name)),
    ]);
    interpolate(MAIN_TF, &values)
}

/// Write `main.tf` for `plugin_name` into `dir`.
pub fn generate(dir: &Path, plugin_name: &str, phase: Phase, logger: &Logger) -> anyhow::Result<PathBuf> {
    super::validate_plugin_name(plugin_name)?;
    logger.log(format!(
        "Generating OpenTofu code for {} in the {} phase.",
        plugin_name, phase
    ));

    let source = PluginSource::detect(dir);
    let path = write_artifact(dir, OUTPUT_FILE, &render(plugin_name, phase, source))?;
    info!("Wrote {:?} ({:?} plugin)", path, source);
    Ok(path)
}
