use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::info;

use crate::backends::{Backend, Invocation};
use crate::config::WORKSPACE_ROOT_VAR;

/// Overrides the directory plugins are looked up in.
pub const PLUGIN_DIR_VAR: &str = "SPACEHOOK_PLUGIN_DIR";
/// Dependency manifest; when present the plugin is built from source.
pub const MANIFEST: &str = "Cargo.toml";

/// What `start` will do: an optional one-off build, then the plugin itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub provision: Option<Invocation>,
    pub plugin: Invocation,
}

/// Directory holding the plugin: `SPACEHOOK_PLUGIN_DIR`, else the directory
/// of the running `spacehook` executable.
pub fn plugin_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(PLUGIN_DIR_VAR).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let exe = std::env::current_exe().context("failed to locate the spacehook executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("spacehook executable has no parent directory")
}

/// Work out the invocations for `plugin_name` without running anything.
pub fn plan_launch(plugin_dir: &Path, plugin_name: &str, workspace_root: &Path) -> LaunchPlan {
    let manifest = plugin_dir.join(MANIFEST);

    let (provision, program) = if manifest.exists() {
        let built = plugin_dir.join("target").join("release").join(plugin_name);
        let provision = (!built.exists()).then(|| {
            Invocation::new("cargo", plugin_dir)
                .arg("build")
                .arg("--release")
                .arg("--manifest-path")
                .arg(manifest.display().to_string())
        });
        (provision, built)
    } else {
        (None, plugin_dir.join(plugin_name))
    };

    let plugin = Invocation::new(program, workspace_root)
        .env(WORKSPACE_ROOT_VAR, workspace_root.display().to_string());

    LaunchPlan { provision, plugin }
}

/// Provision the plugin if needed, then run it and return its exit status.
pub async fn start(
    backend: &dyn Backend,
    plugin_dir: &Path,
    plugin_name: &str,
    workspace_root: &Path,
) -> anyhow::Result<ExitStatus> {
    super::validate_plugin_name(plugin_name)?;
    let plan = plan_launch(plugin_dir, plugin_name, workspace_root);

    if let Some(provision) = &plan.provision {
        info!("Provisioning plugin '{}': {}", plugin_name, provision.display());
        let status = backend.run(provision).await.context("provisioning failed")?;
        if !status.success() {
            anyhow::bail!(
                "provisioning plugin '{}' failed (code {:?})",
                plugin_name,
                status.code()
            );
        }
    }

    ensure_executable(&plan.plugin.program)?;
    info!("Starting plugin '{}': {}", plugin_name, plan.plugin.display());
    backend
        .run(&plan.plugin)
        .await
        .with_context(|| format!("plugin '{}' could not be started", plugin_name))
}

/// Mounted files arrive without the execute bit.
#[cfg(unix)]
fn ensure_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = std::fs::metadata(path) else {
        // Missing binaries are reported by the backend with a better message.
        return Ok(());
    };
    let mut perms = meta.permissions();
    if perms.mode() & 0o111 == 0 {
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to mark {:?} executable", path))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
