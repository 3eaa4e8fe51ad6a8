use anyhow::Context;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn leftover_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{.*?\}\}").expect("placeholder pattern is valid"))
}

/// Simple interpolation: replace {{name}} (or {{ name }}) with its value.
pub fn interpolate(template: &str, values: &HashMap<&str, String>) -> String {
    let mut s = template.to_string();

    for (k, v) in values {
        let p1 = format!("{{{{{}}}}}", k);
        let p2 = format!("{{{{ {} }}}}", k);
        s = s.replace(&p1, v);
        s = s.replace(&p2, v);
    }

    // Drop anything unresolved so no raw template text reaches the output
    leftover_placeholder().replace_all(&s, "").to_string()
}

pub fn write_artifact(dir: &Path, name: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("failed to write {:?}", path))?;
    Ok(path)
}
