pub mod generator;
pub mod launcher;

/// Plugin names become file names and terraform labels, so keep them to a
/// single path component of word characters and dashes.
pub fn validate_plugin_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        anyhow::bail!("plugin name is empty");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        anyhow::bail!("plugin name '{}' contains invalid character '{}'", name, c);
    }
    Ok(())
}
