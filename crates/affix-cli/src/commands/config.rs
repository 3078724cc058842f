use std::path::Path;

use affix_core::AffixConfig;

pub fn init(path: &Path, cluster: Option<&str>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let rendered = AffixConfig::scaffold(cluster).to_toml_string()?;
    std::fs::write(path, rendered)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("affix.toml");
        init(&path, Some("prod"), false).unwrap();

        let config = AffixConfig::from_file(&path).unwrap();
        assert_eq!(config.engine.default_cluster.as_deref(), Some("prod"));
        assert!(init(&path, None, false).is_err());
        init(&path, None, true).unwrap();
        assert_eq!(AffixConfig::from_file(&path).unwrap().engine.default_cluster, None);
    }
}
