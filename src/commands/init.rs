use anyhow::Result;
use colored::*;
use std::fs;

use job_search::{AppConfig, AppPaths};

pub fn run(force: bool) -> Result<()> {
    init_at(&AppPaths::new(), force)
}

/// Create the data directory and config file under `paths`.
/// With `force` the existing config is never read, so a broken one can be replaced.
fn init_at(paths: &AppPaths, force: bool) -> Result<()> {
    println!("{}", "Job Search Workspace".bold());
    println!("{}", "=".repeat(50));
    println!();

    let data_dir = paths.default_db.parent().unwrap_or(&paths.data_dir);
    if data_dir.exists() {
        println!("{} {} exists", "✓".green(), data_dir.display());
    } else {
        fs::create_dir_all(data_dir)?;
        println!("{} Created {}", "✓".green(), data_dir.display());
    }

    if paths.config_file.exists() && !force {
        println!(
            "{} {} exists (use --force to overwrite)",
            "✓".green(),
            paths.config_file.display()
        );
    } else {
        let config = if force {
            AppConfig::default()
        } else {
            AppConfig::load(paths)?
        };
        fs::write(&paths.config_file, config.to_yaml()?)?;
        println!("{} Wrote {}", "✓".green(), paths.config_file.display());
    }

    println!();
    println!("{}", "Next steps".bold());
    println!("  {} jobsearch import <dataset.json | dir>", "→".dimmed());
    println!("  {} jobsearch index", "→".dimmed());
    println!("  {} jobsearch semantic-search \"rust backend\"", "→".dimmed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_paths(name: &str) -> AppPaths {
        let root = std::env::temp_dir().join(format!("jobsearch-init-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        AppPaths::from_root(root)
    }

    #[test]
    fn test_force_replaces_malformed_config() -> Result<()> {
        let paths = scratch_paths("force");
        fs::create_dir_all(&paths.data_dir)?;
        fs::write(&paths.config_file, "default_threshold: [not, a, number]\n")?;
        assert!(AppConfig::load(&paths).is_err());

        init_at(&paths, true)?;
        assert_eq!(AppConfig::load(&paths)?, AppConfig::default());

        fs::remove_dir_all(&paths.root)?;
        Ok(())
    }

    #[test]
    fn test_keeps_existing_config_without_force() -> Result<()> {
        let paths = scratch_paths("keep");
        fs::create_dir_all(&paths.data_dir)?;
        fs::write(&paths.config_file, "default_threshold: 0.5\n")?;

        init_at(&paths, false)?;
        assert_eq!(AppConfig::load(&paths)?.default_threshold, 0.5);

        fs::remove_dir_all(&paths.root)?;
        Ok(())
    }
}
