//! Cache command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use vigil_core::{FeatureCache, FrameGeometry};

/// Show where the cache lives and what it holds.
pub fn info(path: &Path, list: bool, quiet: bool) -> Result<()> {
    if !path.exists() {
        if quiet {
            println!("0");
        } else {
            println!("{} {}", "No cache file at".dimmed(), path.display());
        }
        return Ok(());
    }

    let cache = FeatureCache::new(path, FrameGeometry::default());
    let entries = cache.load();

    if quiet {
        println!("{}", entries);
    } else {
        println!("   {} {}", "Cache:".dimmed(), path.display());
        println!("   {} {}", "Entries:".dimmed(), entries);
    }

    if list {
        for identity in cache.identities() {
            println!("{}", identity);
        }
    }

    Ok(())
}

/// Delete the cache file.
pub fn clear(path: &Path, quiet: bool) -> Result<()> {
    if !path.exists() {
        if !quiet {
            println!("{} {}", "Nothing to clear at".dimmed(), path.display());
        }
        return Ok(());
    }

    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove cache file: {}", path.display()))?;

    if !quiet {
        println!("{} {}", "Removed".green(), path.display());
    }
    Ok(())
}
