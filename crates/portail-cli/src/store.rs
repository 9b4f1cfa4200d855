//! Store location resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// The store directory: the `--store` flag or `PORTAIL_STORE` when given,
/// otherwise `portail/store` under the platform data directory.
pub fn resolve(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }

    let dirs =
        ProjectDirs::from("", "", "portail").context("Could not determine data directory")?;

    Ok(dirs.data_dir().join("store"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/tmp/portail-test");
        assert_eq!(resolve(Some(path.clone())).unwrap(), path);
    }
}
