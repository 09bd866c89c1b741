//! Pre-run validation of the database and output directories.

use std::fs;
use std::path::Path;

use crate::errors::{AbfreqError, Result};

/// Validate that the shard database directory exists and is a directory.
///
/// # Errors
/// Returns [`AbfreqError::InvalidDatabase`] otherwise.
pub fn validate_database_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AbfreqError::InvalidDatabase {
            path: path.display().to_string(),
            reason: "directory does not exist".to_string(),
        });
    }
    if !path.is_dir() {
        return Err(AbfreqError::InvalidDatabase {
            path: path.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// Create the output directory, or fail before the scan starts when it
/// already exists and overwriting is disabled.
///
/// # Errors
/// Returns [`AbfreqError::OutputDir`] when the directory exists with
/// `overwrite` disabled, or when it cannot be created.
pub fn prepare_output_dir(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() {
        if !overwrite {
            return Err(AbfreqError::OutputDir {
                path: path.display().to_string(),
                reason: "already exists and overwrite is disabled".to_string(),
            });
        }
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| AbfreqError::OutputDir {
        path: path.display().to_string(),
        reason: format!("cannot create: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_database_dir_exists() {
        let dir = TempDir::new().unwrap();
        assert!(validate_database_dir(dir.path()).is_ok());
    }

    #[test]
    fn test_validate_database_dir_missing() {
        let err = validate_database_dir(Path::new("/nonexistent/db")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_database_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.csv.gz");
        fs::write(&file, b"data").unwrap();

        let err = validate_database_dir(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_prepare_output_dir_creates_missing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");

        prepare_output_dir(&output, false).unwrap();
        assert!(output.is_dir());
    }

    #[test]
    fn test_prepare_output_dir_creates_missing_with_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");

        prepare_output_dir(&output, true).unwrap();
        assert!(output.is_dir());
    }

    #[test]
    fn test_prepare_output_dir_existing_without_overwrite_fails() {
        let dir = TempDir::new().unwrap();
        let err = prepare_output_dir(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("overwrite is disabled"));
    }

    #[test]
    fn test_prepare_output_dir_existing_with_overwrite_passes() {
        let dir = TempDir::new().unwrap();
        assert!(prepare_output_dir(dir.path(), true).is_ok());
    }
}
