//! Bundle validator implementation
//!
//! Verifies that a candidate bundle is structurally complete before it is
//! trusted: the weights file and the config file must sit at the bundle
//! root. Archives are often packed with a single wrapping directory, so one
//! level of nesting is searched and flattened up; deeper nesting is rejected.

use std::path::{Path, PathBuf};

use tracing::debug;

use common::artifact::ModelPaths;
use common::error::{Error, RequiredFile, Result};

/// Structural validator for model bundles
#[derive(Debug, Clone)]
pub struct BundleValidator {
    /// Required weights file name
    weights_filename: String,
    /// Required config file name
    config_filename: String,
}

impl BundleValidator {
    /// Creates a validator for the given required file names
    pub fn new(weights_filename: impl Into<String>, config_filename: impl Into<String>) -> Self {
        Self {
            weights_filename: weights_filename.into(),
            config_filename: config_filename.into(),
        }
    }

    /// Returns the required weights file name
    pub fn weights_filename(&self) -> &str {
        &self.weights_filename
    }

    /// Returns the required config file name
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Validates a bundle, flattening one nesting level if needed
    ///
    /// The flattening move happens before the bundle is considered
    /// registered. Returns the resolved paths of the required files.
    pub fn validate(&self, bundle_root: &Path) -> Result<ModelPaths> {
        if !bundle_root.join(&self.weights_filename).is_file() {
            self.flatten_single_subdir(bundle_root)?;
        }

        let weights = bundle_root.join(&self.weights_filename);
        if !weights.is_file() {
            return Err(Error::InvalidArtifact {
                missing: RequiredFile::Weights,
            });
        }

        let config = bundle_root.join(&self.config_filename);
        if !config.is_file() {
            return Err(Error::InvalidArtifact {
                missing: RequiredFile::Config,
            });
        }

        Ok(ModelPaths {
            root: bundle_root.to_path_buf(),
            weights,
            config,
        })
    }

    /// Moves the contents of the single weights-carrying subdirectory up to
    /// the bundle root
    ///
    /// Exactly one first-level subdirectory may carry the weights file; zero
    /// or several leave the bundle untouched, and the presence checks in
    /// [`BundleValidator::validate`] report the missing file.
    fn flatten_single_subdir(&self, bundle_root: &Path) -> Result<()> {
        let mut carriers: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(bundle_root)? {
            let path = entry?.path();
            if path.is_dir() && path.join(&self.weights_filename).is_file() {
                carriers.push(path);
            }
        }

        let [subdir] = carriers.as_slice() else {
            return Ok(());
        };

        debug!(
            bundle = %bundle_root.display(),
            subdir = %subdir.display(),
            "flattening nested bundle directory"
        );

        for entry in std::fs::read_dir(subdir)? {
            let entry = entry?;
            let target = bundle_root.join(entry.file_name());
            std::fs::rename(entry.path(), target)?;
        }
        std::fs::remove_dir(subdir)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: &str = "best_model.pth";
    const CONFIG: &str = "config.json";

    fn validator() -> BundleValidator {
        BundleValidator::new(WEIGHTS, CONFIG)
    }

    fn write_bundle(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(WEIGHTS), b"weights").unwrap();
        std::fs::write(dir.join(CONFIG), b"{}").unwrap();
    }

    #[test]
    fn test_complete_bundle_at_root_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());

        let paths = validator().validate(dir.path()).unwrap();
        assert_eq!(paths.weights, dir.path().join(WEIGHTS));
        assert_eq!(paths.config, dir.path().join(CONFIG));
    }

    #[test]
    fn test_one_level_nested_bundle_is_flattened() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(&dir.path().join("voiceA-export"));

        let paths = validator().validate(dir.path()).unwrap();
        assert!(paths.weights.is_file());
        assert!(paths.config.is_file());
        // Wrapping directory is gone, files now sit at the root
        assert!(!dir.path().join("voiceA-export").exists());
        assert!(dir.path().join(WEIGHTS).is_file());
    }

    #[test]
    fn test_two_levels_nested_bundle_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(&dir.path().join("outer").join("inner"));

        let err = validator().validate(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArtifact {
                missing: RequiredFile::Weights
            }
        ));
    }

    #[test]
    fn test_ambiguous_nesting_is_not_flattened() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(&dir.path().join("export-a"));
        write_bundle(&dir.path().join("export-b"));

        let err = validator().validate(dir.path()).unwrap_err();
        assert!(err.is_invalid_artifact());
        // Neither candidate directory was touched
        assert!(dir.path().join("export-a").join(WEIGHTS).is_file());
        assert!(dir.path().join("export-b").join(WEIGHTS).is_file());
    }

    #[test]
    fn test_missing_weights_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG), b"{}").unwrap();

        let err = validator().validate(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArtifact {
                missing: RequiredFile::Weights
            }
        ));
    }

    #[test]
    fn test_missing_config_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WEIGHTS), b"weights").unwrap();

        let err = validator().validate(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArtifact {
                missing: RequiredFile::Config
            }
        ));
    }

    #[test]
    fn test_nested_config_follows_weights_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("export");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(WEIGHTS), b"weights").unwrap();
        // Config missing even inside the nested directory
        let err = validator().validate(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArtifact {
                missing: RequiredFile::Config
            }
        ));
    }
}
