//! Artifact store implementation
//!
//! Filesystem-backed storage of model bundles under two physical areas: one
//! active slot and any number of inactive candidates, keyed by name. The
//! active area also hosts a hidden staging location used during promotion;
//! directory scans skip it.
//!
//! All mutating operations are serialized by the lifecycle manager; the
//! in-memory index only has to stay consistent with the directories this
//! store itself touches.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use common::artifact::{Artifact, ArtifactStatus};
use common::error::{Error, Result};
use common::utils::format_bytes;

use crate::archive;

/// Prefix of the staging directory inside the active area
const STAGE_PREFIX: &str = ".stage-";

/// Where a candidate bundle comes from
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// A directory copied recursively
    Directory(PathBuf),
    /// A `.tar.gz` archive unpacked in place
    Archive(PathBuf),
}

impl BundleSource {
    /// Classifies a path as a directory or archive source
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Ok(BundleSource::Directory(path.to_path_buf()))
        } else if path.is_file() && archive::is_tar_gz(path) {
            Ok(BundleSource::Archive(path.to_path_buf()))
        } else {
            Err(Error::InvalidArgument(format!(
                "bundle source is neither a directory nor a .tar.gz archive: {}",
                path.display()
            )))
        }
    }
}

/// Filesystem-backed store of model artifact bundles
pub struct ArtifactStore {
    /// Active slot directory (`<base>/active`)
    active_dir: PathBuf,
    /// Candidate area (`<base>/inactive`)
    inactive_dir: PathBuf,
    /// Weights file name, used for digests
    weights_filename: String,
    /// In-memory index of the inactive roster
    index: DashMap<String, Artifact>,
}

impl ArtifactStore {
    /// Creates a store rooted at `base`, scanning any existing candidates
    pub fn new(base: &Path, weights_filename: impl Into<String>) -> Result<Self> {
        let active_dir = base.join("active");
        let inactive_dir = base.join("inactive");
        std::fs::create_dir_all(&active_dir)?;
        std::fs::create_dir_all(&inactive_dir)?;

        let store = Self {
            active_dir,
            inactive_dir,
            weights_filename: weights_filename.into(),
            index: DashMap::new(),
        };
        store.rescan()?;

        info!(
            base = %base.display(),
            candidates = store.index.len(),
            "artifact store initialized"
        );
        Ok(store)
    }

    /// Rebuilds the inactive index from the filesystem
    fn rescan(&self) -> Result<()> {
        self.index.clear();
        for (name, path) in scan_slot_dirs(&self.inactive_dir)? {
            match describe_dir(&path, &name, ArtifactStatus::Inactive, None) {
                Ok(artifact) => {
                    self.index.insert(name, artifact);
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "skipping unreadable candidate directory");
                }
            }
        }
        Ok(())
    }

    /// Returns true if a candidate directory exists under this name
    pub fn has_inactive(&self, name: &str) -> bool {
        self.inactive_dir.join(name).is_dir()
    }

    /// Returns the directory a candidate of this name occupies
    pub fn inactive_path(&self, name: &str) -> PathBuf {
        self.inactive_dir.join(name)
    }

    /// Lists all inactive candidates, ordered by name
    pub fn list_inactive(&self) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> =
            self.index.iter().map(|entry| entry.value().clone()).collect();
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        artifacts
    }

    /// Returns the artifact in the active slot, if any
    ///
    /// More than one artifact in the active slot means the store was
    /// manipulated behind our back; it is reported as an error rather than
    /// resolved by picking one.
    pub async fn get_active(&self) -> Result<Option<Artifact>> {
        let active_dir = self.active_dir.clone();
        run_blocking(move || {
            let mut dirs = scan_slot_dirs(&active_dir)?;
            match dirs.len() {
                0 => Ok(None),
                1 => {
                    let (name, path) = dirs.remove(0);
                    describe_dir(&path, &name, ArtifactStatus::Active, None).map(Some)
                }
                n => Err(Error::Internal(format!(
                    "active slot holds {} artifacts, expected at most one",
                    n
                ))),
            }
        })
        .await
    }

    /// Copies or unpacks a bundle into the inactive area under `name`
    ///
    /// Fails with `DuplicateName` if the name already exists and `replace`
    /// is false. A failed copy or unpack removes the partially written
    /// target directory before the error is surfaced.
    pub async fn put_inactive(
        &self,
        name: &str,
        source: &BundleSource,
        replace: bool,
    ) -> Result<PathBuf> {
        let target = self.inactive_dir.join(name);
        if target.exists() && !replace {
            return Err(Error::DuplicateName(name.to_string()));
        }
        if replace {
            self.index.remove(name);
        }

        let source = source.clone();
        let result_target = target.clone();
        run_blocking(move || {
            if target.exists() {
                std::fs::remove_dir_all(&target)?;
            }
            let copied = match &source {
                BundleSource::Directory(src) => {
                    if !src.is_dir() {
                        Err(Error::Io(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("bundle directory not found: {}", src.display()),
                        )))
                    } else {
                        copy_dir_recursive(src, &target).map_err(Error::from)
                    }
                }
                BundleSource::Archive(src) => {
                    std::fs::create_dir_all(&target)?;
                    archive::unpack_tar_gz(src, &target)
                }
            };
            if let Err(e) = copied {
                let _ = std::fs::remove_dir_all(&target);
                return Err(e);
            }
            Ok(())
        })
        .await?;

        debug!(name = %name, "bundle copied into inactive area");
        Ok(result_target)
    }

    /// Describes a validated candidate, digests its weights, and indexes it
    pub async fn finalize_inactive(&self, name: &str) -> Result<Artifact> {
        let path = self.inactive_dir.join(name);
        let owned_name = name.to_string();
        let weights_filename = self.weights_filename.clone();

        let artifact = run_blocking(move || {
            describe_dir(
                &path,
                &owned_name,
                ArtifactStatus::Inactive,
                Some(&weights_filename),
            )
        })
        .await?;

        info!(
            name = %name,
            size = %format_bytes(artifact.size_bytes),
            "model registered"
        );
        self.index.insert(name.to_string(), artifact.clone());
        Ok(artifact)
    }

    /// Removes a candidate directory without requiring it to exist
    ///
    /// Used to clean up after a failed registration.
    pub async fn discard_inactive(&self, name: &str) -> Result<()> {
        self.index.remove(name);
        let path = self.inactive_dir.join(name);
        run_blocking(move || {
            if path.exists() {
                std::fs::remove_dir_all(&path)?;
            }
            Ok(())
        })
        .await
    }

    /// Deletes an inactive candidate; fails with `NotFound` if absent
    pub async fn delete_inactive(&self, name: &str) -> Result<()> {
        let path = self.inactive_dir.join(name);
        if !path.is_dir() {
            return Err(Error::NotFound(name.to_string()));
        }
        run_blocking(move || std::fs::remove_dir_all(&path).map_err(Error::from)).await?;
        self.index.remove(name);
        info!(name = %name, "candidate deleted");
        Ok(())
    }

    /// Copies the candidate `name` fully into the staging location inside
    /// the active area
    ///
    /// The previous active artifact is untouched until [`ArtifactStore::commit_active`].
    pub async fn stage_active(&self, name: &str) -> Result<PathBuf> {
        let source = self.inactive_dir.join(name);
        if !source.is_dir() {
            return Err(Error::NotFound(name.to_string()));
        }
        let stage = self.stage_path(name);

        let result_stage = stage.clone();
        run_blocking(move || {
            if stage.exists() {
                std::fs::remove_dir_all(&stage)?;
            }
            if let Err(e) = copy_dir_recursive(&source, &stage) {
                let _ = std::fs::remove_dir_all(&stage);
                return Err(e.into());
            }
            Ok(())
        })
        .await?;

        debug!(name = %name, "candidate staged into active area");
        Ok(result_stage)
    }

    /// Retires the previous active artifact and renames the staged bundle
    /// into the canonical active slot
    pub async fn commit_active(&self, name: &str) -> Result<Artifact> {
        let stage = self.stage_path(name);
        let active_dir = self.active_dir.clone();
        let target = self.active_dir.join(name);
        let owned_name = name.to_string();

        run_blocking(move || {
            if !stage.is_dir() {
                return Err(Error::Internal(format!(
                    "no staged bundle for {}",
                    owned_name
                )));
            }
            for (_, old) in scan_slot_dirs(&active_dir)? {
                std::fs::remove_dir_all(&old)?;
            }
            std::fs::rename(&stage, &target)?;
            describe_dir(&target, &owned_name, ArtifactStatus::Active, None)
        })
        .await
    }

    /// Removes the staging directory for `name`, if present
    pub async fn abort_stage(&self, name: &str) -> Result<()> {
        let stage = self.stage_path(name);
        run_blocking(move || {
            if stage.exists() {
                std::fs::remove_dir_all(&stage)?;
            }
            Ok(())
        })
        .await
    }

    /// Moves the candidate `name` into the active slot, replacing whatever
    /// was there
    ///
    /// Staged fully before the old artifact is removed, so a failure partway
    /// cannot leave the active slot empty if it previously held an artifact.
    pub async fn promote(&self, name: &str) -> Result<Artifact> {
        self.stage_active(name).await?;
        match self.commit_active(name).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                let _ = self.abort_stage(name).await;
                Err(e)
            }
        }
    }

    /// Removes the active artifact and any stale staging leftovers; idempotent
    pub async fn clear_active(&self) -> Result<()> {
        let active_dir = self.active_dir.clone();
        run_blocking(move || {
            for entry in std::fs::read_dir(&active_dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    std::fs::remove_dir_all(&path)?;
                }
            }
            Ok(())
        })
        .await
    }

    fn stage_path(&self, name: &str) -> PathBuf {
        self.active_dir.join(format!("{}{}", STAGE_PREFIX, name))
    }
}

/// Runs blocking filesystem work off the async path
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))?
}

/// Lists the non-hidden subdirectories of a slot directory
fn scan_slot_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        dirs.push((name.to_string(), path));
    }
    Ok(dirs)
}

/// Builds an [`Artifact`] from a bundle directory
fn describe_dir(
    path: &Path,
    name: &str,
    status: ArtifactStatus,
    digest_weights: Option<&str>,
) -> Result<Artifact> {
    let metadata = std::fs::metadata(path)?;
    let registered_at: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    let weights_sha256 = match digest_weights {
        Some(weights_filename) => {
            let weights = path.join(weights_filename);
            if weights.is_file() {
                Some(sha256_file(&weights)?)
            } else {
                None
            }
        }
        None => None,
    };

    Ok(Artifact {
        name: name.to_string(),
        status,
        path: path.to_path_buf(),
        registered_at,
        size_bytes: dir_size(path)?,
        weights_sha256,
    })
}

/// Recursively sums the file sizes under a directory
fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}

/// Computes the hex SHA-256 digest of a file
fn sha256_file(path: &Path) -> Result<String> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Copies a directory tree
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: &str = "best_model.pth";

    fn store_in(base: &Path) -> ArtifactStore {
        ArtifactStore::new(base, WEIGHTS).unwrap()
    }

    fn source_bundle(dir: &Path, weights: &[u8]) -> BundleSource {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(WEIGHTS), weights).unwrap();
        std::fs::write(dir.join("config.json"), b"{}").unwrap();
        BundleSource::Directory(dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_put_and_finalize_candidate() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let source = source_bundle(&base.path().join("upload"), b"weights-a");

        store.put_inactive("voiceA", &source, false).await.unwrap();
        let artifact = store.finalize_inactive("voiceA").await.unwrap();

        assert_eq!(artifact.name, "voiceA");
        assert_eq!(artifact.status, ArtifactStatus::Inactive);
        assert!(artifact.weights_sha256.is_some());
        assert!(artifact.size_bytes > 0);
        assert!(store.has_inactive("voiceA"));
        assert_eq!(store.list_inactive().len(), 1);
    }

    #[tokio::test]
    async fn test_put_duplicate_name_rejected_without_replace() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let source = source_bundle(&base.path().join("upload"), b"weights-a");

        store.put_inactive("voiceA", &source, false).await.unwrap();
        let err = store.put_inactive("voiceA", &source, false).await.unwrap_err();
        assert!(err.is_duplicate_name());
    }

    #[tokio::test]
    async fn test_put_with_replace_is_a_full_replacement() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());

        let first = source_bundle(&base.path().join("upload-a"), b"weights-a");
        store.put_inactive("voiceA", &first, false).await.unwrap();
        std::fs::write(
            base.path().join("inactive").join("voiceA").join("stale.txt"),
            b"old",
        )
        .unwrap();

        let second = source_bundle(&base.path().join("upload-b"), b"weights-b");
        store.put_inactive("voiceA", &second, true).await.unwrap();

        let dir = base.path().join("inactive").join("voiceA");
        assert_eq!(std::fs::read(dir.join(WEIGHTS)).unwrap(), b"weights-b");
        // Nothing from the first registration survives
        assert!(!dir.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_put_rolls_back_partial_target() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let missing = BundleSource::Directory(base.path().join("does-not-exist"));

        let err = store.put_inactive("voiceA", &missing, false).await.unwrap_err();
        assert!(err.is_io());
        assert!(!base.path().join("inactive").join("voiceA").exists());
    }

    #[tokio::test]
    async fn test_promote_moves_candidate_into_active_slot() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let source = source_bundle(&base.path().join("upload"), b"weights-a");
        store.put_inactive("voiceA", &source, false).await.unwrap();

        let active = store.promote("voiceA").await.unwrap();
        assert_eq!(active.name, "voiceA");
        assert_eq!(active.status, ArtifactStatus::Active);

        let found = store.get_active().await.unwrap().unwrap();
        assert_eq!(found.name, "voiceA");
        // No staging leftovers
        assert!(!base.path().join("active").join(".stage-voiceA").exists());
    }

    #[tokio::test]
    async fn test_promote_replaces_previous_active() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
        let b = source_bundle(&base.path().join("upload-b"), b"weights-b");
        store.put_inactive("voiceA", &a, false).await.unwrap();
        store.put_inactive("voiceB", &b, false).await.unwrap();

        store.promote("voiceA").await.unwrap();
        store.promote("voiceB").await.unwrap();

        let active = store.get_active().await.unwrap().unwrap();
        assert_eq!(active.name, "voiceB");
        assert!(!base.path().join("active").join("voiceA").exists());
    }

    #[tokio::test]
    async fn test_abort_stage_preserves_previous_active() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
        let b = source_bundle(&base.path().join("upload-b"), b"weights-b");
        store.put_inactive("voiceA", &a, false).await.unwrap();
        store.put_inactive("voiceB", &b, false).await.unwrap();
        store.promote("voiceA").await.unwrap();

        store.stage_active("voiceB").await.unwrap();
        store.abort_stage("voiceB").await.unwrap();

        let active = store.get_active().await.unwrap().unwrap();
        assert_eq!(active.name, "voiceA");
        assert!(!base.path().join("active").join(".stage-voiceB").exists());
    }

    #[tokio::test]
    async fn test_get_active_skips_staging_directories() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
        store.put_inactive("voiceA", &a, false).await.unwrap();
        store.promote("voiceA").await.unwrap();

        // A stale staging directory must not be mistaken for a second artifact
        std::fs::create_dir_all(base.path().join("active").join(".stage-voiceB")).unwrap();
        let active = store.get_active().await.unwrap().unwrap();
        assert_eq!(active.name, "voiceA");
    }

    #[tokio::test]
    async fn test_multiple_active_artifacts_is_an_error() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        std::fs::create_dir_all(base.path().join("active").join("voiceA")).unwrap();
        std::fs::create_dir_all(base.path().join("active").join("voiceB")).unwrap();

        let err = store.get_active().await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_clear_active_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
        store.put_inactive("voiceA", &a, false).await.unwrap();
        store.promote("voiceA").await.unwrap();

        store.clear_active().await.unwrap();
        assert!(store.get_active().await.unwrap().is_none());
        store.clear_active().await.unwrap();
        assert!(store.get_active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_inactive_not_found() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let err = store.delete_inactive("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_inactive_removes_candidate() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());
        let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
        store.put_inactive("voiceA", &a, false).await.unwrap();
        store.finalize_inactive("voiceA").await.unwrap();

        store.delete_inactive("voiceA").await.unwrap();
        assert!(!store.has_inactive("voiceA"));
        assert!(store.list_inactive().is_empty());
    }

    #[tokio::test]
    async fn test_rescan_picks_up_existing_candidates() {
        let base = tempfile::tempdir().unwrap();
        {
            let store = store_in(base.path());
            let a = source_bundle(&base.path().join("upload-a"), b"weights-a");
            store.put_inactive("voiceA", &a, false).await.unwrap();
            store.finalize_inactive("voiceA").await.unwrap();
        }

        // A fresh store over the same tree sees the candidate again
        let reopened = store_in(base.path());
        let listed = reopened.list_inactive();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "voiceA");
    }

    #[tokio::test]
    async fn test_put_from_archive_source() {
        let base = tempfile::tempdir().unwrap();
        let store = store_in(base.path());

        // Pack a bundle and register from the archive
        let payload = base.path().join("payload");
        source_bundle(&payload, b"weights-a");
        let archive_path = base.path().join("voiceA.tar.gz");
        let file = std::fs::File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(".", &payload).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let source = BundleSource::from_path(&archive_path).unwrap();
        assert!(matches!(source, BundleSource::Archive(_)));

        store.put_inactive("voiceA", &source, false).await.unwrap();
        assert!(base
            .path()
            .join("inactive")
            .join("voiceA")
            .join(WEIGHTS)
            .is_file());
    }

    #[test]
    fn test_bundle_source_from_path_rejects_other_files() {
        let base = tempfile::tempdir().unwrap();
        let plain = base.path().join("model.zip");
        std::fs::write(&plain, b"zip").unwrap();
        assert!(BundleSource::from_path(&plain).is_err());
        assert!(BundleSource::from_path(&base.path().join("missing")).is_err());
    }
}
