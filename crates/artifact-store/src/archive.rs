//! Bundle archive unpacking
//!
//! Candidate bundles may arrive as gzip-compressed tarballs. Unpacking is
//! blocking work; callers run it through `spawn_blocking`.

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use common::error::Result;

/// Returns true if the path looks like a gzip-compressed tarball
pub fn is_tar_gz(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Unpacks a `.tar.gz` archive into the destination directory
///
/// Entry paths are sanitized by the tar reader; entries escaping the
/// destination are rejected by `unpack`.
pub fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!(
        archive = %archive_path.display(),
        dest = %dest.display(),
        "unpacking bundle archive"
    );

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(dest)?;
    Ok(())
}
