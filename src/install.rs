//! Install directory correction for extracted dependency archives.
//!
//! Archives often unpack into a directory named after a release tag or a
//! repository (`ext-1.2.0/`, `Ext-main/`) instead of the identifier other
//! units require. The host's installer calls [`corrected_destination`] after
//! extraction and moves the directory itself when a path comes back.

use std::path::{Path, PathBuf};

/// Where an extracted dependency should live, when it is not there already.
///
/// `from` is the directory the archive was extracted to, `local_destination`
/// the plugins directory and `identifier` the dependency being installed.
/// Returns `local_destination/identifier` unless it already equals `from`,
/// compared case-insensitively and ignoring trailing separators.
pub fn corrected_destination(from: &Path, local_destination: &Path, identifier: &str) -> Option<PathBuf> {
    // Identifiers that are not a single path segment cannot name a directory.
    if identifier.is_empty() || identifier.contains(['/', '\\', '|']) || identifier == "." || identifier == ".." {
        return None;
    }

    let target = local_destination.join(identifier);
    if normalized(from) == normalized(&target) {
        None
    } else {
        Some(target)
    }
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().trim_end_matches(['/', '\\']).to_lowercase()
}
