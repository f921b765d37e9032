//! C++ compiler lookup for build descriptors
//!
//! Generated wrappers are compiled by an external build tool; the build
//! descriptor records which compiler it expects so the tool does not have to
//! guess.

use std::path::{Path, PathBuf};
use which::which;

/// Candidate compiler names searched on PATH, in order
#[cfg(not(windows))]
pub const COMPILER_CANDIDATES: &[&str] = &["c++", "g++", "clang++"];
#[cfg(windows)]
pub const COMPILER_CANDIDATES: &[&str] = &["cl.exe", "g++.exe", "clang++.exe"];

/// Resolve the C++ compiler to record in build descriptors
///
/// An explicitly configured compiler wins. A bare name is looked up on PATH;
/// a path is returned as-is when it points at a file. Without configuration
/// the first candidate found on PATH is used.
pub fn resolve_compiler(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(configured) = configured {
        let as_path = Path::new(configured);
        if as_path.components().count() > 1 {
            return as_path.is_file().then(|| as_path.to_path_buf());
        }
        return which(configured).ok();
    }

    COMPILER_CANDIDATES
        .iter()
        .find_map(|candidate| which(candidate).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_is_returned_when_present() {
        let Ok(temp_dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let fake = temp_dir.path().join("bin").join("my-c++");
        if fs::create_dir_all(temp_dir.path().join("bin")).is_err() || fs::write(&fake, "").is_err()
        {
            return;
        }
        let resolved = resolve_compiler(fake.to_str());
        assert_eq!(resolved, Some(fake));
    }

    #[test]
    fn test_missing_explicit_path_resolves_to_none() {
        let resolved = resolve_compiler(Some("/tmp/pixgen_no_such_dir_987/c++"));
        assert!(resolved.is_none());
    }
}
