use std::env;
use std::path::{Path, PathBuf};

use crate::error::FacilityError;

/// Process-wide view of the file system used to resolve debugger paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystem {
    working_dir: PathBuf,
}

impl FileSystem {
    pub(crate) const NAME: &'static str = "file system";

    /// Brings the file system up rooted at `working_dir`, or at the current
    /// directory of the process when no override is given.
    pub(crate) fn activate(working_dir: Option<&Path>) -> Result<Self, FacilityError> {
        let requested = match working_dir {
            Some(path) => path.to_path_buf(),
            None => env::current_dir().map_err(|source| FacilityError::WorkingDirectory {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let working_dir = requested
            .canonicalize()
            .map_err(|source| FacilityError::WorkingDirectory {
                path: requested.clone(),
                source,
            })?;
        if !working_dir.is_dir() {
            return Err(FacilityError::NotADirectory(working_dir));
        }

        Ok(Self { working_dir })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolves `path` against the working directory. Absolute paths are
    /// returned unchanged.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_relative_paths_against_working_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.out"), b"").expect("write fixture");

        let file_system = FileSystem::activate(Some(dir.path())).expect("activate");
        let root = dir.path().canonicalize().expect("canonical tempdir");

        assert_eq!(file_system.working_dir(), root.as_path());
        assert_eq!(file_system.resolve("a.out"), root.join("a.out"));
        assert_eq!(file_system.resolve("/bin/sh"), PathBuf::from("/bin/sh"));
        assert!(file_system.resolve("a.out").exists());
        assert!(!file_system.resolve("core.dump").exists());
    }

    #[test]
    fn rejects_missing_working_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");

        let err = FileSystem::activate(Some(&missing)).expect_err("missing dir should fail");
        assert!(matches!(err, FacilityError::WorkingDirectory { path, .. } if path == missing));
    }

    #[test]
    fn rejects_regular_file_as_working_dir() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");

        let err = FileSystem::activate(Some(file.path())).expect_err("file should fail");
        assert!(matches!(err, FacilityError::NotADirectory(_)));
    }

    #[test]
    fn defaults_to_current_directory() {
        let file_system = FileSystem::activate(None).expect("current dir is usable");
        assert!(file_system.working_dir().is_absolute());
    }
}
