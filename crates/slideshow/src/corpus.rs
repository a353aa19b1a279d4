use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("no photos (jpg/jpeg/png) found in {0}")]
    Empty(PathBuf),
    #[error("failed to scan photo directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The set of photos the slideshow cycles through, in stable
/// (file-name sorted) order. Never empty.
#[derive(Debug, Clone)]
pub struct PhotoSet {
    paths: Vec<PathBuf>,
}

impl PhotoSet {
    /// Scans `dir` (non-recursively) for supported photo files.
    pub fn discover(dir: &Path) -> Result<Self, CorpusError> {
        let entries = fs::read_dir(dir).map_err(|source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CorpusError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
                continue;
            };
            if PHOTO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
            {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(CorpusError::Empty(dir.to_path_buf()));
        }
        paths.sort();
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty sets; kept for API completeness.
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> &Path {
        &self.paths[index % self.paths.len()]
    }

    /// File name of the photo at `index`, for captions and logs.
    pub fn name(&self, index: usize) -> String {
        self.path(index)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn forward(&self, index: usize) -> usize {
        (index + 1) % self.paths.len()
    }

    pub fn backward(&self, index: usize) -> usize {
        (index + self.paths.len() - 1) % self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).expect("create test file");
    }

    #[test]
    fn discovers_supported_extensions_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "b.JPG");
        touch(dir.path(), "a.png");
        touch(dir.path(), "c.jpeg");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "noext");

        let photos = PhotoSet::discover(dir.path()).expect("non-empty corpus");
        assert_eq!(photos.len(), 3);
        assert_eq!(photos.name(0), "a.png");
        assert_eq!(photos.name(1), "b.JPG");
        assert_eq!(photos.name(2), "c.jpeg");
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "readme.md");
        let err = PhotoSet::discover(dir.path()).unwrap_err();
        assert!(matches!(err, CorpusError::Empty(_)));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = PhotoSet::discover(Path::new("/nonexistent/photo/dir")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }

    #[test]
    fn stepping_wraps_both_ways() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");
        touch(dir.path(), "c.png");
        let photos = PhotoSet::discover(dir.path()).expect("corpus");

        assert_eq!(photos.forward(2), 0);
        assert_eq!(photos.backward(0), 2);
        assert_eq!(photos.forward(0), 1);
        assert_eq!(photos.backward(1), 0);
    }

    #[test]
    fn single_photo_steps_to_itself() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "only.jpg");
        let photos = PhotoSet::discover(dir.path()).expect("corpus");
        assert_eq!(photos.forward(0), 0);
        assert_eq!(photos.backward(0), 0);
    }
}
