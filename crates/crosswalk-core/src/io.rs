//! Filesystem adapters around the pure mappers.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::document::{parse, SourceFormat, Value};
use crate::errors::{ConvertError, ConvertResult};
use crate::policy::PolicyFile;

/// Read and parse a document; the format follows the file extension.
pub fn read_document(path: &Path) -> ConvertResult<Value> {
    let bytes = std::fs::read(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let format = SourceFormat::from_path(path);
    tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "read document");
    Ok(parse(&bytes, format)?)
}

/// Read an optional document.
pub fn read_optional(path: Option<&Path>) -> ConvertResult<Option<Value>> {
    path.map(read_document).transpose()
}

/// Destination of a rendered buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Output::File(path),
            None => Output::Stdout,
        }
    }

    /// Write the whole buffer at once; nothing is touched before rendering
    /// has succeeded.
    pub fn write_all(&self, bytes: &[u8]) -> ConvertResult<()> {
        match self {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(bytes)
                    .and_then(|()| stdout.flush())
                    .map_err(|source| ConvertError::Write {
                        path: PathBuf::from("<stdout>"),
                        source,
                    })
            }
            Output::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| ConvertError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(path, bytes).map_err(|source| ConvertError::Write {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
                Ok(())
            }
        }
    }
}

/// Create `dir` and write every policy file into it.
pub fn write_policy_files(dir: &Path, files: &[PolicyFile]) -> ConvertResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| ConvertError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.file_name);
        std::fs::write(&path, &file.contents).map_err(|source| ConvertError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), files = written.len(), "wrote policy files");
    Ok(written)
}
