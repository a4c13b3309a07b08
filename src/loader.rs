//! Loading template source from disk.
//!
//! The include directive never touches the filesystem directly: it reads
//! through a [`SourceLoader`] injected at registration time. [`FsLoader`] is the
//! default; any `Fn(&Path, &ReadOptions) -> Result<Vec<u8>>` closure is a loader
//! too, so alternate sources (in-memory fixtures, preprocessing, archives)
//! compose without wrapping types.
//!
//! Bytes are decoded separately with [`ReadOptions::decode`] so every loader
//! shares the same encoding rules.

use std::path::Path;

use crate::constants::BOM_PREFIX;
use crate::core::{PartialsError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Options passed through to the loader and used to decode what it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Encoding name; `None` means strict UTF-8. A `bom|` prefix strips a
    /// leading byte order mark.
    pub encoding: Option<String>,
    /// Reject files larger than this many bytes.
    pub max_size: Option<u64>,
}

impl ReadOptions {
    /// Decodes loaded bytes into template text.
    ///
    /// # Errors
    ///
    /// [`PartialsError::Encoding`] for an unsupported encoding name or bytes that
    /// are not valid UTF-8.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String> {
        let (strip_bom, name) = match self.encoding.as_deref() {
            None => (false, "utf-8"),
            Some(encoding) => match encoding.strip_prefix(BOM_PREFIX) {
                Some(rest) => (true, rest),
                None => (false, encoding),
            },
        };

        if !matches!(name.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
            return Err(PartialsError::Encoding {
                message: format!("Unsupported encoding '{name}'. Only UTF-8 is supported"),
            });
        }

        let mut bytes = bytes;
        if strip_bom && bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }

        String::from_utf8(bytes).map_err(|e| PartialsError::Encoding {
            message: format!(
                "Invalid UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e.utf8_error()
            ),
        })
    }
}

/// Strategy for reading the raw bytes of a template file.
pub trait SourceLoader: Send + Sync {
    /// Reads `path`.
    ///
    /// A missing file must be reported as [`PartialsError::NotFound`].
    fn read(&self, path: &Path, options: &ReadOptions) -> Result<Vec<u8>>;
}

impl<F> SourceLoader for F
where
    F: Fn(&Path, &ReadOptions) -> Result<Vec<u8>> + Send + Sync,
{
    fn read(&self, path: &Path, options: &ReadOptions) -> Result<Vec<u8>> {
        self(path, options)
    }
}

/// Reads files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read(&self, path: &Path, options: &ReadOptions) -> Result<Vec<u8>> {
        let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;

        if let Some(max_bytes) = options.max_size {
            let size = metadata.len();
            if size > max_bytes {
                return Err(PartialsError::Argument {
                    message: format!(
                        "File '{}' is too large ({size} bytes). Maximum allowed size: {max_bytes} bytes",
                        file_name(path)
                    ),
                });
            }
        }

        std::fs::read(path).map_err(|e| io_error(path, e))
    }
}

fn io_error(path: &Path, error: std::io::Error) -> PartialsError {
    if error.kind() == std::io::ErrorKind::NotFound {
        PartialsError::NotFound {
            message: format!("File '{}' not found", file_name(path)),
        }
    } else {
        PartialsError::Io {
            operation: format!("read '{}'", file_name(path)),
            source: error,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
