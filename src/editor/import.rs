use std::fs;
use std::path::Path;

use super::{EditError, StyleEdit};

/// Turns raw bytes into calls against the editor's text API.
pub trait Import {
    /// Reads the whole file before touching the editor, so a failed read
    /// leaves the document as it was.
    fn load(&self, path: &Path, editor: &mut StyleEdit) -> Result<(), EditError> {
        let buf = fs::read(path).map_err(|source| EditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = buf.len(), "loaded file");
        self.parse(&buf, editor)
    }

    fn parse(&self, buf: &[u8], editor: &mut StyleEdit) -> Result<(), EditError>;
}

/// Inserts the bytes verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextImport;

impl Import for PlainTextImport {
    fn parse(&self, buf: &[u8], editor: &mut StyleEdit) -> Result<(), EditError> {
        editor.set_text(buf)
    }
}
