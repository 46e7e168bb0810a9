use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::geometry::GeometryDocument;

/// Writes geometry documents to disk.
///
/// The document is written to a temporary file next to the destination and
/// renamed over it once complete, so a failed write leaves no partial file.
#[derive(Default)]
pub struct GeometryWriter {}

impl GeometryWriter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn write(&self, document: &GeometryDocument, output_path: &Path) -> Result<()> {
        let output_error = |source: std::io::Error| Error::Output {
            path: output_path.to_path_buf(),
            source,
        };

        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(output_error)?;
        file.write_all(&document.to_bytes()).map_err(output_error)?;
        file.flush().map_err(output_error)?;
        file.persist(output_path)
            .map_err(|e| output_error(e.error))?;

        tracing::info!(
            "Written geometry file: {:?} ({} lines)",
            output_path,
            document.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_geometry() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.g99");

        let document = GeometryDocument::from_text("Geom Title=Test\r\n#Mann= 3 ,0,0\n");
        let writer = GeometryWriter::new();

        writer.write(&document, &output_path).unwrap();

        assert!(output_path.exists());
        assert_eq!(
            fs::read(&output_path).unwrap(),
            b"Geom Title=Test\r\n#Mann= 3 ,0,0\n".to_vec()
        );
        // only the output remains, no temporary files
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("test.g99");
        fs::write(&output_path, "old contents that are longer").unwrap();

        let document = GeometryDocument::from_text("new\n");
        GeometryWriter::new().write(&document, &output_path).unwrap();

        assert_eq!(fs::read_to_string(&output_path).unwrap(), "new\n");
    }

    #[test]
    fn test_missing_directory_is_output_error() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("missing").join("test.g99");

        let document = GeometryDocument::from_text("x\n");
        let err = GeometryWriter::new()
            .write(&document, &output_path)
            .unwrap_err();

        assert!(matches!(err, Error::Output { .. }));
        assert!(!output_path.exists());
    }
}
