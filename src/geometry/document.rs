use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Line terminator of one document line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline.
    None,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }
}

/// How the document bytes were decoded, so they can be written back the
/// same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Each byte maps to the code point of the same value.
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    pub text: String,
    pub ending: LineEnding,
}

impl DocumentLine {
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            text: text.into(),
            ending,
        }
    }
}

/// A geometry file held in memory as an ordered list of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryDocument {
    pub lines: Vec<DocumentLine>,
    pub encoding: TextEncoding,
}

impl GeometryDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| Error::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text, TextEncoding::Utf8),
            Err(_) => {
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                Self::parse(&text, TextEncoding::Latin1)
            }
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::parse(text, TextEncoding::Utf8)
    }

    fn parse(text: &str, encoding: TextEncoding) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(body) = raw.strip_suffix("\r\n") {
                    DocumentLine::new(body, LineEnding::CrLf)
                } else if let Some(body) = raw.strip_suffix('\n') {
                    DocumentLine::new(body, LineEnding::Lf)
                } else {
                    DocumentLine::new(raw, LineEnding::None)
                }
            })
            .collect();
        Self { lines, encoding }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(&line.text);
            text.push_str(line.ending.as_str());
        }
        text
    }

    /// Encodes the document with the encoding it was read with.
    ///
    /// Characters outside Latin-1 in a Latin-1 document are written as `?`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_text();
        match self.encoding {
            TextEncoding::Utf8 => text.into_bytes(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}
