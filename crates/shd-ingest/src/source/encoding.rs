//! Source text encodings.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Text encoding a source file is declared to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEncoding {
    /// UTF-8, with an optional byte order mark.
    #[default]
    Utf8,
    /// ISO-8859-1. Decoded as windows-1252, its superset in practice.
    Latin1,
}

impl SourceEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "UTF-8",
            SourceEncoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Decodes raw file bytes into text.
    ///
    /// Malformed UTF-8 is an error rather than being replaced, so a source
    /// with the wrong declared encoding fails loudly.
    pub(crate) fn decode<'a>(self, bytes: &'a [u8], path: &Path) -> Result<Cow<'a, str>> {
        match self {
            SourceEncoding::Utf8 => {
                let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
                if had_errors {
                    return Err(IngestError::InvalidEncoding {
                        path: path.to_path_buf(),
                        encoding: self.as_str(),
                    });
                }
                Ok(text)
            }
            SourceEncoding::Latin1 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                Ok(WINDOWS_1252.decode_without_bom_handling(bytes).0)
            }
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_decodes_accented_names() {
        let bytes = b"country\nC\xf4te d'Ivoire\n";
        let text = SourceEncoding::Latin1
            .decode(bytes, Path::new("GEF_2023.csv"))
            .unwrap();
        assert!(text.contains("Côte d'Ivoire"));
    }

    #[test]
    fn utf8_rejects_latin1_bytes() {
        let bytes = b"country\nC\xf4te d'Ivoire\n";
        let result = SourceEncoding::Utf8.decode(bytes, Path::new("GEF_2023.csv"));
        assert!(matches!(result, Err(IngestError::InvalidEncoding { .. })));
    }

    #[test]
    fn utf8_strips_bom() {
        let text = SourceEncoding::Utf8
            .decode("\u{feff}country\n".as_bytes(), Path::new("x.csv"))
            .unwrap();
        assert_eq!(text, "country\n");
    }
}
