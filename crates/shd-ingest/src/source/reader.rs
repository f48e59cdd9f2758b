//! CSV file reading with every cell kept as text.

use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use super::encoding::SourceEncoding;
use super::table::RawTable;
use crate::error::{IngestError, Result};

/// Cell values read as missing, in addition to empty cells.
///
/// These are the tokens the upstream datasets use for "no value" (the
/// pandas default set).
pub const DEFAULT_NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options for reading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Declared text encoding.
    pub encoding: SourceEncoding,
    /// Field delimiter.
    pub delimiter: u8,
    /// Extra tokens read as missing, on top of [`DEFAULT_NA_TOKENS`].
    pub na_tokens: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            encoding: SourceEncoding::Utf8,
            delimiter: b',',
            na_tokens: Vec::new(),
        }
    }
}

impl ReadOptions {
    pub fn with_encoding(mut self, encoding: SourceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn is_missing(&self, value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || is_na_token(trimmed)
            || self.na_tokens.iter().any(|token| token == trimmed)
    }
}

/// Returns true when `value` (already trimmed) is a default NA token.
pub fn is_na_token(value: &str) -> bool {
    DEFAULT_NA_TOKENS.contains(&value)
}

/// Reads a CSV file into a [`RawTable`].
///
/// The first record is the header. Blank lines are skipped, but a row of empty
/// fields such as `,` is kept with every cell missing. Short rows are padded
/// with missing cells; a row with more fields than the header is an error.
/// Cell text is kept verbatim apart from missing-value detection.
pub fn read_raw_table(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let text = options.encoding.decode(&bytes, path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        // A blank line parses as one empty field; `,,` is a row of missing cells.
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        let Some(header) = headers.as_ref() else {
            headers = Some(record.iter().map(str::to_string).collect());
            continue;
        };
        if record.len() > header.len() {
            return Err(IngestError::RaggedRow {
                path: path.to_path_buf(),
                line: record.position().map_or(0, csv::Position::line),
                expected: header.len(),
                found: record.len(),
            });
        }
        let row = record
            .iter()
            .map(|field| (!options.is_missing(field)).then(|| field.to_string()))
            .collect();
        rows.push(row);
    }

    let Some(headers) = headers else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };

    tracing::debug!(
        path = %path.display(),
        encoding = %options.encoding,
        columns = headers.len(),
        rows = rows.len(),
        "read source table"
    );
    Ok(RawTable::new(path, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_keeps_text_and_marks_missing() {
        let file = create_temp_csv(b"Country,Per Capita GDP\nFinland,\"$53,000\"\nAtlantis,N/A\nSweden,\n");
        let table = read_raw_table(file.path(), &ReadOptions::default()).unwrap();

        assert_eq!(table.headers(), ["Country", "Per Capita GDP"]);
        assert_eq!(
            table.column(1),
            vec![Some("$53,000".to_string()), None, None]
        );
    }

    #[test]
    fn test_read_skips_blank_lines_and_pads_short_rows() {
        let file = create_temp_csv(b"a,b,c\n\n1,2\n   \n4,5,6\n");
        let table = read_raw_table(file.path(), &ReadOptions::default()).unwrap();

        assert_eq!(table.height(), 2);
        assert_eq!(table.rows()[0], vec![Some("1".to_string()), Some("2".to_string()), None]);
    }

    #[test]
    fn test_read_keeps_rows_of_empty_fields() {
        let file = create_temp_csv(b"country,code\nFinland,FIN\n,\nSweden,SWE\n");
        let table = read_raw_table(file.path(), &ReadOptions::default()).unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(table.rows()[1], vec![None, None]);
        assert_eq!(table.column(0)[2].as_deref(), Some("Sweden"));
    }

    #[test]
    fn test_read_rejects_long_rows() {
        let file = create_temp_csv(b"a,b\n1,2,3\n");
        let result = read_raw_table(file.path(), &ReadOptions::default());
        assert!(matches!(result, Err(IngestError::RaggedRow { found: 3, .. })));
    }

    #[test]
    fn test_read_empty_file() {
        let file = create_temp_csv(b"");
        let result = read_raw_table(file.path(), &ReadOptions::default());
        assert!(matches!(result, Err(IngestError::EmptyCsv { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_raw_table(&dir.path().join("WHR_2023.csv"), &ReadOptions::default());
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_latin1_with_bom() {
        let file = create_temp_csv(b"\xef\xbb\xbfCountry,Income Group\nCura\xe7ao,HI\n");
        let options = ReadOptions::default().with_encoding(SourceEncoding::Latin1);
        let table = read_raw_table(file.path(), &options).unwrap();

        assert_eq!(table.headers()[0], "Country");
        assert_eq!(table.column(0), vec![Some("Curaçao".to_string())]);
    }

    #[test]
    fn test_extra_na_tokens() {
        let file = create_temp_csv(b"country,score\nFinland,..\n");
        let options = ReadOptions {
            na_tokens: vec!["..".to_string()],
            ..ReadOptions::default()
        };
        let table = read_raw_table(file.path(), &options).unwrap();
        assert_eq!(table.column(1), vec![None]);
    }
}
