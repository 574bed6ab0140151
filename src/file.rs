//! Plaintext and gzip-compressed file input and output.
//!
//! Genetic maps, VCFs and the crossover log may all be gzip-compressed.
//! [`InputFile`] sniffs the gzip magic number rather than trusting the
//! extension; [`OutputFile`] compresses when the path ends in `.gz`.
//!
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("cannot open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot create '{path}': {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check for the gzip magic numbers. Files shorter than two bytes are plaintext.
fn is_gzipped_file(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(2);
    file.take(2).read_to_end(&mut buffer)?;
    Ok(buffer == GZIP_MAGIC)
}

/// An input file that may or may not be gzip-compressed.
pub struct InputFile {
    pub path: PathBuf,
}

impl InputFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open the file for buffered reading, decompressing if needed.
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, FileError> {
        let open_err = |source| FileError::Open {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(open_err)?;
        let reader: Box<dyn Read> = if is_gzipped_file(&self.path).map_err(open_err)? {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Whether the first line of the file starts with `expect`.
    pub fn has_header(&self, expect: &str) -> Result<bool, FileError> {
        let mut buf_reader = self.reader()?;
        let mut first_line = String::new();
        buf_reader.read_line(&mut first_line)?;
        Ok(first_line.starts_with(expect))
    }
}

/// An output file, gzip-compressed when the path ends in `.gz`.
pub struct OutputFile {
    pub path: PathBuf,
}

impl OutputFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn is_gzip(&self) -> bool {
        self.path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
    }

    /// Create (or truncate) the file and return a buffered writer.
    ///
    /// The writer must be flushed by the caller; dropping a gzip writer
    /// without flushing silently loses the error.
    pub fn writer(&self) -> Result<Box<dyn Write>, FileError> {
        let file = File::create(&self.path).map_err(|source| FileError::Create {
            path: self.path.clone(),
            source,
        })?;
        let writer: Box<dyn Write> = if self.is_gzip() {
            Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_gzip_roundtrip_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.txt.gz");

        let mut writer = OutputFile::new(&path).writer().unwrap();
        writeln!(writer, "pos\tchr\tcM").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert!(is_gzipped_file(&path).unwrap());
        let input = InputFile::new(&path);
        assert!(input.has_header("pos").unwrap());
    }

    #[test]
    fn test_short_plaintext_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one_byte.txt");
        std::fs::write(&path, "1").unwrap();
        assert!(!is_gzipped_file(&path).unwrap());
        assert!(!InputFile::new(&path).has_header("pos").unwrap());
    }

    #[test]
    fn test_plaintext_reads_from_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        std::fs::write(&path, "\x1fab\nsecond\n").unwrap();
        assert!(!is_gzipped_file(&path).unwrap());
        let lines: Vec<String> = InputFile::new(&path)
            .reader()
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["\x1fab", "second"]);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = InputFile::new("does/not/exist.txt").reader().err().unwrap();
        assert!(err.to_string().contains("does/not/exist.txt"));
    }
}
