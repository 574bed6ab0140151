//! A minimal streaming reader for plaintext (or gzip-compressed) VCF.
//!
//! Only what recombination simulation needs is parsed: the sample names from
//! the `#CHROM` line, and per record the fixed columns and the `GT` subfield
//! of each sample. Records are parsed lazily; collecting marker positions
//! never touches the genotype columns.

use std::io::{BufRead, BufReader, Lines, Read};
use std::path::Path;

use crate::error::RecSynthError;
use crate::file::InputFile;
use crate::Position;

/// Allele index of one haplotype at one record; `None` is a missing call.
pub type Allele = Option<u8>;

const CHROM: usize = 0;
const POS: usize = 1;
const ID: usize = 2;
const REF: usize = 3;
const ALT: usize = 4;
const FIRST_SAMPLE: usize = 9;

pub struct VcfReader {
    samples: Vec<String>,
    lines: Lines<BufReader<Box<dyn Read>>>,
}

impl VcfReader {
    /// Open a VCF and read through its header.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecSynthError> {
        let mut lines = InputFile::new(path).reader()?.lines();
        loop {
            let line = lines.next().ok_or(RecSynthError::MissingVcfHeader)??;
            if line.starts_with("##") {
                continue;
            }
            if !line.starts_with("#CHROM") {
                return Err(RecSynthError::MissingVcfHeader);
            }
            let samples = line
                .split('\t')
                .skip(FIRST_SAMPLE)
                .map(str::to_string)
                .collect();
            return Ok(Self { samples, lines });
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Adapt the reader into a stream of record positions.
    pub fn positions(self) -> impl Iterator<Item = Result<Position, RecSynthError>> {
        self.map(|record| record.map(|r| r.pos()))
    }
}

impl Iterator for VcfReader {
    type Item = Result<VcfRecord, RecSynthError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(VcfRecord::parse(line));
        }
    }
}

/// One data line of a VCF.
#[derive(Debug, Clone)]
pub struct VcfRecord {
    line: String,
    pos: Position,
}

impl VcfRecord {
    fn parse(line: String) -> Result<Self, RecSynthError> {
        let pos_str = line.split('\t').nth(POS).ok_or(RecSynthError::MissingField)?;
        let pos = pos_str.parse().map_err(|_| {
            RecSynthError::ParseError(format!("failed to parse POS from string: {}", pos_str))
        })?;
        Ok(Self { line, pos })
    }

    fn column(&self, idx: usize) -> Result<&str, RecSynthError> {
        self.line
            .split('\t')
            .nth(idx)
            .ok_or(RecSynthError::MissingField)
    }

    pub fn chrom(&self) -> Result<&str, RecSynthError> {
        self.column(CHROM)
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn id(&self) -> Result<&str, RecSynthError> {
        self.column(ID)
    }

    pub fn reference(&self) -> Result<&str, RecSynthError> {
        self.column(REF)
    }

    /// The first alternate allele.
    pub fn first_alt(&self) -> Result<&str, RecSynthError> {
        let alt = self.column(ALT)?;
        Ok(alt.split(',').next().unwrap_or(alt))
    }

    /// The alleles of all `2 * n_samples` haplotypes, sample by sample.
    pub fn haplotypes(&self, n_samples: usize) -> Result<Vec<Allele>, RecSynthError> {
        let mut alleles = Vec::with_capacity(2 * n_samples);
        let mut sample_fields = self.line.split('\t').skip(FIRST_SAMPLE);
        for _ in 0..n_samples {
            let sample = sample_fields.next().ok_or(RecSynthError::MissingField)?;
            let (a0, a1) = parse_diploid_gt(sample)?;
            alleles.push(a0);
            alleles.push(a1);
        }
        Ok(alleles)
    }
}

/// Parse the leading `GT` subfield of a sample column, e.g. `0|1:35`.
fn parse_diploid_gt(sample: &str) -> Result<(Allele, Allele), RecSynthError> {
    let gt = sample.split(':').next().unwrap_or(sample);
    let invalid = || RecSynthError::InvalidGenotype(gt.to_string());
    let mut calls = gt.split(&['|', '/'][..]).map(|call| match call {
        "." => Ok(None),
        _ => call.parse::<u8>().map(Some).map_err(|_| invalid()),
    });
    match (calls.next(), calls.next(), calls.next()) {
        (Some(a0), Some(a1), None) => Ok((a0?, a1?)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_samples_and_records() {
        let reader = VcfReader::from_path("tests/data/test.vcf").unwrap();
        assert_eq!(reader.samples(), &["S1", "S2", "S3"]);
        let n_samples = reader.n_samples();

        let records: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 5);

        let first = &records[0];
        assert_eq!(first.chrom().unwrap(), "chr1");
        assert_eq!(first.pos(), 1000);
        assert_eq!(first.id().unwrap(), "rs1");
        assert_eq!(first.reference().unwrap(), "A");
        assert_eq!(first.first_alt().unwrap(), "G");
        assert_eq!(
            first.haplotypes(n_samples).unwrap(),
            vec![Some(0), Some(1), Some(1), Some(1), Some(0), Some(0)]
        );
    }

    #[test]
    fn test_positions() {
        let reader = VcfReader::from_path("tests/data/test.vcf").unwrap();
        let positions: Vec<Position> = reader.positions().collect::<Result<_, _>>().unwrap();
        assert_eq!(positions, vec![1000, 100_000, 500_000, 900_000, 1_000_000]);
    }

    #[test]
    fn test_parse_diploid_gt() {
        assert_eq!(parse_diploid_gt("0|1").unwrap(), (Some(0), Some(1)));
        assert_eq!(parse_diploid_gt("1/0:12,3").unwrap(), (Some(1), Some(0)));
        assert_eq!(parse_diploid_gt(".|2").unwrap(), (None, Some(2)));
        assert!(parse_diploid_gt("0").is_err());
        assert!(parse_diploid_gt("0|1|1").is_err());
        assert!(parse_diploid_gt("a|1").is_err());
    }

    #[test]
    fn test_missing_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("headerless.vcf");
        std::fs::write(&path, "chr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0|1\n").unwrap();
        assert!(matches!(
            VcfReader::from_path(&path),
            Err(RecSynthError::MissingVcfHeader)
        ));
    }

    #[test]
    fn test_unreadable_source_is_io_error() {
        assert!(matches!(
            VcfReader::from_path("tests/data/no_such.vcf"),
            Err(RecSynthError::FileError(_))
        ));
    }
}
