use genomap::GenomeMapError;
use std::io;
use thiserror::Error;

use crate::file::FileError;
use crate::Position;

#[derive(Error, Debug)]
pub enum RecSynthError {
    #[error("genetic map parsing error: {0}")]
    MapParsingError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("GenomeMap Error: error updating GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),
    #[error("Missing field")]
    MissingField,
    #[error("Failed to parse a column: {0}")]
    ParseError(String),
    #[error("Genetic map for '{0}' is not sorted by position")]
    MapNotSorted(String),
    #[error("Improper genetic map position, either NaN, negative or decreasing ({0})")]
    ImproperMapPosition(String),
    #[error("Genetic map for '{0}' has {1} positions but {2} map values")]
    MapLengthMismatch(String, usize, usize),
    #[error("Genetic map for '{0}' needs at least two entries")]
    MapTooShort(String),
    #[error("Chromosome key '{0}' does not exist")]
    NoChrom(String),
    #[error("No markers to simulate over")]
    NoMarkers,
    #[error("Marker positions are not sorted ({0} follows {1})")]
    MarkersNotSorted(Position, Position),
    #[error("Marker {0} lies outside the genetic map span [{1}, {2}]")]
    MarkerOutsideMap(Position, Position, Position),
    #[error("{rates} recombination rates given for {markers} markers")]
    RateMarkerMismatch { rates: usize, markers: usize },
    #[error("Internal Error: {0}")]
    InternalError(String),
    #[error("VCF has no #CHROM header line")]
    MissingVcfHeader,
    #[error("Malformed genotype '{0}'")]
    InvalidGenotype(String),
    #[error("Haplotype selection matrix has {haplotypes} haplotypes but the VCF has {samples} samples")]
    SampleCountMismatch { haplotypes: usize, samples: usize },
    #[error("VCF has more markers in bounds than the haplotype selection matrix ({0} rows)")]
    MatrixExhausted(usize),
}
