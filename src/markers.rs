use std::ops::Deref;
use std::path::Path;

use crate::error::RecSynthError;
use crate::vcf::VcfReader;
use crate::Position;

/// Marker positions strictly inside the collection bounds, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerPositions {
    positions: Vec<Position>,
}

impl MarkerPositions {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    /// Collect the positions of all records of a VCF with `lower < pos < upper`.
    pub fn from_vcf(
        path: impl AsRef<Path>,
        lower: Position,
        upper: Position,
    ) -> Result<Self, RecSynthError> {
        let reader = VcfReader::from_path(path)?;
        collect_markers(reader.positions(), lower, upper)
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.positions
    }
}

impl Deref for MarkerPositions {
    type Target = [Position];

    fn deref(&self) -> &[Position] {
        &self.positions
    }
}

/// Whether `position` lies in the open interval `(lower, upper)`.
pub fn in_bounds(position: Position, lower: Position, upper: Position) -> bool {
    lower < position && position < upper
}

/// Keep the variant positions in the open interval `(lower, upper)`.
///
/// Positions are kept in the order they are read. The first read error
/// aborts collection.
pub fn collect_markers<I, E>(
    records: I,
    lower: Position,
    upper: Position,
) -> Result<MarkerPositions, RecSynthError>
where
    I: IntoIterator<Item = Result<Position, E>>,
    RecSynthError: From<E>,
{
    let mut positions = Vec::new();
    for record in records {
        let position = record?;
        if in_bounds(position, lower, upper) {
            positions.push(position);
        }
    }
    log::debug!(
        "collected {} markers in ({}, {})",
        positions.len(),
        lower,
        upper
    );
    Ok(MarkerPositions { positions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn ok_positions(positions: &[Position]) -> Vec<Result<Position, RecSynthError>> {
        positions.iter().copied().map(Ok).collect()
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let records = ok_positions(&[0, 1, 10, 99, 100, 101]);
        let markers = collect_markers(records, 0, 100).unwrap();
        assert_eq!(markers.as_slice(), &[1, 10, 99]);
    }

    #[test]
    fn test_keeps_source_order() {
        let records = ok_positions(&[50, 20, 20, 70]);
        let markers = collect_markers(records, 10, 60).unwrap();
        assert_eq!(&*markers, &[50, 20, 20]);
    }

    #[test]
    fn test_empty_when_nothing_in_bounds() {
        let markers = collect_markers(ok_positions(&[5, 6]), 5, 6).unwrap();
        assert!(markers.is_empty());
    }

    #[test]
    fn test_read_error_aborts() {
        let records: Vec<Result<Position, io::Error>> = vec![
            Ok(10),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
            Ok(20),
        ];
        let result = collect_markers(records, 0, 100);
        assert!(matches!(result, Err(RecSynthError::IOError(_))));
    }

    #[test]
    fn test_from_vcf() {
        let markers = MarkerPositions::from_vcf("tests/data/test.vcf", 1000, 1_000_000).unwrap();
        assert_eq!(markers.as_slice(), &[100_000, 500_000, 900_000]);
    }
}
