use csv::{ReaderBuilder, StringRecord, Trim};
use genomap::GenomeMap;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;

use super::file::InputFile;
use crate::error::RecSynthError;
use crate::{Position, RateFloat};

/// The on-disk layout of a genetic map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MapFormat {
    /// `Chromosome  Position(bp)  Rate(cM/Mb)  Map(cM)`
    #[cfg_attr(feature = "cli", value(name = "hapmap"))]
    HapMap,
    /// `pos  chr  cM`, as used by SHAPEIT4 and GLIMPSE.
    #[default]
    Gmap,
}

impl MapFormat {
    /// What the first line of a file in this format starts with, if it has a header.
    fn header_prefix(&self) -> &'static str {
        match self {
            MapFormat::HapMap => "Chromosome",
            MapFormat::Gmap => "pos",
        }
    }
}

/// The genetic map of a single chromosome: physical positions and their
/// cumulative map positions in centimorgans.
///
/// Invariants, checked on construction: at least two entries, `bp` strictly
/// increasing, `cm` finite, non-negative and non-decreasing.
#[derive(Debug, Clone)]
pub struct GeneticMap {
    name: String,
    bp: Vec<Position>,
    cm: Vec<RateFloat>,
}

impl GeneticMap {
    pub fn new(name: &str, bp: Vec<Position>, cm: Vec<RateFloat>) -> Result<Self, RecSynthError> {
        if bp.len() != cm.len() {
            return Err(RecSynthError::MapLengthMismatch(
                name.to_string(),
                bp.len(),
                cm.len(),
            ));
        }
        if bp.len() < 2 {
            return Err(RecSynthError::MapTooShort(name.to_string()));
        }
        if bp.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(RecSynthError::MapNotSorted(name.to_string()));
        }
        for (i, &map_pos) in cm.iter().enumerate() {
            let decreasing = i > 0 && map_pos < cm[i - 1];
            if !map_pos.is_finite() || map_pos < 0.0 || decreasing {
                return Err(RecSynthError::ImproperMapPosition(format!(
                    "{}:{}",
                    name, bp[i]
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            bp,
            cm,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical positions of the map breakpoints.
    pub fn bp(&self) -> &[Position] {
        &self.bp
    }

    /// Map positions (cM) of the breakpoints.
    pub fn cm(&self) -> &[RateFloat] {
        &self.cm
    }

    pub fn len(&self) -> usize {
        self.bp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bp.is_empty()
    }

    /// First and last physical position covered by the map.
    pub fn span(&self) -> (Position, Position) {
        // non-empty by construction
        (self.bp[0], self.bp[self.bp.len() - 1])
    }

    /// Total map length in centimorgans.
    pub fn total_length(&self) -> RateFloat {
        self.cm[self.cm.len() - 1]
    }
}

/// Genetic maps for a set of chromosomes, in file order.
pub struct GeneticMaps {
    pub map: GenomeMap<GeneticMap>,
}

impl GeneticMaps {
    /// Read a HapMap-formatted recombination map.
    ///
    /// ```text
    /// Chromosome      Position(bp)    Rate(cM/Mb)     Map(cM)
    /// chr1    55550   2.981822        0.000000
    /// chr1    82571   2.082414        0.080572
    /// chr1    88169   2.081358        0.092229
    /// ```
    ///
    /// Only the position and `Map(cM)` columns are used; the rate column is
    /// implied by them. The header is optional and gzip input is handled.
    pub fn from_hapmap(filepath: impl AsRef<Path>) -> Result<GeneticMaps, RecSynthError> {
        Self::read(filepath, MapFormat::HapMap)
    }

    /// Read a `pos chr cM` genetic map, as distributed with SHAPEIT4.
    pub fn from_gmap(filepath: impl AsRef<Path>) -> Result<GeneticMaps, RecSynthError> {
        Self::read(filepath, MapFormat::Gmap)
    }

    pub fn read(filepath: impl AsRef<Path>, format: MapFormat) -> Result<GeneticMaps, RecSynthError> {
        let input_file = InputFile::new(filepath);
        let has_header = input_file.has_header(format.header_prefix())?;
        let buf_reader = input_file.reader()?;

        let mut maps = MapAccumulator::new();
        match format {
            MapFormat::HapMap => {
                let mut rdr = ReaderBuilder::new()
                    .delimiter(b'\t')
                    .has_headers(has_header)
                    .comment(Some(b'#'))
                    .trim(Trim::All)
                    .from_reader(buf_reader);
                for result in rdr.records() {
                    let row: HapMapRow = result?.deserialize(None)?;
                    maps.push(row.chrom, row.position, row.map_pos)?;
                }
            }
            MapFormat::Gmap => {
                // gmap files come both tab and space delimited
                let mut skip_header = has_header;
                for line in buf_reader.lines() {
                    let line = line?;
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if skip_header {
                        skip_header = false;
                        continue;
                    }
                    let record = StringRecord::from(line.split_whitespace().collect::<Vec<_>>());
                    let row: GmapRow = record.deserialize(None)?;
                    maps.push(row.chrom, row.position, row.map_pos)?;
                }
            }
        }

        let maps = maps.finish()?;
        log::debug!("read genetic maps for {} chromosome(s)", maps.len());
        Ok(GeneticMaps { map: maps })
    }

    /// The map of chromosome `name`.
    pub fn get(&self, name: &str) -> Result<&GeneticMap, RecSynthError> {
        self.map
            .get(name)
            .ok_or_else(|| RecSynthError::NoChrom(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over chromosome name and [`GeneticMap`] tuples.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GeneticMap)> {
        self.map.iter()
    }
}

/// A row of a HapMap file. The rate column is implied by the map positions.
#[derive(Debug, Deserialize)]
struct HapMapRow {
    chrom: String,
    position: Position,
    _rate: IgnoredAny,
    map_pos: RateFloat,
}

/// A row of a `pos chr cM` file.
#[derive(Debug, Deserialize)]
struct GmapRow {
    position: Position,
    chrom: String,
    map_pos: RateFloat,
}

/// Groups consecutive rows by chromosome into validated [`GeneticMap`]s.
struct MapAccumulator {
    maps: GenomeMap<GeneticMap>,
    // rows of the chromosome currently being read
    current: Option<(String, Vec<Position>, Vec<RateFloat>)>,
}

impl MapAccumulator {
    fn new() -> Self {
        Self {
            maps: GenomeMap::new(),
            current: None,
        }
    }

    fn push(&mut self, chrom: String, bp: Position, cm: RateFloat) -> Result<(), RecSynthError> {
        match self.current.as_mut() {
            Some((name, bps, cms)) if *name == chrom => {
                bps.push(bp);
                cms.push(cm);
            }
            _ => {
                self.flush()?;
                self.current = Some((chrom, vec![bp], vec![cm]));
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RecSynthError> {
        if let Some((name, bps, cms)) = self.current.take() {
            self.maps.insert(&name, GeneticMap::new(&name, bps, cms)?)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<GenomeMap<GeneticMap>, RecSynthError> {
        self.flush()?;
        Ok(self.maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::assert_float_eq;
    use tempfile::tempdir;

    #[test]
    fn test_hapmap_read() {
        let maps = GeneticMaps::from_hapmap("tests/data/test_map.hapmap").unwrap();
        assert_eq!(maps.len(), 2);
        assert!(!maps.is_empty());

        let chr1 = maps.get("chr1").unwrap();
        assert_eq!(chr1.name(), "chr1");
        assert_eq!(chr1.span(), (1000, 1_000_000));
        assert_float_eq(chr1.total_length(), 10.0, 1e-12);

        let names: Vec<_> = maps.iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_gmap_read() {
        let maps = GeneticMaps::from_gmap("tests/data/test_map.gmap").unwrap();
        assert_eq!(maps.len(), 1);
        let chr20 = maps.get("20").unwrap();
        assert_eq!(chr20.bp(), &[60_000, 500_000, 1_000_000]);
        assert_eq!(chr20.cm(), &[0.0, 2.0, 4.5]);
    }

    #[test]
    fn test_headerless_gmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noheader.gmap");
        std::fs::write(&path, "100\t1\t0.0\n200\t1\t0.5\n").unwrap();
        let maps = GeneticMaps::from_gmap(&path).unwrap();
        assert_eq!(maps.get("1").unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_chrom() {
        let maps = GeneticMaps::from_gmap("tests/data/test_map.gmap").unwrap();
        assert!(matches!(maps.get("chrX"), Err(RecSynthError::NoChrom(_))));
    }

    #[test]
    fn test_unsorted_map_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unsorted.gmap");
        std::fs::write(&path, "pos\tchr\tcM\n200\t1\t0.0\n100\t1\t0.5\n").unwrap();
        let result = GeneticMaps::from_gmap(&path);
        assert!(matches!(result, Err(RecSynthError::MapNotSorted(_))));
    }

    #[test]
    fn test_decreasing_map_position_rejected() {
        let result = GeneticMap::new("1", vec![1, 2, 3], vec![0.0, 1.0, 0.5]);
        assert!(matches!(result, Err(RecSynthError::ImproperMapPosition(_))));
        let result = GeneticMap::new("1", vec![1, 2], vec![0.0, f64::NAN]);
        assert!(matches!(result, Err(RecSynthError::ImproperMapPosition(_))));
    }

    #[test]
    fn test_short_and_mismatched_maps_rejected() {
        assert!(matches!(
            GeneticMap::new("1", vec![1], vec![0.0]),
            Err(RecSynthError::MapTooShort(_))
        ));
        assert!(matches!(
            GeneticMap::new("1", vec![1, 2], vec![0.0]),
            Err(RecSynthError::MapLengthMismatch(_, 2, 1))
        ));
    }

    #[test]
    fn test_unparsable_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.gmap");
        std::fs::write(&path, "pos\tchr\tcM\n1e5x\t1\t0.0\n").unwrap();
        assert!(matches!(
            GeneticMaps::from_gmap(&path),
            Err(RecSynthError::MapParsingError(_))
        ));
    }

    #[test]
    fn test_space_delimited_gmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spaces.gmap");
        std::fs::write(&path, "pos chr cM\n100 1 0.0\n200  1\t0.5\n").unwrap();
        let maps = GeneticMaps::from_gmap(&path).unwrap();
        let chr1 = maps.get("1").unwrap();
        assert_eq!(chr1.bp(), &[100, 200]);
        assert_eq!(chr1.cm(), &[0.0, 0.5]);
    }

    #[test]
    fn test_gmap_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short_row.gmap");
        std::fs::write(&path, "100 1 0.0\n200 1\n").unwrap();
        assert!(matches!(
            GeneticMaps::from_gmap(&path),
            Err(RecSynthError::MapParsingError(_))
        ));
    }

    #[test]
    fn test_headerless_hapmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noheader.hapmap");
        std::fs::write(
            &path,
            "chr1\t100\t1.0\t0.0\nchr1\t200\t1.0\t0.5\nchr2\t50\tNA\t0.0\nchr2\t90\tNA\t0.1\n",
        )
        .unwrap();
        let maps = GeneticMaps::from_hapmap(&path).unwrap();
        assert_eq!(maps.len(), 2);
        let chr1 = maps.get("chr1").unwrap();
        assert_eq!(chr1.bp(), &[100, 200]);
        assert_eq!(chr1.cm(), &[0.0, 0.5]);
        assert_eq!(maps.get("chr2").unwrap().span(), (50, 90));
    }

    #[test]
    fn test_default_format_is_gmap() {
        assert_eq!(MapFormat::default(), MapFormat::Gmap);
    }
}
