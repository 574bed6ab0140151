//! Single-generation recombination simulation.
//!
//! Every sample transmits two haplotypes, held in adjacent slots `(2k, 2k + 1)`
//! of a [`HaplotypeAssignment`]. The assignment starts as a uniform shuffle of
//! the `2n` source haplotypes; at each marker interval every sample crosses
//! over independently with the interval's probability, which swaps the
//! sources of its two slots. The assignment after every interval is recorded
//! as one row of the [`HaplotypeSelectionMatrix`].

use ndarray::{aview1, Array2, ArrayView1, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::RecSynthError;
use crate::file::OutputFile;
use crate::{Position, RateFloat};

/// Index of a source haplotype: `2 * sample + {0, 1}` in the input.
pub type HapIndex = usize;

/// Which source haplotype each output haplotype slot currently copies.
///
/// Always a permutation of `0..2 * n_samples`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaplotypeAssignment {
    slots: Vec<HapIndex>,
}

impl HaplotypeAssignment {
    /// A uniformly random assignment of `2 * n_samples` source haplotypes.
    pub fn shuffled<R: Rng + ?Sized>(n_samples: usize, rng: &mut R) -> Self {
        let mut slots: Vec<HapIndex> = (0..2 * n_samples).collect();
        slots.shuffle(rng);
        Self { slots }
    }

    pub fn n_samples(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn as_slice(&self) -> &[HapIndex] {
        &self.slots
    }

    /// Cross one marker interval. Each sample draws once, in sample order,
    /// and crosses over if the draw falls below `rate`.
    ///
    /// Returns the number of samples that crossed over.
    pub fn transition<R: Rng + ?Sized>(&mut self, rate: RateFloat, rng: &mut R) -> usize {
        let mut crossovers = 0;
        for pair in self.slots.chunks_exact_mut(2) {
            if rng.random::<f64>() < rate {
                pair.swap(0, 1);
                crossovers += 1;
            }
        }
        crossovers
    }
}

/// The haplotype assignment at every marker boundary.
///
/// Row 0 is the assignment before any recombination, row `i + 1` the one in
/// effect at marker `i`. Columns are output haplotype slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaplotypeSelectionMatrix {
    rows: Array2<HapIndex>,
}

impl HaplotypeSelectionMatrix {
    /// Wrap precomputed rows; every row must be a permutation.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: Array2<HapIndex>) -> Self {
        Self { rows }
    }

    /// Number of rows: the number of markers plus one.
    pub fn n_boundaries(&self) -> usize {
        self.rows.nrows()
    }

    /// Number of output haplotype slots, twice the number of samples.
    pub fn n_haplotypes(&self) -> usize {
        self.rows.ncols()
    }

    /// The assignment at boundary `t`, if there is one.
    pub fn get(&self, t: usize) -> Option<ArrayView1<HapIndex>> {
        (t < self.n_boundaries()).then(|| self.rows.row(t))
    }

    /// The assignment in effect at the marker of rank `rank`.
    pub fn at_marker(&self, rank: usize) -> Option<ArrayView1<HapIndex>> {
        self.get(rank + 1)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<HapIndex>> {
        self.rows.axis_iter(Axis(0))
    }

    pub fn as_array(&self) -> &Array2<HapIndex> {
        &self.rows
    }
}

/// Positions at which samples crossed over, once per crossing sample.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossoverLog {
    positions: Vec<Position>,
}

impl CrossoverLog {
    pub fn record(&mut self, position: Position, n_crossovers: usize) {
        self.positions
            .extend(std::iter::repeat(position).take(n_crossovers));
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Write one position per line, in the order recorded.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), RecSynthError> {
        let mut writer = OutputFile::new(path).writer()?;
        for position in &self.positions {
            writeln!(writer, "{}", position)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// The result of one simulation pass.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub matrix: HaplotypeSelectionMatrix,
    /// Only kept when a crossover log path is configured.
    pub crossovers: Option<CrossoverLog>,
}

/// Runs recombination simulations with an explicitly owned random source.
///
/// Seed the generator (e.g. `StdRng::seed_from_u64`) for reproducible
/// matrices and crossover logs.
pub struct RecombinationSimulator<R> {
    rng: R,
    crossover_log: Option<PathBuf>,
}

impl<R: Rng> RecombinationSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            crossover_log: None,
        }
    }

    /// Record crossover sites and write them to `path` after each simulation.
    pub fn with_crossover_log(mut self, path: impl AsRef<Path>) -> Self {
        self.crossover_log = Some(path.as_ref().to_path_buf());
        self
    }

    /// Simulate recombination for `n_samples` samples across the marker
    /// intervals described by `rates`, one rate per marker in `markers`.
    pub fn simulate(
        &mut self,
        rates: ArrayView1<RateFloat>,
        markers: &[Position],
        n_samples: usize,
    ) -> Result<Simulation, RecSynthError> {
        if rates.len() != markers.len() {
            return Err(RecSynthError::RateMarkerMismatch {
                rates: rates.len(),
                markers: markers.len(),
            });
        }

        let mut rows = Array2::zeros((markers.len() + 1, 2 * n_samples));
        let mut state = HaplotypeAssignment::shuffled(n_samples, &mut self.rng);
        rows.row_mut(0).assign(&aview1(state.as_slice()));

        let mut crossovers = self.crossover_log.as_ref().map(|_| CrossoverLog::default());
        let mut total = 0;
        for (i, (&rate, &position)) in rates.iter().zip(markers).enumerate() {
            let n_crossovers = state.transition(rate, &mut self.rng);
            if let Some(log) = crossovers.as_mut() {
                log.record(position, n_crossovers);
            }
            total += n_crossovers;
            rows.row_mut(i + 1).assign(&aview1(state.as_slice()));
        }
        log::debug!(
            "{} crossovers across {} markers and {} samples",
            total,
            markers.len(),
            n_samples
        );

        if let (Some(path), Some(log)) = (&self.crossover_log, &crossovers) {
            log.write(path)?;
        }

        Ok(Simulation {
            matrix: HaplotypeSelectionMatrix { rows },
            crossovers,
        })
    }
}
