//! Simulate meiotic recombination along a genetic map and synthesize phased
//! genotypes from it.
//!
//! The pipeline has three stages:
//!
//!  1. collect the marker positions of a VCF that fall strictly inside some
//!     bounds ([`MarkerPositions`]),
//!  2. interpolate them onto a [`GeneticMap`] and turn map distances into
//!     per-interval crossover probabilities ([`RecombinationRates`]),
//!  3. thread shuffled sample haplotypes through randomly drawn crossovers
//!     ([`RecombinationSimulator`]), giving a [`HaplotypeSelectionMatrix`].
//!
//! The matrix then drives a [`GenotypeSynthesizer`], which writes a new VCF
//! of recombined haplotypes.
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use recsynth::prelude::*;
//!
//! let maps = GeneticMaps::from_gmap("chr20.b38.gmap.gz").expect("cannot read map");
//! let map = maps.get("20").expect("no map for chr20");
//! let (lower, upper) = map.span();
//!
//! let markers = MarkerPositions::from_vcf("panel.vcf.gz", lower, upper)
//!                   .expect("cannot read markers");
//! let rates = RecombinationRates::interpolate(&markers, map)
//!                   .expect("markers outside the map");
//!
//! let mut simulator = RecombinationSimulator::new(StdRng::seed_from_u64(42));
//! let simulation = simulator
//!     .simulate(rates.rates(), &markers, 1000)
//!     .expect("simulation failed");
//! assert_eq!(simulation.matrix.n_boundaries(), markers.len() + 1);
//! ```

pub mod error;
pub mod file;
pub mod genetic_map;
pub mod interpolate;
pub mod markers;
pub mod numeric;
pub mod simulate;
pub mod synthesize;
pub mod vcf;

/// The float type for map positions and recombination probabilities.
pub type RateFloat = f64;

/// The integer type for genomic positions.
pub type Position = u64;

pub use error::RecSynthError;
pub use genetic_map::{GeneticMap, GeneticMaps, MapFormat};
pub use interpolate::RecombinationRates;
pub use markers::{collect_markers, MarkerPositions};
pub use simulate::{
    CrossoverLog, HaplotypeAssignment, HaplotypeSelectionMatrix, RecombinationSimulator,
    Simulation,
};
pub use synthesize::GenotypeSynthesizer;

pub mod prelude {
    pub use crate::error::RecSynthError;
    pub use crate::genetic_map::{GeneticMap, GeneticMaps, MapFormat};
    pub use crate::interpolate::RecombinationRates;
    pub use crate::markers::{collect_markers, MarkerPositions};
    pub use crate::simulate::{HaplotypeSelectionMatrix, RecombinationSimulator, Simulation};
    pub use crate::synthesize::GenotypeSynthesizer;
    pub use crate::{Position, RateFloat};
}
