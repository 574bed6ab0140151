//! Interpolation of marker positions onto a genetic map, and the per-interval
//! recombination probabilities derived from them.

use ndarray::{Array1, ArrayView1};

use crate::error::RecSynthError;
use crate::genetic_map::GeneticMap;
use crate::numeric::{cm_to_morgans, interp_segment};
use crate::{Position, RateFloat};

/// Interpolated map positions of a set of markers and the probability of a
/// crossover in the interval ending at each marker.
#[derive(Debug, Clone, PartialEq)]
pub struct RecombinationRates {
    map_positions: Array1<RateFloat>,
    rates: Array1<RateFloat>,
}

impl RecombinationRates {
    /// Interpolate `markers` on `map` and derive the interval rates.
    pub fn interpolate(markers: &[Position], map: &GeneticMap) -> Result<Self, RecSynthError> {
        let map_positions = interpolate_map_positions(markers, map)?;
        let rates = interval_rates(map_positions.view());
        Ok(Self {
            map_positions,
            rates,
        })
    }

    /// Map positions (cM) of the markers.
    pub fn map_positions(&self) -> ArrayView1<RateFloat> {
        self.map_positions.view()
    }

    /// Crossover probabilities (Morgans), one per marker.
    pub fn rates(&self) -> ArrayView1<RateFloat> {
        self.rates.view()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Linearly interpolate the map position (cM) of each marker.
///
/// Markers are bracketed with a single forward pass over the map, so they
/// must be sorted and lie within the map's span; both are checked as the
/// scan proceeds. A marker on an interior breakpoint is bracketed by the
/// segment to its left.
pub fn interpolate_map_positions(
    markers: &[Position],
    map: &GeneticMap,
) -> Result<Array1<RateFloat>, RecSynthError> {
    if markers.is_empty() {
        return Err(RecSynthError::NoMarkers);
    }
    let (bp, cm) = (map.bp(), map.cm());
    let (start, end) = map.span();

    let mut map_positions = Vec::with_capacity(markers.len());
    let mut segment = 0;
    let mut previous: Option<Position> = None;
    for &position in markers {
        if let Some(last) = previous {
            if position < last {
                return Err(RecSynthError::MarkersNotSorted(position, last));
            }
        }
        previous = Some(position);
        if position < start || position > end {
            return Err(RecSynthError::MarkerOutsideMap(position, start, end));
        }

        // position <= end, so this stops on the last segment at the latest
        while position > bp[segment + 1] {
            segment += 1;
        }

        let map_pos = interp_segment(
            bp[segment],
            bp[segment + 1],
            cm[segment],
            cm[segment + 1],
            position,
        )
        .ok_or_else(|| {
            RecSynthError::InternalError(format!("cannot interpolate position {}", position))
        })?;
        map_positions.push(map_pos);
    }
    Ok(Array1::from_vec(map_positions))
}

/// Convert marker map positions (cM) into per-interval crossover
/// probabilities (Morgans).
///
/// The first rate is the absolute map position of the first marker rather
/// than a difference. Rates are not clamped to `[0, 1]`.
pub fn interval_rates(map_positions: ArrayView1<RateFloat>) -> Array1<RateFloat> {
    let mut rates = Array1::zeros(map_positions.len());
    if let Some(&first) = map_positions.get(0) {
        rates[0] = cm_to_morgans(first);
    }
    for i in 1..map_positions.len() {
        rates[i] = cm_to_morgans(map_positions[i] - map_positions[i - 1]);
    }
    rates
}
