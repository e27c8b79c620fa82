//! Smoothing filter for analog channels read through the PbHub multiplexer.
//!
//! Takes ten back-to-back raw samples, inverts each as `750 - raw`, drops
//! the largest and smallest, divides the rest by eight with an arithmetic
//! shift and rescales to the 0..1024 range.  The constants and the integer
//! arithmetic must stay exactly as they are: deployed dashboards were
//! calibrated against this output.

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// Raw samples taken per filtered reading.
pub const SAMPLE_COUNT: usize = 10;

/// Inversion pivot and scale denominator.
const FULL_SCALE: i32 = 750;
/// Seed for the running maximum.
const MAX_SEED: i32 = 30;
/// Seed for the running minimum.
const MIN_SEED: i32 = 750;

/// Apply the filter to a complete set of raw samples.
pub fn filter(samples: &[u16; SAMPLE_COUNT]) -> f32 {
    let mut sum: i32 = 0;
    let mut max = MAX_SEED;
    let mut min = MIN_SEED;

    for &raw in samples {
        let inverted = FULL_SCALE - i32::from(raw);
        sum += inverted;
        if inverted > max {
            max = inverted;
        }
        if inverted < min {
            min = inverted;
        }
    }

    let data = (sum - (max + min)) >> 3;
    let scaled = (1024.0 * f64::from(data) / f64::from(FULL_SCALE)).max(0.0);
    round2(scaled) as f32
}

/// Take [`SAMPLE_COUNT`] raw reads from `address` and filter them.
pub fn read_filtered(hw: &mut impl SensorPort, address: u8) -> Result<f32, SensorError> {
    let mut samples = [0u16; SAMPLE_COUNT];
    for sample in &mut samples {
        *sample = hw.read_channel(address)?;
    }
    Ok(filter(&samples))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
