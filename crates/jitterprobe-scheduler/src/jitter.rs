//! Jittered delay before each probe.
//!
//! The delay is drawn from a normal distribution centred on
//! `interval_ms_centre` with standard deviation `interval_ms_scale`, then
//! floored at [`MIN_DELAY`] so that a zero, negative, or otherwise
//! unusable sample can never turn into a tight probe loop.

use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use jitterprobe_core::RequestSpec;

/// Lower bound on every probe delay (1.337 s).
pub const MIN_DELAY: Duration = Duration::from_millis(1337);

/// Sample the delay before the next probe of `request`.
pub fn jittered_delay(request: &RequestSpec) -> Duration {
    sample_delay(
        request.interval_ms_centre,
        request.interval_ms_scale,
        &mut rand::rng(),
    )
}

/// Sample a delay in milliseconds from `N(centre_ms, scale_ms)`, floored.
///
/// A scale the distribution rejects (negative or non-finite) yields the
/// floor.
pub fn sample_delay<R: Rng + ?Sized>(centre_ms: f64, scale_ms: f64, rng: &mut R) -> Duration {
    let sample_ms = match Normal::new(centre_ms, scale_ms) {
        Ok(normal) => normal.sample(rng),
        Err(_) => f64::NAN,
    };
    clamp_secs(sample_ms / 1000.0)
}

fn clamp_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= MIN_DELAY.as_secs_f64() {
        return MIN_DELAY;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_centre_and_scale_hits_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_delay(0.0, 0.0, &mut rng), MIN_DELAY);
    }

    #[test]
    fn floor_holds_for_any_parameters() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = [
            (0.0, 0.0),
            (0.0, 1_000.0),
            (-50_000.0, 10.0),
            (1_000.0, 100_000.0),
            (300_000.0, 60_000.0),
            (1_336.0, 0.0),
            (0.0, -1.0),
            (f64::NAN, 1.0),
            (1_000.0, f64::INFINITY),
        ];
        for (centre, scale) in params {
            for _ in 0..500 {
                let d = sample_delay(centre, scale, &mut rng);
                assert!(d >= MIN_DELAY, "centre={centre} scale={scale} gave {d:?}");
            }
        }
    }

    #[test]
    fn zero_scale_is_deterministic_above_floor() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_delay(5_000.0, 0.0, &mut rng), Duration::from_secs(5));
    }

    #[test]
    fn samples_spread_around_centre() {
        let mut rng = StdRng::seed_from_u64(99);
        let samples: Vec<f64> = (0..2_000)
            .map(|_| sample_delay(60_000.0, 5_000.0, &mut rng).as_secs_f64())
            .collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 60.0).abs() < 1.0, "mean was {mean}");

        let unique: std::collections::HashSet<u128> = samples
            .iter()
            .map(|s| Duration::from_secs_f64(*s).as_millis())
            .collect();
        assert!(unique.len() > 1, "jitter should produce varied values");
    }

    #[test]
    fn huge_sample_saturates() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(sample_delay(1e300, 0.0, &mut rng), Duration::MAX);
    }

    #[test]
    fn jittered_delay_uses_request_fields() {
        let mut request = RequestSpec::get("http://localhost/");
        request.interval_ms_centre = 2_000.0;
        request.interval_ms_scale = 0.0;
        assert_eq!(jittered_delay(&request), Duration::from_secs(2));
    }
}
