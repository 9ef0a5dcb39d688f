/// Fraction of a revolution over which the magnet dominates the field.
pub const PULSE_WIDTH: f64 = 0.08;

/// Normalised magnet pass: 1.0 when `offset` (in revolutions from the closest
/// approach) is zero, decaying as a Gaussian on either side.
pub fn magnet_pulse(offset: f64) -> f64 {
    let scaled = offset / PULSE_WIDTH;
    (-(scaled * scaled)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_peaks_at_closest_approach() {
        assert_eq!(magnet_pulse(0.0), 1.0);
        assert!(magnet_pulse(0.25) < 1e-3);
        assert_eq!(magnet_pulse(0.1), magnet_pulse(-0.1));
    }
}
