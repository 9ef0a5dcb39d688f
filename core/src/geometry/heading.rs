use std::f64::consts::PI;

/// Accuracy (degrees) above which the compass asks for a figure-eight calibration.
pub const CALIBRATION_ACCURACY_LIMIT: f64 = 20.0;

/// Wraps any heading into `[0, 360)`.
pub fn normalize_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Compass bearing (0 = north, clockwise) to a counter-clockwise math angle
/// measured from +X.
pub fn heading_to_math_radians(heading: f64) -> f64 {
    (90.0 - heading) * PI / 180.0
}

/// Rounds to two decimal places, the precision recorded in waypoints.
pub fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Negative accuracy marks an invalid reading; large values mean interference.
pub fn calibration_needed(accuracy: f64) -> bool {
    accuracy < 0.0 || accuracy > CALIBRATION_ACCURACY_LIMIT
}

const POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass abbreviation for a heading, used for map labels.
pub fn compass_point(heading: f64) -> &'static str {
    let normalized = normalize_heading(heading);
    let index = ((normalized + 11.25) / 22.5).floor() as usize % POINTS.len();
    POINTS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_into_range() {
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(0.0), 0.0);
    }

    #[test]
    fn north_and_east_map_to_math_angles() {
        assert_eq!(heading_to_math_radians(0.0), 90.0 * PI / 180.0);
        assert_eq!(heading_to_math_radians(90.0), 0.0);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_centi(1.23456), 1.23);
        assert_eq!(round_centi(0.1178 * 3.0), 0.35);
    }

    #[test]
    fn calibration_flag_follows_accuracy() {
        assert!(calibration_needed(-1.0));
        assert!(calibration_needed(25.0));
        assert!(!calibration_needed(20.0));
        assert!(!calibration_needed(5.0));
    }

    #[test]
    fn compass_points_cover_the_rose() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(350.0), "N");
        assert_eq!(compass_point(45.0), "NE");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(281.25), "WNW");
    }
}
