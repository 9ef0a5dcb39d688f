use crate::geometry::{Point2D, Rect};
use serde::{Deserialize, Serialize};

/// Fraction of the viewport the fitted map may occupy.
pub const DEFAULT_MARGIN: f64 = 0.9;

/// Smallest extent used for a box side, so coincident points still scale.
pub const MIN_EXTENT: f64 = 1e-6;

/// Uniform scale plus translation mapping world points into a viewport:
/// `screen = point * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitTransform {
    pub scale: f64,
    pub translation: Point2D,
}

impl FitTransform {
    pub fn apply(&self, point: Point2D) -> Point2D {
        Point2D::new(
            point.x * self.scale + self.translation.x,
            point.y * self.scale + self.translation.y,
        )
    }
}

/// Fits `bounds` into a `width` x `height` viewport, centred, with `margin`.
pub fn fit_to_view(bounds: &Rect, width: f64, height: f64, margin: f64) -> FitTransform {
    let box_width = bounds.width().max(MIN_EXTENT);
    let box_height = bounds.height().max(MIN_EXTENT);
    let scale = (width / box_width).min(height / box_height) * margin;

    let mid = bounds.mid();
    let translation = Point2D::new(width / 2.0 - mid.x * scale, height / 2.0 - mid.y * scale);

    FitTransform { scale, translation }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_box_fills_limiting_axis() {
        let mut bounds = Rect::at(Point2D::new(-10.0, -10.0));
        bounds.include(Point2D::new(10.0, 10.0));
        let fit = fit_to_view(&bounds, 400.0, 200.0, DEFAULT_MARGIN);
        assert!((fit.scale - 9.0).abs() < 1e-12);
        assert_eq!(fit.apply(bounds.mid()), Point2D::new(200.0, 100.0));
    }

    #[test]
    fn box_midpoint_lands_on_viewport_center() {
        let mut bounds = Rect::at(Point2D::new(3.0, -7.0));
        bounds.include(Point2D::new(13.0, -2.0));
        let fit = fit_to_view(&bounds, 320.0, 480.0, 0.8);
        let center = fit.apply(bounds.mid());
        assert!((center.x - 160.0).abs() < 1e-9);
        assert!((center.y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_box_still_yields_finite_scale() {
        let bounds = Rect::at(Point2D::new(4.0, 4.0));
        let fit = fit_to_view(&bounds, 300.0, 300.0, DEFAULT_MARGIN);
        assert!(fit.scale.is_finite());
        assert!(fit.translation.x.is_finite());
        assert!(fit.translation.y.is_finite());

        let mut line = Rect::at(Point2D::ORIGIN);
        line.include(Point2D::new(0.0, 25.0));
        let fit = fit_to_view(&line, 300.0, 300.0, DEFAULT_MARGIN);
        assert!(fit.scale.is_finite());
        assert!((fit.scale - 300.0 / 25.0 * DEFAULT_MARGIN).abs() < 1e-9);
    }
}
