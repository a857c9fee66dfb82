// THEORY:
// The overlay marks the detected touch on the visualization frame so a viewer
// can see where the pipeline believes contact happened. The frame it draws on
// is the thresholded delta, so the marker sits on top of the surviving band.
//
// The marker is a hollow ring of fixed radius centred on the touch point, not
// the fitted ellipse: its size says nothing about the footprint. Its intensity
// sits above the default upper bound so it never blends into the band. Parts of
// the ring that fall outside the frame are clipped.

use crate::core_modules::frame::{Intensity, IntensityFrame};
use crate::core_modules::touch_estimator::TouchPoint;
use image::Luma;
use imageproc::drawing::draw_hollow_circle_mut;

/// How the touch marker is drawn onto the visualization frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub radius: u32,
    pub intensity: Intensity,
    /// Ring width in pixels, centred on `radius`.
    pub thickness: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 20,
            intensity: 100,
            thickness: 2,
        }
    }
}

/// Draws a ring around `touch` onto `frame`. Parts outside the frame are clipped.
pub fn draw_touch_marker(frame: &mut IntensityFrame, touch: &TouchPoint, style: MarkerStyle) {
    let center = (touch.x.round() as i32, touch.y.round() as i32);
    let inner = style.radius as i32 - (style.thickness as i32 / 2);
    for offset in 0..style.thickness.max(1) as i32 {
        let radius = inner + offset;
        if radius > 0 {
            draw_hollow_circle_mut(frame, center, radius, Luma([style.intensity]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::touch_estimator::Ellipse;

    fn touch_at(x: f64, y: f64) -> TouchPoint {
        TouchPoint {
            x,
            y,
            boundary_points: 150,
            area: 1000.0,
            ellipse: Ellipse {
                center: (x, y),
                semi_major: 20.0,
                semi_minor: 15.0,
                angle: 0.0,
            },
        }
    }

    #[test]
    fn ring_is_drawn_at_radius_and_center_left_untouched() {
        let mut frame = IntensityFrame::new(100, 100);
        draw_touch_marker(&mut frame, &touch_at(50.0, 50.0), MarkerStyle::default());

        assert_eq!(frame.get_pixel(50, 50)[0], 0);
        // Thickness 2 around radius 20 covers radii 19 and 20.
        assert_eq!(frame.get_pixel(70, 50)[0], 100);
        assert_eq!(frame.get_pixel(69, 50)[0], 100);
        assert_eq!(frame.get_pixel(50, 30)[0], 100);
    }

    #[test]
    fn marker_near_the_edge_is_clipped() {
        let mut frame = IntensityFrame::new(30, 30);
        draw_touch_marker(&mut frame, &touch_at(2.0, 2.0), MarkerStyle::default());
        assert_eq!(frame.get_pixel(22, 2)[0], 100);
    }
}
