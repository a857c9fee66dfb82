// THEORY:
// The region extractor is the spatial grouping stage. It turns the thresholded
// intensity image into a set of connected foreground objects and then decides
// which one the pipeline should care about.
//
// Key architectural principles & algorithm steps:
// 1.  **Border Following**: Non-zero pixels are treated as foreground and traced
//     with Suzuki-Abe border following (8-connectivity). Every border pixel is
//     kept; no polygon simplification is applied, because the touch estimator
//     counts boundary pixels as its confidence signal.
// 2.  **Outermost Borders Only**: Hole borders are discarded, and so is anything
//     nested inside a hole. A blob with a hole is one region, not two.
// 3.  **Lazy Output**: Regions are handed out as a one-shot iterator for the
//     current frame. Nothing is cached between frames.
// 4.  **Dominant Selection**: The region enclosing the largest area wins. A tie
//     goes to whichever region was produced first, which makes the selection
//     deterministic for a given frame.

use crate::core_modules::frame::IntensityFrame;
use crate::core_modules::region::{Region, RegionPoint};

pub mod region_extractor {
    use super::*;
    use imageproc::contours::{BorderType, find_contours};

    /// Finds the outermost boundary of every connected non-zero cluster.
    pub fn extract_regions(frame: &IntensityFrame) -> impl Iterator<Item = Region> {
        find_contours::<i32>(frame)
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .map(|contour| {
                Region::new(
                    contour
                        .points
                        .into_iter()
                        .map(|p| RegionPoint::new(p.x, p.y))
                        .collect(),
                )
            })
    }

    /// Picks the region with the strictly largest enclosed area.
    /// Returns `None` only when `regions` is empty.
    pub fn select_dominant<I>(regions: I) -> Option<Region>
    where
        I: IntoIterator<Item = Region>,
    {
        let mut best: Option<(f64, Region)> = None;
        for region in regions {
            let area = region.area();
            match &best {
                Some((best_area, _)) if area <= *best_area => {}
                _ => best = Some((area, region)),
            }
        }
        best.map(|(_, region)| region)
    }
}

#[cfg(test)]
mod tests {
    use super::region_extractor::*;
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn square_region(x: i32, y: i32, side: i32) -> Region {
        Region::new(vec![
            RegionPoint::new(x, y),
            RegionPoint::new(x + side, y),
            RegionPoint::new(x + side, y + side),
            RegionPoint::new(x, y + side),
        ])
    }

    #[test]
    fn blank_frame_has_no_regions() {
        let frame = IntensityFrame::new(64, 48);
        assert_eq!(extract_regions(&frame).count(), 0);
    }

    #[test]
    fn separate_blobs_become_separate_regions() {
        let mut frame = IntensityFrame::new(64, 48);
        draw_filled_rect_mut(&mut frame, Rect::at(2, 2).of_size(10, 10), Luma([30]));
        draw_filled_rect_mut(&mut frame, Rect::at(30, 20).of_size(20, 15), Luma([30]));
        assert_eq!(extract_regions(&frame).count(), 2);
    }

    #[test]
    fn boundary_follows_pixel_centers() {
        let mut frame = IntensityFrame::new(32, 32);
        draw_filled_rect_mut(&mut frame, Rect::at(5, 5).of_size(10, 10), Luma([20]));
        let regions: Vec<Region> = extract_regions(&frame).collect();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 81.0);
        let points = regions[0].points();
        assert!(points.contains(&RegionPoint::new(5, 5)));
        assert!(points.contains(&RegionPoint::new(14, 14)));
        assert!(points.iter().all(|p| (5..=14).contains(&p.x) && (5..=14).contains(&p.y)));
    }

    #[test]
    fn holes_and_their_contents_are_not_reported() {
        let mut frame = IntensityFrame::new(64, 64);
        // A ring...
        draw_filled_rect_mut(&mut frame, Rect::at(4, 4).of_size(50, 50), Luma([40]));
        draw_filled_rect_mut(&mut frame, Rect::at(14, 14).of_size(30, 30), Luma([0]));
        // ...with an island inside its hole.
        draw_filled_rect_mut(&mut frame, Rect::at(24, 24).of_size(8, 8), Luma([40]));

        let regions: Vec<Region> = extract_regions(&frame).collect();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 49.0 * 49.0);
    }

    #[test]
    fn dominant_of_nothing_is_none() {
        assert_eq!(select_dominant(Vec::new()), None);
    }

    #[test]
    fn dominant_of_one_is_that_one_even_without_area() {
        let dot = Region::new(vec![RegionPoint::new(1, 1)]);
        assert_eq!(select_dominant(vec![dot.clone()]), Some(dot));
    }

    #[test]
    fn dominant_is_largest_area() {
        let small = square_region(0, 0, 3);
        let large = square_region(10, 10, 8);
        let medium = square_region(30, 30, 5);
        assert_eq!(select_dominant(vec![small, large.clone(), medium]), Some(large));
    }

    #[test]
    fn ties_go_to_first_encountered() {
        let first = square_region(0, 0, 6);
        let second = square_region(20, 20, 6);
        assert_eq!(select_dominant(vec![first.clone(), second]), Some(first));
    }
}
