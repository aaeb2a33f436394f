//! Scan-box geometry
//!
//! Recognized blocks arrive in frame coordinates, which are usually larger
//! (and often rotated) compared to the rendered camera preview. Blocks are
//! scaled into the preview's display rectangle and then tested against the
//! on-screen scan region the user aligns labels within.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::ocr::{BoundingBox, TextBlock};

/// Axis-aligned rectangle in display points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the rectangle has a positive, finite area
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Any overlap counts; rectangles that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Dimensions of the most recently observed camera frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: f32,
    pub height: f32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Horizontal and vertical scale from frame space to display space
fn scale(viewport: Option<&Rect>, frame: Option<&FrameGeometry>) -> Option<(Rect, f32, f32)> {
    let viewport = viewport.copied().filter(Rect::has_area)?;
    let frame = frame.copied().filter(FrameGeometry::is_usable)?;
    Some((viewport, viewport.width / frame.width, viewport.height / frame.height))
}

/// Map a frame-space bounding box into display coordinates
fn map_to_viewport(bbox: &BoundingBox, viewport: Option<&Rect>, frame: Option<&FrameGeometry>) -> Option<Rect> {
    let (viewport, scale_x, scale_y) = scale(viewport, frame)?;
    Some(Rect::new(
        viewport.x + bbox.x * scale_x,
        viewport.y + bbox.y * scale_y,
        bbox.width * scale_x,
        bbox.height * scale_y,
    ))
}

/// Whether `block` overlaps `scan_region` after mapping from frame to viewport space.
///
/// Any unset or degenerate input means no match.
pub fn is_block_in_scan_region(
    block: &TextBlock,
    scan_region: Option<&Rect>,
    viewport: Option<&Rect>,
    frame: Option<&FrameGeometry>,
) -> bool {
    let Some(region) = scan_region.filter(|r| r.has_area()) else {
        return false;
    };
    map_to_viewport(&block.bounding_box, viewport, frame)
        .map(|mapped| mapped.intersects(region))
        .unwrap_or(false)
}

/// Order blocks so the best candidate comes first.
///
/// Closest to the scan region center wins; ties fall back to vertical
/// position, then horizontal position, then text. Blocks that cannot be
/// mapped sort last. The order depends only on the inputs.
pub fn sort_blocks_in_scan_region(
    blocks: &mut [TextBlock],
    scan_region: Option<&Rect>,
    viewport: Option<&Rect>,
    frame: Option<&FrameGeometry>,
) {
    // Squared distance from the mapped block center to the region center
    let distance = |block: &TextBlock| -> Option<f32> {
        let (rx, ry) = scan_region?.center();
        let (bx, by) = map_to_viewport(&block.bounding_box, viewport, frame)?.center();
        Some((bx - rx).powi(2) + (by - ry).powi(2))
    };

    blocks.sort_by(|a, b| {
        let by_distance = match (distance(a), distance(b)) {
            (Some(da), Some(db)) => da.total_cmp(&db),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_distance
            .then_with(|| a.bounding_box.y.total_cmp(&b.bounding_box.y))
            .then_with(|| a.bounding_box.x.total_cmp(&b.bounding_box.x))
            .then_with(|| a.text.cmp(&b.text))
    });
}

/// Snapshot of the layout and frame geometry for one processing cycle
///
/// Any of the three inputs may be unset while the screen is still being laid
/// out; in that case no block is considered inside the scan region.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryMatcher {
    pub scan_region: Option<Rect>,
    pub viewport: Option<Rect>,
    pub frame: Option<FrameGeometry>,
}

impl GeometryMatcher {
    pub fn new(scan_region: Option<Rect>, viewport: Option<Rect>, frame: Option<FrameGeometry>) -> Self {
        Self {
            scan_region,
            viewport,
            frame,
        }
    }

    pub fn contains_block(&self, block: &TextBlock) -> bool {
        is_block_in_scan_region(
            block,
            self.scan_region.as_ref(),
            self.viewport.as_ref(),
            self.frame.as_ref(),
        )
    }

    pub fn sort_blocks(&self, blocks: &mut [TextBlock]) {
        sort_blocks_in_scan_region(
            blocks,
            self.scan_region.as_ref(),
            self.viewport.as_ref(),
            self.frame.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 800.0)
    }

    fn region() -> Rect {
        Rect::new(50.0, 300.0, 300.0, 100.0)
    }

    fn block(text: &str, x: f32, y: f32, w: f32, h: f32) -> TextBlock {
        TextBlock::new(text, BoundingBox::new(x, y, w, h))
    }

    #[test]
    fn test_block_inside_region() {
        // Frame is 2x the viewport, so the block maps to (100, 320, 100, 40)
        let frame = FrameGeometry::new(800, 1600);
        let b = block("*102*", 200.0, 640.0, 200.0, 80.0);

        assert!(is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&frame)));
    }

    #[test]
    fn test_block_outside_region() {
        let frame = FrameGeometry::new(800, 1600);
        let b = block("*102*", 200.0, 100.0, 200.0, 80.0);

        assert!(!is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&frame)));
    }

    #[test]
    fn test_partial_overlap_counts() {
        let frame = FrameGeometry::new(400, 800);
        // Straddles the top edge of the region
        let b = block("250", 100.0, 280.0, 50.0, 40.0);

        assert!(is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&frame)));
    }

    #[test]
    fn test_touching_edge_does_not_count() {
        let frame = FrameGeometry::new(400, 800);
        let b = block("250", 100.0, 260.0, 50.0, 40.0);

        assert!(!is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&frame)));
    }

    #[test]
    fn test_viewport_offset_is_applied() {
        let frame = FrameGeometry::new(400, 800);
        let shifted = Rect::new(0.0, 200.0, 400.0, 800.0);
        // Without the offset this block would sit inside the region
        let b = block("250", 100.0, 320.0, 50.0, 40.0);

        assert!(is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&frame)));
        assert!(!is_block_in_scan_region(&b, Some(&region()), Some(&shifted), Some(&frame)));
    }

    #[test]
    fn test_unset_geometry_returns_false() {
        let frame = FrameGeometry::new(400, 800);
        let b = block("250", 100.0, 320.0, 50.0, 40.0);

        assert!(!is_block_in_scan_region(&b, None, Some(&viewport()), Some(&frame)));
        assert!(!is_block_in_scan_region(&b, Some(&region()), None, Some(&frame)));
        assert!(!is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), None));

        let zero_frame = FrameGeometry::new(0, 0);
        assert!(!is_block_in_scan_region(&b, Some(&region()), Some(&viewport()), Some(&zero_frame)));
    }

    #[test]
    fn test_uniform_scaling_keeps_verdict() {
        let cases = [
            block("a", 100.0, 320.0, 50.0, 40.0),
            block("b", 10.0, 10.0, 20.0, 20.0),
            block("c", 340.0, 390.0, 30.0, 30.0),
            block("d", 100.0, 260.0, 50.0, 40.0),
        ];
        let frame = FrameGeometry::new(400, 800);
        let doubled_frame = FrameGeometry::new(800, 1600);

        for b in &cases {
            let bb = b.bounding_box;
            let doubled = block(
                &b.text,
                bb.x * 2.0,
                bb.y * 2.0,
                bb.width * 2.0,
                bb.height * 2.0,
            );
            assert_eq!(
                is_block_in_scan_region(b, Some(&region()), Some(&viewport()), Some(&frame)),
                is_block_in_scan_region(&doubled, Some(&region()), Some(&viewport()), Some(&doubled_frame)),
                "verdict changed for block {}",
                b.text
            );
        }
    }

    #[test]
    fn test_sort_prefers_region_center() {
        let frame = FrameGeometry::new(400, 800);
        // Region center is (200, 350)
        let mut blocks = vec![
            block("251", 60.0, 310.0, 40.0, 20.0),
            block("250", 180.0, 340.0, 40.0, 20.0),
        ];

        sort_blocks_in_scan_region(&mut blocks, Some(&region()), Some(&viewport()), Some(&frame));

        assert_eq!(blocks[0].text, "250");
        assert_eq!(blocks[1].text, "251");
    }

    #[test]
    fn test_sort_is_deterministic_on_ties() {
        let frame = FrameGeometry::new(400, 800);
        // Mirror images around the region center: equal distance
        let left = block("300", 150.0, 340.0, 20.0, 20.0);
        let right = block("200", 230.0, 340.0, 20.0, 20.0);

        let mut first = vec![left.clone(), right.clone()];
        let mut second = vec![right, left];
        sort_blocks_in_scan_region(&mut first, Some(&region()), Some(&viewport()), Some(&frame));
        sort_blocks_in_scan_region(&mut second, Some(&region()), Some(&viewport()), Some(&frame));

        assert_eq!(first, second);
        assert_eq!(first[0].text, "300");
    }
}
