use super::point::PointF32;

/// Axis aligned box stored by its centre, the way cascade detections are.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectF32 {
    // centerpoint
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF32 {
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> RectF32 {
        RectF32 { x: xc, y: yc, w, h }
    }

    pub fn square(center: PointF32, side: f32) -> RectF32 {
        RectF32::from_center(center.x, center.y, side, side)
    }

    pub fn center(&self) -> PointF32 {
        PointF32::new(self.x, self.y)
    }

    pub fn left(&self) -> f32 {
        self.x - self.w / 2.
    }
    pub fn right(&self) -> f32 {
        self.x + self.w / 2.
    }
    pub fn top(&self) -> f32 {
        self.y - self.h / 2.
    }
    pub fn bottom(&self) -> f32 {
        self.y + self.h / 2.
    }
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    pub fn shift(&mut self, dx: f32, dy: f32) -> RectF32 {
        self.x += dx;
        self.y += dy;

        *self
    }

    /// Intersection over union, 0 for disjoint or empty boxes.
    pub fn iou(&self, other: &RectF32) -> f32 {
        let overlap_w = (self.right().min(other.right()) - self.left().max(other.left())).max(0.);
        let overlap_h = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.);
        let overlap_area = overlap_w * overlap_h;

        let union = self.area() + other.area() - overlap_area;
        if union > 0. { overlap_area / union } else { 0. }
    }

    /// Integer pixel span `[left, right) x [top, bottom)` clipped to an image.
    /// `None` when nothing of the box lies on the image.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.left().floor().max(0.);
        let top = self.top().floor().max(0.);
        let right = self.right().ceil().min(width as f32);
        let bottom = self.bottom().ceil().min(height as f32);

        if left >= right || top >= bottom {
            return None;
        }

        Some((left as u32, top as u32, right as u32, bottom as u32))
    }
}
