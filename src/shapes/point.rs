#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointF32 {
    pub x: f32,
    pub y: f32,
}

impl PointF32 {
    pub fn new(x: f32, y: f32) -> PointF32 {
        PointF32 { x, y }
    }

    pub fn midpoint(&self, other: &PointF32) -> PointF32 {
        PointF32 {
            x: (self.x + other.x) / 2.,
            y: (self.y + other.y) / 2.,
        }
    }

    pub fn distance(&self, other: &PointF32) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}
