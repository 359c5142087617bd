//! Debug rendering of detections.

use image::{Rgb, RgbImage};
use imageproc::drawing;
use imageproc::rect::Rect;
use tracing::debug;

use crate::detection::{Eye, FaceDetection};

const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LEFT_EYE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const RIGHT_EYE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const MOUTH_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const MIN_EYE_RADIUS: i32 = 2;

/// Draw every face of `detection` onto `img`.
pub fn annotate(img: &mut RgbImage, detection: &FaceDetection) {
    debug!("Drawing {} faces", detection.len());

    for face in &detection.faces {
        let b = face.bounds;
        if let Some(rect) = visible_rect(img, b.x, b.y, b.width, b.height) {
            drawing::draw_hollow_rect_mut(img, rect, FACE_COLOR);
        }

        draw_eye(img, &face.left_eye, LEFT_EYE_COLOR);
        draw_eye(img, &face.right_eye, RIGHT_EYE_COLOR);

        let m = face.mouth;
        if let Some(rect) = visible_rect(img, m.x, m.y, m.width, m.height) {
            drawing::draw_hollow_rect_mut(img, rect, MOUTH_COLOR);
        }
    }
}

fn draw_eye(img: &mut RgbImage, eye: &Eye, color: Rgb<u8>) {
    let radius = eye.scale.max(MIN_EYE_RADIUS);
    let on_image = eye.x + radius >= 0
        && eye.y + radius >= 0
        && eye.x - radius < img.width() as i32
        && eye.y - radius < img.height() as i32;

    if on_image {
        drawing::draw_filled_circle_mut(img, (eye.x, eye.y), radius, color);
    }
}

/// Top-left anchored rect with sides of at least one pixel, or `None` when it
/// misses the image entirely. Negative sides extend left or up from `x, y`.
fn visible_rect(img: &RgbImage, x: i32, y: i32, width: i32, height: i32) -> Option<Rect> {
    let x = x.min(x + width);
    let y = y.min(y + height);
    let width = width.abs().max(1);
    let height = height.abs().max(1);

    if x + width <= 0
        || y + height <= 0
        || x >= img.width() as i32
        || y >= img.height() as i32
    {
        return None;
    }

    Some(Rect::at(x, y).of_size(width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Face, FaceBounds, Mouth};

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn face(x: i32, y: i32) -> Face {
        Face {
            bounds: FaceBounds {
                x,
                y,
                width: 40,
                height: 40,
            },
            mouth: Mouth {
                x: x + 12,
                y: y + 30,
                width: 16,
                height: 0,
            },
            left_eye: Eye {
                x: x + 12,
                y: y + 15,
                scale: 1,
            },
            right_eye: Eye {
                x: x + 28,
                y: y + 15,
                scale: 3,
            },
        }
    }

    #[test]
    fn test_annotate_draws_each_feature() {
        let mut img = RgbImage::new(100, 100);
        let detection = FaceDetection {
            faces: vec![face(10, 10)],
        };

        annotate(&mut img, &detection);

        // face outline
        assert_eq!(*img.get_pixel(10, 10), FACE_COLOR);
        assert_eq!(*img.get_pixel(49, 49), FACE_COLOR);
        assert_eq!(*img.get_pixel(30, 30), BLACK);

        // eyes, left one grown to the minimum radius
        assert_eq!(*img.get_pixel(22, 25), LEFT_EYE_COLOR);
        assert_eq!(*img.get_pixel(24, 25), LEFT_EYE_COLOR);
        assert_eq!(*img.get_pixel(38, 25), RIGHT_EYE_COLOR);
        assert_eq!(*img.get_pixel(41, 25), RIGHT_EYE_COLOR);

        // flat mouth still drawn one pixel high
        assert_eq!(*img.get_pixel(22, 40), MOUTH_COLOR);
        assert_eq!(*img.get_pixel(37, 40), MOUTH_COLOR);
    }

    #[test]
    fn test_annotate_skips_off_image_shapes() {
        let mut img = RgbImage::new(20, 20);
        let detection = FaceDetection {
            faces: vec![face(200, 200), face(-300, -300)],
        };

        annotate(&mut img, &detection);

        assert!(img.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_visible_rect() {
        let img = RgbImage::new(20, 20);
        assert_eq!(visible_rect(&img, -5, -5, 10, 10), Some(Rect::at(-5, -5).of_size(10, 10)));
        assert_eq!(visible_rect(&img, -10, 0, 10, 10), None);
        assert_eq!(visible_rect(&img, 20, 0, 10, 10), None);
        assert_eq!(visible_rect(&img, 3, 4, 0, 0), Some(Rect::at(3, 4).of_size(1, 1)));
    }

    #[test]
    fn test_visible_rect_negative_sides() {
        let img = RgbImage::new(20, 20);
        assert_eq!(visible_rect(&img, 15, 10, -8, 2), Some(Rect::at(7, 10).of_size(8, 2)));
        assert_eq!(visible_rect(&img, 5, 10, 4, -3), Some(Rect::at(5, 7).of_size(4, 3)));
        assert_eq!(visible_rect(&img, 3, 3, -10, 2), Some(Rect::at(-7, 3).of_size(10, 2)));
        assert_eq!(visible_rect(&img, 0, 3, -5, 2), None);
    }

    #[test]
    fn test_annotate_mouth_with_swapped_corners() {
        let mut img = RgbImage::new(100, 100);
        let mut swapped = face(10, 10);
        swapped.mouth.x = 37;
        swapped.mouth.width = -16;

        annotate(
            &mut img,
            &FaceDetection {
                faces: vec![swapped],
            },
        );

        assert_eq!(*img.get_pixel(21, 40), MOUTH_COLOR);
        assert_eq!(*img.get_pixel(30, 40), MOUTH_COLOR);
        assert_eq!(*img.get_pixel(36, 40), MOUTH_COLOR);
    }
}
