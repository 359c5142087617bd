use std::path::Path;

use anyhow::{Error, Result};
use image::GrayImage;
use ndarray::Array;
use ort::value::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{span, trace, Level};

use super::model::{initialize_model, Session};
use super::pupils::median;
use crate::shapes::{LandmarkPoint, PointF32, Pupil, RectF32};

const HEIGHT: u32 = 192;
const WIDTH: u32 = 192;

/// Mesh vertex of the mouth corner on the image's left side.
const MOUTH_CORNER_IDX: usize = 61;

/// Face crop, relative to the interocular distance: the face centre sits
/// half a distance below the eyes and the face spans 2.6 distances.
const FACE_DROP: f32 = 0.5;
const FACE_SPAN: f32 = 2.6;

const PERTURBATION_SEED: u64 = 0x0bad_5eed;
/// Max crop shift of a perturbed pass, relative to the crop side.
const CROP_JITTER: f32 = 0.05;
const MIN_SCALE_JITTER: f32 = 0.95;
const MAX_SCALE_JITTER: f32 = 1.05;
/// Every pass is a full mesh inference, so perturbations are capped here.
const MAX_MESH_PASSES: u32 = 5;

/// MediaPipe face mesh, used for mouth corners.
pub struct FaceLandmarker {
    model: Session,
}

impl FaceLandmarker {
    pub fn new(model_path: &Path, threads: usize) -> Result<FaceLandmarker> {
        Ok(FaceLandmarker {
            model: initialize_model(model_path, threads)?,
        })
    }

    pub fn run(
        &self,
        img: &GrayImage,
        left: &Pupil,
        right: &Pupil,
        perturbations: u32,
        mirrored: bool,
    ) -> Result<LandmarkPoint> {
        let span = span!(Level::DEBUG, "face_landmarker");
        let _guard = span.enter();

        let crop = face_crop(left, right);
        let mut rng = StdRng::seed_from_u64(PERTURBATION_SEED);

        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut sides = Vec::new();

        let passes = mesh_passes(perturbations);
        trace!("{passes} mesh passes for {perturbations} perturbations");

        for pass in 0..passes {
            let mut bounds = crop;
            if pass > 0 {
                let dx = rng.gen_range(-CROP_JITTER..=CROP_JITTER) * crop.w;
                let dy = rng.gen_range(-CROP_JITTER..=CROP_JITTER) * crop.w;
                let side = crop.w * rng.gen_range(MIN_SCALE_JITTER..=MAX_SCALE_JITTER);
                bounds.shift(dx, dy);
                bounds.w = side;
                bounds.h = side;
            }

            let corner = self.mouth_corner(img, &bounds, mirrored)?;
            rows.push(corner.y);
            cols.push(corner.x);
            sides.push(bounds.w);
        }

        let point = LandmarkPoint::new(
            median(&mut cols).round() as i32,
            median(&mut rows).round() as i32,
            median(&mut sides),
        );
        trace!("Mouth corner (mirrored: {mirrored}): {point:?}");

        Ok(point)
    }

    /// One pass of the mesh over `bounds`, returning the corner in image
    /// coordinates.
    fn mouth_corner(&self, img: &GrayImage, bounds: &RectF32, mirrored: bool) -> Result<PointF32> {
        let crop = crop_pixels(img, bounds, mirrored);
        let input_arr =
            Array::from_shape_fn((1, HEIGHT as usize, WIDTH as usize, 3), |(_, y, x, _)| {
                crop[y * WIDTH as usize + x]
            });

        let input = Tensor::from_array(input_arr)?;
        let outputs = self.model.run(ort::inputs!["input_1" => input]?)?;
        let output = outputs["conv2d_21"].try_extract_tensor::<f32>()?;
        let mesh: Vec<f32> = output.iter().copied().collect();

        let idx = MOUTH_CORNER_IDX * 3;
        if mesh.len() < idx + 2 {
            return Err(Error::msg(format!(
                "face mesh returned {} values, expected at least {}",
                mesh.len(),
                idx + 2
            )));
        }

        Ok(to_image(bounds, mesh[idx], mesh[idx + 1], mirrored))
    }
}

/// Number of mesh inferences run for a requested perturbation count.
fn mesh_passes(perturbations: u32) -> u32 {
    perturbations.clamp(1, MAX_MESH_PASSES)
}

/// Grey crop resampled to the model input size, row major, 0. - 1. range.
fn crop_pixels(img: &GrayImage, bounds: &RectF32, mirrored: bool) -> Vec<f32> {
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let p = to_image(bounds, x as f32 + 0.5, y as f32 + 0.5, mirrored);
            pixels.push(sample(img, p) as f32 / 255.);
        }
    }
    pixels
}

/// Square face crop implied by a pair of pupils.
fn face_crop(left: &Pupil, right: &Pupil) -> RectF32 {
    let l = left.center();
    let r = right.center();
    let distance = l.distance(&r).max(1.);

    let mut center = l.midpoint(&r);
    center.y += FACE_DROP * distance;

    RectF32::square(center, FACE_SPAN * distance)
}

/// Map a point of the model input onto the source image. Mirrored crops are
/// read right to left.
fn to_image(bounds: &RectF32, x: f32, y: f32, mirrored: bool) -> PointF32 {
    let x_scale = bounds.w / WIDTH as f32;
    let y_scale = bounds.h / HEIGHT as f32;

    let img_x = if mirrored {
        bounds.right() - x * x_scale
    } else {
        bounds.left() + x * x_scale
    };

    PointF32::new(img_x, bounds.top() + y * y_scale)
}

/// Nearest pixel, black outside the image.
fn sample(img: &GrayImage, p: PointF32) -> u8 {
    if p.x < 0. || p.y < 0. {
        return 0;
    }

    let (x, y) = (p.x as u32, p.y as u32);
    if x >= img.width() || y >= img.height() {
        return 0;
    }

    img.get_pixel(x, y)[0]
}
