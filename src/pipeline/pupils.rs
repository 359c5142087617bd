use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::shapes::{Pupil, PupilRegion, RectF32};

/// Fixed so repeated runs over the same image agree.
const PERTURBATION_SEED: u64 = 0x00c0_ffee;
/// Max centre shift of a perturbed window, relative to its scale.
const CENTER_JITTER: f32 = 0.15;
const MIN_SCALE_JITTER: f32 = 0.925;
const MAX_SCALE_JITTER: f32 = 1.075;
/// Share of a window's pixels considered part of the pupil.
const DARK_FRACTION: f32 = 0.1;
/// Windows flatter than this hold no pupil.
const MIN_CONTRAST: u8 = 8;

/// Finds a pupil as the darkest blob of a search window, refined over a
/// number of randomly perturbed windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct PupilLocator;

impl PupilLocator {
    pub fn run(&self, image: &GrayImage, region: &PupilRegion) -> Option<Pupil> {
        let mut rng = StdRng::seed_from_u64(PERTURBATION_SEED);

        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut scales = Vec::new();

        for pass in 0..region.perturbations.max(1) {
            let mut window = RectF32::from_center(
                region.col as f32,
                region.row as f32,
                region.scale,
                region.scale,
            );

            // first pass looks exactly where asked
            if pass > 0 {
                let dx = rng.gen_range(-CENTER_JITTER..=CENTER_JITTER) * region.scale;
                let dy = rng.gen_range(-CENTER_JITTER..=CENTER_JITTER) * region.scale;
                let scale = region.scale * rng.gen_range(MIN_SCALE_JITTER..=MAX_SCALE_JITTER);
                window.shift(dx, dy);
                window.w = scale;
                window.h = scale;
            }

            if let Some((row, col)) = dark_centroid(image, &window) {
                rows.push(row);
                cols.push(col);
                scales.push(window.w);
            }
        }

        trace!(
            "{} of {} windows found a pupil near ({}, {})",
            rows.len(),
            region.perturbations,
            region.row,
            region.col
        );

        if rows.is_empty() {
            return None;
        }

        Some(Pupil::new(
            median(&mut rows).round() as i32,
            median(&mut cols).round() as i32,
            median(&mut scales),
        ))
    }
}

/// (row, col) centroid of the darkest pixels in `window`, weighted by how
/// dark they are and by their distance to the window centre.
fn dark_centroid(image: &GrayImage, window: &RectF32) -> Option<(f32, f32)> {
    let (left, top, right, bottom) = window.clip(image.width(), image.height())?;

    let mut values = Vec::with_capacity(((right - left) * (bottom - top)) as usize);
    for y in top..bottom {
        for x in left..right {
            values.push(image.get_pixel(x, y)[0]);
        }
    }

    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    if max - min < MIN_CONTRAST {
        return None;
    }

    let k = ((values.len() as f32 * DARK_FRACTION) as usize).min(values.len() - 1);
    let threshold = *values.select_nth_unstable(k).1;

    let center = window.center();
    let sigma = window.w / 2.;
    let two_sigma_sq = 2. * sigma * sigma;

    let (mut row_sum, mut col_sum, mut total) = (0f32, 0f32, 0f32);
    for y in top..bottom {
        for x in left..right {
            let value = image.get_pixel(x, y)[0];
            if value > threshold {
                continue;
            }

            let dx = x as f32 - center.x;
            let dy = y as f32 - center.y;
            let prior = (-(dx * dx + dy * dy) / two_sigma_sq).exp();
            let weight = ((threshold - value) as f32 + 1.) * prior;

            row_sum += y as f32 * weight;
            col_sum += x as f32 * weight;
            total += weight;
        }
    }

    if total <= 0. {
        return None;
    }

    Some((row_sum / total, col_sum / total))
}

pub(super) fn median(values: &mut [f32]) -> f32 {
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.
    } else {
        values[mid]
    }
}
