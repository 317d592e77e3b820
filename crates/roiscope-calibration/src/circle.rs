//! Marker cross-section center detection on a resliced image.
//!
//! Both detectors return the center as an offset from the slice center,
//! in pixels.

use glam::DVec2;
use roiscope_core::CircleDetection;

use crate::reslice::SliceImage;

/// Detects the marker center with the configured algorithm.
pub fn detect_center(
    image: &SliceImage,
    detection: CircleDetection,
    threshold: f64,
    radius_pixels: f64,
    min_pixel_count: usize,
) -> Option<DVec2> {
    match detection {
        CircleDetection::Mean => mean_center(image, threshold, min_pixel_count),
        CircleDetection::Hough { votes_needed } => {
            hough_center(image, threshold, radius_pixels, votes_needed)
        }
    }
}

/// Centroid of the pixels above `threshold`, weighted by how far they exceed it.
pub fn mean_center(image: &SliceImage, threshold: f64, min_pixel_count: usize) -> Option<DVec2> {
    let size = image.size();
    let mut sum = DVec2::ZERO;
    let mut weight = 0.0;
    let mut count = 0;
    for v in 0..size {
        for u in 0..size {
            let value = image.pixel(u, v);
            if value > threshold {
                let w = value - threshold;
                sum += DVec2::new(u as f64, v as f64) * w;
                weight += w;
                count += 1;
            }
        }
    }
    if count < min_pixel_count || weight <= 0.0 {
        return None;
    }
    Some(sum / weight - DVec2::splat(image.half_size() as f64))
}

/// Circle center by vote accumulation.
///
/// Every pixel at or above `threshold` votes for all centers a circle of
/// `radius` could have through it. The center is the mean of the cells
/// with the most votes, accepted when that count reaches `votes_needed`.
pub fn hough_center(
    image: &SliceImage,
    threshold: f64,
    radius: f64,
    votes_needed: u32,
) -> Option<DVec2> {
    let size = image.size() as i64;
    if radius <= 0.0 {
        return None;
    }
    let mut votes = vec![0u32; image.pixels().len()];
    let r = radius.round() as i64;
    let r2 = radius * radius;
    let mut vote = |x: i64, y: i64| {
        if (0..size).contains(&x) && (0..size).contains(&y) {
            votes[(y * size + x) as usize] += 1;
        }
    };

    for y in 0..size {
        for x in 0..size {
            if image.pixel(x as usize, y as usize) < threshold {
                continue;
            }
            vote(x - r, y);
            vote(x + r, y);
            for cx in (x - r).max(0)..=(x + r).min(size - 1) {
                let dx2 = ((x - cx) * (x - cx)) as f64;
                if dx2 > r2 {
                    continue;
                }
                let d = (r2 - dx2).sqrt().max(1.0);
                vote(cx, (y as f64 - d).round() as i64);
                vote(cx, (y as f64 + d).round() as i64);
            }
        }
    }

    let max = votes.iter().copied().max().unwrap_or(0);
    if max == 0 || max < votes_needed {
        return None;
    }
    let mut sum = DVec2::ZERO;
    let mut n = 0.0;
    for (index, _) in votes.iter().enumerate().filter(|&(_, &c)| c == max) {
        let index = index as i64;
        sum += DVec2::new((index % size) as f64, (index / size) as f64);
        n += 1.0;
    }
    log::trace!("hough center with {max} votes over {n} cells");
    Some(sum / n - DVec2::splat(image.half_size() as f64))
}
