//! Scale planner: the geometric sequence of detection-window sizes and the
//! scan grid at each size.
//!
//! Window sizes start at `min_size * initial_scale` and grow by
//! `scale_factor`. The sequence ends before the first size above
//! `max_size * initial_scale`, or at the first size whose scan grid would be
//! empty.

use super::params::DetectorParams;
use serde::Serialize;

/// Per-scale geometry of the cascade window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDescriptor {
    /// Window size relative to the cascade's canonical footprint.
    pub scale: f32,
    pub scaled_window_width: u32,
    pub scaled_window_height: u32,
    pub scaled_area: u32,
}

/// One planned scale: its descriptor plus the anchor grid it scans.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleLevel {
    pub descriptor: ScaleDescriptor,
    pub window_size: f32,
    pub grid_width: u32,
    pub grid_height: u32,
    pub step: u32,
}

impl ScaleLevel {
    #[inline]
    pub fn anchor_count(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    /// Top-left pixel of anchor `index` in row-major grid order.
    #[inline]
    pub fn anchor_origin(&self, index: usize) -> (usize, usize) {
        let gw = self.grid_width as usize;
        let step = self.step as usize;
        ((index % gw) * step, (index / gw) * step)
    }
}

/// Plans every scale for a scanned image of `scanned_width x scanned_height`
/// and a cascade window of `window_width x window_height`.
pub fn plan_scales(
    params: &DetectorParams,
    scanned_width: usize,
    scanned_height: usize,
    window_width: u32,
    window_height: u32,
) -> Vec<ScaleLevel> {
    let start_size = params.min_size * params.initial_scale;
    let max_size = params.max_size * params.initial_scale;
    let step = params.step.max(1) as i64;

    let mut levels = Vec::new();
    let mut factor = 1.0f32;
    loop {
        let size = start_size * factor;
        if size > max_size {
            break;
        }
        let scale = size / window_width as f32;
        let scaled_window_width = (window_width as f32 * scale) as u32;
        let scaled_window_height = (window_height as f32 * scale) as u32;

        let grid_w = scanned_width as i64 - scaled_window_width as i64;
        let grid_h = scanned_height as i64 - scaled_window_height as i64;
        if grid_w <= 0 || grid_h <= 0 || scaled_window_width == 0 || scaled_window_height == 0 {
            break;
        }

        levels.push(ScaleLevel {
            descriptor: ScaleDescriptor {
                scale,
                scaled_window_width,
                scaled_window_height,
                scaled_area: scaled_window_width * scaled_window_height,
            },
            window_size: size,
            grid_width: ((grid_w + 1) / step + 1) as u32,
            grid_height: ((grid_h + 1) / step + 1) as u32,
            step: step as u32,
        });
        if !(params.scale_factor > 1.0) {
            break;
        }
        factor *= params.scale_factor;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_size: f32, max_size: f32, initial_scale: f32, scale_factor: f32) -> DetectorParams {
        DetectorParams {
            min_size,
            max_size,
            initial_scale,
            scale_factor,
            ..Default::default()
        }
    }

    #[test]
    fn portrait_frame_plans_four_increasing_scales() {
        let p = params(360.0, 720.0, 0.5, 1.2);
        let (w, h) = p.scanned_dims(1440, 2560);
        let levels = plan_scales(&p, w, h, 24, 24);
        let sizes: Vec<f32> = levels.iter().map(|l| l.window_size).collect();
        assert_eq!(levels.len(), 4, "sizes {sizes:?}");
        for (got, want) in sizes.iter().zip([180.0, 216.0, 259.2, 311.04]) {
            assert!((got - want).abs() < 1e-3, "size {got} vs {want}");
        }
        assert!(levels
            .windows(2)
            .all(|pair| pair[0].descriptor.scale < pair[1].descriptor.scale));
        // next size (373.2) exceeds max_size * initial_scale = 360
        assert!(sizes[3] * 1.2 > 360.0);

        let first = levels[0];
        assert_eq!(first.descriptor.scaled_window_width, 180);
        assert_eq!(first.descriptor.scaled_area, 180 * 180);
        assert_eq!(first.grid_width, (720 - 180 + 1) / 2 + 1);
        assert_eq!(first.grid_height, (1280 - 180 + 1) / 2 + 1);
    }

    #[test]
    fn stops_when_grid_becomes_empty() {
        let p = params(24.0, 1000.0, 1.0, 1.5);
        let levels = plan_scales(&p, 100, 100, 24, 24);
        // 24, 36, 54, 81 fit; 121.5 does not
        assert_eq!(levels.len(), 4);
        assert!(levels.iter().all(|l| l.grid_width > 0 && l.grid_height > 0));
    }

    #[test]
    fn non_square_window_keeps_aspect() {
        let p = params(40.0, 40.0, 1.0, 1.2);
        let levels = plan_scales(&p, 200, 200, 20, 10);
        assert_eq!(levels.len(), 1);
        let d = levels[0].descriptor;
        assert_eq!((d.scaled_window_width, d.scaled_window_height), (40, 20));
        assert_eq!(levels[0].grid_height, (180 + 1) / 2 + 1);
    }

    #[test]
    fn window_larger_than_image_plans_nothing() {
        let p = params(64.0, 128.0, 1.0, 1.2);
        assert!(plan_scales(&p, 48, 48, 24, 24).is_empty());
    }

    #[test]
    fn anchor_origins_follow_step() {
        let p = params(8.0, 8.0, 1.0, 1.2);
        let level = plan_scales(&p, 32, 32, 8, 8)[0];
        assert_eq!(level.grid_width, 13);
        assert_eq!(level.anchor_origin(0), (0, 0));
        assert_eq!(level.anchor_origin(14), (2, 2));
    }
}
