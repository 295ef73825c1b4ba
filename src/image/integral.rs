//! Summed-area and squared summed-area tables.
//!
//! Both tables are `(w + 1) x (h + 1)` with a zero first row and column, so a
//! rectangle sum is always four lookups with no bounds special-casing. The
//! plain sum is `u32` with wrapping arithmetic: any rectangle whose true sum
//! fits in 32 bits is recovered exactly even when the running table wraps.

use super::GrayView;
use crate::error::{try_alloc, DetectorError, ResourceError};

#[derive(Clone, Debug)]
pub struct IntegralImages {
    width: usize,
    height: usize,
    sum: Vec<u32>,
    sq_sum: Vec<u64>,
}

impl IntegralImages {
    pub fn from_gray(image: &GrayView<'_>) -> Result<Self, ResourceError> {
        let stride = image.w + 1;
        let len = stride * (image.h + 1);
        let mut sum: Vec<u32> = try_alloc(len, "integral image")?;
        let mut sq_sum: Vec<u64> = try_alloc(len, "squared integral image")?;
        sum.resize(stride, 0);
        sq_sum.resize(stride, 0);

        for (y, row) in image.rows().enumerate() {
            let above = y * stride;
            sum.push(0);
            sq_sum.push(0);
            let mut run = 0u32;
            let mut run_sq = 0u64;
            for (x, &px) in row.iter().enumerate() {
                let v = px as u32;
                run = run.wrapping_add(v);
                run_sq += (v * v) as u64;
                sum.push(run.wrapping_add(sum[above + x + 1]));
                sq_sum.push(run_sq + sq_sum[above + x + 1]);
            }
        }

        Ok(Self {
            width: image.w,
            height: image.h,
            sum,
            sq_sum,
        })
    }

    /// Wraps tables computed elsewhere. Both must be `(width + 1) * (height + 1)`
    /// long with a zero first row and column.
    pub fn from_raw(
        width: usize,
        height: usize,
        sum: Vec<u32>,
        sq_sum: Vec<u64>,
    ) -> Result<Self, DetectorError> {
        let len = (width + 1) * (height + 1);
        if sum.len() != len || sq_sum.len() != len {
            return Err(DetectorError::InvalidParams(format!(
                "integral tables for {width}x{height} need {len} entries, got {} and {}",
                sum.len(),
                sq_sum.len()
            )));
        }
        Ok(Self {
            width,
            height,
            sum,
            sq_sum,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width + 1
    }

    /// Sum of pixels in `[x, x + w) x [y, y + h)`.
    #[inline]
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u32 {
        let s = self.stride();
        let top = y * s;
        let bottom = (y + h) * s;
        self.sum[bottom + x + w]
            .wrapping_sub(self.sum[top + x + w])
            .wrapping_sub(self.sum[bottom + x])
            .wrapping_add(self.sum[top + x])
    }

    /// Sum of squared pixels in `[x, x + w) x [y, y + h)`.
    #[inline]
    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        let s = self.stride();
        let top = y * s;
        let bottom = (y + h) * s;
        (self.sq_sum[bottom + x + w] + self.sq_sum[top + x])
            - (self.sq_sum[top + x + w] + self.sq_sum[bottom + x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_sum(data: &[u8], w: usize, x: usize, y: usize, rw: usize, rh: usize) -> (u32, u64) {
        let mut s = 0u32;
        let mut sq = 0u64;
        for yy in y..y + rh {
            for xx in x..x + rw {
                let v = data[yy * w + xx] as u32;
                s += v;
                sq += (v * v) as u64;
            }
        }
        (s, sq)
    }

    #[test]
    fn rect_sums_match_brute_force() {
        let (w, h) = (13usize, 9usize);
        let data: Vec<u8> = (0..w * h).map(|i| ((i * 37 + 11) % 256) as u8).collect();
        let view = GrayView::new(w, h, &data).expect("view");
        let ii = IntegralImages::from_gray(&view).expect("integral");
        for (x, y, rw, rh) in [(0, 0, w, h), (3, 2, 4, 5), (12, 8, 1, 1), (5, 0, 0, 3)] {
            let (s, sq) = brute_sum(&data, w, x, y, rw, rh);
            assert_eq!(ii.rect_sum(x, y, rw, rh), s, "sum at {x},{y} {rw}x{rh}");
            assert_eq!(ii.rect_sq_sum(x, y, rw, rh), sq, "sq sum at {x},{y} {rw}x{rh}");
        }
    }

    #[test]
    fn strided_views_skip_padding() {
        let data = [1u8, 2, 99, 3, 4, 99];
        let view = GrayView::with_stride(2, 2, 3, &data).expect("view");
        let ii = IntegralImages::from_gray(&view).expect("integral");
        assert_eq!(ii.rect_sum(0, 0, 2, 2), 10);
        assert_eq!(ii.rect_sq_sum(0, 0, 2, 2), 30);
    }

    #[test]
    fn from_raw_rejects_wrong_lengths() {
        assert!(IntegralImages::from_raw(2, 2, vec![0; 9], vec![0; 9]).is_ok());
        assert!(IntegralImages::from_raw(2, 2, vec![0; 8], vec![0; 9]).is_err());
    }
}
