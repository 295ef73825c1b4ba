/// Borrowed 8-bit grayscale view with an explicit row stride.
#[derive(Clone, Copy, Debug)]
pub struct GrayView<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> GrayView<'a> {
    /// Contiguous view over `data`; `None` when the buffer is too short.
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Option<Self> {
        Self::with_stride(w, h, w, data)
    }

    pub fn with_stride(w: usize, h: usize, stride: usize, data: &'a [u8]) -> Option<Self> {
        if stride < w {
            return None;
        }
        let needed = match h {
            0 => 0,
            _ => (h - 1) * stride + w,
        };
        (data.len() >= needed).then_some(Self { w, h, stride, data })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.h).map(move |y| self.row(y))
    }
}
