use cascade_detector::image::{GrayView, IntegralImages};

/// Black image with bright `side x side` squares at the given origins.
pub fn squares_u8(width: usize, height: usize, origins: &[(usize, usize)], side: usize) -> Vec<u8> {
    let squares: Vec<(usize, usize, usize)> = origins.iter().map(|&(x, y)| (x, y, side)).collect();
    sized_squares_u8(width, height, &squares)
}

/// Black image with bright squares given as `(x, y, side)`.
pub fn sized_squares_u8(width: usize, height: usize, squares: &[(usize, usize, usize)]) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = vec![0u8; width * height];
    for &(x0, y0, side) in squares {
        assert!(x0 + side <= width && y0 + side <= height, "square out of bounds");
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img[y * width + x] = 255;
            }
        }
    }
    img
}

pub fn integral_of(data: &[u8], width: usize, height: usize) -> IntegralImages {
    let view = GrayView::new(width, height, data).expect("buffer matches dimensions");
    IntegralImages::from_gray(&view).expect("integral images")
}
