//! Orientation correction for captured photos
//!
//! Rotates a row-major pixel buffer by a quarter-turn multiple, clockwise.
//! The input is never modified; a new buffer sized for the rotated
//! dimensions is returned.

/// A quarter-turn rotation, measured clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map a sensor angle in degrees to a rotation
    ///
    /// Only 0, 90, 180 and 270 are recognised. Anything else (including
    /// negative or >= 360 values) is treated as no rotation.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            90 => Rotation::Cw90,
            180 => Rotation::Cw180,
            270 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// Whether width and height trade places
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }
}

/// Row-major pixel buffer: pixel `(x, y)` lives at `y * width + x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer<P> {
    width: usize,
    height: usize,
    pixels: Vec<P>,
}

impl<P: Copy> PixelBuffer<P> {
    /// Wrap pixels, or `None` if the length is not `width * height`
    pub fn new(width: usize, height: usize, pixels: Vec<P>) -> Option<Self> {
        if width.checked_mul(height)? != pixels.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[P] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<P> {
        self.pixels
    }

    /// Pixel at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<P> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Return a rotated copy of this buffer
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let (w, h) = (self.width, self.height);
        let src = &self.pixels;

        match rotation {
            Rotation::None => self.clone(),
            Rotation::Cw180 => {
                let mut pixels = src.clone();
                pixels.reverse();
                Self {
                    width: w,
                    height: h,
                    pixels,
                }
            }
            Rotation::Cw90 => {
                // Output is h wide: source (x, y) lands at row x, column h-1-y
                let pixels = (0..w * h)
                    .map(|i| {
                        let (row, col) = (i / h, i % h);
                        src[(h - 1 - col) * w + row]
                    })
                    .collect();
                Self {
                    width: h,
                    height: w,
                    pixels,
                }
            }
            Rotation::Cw270 => {
                // Output is h wide: source (x, y) lands at row w-1-x, column y
                let pixels = (0..w * h)
                    .map(|i| {
                        let (row, col) = (i / h, i % h);
                        src[col * w + (w - 1 - row)]
                    })
                    .collect();
                Self {
                    width: h,
                    height: w,
                    pixels,
                }
            }
        }
    }
}

/// Rotate `buffer` by `degrees` clockwise (0, 90, 180 or 270)
pub fn rotate<P: Copy>(buffer: &PixelBuffer<P>, degrees: i32) -> PixelBuffer<P> {
    buffer.rotated(Rotation::from_degrees(degrees))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 wide, 2 tall:
    /// 1 2 3
    /// 4 5 6
    fn sample() -> PixelBuffer<u8> {
        PixelBuffer::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(PixelBuffer::new(3, 2, vec![0u8; 5]).is_none());
        assert!(PixelBuffer::new(0, 0, Vec::<u8>::new()).is_some());
    }

    #[test]
    fn test_zero_degrees_is_identity() {
        let input = sample();
        assert_eq!(rotate(&input, 0), input);
    }

    #[test]
    fn test_rotate_90_clockwise() {
        let out = rotate(&sample(), 90);
        assert_eq!((out.width(), out.height()), (2, 3));
        // 4 1
        // 5 2
        // 6 3
        assert_eq!(out.pixels(), &[4, 1, 5, 2, 6, 3]);
    }

    #[test]
    fn test_rotate_90_index_law() {
        let input = sample();
        let (w, h) = (input.width(), input.height());
        let out = rotate(&input, 90);

        for y in 0..h {
            for x in 0..w {
                assert_eq!(out.pixels()[x * h + (h - 1 - y)], input.get(x, y).unwrap());
            }
        }
    }

    #[test]
    fn test_rotate_180() {
        let out = rotate(&sample(), 180);
        assert_eq!((out.width(), out.height()), (3, 2));
        assert_eq!(out.pixels(), &[6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_rotate_180_twice_restores_original() {
        let input = sample();
        assert_eq!(rotate(&rotate(&input, 180), 180), input);
    }

    #[test]
    fn test_rotate_270() {
        let input = sample();
        let (w, h) = (input.width(), input.height());
        let out = rotate(&input, 270);

        assert_eq!((out.width(), out.height()), (2, 3));
        // 3 6
        // 2 5
        // 1 4
        assert_eq!(out.pixels(), &[3, 6, 2, 5, 1, 4]);

        for y in 0..h {
            for x in 0..w {
                assert_eq!(out.pixels()[(w - 1 - x) * h + y], input.get(x, y).unwrap());
            }
        }
    }

    #[test]
    fn test_90_then_270_restores_original() {
        let input = sample();
        assert_eq!(rotate(&rotate(&input, 90), 270), input);
    }

    #[test]
    fn test_four_quarter_turns_restore_original() {
        let input = PixelBuffer::new(4, 3, (0u16..12).collect()).unwrap();
        let mut out = input.clone();
        for _ in 0..4 {
            out = rotate(&out, 90);
        }
        assert_eq!(out, input);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = sample();
        let copy = input.clone();
        let _ = rotate(&input, 90);
        let _ = rotate(&input, 180);
        assert_eq!(input, copy);
    }

    #[test]
    fn test_unrecognised_angles_fall_back_to_identity() {
        let input = sample();
        for degrees in [45, -90, 360, 450] {
            assert_eq!(rotate(&input, degrees), input);
        }
        assert_eq!(Rotation::from_degrees(-90), Rotation::None);
    }

    #[test]
    fn test_rotation_metadata() {
        assert_eq!(Rotation::from_degrees(270).degrees(), 270);
        assert!(Rotation::Cw90.swaps_dimensions());
        assert!(!Rotation::Cw180.swaps_dimensions());
    }
}
