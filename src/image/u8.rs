use super::traits::{ImageView, ImageViewMut};
use image::{GrayImage, RgbImage};

/// Borrowed 8-bit view with explicit stride.
#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }
}

impl<'a> ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

/// Owned 8-bit grayscale buffer. Binary masks use 0 / 255.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayImageU8 {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImageU8 {
    /// Wrap raw row-major bytes; `data.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    /// Grayscale conversion of a colour frame.
    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let gray = image::imageops::grayscale(rgb);
        Self::from_luma(gray)
    }

    pub fn from_luma(gray: GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        Self::new(w as usize, h as usize, gray.into_raw())
    }

    /// Pixel-wise maximum, used to union binary edge masks.
    pub fn union_with(&mut self, other: &GrayImageU8) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = (*a).max(b);
        }
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

impl ImageView for GrayImageU8 {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.width
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
}

impl ImageViewMut for GrayImageU8 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_either_mask() {
        let mut a = GrayImageU8::new(3, 1, vec![0, 255, 0]);
        let b = GrayImageU8::new(3, 1, vec![255, 0, 0]);
        a.union_with(&b);
        assert_eq!(a.data(), &[255, 255, 0]);
        assert_eq!(a.count_nonzero(), 2);
    }

    #[test]
    fn clamped_reads_replicate_border() {
        let img = GrayImageU8::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(img.get_clamped(-5, 0), 1);
        assert_eq!(img.get_clamped(9, 9), 4);
        assert_eq!(img.as_view().get(1, 0), 2);
    }
}
