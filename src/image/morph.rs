//! Binary/grayscale morphology with rectangular structuring elements.
//!
//! Pixels outside the image are ignored (neither max nor min is affected),
//! so borders do not erode away.
use super::{GrayImageU8, ImageView, ImageViewMut};

/// Rectangular structuring element, anchored at its centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Kernel {
    pub width: usize,
    pub height: usize,
}

impl Kernel {
    pub const fn rect(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn square(size: usize) -> Self {
        Self::rect(size, size)
    }

    /// `1 × len` row kernel bridging gaps along X.
    pub const fn horizontal(len: usize) -> Self {
        Self::rect(len, 1)
    }

    /// `len × 1` column kernel bridging gaps along Y.
    pub const fn vertical(len: usize) -> Self {
        Self::rect(1, len)
    }

    fn span_x(&self) -> (isize, isize) {
        let before = (self.width.max(1) / 2) as isize;
        (-before, self.width.max(1) as isize - 1 - before)
    }

    fn span_y(&self) -> (isize, isize) {
        let before = (self.height.max(1) / 2) as isize;
        (-before, self.height.max(1) as isize - 1 - before)
    }
}

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

impl Op {
    fn fold(self, a: u8, b: u8) -> u8 {
        match self {
            Op::Dilate => a.max(b),
            Op::Erode => a.min(b),
        }
    }

    fn identity(self) -> u8 {
        match self {
            Op::Dilate => 0,
            Op::Erode => 255,
        }
    }
}

// Separable: a rectangle is a row pass followed by a column pass.
fn apply(img: &GrayImageU8, k: Kernel, op: Op) -> GrayImageU8 {
    let (w, h) = (img.width(), img.height());
    let (x0, x1) = k.span_x();
    let (y0, y1) = k.span_y();

    let mut rows = GrayImageU8::filled(w, h, 0);
    for y in 0..h {
        let src = img.row(y);
        let dst = rows.row_mut(y);
        for x in 0..w as isize {
            let lo = (x + x0).max(0) as usize;
            let hi = (x + x1).min(w as isize - 1) as usize;
            dst[x as usize] = src[lo..=hi]
                .iter()
                .fold(op.identity(), |acc, &v| op.fold(acc, v));
        }
    }

    let mut out = GrayImageU8::filled(w, h, 0);
    for y in 0..h as isize {
        let lo = (y + y0).max(0) as usize;
        let hi = (y + y1).min(h as isize - 1) as usize;
        for x in 0..w {
            let mut acc = op.identity();
            for yy in lo..=hi {
                acc = op.fold(acc, rows.get(x, yy));
            }
            out.set(x, y as usize, acc);
        }
    }
    out
}

pub fn dilate(img: &GrayImageU8, k: Kernel) -> GrayImageU8 {
    apply(img, k, Op::Dilate)
}

pub fn erode(img: &GrayImageU8, k: Kernel) -> GrayImageU8 {
    apply(img, k, Op::Erode)
}

/// Dilate then erode: bridges gaps shorter than the kernel.
pub fn close(img: &GrayImageU8, k: Kernel) -> GrayImageU8 {
    erode(&dilate(img, k), k)
}

/// Erode then dilate: removes structures thinner than the kernel.
pub fn open(img: &GrayImageU8, k: Kernel) -> GrayImageU8 {
    dilate(&erode(img, k), k)
}
