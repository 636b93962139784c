use serde::Serialize;

/// Segment between two edge pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub p0: [i32; 2],
    pub p1: [i32; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl LineSegment {
    pub fn new(p0: [i32; 2], p1: [i32; 2]) -> Self {
        Self { p0, p1 }
    }

    pub fn length(&self) -> f32 {
        let dx = (self.p1[0] - self.p0[0]) as f32;
        let dy = (self.p1[1] - self.p0[1]) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Vertical if the x-delta is below `tol_px`, otherwise horizontal if the
    /// y-delta is, otherwise neither.
    pub fn orientation(&self, tol_px: i32) -> Option<Orientation> {
        if (self.p0[0] - self.p1[0]).abs() < tol_px {
            Some(Orientation::Vertical)
        } else if (self.p0[1] - self.p1[1]).abs() < tol_px {
            Some(Orientation::Horizontal)
        } else {
            None
        }
    }
}

/// Segments split by orientation; diagonal ones are dropped.
#[derive(Clone, Debug, Default)]
pub struct Classified {
    pub vertical: Vec<LineSegment>,
    pub horizontal: Vec<LineSegment>,
}

impl Classified {
    /// Both endpoint x-coordinates of every vertical segment.
    pub fn vertical_xs(&self) -> Vec<i32> {
        self.vertical.iter().flat_map(|s| [s.p0[0], s.p1[0]]).collect()
    }

    /// Both endpoint y-coordinates of every horizontal segment.
    pub fn horizontal_ys(&self) -> Vec<i32> {
        self.horizontal.iter().flat_map(|s| [s.p0[1], s.p1[1]]).collect()
    }
}

pub fn classify_segments(segments: &[LineSegment], tol_px: i32) -> Classified {
    let mut out = Classified::default();
    for s in segments {
        match s.orientation(tol_px) {
            Some(Orientation::Vertical) => out.vertical.push(*s),
            Some(Orientation::Horizontal) => out.horizontal.push(*s),
            None => {}
        }
    }
    out
}
