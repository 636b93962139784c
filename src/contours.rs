//! Border following on binary masks and the polygon helpers built on it.
//!
//! [`find_contours`] implements Suzuki–Abe topological border following:
//! every outer border and hole border of the 8-connected foreground is traced
//! once, together with its parent in the nesting hierarchy. External
//! contours are the outer borders that are not nested inside any hole.
use crate::image::{GrayImageU8, ImageView};
use serde::Serialize;

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderType {
    Outer,
    Hole,
}

#[derive(Clone, Debug)]
pub struct Contour {
    pub points: Vec<Point>,
    pub border_type: BorderType,
    /// Index of the enclosing contour, `None` for top-level borders.
    pub parent: Option<usize>,
}

impl Contour {
    pub fn is_external(&self) -> bool {
        self.border_type == BorderType::Outer && self.parent.is_none()
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }
}

// Clockwise (screen coordinates) starting east.
const DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn dir_index(from: Point, to: Point) -> usize {
    let d = (to.x - from.x, to.y - from.y);
    DIRS.iter().position(|&v| v == d).unwrap_or(0)
}

struct Labels {
    w: i32,
    h: i32,
    data: Vec<i32>,
}

impl Labels {
    // One pixel of zero padding on every side.
    fn from_mask(mask: &GrayImageU8) -> Self {
        let w = mask.width() as i32 + 2;
        let h = mask.height() as i32 + 2;
        let mut data = vec![0i32; (w * h) as usize];
        for y in 0..mask.height() {
            for (x, &v) in mask.row(y).iter().enumerate() {
                if v != 0 {
                    data[(y as i32 + 1) as usize * w as usize + x + 1] = 1;
                }
            }
        }
        Self { w, h, data }
    }

    #[inline]
    fn at(&self, p: Point) -> i32 {
        if p.x < 0 || p.y < 0 || p.x >= self.w || p.y >= self.h {
            return 0;
        }
        self.data[(p.y * self.w + p.x) as usize]
    }

    #[inline]
    fn set(&mut self, p: Point, v: i32) {
        self.data[(p.y * self.w + p.x) as usize] = v;
    }
}

/// Trace every border of the non-zero pixels in `mask`.
pub fn find_contours(mask: &GrayImageU8) -> Vec<Contour> {
    let mut f = Labels::from_mask(mask);
    let mut contours: Vec<Contour> = Vec::new();
    let mut nbd: i32 = 1;

    for y in 1..f.h - 1 {
        let mut lnbd: i32 = 1;
        for x in 1..f.w - 1 {
            let p = Point::new(x, y);
            let v = f.at(p);
            let start = if v == 1 && f.at(Point::new(x - 1, y)) == 0 {
                Some((BorderType::Outer, Point::new(x - 1, y)))
            } else if v >= 1 && f.at(Point::new(x + 1, y)) == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some((BorderType::Hole, Point::new(x + 1, y)))
            } else {
                None
            };

            if let Some((border_type, adj)) = start {
                nbd += 1;
                // Label 1 is the padded frame, a hole with no parent.
                let parent = if lnbd <= 1 {
                    None
                } else {
                    let prev = (lnbd - 2) as usize;
                    if contours[prev].border_type == border_type {
                        contours[prev].parent
                    } else {
                        Some(prev)
                    }
                };
                let points = follow_border(&mut f, p, adj, nbd);
                contours.push(Contour {
                    points,
                    border_type,
                    parent,
                });
            }

            let v = f.at(p);
            if v != 0 && v != 1 {
                lnbd = v.abs();
            }
        }
    }
    contours
}

fn follow_border(f: &mut Labels, start: Point, adj: Point, nbd: i32) -> Vec<Point> {
    let to_image = |p: Point| Point::new(p.x - 1, p.y - 1);

    // Clockwise search for the first non-zero neighbour.
    let d0 = dir_index(start, adj);
    let mut first = None;
    for k in 0..8 {
        let (dx, dy) = DIRS[(d0 + k) % 8];
        let q = Point::new(start.x + dx, start.y + dy);
        if f.at(q) != 0 {
            first = Some(q);
            break;
        }
    }
    let Some(p1) = first else {
        f.set(start, -nbd);
        return vec![to_image(start)];
    };

    let mut points = Vec::new();
    let mut p2 = p1;
    let mut p3 = start;
    loop {
        points.push(to_image(p3));
        // Counter-clockwise search starting after p2.
        let d = dir_index(p3, p2);
        let mut east_zero = false;
        let mut p4 = p3;
        for k in 1..=8 {
            let idx = (d + 8 - k) % 8;
            let (dx, dy) = DIRS[idx];
            let q = Point::new(p3.x + dx, p3.y + dy);
            if f.at(q) != 0 {
                p4 = q;
                break;
            }
            if idx == 0 {
                east_zero = true;
            }
        }
        if east_zero {
            f.set(p3, -nbd);
        } else if f.at(p3) == 1 {
            f.set(p3, nbd);
        }
        if p4 == start && p3 == p1 {
            break;
        }
        p2 = p3;
        p3 = p4;
    }
    points
}

/// Contours that are not nested inside any other component.
pub fn find_external_contours(mask: &GrayImageU8) -> Vec<Contour> {
    find_contours(mask)
        .into_iter()
        .filter(Contour::is_external)
        .collect()
}

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        acc += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (acc as f64 * 0.5).abs()
}

/// Perimeter of a closed polyline.
pub fn arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut len = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        len += (((q.x - p.x) as f64).powi(2) + ((q.y - p.y) as f64).powi(2)).sqrt();
    }
    len
}

fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / len2.sqrt()
}

fn douglas_peucker(points: &[Point], epsilon: f64, out: &mut Vec<Point>) {
    // Emits all kept points except the last one.
    if points.len() < 3 {
        out.extend_from_slice(&points[..points.len().saturating_sub(1)]);
        return;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let (mut split, mut dmax) = (0, 0.0);
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = point_segment_distance(p, first, last);
        if d > dmax {
            dmax = d;
            split = i;
        }
    }
    if dmax > epsilon {
        douglas_peucker(&points[..=split], epsilon, out);
        douglas_peucker(&points[split..], epsilon, out);
    } else {
        out.push(first);
    }
}

/// Douglas–Peucker simplification of a closed contour.
///
/// The curve is split at the point farthest from its first point and each
/// half is simplified independently.
pub fn approx_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let a = points[0];
    let far = points
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| (p.x - a.x).pow(2) + (p.y - a.y).pow(2))
        .map(|(i, _)| i)
        .unwrap_or(0);
    if far == 0 {
        return vec![a];
    }
    let mut second: Vec<Point> = points[far..].to_vec();
    second.push(a);

    let mut out = Vec::new();
    douglas_peucker(&points[..=far], epsilon, &mut out);
    douglas_peucker(&second, epsilon, &mut out);
    out
}

/// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` of a point set.
pub fn bounds(points: &[Point]) -> Option<(i32, i32, i32, i32)> {
    let first = points.first()?;
    Some(points.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
    ))
}
