#![allow(dead_code)]

use grid_gauge::homography::perspective_transform;
use grid_gauge::image::warp::warp_perspective;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

pub const TABLE: u8 = 200;
pub const PAPER: u8 = 240;
pub const GRID_LINE: u8 = 60;
pub const STEEL: u8 = 30;

/// Grid pitch of the synthetic sheets, i.e. the expected px/cm.
pub const PITCH: u32 = 40;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A printed 1 cm grid lying on a table.
///
/// The paper covers `paper = [x0, y0, x1, y1)`; 2 px lines run edge to edge
/// every `PITCH` px, starting half a pitch inside the paper.
pub fn grid_sheet(width: u32, height: u32, paper: [u32; 4]) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([TABLE; 3]));
    let [x0, y0, x1, y1] = paper;
    fill_rect(&mut img, x0, y0, x1, y1, PAPER);
    let mut x = x0 + PITCH / 2;
    while x + 2 <= x1 {
        fill_rect(&mut img, x, y0, x + 2, y1, GRID_LINE);
        x += PITCH;
    }
    let mut y = y0 + PITCH / 2;
    while y + 2 <= y1 {
        fill_rect(&mut img, x0, y, x1, y + 2, GRID_LINE);
        y += PITCH;
    }
    img
}

pub fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, Rgb([value; 3]));
        }
    }
}

/// 640×640 top-down photo: 14×14 cm sheet with a 5×5 cm dark piece whose
/// edges sit halfway between grid lines.
pub fn bottom_view() -> RgbImage {
    let mut img = grid_sheet(640, 640, [40, 40, 600, 600]);
    fill_rect(&mut img, 160, 200, 360, 400, STEEL);
    img
}

/// 640×640 side photo: 3 cm wide, 2 cm tall piece on the same sheet.
pub fn side_view() -> RgbImage {
    let mut img = grid_sheet(640, 640, [40, 40, 600, 600]);
    fill_rect(&mut img, 160, 240, 280, 320, STEEL);
    img
}

/// Five-sided sheet: the grid of `bottom_view` with its top-right corner cut
/// off along a 160 px diagonal.
pub fn clipped_sheet() -> RgbImage {
    let mut img = grid_sheet(640, 640, [40, 40, 600, 600]);
    for y in 40..200 {
        for x in (440 + (y - 40))..600 {
            img.put_pixel(x, y, Rgb([TABLE; 3]));
        }
    }
    img
}

/// The sheet seen at a slight angle: the paper corners of an 800×800 scene
/// land on a keystoned quadrilateral in a 640×640 frame.
pub fn keystoned_sheet() -> RgbImage {
    let scene = grid_sheet(800, 800, [120, 120, 680, 680]);
    let paper = [[120.0, 120.0], [680.0, 120.0], [680.0, 680.0], [120.0, 680.0]];
    let seen = [[90.0, 80.0], [560.0, 70.0], [580.0, 570.0], [70.0, 580.0]];
    let frame_to_scene = perspective_transform(&seen, &paper).expect("non-degenerate quad");
    warp_perspective(&scene, &frame_to_scene, 640, 640)
}

pub fn save_png(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).expect("write synthetic image");
    path
}
