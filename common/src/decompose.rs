//! Greedy decomposition of a raster into solid-colour rectangles.
//!
//! The scan visits pixels in raster order. Each uncovered pixel starts a
//! rectangle: the run of equal samples along its row gives a candidate
//! width, the run along its column gives the height, and the width is then
//! shrunk to the widest prefix in which every row of that height is solid.
//! Width is extended first and height validated afterwards, so the result
//! is not the minimum number of rectangles.

use crate::raster::RasterBuffer;

/// Half-open box `[x1, x2) × [y1, y2)` filled with one grey level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub colour: u8,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rectangle {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x1..self.x2).contains(&x) && (self.y1..self.y2).contains(&y)
    }
}

/// Marks which pixels of a raster already belong to an emitted rectangle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub fn for_raster(raster: &RasterBuffer) -> Self {
        Self::new(raster.width(), raster.height())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)]
    }

    pub fn mark(&mut self, x: u32, y: u32) {
        let idx = self.index(x, y);
        self.cells[idx] = true;
    }

    pub fn cover(&mut self, rect: &Rectangle) {
        for y in rect.y1..rect.y2 {
            let start = self.index(rect.x1, y);
            self.cells[start..start + rect.width() as usize].fill(true);
        }
    }

    pub fn uncovered(&self) -> usize {
        self.cells.iter().filter(|covered| !**covered).count()
    }
}

/// Decompose the whole raster.
pub fn decompose(raster: &RasterBuffer) -> Vec<Rectangle> {
    decompose_masked(raster, CoverageMask::for_raster(raster))
}

/// Decompose only the pixels not already marked in `mask`.
///
/// Covered pixels bound every run, so the emitted rectangles partition
/// exactly the pixels that were uncovered on entry.
///
/// # Panics
///
/// Panics if the mask dimensions differ from the raster's.
pub fn decompose_masked(raster: &RasterBuffer, mut mask: CoverageMask) -> Vec<Rectangle> {
    assert_eq!(
        (mask.width(), mask.height()),
        (raster.width(), raster.height()),
        "coverage mask does not match raster"
    );

    let (width, height) = (raster.width(), raster.height());
    let mut blocks = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if mask.is_covered(x, y) {
                continue;
            }

            let colour = raster.get(x, y);
            let solid = |cx: u32, cy: u32| !mask.is_covered(cx, cy) && raster.get(cx, cy) == colour;

            let run_x = (x..width).take_while(|&cx| solid(cx, y)).count() as u32;
            let run_y = (y..height).take_while(|&cy| solid(x, cy)).count() as u32;
            let solid_width = solid_prefix(x, y, run_x, run_y, solid);

            let rect = Rectangle {
                colour,
                x1: x,
                y1: y,
                x2: x + solid_width,
                y2: y + run_y,
            };

            mask.cover(&rect);
            blocks.push(rect);
        }
    }

    blocks
}

/// Widest prefix of the `run_x` by `run_y` candidate in which every cell
/// is solid. Column `x` is always solid, so the result is at least 1.
fn solid_prefix(x: u32, y: u32, run_x: u32, run_y: u32, solid: impl Fn(u32, u32) -> bool) -> u32 {
    for cx in x..x + run_x {
        if !(y..y + run_y).all(|cy| solid(cx, cy)) {
            return cx - x;
        }
    }

    run_x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(rows: &[&[u8]]) -> RasterBuffer {
        let samples = rows.concat();
        RasterBuffer::new(rows[0].len() as u32, rows.len() as u32, samples).unwrap()
    }

    fn assert_partition(raster: &RasterBuffer, blocks: &[Rectangle]) {
        let mut hits = vec![0u32; raster.samples().len()];
        for rect in blocks {
            assert!(rect.x1 < rect.x2 && rect.y1 < rect.y2, "empty rectangle {rect:?}");
            for y in rect.y1..rect.y2 {
                for x in rect.x1..rect.x2 {
                    assert_eq!(raster.get(x, y), rect.colour, "{rect:?} is not solid");
                    hits[(y * raster.width() + x) as usize] += 1;
                }
            }
        }

        assert!(hits.iter().all(|hits| *hits == 1), "cells not covered exactly once: {hits:?}");
        let area: u64 = blocks.iter().map(Rectangle::area).sum();
        assert_eq!(area, raster.samples().len() as u64);
    }

    #[test]
    fn test_uniform_raster_is_one_block() {
        let raster = RasterBuffer::filled(4, 4, 0);
        let blocks = decompose(&raster);

        assert_eq!(
            blocks,
            vec![Rectangle {
                colour: 0,
                x1: 0,
                y1: 0,
                x2: 4,
                y2: 4
            }]
        );
    }

    #[test]
    fn test_isolated_pixel() {
        let raster = raster(&[&[0, 0, 0], &[0, 9, 0], &[0, 0, 0]]);
        let blocks = decompose(&raster);

        assert_partition(&raster, &blocks);
        assert!(blocks.contains(&Rectangle {
            colour: 9,
            x1: 1,
            y1: 1,
            x2: 2,
            y2: 2
        }));
    }

    #[test]
    fn test_width_shrinks_to_solid_prefix() {
        let raster = raster(&[&[5, 5, 5, 5], &[5, 5, 0, 5]]);
        let blocks = decompose(&raster);

        assert_eq!(
            blocks[0],
            Rectangle {
                colour: 5,
                x1: 0,
                y1: 0,
                x2: 2,
                y2: 2
            }
        );
        assert_partition(&raster, &blocks);
    }

    #[test]
    fn test_runs_stop_at_covered_cells() {
        // the tall block at column 2 is emitted first and must not be
        // swallowed again by the row-1 run starting at column 0
        let raster = raster(&[&[1, 0, 3, 3], &[3, 3, 3, 3], &[1, 1, 3, 3]]);
        let blocks = decompose(&raster);

        assert_partition(&raster, &blocks);
        assert_eq!(
            blocks.iter().find(|rect| rect.contains(0, 1)).copied(),
            Some(Rectangle {
                colour: 3,
                x1: 0,
                y1: 1,
                x2: 2,
                y2: 2
            })
        );
    }

    #[test]
    fn test_checkerboard_partition() {
        let raster = raster(&[&[0, 255, 0, 255], &[255, 0, 255, 0], &[0, 255, 0, 255]]);
        let blocks = decompose(&raster);

        assert_eq!(blocks.len(), 12);
        assert_partition(&raster, &blocks);
    }

    #[test]
    fn test_scan_order() {
        let raster = raster(&[&[0, 0, 7], &[7, 7, 7]]);
        let blocks = decompose(&raster);

        assert_partition(&raster, &blocks);
        let origins: Vec<_> = blocks.iter().map(|rect| (rect.y1, rect.x1)).collect();
        let mut sorted = origins.clone();
        sorted.sort();
        assert_eq!(origins, sorted);
    }

    #[test]
    fn test_masked_cells_are_skipped() {
        let raster = raster(&[&[0, 0, 0], &[0, 0, 0]]);
        let mut mask = CoverageMask::for_raster(&raster);
        mask.mark(1, 0);
        mask.mark(1, 1);

        let blocks = decompose_masked(&raster, mask);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|rect| rect.width() == 1 && rect.height() == 2));
        assert!(!blocks.iter().any(|rect| rect.contains(1, 0)));
    }

    #[test]
    fn test_mask_cover() {
        let mut mask = CoverageMask::new(3, 2);
        mask.cover(&Rectangle {
            colour: 0,
            x1: 1,
            y1: 0,
            x2: 3,
            y2: 2,
        });

        assert_eq!(mask.uncovered(), 2);
        assert!(!mask.is_covered(0, 1));
        assert!(mask.is_covered(2, 1));
    }

    #[test]
    fn test_empty_raster() {
        let raster = RasterBuffer::filled(0, 0, 0);
        assert!(decompose(&raster).is_empty());
    }
}
