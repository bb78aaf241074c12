use crate::{
    codec::rgba_to_grey,
    raster::RasterBuffer,
    surface::{Surface, normalise_rect},
};

/// Largest width or height a canvas grows to by default.
pub const DEFAULT_DIMENSION_LIMIT: usize = 1 << 16;

/// Grayscale drawing target that grows as blocks reach past its edges.
///
/// Rows are stored separately and each one is extended on demand. Blocks
/// take their grey level from the top byte of the colour word. Lines are
/// not drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    // layout: Y(X(sample))
    rows: Vec<Vec<u8>>,
    width: usize,
    limit: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_limit(width, height, DEFAULT_DIMENSION_LIMIT)
    }

    /// A canvas that never grows past `limit` in either dimension.
    pub fn with_limit(width: usize, height: usize, limit: usize) -> Self {
        let (width, height) = (width.min(limit), height.min(limit));
        Self {
            rows: vec![vec![0; width]; height],
            width,
            limit,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y)?.get(x).copied()
    }

    /// Extend to at least `width` by `height`, filling new cells with black.
    pub fn grow_to(&mut self, width: usize, height: usize) {
        let (width, height) = (width.min(self.limit), height.min(self.limit));

        if width > self.width {
            debug!(from = self.width, to = width, "growing canvas width");
            self.width = width;
            for row in &mut self.rows {
                row.resize(width, 0);
            }
        }

        if height > self.rows.len() {
            debug!(from = self.rows.len(), to = height, "growing canvas height");
            self.rows.resize_with(height, || vec![0; self.width]);
        }
    }

    pub fn into_raster(self) -> RasterBuffer {
        let (width, height) = (self.width as u32, self.rows.len() as u32);
        RasterBuffer::new(width, height, self.rows.concat())
            .expect("canvas rows always match the canvas width")
    }
}

impl Surface for Canvas {
    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32) {
        let (left, top, right, bottom) = normalise_rect(x1, y1, x2, y2);
        let limit = self.limit as i64;

        if right > limit || bottom > limit {
            warn!(x1, y1, x2, y2, limit, "block clipped at canvas limit");
        }

        let clip = |value: i64| value.clamp(0, limit) as usize;
        let (left, top, right, bottom) = (clip(left), clip(top), clip(right), clip(bottom));
        if left >= right || top >= bottom {
            return;
        }

        self.grow_to(right, bottom);

        let grey = rgba_to_grey(colour);
        for row in &mut self.rows[top..bottom] {
            row[left..right].fill(grey);
        }
    }
}
