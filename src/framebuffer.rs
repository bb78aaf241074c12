use scrawl_common::{Surface, surface::normalise_rect};
use std::{mem, time::Duration};

const BLACK: u32 = 0x0000_00FF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
    pub rgba: u32,
}

/// Work queued by the interpreter for the display.
#[derive(Debug, PartialEq)]
pub enum Output {
    /// Pixels that changed since the previous show.
    Show(Vec<Pixel>),
    Pause(Duration),
}

/// Fixed-size RGBA drawing target for the viewer.
///
/// Drawing only touches local memory; `show` and `pause` queue [`Output`]
/// for the caller to deliver.
pub struct Framebuffer {
    width: usize,
    height: usize,
    // layout: Y(X(rgba))
    pixels: Vec<u32>,
    shown: Vec<Option<u32>>,
    pending: Vec<Output>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BLACK; width * height],
            shown: vec![None; width * height],
            pending: Vec::new(),
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn take_output(&mut self) -> Vec<Output> {
        mem::take(&mut self.pending)
    }

    /// Forget what the display holds, so the next show sends every pixel.
    pub fn invalidate(&mut self) {
        self.shown.fill(None);
    }

    #[inline]
    fn plot(&mut self, x: i64, y: i64, rgba: u32) {
        if (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y) {
            self.pixels[y as usize * self.width + x as usize] = rgba;
        }
    }
}

impl Surface for Framebuffer {
    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32) {
        let (left, top, right, bottom) = normalise_rect(x1, y1, x2, y2);
        let clip_x = |value: i64| value.clamp(0, self.width as i64) as usize;
        let clip_y = |value: i64| value.clamp(0, self.height as i64) as usize;
        let (left, right) = (clip_x(left), clip_x(right));
        let (top, bottom) = (clip_y(top), clip_y(bottom));

        if left >= right {
            return;
        }

        for row in self.pixels.chunks_exact_mut(self.width).take(bottom).skip(top) {
            row[left..right].fill(colour);
        }
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32) {
        let (mut x, mut y) = (i64::from(x1), i64::from(y1));
        let (x2, y2) = (i64::from(x2), i64::from(y2));

        // nothing to plot if the line misses the buffer entirely
        if x.max(x2) < 0
            || y.max(y2) < 0
            || x.min(x2) >= self.width as i64
            || y.min(y2) >= self.height as i64
        {
            return;
        }

        let dx = (x2 - x).abs();
        let dy = -(y2 - y).abs();
        let (sx, sy) = (if x < x2 { 1 } else { -1 }, if y < y2 { 1 } else { -1 });
        let mut err = dx + dy;

        loop {
            self.plot(x, y, colour);
            if x == x2 && y == y2 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn show(&mut self) {
        let mut changed = Vec::new();
        for (idx, (pixel, shown)) in self.pixels.iter().zip(&mut self.shown).enumerate() {
            if *shown != Some(*pixel) {
                *shown = Some(*pixel);
                changed.push(Pixel {
                    x: idx % self.width,
                    y: idx / self.width,
                    rgba: *pixel,
                });
            }
        }

        if !changed.is_empty() {
            self.pending.push(Output::Show(changed));
        }
    }

    fn pause(&mut self, millis: u32) {
        self.pending
            .push(Output::Pause(Duration::from_millis(millis.into())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0xFFFF_FFFF;

    fn shown(output: Vec<Output>) -> Vec<Pixel> {
        match output.as_slice() {
            [Output::Show(pixels)] => pixels.clone(),
            other => panic!("expected a single show, got {other:?}"),
        }
    }

    #[test]
    fn test_first_show_sends_everything() {
        let mut framebuffer = Framebuffer::new(2, 2);
        framebuffer.show();

        let pixels = shown(framebuffer.take_output());
        assert_eq!(pixels.len(), 4);
        assert!(pixels.iter().all(|pixel| pixel.rgba == BLACK));

        framebuffer.show();
        assert!(framebuffer.take_output().is_empty());
    }

    #[test]
    fn test_show_sends_only_changes() {
        let mut framebuffer = Framebuffer::new(3, 3);
        framebuffer.show();
        framebuffer.take_output();

        framebuffer.fill_rect(1, 1, 6, 6, WHITE);
        framebuffer.show();

        let pixels = shown(framebuffer.take_output());
        assert_eq!(pixels.len(), 4);
        assert!(pixels.contains(&Pixel {
            x: 2,
            y: 2,
            rgba: WHITE
        }));
        assert_eq!(framebuffer.get(0, 0), Some(BLACK));
    }

    #[test]
    fn test_invalidate_resends_undelivered_pixels() {
        let mut framebuffer = Framebuffer::new(2, 1);
        framebuffer.fill_rect(0, 0, 2, 1, WHITE);
        framebuffer.show();

        // batch lost on the wire
        framebuffer.take_output();
        framebuffer.invalidate();

        framebuffer.fill_rect(0, 0, 2, 1, WHITE);
        framebuffer.show();

        let pixels = shown(framebuffer.take_output());
        assert_eq!(pixels.len(), 2);
        assert!(pixels.iter().all(|pixel| pixel.rgba == WHITE));
    }

    #[test]
    fn test_reversed_corner_block() {
        let mut framebuffer = Framebuffer::new(4, 4);
        framebuffer.fill_rect(2, 2, 0, 1, WHITE);

        assert_eq!(framebuffer.get(0, 1), Some(WHITE));
        assert_eq!(framebuffer.get(1, 1), Some(WHITE));
        assert_eq!(framebuffer.get(0, 2), Some(BLACK));
    }

    #[test]
    fn test_line() {
        let mut framebuffer = Framebuffer::new(4, 4);
        framebuffer.line(0, 0, 3, 3, WHITE);

        for i in 0..4 {
            assert_eq!(framebuffer.get(i, i), Some(WHITE));
        }
        assert_eq!(framebuffer.get(1, 0), Some(BLACK));

        framebuffer.line(-10, 1, 10, 1, WHITE);
        assert!((0..4).all(|x| framebuffer.get(x, 1) == Some(WHITE)));
    }

    #[test]
    fn test_pause_is_queued() {
        let mut framebuffer = Framebuffer::new(1, 1);
        framebuffer.pause(40);

        assert_eq!(
            framebuffer.take_output(),
            vec![Output::Pause(Duration::from_millis(40))]
        );
    }
}
