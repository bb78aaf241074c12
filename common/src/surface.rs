//! The drawing target driven by the interpreter.

/// Something the interpreter can draw onto.
///
/// Colours are packed RGBA words (`0xRRGGBBAA`). Only [`fill_rect`] is
/// mandatory; a surface that cannot draw lines or has nothing to present
/// keeps the default no-ops.
///
/// [`fill_rect`]: Surface::fill_rect
pub trait Surface {
    /// Fill the half-open box between corners `(x1, y1)` and `(x2, y2)`. The
    /// second corner may lie up or left of the first.
    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32);

    fn line(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32, _colour: u32) {}

    /// Present everything drawn so far.
    fn show(&mut self) {}

    fn pause(&mut self, _millis: u32) {}
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32) {
        (**self).fill_rect(x1, y1, x2, y2, colour);
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: u32) {
        (**self).line(x1, y1, x2, y2, colour);
    }

    fn show(&mut self) {
        (**self).show();
    }

    fn pause(&mut self, millis: u32) {
        (**self).pause(millis);
    }
}

/// Order the corners of a box whose second corner may precede the first.
///
/// Returns `(left, top, right, bottom)` as a half-open span, widened to
/// `i64` for callers that clip against `usize` bounds.
pub fn normalise_rect(x1: i32, y1: i32, x2: i32, y2: i32) -> (i64, i64, i64, i64) {
    let (x1, y1, x2, y2) = (
        i64::from(x1),
        i64::from(y1),
        i64::from(x2),
        i64::from(y2),
    );

    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_rect() {
        assert_eq!(normalise_rect(1, 2, 4, 6), (1, 2, 4, 6));
        assert_eq!(normalise_rect(5, 5, 3, 0), (3, 0, 5, 5));
        assert_eq!(
            normalise_rect(i32::MIN, 0, i32::MAX, 1),
            (i64::from(i32::MIN), 0, i64::from(i32::MAX), 1)
        );
    }
}
