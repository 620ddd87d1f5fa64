//! Drawing surface abstraction and an in-memory RGB raster implementing it.

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// Fixed-size 2D raster with clear and filled-rectangle primitives.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resets every pixel to the background.
    fn clear(&mut self);

    /// Fills the axis-aligned rectangle at `(x, y)` of size `w` x `h`.
    ///
    /// Coordinates are in pixels and may be fractional; a pixel is painted
    /// when its center lies inside the rectangle.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb);
}

/// Row-major RGB pixel buffer.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    background: Rgb,
    pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Rgb::BLACK)
    }

    pub fn with_background(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Average color of the pixel block `[x0, x1) x [y0, y1)`, clipped to the
    /// raster. Empty blocks return the background.
    pub fn average(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Rgb {
        let (x1, y1) = (x1.min(self.width), y1.min(self.height));
        if x0 >= x1 || y0 >= y1 {
            return self.background;
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for px in &self.pixels[row + x0 as usize..row + x1 as usize] {
                r += u64::from(px.0);
                g += u64::from(px.1);
                b += u64::from(px.2);
            }
        }

        let count = u64::from(x1 - x0) * u64::from(y1 - y0);
        Rgb((r / count) as u8, (g / count) as u8, (b / count) as u8)
    }
}

/// Index range of pixels whose centers fall inside `[start, start + len)`.
fn covered_span(start: f64, len: f64, limit: u32) -> (u32, u32) {
    if len <= 0.0 || !start.is_finite() || !len.is_finite() {
        return (0, 0);
    }
    let first = (start - 0.5).ceil().max(0.0);
    let last = (start + len - 0.5).ceil().clamp(0.0, f64::from(limit));
    (first as u32, last as u32)
}

impl Surface for Raster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let (x0, x1) = covered_span(x, w, self.width);
        let (y0, y1) = covered_span(y, h, self.height);
        if x0 >= x1 {
            return;
        }

        let stride = self.width as usize;
        for row in y0..y1 {
            let base = row as usize * stride;
            self.pixels[base + x0 as usize..base + x1 as usize].fill(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);

    #[test]
    fn test_fill_rect_integer_bounds() {
        let mut raster = Raster::new(8, 8);
        raster.fill_rect(2.0, 3.0, 3.0, 2.0, RED);

        assert_eq!(raster.pixel(2, 3), Some(RED));
        assert_eq!(raster.pixel(4, 4), Some(RED));
        assert_eq!(raster.pixel(5, 4), Some(Rgb::BLACK));
        assert_eq!(raster.pixel(2, 5), Some(Rgb::BLACK));
        assert_eq!(raster.pixel(1, 3), Some(Rgb::BLACK));
    }

    #[test]
    fn test_fill_rect_fractional_bounds() {
        let mut raster = Raster::new(10, 1);
        // Covers centers 1.5 and 2.5 only
        raster.fill_rect(1.2, 0.0, 1.6, 1.0, RED);
        let painted: Vec<bool> = (0..10).map(|x| raster.pixel(x, 0) == Some(RED)).collect();
        assert_eq!(
            painted,
            vec![false, true, true, false, false, false, false, false, false, false]
        );
    }

    #[test]
    fn test_fill_rect_clips_and_ignores_empty() {
        let mut raster = Raster::new(4, 4);
        raster.fill_rect(-3.0, -3.0, 100.0, 100.0, RED);
        assert!((0..4).all(|x| raster.pixel(x, 3) == Some(RED)));

        raster.clear();
        raster.fill_rect(1.0, 1.0, 0.0, 2.0, RED);
        raster.fill_rect(1.0, 1.0, -1.0, 2.0, RED);
        assert!((0..4).all(|y| (0..4).all(|x| raster.pixel(x, y) == Some(Rgb::BLACK))));
    }

    #[test]
    fn test_average_blends_block() {
        let mut raster = Raster::new(2, 2);
        raster.fill_rect(0.0, 0.0, 1.0, 2.0, Rgb(200, 100, 0));
        assert_eq!(raster.average(0, 0, 2, 2), Rgb(100, 50, 0));
        assert_eq!(raster.average(1, 1, 1, 2), Rgb::BLACK);
        assert_eq!(raster.pixel(2, 0), None);
    }
}
