use crate::color::Rgb;
use image::RgbImage;

/// Opaque RGB surface the animation paints into, one pixel per viewport unit.
pub(crate) struct Canvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Rgb>,
}

impl Canvas {
    pub(crate) fn new(w: u32, h: u32, bg: Rgb) -> Self {
        Self {
            w,
            h,
            px: vec![bg; (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Rgb {
        self.px[self.idx(x, y)]
    }

    /// Paints a full-canvas rectangle of `c` at opacity `alpha`.
    pub(crate) fn fade(&mut self, c: Rgb, alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        for p in &mut self.px {
            *p = p.lerp(c, a);
        }
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Rgb, alpha: f32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.px[i] = self.px[i].lerp(src, alpha);
    }

    /// Alpha-blends a filled disc of the given diameter centred at `(cx, cy)`.
    ///
    /// A pixel is covered when its centre lies inside the disc. Discs too small
    /// to cover any pixel centre still mark the pixel under `(cx, cy)`.
    pub(crate) fn fill_circle(&mut self, cx: f32, cy: f32, diameter: f32, c: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let r = (diameter * 0.5).max(0.0);
        let r2 = r * r;

        let x0 = (cx - r).floor() as i32;
        let x1 = (cx + r).ceil() as i32;
        let y0 = (cy - r).floor() as i32;
        let y1 = (cy + r).ceil() as i32;

        let mut covered = false;
        for y in y0..=y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.blend_over(x, y, c, alpha);
                    covered = true;
                }
            }
        }

        if !covered {
            self.blend_over(cx.floor() as i32, cy.floor() as i32, c, alpha);
        }
    }

    /// Mean colour over the pixel rectangle `[x0,x1) × [y0,y1)`, clipped to the canvas.
    pub(crate) fn average(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Rgb {
        let x1 = x1.min(self.w);
        let y1 = y1.min(self.h);
        if x0 >= x1 || y0 >= y1 {
            return Rgb::BLACK;
        }
        let (mut r, mut g, mut b) = (0.0f32, 0.0f32, 0.0f32);
        for y in y0..y1 {
            let row = self.idx(0, y);
            for p in &self.px[row + x0 as usize..row + x1 as usize] {
                r += p.r;
                g += p.g;
                b += p.b;
            }
        }
        let n = ((x1 - x0) * (y1 - y0)) as f32;
        Rgb::new(r / n, g / n, b / n)
    }

    pub(crate) fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.w, self.h, |x, y| image::Rgb(self.get(x, y).to_u8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_converges_to_background() {
        let mut c = Canvas::new(4, 4, Rgb::new(1.0, 1.0, 1.0));
        for _ in 0..200 {
            c.fade(Rgb::BLACK, 0.1);
        }
        assert!(c.px.iter().all(|p| p.r < 1e-6 && p.g < 1e-6 && p.b < 1e-6));
    }

    #[test]
    fn single_fade_mixes_by_alpha() {
        let mut c = Canvas::new(1, 1, Rgb::new(1.0, 0.5, 0.0));
        c.fade(Rgb::BLACK, 0.1);
        let p = c.get(0, 0);
        assert!((p.r - 0.9).abs() < 1e-6);
        assert!((p.g - 0.45).abs() < 1e-6);
    }

    #[test]
    fn circle_blends_with_alpha_and_stays_local() {
        let mut c = Canvas::new(20, 20, Rgb::BLACK);
        c.fill_circle(10.0, 10.0, 4.0, Rgb::new(1.0, 0.0, 0.0), 0.3);
        assert!((c.get(10, 10).r - 0.3).abs() < 1e-6);
        assert!((c.get(9, 9).r - 0.3).abs() < 1e-6);
        assert_eq!(c.get(0, 0), Rgb::BLACK);
        assert_eq!(c.get(13, 10), Rgb::BLACK);

        c.fill_circle(10.0, 10.0, 4.0, Rgb::new(1.0, 0.0, 0.0), 0.3);
        assert!((c.get(10, 10).r - 0.51).abs() < 1e-5);
    }

    #[test]
    fn circle_is_clipped_at_canvas_edge() {
        let mut c = Canvas::new(8, 8, Rgb::BLACK);
        c.fill_circle(0.0, 0.0, 4.0, Rgb::new(0.0, 1.0, 0.0), 1.0);
        assert_eq!(c.get(0, 0), Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(c.get(7, 7), Rgb::BLACK);
    }

    #[test]
    fn tiny_circle_still_marks_a_pixel() {
        let mut c = Canvas::new(8, 8, Rgb::BLACK);
        c.fill_circle(3.9, 2.1, 0.2, Rgb::new(0.0, 0.0, 1.0), 1.0);
        assert_eq!(c.get(3, 2), Rgb::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn average_over_block() {
        let mut c = Canvas::new(2, 2, Rgb::BLACK);
        let i = c.idx(1, 1);
        c.px[i] = Rgb::new(1.0, 1.0, 1.0);
        let avg = c.average(0, 0, 2, 2);
        assert!((avg.r - 0.25).abs() < 1e-6);
        assert_eq!(c.average(2, 0, 4, 2), Rgb::BLACK);
    }

    #[test]
    fn image_matches_canvas_size() {
        let c = Canvas::new(5, 3, Rgb::new(1.0, 0.0, 0.0));
        let img = c.to_image();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(img.get_pixel(4, 2).0, [255, 0, 0]);
    }
}
