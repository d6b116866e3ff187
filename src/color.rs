#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Rgb {
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub(crate) fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    pub(crate) fn to_u8(self) -> [u8; 3] {
        let f = |c: f32| -> u8 { (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8 };
        [f(self.r), f(self.g), f(self.b)]
    }
}

/// HSB with hue in degrees and saturation/brightness in percent.
pub(crate) fn hsb(hue: f32, sat: f32, bri: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = (sat / 100.0).clamp(0.0, 1.0);
    let v = (bri / 100.0).clamp(0.0, 1.0);

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u32 % 6 {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsb(0.0, 100.0, 100.0), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(hsb(120.0, 100.0, 100.0), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(hsb(240.0, 100.0, 100.0), Rgb::new(0.0, 0.0, 1.0)));
        assert!(close(hsb(360.0, 100.0, 100.0), hsb(0.0, 100.0, 100.0)));
    }

    #[test]
    fn pastel_keeps_floor_at_brightness_times_one_minus_saturation() {
        let c = hsb(200.0, 50.0, 90.0);
        let min = c.r.min(c.g).min(c.b);
        let max = c.r.max(c.g).max(c.b);
        assert!((max - 0.9).abs() < 1e-5);
        assert!((min - 0.45).abs() < 1e-5);
    }

    #[test]
    fn to_u8_rounds_and_clamps() {
        assert_eq!(Rgb::new(1.2, 0.5, -0.1).to_u8(), [255, 128, 0]);
    }
}
