use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

// Lattice layout: x in the low bits, y shifted by 4, z shifted by 8,
// all folded into a 4096-entry table.
const Y_WRAP_BITS: u32 = 4;
const Y_WRAP: usize = 1 << Y_WRAP_BITS;
const Z_WRAP_BITS: u32 = 8;
const Z_WRAP: usize = 1 << Z_WRAP_BITS;
const TABLE_MASK: usize = 4095;

pub(crate) const DEFAULT_OCTAVES: u32 = 4;
pub(crate) const DEFAULT_FALLOFF: f64 = 0.5;

fn scaled_cosine(t: f64) -> f64 {
    0.5 * (1.0 - (t * PI).cos())
}

/// Smooth 3D lattice noise.
///
/// Each octave interpolates random lattice values with a cosine ease; octaves
/// are summed at double frequency and `falloff` times the amplitude of the
/// previous one, starting at 0.5. With `falloff <= 0.5` the output stays in
/// `[0, 1)`. Negative inputs are mirrored.
pub(crate) struct Noise {
    table: Vec<f64>,
    octaves: u32,
    falloff: f64,
}

impl Noise {
    #[cfg(test)]
    pub(crate) fn new(seed: u64) -> Self {
        Self::with_detail(seed, DEFAULT_OCTAVES, DEFAULT_FALLOFF)
    }

    pub(crate) fn with_detail(seed: u64, octaves: u32, falloff: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let table = (0..=TABLE_MASK).map(|_| rng.gen::<f64>()).collect();
        Self {
            table,
            octaves: octaves.max(1),
            falloff,
        }
    }

    fn at(&self, i: usize) -> f64 {
        self.table[i & TABLE_MASK]
    }

    pub(crate) fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x, y, z) = (x.abs(), y.abs(), z.abs());

        let mut xi = x.floor() as usize;
        let mut yi = y.floor() as usize;
        let mut zi = z.floor() as usize;
        let mut xf = x - x.floor();
        let mut yf = y - y.floor();
        let mut zf = z - z.floor();

        let mut sum = 0.0;
        let mut amp = 0.5;

        for _ in 0..self.octaves {
            let mut of = xi
                .wrapping_add(yi.wrapping_shl(Y_WRAP_BITS))
                .wrapping_add(zi.wrapping_shl(Z_WRAP_BITS));

            let rx = scaled_cosine(xf);
            let ry = scaled_cosine(yf);

            // near z plane
            let mut n1 = self.at(of);
            n1 += rx * (self.at(of.wrapping_add(1)) - n1);
            let mut n2 = self.at(of.wrapping_add(Y_WRAP));
            n2 += rx * (self.at(of.wrapping_add(Y_WRAP + 1)) - n2);
            n1 += ry * (n2 - n1);

            // far z plane
            of = of.wrapping_add(Z_WRAP);
            let mut n2 = self.at(of);
            n2 += rx * (self.at(of.wrapping_add(1)) - n2);
            let mut n3 = self.at(of.wrapping_add(Y_WRAP));
            n3 += rx * (self.at(of.wrapping_add(Y_WRAP + 1)) - n3);
            n2 += ry * (n3 - n2);

            n1 += scaled_cosine(zf) * (n2 - n1);

            sum += n1 * amp;
            amp *= self.falloff;

            xi = xi.wrapping_shl(1);
            yi = yi.wrapping_shl(1);
            zi = zi.wrapping_shl(1);
            xf *= 2.0;
            yf *= 2.0;
            zf *= 2.0;
            if xf >= 1.0 {
                xi = xi.wrapping_add(1);
                xf -= 1.0;
            }
            if yf >= 1.0 {
                yi = yi.wrapping_add(1);
                yf -= 1.0;
            }
            if zf >= 1.0 {
                zi = zi.wrapping_add(1);
                zf -= 1.0;
            }
        }

        sum
    }
}
