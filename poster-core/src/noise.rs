//! Seeded lattice value noise.
//!
//! Smooth noise in `[0, 1)` used for particle drift and grain colouring. The
//! lattice is built from a [`RandomStream`], so two generators with the same
//! seed return identical values everywhere.

use crate::stream::RandomStream;

const TABLE: usize = 256;

/// Smooth 3-D value noise over an integer lattice.
#[derive(Debug, Clone)]
pub struct ValueNoise {
    perm: [u8; TABLE * 2],
    values: [f64; TABLE],
}

impl ValueNoise {
    /// Build the lattice for `seed`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(seed: u32) -> Self {
        let mut stream = RandomStream::new(seed);
        let mut p: [u8; TABLE] = std::array::from_fn(|i| i as u8);
        // Fisher-Yates
        for i in (1..TABLE).rev() {
            let j = stream.index(i + 1);
            p.swap(i, j);
        }
        let perm = std::array::from_fn(|i| p[i & (TABLE - 1)]);
        let values = std::array::from_fn(|_| stream.next_f64());
        Self { perm, values }
    }

    /// Sample the noise at `(x, y, z)`. Result is in `[0, 1)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, yi, zi) = (x.floor() as i64, y.floor() as i64, z.floor() as i64);
        let (u, v, w) = (fade(x - x.floor()), fade(y - y.floor()), fade(z - z.floor()));

        let c000 = self.lattice(xi, yi, zi);
        let c100 = self.lattice(xi + 1, yi, zi);
        let c010 = self.lattice(xi, yi + 1, zi);
        let c110 = self.lattice(xi + 1, yi + 1, zi);
        let c001 = self.lattice(xi, yi, zi + 1);
        let c101 = self.lattice(xi + 1, yi, zi + 1);
        let c011 = self.lattice(xi, yi + 1, zi + 1);
        let c111 = self.lattice(xi + 1, yi + 1, zi + 1);

        let x00 = lerp(c000, c100, u);
        let x10 = lerp(c010, c110, u);
        let x01 = lerp(c001, c101, u);
        let x11 = lerp(c011, c111, u);
        lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
    }

    /// Two-dimensional convenience wrapper.
    #[must_use]
    pub fn sample2(&self, x: f64, y: f64) -> f64 {
        self.sample(x, y, 0.0)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lattice(&self, x: i64, y: i64, z: i64) -> f64 {
        let x = x.rem_euclid(TABLE as i64) as usize;
        let y = y.rem_euclid(TABLE as i64) as usize;
        let z = z.rem_euclid(TABLE as i64) as usize;
        let h = self.perm[usize::from(self.perm[usize::from(self.perm[x]) + y]) + z];
        self.values[usize::from(h)]
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
