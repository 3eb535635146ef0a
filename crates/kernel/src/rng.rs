//! Deterministic xorshift32 generator used to seed particle attributes.

/// Scale that maps the upper 24 bits of a `u32` onto `[0, 1)`.
const INV_2_POW_24: f32 = 1.0 / 16_777_216.0;

/// Marsaglia xorshift32 generator.
///
/// The same seed always yields the same sequence, which keeps benchmark
/// inputs reproducible across runs and strategies. A seed of `0` is a fixed
/// point of the recurrence and produces zeros forever.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the state and return it.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in `[a, b)` built from the upper 24 bits of the next draw.
    #[inline]
    pub fn uniform(&mut self, a: f32, b: f32) -> f32 {
        a + (b - a) * ((self.next_u32() >> 8) as f32 * INV_2_POW_24)
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new(1)
    }
}
