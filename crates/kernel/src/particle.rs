//! Particle data structures using struct-of-arrays layout.
//!
//! `ParticleState` owns five parallel sequences. Mutation goes through
//! [`ParticlesMut`], which hands out slices rather than vectors so the
//! sequences can be split across workers but never resized.

use rayon::prelude::*;

use crate::rng::XorShift32;

/// Half-range of the initial velocity on each axis.
pub const INITIAL_SPEED: f32 = 120.0;

/// Opaque alpha channel of a packed ARGB color.
const OPAQUE: u32 = 0xFF00_0000;

/// Struct-of-arrays particle storage plus the domain it lives in.
///
/// All arrays are parallel: index `i` across every array refers to the same
/// particle. The particle count is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    width: u32,
    height: u32,
    x: Vec<f32>,
    y: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    /// Packed 0xAARRGGBB colors.
    color: Vec<u32>,
}

impl ParticleState {
    /// Create `n` particles inside a `width x height` domain, seeded from `seed`.
    ///
    /// Per particle the generator is drawn in a fixed order: x, y, vx, vy, color.
    pub fn new(n: usize, width: u32, height: u32, seed: u32) -> Self {
        debug_assert!(n >= 1, "particle count must be at least 1");
        debug_assert!(width > 0 && height > 0, "domain must be non-empty");

        let mut rng = XorShift32::new(seed);
        let mut state = Self {
            width,
            height,
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
            color: Vec::with_capacity(n),
        };
        for _ in 0..n {
            state.x.push(rng.uniform(0.0, width as f32));
            state.y.push(rng.uniform(0.0, height as f32));
            state.vx.push(rng.uniform(-INITIAL_SPEED, INITIAL_SPEED));
            state.vy.push(rng.uniform(-INITIAL_SPEED, INITIAL_SPEED));
            state.color.push(OPAQUE | (rng.next_u32() & 0x00FF_FFFF));
        }
        state
    }

    /// Build a state from explicit positions and velocities (colors are opaque white).
    ///
    /// Panics if the four slices differ in length.
    pub fn from_parts(width: u32, height: u32, x: &[f32], y: &[f32], vx: &[f32], vy: &[f32]) -> Self {
        let n = x.len();
        assert!(
            y.len() == n && vx.len() == n && vy.len() == n,
            "particle sequences must have equal length"
        );
        Self {
            width,
            height,
            x: x.to_vec(),
            y: y.to_vec(),
            vx: vx.to_vec(),
            vy: vy.to_vec(),
            color: vec![0xFFFF_FFFF; n],
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// `true` if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Domain width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Domain height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Domain extents as floats, in the form the wall checks compare against.
    pub fn bounds(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Read-only view of all five sequences.
    pub fn view(&self) -> ParticleView<'_> {
        ParticleView {
            width: self.width,
            height: self.height,
            x: &self.x,
            y: &self.y,
            vx: &self.vx,
            vy: &self.vy,
            color: &self.color,
        }
    }

    /// Mutable slices of the kinematic sequences.
    pub fn particles_mut(&mut self) -> ParticlesMut<'_> {
        ParticlesMut {
            x: &mut self.x,
            y: &mut self.y,
            vx: &mut self.vx,
            vy: &mut self.vy,
        }
    }
}

/// Borrowed, read-only snapshot handed to renderers and checks.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView<'a> {
    /// Domain width.
    pub width: u32,
    /// Domain height.
    pub height: u32,
    /// X positions.
    pub x: &'a [f32],
    /// Y positions.
    pub y: &'a [f32],
    /// X velocities.
    pub vx: &'a [f32],
    /// Y velocities.
    pub vy: &'a [f32],
    /// Packed ARGB colors.
    pub color: &'a [u32],
}

impl ParticleView<'_> {
    /// Number of particles in the view.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// `true` if the view holds no particles.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One particle's mutable kinematic components.
#[derive(Debug)]
pub struct ParticleMut<'a> {
    /// X position.
    pub x: &'a mut f32,
    /// Y position.
    pub y: &'a mut f32,
    /// X velocity.
    pub vx: &'a mut f32,
    /// Y velocity.
    pub vy: &'a mut f32,
}

/// Mutable, equal-length slices over a contiguous range of particles.
///
/// Splitting yields disjoint ranges, which is what lets the parallel
/// strategies hand separate chunks to separate workers without locking.
#[derive(Debug)]
pub struct ParticlesMut<'a> {
    /// X positions.
    pub x: &'a mut [f32],
    /// Y positions.
    pub y: &'a mut [f32],
    /// X velocities.
    pub vx: &'a mut [f32],
    /// Y velocities.
    pub vy: &'a mut [f32],
}

impl<'a> ParticlesMut<'a> {
    /// Number of particles in this range.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Split into `[0, mid)` and `[mid, len)`.
    pub fn split_at(self, mid: usize) -> (Self, Self) {
        let (x0, x1) = self.x.split_at_mut(mid);
        let (y0, y1) = self.y.split_at_mut(mid);
        let (vx0, vx1) = self.vx.split_at_mut(mid);
        let (vy0, vy1) = self.vy.split_at_mut(mid);
        (
            Self { x: x0, y: y0, vx: vx0, vy: vy0 },
            Self { x: x1, y: y1, vx: vx1, vy: vy1 },
        )
    }

    /// Split into consecutive ranges of the given sizes.
    ///
    /// The sizes must sum to `self.len()`.
    pub fn split_sizes(self, sizes: &[usize]) -> Vec<Self> {
        debug_assert_eq!(sizes.iter().sum::<usize>(), self.len());
        let mut parts = Vec::with_capacity(sizes.len());
        let mut rest = self;
        for &size in sizes {
            let (head, tail) = rest.split_at(size);
            parts.push(head);
            rest = tail;
        }
        parts
    }

    /// Split into consecutive ranges of `size` particles (the last may be shorter).
    pub fn chunks(self, size: usize) -> Vec<Self> {
        assert!(size > 0, "chunk size must be positive");
        let n = self.len();
        let mut sizes = vec![size; n / size];
        if n % size != 0 {
            sizes.push(n % size);
        }
        self.split_sizes(&sizes)
    }

    /// Apply `f` to every particle in order on the calling thread.
    pub fn for_each<F>(self, mut f: F)
    where
        F: FnMut(ParticleMut<'_>),
    {
        let iter = self
            .x
            .iter_mut()
            .zip(self.y.iter_mut())
            .zip(self.vx.iter_mut())
            .zip(self.vy.iter_mut());
        for (((x, y), vx), vy) in iter {
            f(ParticleMut { x, y, vx, vy });
        }
    }

    /// Indexed parallel iterator over the particles in this range.
    pub fn par_particles(self) -> impl IndexedParallelIterator<Item = ParticleMut<'a>> {
        self.x
            .par_iter_mut()
            .zip(self.y.par_iter_mut())
            .zip(self.vx.par_iter_mut())
            .zip(self.vy.par_iter_mut())
            .map(|(((x, y), vx), vy)| ParticleMut { x, y, vx, vy })
    }
}
