//! Loop scheduling policies for the data-parallel particle passes.
//!
//! A [`Schedule`] decides how the particle range is cut into pieces and how
//! those pieces are handed to the workers of a rayon pool:
//!
//! - `static`: contiguous blocks fixed up front. Without a chunk size each
//!   worker gets one `ceil(n / workers)` block; with a chunk size `c` the
//!   blocks of `c` are dealt round-robin, one bundle per worker.
//! - `dynamic`: pieces of exactly `c` particles (default 1), claimed by idle
//!   workers through work stealing.
//! - `guided`: blocks of `ceil(remaining / workers)`, shrinking towards a
//!   minimum of `c` (default 1).

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::particle::{ParticleMut, ParticlesMut};

/// Work distribution discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePolicy {
    /// Contiguous blocks assigned before the loop starts.
    Static,
    /// Fixed-size pieces handed out on demand.
    Dynamic,
    /// Shrinking blocks handed out on demand.
    Guided,
}

impl SchedulePolicy {
    /// Lower-case name as used in schedule strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePolicy::Static => "static",
            SchedulePolicy::Dynamic => "dynamic",
            SchedulePolicy::Guided => "guided",
        }
    }
}

/// A policy plus an optional chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schedule {
    /// Distribution policy.
    pub policy: SchedulePolicy,
    /// Chunk size; `None` means the policy's default chunking.
    pub chunk: Option<NonZeroUsize>,
}

impl Schedule {
    /// Schedule with the policy's default chunking.
    pub const fn new(policy: SchedulePolicy) -> Self {
        Self { policy, chunk: None }
    }

    /// Schedule with an explicit chunk size. A zero chunk falls back to the default.
    pub fn with_chunk(policy: SchedulePolicy, chunk: usize) -> Self {
        Self {
            policy,
            chunk: NonZeroUsize::new(chunk),
        }
    }

    /// Sizes of the consecutive blocks this schedule cuts `n` particles into.
    ///
    /// For `static` with a chunk size the blocks are later dealt round-robin;
    /// for `dynamic` every block is one stealable piece.
    pub fn plan(&self, n: usize, workers: usize) -> Vec<usize> {
        let workers = workers.max(1);
        match (self.policy, self.chunk) {
            (SchedulePolicy::Static, None) => static_sizes(n, workers),
            (SchedulePolicy::Static, Some(c)) | (SchedulePolicy::Dynamic, Some(c)) => {
                fixed_sizes(n, c.get())
            }
            (SchedulePolicy::Dynamic, None) => fixed_sizes(n, 1),
            (SchedulePolicy::Guided, c) => guided_sizes(n, workers, c.map_or(1, NonZeroUsize::get)),
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(SchedulePolicy::Static)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chunk {
            Some(c) => write!(f, "{},{}", self.policy.as_str(), c),
            None => f.write_str(self.policy.as_str()),
        }
    }
}

/// Error parsing a schedule string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleParseError {
    /// Nothing to parse.
    Empty,
    /// The policy name is not one of `static`, `dynamic`, `guided`.
    UnknownPolicy(String),
}

impl fmt::Display for ScheduleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleParseError::Empty => write!(f, "empty schedule specification"),
            ScheduleParseError::UnknownPolicy(kind) => write!(
                f,
                "unknown schedule policy '{}' (expected static, dynamic or guided)",
                kind
            ),
        }
    }
}

impl std::error::Error for ScheduleParseError {}

impl FromStr for Schedule {
    type Err = ScheduleParseError;

    /// Parse `kind`, `kind,chunk` or `kind:chunk`.
    ///
    /// An unusable chunk (not a positive integer) is logged and replaced by
    /// the policy's default chunking; only the policy name can fail the parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScheduleParseError::Empty);
        }
        let (kind, chunk) = match s.split_once([',', ':']) {
            Some((kind, chunk)) => (kind.trim(), Some(chunk.trim())),
            None => (s, None),
        };
        let policy = match kind.to_ascii_lowercase().as_str() {
            "static" => SchedulePolicy::Static,
            "dynamic" => SchedulePolicy::Dynamic,
            "guided" => SchedulePolicy::Guided,
            "" => return Err(ScheduleParseError::Empty),
            other => return Err(ScheduleParseError::UnknownPolicy(other.to_string())),
        };
        let chunk = chunk.and_then(|c| match c.parse::<usize>().ok().and_then(NonZeroUsize::new) {
            Some(c) => Some(c),
            None => {
                tracing::warn!(
                    "Ignoring invalid chunk size '{}' for {} schedule, using default chunking",
                    c,
                    policy.as_str()
                );
                None
            }
        });
        Ok(Self { policy, chunk })
    }
}

/// One contiguous block of `ceil(n / workers)` per worker (the last may be short).
pub fn static_sizes(n: usize, workers: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let stride = n.div_ceil(workers.max(1));
    fixed_sizes(n, stride)
}

/// Blocks of exactly `chunk`, except a shorter tail.
pub fn fixed_sizes(n: usize, chunk: usize) -> Vec<usize> {
    let chunk = chunk.max(1);
    let mut sizes = vec![chunk; n / chunk];
    if n % chunk != 0 {
        sizes.push(n % chunk);
    }
    sizes
}

/// Shrinking blocks of `max(ceil(remaining / workers), min_chunk)`.
pub fn guided_sizes(n: usize, workers: usize, min_chunk: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let min_chunk = min_chunk.max(1);
    let mut sizes = Vec::new();
    let mut remaining = n;
    while remaining > 0 {
        let size = remaining.div_ceil(workers).max(min_chunk).min(remaining);
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

/// Run `f` once for every particle of `particles` on `pool`, distributed per `schedule`.
///
/// Returns once every particle has been visited, which is the phase barrier
/// between integrate and bounce.
pub fn for_each_particle<F>(pool: &ThreadPool, schedule: Schedule, particles: ParticlesMut<'_>, f: F)
where
    F: Fn(ParticleMut<'_>) + Sync + Send,
{
    let n = particles.len();
    if n == 0 {
        return;
    }
    let workers = pool.current_num_threads();

    match (schedule.policy, schedule.chunk) {
        (SchedulePolicy::Dynamic, chunk) => {
            let c = chunk.map_or(1, NonZeroUsize::get);
            pool.install(|| {
                particles
                    .par_particles()
                    .with_min_len(c)
                    .with_max_len(c)
                    .for_each(&f)
            });
        }
        (SchedulePolicy::Static, Some(c)) => {
            // Deal the blocks round-robin: block k belongs to worker k % workers.
            let mut bundles: Vec<Vec<ParticlesMut<'_>>> = (0..workers).map(|_| Vec::new()).collect();
            for (k, block) in particles.chunks(c.get()).into_iter().enumerate() {
                bundles[k % workers].push(block);
            }
            pool.install(|| {
                bundles.into_par_iter().with_max_len(1).for_each(|bundle| {
                    for block in bundle {
                        block.for_each(&f);
                    }
                })
            });
        }
        (SchedulePolicy::Static, None) | (SchedulePolicy::Guided, _) => {
            let blocks = particles.split_sizes(&schedule.plan(n, workers));
            pool.install(|| {
                blocks
                    .into_par_iter()
                    .with_max_len(1)
                    .for_each(|block| block.for_each(&f))
            });
        }
    }
}
