//! Per-particle integration and wall reflection.
//!
//! Every strategy funnels through these functions so that the arithmetic,
//! and therefore the bits, are the same whichever way the loop is scheduled.

use crate::particle::{ParticleMut, ParticlesMut};

/// Fixed step length in seconds.
pub const DT: f32 = 1.0 / 60.0;

/// Explicit Euler position update.
#[inline]
pub fn integrate_particle(p: &mut ParticleMut<'_>, dt: f32) {
    *p.x += *p.vx * dt;
    *p.y += *p.vy * dt;
}

/// Reflect one axis against `[0, limit]`.
///
/// Clamps the position onto the violated wall and negates the velocity.
/// Returns `true` if a reflection happened.
#[inline]
pub fn reflect_axis(pos: &mut f32, vel: &mut f32, limit: f32) -> bool {
    let mut hit = false;
    if *pos < 0.0 {
        *pos = 0.0;
        *vel = -*vel;
        hit = true;
    }
    if *pos > limit {
        *pos = limit;
        *vel = -*vel;
        hit = true;
    }
    hit
}

/// Reflect both axes independently; a corner hit flips both velocities.
#[inline]
pub fn bounce_particle(p: &mut ParticleMut<'_>, width: f32, height: f32) {
    reflect_axis(p.x, p.vx, width);
    reflect_axis(p.y, p.vy, height);
}

/// Sequential integration pass.
pub fn integrate(particles: ParticlesMut<'_>, dt: f32) {
    particles.for_each(|mut p| integrate_particle(&mut p, dt));
}

/// Sequential bounce pass.
pub fn bounce(particles: ParticlesMut<'_>, width: f32, height: f32) {
    particles.for_each(|mut p| bounce_particle(&mut p, width, height));
}

/// `pos += vel * dt` over one axis of a contiguous range.
///
/// Straight-line loop over two slices with no cross-lane dependency, so the
/// compiler is free to vectorize it at whatever width the target offers.
#[inline]
pub fn integrate_lanes(pos: &mut [f32], vel: &[f32], dt: f32) {
    debug_assert_eq!(pos.len(), vel.len());
    for (p, v) in pos.iter_mut().zip(vel) {
        *p += *v * dt;
    }
}

/// [`reflect_axis`] over one axis of a contiguous range.
#[inline]
pub fn reflect_lanes(pos: &mut [f32], vel: &mut [f32], limit: f32) {
    debug_assert_eq!(pos.len(), vel.len());
    for (p, v) in pos.iter_mut().zip(vel.iter_mut()) {
        reflect_axis(p, v, limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleState;

    #[test]
    fn integrate_moves_by_velocity_times_dt() {
        let mut s = ParticleState::from_parts(100, 100, &[10.0], &[20.0], &[60.0], &[-30.0]);
        integrate(s.particles_mut(), 1.0);
        assert_eq!(s.view().x[0], 70.0);
        assert_eq!(s.view().y[0], -10.0);
    }

    #[test]
    fn reflect_low_wall() {
        let (mut p, mut v) = (-3.0_f32, -5.0_f32);
        assert!(reflect_axis(&mut p, &mut v, 10.0));
        assert_eq!((p, v), (0.0, 5.0));
    }

    #[test]
    fn reflect_high_wall() {
        let (mut p, mut v) = (12.0_f32, 5.0_f32);
        assert!(reflect_axis(&mut p, &mut v, 10.0));
        assert_eq!((p, v), (10.0, -5.0));
    }

    #[test]
    fn on_the_wall_is_not_a_hit() {
        let (mut p, mut v) = (10.0_f32, 5.0_f32);
        assert!(!reflect_axis(&mut p, &mut v, 10.0));
        assert_eq!((p, v), (10.0, 5.0));
    }

    #[test]
    fn corner_bounce_flips_both_axes() {
        let mut s = ParticleState::from_parts(100, 50, &[101.0], &[-1.0], &[7.0], &[-9.0]);
        bounce(s.particles_mut(), 100.0, 50.0);
        let v = s.view();
        assert_eq!((v.x[0], v.y[0]), (100.0, 0.0));
        assert_eq!((v.vx[0], v.vy[0]), (-7.0, 9.0));
    }

    #[test]
    fn lane_form_matches_particle_form() {
        let x = [1.0, 99.5, -0.25, 50.0, 100.75];
        let y = [3.0, 0.5, 49.0, 51.0, -2.0];
        let vx = [120.0, 118.0, -77.0, 1.0, 33.0];
        let vy = [-119.0, -100.0, 3.5, 44.0, -1.0];

        let mut a = ParticleState::from_parts(100, 50, &x, &y, &vx, &vy);
        integrate(a.particles_mut(), DT);
        bounce(a.particles_mut(), 100.0, 50.0);

        let mut b = ParticleState::from_parts(100, 50, &x, &y, &vx, &vy);
        let p = b.particles_mut();
        integrate_lanes(p.x, p.vx, DT);
        integrate_lanes(p.y, p.vy, DT);
        reflect_lanes(p.x, p.vx, 100.0);
        reflect_lanes(p.y, p.vy, 50.0);

        assert_eq!(a, b);
    }
}
