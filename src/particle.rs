use crate::canvas::Canvas;
use crate::color::{hsb, Rgb};
use crate::field::FlowField;
use glam::Vec2;
use rand::Rng;

const SATURATION: f32 = 50.0;
const BRIGHTNESS: f32 = 90.0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct DotStyle {
    pub(crate) size: f32,  // diameter in viewport units
    pub(crate) alpha: f32, // 0..1
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Particle {
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) acc: Vec2,
    pub(crate) hue_offset: f32,
}

impl Particle {
    pub(crate) fn new(pos: Vec2, hue_offset: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            hue_offset,
        }
    }

    pub(crate) fn apply_force(&mut self, force: Vec2) {
        self.acc += force;
    }

    /// Steers by the field cell under the particle; off-grid positions get no force.
    pub(crate) fn follow(&mut self, field: &FlowField) {
        if let Some(force) = field.lookup(self.pos) {
            self.apply_force(force);
        }
    }

    pub(crate) fn update(&mut self, max_speed: f32) {
        self.vel = (self.vel + self.acc).clamp_length_max(max_speed.max(0.0));
        self.pos += self.vel;
        self.acc = Vec2::ZERO;
    }

    /// Toroidal wrap into `[0,width) × [0,height)`.
    pub(crate) fn edges(&mut self, width: f32, height: f32) {
        self.pos.x = wrap_axis(self.pos.x, width);
        self.pos.y = wrap_axis(self.pos.y, height);
    }

    pub(crate) fn hue(&self, global_hue: f32) -> f32 {
        (global_hue + self.hue_offset).rem_euclid(360.0)
    }

    pub(crate) fn color(&self, global_hue: f32) -> Rgb {
        hsb(self.hue(global_hue), SATURATION, BRIGHTNESS)
    }

    pub(crate) fn show(&self, canvas: &mut Canvas, global_hue: f32, style: DotStyle) {
        canvas.fill_circle(
            self.pos.x,
            self.pos.y,
            style.size,
            self.color(global_hue),
            style.alpha,
        );
    }
}

fn wrap_axis(v: f32, max: f32) -> f32 {
    if v >= max {
        0.0
    } else if v < 0.0 {
        let w = v + max;
        // a tiny negative plus max can round up to max itself
        if (0.0..max).contains(&w) {
            w
        } else {
            0.0
        }
    } else {
        v
    }
}

/// Fixed pool of particles, created once and mutated every frame.
pub(crate) struct ParticleSystem {
    pub(crate) particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleSystem {
    pub(crate) fn new<R: Rng>(
        count: usize,
        width: f32,
        height: f32,
        hue_spread: f32,
        rng: &mut R,
    ) -> Self {
        let particles = (0..count)
            .map(|_| {
                let x = if width > 0.0 { rng.gen_range(0.0..width) } else { 0.0 };
                let y = if height > 0.0 { rng.gen_range(0.0..height) } else { 0.0 };
                let hue_offset = if hue_spread > 0.0 {
                    rng.gen_range(0.0..hue_spread)
                } else {
                    0.0
                };
                Particle::new(Vec2::new(x, y), hue_offset)
            })
            .collect();
        Self {
            particles,
            width,
            height,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.particles.len()
    }

    /// follow → update → edges → show, per particle, in that order.
    pub(crate) fn step(
        &mut self,
        field: &FlowField,
        canvas: &mut Canvas,
        global_hue: f32,
        max_speed: f32,
        style: DotStyle,
    ) {
        for p in &mut self.particles {
            p.follow(field);
            p.update(max_speed);
            p.edges(self.width, self.height);
            p.show(canvas, global_hue, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldParams;
    use crate::noise::Noise;
    use rand::{rngs::StdRng, SeedableRng};

    fn field(w: f32, h: f32) -> FlowField {
        let mut f = FlowField::new(
            w,
            h,
            20,
            FieldParams {
                strength: 0.5,
                complexity: 0.1,
                time_step: 0.0005,
            },
        );
        f.fill(&Noise::new(4), 0.0);
        f
    }

    #[test]
    fn velocity_never_exceeds_max_speed() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..2000 {
            let mut p = Particle::new(Vec2::new(50.0, 50.0), 0.0);
            p.vel = Vec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            p.apply_force(Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)));
            p.update(2.0);
            assert!(p.vel.length() <= 2.0 + 1e-5, "{}", p.vel.length());
            assert_eq!(p.acc, Vec2::ZERO);
        }
    }

    #[test]
    fn fast_particle_is_capped_without_turning() {
        let mut p = Particle::new(Vec2::new(10.0, 10.0), 0.0);
        p.vel = Vec2::new(5.0, 0.0);
        p.update(2.0);
        assert!((p.vel.x - 2.0).abs() < 1e-6);
        assert_eq!(p.vel.y, 0.0);
        assert!((p.pos.x - 12.0).abs() < 1e-6);
    }

    #[test]
    fn slow_particle_keeps_its_velocity() {
        let mut p = Particle::new(Vec2::ZERO, 0.0);
        p.apply_force(Vec2::new(0.3, -0.4));
        p.update(2.0);
        assert_eq!(p.vel, Vec2::new(0.3, -0.4));
    }

    #[test]
    fn leaving_right_edge_wraps_to_zero() {
        // 10×10 cells of 20 units
        let mut p = Particle::new(Vec2::new(205.0, 100.0), 0.0);
        p.edges(200.0, 200.0);
        assert_eq!(p.pos, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn leaving_top_edge_wraps_near_bottom() {
        let mut p = Particle::new(Vec2::new(30.0, -1.5), 0.0);
        p.edges(200.0, 200.0);
        assert_eq!(p.pos, Vec2::new(30.0, 198.5));
    }

    #[test]
    fn edges_keep_positions_in_viewport() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..5000 {
            let mut p = Particle::new(
                Vec2::new(rng.gen_range(-2.0..202.0), rng.gen_range(-2.0..152.0)),
                0.0,
            );
            p.edges(200.0, 150.0);
            assert!((0.0..200.0).contains(&p.pos.x), "{}", p.pos.x);
            assert!((0.0..150.0).contains(&p.pos.y), "{}", p.pos.y);
        }
        let mut p = Particle::new(Vec2::new(-1e-9, 200.0), 0.0);
        p.edges(200.0, 200.0);
        assert_eq!(p.pos, Vec2::ZERO);
    }

    #[test]
    fn follow_adds_cell_vector_as_force() {
        let f = field(200.0, 200.0);
        let mut p = Particle::new(Vec2::new(45.0, 61.0), 0.0);
        p.follow(&f);
        assert_eq!(Some(p.acc), f.cell_at(2, 3));
    }

    #[test]
    fn follow_off_grid_applies_nothing() {
        // 210 wide viewport leaves a 10 unit strip with no cell
        let f = field(210.0, 200.0);
        let mut p = Particle::new(Vec2::new(205.0, 50.0), 0.0);
        p.follow(&f);
        assert_eq!(p.acc, Vec2::ZERO);
    }

    #[test]
    fn hue_wraps_around_the_wheel() {
        let p = Particle::new(Vec2::ZERO, 45.0);
        assert_eq!(p.hue(330.0), 15.0);
        assert_eq!(p.hue(10.0), 55.0);
    }

    #[test]
    fn step_moves_and_paints() {
        let f = field(200.0, 200.0);
        let mut canvas = Canvas::new(200, 200, Rgb::BLACK);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sys = ParticleSystem::new(50, 200.0, 200.0, 60.0, &mut rng);
        let before: Vec<Vec2> = sys.particles.iter().map(|p| p.pos).collect();
        let style = DotStyle {
            size: 4.0,
            alpha: 0.3,
        };
        sys.step(&f, &mut canvas, 0.0, 2.0, style);

        assert_eq!(sys.len(), 50);
        for (p, b) in sys.particles.iter().zip(&before) {
            assert_ne!(p.pos, *b);
            assert!(p.vel.length() <= 2.0 + 1e-5);
            assert!((0.0..60.0).contains(&p.hue_offset));
        }
        assert!(canvas.px.iter().any(|c| *c != Rgb::BLACK));
    }
}
