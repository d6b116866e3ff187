use crate::canvas::Canvas;
use crate::color::Rgb;
use crate::config::Settings;
use crate::field::{FieldParams, FlowField};
use crate::noise::Noise;
use crate::particle::{DotStyle, ParticleSystem};
use rand::{rngs::StdRng, SeedableRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    TogglePause,
    Export,
    Quit,
}

/// Animation state carried from one tick to the next.
#[derive(Clone, Debug)]
pub(crate) struct SimState {
    pub(crate) z_off: f64,
    pub(crate) hue: f64,
    pub(crate) frame: u64,
    pub(crate) paused: bool,
    initial_hue: f64,
}

impl SimState {
    pub(crate) fn new(initial_hue: f64) -> Self {
        let initial_hue = initial_hue.rem_euclid(360.0);
        Self {
            z_off: 0.0,
            hue: initial_hue,
            frame: 0,
            paused: false,
            initial_hue,
        }
    }

    /// Counts one frame and recomputes the hue from the frame count.
    pub(crate) fn advance_hue(&mut self, speed: f64) {
        self.frame += 1;
        let h = (self.initial_hue + self.frame as f64 * speed).rem_euclid(360.0);
        // rem_euclid may return exactly 360.0 for tiny negative inputs
        self.hue = if h >= 360.0 { 0.0 } else { h };
    }
}

pub(crate) struct Simulation {
    pub(crate) settings: Settings,
    pub(crate) state: SimState,
    pub(crate) field: FlowField,
    pub(crate) particles: ParticleSystem,
    pub(crate) canvas: Canvas,
    noise: Noise,
    background: Rgb,
}

impl Simulation {
    pub(crate) fn new(settings: Settings, width: u32, height: u32, seed: u64) -> Self {
        let background = Rgb::BLACK;
        let noise = Noise::with_detail(seed, settings.noise_octaves, settings.noise_falloff);
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

        let field = FlowField::new(
            width as f32,
            height as f32,
            settings.cell_size,
            FieldParams {
                strength: settings.flow_strength,
                complexity: settings.flow_complexity,
                time_step: settings.flow_time_step,
            },
        );
        let particles = ParticleSystem::new(
            settings.particle_count,
            width as f32,
            height as f32,
            settings.hue_spread,
            &mut rng,
        );

        Self {
            state: SimState::new(0.0),
            field,
            particles,
            canvas: Canvas::new(width, height, background),
            noise,
            background,
            settings,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.canvas.w
    }

    pub(crate) fn height(&self) -> u32 {
        self.canvas.h
    }

    fn dot_style(&self) -> DotStyle {
        DotStyle {
            size: self.settings.particle_size,
            alpha: self.settings.particle_alpha / 100.0,
        }
    }

    /// Advances the animation by one frame.
    ///
    /// Fade, field regeneration, particle steps and the hue advance run in
    /// this order so forces come from the field of the current frame and dots
    /// are drawn at their final position.
    pub(crate) fn tick(&mut self) {
        self.canvas
            .fade(self.background, self.settings.fade_strength / 100.0);

        self.field.regenerate(&self.noise, &mut self.state.z_off);

        let style = self.dot_style();
        self.particles.step(
            &self.field,
            &mut self.canvas,
            self.state.hue as f32,
            self.settings.max_speed,
            style,
        );

        self.state.advance_hue(self.settings.color_change_speed);
    }

    /// Applies the state-only part of an action. Export and quit are carried
    /// out by the host and are no-ops here.
    pub(crate) fn apply(&mut self, action: Action) {
        if action == Action::TogglePause {
            self.state.paused = !self.state.paused;
            log::debug!(
                "animation {}",
                if self.state.paused { "paused" } else { "resumed" }
            );
        }
    }
}
