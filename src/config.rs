use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "softflow")]
#[command(about = "Particles drifting through an animated noise flow field, in your terminal")]
pub(crate) struct Cli {
    /// JSON settings file (camelCase keys); flags below override it
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// render without a terminal and write the last frame as PNG
    #[arg(long, default_value_t = false)]
    pub(crate) headless: bool,

    /// frames to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    pub(crate) frames: u64,

    /// viewport width in headless mode
    #[arg(long, default_value_t = 800)]
    pub(crate) width: u32,

    /// viewport height in headless mode
    #[arg(long, default_value_t = 600)]
    pub(crate) height: u32,

    /// hide the status line
    #[arg(long, default_value_t = false)]
    pub(crate) no_hud: bool,

    /// write log output to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    #[arg(long)]
    pub(crate) particle_count: Option<usize>,
    #[arg(long)]
    pub(crate) particle_size: Option<f32>,
    /// 0..100
    #[arg(long)]
    pub(crate) particle_alpha: Option<f32>,
    /// 0..100
    #[arg(long)]
    pub(crate) fade_strength: Option<f32>,
    #[arg(long)]
    pub(crate) flow_strength: Option<f32>,
    #[arg(long)]
    pub(crate) flow_complexity: Option<f64>,
    #[arg(long)]
    pub(crate) flow_time_step: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) color_change_speed: Option<f64>,
    #[arg(long)]
    pub(crate) max_speed: Option<f32>,
    #[arg(long)]
    pub(crate) cell_size: Option<u32>,
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// render rate cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,
    /// viewport units per terminal pixel
    #[arg(long)]
    pub(crate) scale: Option<f32>,
    #[arg(long)]
    pub(crate) export_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Settings {
    pub(crate) particle_count: usize,
    pub(crate) particle_size: f32,
    pub(crate) particle_alpha: f32,
    pub(crate) fade_strength: f32,
    pub(crate) flow_strength: f32,
    pub(crate) flow_complexity: f64,
    pub(crate) flow_time_step: f64,
    pub(crate) color_change_speed: f64,
    pub(crate) max_speed: f32,
    pub(crate) cell_size: u32,
    pub(crate) hue_spread: f32,
    pub(crate) noise_octaves: u32,
    pub(crate) noise_falloff: f64,
    pub(crate) seed: Option<u64>,
    pub(crate) fps: u32,
    pub(crate) scale: f32,
    pub(crate) export_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particle_count: 800,
            particle_size: 4.0,
            particle_alpha: 30.0,
            fade_strength: 10.0,
            flow_strength: 0.5,
            flow_complexity: 0.1,
            flow_time_step: 0.0005,
            color_change_speed: 0.5,
            max_speed: 2.0,
            cell_size: 20,
            hue_spread: 60.0,
            noise_octaves: crate::noise::DEFAULT_OCTAVES,
            noise_falloff: crate::noise::DEFAULT_FALLOFF,
            seed: None,
            fps: 60,
            scale: 4.0,
            export_path: PathBuf::from("soft_flow_animation.png"),
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=100.0).contains(&self.particle_alpha),
            "particleAlpha must be within 0..100, got {}",
            self.particle_alpha
        );
        ensure!(
            (0.0..=100.0).contains(&self.fade_strength),
            "fadeStrength must be within 0..100, got {}",
            self.fade_strength
        );
        ensure!(
            self.particle_size.is_finite() && self.particle_size > 0.0,
            "particleSize must be positive, got {}",
            self.particle_size
        );
        ensure!(
            self.flow_strength.is_finite() && self.flow_strength >= 0.0,
            "flowStrength must be non-negative, got {}",
            self.flow_strength
        );
        ensure!(
            self.flow_complexity.is_finite() && self.flow_complexity >= 0.0,
            "flowComplexity must be non-negative, got {}",
            self.flow_complexity
        );
        ensure!(
            self.flow_time_step.is_finite() && self.flow_time_step >= 0.0,
            "flowTimeStep must be non-negative, got {}",
            self.flow_time_step
        );
        ensure!(
            self.color_change_speed.is_finite(),
            "colorChangeSpeed must be finite"
        );
        ensure!(
            self.max_speed.is_finite() && self.max_speed >= 0.0,
            "maxSpeed must be non-negative, got {}",
            self.max_speed
        );
        ensure!(self.cell_size >= 1, "cellSize must be at least 1");
        ensure!(
            (0.0..=360.0).contains(&self.hue_spread),
            "hueSpread must be within 0..360, got {}",
            self.hue_spread
        );
        ensure!(
            (1..=8).contains(&self.noise_octaves),
            "noiseOctaves must be within 1..8, got {}",
            self.noise_octaves
        );
        ensure!(
            self.noise_falloff > 0.0 && self.noise_falloff <= 0.5,
            "noiseFalloff must be within (0, 0.5], got {}",
            self.noise_falloff
        );
        ensure!(
            (1..=240).contains(&self.fps),
            "fps must be within 1..240, got {}",
            self.fps
        );
        ensure!(
            self.scale.is_finite() && self.scale >= 1.0,
            "scale must be at least 1, got {}",
            self.scale
        );
        Ok(())
    }

    /// Flags given on the command line win over file values.
    pub(crate) fn apply_overrides(&mut self, cli: &Cli) {
        macro_rules! take {
            ($dst:ident, $src:ident; $($field:ident),* $(,)?) => {
                $(if let Some(v) = $src.$field.clone() {
                    $dst.$field = v;
                })*
            };
        }
        let dst = self;
        take!(
            dst, cli;
            particle_count,
            particle_size,
            particle_alpha,
            fade_strength,
            flow_strength,
            flow_complexity,
            flow_time_step,
            color_change_speed,
            max_speed,
            cell_size,
            fps,
            scale,
            export_path,
        );
        if cli.seed.is_some() {
            dst.seed = cli.seed;
        }
    }
}

pub(crate) fn load_settings(path: &Path) -> Result<Settings> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("could not read settings file {}", path.display()))?;
    let v = serde_json::from_str::<Settings>(&s)
        .with_context(|| format!("could not parse settings file {}", path.display()))?;
    Ok(v)
}

/// Defaults, then the optional file, then CLI flags; validated.
pub(crate) fn resolve(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    settings.apply_overrides(cli);
    settings.validate().context("invalid settings")?;
    Ok(settings)
}
