use crate::config::{self, Cli, Settings};
use crate::export::save_png;
use crate::input::{collect_input_nonblocking, Input};
use crate::render::{canvas_to_cells, status_line, Terminal};
use crate::sim::{Action, Simulation};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use std::{
    fs::File,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

const STATUS_TTL: Duration = Duration::from_secs(4);

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    let settings = config::resolve(&cli)?;
    let seed = settings.seed.unwrap_or_else(clock_seed);

    if cli.headless {
        return run_headless(&cli, settings, seed);
    }

    let mut app = App::init(settings, seed, !cli.no_hud)?;
    let res = app.run();
    let end = app.term.end();
    res.and(end)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn init_logging(cli: &Cli) -> Result<()> {
    // stderr shares the screen in interactive mode, so stay quiet there
    // unless a log file is given or RUST_LOG asks for output.
    let default = if cli.headless || cli.log_file.is_some() {
        "info"
    } else {
        "off"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("could not create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().ok();
    Ok(())
}

fn run_headless(cli: &Cli, settings: Settings, seed: u64) -> Result<()> {
    ensure!(
        cli.width > 0 && cli.height > 0,
        "viewport must be non-empty, got {}x{}",
        cli.width,
        cli.height
    );
    let export_path = settings.export_path.clone();
    let mut sim = Simulation::new(settings, cli.width, cli.height, seed);
    log::info!(
        "headless: {}x{} viewport, {}x{} grid, {} particles, seed {}, {} frames",
        sim.width(),
        sim.height(),
        sim.field.cols(),
        sim.field.rows(),
        sim.particles.len(),
        seed,
        cli.frames
    );

    let started = Instant::now();
    for _ in 0..cli.frames {
        sim.tick();
    }
    log::info!("simulated {} frames in {:.2?}", sim.state.frame, started.elapsed());

    let path = save_png(&sim.canvas, &export_path)?;
    println!("{}", path.display());
    Ok(())
}

struct App {
    sim: Simulation,
    term: Terminal,
    hud: bool,
    should_quit: bool,
    status: Option<(String, Instant)>,
}

impl App {
    fn init(settings: Settings, seed: u64, hud: bool) -> Result<Self> {
        let term = Terminal::begin()?;

        // Viewport is fixed from the terminal size at startup; later resizes
        // only rescale the view.
        let hud_rows = u16::from(hud);
        let px_w = term.cols.max(1) as f32;
        let px_h = (term.rows.saturating_sub(hud_rows).max(1) as f32) * 2.0;
        let width = (px_w * settings.scale).round() as u32;
        let height = (px_h * settings.scale).round() as u32;

        let sim = Simulation::new(settings, width, height, seed);
        log::info!(
            "viewport {}x{} ({}x{} terminal), grid {}x{}, {} particles, seed {}",
            width,
            height,
            term.cols,
            term.rows,
            sim.field.cols(),
            sim.field.rows(),
            sim.particles.len(),
            seed
        );

        Ok(Self {
            sim,
            term,
            hud,
            should_quit: false,
            status: None,
        })
    }

    fn run(&mut self) -> Result<()> {
        let fps = self.sim.settings.fps.clamp(1, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            let frame_start = Instant::now();
            self.term.resize_if_needed()?;

            for input in collect_input_nonblocking(frame_dt)? {
                match input {
                    Input::Action(action) => self.handle(action),
                    Input::Resize => {
                        self.term.resize_if_needed()?;
                    }
                }
                if self.should_quit {
                    break;
                }
            }
            if self.should_quit {
                break;
            }

            if !self.sim.state.paused {
                self.sim.tick();
            }

            self.render_frame()?;
            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    fn handle(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Export => self.export(),
            Action::TogglePause => self.sim.apply(action),
        }
    }

    fn export(&mut self) {
        let msg = match save_png(&self.sim.canvas, &self.sim.settings.export_path) {
            Ok(path) => format!("saved {}", path.display()),
            Err(e) => {
                log::warn!("export failed: {e:#}");
                format!("save failed: {e}")
            }
        };
        self.status = Some((msg, Instant::now() + STATUS_TTL));
    }

    fn render_frame(&mut self) -> Result<()> {
        let rows = self.term.rows;
        let view_rows = if self.hud { rows.saturating_sub(1) } else { rows };
        canvas_to_cells(&self.sim.canvas, &mut self.term.cur, view_rows);

        if self.hud && rows > 0 {
            let line = self.hud_text();
            status_line(&mut self.term.cur, rows - 1, &line);
        }

        self.term.present()
    }

    fn hud_text(&mut self) -> String {
        if self
            .status
            .as_ref()
            .is_some_and(|(_, until)| Instant::now() >= *until)
        {
            self.status = None;
        }
        let st = &self.sim.state;
        let mut line = format!(
            "softflow | frame {} | hue {:>5.1} | {} particles | click/space pause  s save  q quit",
            st.frame,
            st.hue,
            self.sim.particles.len()
        );
        if st.paused {
            line.push_str(" | PAUSED");
        }
        if let Some((msg, _)) = &self.status {
            line.push_str(" | ");
            line.push_str(msg);
        }
        line
    }
}

fn spin_sleep(frame_dt: Duration, start: Instant) {
    let target = start + frame_dt;
    while Instant::now() < target {
        std::thread::sleep(Duration::from_millis(1));
    }
}
