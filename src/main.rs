mod app;
mod canvas;
mod color;
mod config;
mod export;
mod field;
mod input;
mod noise;
mod particle;
mod render;
mod sim;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
