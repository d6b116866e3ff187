use crate::canvas::Canvas;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const UPPER_HALF: char = '▀';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u16, y: u16) -> Cell {
        self.cells[self.idx(x, y)]
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

fn rgb_color(c: [u8; 3]) -> Color {
    Color::Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
    }
}

/// Downsamples the canvas into the top `rows` rows of `out`.
///
/// Each cell shows two stacked pixels through `▀`: the foreground carries
/// the upper half, the background the lower. Every pixel averages the canvas
/// block it covers, so the view follows the terminal size while the canvas
/// keeps its own resolution.
pub(crate) fn canvas_to_cells(canvas: &Canvas, out: &mut CellBuffer, rows: u16) {
    let cols = out.w as u32;
    let rows = rows.min(out.h) as u32;
    if cols == 0 || rows == 0 {
        return;
    }
    let px_h = rows * 2;

    let span_x = |x: u32| -> (u32, u32) {
        let x0 = (x as u64 * canvas.w as u64 / cols as u64) as u32;
        let x1 = ((x as u64 + 1) * canvas.w as u64 / cols as u64) as u32;
        (x0, x1.max(x0 + 1))
    };
    let span_y = |y: u32| -> (u32, u32) {
        let y0 = (y as u64 * canvas.h as u64 / px_h as u64) as u32;
        let y1 = ((y as u64 + 1) * canvas.h as u64 / px_h as u64) as u32;
        (y0, y1.max(y0 + 1))
    };

    for cy in 0..rows {
        let (ty0, ty1) = span_y(cy * 2);
        let (by0, by1) = span_y(cy * 2 + 1);
        for cx in 0..cols {
            let (x0, x1) = span_x(cx);
            let top = canvas.average(x0, ty0, x1, ty1).to_u8();
            let bottom = canvas.average(x0, by0, x1, by1).to_u8();
            out.set(
                cx as u16,
                cy as u16,
                Cell {
                    ch: UPPER_HALF,
                    fg: rgb_color(top),
                    bg: rgb_color(bottom),
                },
            );
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

/// Blanks row `y` and writes `s` into it.
pub(crate) fn status_line(buf: &mut CellBuffer, y: u16, s: &str) {
    let (fg, bg) = (Color::Grey, Color::Black);
    for x in 0..buf.w {
        buf.set(x, y, Cell { ch: ' ', fg, bg });
    }
    draw_text(buf, 1, y, s, fg, bg);
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.full_redraw = true;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;
        let mut cursor_at: Option<(u16, u16)> = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let c = self.cur.get(x, y);
                if !self.full_redraw && c == self.prev.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.out, cursor::MoveTo(x, y))?;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}
