use crate::sim::Action;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

pub(crate) enum Input {
    Action(Action),
    Resize,
}

/// Drains pending terminal events without blocking the frame.
pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Input>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Some(input) = map_event(event::read()?) {
            out.push(input);
            if out.len() >= 32 {
                break;
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: Event) -> Option<Input> {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press => map_key(k).map(Input::Action),
        Event::Mouse(m) => match m.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Input::Action(Action::TogglePause)),
            _ => None,
        },
        Event::Resize(_, _) => Some(Input::Resize),
        _ => None,
    }
}

fn map_key(k: KeyEvent) -> Option<Action> {
    if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match k.code {
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Export),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}
