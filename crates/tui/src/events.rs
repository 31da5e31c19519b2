use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::Backend, layout::Rect, Terminal};

use crate::{
    app::{App, Focus},
    ui,
};

const SCROLL_STEP: i32 = 3;

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }
        if app.focus.is_text() && !app.show_help {
            let _ = terminal.show_cursor();
        } else {
            let _ = terminal.hide_cursor();
        }

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Paste(s) => app.on_paste(&s),
                Event::Resize(_, _) => app.dirty = true,
                Event::Mouse(me) => on_mouse(app, me),
                _ => {}
            }
        }

        app.on_tick();

        if app.should_quit {
            app.cancel_run();
            app.save_prefs();
            break;
        }
    }
    Ok(())
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

pub fn on_mouse(app: &mut App, me: MouseEvent) {
    if app.show_help {
        return;
    }
    let (x, y) = (me.column, me.row);
    if let Some(area) = app.results_area {
        if contains(area, x, y) {
            match me.kind {
                MouseEventKind::ScrollUp => app.scroll_results(-SCROLL_STEP),
                MouseEventKind::ScrollDown => app.scroll_results(SCROLL_STEP),
                _ => {}
            }
            return;
        }
    }
    if let Some(area) = app.history_area {
        if contains(area, x, y) && me.kind == MouseEventKind::Down(MouseButton::Left) {
            let idx = (y - area.y) as usize;
            if idx < app.history.recent().len() {
                app.focus = Focus::History;
                app.load_history_entry(idx);
                app.dirty = true;
            }
        }
    }
}
