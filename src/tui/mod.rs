pub mod render;
pub mod state;

use crate::bridge::{BridgeClient, BridgeRequest};
use crate::selection::{export_notice, ExportNotice, SelectionError};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use state::{AppState, PendingExport};
use std::io::stdout;
use std::time::Duration;

/// Run the selection TUI until the user quits.
pub async fn run_tui(mut state: AppState, bridge: BridgeClient) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, &mut state, &bridge).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    bridge: &BridgeClient,
) -> Result<()> {
    loop {
        state.poll_page();
        collect_export(state).await;
        terminal.draw(|f| render::draw(f, state))?;

        // Poll for keyboard events with 100ms timeout
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('s') | KeyCode::Esc => {
                if key.code == KeyCode::Char('s') || state.session.is_active() {
                    state.toggle_mode();
                }
            }
            KeyCode::Char('j') | KeyCode::Down => state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => state.move_cursor(-1),
            KeyCode::Char('g') => state.cursor = 0,
            KeyCode::Char('G') => state.move_cursor(isize::MAX / 2),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(key) = state.cursor_key() {
                    state.session.toggle_item(&key);
                }
            }
            KeyCode::Char('r') => state.reload_feed(),
            KeyCode::Char('e') => start_export(state, bridge),
            _ => {}
        }
    }
}

fn start_export(state: &mut AppState, bridge: &BridgeClient) {
    if state.pending.is_some() {
        state.notice = Some(ExportNotice {
            success: false,
            message: SelectionError::ExportInFlight.to_string(),
        });
        return;
    }
    if !state.session.can_export() {
        return;
    }
    match state.session.begin_export(&state.page) {
        Ok(items) => {
            let count = items.len();
            let epoch = state.session.epoch();
            let bridge = bridge.clone();
            let handle = tokio::spawn(async move {
                bridge.send(BridgeRequest::ExportToTrello { tweets: items }).await
            });
            state.pending = Some(PendingExport { count, epoch, handle });
            state.push_log("INFO", format!("exporting {} posts", count));
        }
        Err(e) => {
            state.notice = Some(ExportNotice {
                success: false,
                message: e.to_string(),
            });
        }
    }
}

/// Hand a finished export back to the session it was started from. If the
/// user has since re-entered selection mode, only the notice is shown.
async fn collect_export(state: &mut AppState) {
    let finished = state
        .pending
        .as_ref()
        .is_some_and(|p| p.handle.is_finished());
    if !finished {
        return;
    }
    let Some(pending) = state.pending.take() else {
        return;
    };
    let outcome = match pending.handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "export task panicked");
            Err(crate::error::ConnectivityError)
        }
    };
    let notice = if state.session.epoch() == pending.epoch {
        state.session.finish_export(pending.count, outcome)
    } else {
        export_notice(pending.count, outcome)
    };
    let level = if notice.success { "INFO" } else { "ERROR" };
    state.push_log(level, notice.message.clone());
    state.notice = Some(notice);
}
