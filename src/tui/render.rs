use std::borrow::Cow;

use super::state::AppState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    draw_feed(f, state, chunks[1]);
    draw_logs(f, state, chunks[2]);
    draw_footer(f, state, chunks[3]);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let session = &state.session;
    let (mode, mode_color) = if session.is_active() {
        ("SELECTING", Color::Green)
    } else {
        ("BROWSING", Color::DarkGray)
    };
    let export_style = if state.can_export() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", mode), Style::default().fg(Color::Black).bg(mode_color)),
        Span::raw("  "),
    ];
    if session.is_active() {
        spans.push(Span::raw(session.counter_label()));
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(state.export_label(), export_style));
    } else {
        spans.push(Span::raw(format!("{} posts on page", state.item_count())));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(notice) = &state.notice {
        let color = if notice.success { Color::Green } else { Color::Red };
        lines.push(Line::from(Span::styled(
            format!(" {}", notice.message),
            Style::default().fg(color),
        )));
    }

    let block = Block::default().title(" Trello Export ").borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_feed(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(8) as usize;
    let items: Vec<ListItem> = state
        .page
        .entries()
        .iter()
        .map(|entry| {
            let badge = state.label_for(&entry.key);
            let selected = state.session.order_of(&entry.key).is_some();
            let badge_style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let preview = state.preview(&entry.key);
            ListItem::new(Line::from(vec![
                Span::styled(badge, badge_style),
                Span::raw(" "),
                Span::raw(truncate_with_ellipsis(&preview, max_width).into_owned()),
            ]))
        })
        .collect();

    let title = format!(" Feed: {} ", state.feed_path.display());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut list_state = ListState::default();
    if state.item_count() > 0 {
        list_state.select(Some(state.cursor));
    }
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize;
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.len());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let block = Block::default().title(" Log ").borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let line = if state.session.is_active() {
        Line::from(vec![
            key("  [s/Esc]"),
            Span::raw(" cancel  "),
            key("[j/k]"),
            Span::raw(" move  "),
            key("[space]"),
            Span::raw(" select  "),
            key("[e]"),
            Span::raw("xport  "),
            key("[r]"),
            Span::raw("eload  "),
            key("[q]"),
            Span::raw("uit"),
        ])
    } else {
        Line::from(vec![
            key("  [s]"),
            Span::raw("elect  "),
            key("[j/k]"),
            Span::raw(" move  "),
            key("[r]"),
            Span::raw("eload  "),
            key("[q]"),
            Span::raw("uit"),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn truncate_with_ellipsis(s: &str, max: usize) -> Cow<'_, str> {
    if s.chars().count() <= max {
        return Cow::Borrowed(s);
    }
    if max <= 1 {
        return Cow::Owned("…".chars().take(max).collect());
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a longer line", 6), "a lon…");
        assert_eq!(truncate_with_ellipsis("abc", 0), "");
    }
}
