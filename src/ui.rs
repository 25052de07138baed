//! Terminal UI rendering.
//!
//! All drawing lives here, separated from application state ([`App`]) and
//! input handling ([`crate::input`]).  The layout is a scrollable media list
//! on top and a one-line status bar at the bottom.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use instagram_stream::MediaItem;

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_media_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// One list row: timestamp, first caption line, author.
fn media_line(item: &MediaItem) -> Line<'_> {
    let date_str = item
        .created_time()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "no date".into());

    let caption = item
        .caption()
        .and_then(|c| c.lines().next())
        .unwrap_or("(no caption)");

    let author = item
        .username()
        .map(|u| format!("[@{u}]"))
        .unwrap_or_else(|| format!("[{}]", item.id));

    Line::from(vec![
        Span::styled(
            format!("{:<18}", date_str),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(caption, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(author, Style::default().fg(Color::Magenta)),
    ])
}

fn draw_media_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| ListItem::new(media_line(item)))
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(format!(" Instagram {} ", app.sources))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} items", app.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  PgUp/PgDn: page  c: clear"),
    ]));
    frame.render_widget(status, area);
}
