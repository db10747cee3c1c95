use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::lifecycle::Health;
use crate::ui::{format, summary};

use super::app::{App, Level, MENU};

pub fn render(frame: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_status(frame, app, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(chunks[1]);
    render_menu(frame, app, middle[0]);
    render_messages(frame, app, middle[1]);

    let footer = match (&app.busy, app.pending) {
        (Some(task), _) => Line::from(Span::styled(
            format!(" {}...", task),
            Style::default().fg(Color::Yellow),
        )),
        (None, Some(action)) => Line::from(Span::styled(
            format!(" {}? [y/N]", action.label()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        (None, None) => Line::from(" \u{2191}/\u{2193} select  Enter run  r refresh  q quit"),
    };
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}

fn render_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = match &app.snapshot {
        Some(s) => format!("Status (updated {})", s.taken_at.format("%H:%M:%S")),
        None => "Status (loading...)".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some(snapshot) = &app.snapshot else {
        frame.render_widget(Paragraph::new("Collecting status...").block(block), area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let ok = Style::default().fg(Color::Green);
    let bad = Style::default().fg(Color::Red);
    let rows = snapshot.games.iter().map(|g| {
        let c = &g.container;
        let health = match c.health {
            Health::Healthy => Cell::from("healthy").style(ok),
            Health::Unhealthy => Cell::from("unhealthy").style(bad),
            Health::Unknown => Cell::from("-"),
        };
        Row::new(vec![
            Cell::from(g.environment.title()),
            Cell::from(c.status.clone()).style(if c.running { ok } else { bad }),
            health,
            Cell::from(c.uptime.map(format::uptime).unwrap_or_else(|| "-".to_string())),
            if g.reachable {
                Cell::from("reachable").style(ok)
            } else {
                Cell::from("unreachable").style(bad)
            },
            Cell::from(g.url.clone()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Environment", "Container", "Health", "Uptime", "Game", "URL"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(table, parts[0]);

    let mut spans = vec![
        Span::raw("Chrome debugger: "),
        if snapshot.debugger_available {
            Span::styled("available", ok)
        } else {
            Span::styled("unavailable", bad)
        },
    ];
    if let Some(host) = snapshot.games.iter().find_map(|g| g.host.as_ref()) {
        spans.push(Span::raw(format!("   {}", summary::host_line(host))));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), parts[1]);
}

fn render_menu(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items: Vec<ListItem> = MENU.iter().map(|a| ListItem::new(a.label())).collect();
    let mut state = ListState::default();
    state.select(Some(app.selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Actions"))
        .highlight_symbol("> ")
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_messages(frame: &mut Frame<'_>, app: &App, area: Rect) {
    // Newest at the bottom; show only what fits.
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.messages.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .messages
        .iter()
        .skip(skip)
        .map(|m| {
            let style = match m.level {
                Level::Info => Style::default(),
                Level::Success => Style::default().fg(Color::Green),
                Level::Error => Style::default().fg(Color::Red),
            };
            Line::from(Span::styled(m.text.clone(), style))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Messages"))
            .wrap(Wrap { trim: false }),
        area,
    );
}
