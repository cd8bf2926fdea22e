//! Terminal rendering
//!
//! Immediate-mode drawing over the applied snapshots: every frame rebuilds
//! the full layout from the session state, so the tables can only ever show
//! one complete snapshot at a time.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::forms::{CommandField, RegisterField};
use crate::key_editor::Phase;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Min(6),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_servers(frame, app, chunks[0]);
    draw_tasks(frame, app, chunks[1]);

    let form_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    draw_register_form(frame, app, form_chunks[0]);
    draw_command_form(frame, app, form_chunks[1]);

    draw_status_bar(frame, app, chunks[3]);

    // Overlays; the modal records its bounds for the outside-click check
    app.modal_area = None;
    if app.key_editor.is_open() {
        draw_key_editor(frame, app);
    }
    if app.results.is_some() {
        draw_results(frame, app);
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border)
}

fn status_style(status: &str) -> Style {
    match status {
        "online" => Style::default().fg(Color::Green),
        "offline" => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Gray),
    }
}

fn draw_servers(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Servers;
    let rows: Vec<Row> = app
        .servers
        .rows()
        .iter()
        .map(|s| {
            Row::new(vec![
                s.hostname.clone(),
                s.ip.clone().unwrap_or_default(),
                s.group.clone().unwrap_or_default(),
                s.status.clone(),
                s.last_heartbeat.clone().unwrap_or_default(),
                s.cpu_cell(),
                s.memory_cell(),
            ])
            .style(status_style(&s.status))
        })
        .collect();

    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(14),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
        Constraint::Percentage(24),
        Constraint::Percentage(12),
        Constraint::Percentage(12),
    ];
    let title = if focused {
        " Servers | [enter] edit key  [r] refresh "
    } else {
        " Servers "
    };
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "HOSTNAME",
                "IP",
                "GROUP",
                "STATUS",
                "HEARTBEAT",
                "CPU",
                "MEM",
            ])
            .style(Style::default().fg(Color::Yellow)),
        )
        .block(panel_block(title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(table, area, &mut app.servers.table_state);
}

fn draw_tasks(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Tasks;
    let rows: Vec<Row> = app
        .tasks
        .rows()
        .iter()
        .map(|t| {
            Row::new(vec![
                t.task_id.clone(),
                t.target_label(),
                t.command.clone(),
                t.status.clone(),
                t.created_at.clone(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(24),
        Constraint::Percentage(16),
        Constraint::Percentage(28),
        Constraint::Percentage(10),
        Constraint::Percentage(22),
    ];
    let title = if focused {
        " Tasks | [enter] results  [r] refresh "
    } else {
        " Tasks "
    };
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["TASK ID", "TARGET", "COMMAND", "STATUS", "CREATED"])
                .style(Style::default().fg(Color::Yellow)),
        )
        .block(panel_block(title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(table, area, &mut app.tasks.table_state);
}

fn field_line<'a>(label: &'a str, value: &'a str, active: bool) -> Line<'a> {
    let style = if active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!(" {:<9}", label), style),
        Span::styled(value.to_string(), style),
    ])
}

fn draw_register_form(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Register;
    let form = &app.register_form;
    let active = |field| focused && form.field == field;
    let lines = vec![
        field_line("Hostname:", &form.hostname, active(RegisterField::Hostname)),
        field_line("IP:", &form.ip, active(RegisterField::Ip)),
        field_line("Group:", &form.group, active(RegisterField::Group)),
    ];
    let title = if focused {
        " Add server | [enter] register "
    } else {
        " Add server "
    };
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(panel_block(title, focused)),
        area,
    );
}

fn draw_command_form(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Command;
    let form = &app.command_form;
    let active = |field| focused && form.field == field;
    let lines = vec![
        Line::from(vec![
            Span::raw(" Targets:  "),
            Span::styled(
                form.target_type.as_str(),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled("  (left/right to cycle)", Style::default().fg(Color::DarkGray)),
        ]),
        field_line("Target:", &form.target, active(CommandField::Target)),
        field_line("Command:", &form.command, active(CommandField::Command)),
        field_line("Timeout:", &form.timeout, active(CommandField::Timeout)),
        field_line("User:", &form.user, active(CommandField::User)),
    ];
    let title = if focused {
        " Send command | [enter] dispatch "
    } else {
        " Send command "
    };
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(panel_block(title, focused)),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let backend = match app.backend_online {
        Some(true) => Span::styled("backend: online", Style::default().fg(Color::Green)),
        Some(false) => Span::styled("backend: offline", Style::default().fg(Color::Red)),
        None => Span::styled("backend: probing", Style::default().fg(Color::DarkGray)),
    };
    let mut spans = vec![Span::raw(" "), backend];
    if let Some(at) = app.last_refresh {
        spans.push(Span::raw(format!("  refreshed {}", at.format("%H:%M:%S"))));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Green),
        ));
    }
    spans.push(Span::styled(
        "  [tab] focus  [q] quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_key_editor(frame: &mut Frame, app: &mut App) {
    let area = centered_rect(60, 60, frame.size());
    frame.render_widget(Clear, area);
    app.modal_area = Some(area);

    let hostname = app.key_editor.hostname().unwrap_or_default();
    let title = match app.key_editor.phase() {
        Some(Phase::Saving) => format!(" Public key: {} (saving...) ", hostname),
        _ => format!(" Public key: {} ", hostname),
    };

    let mut lines: Vec<Line> = match app.key_editor.phase() {
        Some(Phase::Loading) => vec![Line::from(Span::styled(
            "loading existing key...",
            Style::default().fg(Color::DarkGray),
        ))],
        _ => app
            .key_editor
            .buffer()
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect(),
    };
    if let Some(error) = app.key_editor.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[ctrl-s] save  [esc] cancel",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(title),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_results(frame: &mut Frame, app: &mut App) {
    let Some(popup) = app.results.as_ref() else {
        return;
    };
    let area = centered_rect(70, 70, frame.size());
    frame.render_widget(Clear, area);

    let body = popup
        .body
        .clone()
        .unwrap_or_else(|| "loading results...".to_string());
    let mut lines: Vec<Line> = body.split('\n').map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "press any key to close",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" Task results: {} ", popup.task_id)),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}
