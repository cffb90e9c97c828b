// UI module for rendering the TUI.
// Lays out the repository list, commit detail, summary, status bar, and help overlay.

mod list;

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::state::LoadPhase;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_content(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the title line with tracking start and load phase.
fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let phase_style = match app.state.phase {
        LoadPhase::Loading => Style::default().fg(Color::Yellow),
        LoadPhase::Ready => Style::default().fg(Color::Green),
        LoadPhase::Failed => Style::default().fg(Color::Red),
        LoadPhase::Idle | LoadPhase::Stopped => Style::default().fg(Color::DarkGray),
    };

    let mut spans = vec![
        Span::styled(
            " standup ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.state.phase.display(), phase_style),
    ];
    if let Some(session) = &app.state.session {
        spans.push(Span::styled(
            format!("  tracking since {}", session.start_date.format("%Y-%m-%d %H:%M UTC")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

/// Draw the repository list and the selected repository's detail.
fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    list::render_repositories_list(frame, app, columns[0]);

    let errors: Vec<String> = [
        app.state.error.clone(),
        app.state.summary_error.clone(),
        app.state.remediation_hint().map(str::to_string),
        app.notice.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    let error_height = if errors.is_empty() {
        0
    } else {
        errors.iter().map(|e| e.lines().count() as u16).sum::<u16>() + 2
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(error_height),
            Constraint::Percentage(50),
            Constraint::Min(3),
        ])
        .split(columns[1]);

    if !errors.is_empty() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Errors ");
        let text: Vec<Line> = errors
            .iter()
            .flat_map(|e| e.lines().map(|l| Line::styled(l.to_string(), Style::default().fg(Color::Red))))
            .collect();
        frame.render_widget(Paragraph::new(text).block(block), rows[0]);
    }

    match app.selected_repository() {
        Some(repo) => {
            list::render_commits(frame, &app.state, repo, rows[1]);
            list::render_summary(frame, &app.state, repo, rows[2]);
        }
        None if app.state.phase == LoadPhase::Failed => {
            list::render_error(frame, rows[1], "Run `standup track` to choose repositories");
        }
        None => list::render_empty(frame, rows[1], "Nothing selected"),
    }
}

/// Draw the status bar with keybinding hints and rate limit.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints = vec![
        Span::raw(" ↑↓ "),
        Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
        Span::raw("  g "),
        Span::styled("Summarize", Style::default().fg(Color::DarkGray)),
        Span::raw("  r "),
        Span::styled("Retry", Style::default().fg(Color::DarkGray)),
        Span::raw("  x "),
        Span::styled("Stop tracking", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Help", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Quit", Style::default().fg(Color::DarkGray)),
    ];

    // Rate limit is unknown until the first response arrives
    let rate = app.rate_limit();
    if rate.limit > 0 {
        let rate_color = if rate.remaining < 100 {
            Color::Red
        } else if rate.remaining < 500 {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        hints.push(Span::styled(
            format!("  API: {}/{}", rate.remaining, rate.limit),
            Style::default().fg(rate_color),
        ));
    }

    let status = Paragraph::new(Line::from(hints));
    frame.render_widget(status, area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create a centered popup
    let popup_width = 50;
    let popup_height = 13;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key("  ↑/↓ or j/k    ", "Select repository"),
        key("  g             ", "Generate summary"),
        key("  r             ", "Refetch all commits"),
        key("  x             ", "Stop tracking and quit"),
        key("  ?             ", "Show/hide this help"),
        key("  q             ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
