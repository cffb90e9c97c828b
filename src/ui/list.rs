// List and detail rendering for tracked repositories.
// Provides styled list views with loading, error, and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::github::{Commit, TrackedRepository};
use crate::state::{DashboardState, LoadPhase};
use crate::summary::Summary;

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false });
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// Commit count badge for a repository row.
fn commit_badge(state: &DashboardState, repo: &TrackedRepository) -> Span<'static> {
    if state.is_generating(repo.id) {
        return Span::styled(" summarizing…", Style::default().fg(Color::Yellow));
    }
    match state.commits_for(repo.id) {
        Some(commits) => Span::styled(
            format!(" {}", commits.len()),
            Style::default().fg(Color::Green),
        ),
        None if state.phase == LoadPhase::Ready => {
            Span::styled(" ✗", Style::default().fg(Color::Red))
        }
        None => Span::raw(""),
    }
}

/// Render the tracked repositories list.
pub fn render_repositories_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Repositories ");

    if app.repositories().is_empty() {
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);
        match app.state.phase {
            LoadPhase::Loading => render_loading(frame, inner, "Loading tracking data"),
            _ => render_empty(frame, inner, "No repositories tracked"),
        }
        return;
    }

    let items: Vec<ListItem> = app
        .repositories()
        .iter()
        .map(|repo| {
            let visibility = if repo.private { "🔒" } else { "📦" };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} {}", visibility, repo.name)),
                commit_badge(&app.state, repo),
            ]))
        })
        .collect();

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list_widget, area, &mut app.list_state);
}

/// Render the commits of one repository, with insights when a summary has them.
pub fn render_commits(
    frame: &mut Frame,
    state: &DashboardState,
    repo: &TrackedRepository,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", repo.full_name));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match state.commits_for(repo.id) {
        None if state.is_loading() => render_loading(frame, inner, "Fetching commits"),
        None => render_error(frame, inner, "Commits could not be fetched"),
        Some([]) => render_empty(frame, inner, "No commits"),
        Some(commits) => {
            let summary = state.summary_for(repo.id);
            let lines: Vec<Line> = commits
                .iter()
                .flat_map(|commit| commit_lines(commit, summary))
                .collect();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        }
    }
}

fn commit_lines<'a>(commit: &'a Commit, summary: Option<&'a Summary>) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(commit.short_sha(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::raw(commit.title()),
        Span::styled(
            format!(
                "  {} · {}",
                commit.author_name(),
                format_relative_time(&commit.authored_at())
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if let Some(insight) = summary.and_then(|s| s.insight_for(&commit.sha)) {
        lines.push(Line::from(Span::styled(
            format!("        {}", insight),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines
}

/// Render the generated summary for a repository.
pub fn render_summary(
    frame: &mut Frame,
    state: &DashboardState,
    repo: &TrackedRepository,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title(" Summary ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.is_generating(repo.id) {
        render_loading(frame, inner, "Generating summary");
        return;
    }

    match state.summary_for(repo.id) {
        Some(summary) => {
            let footer = format!(
                "{} commits {} · generated {}",
                summary.metadata.commit_count,
                summary.metadata.timeframe,
                format_relative_time(&summary.metadata.generated_at)
            );
            let mut lines: Vec<Line> = summary.summary.lines().map(Line::raw).collect();
            lines.push(Line::raw(""));
            lines.push(Line::styled(footer, Style::default().fg(Color::DarkGray)));
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
        None => render_empty(frame, inner, "Press g to generate a summary"),
    }
}
