// App state and main event loop.
// Renders tracker snapshots and turns key presses into tracker operations.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;
use ratatui::widgets::ListState;

use crate::github::{GitHubClient, RateLimit, TrackedRepository};
use crate::state::{DashboardState, Tracker};
use crate::ui;

/// Main application state.
pub struct App {
    tracker: Arc<Tracker>,
    github: Arc<GitHubClient>,
    /// Latest tracker snapshot, refreshed every frame.
    pub state: DashboardState,
    /// Selection in the repository list.
    pub list_state: ListState,
    /// Last action failure that is not part of the tracker state.
    pub notice: Option<String>,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
}

impl App {
    pub fn new(tracker: Arc<Tracker>, github: Arc<GitHubClient>) -> Self {
        Self {
            tracker,
            github,
            state: DashboardState::default(),
            list_state: ListState::default(),
            notice: None,
            show_help: false,
            should_quit: false,
        }
    }

    /// Main event loop. Starts the first load immediately.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.spawn_load();

        while !self.should_quit {
            self.refresh();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Tracked repositories in selection order.
    pub fn repositories(&self) -> &[TrackedRepository] {
        self.state
            .session
            .as_ref()
            .map(|s| s.repositories.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_repository(&self) -> Option<&TrackedRepository> {
        self.list_state
            .selected()
            .and_then(|i| self.repositories().get(i))
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.github.rate_limit()
    }

    fn refresh(&mut self) {
        self.state = self.tracker.snapshot();

        let len = self.repositories().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            None => self.list_state.select(Some(0)),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    fn spawn_load(&self) {
        let tracker = self.tracker.clone();
        tokio::spawn(async move { tracker.load().await });
    }

    fn spawn_retry(&self) {
        let tracker = self.tracker.clone();
        tokio::spawn(async move { tracker.retry().await });
    }

    fn spawn_summary(&self) {
        let Some(repo_id) = self.selected_repository().map(|r| r.id) else {
            return;
        };
        if self.state.is_generating(repo_id) {
            return;
        }
        let tracker = self.tracker.clone();
        tokio::spawn(async move { tracker.summarize_repository(repo_id).await });
    }

    fn stop_tracking(&mut self) {
        match self.tracker.stop() {
            Ok(()) => self.should_quit = true,
            Err(e) => self.notice = Some(format!("Failed to stop tracking: {}", e)),
        }
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        self.notice = None;
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Char('r') => self.spawn_retry(),
            KeyCode::Char('g') => self.spawn_summary(),
            KeyCode::Char('x') => self.stop_tracking(),
            _ => {}
        }
    }

    /// Select the next repository in the list.
    fn select_next(&mut self) {
        let len = self.repositories().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous repository in the list.
    fn select_prev(&mut self) {
        if self.repositories().is_empty() {
            return;
        }
        let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::source::{MockCommitSource, commit};
    use crate::session::{MemorySessionStore, TrackingSession, repo};
    use crate::state::LoadPhase;
    use crate::summary::generator::mock::MockGenerator;

    fn app() -> App {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")])
            .with_dated("octo/beta", vec![commit("bbb", "2024-01-02T00:00:00Z")]);
        let session = TrackingSession {
            repositories: vec![repo(1, "octo/alpha"), repo(2, "octo/beta")],
            start_date: "2024-01-01T00:00:00Z".parse().unwrap(),
            access_token: "gho_test".to_string(),
        };
        let tracker = Tracker::new(
            Arc::new(source),
            Arc::new(MockGenerator::default()),
            Arc::new(MemorySessionStore::new(Some(session))),
        );
        let github = GitHubClient::with_base_url("http://127.0.0.1:9").unwrap();
        App::new(Arc::new(tracker), Arc::new(github))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_key_works_while_loading() {
        let mut app = app();
        app.state.phase = LoadPhase::Loading;

        app.handle_key(KeyCode::Char('r'));
        tokio::time::sleep(Duration::from_secs(1)).await;

        app.refresh();
        assert_eq!(app.state.phase, LoadPhase::Ready);
        assert_eq!(app.repositories().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_follows_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Char('r'));
        tokio::time::sleep(Duration::from_secs(1)).await;
        app.refresh();
        assert_eq!(app.list_state.selected(), Some(0));

        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected_repository().map(|r| r.id), Some(2));

        app.handle_key(KeyCode::Char('k'));
        assert_eq!(app.selected_repository().map(|r| r.id), Some(1));
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Char('?'));
        app.handle_key(KeyCode::Char('q'));
        assert!(app.show_help);
        assert!(!app.should_quit);

        app.handle_key(KeyCode::Esc);
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.should_quit);
    }
}
