//! Dashboard session state and event loop
//!
//! All mutable state lives in one [`App`] value owned by the UI task and
//! dies with the process. Fetches run on spawned tokio tasks and report
//! back over the event channel, so state transitions and rendering only
//! ever happen between network boundaries, never during one. Nothing is
//! cancelled; out-of-order responses are neutralized by identity guards
//! (per-view sequence tokens, the modal's generation, the popup's task id).

use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures_util::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::warn;

use fleetdash_client::ApiClient;
use fleetdash_core::{ClientKey, Error, Server, Task, TaskResult};
use fleetdash_sync::Scheduler;

use crate::forms::{CommandForm, RegisterForm};
use crate::key_editor::{save_error_message, KeyEditor};
use crate::views::{ServersView, TasksView};

/// Health probe cadence; reachability is ambient info, not a polled view
const HEALTH_PROBE_SECS: u64 = 15;

/// Which panel owns keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Servers,
    Tasks,
    Register,
    Command,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Servers => Focus::Tasks,
            Focus::Tasks => Focus::Register,
            Focus::Register => Focus::Command,
            Focus::Command => Focus::Servers,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Servers => Focus::Command,
            Focus::Tasks => Focus::Servers,
            Focus::Register => Focus::Tasks,
            Focus::Command => Focus::Register,
        }
    }
}

/// Result viewer for one task; the task id is bound when the popup opens
/// and late responses for any other id are discarded
#[derive(Debug)]
pub struct ResultsPopup {
    pub task_id: String,
    /// Pretty-printed results once loaded
    pub body: Option<String>,
}

/// Events flowing into the UI task
#[derive(Debug)]
pub enum AppEvent {
    RefreshServers,
    RefreshTasks,
    ServersLoaded {
        seq: u64,
        result: Result<Vec<Server>, Error>,
    },
    TasksLoaded {
        seq: u64,
        result: Result<Vec<Task>, Error>,
    },
    KeyLoaded {
        generation: u64,
        hostname: String,
        result: Result<Option<ClientKey>, Error>,
    },
    KeySaved {
        generation: u64,
        hostname: String,
        result: Result<(), Error>,
    },
    ServerCreated {
        result: Result<(), Error>,
    },
    CommandSubmitted {
        result: Result<(), Error>,
    },
    ResultsLoaded {
        task_id: String,
        result: Result<Vec<TaskResult>, Error>,
    },
    HealthChecked {
        ok: bool,
    },
}

/// One loaded dashboard session
pub struct App {
    client: ApiClient,
    tx: mpsc::UnboundedSender<AppEvent>,
    pub servers: ServersView,
    pub tasks: TasksView,
    pub register_form: RegisterForm,
    pub command_form: CommandForm,
    pub key_editor: KeyEditor,
    pub results: Option<ResultsPopup>,
    pub focus: Focus,
    /// Transient status line message (acknowledgments)
    pub status: Option<String>,
    /// Last health probe verdict; unset until the first probe lands
    pub backend_online: Option<bool>,
    pub last_refresh: Option<chrono::DateTime<chrono::Local>>,
    /// Modal bounds from the last render, for the outside-click check
    pub modal_area: Option<Rect>,
    should_quit: bool,
}

impl App {
    pub fn new(client: ApiClient, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            client,
            tx,
            servers: ServersView::new(),
            tasks: TasksView::new(),
            register_form: RegisterForm::new(),
            command_form: CommandForm::new(),
            key_editor: KeyEditor::default(),
            results: None,
            focus: Focus::Servers,
            status: None,
            backend_online: None,
            last_refresh: None,
            modal_area: None,
            should_quit: false,
        }
    }

    /// Register the two independent view timers plus the health probe.
    /// Both views tick on the same period but on separate loops, so a slow
    /// or failed fetch on one collection never delays the other.
    pub fn start_sync(&self, refresh: Duration) {
        let mut scheduler = Scheduler::new();

        let tx = self.tx.clone();
        scheduler.add_task("servers", refresh, move || {
            let _ = tx.send(AppEvent::RefreshServers);
        });

        let tx = self.tx.clone();
        scheduler.add_task("tasks", refresh, move || {
            let _ = tx.send(AppEvent::RefreshTasks);
        });

        let tx = self.tx.clone();
        let client = self.client.clone();
        scheduler.add_task(
            "health",
            Duration::from_secs(HEALTH_PROBE_SECS),
            move || {
                let tx = tx.clone();
                let client = client.clone();
                tokio::spawn(async move {
                    let ok = client.health().await.is_ok();
                    let _ = tx.send(AppEvent::HealthChecked { ok });
                });
            },
        );

        scheduler.start();
    }

    /// Drive the dashboard until the operator quits
    pub async fn run<B: Backend>(
        mut self,
        terminal: &mut Terminal<B>,
        mut rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();

        loop {
            terminal.draw(|frame| crate::ui::draw(frame, &mut self))?;

            tokio::select! {
                Some(event) = rx.recv() => {
                    self.handle_app_event(event);
                }
                maybe_event = events.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_terminal_event(event);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RefreshServers => self.refresh_servers(),
            AppEvent::RefreshTasks => self.refresh_tasks(),
            AppEvent::ServersLoaded { seq, result } => match result {
                Ok(rows) => {
                    if self.servers.apply(seq, rows) {
                        self.last_refresh = Some(chrono::Local::now());
                    }
                }
                // A failed refresh leaves the previous snapshot in place
                Err(e) => warn!(error = %e, "Server refresh failed"),
            },
            AppEvent::TasksLoaded { seq, result } => match result {
                Ok(rows) => {
                    if self.tasks.apply(seq, rows) {
                        self.last_refresh = Some(chrono::Local::now());
                    }
                }
                Err(e) => warn!(error = %e, "Task refresh failed"),
            },
            AppEvent::KeyLoaded {
                generation,
                hostname,
                result,
            } => {
                // "No key configured" and "fetch failed" are deliberately
                // indistinguishable here: both present as an empty key
                let pem = match result {
                    Ok(key) => key.map(|k| k.public_key_pem),
                    Err(e) => {
                        warn!(hostname = %hostname, error = %e, "Key fetch failed");
                        None
                    }
                };
                self.key_editor.apply_loaded(generation, &hostname, pem);
            }
            AppEvent::KeySaved {
                generation,
                hostname,
                result,
            } => match result {
                Ok(()) => {
                    self.key_editor.finish_save(generation);
                    self.status = Some(format!("public key saved for {}", hostname));
                }
                Err(e) => {
                    self.key_editor.fail_save(generation, save_error_message(&e));
                }
            },
            AppEvent::ServerCreated { result } => {
                if let Err(e) = result {
                    warn!(error = %e, "Server registration failed");
                }
                self.refresh_servers();
            }
            AppEvent::CommandSubmitted { result } => {
                if let Err(e) = result {
                    warn!(error = %e, "Command submission failed");
                }
                self.refresh_tasks();
            }
            AppEvent::ResultsLoaded { task_id, result } => {
                let Some(popup) = self.results.as_mut() else {
                    return;
                };
                if popup.task_id != task_id {
                    return;
                }
                popup.body = Some(match result {
                    Ok(results) => serde_json::to_string_pretty(&results)
                        .unwrap_or_else(|_| "[]".to_string()),
                    Err(e) => format!("failed to load results: {}", e),
                });
            }
            AppEvent::HealthChecked { ok } => self.backend_online = Some(ok),
        }
    }

    fn refresh_servers(&mut self) {
        let seq = self.servers.begin_refresh();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list_servers().await;
            let _ = tx.send(AppEvent::ServersLoaded { seq, result });
        });
    }

    fn refresh_tasks(&mut self) {
        let seq = self.tasks.begin_refresh();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list_tasks().await;
            let _ = tx.send(AppEvent::TasksLoaded { seq, result });
        });
    }

    /// Open the key editor for the selected server row
    fn open_key_editor(&mut self) {
        let Some(hostname) = self.servers.selected().map(|s| s.hostname.clone()) else {
            return;
        };
        let generation = self.key_editor.open(hostname.clone());
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.client_key(&hostname).await;
            let _ = tx.send(AppEvent::KeyLoaded {
                generation,
                hostname,
                result,
            });
        });
    }

    /// Fetch and show the selected task's results; the task id is bound
    /// here, from the applied snapshot, not re-resolved later
    fn open_results(&mut self) {
        let Some(task_id) = self.tasks.selected().map(|t| t.task_id.clone()) else {
            return;
        };
        self.results = Some(ResultsPopup {
            task_id: task_id.clone(),
            body: None,
        });
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.task_results(&task_id).await;
            let _ = tx.send(AppEvent::ResultsLoaded { task_id, result });
        });
    }

    fn submit_register(&mut self) {
        // An empty hostname suppressed the submit entirely
        let Some(payload) = self.register_form.submit() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.create_server(&payload).await;
            let _ = tx.send(AppEvent::ServerCreated { result });
        });
    }

    fn submit_command(&mut self) {
        let Some(request) = self.command_form.submit() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.submit_command(&request).await;
            let _ = tx.send(AppEvent::CommandSubmitted { result });
        });
    }

    fn save_key(&mut self) {
        let Some(request) = self.key_editor.begin_save() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client
                .set_client_key(&request.hostname, &request.public_key_pem)
                .await;
            let _ = tx.send(AppEvent::KeySaved {
                generation: request.generation,
                hostname: request.hostname,
                result,
            });
        });
    }

    fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        // The results popup swallows its dismissal keystroke
        if self.results.is_some() {
            self.results = None;
            return;
        }
        if self.key_editor.is_open() {
            self.handle_modal_key(key);
            return;
        }
        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            _ => match self.focus {
                Focus::Servers => self.handle_servers_key(key),
                Focus::Tasks => self.handle_tasks_key(key),
                Focus::Register => self.handle_register_key(key),
                Focus::Command => self.handle_command_key(key),
            },
        }
    }

    fn handle_servers_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.servers.select_prev(),
            KeyCode::Down => self.servers.select_next(),
            KeyCode::Enter | KeyCode::Char('e') => self.open_key_editor(),
            KeyCode::Char('r') => self.refresh_servers(),
            _ => {}
        }
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.tasks.select_prev(),
            KeyCode::Down => self.tasks.select_next(),
            KeyCode::Enter => self.open_results(),
            KeyCode::Char('r') => self.refresh_tasks(),
            _ => {}
        }
    }

    fn handle_register_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_register(),
            KeyCode::Up => self.register_form.prev_field(),
            KeyCode::Down => self.register_form.next_field(),
            KeyCode::Backspace => self.register_form.backspace(),
            KeyCode::Char(c) => self.register_form.input(c),
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_command(),
            KeyCode::Up => self.command_form.prev_field(),
            KeyCode::Down => self.command_form.next_field(),
            KeyCode::Left | KeyCode::Right => self.command_form.cycle_target_type(),
            KeyCode::Backspace => self.command_form.backspace(),
            KeyCode::Char(c) => self.command_form.input(c),
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.key_editor.close(),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => self.save_key(),
            KeyCode::Enter => self.key_editor.newline(),
            KeyCode::Backspace => self.key_editor.backspace(),
            KeyCode::Char(c) => self.key_editor.input(c),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if self.key_editor.is_open() {
                // A click outside the modal's bounds closes it without saving
                let inside = self
                    .modal_area
                    .is_some_and(|area| contains(area, mouse.column, mouse.row));
                if !inside {
                    self.key_editor.close();
                }
            }
        }
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(ApiClient::new("http://localhost:8000"), tx)
    }

    fn server(hostname: &str) -> Server {
        Server {
            hostname: hostname.to_string(),
            ip: None,
            group: None,
            status: "online".to_string(),
            last_heartbeat: None,
            cpu_usage: None,
            memory_usage: None,
        }
    }

    #[test]
    fn test_failed_refresh_keeps_previous_snapshot() {
        let mut app = app();
        let seq = app.servers.begin_refresh();
        app.handle_app_event(AppEvent::ServersLoaded {
            seq,
            result: Ok(vec![server("node-1")]),
        });

        let seq = app.servers.begin_refresh();
        app.handle_app_event(AppEvent::ServersLoaded {
            seq,
            result: Err(Error::Network("connection refused".to_string())),
        });

        assert_eq!(app.servers.rows().len(), 1);
        assert_eq!(app.servers.rows()[0].hostname, "node-1");
    }

    #[test]
    fn test_out_of_order_snapshot_never_wins() {
        let mut app = app();
        let first = app.servers.begin_refresh();
        let second = app.servers.begin_refresh();

        // The later refresh resolves first; the earlier one arrives late
        app.handle_app_event(AppEvent::ServersLoaded {
            seq: second,
            result: Ok(vec![server("new")]),
        });
        app.handle_app_event(AppEvent::ServersLoaded {
            seq: first,
            result: Ok(vec![server("old")]),
        });

        assert_eq!(app.servers.rows().len(), 1);
        assert_eq!(app.servers.rows()[0].hostname, "new");
    }

    #[test]
    fn test_results_for_another_task_are_ignored() {
        let mut app = app();
        app.results = Some(ResultsPopup {
            task_id: "current".to_string(),
            body: None,
        });

        app.handle_app_event(AppEvent::ResultsLoaded {
            task_id: "stale".to_string(),
            result: Ok(vec![serde_json::json!({"exit_code": 0})]),
        });
        assert!(app.results.as_ref().unwrap().body.is_none());

        app.handle_app_event(AppEvent::ResultsLoaded {
            task_id: "current".to_string(),
            result: Ok(vec![serde_json::json!({"exit_code": 0})]),
        });
        assert!(app.results.as_ref().unwrap().body.is_some());
    }

    #[test]
    fn test_key_save_ack_and_close() {
        let mut app = app();
        let generation = app.key_editor.open("node-1");
        app.key_editor
            .apply_loaded(generation, "node-1", Some("PEM".to_string()));
        app.key_editor.begin_save().unwrap();

        app.handle_app_event(AppEvent::KeySaved {
            generation,
            hostname: "node-1".to_string(),
            result: Ok(()),
        });

        assert!(!app.key_editor.is_open());
        assert_eq!(app.status.as_deref(), Some("public key saved for node-1"));
    }

    #[test]
    fn test_key_load_failure_presents_empty_key() {
        let mut app = app();
        let generation = app.key_editor.open("node-1");

        app.handle_app_event(AppEvent::KeyLoaded {
            generation,
            hostname: "node-1".to_string(),
            result: Err(Error::Network("timeout".to_string())),
        });

        assert_eq!(
            app.key_editor.phase(),
            Some(crate::key_editor::Phase::Editing)
        );
        assert_eq!(app.key_editor.buffer(), "");
    }
}
