//! Key editor modal
//!
//! Small state machine: open → load-existing-key → edit → save-or-cancel →
//! close. The modal holds at most one key record; opening it for a new host
//! discards any unsaved edit for the previous one. In-flight fetches are
//! never cancelled: a response that arrives after the modal closed or
//! switched hosts is discarded by the generation + hostname guard instead.

use fleetdash_core::Error;

/// Lifecycle phase of an open editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the host's existing key to load
    Loading,
    /// Operator editing the PEM text
    Editing,
    /// Save request in flight
    Saving,
}

/// Save request produced by [`KeyEditor::begin_save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub generation: u64,
    pub hostname: String,
    pub public_key_pem: String,
}

#[derive(Debug)]
struct EditorState {
    phase: Phase,
    hostname: String,
    buffer: String,
    error: Option<String>,
}

/// Modal state; closed when no editor state is held
#[derive(Debug, Default)]
pub struct KeyEditor {
    state: Option<EditorState>,
    generation: u64,
}

impl KeyEditor {
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state.as_ref().map(|s| s.phase)
    }

    /// Target hostname, recorded at open time and visible immediately
    pub fn hostname(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.hostname.as_str())
    }

    /// Current PEM text
    pub fn buffer(&self) -> &str {
        self.state.as_ref().map_or("", |s| s.buffer.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.error.as_deref())
    }

    /// Open the editor for a host. The hostname shows immediately while the
    /// existing key loads; the returned generation tags the fetch so a late
    /// response can be matched against the modal's state at arrival time.
    pub fn open(&mut self, hostname: impl Into<String>) -> u64 {
        self.generation += 1;
        self.state = Some(EditorState {
            phase: Phase::Loading,
            hostname: hostname.into(),
            buffer: String::new(),
            error: None,
        });
        self.generation
    }

    /// Close without saving, from any phase
    pub fn close(&mut self) {
        self.state = None;
    }

    /// Apply a completed key fetch. "No key configured" and "fetch failed"
    /// both arrive as `None` and present as an empty key. Returns false when
    /// the response is stale (generation or hostname no longer match, or the
    /// modal is not Loading) and was discarded.
    pub fn apply_loaded(&mut self, generation: u64, hostname: &str, pem: Option<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.phase != Phase::Loading || state.hostname != hostname {
            return false;
        }
        state.buffer = pem.unwrap_or_default();
        state.phase = Phase::Editing;
        true
    }

    /// Trim the buffer and produce the save request. An empty hostname is
    /// rejected locally with a visible error and no request; an empty
    /// trimmed buffer is still sent, as an explicit empty string meaning
    /// "clear the key".
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        let generation = self.generation;
        let state = self.state.as_mut()?;
        if state.phase != Phase::Editing {
            return None;
        }
        if state.hostname.is_empty() {
            state.error = Some("hostname is required".to_string());
            return None;
        }
        state.phase = Phase::Saving;
        state.error = None;
        Some(SaveRequest {
            generation,
            hostname: state.hostname.clone(),
            public_key_pem: state.buffer.trim().to_string(),
        })
    }

    /// Save succeeded: close the modal. Returns false for a stale response.
    pub fn finish_save(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.state.as_ref() {
            Some(state) if state.phase == Phase::Saving => {
                self.state = None;
                true
            }
            _ => false,
        }
    }

    /// Save failed: return to Editing with the operator's text intact and
    /// the error visible. Returns false for a stale response.
    pub fn fail_save(&mut self, generation: u64, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.state.as_mut() {
            Some(state) if state.phase == Phase::Saving => {
                state.phase = Phase::Editing;
                state.error = Some(message);
                true
            }
            _ => false,
        }
    }

    pub fn input(&mut self, c: char) {
        if let Some(state) = self.state.as_mut() {
            if state.phase == Phase::Editing {
                state.buffer.push(c);
            }
        }
    }

    pub fn newline(&mut self) {
        self.input('\n');
    }

    pub fn backspace(&mut self) {
        if let Some(state) = self.state.as_mut() {
            if state.phase == Phase::Editing {
                state.buffer.pop();
            }
        }
    }
}

/// Operator-visible save failure label, preferring the backend-provided
/// detail over a generic one
pub fn save_error_message(error: &Error) -> String {
    match error {
        Error::Backend {
            detail: Some(detail),
            ..
        } => format!("save failed: {}", detail),
        Error::Backend { .. } => "save failed: unknown error".to_string(),
        _ => "save failed: network error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_records_hostname_before_key_loads() {
        let mut editor = KeyEditor::default();
        editor.open("node-1");
        assert_eq!(editor.phase(), Some(Phase::Loading));
        assert_eq!(editor.hostname(), Some("node-1"));
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_loaded_key_populates_buffer() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        assert!(editor.apply_loaded(generation, "node-1", Some("PEM".to_string())));
        assert_eq!(editor.phase(), Some(Phase::Editing));
        assert_eq!(editor.buffer(), "PEM");
    }

    #[test]
    fn test_missing_key_and_fetch_failure_present_as_empty() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        assert!(editor.apply_loaded(generation, "node-1", None));
        assert_eq!(editor.phase(), Some(Phase::Editing));
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_late_response_after_close_is_discarded() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        editor.close();
        assert!(!editor.apply_loaded(generation, "node-1", Some("PEM".to_string())));
        assert!(!editor.is_open());
    }

    #[test]
    fn test_late_response_for_previous_host_is_discarded() {
        let mut editor = KeyEditor::default();
        let stale = editor.open("node-1");
        editor.open("node-2");
        assert!(!editor.apply_loaded(stale, "node-1", Some("OLD PEM".to_string())));
        assert_eq!(editor.hostname(), Some("node-2"));
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_reopen_same_host_issues_fresh_fetch() {
        let mut editor = KeyEditor::default();
        let first = editor.open("node-1");
        editor.close();
        let second = editor.open("node-1");
        assert_ne!(first, second);

        // The abandoned fetch cannot satisfy the new open
        assert!(!editor.apply_loaded(first, "node-1", Some("STALE".to_string())));
        assert!(editor.apply_loaded(second, "node-1", Some("FRESH".to_string())));
        assert_eq!(editor.buffer(), "FRESH");
    }

    #[test]
    fn test_save_trims_and_sends_empty_string_to_clear() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        editor.apply_loaded(generation, "node-1", Some("  \n ".to_string()));
        let request = editor.begin_save().unwrap();
        assert_eq!(request.public_key_pem, "");
        assert_eq!(request.hostname, "node-1");
        assert_eq!(editor.phase(), Some(Phase::Saving));
    }

    #[test]
    fn test_save_requires_hostname() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("");
        editor.apply_loaded(generation, "", Some("PEM".to_string()));
        assert!(editor.begin_save().is_none());
        assert_eq!(editor.error(), Some("hostname is required"));
        assert_eq!(editor.phase(), Some(Phase::Editing));
    }

    #[test]
    fn test_save_rejected_while_loading() {
        let mut editor = KeyEditor::default();
        editor.open("node-1");
        assert!(editor.begin_save().is_none());
        assert_eq!(editor.phase(), Some(Phase::Loading));
    }

    #[test]
    fn test_failed_save_keeps_text_and_shows_detail() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        editor.apply_loaded(generation, "node-1", Some("PEM TEXT".to_string()));
        editor.begin_save().unwrap();

        assert!(editor.fail_save(generation, "save failed: invalid key".to_string()));
        assert_eq!(editor.phase(), Some(Phase::Editing));
        assert_eq!(editor.buffer(), "PEM TEXT");
        assert_eq!(editor.error(), Some("save failed: invalid key"));
    }

    #[test]
    fn test_successful_save_closes_modal() {
        let mut editor = KeyEditor::default();
        let generation = editor.open("node-1");
        editor.apply_loaded(generation, "node-1", Some("PEM".to_string()));
        editor.begin_save().unwrap();

        assert!(editor.finish_save(generation));
        assert!(!editor.is_open());
    }

    #[test]
    fn test_typing_is_ignored_while_loading() {
        let mut editor = KeyEditor::default();
        editor.open("node-1");
        editor.input('x');
        editor.backspace();
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_save_error_message_prefers_backend_detail() {
        let backend = Error::Backend {
            status: 400,
            detail: Some("invalid PEM".to_string()),
        };
        assert_eq!(save_error_message(&backend), "save failed: invalid PEM");

        let bare = Error::Backend {
            status: 500,
            detail: None,
        };
        assert_eq!(save_error_message(&bare), "save failed: unknown error");

        let network = Error::Network("connection refused".to_string());
        assert_eq!(save_error_message(&network), "save failed: network error");
    }
}
