//! Per-binding expansion callbacks.
//!
//! Each active binding owns an immutable copy of its expansion text; the
//! registry never mutates a live binding, it replaces it. A callback
//! therefore only ever reads its captured text plus the live focus query,
//! which keeps dispatch lock-free against UI-thread edits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::binder::HotkeyCallback;
use crate::errors::KeyboardError;
use crate::keys::ShortcutKey;

/// Answers, at dispatch time, whether one of the application's own
/// text-entry controls holds input focus. When it does, a hotkey press is
/// ordinary typing, not an expansion request.
pub trait FocusQuery: Send + Sync {
    fn own_input_focused(&self) -> bool;
}

/// Emits text as synthesized keyboard input to whichever application has
/// system focus.
pub trait TextEmitter: Send + Sync {
    fn emit(&self, text: &str) -> Result<(), KeyboardError>;
}

/// Builds the callbacks captured by active bindings.
pub struct ExpansionDispatcher {
    focus: Arc<dyn FocusQuery>,
    emitter: Arc<dyn TextEmitter>,
}

impl ExpansionDispatcher {
    pub fn new(focus: Arc<dyn FocusQuery>, emitter: Arc<dyn TextEmitter>) -> Self {
        Self { focus, emitter }
    }

    /// The callback runs on the binder's dispatch context. Emission
    /// failures are logged and dropped; nothing here may block or
    /// propagate into the listener.
    pub fn callback_for(&self, key: &ShortcutKey, text: &str) -> HotkeyCallback {
        let key = key.to_string();
        let text: Arc<str> = Arc::from(text);
        let focus = Arc::clone(&self.focus);
        let emitter = Arc::clone(&self.emitter);
        Arc::new(move || {
            if focus.own_input_focused() {
                debug!(%key, "expansion suppressed while an input field has focus");
                return;
            }
            if let Err(e) = emitter.emit(&text) {
                warn!(%key, "failed to emit expansion: {e}");
            }
        })
    }
}

/// Editing-state flag flipped by the UI collaborator on focus in/out of
/// its text-entry controls. On Windows the flag only counts while a
/// window of this process is in the foreground.
#[derive(Default)]
pub struct InputFocusState {
    editing: AtomicBool,
}

impl InputFocusState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_editing(&self, editing: bool) {
        self.editing.store(editing, Ordering::SeqCst);
    }
}

impl FocusQuery for InputFocusState {
    fn own_input_focused(&self) -> bool {
        if !self.editing.load(Ordering::SeqCst) {
            return false;
        }
        #[cfg(windows)]
        {
            crate::keyboard::foreground_window_is_ours()
        }
        #[cfg(not(windows))]
        {
            true
        }
    }
}

/// Emitter for contexts where expansions can never fire, such as one-shot
/// CLI store edits.
pub struct NoopEmitter;

impl TextEmitter for NoopEmitter {
    fn emit(&self, _text: &str) -> Result<(), KeyboardError> {
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;

    /// Records every emission instead of synthesizing input; can be told
    /// to fail to exercise the swallow-and-log path.
    #[derive(Default)]
    pub struct RecordingEmitter {
        emitted: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingEmitter {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn emitted(&self) -> Vec<String> {
            self.emitted.lock().clone()
        }

        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl TextEmitter for RecordingEmitter {
        fn emit(&self, text: &str) -> Result<(), KeyboardError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(KeyboardError::Input("simulated emission failure".to_string()));
            }
            self.emitted.lock().push(text.to_string());
            Ok(())
        }
    }

    /// Focus query with a settable answer.
    #[derive(Default)]
    pub struct FixedFocus(AtomicBool);

    impl FixedFocus {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn set_focused(&self, focused: bool) {
            self.0.store(focused, Ordering::SeqCst);
        }
    }

    impl FocusQuery for FixedFocus {
        fn own_input_focused(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }
}
