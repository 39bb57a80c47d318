//! OS hotkey facility boundary.
//!
//! The registry depends on this contract and nothing else about the OS:
//! register a callback for a canonical combination, unregister it by the
//! same string. `unregister` must not return until further callback
//! invocations are impossible; remove-then-add update sequences rely on
//! that to stay race-free.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::BinderError;
use crate::keys::ShortcutKey;

/// Callback invoked on the binder's dispatch context when its combination
/// fires anywhere in the system.
pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync + 'static>;

pub trait HotkeyBinder: Send + Sync {
    fn register(&self, key: &ShortcutKey, callback: HotkeyCallback) -> Result<(), BinderError>;
    fn unregister(&self, key: &ShortcutKey) -> Result<(), BinderError>;
}

/// Accepts registrations without touching the OS. One-shot CLI edits use
/// this: their bindings cannot outlive the process, so only the
/// bookkeeping (and the `NotBound` contract) matters.
#[derive(Default)]
pub struct NullBinder {
    bound: Mutex<HashSet<String>>,
}

impl NullBinder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HotkeyBinder for NullBinder {
    fn register(&self, key: &ShortcutKey, _callback: HotkeyCallback) -> Result<(), BinderError> {
        self.bound.lock().insert(key.as_str().to_string());
        Ok(())
    }

    fn unregister(&self, key: &ShortcutKey) -> Result<(), BinderError> {
        if self.bound.lock().remove(key.as_str()) {
            Ok(())
        } else {
            Err(BinderError::NotBound(key.to_string()))
        }
    }
}

#[cfg(windows)]
pub use system::SystemHotkeyBinder;

#[cfg(windows)]
mod system {
    use super::{BinderError, HotkeyBinder, HotkeyCallback, ShortcutKey};
    use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;
    use std::{io, mem, ptr, thread};
    use tracing::{debug, error};
    use winapi::shared::minwindef::UINT;
    use winapi::um::processthreadsapi::GetCurrentThreadId;
    use winapi::um::winuser::{
        DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, RegisterHotKey,
        TranslateMessage, UnregisterHotKey, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT,
        MOD_WIN, MSG, PM_NOREMOVE, VK_BACK, VK_DELETE, VK_DOWN, VK_END, VK_ESCAPE, VK_F1,
        VK_HOME, VK_INSERT, VK_LEFT, VK_NEXT, VK_PAUSE, VK_PRIOR, VK_RETURN, VK_RIGHT,
        VK_SNAPSHOT, VK_SPACE, VK_TAB, VK_UP, WM_HOTKEY, WM_NULL, WM_USER,
    };

    enum Command {
        Register {
            id: i32,
            modifiers: UINT,
            vk: UINT,
            key: String,
            callback: HotkeyCallback,
            reply: Sender<Result<(), BinderError>>,
        },
        Unregister {
            id: i32,
            key: String,
            reply: Sender<Result<(), BinderError>>,
        },
        Shutdown,
    }

    /// Global hotkeys through `RegisterHotKey`. A dedicated worker thread
    /// owns the Win32 message loop; registration and deregistration are
    /// synchronous round-trips onto that thread, and `WM_HOTKEY` dispatch
    /// runs callbacks there as well. The unregister reply is sent only
    /// after the callback entry is gone from the dispatch table, so a
    /// completed `unregister` guarantees no further invocation.
    pub struct SystemHotkeyBinder {
        commands: Sender<Command>,
        thread_id: u32,
        ids: Mutex<HashMap<String, i32>>,
        next_id: AtomicI32,
        worker: Mutex<Option<thread::JoinHandle<()>>>,
    }

    impl SystemHotkeyBinder {
        pub fn new() -> io::Result<Self> {
            let (commands, command_rx) = unbounded();
            let (ready_tx, ready_rx) = bounded(1);
            let worker = thread::Builder::new()
                .name("eztext-hotkeys".to_string())
                .spawn(move || worker_loop(command_rx, ready_tx))?;
            let thread_id = ready_rx.recv().map_err(|_| {
                io::Error::new(io::ErrorKind::Other, "hotkey worker died during startup")
            })?;
            Ok(Self {
                commands,
                thread_id,
                ids: Mutex::new(HashMap::new()),
                next_id: AtomicI32::new(1),
                worker: Mutex::new(Some(worker)),
            })
        }

        fn wake(&self) {
            unsafe {
                PostThreadMessageW(self.thread_id, WM_NULL, 0, 0);
            }
        }

        fn round_trip(
            &self,
            command: Command,
            reply_rx: Receiver<Result<(), BinderError>>,
            key: &ShortcutKey,
        ) -> Result<(), BinderError> {
            self.commands.send(command).map_err(|_| BinderError::Rejected {
                key: key.to_string(),
                reason: "hotkey worker is gone".to_string(),
            })?;
            self.wake();
            reply_rx.recv().map_err(|_| BinderError::Rejected {
                key: key.to_string(),
                reason: "hotkey worker is gone".to_string(),
            })?
        }
    }

    impl HotkeyBinder for SystemHotkeyBinder {
        fn register(&self, key: &ShortcutKey, callback: HotkeyCallback) -> Result<(), BinderError> {
            let (modifiers, vk) = os_combination(key)?;
            let mut ids = self.ids.lock();
            if ids.contains_key(key.as_str()) {
                return Err(BinderError::Rejected {
                    key: key.to_string(),
                    reason: "already registered by this process".to_string(),
                });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let (reply, reply_rx) = bounded(1);
            self.round_trip(
                Command::Register {
                    id,
                    modifiers,
                    vk,
                    key: key.to_string(),
                    callback,
                    reply,
                },
                reply_rx,
                key,
            )?;
            ids.insert(key.as_str().to_string(), id);
            debug!(key = %key, "hotkey registered");
            Ok(())
        }

        fn unregister(&self, key: &ShortcutKey) -> Result<(), BinderError> {
            let mut ids = self.ids.lock();
            let id = ids
                .remove(key.as_str())
                .ok_or_else(|| BinderError::NotBound(key.to_string()))?;
            let (reply, reply_rx) = bounded(1);
            self.round_trip(
                Command::Unregister {
                    id,
                    key: key.to_string(),
                    reply,
                },
                reply_rx,
                key,
            )?;
            debug!(key = %key, "hotkey unregistered");
            Ok(())
        }
    }

    impl Drop for SystemHotkeyBinder {
        fn drop(&mut self) {
            let _ = self.commands.send(Command::Shutdown);
            self.wake();
            if let Some(worker) = self.worker.lock().take() {
                let _ = worker.join();
            }
        }
    }

    fn worker_loop(commands: Receiver<Command>, ready: Sender<u32>) {
        let mut callbacks: HashMap<i32, HotkeyCallback> = HashMap::new();
        unsafe {
            // force the thread message queue into existence before anyone
            // can PostThreadMessageW at us
            let mut msg: MSG = mem::zeroed();
            PeekMessageW(&mut msg, ptr::null_mut(), WM_USER, WM_USER, PM_NOREMOVE);
            let _ = ready.send(GetCurrentThreadId());

            loop {
                if GetMessageW(&mut msg, ptr::null_mut(), 0, 0) <= 0 {
                    break;
                }
                match msg.message {
                    WM_HOTKEY => {
                        let id = msg.wParam as i32;
                        if let Some(callback) = callbacks.get(&id) {
                            let callback = Arc::clone(callback);
                            callback();
                        }
                    }
                    WM_NULL => {
                        let mut shutdown = false;
                        for command in commands.try_iter() {
                            match command {
                                Command::Register {
                                    id,
                                    modifiers,
                                    vk,
                                    key,
                                    callback,
                                    reply,
                                } => {
                                    let ok =
                                        RegisterHotKey(ptr::null_mut(), id, modifiers, vk) != 0;
                                    let result = if ok {
                                        callbacks.insert(id, callback);
                                        Ok(())
                                    } else {
                                        Err(BinderError::Rejected {
                                            key,
                                            reason: io::Error::last_os_error().to_string(),
                                        })
                                    };
                                    let _ = reply.send(result);
                                }
                                Command::Unregister { id, key, reply } => {
                                    // remove before replying: once the caller
                                    // sees the reply, no dispatch can find the
                                    // callback on this thread again
                                    callbacks.remove(&id);
                                    let result = if UnregisterHotKey(ptr::null_mut(), id) != 0 {
                                        Ok(())
                                    } else {
                                        Err(BinderError::NotBound(key))
                                    };
                                    let _ = reply.send(result);
                                }
                                Command::Shutdown => shutdown = true,
                            }
                        }
                        if shutdown {
                            break;
                        }
                    }
                    _ => {
                        TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }

            for id in callbacks.keys() {
                if UnregisterHotKey(ptr::null_mut(), *id) == 0 {
                    error!(id = *id, "failed to release hotkey during shutdown");
                }
            }
        }
    }

    /// Translate a canonical combination into `RegisterHotKey` arguments:
    /// modifier tokens become MOD_* flags, exactly one remaining token
    /// becomes the virtual-key code.
    fn os_combination(key: &ShortcutKey) -> Result<(UINT, UINT), BinderError> {
        let mut modifiers: UINT = MOD_NOREPEAT as UINT;
        let mut vk: Option<UINT> = None;
        for token in key.tokens() {
            match token {
                "ctrl" => modifiers |= MOD_CONTROL as UINT,
                "alt" => modifiers |= MOD_ALT as UINT,
                "shift" => modifiers |= MOD_SHIFT as UINT,
                "win" => modifiers |= MOD_WIN as UINT,
                other => {
                    if vk.is_some() {
                        return Err(BinderError::Rejected {
                            key: key.to_string(),
                            reason: "more than one non-modifier key".to_string(),
                        });
                    }
                    vk = Some(vk_from_token(other).ok_or_else(|| BinderError::Rejected {
                        key: key.to_string(),
                        reason: format!("unknown key '{other}'"),
                    })?);
                }
            }
        }
        let vk = vk.ok_or_else(|| BinderError::Rejected {
            key: key.to_string(),
            reason: "no non-modifier key in combination".to_string(),
        })?;
        Ok((modifiers, vk))
    }

    fn vk_from_token(token: &str) -> Option<UINT> {
        if token.len() == 1 {
            let c = token.chars().next()?;
            if c.is_ascii_alphanumeric() {
                return Some(c.to_ascii_uppercase() as UINT);
            }
            return None;
        }
        if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
            if (1..=24).contains(&n) {
                return Some(VK_F1 as UINT + n - 1);
            }
        }
        let vk = match token {
            "space" => VK_SPACE,
            "tab" => VK_TAB,
            "enter" | "return" => VK_RETURN,
            "esc" | "escape" => VK_ESCAPE,
            "backspace" => VK_BACK,
            "del" | "delete" => VK_DELETE,
            "ins" | "insert" => VK_INSERT,
            "home" => VK_HOME,
            "end" => VK_END,
            "page up" | "pageup" => VK_PRIOR,
            "page down" | "pagedown" => VK_NEXT,
            "up" => VK_UP,
            "down" => VK_DOWN,
            "left" => VK_LEFT,
            "right" => VK_RIGHT,
            "print screen" | "printscreen" => VK_SNAPSHOT,
            "pause" => VK_PAUSE,
            _ => return None,
        };
        Some(vk as UINT)
    }
}
