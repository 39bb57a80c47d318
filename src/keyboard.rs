//! Windows keyboard synthesis.
//!
//! Expansion text goes out through `SendInput` as unicode scan-code
//! events, so arbitrary text (including non-latin scripts) lands in the
//! focused application without virtual-key translation. Newlines are sent
//! as VK_RETURN so edit controls treat them as line breaks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use std::{io, mem, thread};

use winapi::um::processthreadsapi::GetCurrentProcessId;
use winapi::um::winuser::{
    GetForegroundWindow, GetWindowThreadProcessId, SendInput, INPUT, INPUT_KEYBOARD,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VK_RETURN,
};

use crate::dispatch::TextEmitter;
use crate::errors::KeyboardError;

static GENERATING_INPUT: AtomicBool = AtomicBool::new(false);

/// True while this process is synthesizing keystrokes; lets a keyboard
/// hook tell our own output apart from user input.
pub fn is_generating_input() -> bool {
    GENERATING_INPUT.load(Ordering::SeqCst)
}

/// True when the current foreground window belongs to this process.
pub fn foreground_window_is_ours() -> bool {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            return false;
        }
        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);
        pid == GetCurrentProcessId()
    }
}

// keys per SendInput batch
const BATCH_KEYS: usize = 20;

pub struct SystemKeyboard {
    key_delay: Duration,
}

impl SystemKeyboard {
    pub fn new(key_delay_ms: u64) -> Self {
        Self {
            key_delay: Duration::from_millis(key_delay_ms),
        }
    }

    fn send_batched(&self, inputs: &mut [INPUT]) -> Result<(), KeyboardError> {
        for chunk in inputs.chunks_mut(BATCH_KEYS * 2) {
            let sent = unsafe {
                SendInput(
                    chunk.len() as u32,
                    chunk.as_mut_ptr(),
                    mem::size_of::<INPUT>() as i32,
                )
            };
            if sent != chunk.len() as u32 {
                return Err(KeyboardError::Input(
                    io::Error::last_os_error().to_string(),
                ));
            }
            if !self.key_delay.is_zero() {
                thread::sleep(self.key_delay);
            }
        }
        Ok(())
    }
}

impl Default for SystemKeyboard {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TextEmitter for SystemKeyboard {
    fn emit(&self, text: &str) -> Result<(), KeyboardError> {
        let mut inputs: Vec<INPUT> = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            if ch == '\r' {
                continue;
            }
            if ch == '\n' {
                inputs.extend(key_pair(VK_RETURN as u16, 0, 0));
                continue;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units).iter() {
                inputs.extend(key_pair(0, *unit, KEYEVENTF_UNICODE));
            }
        }

        GENERATING_INPUT.store(true, Ordering::SeqCst);
        let result = self.send_batched(&mut inputs);
        GENERATING_INPUT.store(false, Ordering::SeqCst);
        result
    }
}

fn key_pair(vk: u16, scan: u16, flags: u32) -> [INPUT; 2] {
    [
        key_input(vk, scan, flags),
        key_input(vk, scan, flags | KEYEVENTF_KEYUP),
    ]
}

fn key_input(vk: u16, scan: u16, flags: u32) -> INPUT {
    let mut input = INPUT {
        type_: INPUT_KEYBOARD,
        u: unsafe { mem::zeroed() },
    };
    unsafe {
        let ki = input.u.ki_mut();
        ki.wVk = vk;
        ki.wScan = scan;
        ki.dwFlags = flags;
    }
    input
}
