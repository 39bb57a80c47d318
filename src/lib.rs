//! ezText - expand user-defined keyboard shortcuts into stored text.
//!
//! This library is the non-GUI half of the `eztext` binary: the canonical
//! key grammar, the reserved-shortcut denylist, the shortcut registry with
//! its OS binding lifecycle, the INI-style store, and the self-update
//! client. The UI is an external collaborator wired in through
//! [`registry::RegistryObserver`] and [`dispatch::FocusQuery`].

pub mod binder;
pub mod dispatch;
pub mod errors;
pub mod keys;
pub mod registry;
pub mod reserved;
pub mod settings;
pub mod store;
pub mod updater;

#[cfg(windows)]
pub mod autostart;
#[cfg(windows)]
pub mod keyboard;

pub use binder::{HotkeyBinder, HotkeyCallback, NullBinder};
pub use dispatch::{ExpansionDispatcher, FocusQuery, InputFocusState, NoopEmitter, TextEmitter};
pub use errors::{
    BinderError, EzTextError, KeyboardError, RegistryError, Result, StoreError,
};
pub use keys::{build_shortcut_string, normalize, ShortcutKey};
pub use registry::{NoopObserver, RegistryEntry, RegistryObserver, ShortcutRegistry};
pub use store::ShortcutStore;
pub use updater::{UpdateChecker, Version};

/// Application version advertised to the update checker.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store file name, used until the settings point elsewhere.
pub const STORE_FILE_NAME: &str = "ezTextShortcut.ini";

pub const REPO_OWNER: &str = "gloriouslegacy";
pub const REPO_NAME: &str = "ezText";
