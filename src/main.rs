use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use minimo::showln;
use tracing_subscriber::EnvFilter;

use eztext::dispatch::{ExpansionDispatcher, FocusQuery, InputFocusState, NoopEmitter, TextEmitter};
use eztext::errors::StoreError;
use eztext::registry::{NoopObserver, ShortcutRegistry};
use eztext::settings::{self, Settings};
use eztext::store::ShortcutStore;
use eztext::updater::{self, UpdateChecker};
use eztext::{HotkeyBinder, NullBinder};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("run") => run(),
        Some("add") => cli_add(&args[2..]),
        Some("remove") => cli_remove(&args[2..]),
        Some("clear") => cli_clear(),
        Some("list") => cli_list(),
        Some("edit") => cli_edit(),
        Some("autostart") => cli_autostart(args.get(2).map(String::as_str)),
        Some("check-update") => cli_check_update(false),
        Some("update") => cli_check_update(true),
        Some("help") | Some("--help") | Some("-h") => {
            usage(None);
            Ok(())
        }
        Some(other) => {
            usage(Some(other));
            Ok(())
        }
    }
}

fn usage(unknown: Option<&str>) {
    if let Some(command) = unknown {
        showln!(red_bold, "unknown command '", white_bold, command, red_bold, "'");
    }
    showln!(white_bold, "eztext ", gray_dim, eztext::VERSION);
    showln!(gray_dim, "  eztext run                      start the background expander");
    showln!(gray_dim, "  eztext add <shortcut> <text>    bind a shortcut to text");
    showln!(gray_dim, "  eztext remove <shortcut>        unbind a shortcut");
    showln!(gray_dim, "  eztext clear                    remove every shortcut");
    showln!(gray_dim, "  eztext list                     show the current table");
    showln!(gray_dim, "  eztext edit                     open the store in an editor");
    showln!(gray_dim, "  eztext autostart [on|off]       run at login");
    showln!(gray_dim, "  eztext check-update             query the latest release");
    showln!(gray_dim, "  eztext update                   download and run the installer");
}

fn current_store_path() -> Result<std::path::PathBuf> {
    let settings = Settings::load_from(&Settings::default_path()?);
    Ok(match settings.last_store {
        Some(path) => path,
        None => settings::default_store_path()?,
    })
}

fn open_registry(
    binder: Arc<dyn HotkeyBinder>,
    focus: Arc<dyn FocusQuery>,
    emitter: Arc<dyn TextEmitter>,
) -> Result<ShortcutRegistry> {
    let store = ShortcutStore::new(current_store_path()?);
    let dispatcher = ExpansionDispatcher::new(focus, emitter);
    Ok(ShortcutRegistry::open(
        store,
        binder,
        dispatcher,
        Box::new(NoopObserver),
    ))
}

/// Registry for one-shot store edits: full validation and auto-save, no
/// OS bindings.
fn open_offline_registry() -> Result<ShortcutRegistry> {
    open_registry(
        Arc::new(NullBinder::new()),
        InputFocusState::new(),
        Arc::new(NoopEmitter),
    )
}

fn cli_add(rest: &[String]) -> Result<()> {
    let (shortcut, text) = match rest {
        [shortcut, text_parts @ ..] if !text_parts.is_empty() => {
            (shortcut.as_str(), text_parts.join(" "))
        }
        _ => {
            showln!(red_bold, "usage: eztext add <shortcut> <text>");
            return Ok(());
        }
    };

    let mut registry = open_offline_registry()?;
    registry
        .hydrate()
        .context("failed to load the shortcut store")?;
    match registry.add(shortcut, &text) {
        Ok(()) => {
            let added = registry.entries().last().expect("entry was just added");
            showln!(green_bold, "added ", white_bold, added.key.as_str());
        }
        Err(e) => showln!(red_bold, e.to_string()),
    }
    Ok(())
}

fn cli_remove(rest: &[String]) -> Result<()> {
    let Some(shortcut) = rest.first() else {
        showln!(red_bold, "usage: eztext remove <shortcut>");
        return Ok(());
    };

    let mut registry = open_offline_registry()?;
    registry
        .hydrate()
        .context("failed to load the shortcut store")?;
    match registry.remove(shortcut) {
        Ok(()) => {
            showln!(green_bold, "removed ", white_bold, shortcut);
        }
        Err(e) => showln!(red_bold, e.to_string()),
    }
    Ok(())
}

fn cli_clear() -> Result<()> {
    let mut registry = open_offline_registry()?;
    registry
        .hydrate()
        .context("failed to load the shortcut store")?;
    let count = registry.len();
    registry.remove_all()?;
    showln!(green_bold, "removed ", white_bold, count, green_bold, " shortcut(s)");
    Ok(())
}

fn cli_list() -> Result<()> {
    let store_path = current_store_path()?;
    let store = ShortcutStore::new(&store_path);

    showln!(
        yellow_bold,
        "┌─",
        white_bold,
        " EZTEXT",
        yellow_bold,
        " ───────────────────────────────────────────────────────"
    );
    showln!(yellow_bold, "│ ", green_bold, store_path.display());
    match store.read() {
        Ok(pairs) if pairs.is_empty() => {
            showln!(yellow_bold, "│ ", gray_dim, "no shortcuts yet");
        }
        Ok(pairs) => {
            for (shortcut, text) in &pairs {
                let flat = text.replace('\n', " ");
                let width = 50_usize.saturating_sub(shortcut.len()).max(10);
                let trimmed = minimo::text::chop(&flat, width)[0].clone();
                showln!(
                    yellow_bold,
                    "│ ",
                    yellow_bold,
                    "▫ ",
                    gray_dim,
                    shortcut,
                    cyan_bold,
                    " ⋯→ ",
                    white_bold,
                    trimmed
                );
            }
        }
        Err(StoreError::NotFound(_)) => {
            showln!(yellow_bold, "│ ", gray_dim, "no shortcuts yet");
        }
        Err(e) => showln!(red_bold, e.to_string()),
    }
    showln!(
        yellow_bold,
        "└───────────────────────────────────────────────────────────────"
    );
    Ok(())
}

fn cli_edit() -> Result<()> {
    let store_path = current_store_path()?;
    let store = ShortcutStore::new(&store_path);
    if !store_path.exists() {
        store.write(&[])?;
    }

    let editor = which::which("code")
        .or_else(|_| which::which("notepad"))
        .map_err(|_| anyhow::anyhow!("no editor found; install Notepad or VS Code"))?;
    std::process::Command::new(editor)
        .arg(&store_path)
        .spawn()
        .context("failed to launch the editor")?;
    Ok(())
}

#[cfg(windows)]
fn cli_autostart(arg: Option<&str>) -> Result<()> {
    match arg {
        Some("on") => {
            let exe = env::current_exe().context("failed to resolve the executable path")?;
            eztext::autostart::enable(&exe)?;
            persist_autostart_setting(true)?;
            showln!(green_bold, "autostart enabled");
        }
        Some("off") => {
            eztext::autostart::disable()?;
            persist_autostart_setting(false)?;
            showln!(green_bold, "autostart disabled");
        }
        _ => {
            let state = if eztext::autostart::is_enabled()? {
                "on"
            } else {
                "off"
            };
            showln!(gray_dim, "autostart is ", white_bold, state);
        }
    }
    Ok(())
}

#[cfg(windows)]
fn persist_autostart_setting(enabled: bool) -> Result<()> {
    let path = Settings::default_path()?;
    let mut settings = Settings::load_from(&path);
    settings.autostart = enabled;
    settings.save_to(&path)?;
    Ok(())
}

#[cfg(not(windows))]
fn cli_autostart(_arg: Option<&str>) -> Result<()> {
    showln!(red_bold, "autostart is only available on Windows");
    Ok(())
}

fn cli_check_update(install: bool) -> Result<()> {
    let checker = UpdateChecker::new(eztext::VERSION, eztext::REPO_OWNER, eztext::REPO_NAME)?;
    showln!(gray_dim, "checking for updates...");
    match checker.check()? {
        None => {
            showln!(
                green_bold,
                "already on the latest version (",
                white_bold,
                eztext::VERSION,
                green_bold,
                ")"
            );
        }
        Some(release) => {
            showln!(
                yellow_bold,
                "new version available: ",
                white_bold,
                release.version.to_string()
            );
            match (install, release.download_url) {
                (true, Some(url)) => {
                    showln!(gray_dim, "downloading installer...");
                    updater::download_and_launch(&url)?;
                    showln!(
                        green_bold,
                        "installer started; close ezText to finish updating"
                    );
                }
                (true, None) => {
                    showln!(
                        red_bold,
                        "the release has no installer asset; see ",
                        white_bold,
                        release.html_url
                    );
                }
                (false, _) => {
                    showln!(
                        gray_dim,
                        "run ",
                        white_bold,
                        "eztext update",
                        gray_dim,
                        " to install it"
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(windows)]
enum Message {
    UpdateAvailable(updater::ReleaseInfo),
    Quit,
}

#[cfg(windows)]
fn run() -> Result<()> {
    use crossbeam_channel::bounded;
    use eztext::binder::SystemHotkeyBinder;
    use eztext::keyboard::SystemKeyboard;
    use tracing::{error, info};

    let guard = single_instance::SingleInstance::new("eztext-single-instance")
        .map_err(|e| anyhow::anyhow!("single-instance guard failed: {e}"))?;
    if !guard.is_single() {
        showln!(yellow_bold, "ezText is already running.");
        return Ok(());
    }

    let focus = InputFocusState::new();
    let binder =
        Arc::new(SystemHotkeyBinder::new().context("failed to start the hotkey listener")?);
    let mut registry = open_registry(
        binder as Arc<dyn HotkeyBinder>,
        focus,
        Arc::new(SystemKeyboard::default()),
    )?;
    match registry.hydrate() {
        Ok(()) => info!(
            store = %registry.store_path().display(),
            entries = registry.len(),
            "shortcuts loaded"
        ),
        Err(e) => error!("failed to load the shortcut store: {e}"),
    }

    let (sender, receiver) = bounded(8);
    spawn_update_check(sender.clone());
    let quit_sender = sender.clone();
    ctrlc::set_handler(move || {
        let _ = quit_sender.send(Message::Quit);
    })
    .context("failed to install the ctrl-c handler")?;

    info!("ezText is running; press ctrl-c to exit");
    while let Ok(message) = receiver.recv() {
        match message {
            Message::UpdateAvailable(release) => {
                info!(
                    version = %release.version,
                    "a new version is available; run 'eztext update' to install"
                );
            }
            Message::Quit => break,
        }
    }

    registry.close();
    info!("ezText stopped");
    Ok(())
}

/// Silent startup check, fire-and-forget relative to the registry.
#[cfg(windows)]
fn spawn_update_check(sender: crossbeam_channel::Sender<Message>) {
    std::thread::spawn(move || {
        let checker =
            match UpdateChecker::new(eztext::VERSION, eztext::REPO_OWNER, eztext::REPO_NAME) {
                Ok(checker) => checker,
                Err(e) => {
                    tracing::warn!("update checker unavailable: {e}");
                    return;
                }
            };
        match checker.check() {
            Ok(Some(release)) => {
                let _ = sender.send(Message::UpdateAvailable(release));
            }
            Ok(None) => tracing::debug!("already on the latest version"),
            Err(e) => tracing::warn!("startup update check failed: {e}"),
        }
    });
}

#[cfg(not(windows))]
fn run() -> Result<()> {
    anyhow::bail!(
        "the background expander only runs on Windows; store-editing commands work everywhere"
    )
}
