//! The authoritative shortcut table and its binding lifecycle.
//!
//! All mutation runs on the application's single mutation context; the
//! registry is not designed for concurrent callers. Hotkey callbacks never
//! reach back in here: every active binding captures its own expansion
//! text, so dispatch on the binder thread races nothing. Updates are
//! modeled as unregister-then-register with fresh captures.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::binder::HotkeyBinder;
use crate::dispatch::ExpansionDispatcher;
use crate::errors::{RegistryError, StoreError};
use crate::keys::ShortcutKey;
use crate::reserved;
use crate::store::ShortcutStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key: ShortcutKey,
    pub text: String,
}

/// UI-side collaborator notified after each successful mutation. Bulk
/// operations batch into a single `reloaded` call instead of per-row
/// events, so the UI never has to detach its own change handlers.
pub trait RegistryObserver {
    fn entry_added(&self, index: usize, entry: &RegistryEntry) {
        let _ = (index, entry);
    }
    fn entry_updated(&self, index: usize, entry: &RegistryEntry) {
        let _ = (index, entry);
    }
    fn entry_removed(&self, index: usize, key: &ShortcutKey) {
        let _ = (index, key);
    }
    fn reloaded(&self, entries: &[RegistryEntry]) {
        let _ = entries;
    }
}

/// Observer for headless use.
pub struct NoopObserver;

impl RegistryObserver for NoopObserver {}

pub struct ShortcutRegistry {
    entries: Vec<RegistryEntry>,
    binder: Arc<dyn HotkeyBinder>,
    dispatcher: ExpansionDispatcher,
    store: ShortcutStore,
    observer: Box<dyn RegistryObserver>,
    bulk_depth: u32,
}

impl ShortcutRegistry {
    /// An empty registry over the given store. Call [`hydrate`] to load
    /// what the store holds.
    ///
    /// [`hydrate`]: ShortcutRegistry::hydrate
    pub fn open(
        store: ShortcutStore,
        binder: Arc<dyn HotkeyBinder>,
        dispatcher: ExpansionDispatcher,
        observer: Box<dyn RegistryObserver>,
    ) -> Self {
        Self {
            entries: Vec::new(),
            binder,
            dispatcher,
            store,
            observer,
            bulk_depth: 0,
        }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Expansion text for a combination, if bound.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = ShortcutKey::parse(key)?;
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.text.as_str())
    }

    /// Insert a new (shortcut, text) pair, bind it with the OS, and
    /// auto-save. Rejected cleanly when the key is empty, reserved,
    /// already taken, or refused by the OS.
    pub fn add(&mut self, key: &str, text: &str) -> Result<(), RegistryError> {
        let key = ShortcutKey::parse(key).ok_or(RegistryError::EmptyInput)?;
        if text.trim().is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        self.ensure_admissible(&key)?;

        self.binder
            .register(&key, self.dispatcher.callback_for(&key, text))?;
        self.entries.push(RegistryEntry {
            key,
            text: text.to_string(),
        });
        let index = self.entries.len() - 1;
        info!(key = %self.entries[index].key, "shortcut added");
        self.persist()?;
        if self.bulk_depth == 0 {
            self.observer.entry_added(index, &self.entries[index]);
        }
        Ok(())
    }

    /// In-place edit of either column. Editing only the text keeps the key
    /// and re-binds it with a fresh capture; editing the key re-binds
    /// under the new combination. The entry keeps its position either way.
    pub fn update(
        &mut self,
        old_key: &str,
        new_key: &str,
        new_text: &str,
    ) -> Result<(), RegistryError> {
        let old = ShortcutKey::parse(old_key)
            .ok_or_else(|| RegistryError::NotFound(old_key.to_string()))?;
        let index = self
            .position(&old)
            .ok_or_else(|| RegistryError::NotFound(old.to_string()))?;

        let new = ShortcutKey::parse(new_key).ok_or(RegistryError::EmptyInput)?;
        if new_text.trim().is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        if reserved::is_reserved(&new) {
            return Err(RegistryError::Reserved(new.to_string()));
        }
        if new != old && self.position(&new).is_some() {
            return Err(RegistryError::Duplicate(new.to_string()));
        }

        self.release_one(&old);
        if let Err(e) = self
            .binder
            .register(&new, self.dispatcher.callback_for(&new, new_text))
        {
            // restore the previous binding so a rejected edit leaves the
            // table live
            let previous = &self.entries[index];
            if let Err(restore) = self.binder.register(
                &previous.key,
                self.dispatcher.callback_for(&previous.key, &previous.text),
            ) {
                error!(key = %previous.key, "failed to restore binding after rejected update: {restore}");
            }
            return Err(e.into());
        }

        self.entries[index] = RegistryEntry {
            key: new,
            text: new_text.to_string(),
        };
        info!(key = %self.entries[index].key, "shortcut updated");
        self.persist()?;
        if self.bulk_depth == 0 {
            self.observer.entry_updated(index, &self.entries[index]);
        }
        Ok(())
    }

    /// Release the binding, drop the entry, auto-save.
    pub fn remove(&mut self, key: &str) -> Result<(), RegistryError> {
        let key =
            ShortcutKey::parse(key).ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let index = self
            .position(&key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;

        self.release_one(&key);
        let entry = self.entries.remove(index);
        info!(key = %entry.key, "shortcut removed");
        self.persist()?;
        if self.bulk_depth == 0 {
            self.observer.entry_removed(index, &entry.key);
        }
        Ok(())
    }

    /// Release every binding, clear the table, write an empty store.
    pub fn remove_all(&mut self) -> Result<(), RegistryError> {
        self.begin_bulk();
        self.release_all();
        self.entries.clear();
        let result = self.persist();
        self.end_bulk();
        info!("all shortcuts removed");
        result
    }

    /// Load from the current store. A missing file means "no entries
    /// yet": an empty store is created. A corrupt store aborts the load
    /// with the registry left empty — it never partially hydrates.
    pub fn hydrate(&mut self) -> Result<(), RegistryError> {
        let pairs = match self.store.read() {
            Ok(pairs) => pairs,
            Err(StoreError::NotFound(path)) => {
                info!(path = %path.display(), "no shortcut store yet, starting empty");
                self.reload(Vec::new())?;
                self.store.write(&[])?;
                return Ok(());
            }
            Err(e) => {
                self.reload(Vec::new())?;
                return Err(e.into());
            }
        };
        self.reload(pairs)
    }

    /// Replace the registry contents (and the store it mirrors to) with
    /// another store's.
    pub fn load_from(&mut self, store: ShortcutStore) -> Result<(), RegistryError> {
        self.store = store;
        self.hydrate()
    }

    /// Write the current table to another store and adopt it for future
    /// auto-saves ("save as").
    pub fn save_to(&mut self, store: ShortcutStore) -> Result<(), RegistryError> {
        let pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.text.as_str()))
            .collect();
        store.write(&pairs)?;
        self.store = store;
        Ok(())
    }

    /// Batch observer notifications: while at least one bulk scope is
    /// open, per-row events are withheld and a single `reloaded` fires
    /// when the outermost scope closes.
    pub fn begin_bulk(&mut self) {
        self.bulk_depth += 1;
    }

    pub fn end_bulk(&mut self) {
        self.bulk_depth = self.bulk_depth.saturating_sub(1);
        if self.bulk_depth == 0 {
            self.observer.reloaded(&self.entries);
        }
    }

    /// Release every active binding. Entries stay readable; call before
    /// process exit or let `Drop` do it.
    pub fn close(&mut self) {
        self.release_all();
    }

    fn reload(&mut self, pairs: Vec<(String, String)>) -> Result<(), RegistryError> {
        self.begin_bulk();
        let result = self.hydrate_rows(pairs);
        self.end_bulk();
        result
    }

    fn hydrate_rows(&mut self, pairs: Vec<(String, String)>) -> Result<(), RegistryError> {
        self.release_all();
        self.entries.clear();
        for (raw_key, text) in pairs {
            if let Err(e) = self.admit_row(&raw_key, &text) {
                // all-or-nothing: unwind every binding made so far
                warn!(row = %raw_key, "store row rejected, aborting load: {e}");
                self.release_all();
                self.entries.clear();
                return Err(e);
            }
        }
        info!(entries = self.entries.len(), "shortcuts loaded");
        Ok(())
    }

    fn admit_row(&mut self, raw_key: &str, text: &str) -> Result<(), RegistryError> {
        let key = ShortcutKey::parse(raw_key).ok_or(RegistryError::EmptyInput)?;
        if text.is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        self.ensure_admissible(&key)?;
        self.binder
            .register(&key, self.dispatcher.callback_for(&key, text))?;
        self.entries.push(RegistryEntry {
            key,
            text: text.to_string(),
        });
        Ok(())
    }

    fn ensure_admissible(&self, key: &ShortcutKey) -> Result<(), RegistryError> {
        if reserved::is_reserved(key) {
            return Err(RegistryError::Reserved(key.to_string()));
        }
        if self.position(key).is_some() {
            return Err(RegistryError::Duplicate(key.to_string()));
        }
        Ok(())
    }

    fn position(&self, key: &ShortcutKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }

    /// A missing binding here means the caller's bookkeeping diverged from
    /// the binder's; logged, never fatal.
    fn release_one(&self, key: &ShortcutKey) {
        if let Err(e) = self.binder.unregister(key) {
            warn!(key = %key, "binding release reported: {e}");
        }
    }

    fn release_all(&mut self) {
        for entry in &self.entries {
            if let Err(e) = self.binder.unregister(&entry.key) {
                debug!(key = %entry.key, "binding already released: {e}");
            }
        }
    }

    fn persist(&mut self) -> Result<(), RegistryError> {
        let pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.text.as_str()))
            .collect();
        self.store.write(&pairs).map_err(|e| {
            error!("auto-save failed: {e}");
            RegistryError::Store(e)
        })
    }
}

impl Drop for ShortcutRegistry {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::mock::{BinderAction, MockBinder};
    use crate::dispatch::mock::{FixedFocus, RecordingEmitter};
    use crate::dispatch::{FocusQuery, TextEmitter};
    use parking_lot::Mutex;
    use std::fs;

    #[derive(Clone, Default)]
    struct RecordingObserver {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl RegistryObserver for RecordingObserver {
        fn entry_added(&self, index: usize, entry: &RegistryEntry) {
            self.events.lock().push(format!("added:{index}:{}", entry.key));
        }
        fn entry_updated(&self, index: usize, entry: &RegistryEntry) {
            self.events
                .lock()
                .push(format!("updated:{index}:{}", entry.key));
        }
        fn entry_removed(&self, index: usize, key: &ShortcutKey) {
            self.events.lock().push(format!("removed:{index}:{key}"));
        }
        fn reloaded(&self, entries: &[RegistryEntry]) {
            self.events.lock().push(format!("reloaded:{}", entries.len()));
        }
    }

    struct Rig {
        registry: ShortcutRegistry,
        binder: Arc<MockBinder>,
        emitter: Arc<RecordingEmitter>,
        focus: Arc<FixedFocus>,
        observer: RecordingObserver,
        dir: tempfile::TempDir,
    }

    impl Rig {
        fn store_path(&self) -> std::path::PathBuf {
            self.dir.path().join("shortcuts.ini")
        }
    }

    fn rig() -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let binder = MockBinder::new();
        let emitter = RecordingEmitter::new();
        let focus = FixedFocus::new();
        let observer = RecordingObserver::default();
        let dispatcher = ExpansionDispatcher::new(
            Arc::clone(&focus) as Arc<dyn FocusQuery>,
            Arc::clone(&emitter) as Arc<dyn TextEmitter>,
        );
        let registry = ShortcutRegistry::open(
            ShortcutStore::new(dir.path().join("shortcuts.ini")),
            Arc::clone(&binder) as Arc<dyn HotkeyBinder>,
            dispatcher,
            Box::new(observer.clone()),
        );
        Rig {
            registry,
            binder,
            emitter,
            focus,
            observer,
            dir,
        }
    }

    #[test]
    fn add_binds_and_fires_expansion() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "hello world").unwrap();

        assert!(rig.binder.fire("ctrl+alt+e"));
        assert_eq!(rig.emitter.emitted(), vec!["hello world".to_string()]);
    }

    #[test]
    fn add_reserved_fails_and_leaves_registry_unchanged() {
        let mut rig = rig();
        let err = rig.registry.add("ctrl+c", "x").unwrap_err();
        assert!(matches!(err, RegistryError::Reserved(_)));
        assert!(rig.registry.is_empty());
        assert!(rig.binder.actions().is_empty());
    }

    #[test]
    fn add_duplicate_fails_and_keeps_original() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "a").unwrap();
        let err = rig.registry.add("ctrl+alt+e", "b").unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
        assert_eq!(rig.registry.get("ctrl+alt+e"), Some("a"));

        rig.binder.fire("ctrl+alt+e");
        assert_eq!(rig.emitter.emitted(), vec!["a".to_string()]);
    }

    #[test]
    fn duplicate_detection_is_canonical() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "a").unwrap();
        let err = rig.registry.add("ALT + Ctrl + E", "b").unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
    }

    #[test]
    fn add_empty_inputs_fail() {
        let mut rig = rig();
        assert!(matches!(
            rig.registry.add("", "x"),
            Err(RegistryError::EmptyInput)
        ));
        assert!(matches!(
            rig.registry.add("ctrl+alt+e", "   "),
            Err(RegistryError::EmptyInput)
        ));
        assert!(rig.registry.is_empty());
    }

    #[test]
    fn rejected_binding_rolls_back_add() {
        let mut rig = rig();
        rig.binder.set_fail_next_register(true);
        let err = rig.registry.add("ctrl+alt+e", "hello").unwrap_err();
        assert!(matches!(err, RegistryError::Binding(_)));
        assert!(rig.registry.is_empty());
        // nothing was persisted either
        assert!(!rig.store_path().exists());
    }

    #[test]
    fn remove_releases_binding() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "hello").unwrap();
        rig.registry.remove("ctrl+alt+e").unwrap();

        assert!(rig.registry.is_empty());
        assert!(!rig.binder.fire("ctrl+alt+e"));
        assert!(rig.emitter.emitted().is_empty());
        assert!(matches!(
            rig.registry.remove("ctrl+alt+e"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn update_text_keeps_key_and_position() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "first").unwrap();
        rig.registry.add("ctrl+alt+b", "second").unwrap();

        rig.registry
            .update("ctrl+alt+a", "ctrl+alt+a", "rewritten")
            .unwrap();

        assert_eq!(rig.registry.entries()[0].key.as_str(), "ctrl+alt+a");
        assert_eq!(rig.registry.entries()[0].text, "rewritten");
        assert_eq!(rig.registry.entries()[1].key.as_str(), "ctrl+alt+b");

        rig.binder.fire("ctrl+alt+a");
        assert_eq!(rig.emitter.emitted(), vec!["rewritten".to_string()]);

        // the old capture was released and replaced, not mutated
        let actions = rig.binder.actions();
        assert!(actions.contains(&BinderAction::Unregistered("ctrl+alt+a".to_string())));
        assert_eq!(
            actions.last(),
            Some(&BinderAction::Registered("ctrl+alt+a".to_string()))
        );
    }

    #[test]
    fn update_key_rebinds_under_new_combination() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "text").unwrap();
        rig.registry
            .update("ctrl+alt+a", "ctrl+alt+z", "text")
            .unwrap();

        assert!(!rig.binder.fire("ctrl+alt+a"));
        assert!(rig.binder.fire("ctrl+alt+z"));
        assert_eq!(rig.emitter.emitted(), vec!["text".to_string()]);
    }

    #[test]
    fn update_validation_failures_change_nothing() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "a").unwrap();
        rig.registry.add("ctrl+alt+b", "b").unwrap();

        assert!(matches!(
            rig.registry.update("ctrl+alt+a", "ctrl+c", "a"),
            Err(RegistryError::Reserved(_))
        ));
        assert!(matches!(
            rig.registry.update("ctrl+alt+a", "ctrl+alt+b", "a"),
            Err(RegistryError::Duplicate(_))
        ));
        assert!(matches!(
            rig.registry.update("ctrl+alt+x", "ctrl+alt+y", "a"),
            Err(RegistryError::NotFound(_))
        ));

        rig.binder.fire("ctrl+alt+a");
        assert_eq!(rig.emitter.emitted(), vec!["a".to_string()]);
    }

    #[test]
    fn rejected_rebind_restores_previous_binding() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "old text").unwrap();

        rig.binder.set_fail_next_register(true);
        let err = rig
            .registry
            .update("ctrl+alt+a", "ctrl+alt+z", "new text")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Binding(_)));

        assert_eq!(rig.registry.get("ctrl+alt+a"), Some("old text"));
        assert!(rig.binder.fire("ctrl+alt+a"));
        assert_eq!(rig.emitter.emitted(), vec!["old text".to_string()]);
        assert!(!rig.binder.fire("ctrl+alt+z"));
    }

    #[test]
    fn remove_all_clears_table_and_store() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "a").unwrap();
        rig.registry.add("ctrl+alt+b", "b").unwrap();

        rig.registry.remove_all().unwrap();

        assert!(rig.registry.is_empty());
        assert!(rig.binder.bound_keys().is_empty());
        assert!(!rig.binder.fire("ctrl+alt+a"));
        let store = ShortcutStore::new(rig.store_path());
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn restart_round_trips_through_the_store() {
        let dir;
        {
            let mut rig = rig();
            rig.registry.add("ctrl+alt+e", "hello world").unwrap();
            rig.registry.add("ctrl+alt+m", "line one\nline two").unwrap();
            dir = rig.dir;
        }

        // simulate restart: a fresh registry over the same store
        let binder = MockBinder::new();
        let emitter = RecordingEmitter::new();
        let dispatcher = ExpansionDispatcher::new(
            FixedFocus::new() as Arc<dyn FocusQuery>,
            Arc::clone(&emitter) as Arc<dyn TextEmitter>,
        );
        let mut registry = ShortcutRegistry::open(
            ShortcutStore::new(dir.path().join("shortcuts.ini")),
            Arc::clone(&binder) as Arc<dyn HotkeyBinder>,
            dispatcher,
            Box::new(NoopObserver),
        );
        registry.hydrate().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entries()[0].key.as_str(), "ctrl+alt+e");
        assert_eq!(registry.entries()[1].text, "line one\nline two");

        binder.fire("ctrl+alt+e");
        assert_eq!(emitter.emitted(), vec!["hello world".to_string()]);
    }

    #[test]
    fn hydrate_preserves_store_order() {
        let mut rig = rig();
        fs::write(
            rig.store_path(),
            "[ctrl+alt+c]\ntext = three\n\n[ctrl+alt+a]\ntext = one\n\n[ctrl+alt+b]\ntext = two\n",
        )
        .unwrap();

        rig.registry.hydrate().unwrap();
        let keys: Vec<&str> = rig
            .registry
            .entries()
            .iter()
            .map(|entry| entry.key.as_str())
            .collect();
        assert_eq!(keys, vec!["ctrl+alt+c", "ctrl+alt+a", "ctrl+alt+b"]);
    }

    #[test]
    fn hydrate_missing_store_starts_empty_and_creates_file() {
        let mut rig = rig();
        rig.registry.hydrate().unwrap();
        assert!(rig.registry.is_empty());
        assert!(rig.store_path().exists());
    }

    #[test]
    fn hydrate_corrupt_store_aborts_with_empty_registry() {
        let mut rig = rig();
        fs::write(rig.store_path(), "this is ] not [ an ini").unwrap();
        let err = rig.registry.hydrate().unwrap_err();
        assert!(matches!(err, RegistryError::Store(StoreError::Parse(_))));
        assert!(rig.registry.is_empty());
        assert!(rig.binder.bound_keys().is_empty());
    }

    #[test]
    fn load_is_all_or_nothing_on_reserved_rows() {
        let mut rig = rig();
        fs::write(
            rig.store_path(),
            "[ctrl+alt+e]\ntext = fine\n\n[ctrl+c]\ntext = reserved\n",
        )
        .unwrap();

        let err = rig.registry.hydrate().unwrap_err();
        assert!(matches!(err, RegistryError::Reserved(_)));
        assert!(rig.registry.is_empty());
        assert!(rig.binder.bound_keys().is_empty());
    }

    #[test]
    fn load_is_all_or_nothing_on_case_folded_duplicates() {
        let mut rig = rig();
        fs::write(
            rig.store_path(),
            "[ctrl+alt+e]\ntext = a\n\n[Ctrl+Alt+E]\ntext = b\n",
        )
        .unwrap();

        let err = rig.registry.hydrate().unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
        assert!(rig.registry.is_empty());
        assert!(rig.binder.bound_keys().is_empty());
    }

    #[test]
    fn dispatch_is_suppressed_while_editing() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "hello").unwrap();

        rig.focus.set_focused(true);
        assert!(rig.binder.fire("ctrl+alt+e"));
        assert!(rig.emitter.emitted().is_empty());

        rig.focus.set_focused(false);
        assert!(rig.binder.fire("ctrl+alt+e"));
        assert_eq!(rig.emitter.emitted(), vec!["hello".to_string()]);
    }

    #[test]
    fn close_releases_every_binding() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "a").unwrap();
        rig.registry.add("ctrl+alt+b", "b").unwrap();

        rig.registry.close();

        assert!(rig.binder.bound_keys().is_empty());
        assert!(!rig.binder.fire("ctrl+alt+a"));
        // entries stay readable after teardown
        assert_eq!(rig.registry.len(), 2);
    }

    #[test]
    fn save_to_adopts_the_new_store() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+e", "hello").unwrap();

        let second = rig.dir.path().join("renamed.ini");
        rig.registry
            .save_to(ShortcutStore::new(&second))
            .unwrap();
        assert_eq!(
            ShortcutStore::new(&second).read().unwrap(),
            vec![("ctrl+alt+e".to_string(), "hello".to_string())]
        );

        // subsequent mutations persist to the adopted store
        rig.registry.add("ctrl+alt+b", "bye").unwrap();
        assert_eq!(ShortcutStore::new(&second).read().unwrap().len(), 2);
    }

    #[test]
    fn observer_sees_row_events_interactively_and_one_reload_in_bulk() {
        let mut rig = rig();
        rig.registry.add("ctrl+alt+a", "a").unwrap();
        rig.registry.add("ctrl+alt+b", "b").unwrap();
        rig.registry
            .update("ctrl+alt+b", "ctrl+alt+b", "b2")
            .unwrap();
        rig.registry.remove("ctrl+alt+a").unwrap();

        assert_eq!(
            rig.observer.events(),
            vec![
                "added:0:ctrl+alt+a".to_string(),
                "added:1:ctrl+alt+b".to_string(),
                "updated:1:ctrl+alt+b".to_string(),
                "removed:0:ctrl+alt+a".to_string(),
            ]
        );

        rig.registry.remove_all().unwrap();
        let events = rig.observer.events();
        assert_eq!(events.last(), Some(&"reloaded:0".to_string()));
        // no per-row removal events leaked out of the bulk scope
        assert_eq!(
            events.iter().filter(|e| e.starts_with("removed:")).count(),
            1
        );
    }
}
