use crate::error::RegistryError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked with the arguments that followed the command name.
///
/// Handlers are shared, so the registry can hand one out and release its lock
/// before the handler runs. That keeps registration possible from inside a
/// running handler or from another thread.
pub type CommandHandler = Arc<dyn Fn(&[String]) -> anyhow::Result<()> + Send + Sync>;

/// Case-insensitive mapping from command name to handler.
///
/// Registration is add-only: there is no way to replace or remove a command.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, CommandHandler>>,
}

/// Normalized form used as the registry key.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` under `name`.
    ///
    /// Fails with [`RegistryError::DuplicateCommand`] when the lowercased name
    /// is already taken; the existing handler is left in place.
    pub fn register<F>(&self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = normalize_name(name);
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        if commands.contains_key(&key) {
            return Err(RegistryError::DuplicateCommand { name: key });
        }
        tracing::debug!(command = %key, "registered command");
        commands.insert(key, Arc::new(handler));
        Ok(())
    }

    /// Finds the handler for `name`, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<CommandHandler> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_name(name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names in lowercase, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn noop(_args: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn duplicate_registration_is_rejected_regardless_of_case() {
        let registry = CommandRegistry::new();
        registry.register("Foo", noop).unwrap();

        let err = registry.register("foo", noop).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateCommand {
                name: "foo".to_string()
            }
        );
        assert!(registry.register("FOO", noop).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = CommandRegistry::new();
        registry.register("foo", noop).unwrap();

        assert!(registry.lookup("FOO").is_some());
        assert!(registry.lookup("fOo").is_some());
        assert!(registry.lookup("bar").is_none());
    }

    #[test]
    fn failed_registration_keeps_original_handler() {
        let registry = CommandRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = calls.clone();
        registry
            .register("ping", move |_| {
                first.lock().unwrap().push("first");
                Ok(())
            })
            .unwrap();
        let second = calls.clone();
        let _ = registry.register("PING", move |_| {
            second.lock().unwrap().push("second");
            Ok(())
        });

        let handler = registry.lookup("ping").unwrap();
        handler(&[]).unwrap();
        assert_eq!(*calls.lock().unwrap(), ["first"]);
    }

    #[test]
    fn names_are_lowercase_and_sorted() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        registry.register("Zeta", noop).unwrap();
        registry.register("alpha", noop).unwrap();

        assert_eq!(registry.names(), ["alpha", "zeta"]);
        assert!(registry.contains("ZETA"));
    }

    #[test]
    fn registration_from_another_thread_is_visible() {
        let registry = Arc::new(CommandRegistry::new());
        let remote = registry.clone();
        std::thread::spawn(move || remote.register("late", noop).unwrap())
            .join()
            .unwrap();

        assert!(registry.contains("late"));
    }
}
