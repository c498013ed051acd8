//! Resource loader: brings the provider runtime in exactly once
//!
//! The runtime is process-wide state as far as the UI is concerned: every engine
//! instance on the UI thread shares it. A thread-local registry keyed by the
//! loader's [`RuntimeLoader::resource_id`] is the single source of truth for
//! "already loading or loaded". The event loop is single-threaded, so the
//! check-then-act on that key cannot race.
//!
//! Each caller of [`ensure_provider_loaded`] gets its own [`ReadySignal`] (a hook
//! on the shared slot). Completion travels through a `tokio::sync::oneshot`
//! channel and is picked up by whichever signal is polled first; every other
//! signal observes the same status on its next poll.

use crate::{ConfigError, EngineError, LoadError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::oneshot;

thread_local! {
    static REGISTRY: RefCell<HashMap<&'static str, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Knows how to bring a provider runtime into the environment
pub trait RuntimeLoader {
    type Runtime: 'static;

    /// Stable identifier tagging the injected loader resource
    fn resource_id(&self) -> &'static str;

    /// Whether [`inject`](RuntimeLoader::inject) needs a non-empty credential
    fn requires_credential(&self) -> bool {
        true
    }

    /// A runtime already present in the environment (e.g. bundled by the host)
    fn existing(&self) -> Option<Self::Runtime> {
        None
    }

    /// Start loading. Must not block; completion is reported through the
    /// [`LoadCompletion`] paired with the returned [`PendingLoad`].
    fn inject(&self, key: &str) -> PendingLoad<Self::Runtime>;
}

/// Receiving half of an in-flight load
pub struct PendingLoad<R> {
    rx: oneshot::Receiver<std::result::Result<R, LoadError>>,
}

/// Sending half of an in-flight load. Dropping it without completing counts as
/// [`LoadError::Cancelled`].
pub struct LoadCompletion<R> {
    tx: oneshot::Sender<std::result::Result<R, LoadError>>,
}

impl<R> PendingLoad<R> {
    pub fn channel() -> (LoadCompletion<R>, PendingLoad<R>) {
        let (tx, rx) = oneshot::channel();
        (LoadCompletion { tx }, PendingLoad { rx })
    }
}

impl<R> LoadCompletion<R> {
    pub fn complete(self, result: std::result::Result<R, LoadError>) {
        // The receiver is gone only if the registry slot was dropped; nothing to notify.
        let _ = self.tx.send(result);
    }
}

/// Shared load status as seen by a [`ReadySignal`]
pub enum LoadStatus<R> {
    Loading,
    Ready(Rc<R>),
    Failed(LoadError),
}

impl<R> Clone for LoadStatus<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Ready(runtime) => Self::Ready(Rc::clone(runtime)),
            Self::Failed(err) => Self::Failed(err.clone()),
        }
    }
}

impl<R> std::fmt::Debug for LoadStatus<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Ready(_) => write!(f, "Ready"),
            Self::Failed(err) => write!(f, "Failed({err})"),
        }
    }
}

struct Slot<R> {
    status: LoadStatus<R>,
    pending: Option<PendingLoad<R>>,
    hooks: usize,
    transitions: usize,
}

impl<R> Slot<R> {
    /// Move a finished load into `status`. Returns true on the transition.
    fn pump(&mut self, id: &'static str) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => Err(LoadError::Cancelled),
        };
        self.pending = None;
        self.transitions += 1;
        match result {
            Ok(runtime) => {
                tracing::info!("Provider runtime '{}' loaded", id);
                self.status = LoadStatus::Ready(Rc::new(runtime));
            }
            Err(err) => {
                tracing::error!("Provider runtime '{}' failed to load: {}", id, err);
                self.status = LoadStatus::Failed(err);
            }
        }
        true
    }
}

/// One consumer's hook on the shared runtime slot.
///
/// Dropping it removes only this hook. A loaded runtime stays registered for the
/// lifetime of the thread; a failed slot is forgotten once its last hook is gone
/// so that a later mount can try again.
pub struct ReadySignal<R: 'static> {
    id: &'static str,
    slot: Rc<RefCell<Slot<R>>>,
}

impl<R: 'static> ReadySignal<R> {
    pub fn resource_id(&self) -> &'static str {
        self.id
    }

    /// Current status, collecting the load result if it just arrived
    pub fn poll(&self) -> LoadStatus<R> {
        let mut slot = self.slot.borrow_mut();
        slot.pump(self.id);
        slot.status.clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.poll(), LoadStatus::Ready(_))
    }

    pub fn runtime(&self) -> Option<Rc<R>> {
        match self.poll() {
            LoadStatus::Ready(runtime) => Some(runtime),
            _ => None,
        }
    }

    /// Number of Loading → Ready/Failed transitions the shared slot went through
    pub fn transitions(&self) -> usize {
        self.slot.borrow().transitions
    }
}

impl<R: 'static> Drop for ReadySignal<R> {
    fn drop(&mut self) {
        let forget = {
            let mut slot = self.slot.borrow_mut();
            slot.hooks = slot.hooks.saturating_sub(1);
            slot.hooks == 0 && matches!(slot.status, LoadStatus::Failed(_))
        };
        if forget {
            tracing::debug!("Forgetting failed loader resource '{}'", self.id);
            // try_with: the registry may already be gone during thread teardown
            let _ = REGISTRY.try_with(|registry| {
                if let Ok(mut registry) = registry.try_borrow_mut() {
                    registry.remove(self.id);
                }
            });
        }
    }
}

/// Ensure the provider runtime is loaded (or loading) and hook onto it.
///
/// Idempotent: the first call injects the loader resource, later calls with the
/// same resource id only add a hook. A runtime reported by
/// [`RuntimeLoader::existing`] is ready synchronously and nothing is injected.
/// The credential is only checked when something has to be injected.
pub fn ensure_provider_loaded<L: RuntimeLoader>(
    loader: &L,
    key: &str,
) -> Result<ReadySignal<L::Runtime>> {
    let id = loader.resource_id();

    let existing = REGISTRY.with(|registry| registry.borrow().get(id).cloned());
    if let Some(entry) = existing {
        let slot = entry
            .downcast::<RefCell<Slot<L::Runtime>>>()
            .map_err(|_| EngineError::Configuration(ConfigError::ConflictingResource(id)))?;
        let abandoned = {
            let mut slot = slot.borrow_mut();
            slot.pump(id);
            slot.hooks == 0 && matches!(slot.status, LoadStatus::Failed(_))
        };
        if !abandoned {
            slot.borrow_mut().hooks += 1;
            tracing::trace!("Loader resource '{}' already registered", id);
            return Ok(ReadySignal { id, slot });
        }
        // Failed while nobody was hooked: nobody saw it, so load again
        tracing::debug!("Retrying loader resource '{}' that failed unobserved", id);
        REGISTRY.with(|registry| registry.borrow_mut().remove(id));
    }

    let slot = match loader.existing() {
        Some(runtime) => {
            tracing::debug!("Provider runtime '{}' already present", id);
            Slot {
                status: LoadStatus::Ready(Rc::new(runtime)),
                pending: None,
                hooks: 1,
                transitions: 1,
            }
        }
        None => {
            if loader.requires_credential() && key.trim().is_empty() {
                return Err(ConfigError::MissingCredential.into());
            }
            tracing::info!("Injecting loader resource '{}'", id);
            Slot {
                status: LoadStatus::Loading,
                pending: Some(loader.inject(key)),
                hooks: 1,
                transitions: 0,
            }
        }
    };
    let slot = Rc::new(RefCell::new(slot));
    REGISTRY.with(|registry| {
        registry
            .borrow_mut()
            .insert(id, Rc::clone(&slot) as Rc<dyn Any>)
    });
    Ok(ReadySignal { id, slot })
}

/// Whether a loader resource with this id is registered on the current thread
pub fn is_registered(resource_id: &str) -> bool {
    REGISTRY.with(|registry| registry.borrow().contains_key(resource_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLoader, FakeRuntime};

    #[test]
    fn test_concurrent_ensure_injects_once() {
        let loader = FakeLoader::new();
        let signals: Vec<_> = (0..5)
            .map(|_| ensure_provider_loaded(&loader, "key").unwrap())
            .collect();

        assert_eq!(loader.injections(), 1);
        assert!(signals.iter().all(|s| matches!(s.poll(), LoadStatus::Loading)));

        loader.complete_all(Ok(FakeRuntime));

        assert!(signals.iter().all(|s| s.is_ready()));
        assert!(signals.iter().all(|s| s.transitions() == 1));
        assert_eq!(loader.injections(), 1);
    }

    #[test]
    fn test_existing_runtime_is_ready_synchronously() {
        let loader = FakeLoader::preloaded();
        let signal = ensure_provider_loaded(&loader, "key").unwrap();
        assert!(signal.is_ready());
        assert_eq!(loader.injections(), 0);
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let loader = FakeLoader::new();
        let err = ensure_provider_loaded(&loader, "  ").err().unwrap();
        assert_eq!(err, EngineError::Configuration(ConfigError::MissingCredential));
        assert_eq!(loader.injections(), 0);
        assert!(!is_registered(loader.resource_id()));
    }

    #[test]
    fn test_loaded_runtime_ignores_missing_credential() {
        let loader = FakeLoader::new();
        let first = ensure_provider_loaded(&loader, "key").unwrap();
        loader.complete_all(Ok(FakeRuntime));
        assert!(first.is_ready());

        let second = ensure_provider_loaded(&loader, "").unwrap();
        assert!(second.is_ready());
        assert_eq!(loader.injections(), 1);
    }

    #[test]
    fn test_existing_runtime_needs_no_credential() {
        let loader = FakeLoader::preloaded();
        let signal = ensure_provider_loaded(&loader, "").unwrap();
        assert!(signal.is_ready());
        assert_eq!(loader.injections(), 0);
    }

    #[test]
    fn test_failure_after_last_hook_dropped_is_retried() {
        let loader = FakeLoader::new();
        let signal = ensure_provider_loaded(&loader, "key").unwrap();
        drop(signal);
        assert!(is_registered(loader.resource_id()));

        loader.complete_all(Err(LoadError::Network("offline".into())));

        let retry = ensure_provider_loaded(&loader, "key").unwrap();
        assert_eq!(loader.injections(), 2);
        assert!(matches!(retry.poll(), LoadStatus::Loading));

        loader.complete_all(Ok(FakeRuntime));
        assert!(retry.is_ready());
    }

    #[test]
    fn test_credential_not_needed_when_loader_says_so() {
        let loader = FakeLoader::new().without_credential();
        let signal = ensure_provider_loaded(&loader, "").unwrap();
        assert!(matches!(signal.poll(), LoadStatus::Loading));
    }

    #[test]
    fn test_failure_is_not_retried_until_hooks_are_gone() {
        let loader = FakeLoader::new();
        let first = ensure_provider_loaded(&loader, "bad").unwrap();
        loader.complete_all(Err(LoadError::Rejected("HTTP 403".into())));
        assert!(matches!(first.poll(), LoadStatus::Failed(LoadError::Rejected(_))));

        // Still hooked: a second caller sees the same failure, no new injection
        let second = ensure_provider_loaded(&loader, "bad").unwrap();
        assert!(matches!(second.poll(), LoadStatus::Failed(_)));
        assert_eq!(loader.injections(), 1);

        drop(first);
        drop(second);
        assert!(!is_registered(loader.resource_id()));

        let _retry = ensure_provider_loaded(&loader, "good").unwrap();
        assert_eq!(loader.injections(), 2);
    }

    #[test]
    fn test_dropping_hooks_keeps_loaded_runtime() {
        let loader = FakeLoader::new();
        let signal = ensure_provider_loaded(&loader, "key").unwrap();
        loader.complete_all(Ok(FakeRuntime));
        assert!(signal.is_ready());
        drop(signal);

        assert!(is_registered(loader.resource_id()));
        let again = ensure_provider_loaded(&loader, "key").unwrap();
        assert!(again.is_ready());
        assert_eq!(loader.injections(), 1);
    }

    #[test]
    fn test_dropped_completion_counts_as_cancelled() {
        let loader = FakeLoader::new();
        let signal = ensure_provider_loaded(&loader, "key").unwrap();
        loader.abandon_all();
        assert!(matches!(signal.poll(), LoadStatus::Failed(LoadError::Cancelled)));
    }
}
