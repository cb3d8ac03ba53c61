use crate::ParsedService;
use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Namespaces in the order they were first observed, without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceSet(Vec<String>);

/// The unit of publication read by the HTTP front end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlobalState {
    pub cluster_name: String,
    pub timestamp: String,
    pub services: Vec<ParsedService>,
    pub namespaces: NamespaceSet,
}

/// A handle to the most recently published [`GlobalState`].
///
/// Readers load the current snapshot without locking; a publish swaps in a new snapshot in a
/// single step, so a reader holds either the old or the new state in full.
#[derive(Clone, Debug)]
pub struct SharedState(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    current: ArcSwap<GlobalState>,
    published: AtomicBool,
}

// === impl NamespaceSet ===

impl NamespaceSet {
    /// Adds a namespace, returning false if it was already present.
    pub fn insert(&mut self, namespace: impl Into<String>) -> bool {
        let namespace = namespace.into();
        if self.contains(&namespace) {
            return false;
        }
        self.0.push(namespace);
        true
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.0.iter().any(|ns| ns == namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NamespaceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for ns in iter {
            set.insert(ns);
        }
        set
    }
}

// === impl GlobalState ===

impl GlobalState {
    pub fn new(
        cluster_name: impl Into<String>,
        services: Vec<ParsedService>,
        namespaces: NamespaceSet,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            services,
            namespaces,
        }
    }
}

// === impl SharedState ===

impl Default for SharedState {
    fn default() -> Self {
        Self(Arc::new(Inner {
            current: ArcSwap::from_pointee(GlobalState::default()),
            published: AtomicBool::new(false),
        }))
    }
}

impl SharedState {
    /// Replaces the current state.
    pub fn publish(&self, state: GlobalState) {
        self.0.current.store(Arc::new(state));
        self.0.published.store(true, Ordering::Release);
    }

    /// Returns the current state. Before the first publish this is an empty state.
    pub fn read(&self) -> Arc<GlobalState> {
        self.0.current.load_full()
    }

    /// Whether a state has been published since startup.
    pub fn is_published(&self) -> bool {
        self.0.published.load(Ordering::Acquire)
    }
}
