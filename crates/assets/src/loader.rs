use crossbeam_channel::Sender;
use std::collections::BTreeMap;

use crate::handle::AssetHandle;
use crate::manifest::{AssetKind, ManifestEntry};

/// Message sent from a loader back to the registry.
#[derive(Debug, Clone)]
pub enum LoadMessage {
    Progress {
        name: String,
        attempt: u32,
        loaded: u64,
        total: Option<u64>,
    },
    Finished {
        name: String,
        attempt: u32,
        result: Result<AssetHandle, String>,
    },
}

/// Single-shot completion handle given to a loader for one load attempt.
///
/// `succeed` and `fail` consume the handle, so one attempt can finish at
/// most once. The handle is `Send`; loaders may finish from a worker thread.
/// Results are applied when the registry is next polled on the event loop.
#[derive(Debug)]
pub struct LoadCompletion {
    name: String,
    attempt: u32,
    sender: Sender<LoadMessage>,
}

impl LoadCompletion {
    pub(crate) fn new(name: String, attempt: u32, sender: Sender<LoadMessage>) -> Self {
        Self {
            name,
            attempt,
            sender,
        }
    }

    /// Second handle on the same attempt, for reporting a failure when the
    /// primary handle was lost before it could finish.
    pub(crate) fn spare(&self) -> Self {
        Self::new(self.name.clone(), self.attempt, self.sender.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        // Registry gone (torn down): nobody is waiting on this load any more.
        let _ = self.sender.send(LoadMessage::Progress {
            name: self.name.clone(),
            attempt: self.attempt,
            loaded,
            total,
        });
    }

    pub fn succeed(self, handle: AssetHandle) {
        self.finish(Ok(handle));
    }

    pub fn fail(self, reason: impl std::fmt::Display) {
        self.finish(Err(reason.to_string()));
    }

    fn finish(self, result: Result<AssetHandle, String>) {
        let _ = self.sender.send(LoadMessage::Finished {
            name: self.name,
            attempt: self.attempt,
            result,
        });
    }
}

/// External loader collaborator for one asset kind.
pub trait AssetLoader {
    /// Start loading `entry`. Must eventually call `succeed` or `fail` on
    /// `completion`, either before returning or later from anywhere.
    fn load(&self, entry: &ManifestEntry, completion: LoadCompletion);
}

impl<F> AssetLoader for F
where
    F: Fn(&ManifestEntry, LoadCompletion),
{
    fn load(&self, entry: &ManifestEntry, completion: LoadCompletion) {
        self(entry, completion)
    }
}

/// Loaders keyed by the kind they handle.
#[derive(Default)]
pub struct LoaderSet {
    loaders: BTreeMap<AssetKind, Box<dyn AssetLoader>>,
}

impl LoaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: AssetKind, loader: impl AssetLoader + 'static) -> Self {
        self.insert(kind, loader);
        self
    }

    /// Register `loader` for `kind`, replacing any previous one.
    pub fn insert(&mut self, kind: AssetKind, loader: impl AssetLoader + 'static) {
        self.loaders.insert(kind, Box::new(loader));
    }

    pub fn get(&self, kind: AssetKind) -> Option<&dyn AssetLoader> {
        self.loaders.get(&kind).map(Box::as_ref)
    }

    pub fn kinds(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.loaders.keys().copied()
    }
}

impl std::fmt::Debug for LoaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.loaders.keys()).finish()
    }
}
