use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use experience_kernel::EventHub;

use crate::handle::AssetHandle;
use crate::loader::{LoadCompletion, LoadMessage, LoaderSet};
use crate::manifest::{AssetKind, Manifest};

/// Fired once, with the item table, when every declared entry resolved.
pub const READY: &str = "ready";
/// Fired every time one entry resolves (loaded or permanently failed).
pub const PROGRESS: &str = "progress";

/// What to do with loads that fail or never answer.
///
/// A failed or timed-out attempt is dispatched again while attempts remain;
/// after the last attempt the entry is permanently failed and counts as
/// resolved, so readiness is never blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadPolicy {
    pub max_attempts: u32,
    pub timeout: Option<Duration>,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Per-asset error, returned when reading an entry that did not load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset '{name}' failed after {attempts} attempt(s): {reason}")]
    LoadFailed {
        name: String,
        attempts: u32,
        reason: String,
    },
    #[error("asset '{name}' timed out after {attempts} attempt(s) of {timeout:?}")]
    TimedOut {
        name: String,
        attempts: u32,
        timeout: Duration,
    },
    #[error("no loader registered for '{name}' of kind {kind}")]
    NoLoader { name: String, kind: AssetKind },
    #[error("asset '{0}' has not finished loading")]
    Pending(String),
    #[error("asset '{0}' is not declared in the manifest")]
    Undeclared(String),
}

#[derive(Debug, Clone)]
enum Slot {
    Pending { attempt: u32, started: Duration },
    Loaded(AssetHandle),
    Failed(AssetError),
}

/// Item table: manifest name to load outcome.
#[derive(Debug, Clone, Default)]
pub struct AssetItems {
    slots: BTreeMap<String, Slot>,
}

impl AssetItems {
    /// Build a resolved table directly, e.g. from assets loaded elsewhere.
    pub fn from_outcomes<N: Into<String>>(
        outcomes: impl IntoIterator<Item = (N, Result<AssetHandle, AssetError>)>,
    ) -> Self {
        let slots = outcomes
            .into_iter()
            .map(|(name, outcome)| {
                let slot = match outcome {
                    Ok(handle) => Slot::Loaded(handle),
                    Err(err) => Slot::Failed(err),
                };
                (name.into(), slot)
            })
            .collect();
        Self { slots }
    }

    /// The loaded handle for `name`, or the reason it is unavailable.
    pub fn get(&self, name: &str) -> Result<&AssetHandle, AssetError> {
        match self.slots.get(name) {
            Some(Slot::Loaded(handle)) => Ok(handle),
            Some(Slot::Failed(err)) => Err(err.clone()),
            Some(Slot::Pending { .. }) => Err(AssetError::Pending(name.to_string())),
            None => Err(AssetError::Undeclared(name.to_string())),
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Loaded(_)))
    }

    pub fn loaded(&self) -> impl Iterator<Item = (&str, &AssetHandle)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Loaded(handle) => Some((name.as_str(), handle)),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &AssetError)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Failed(err) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Payload of the `progress` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    pub name: String,
    pub loaded: bool,
    pub resolved: usize,
    pub total: usize,
}

/// Loads a manifest through external loaders and announces readiness once.
///
/// Loads are dispatched on construction. Loader results travel over a
/// channel and are applied on the event-loop thread by [`ResourceRegistry::poll`],
/// which is also where `progress` and `ready` fire.
pub struct ResourceRegistry<C> {
    manifest: Manifest,
    loaders: LoaderSet,
    policy: LoadPolicy,
    items: AssetItems,
    resolved: usize,
    ready_fired: bool,
    unroutable: Vec<(String, AssetError)>,
    sender: Sender<LoadMessage>,
    receiver: Receiver<LoadMessage>,
    ready: EventHub<C, AssetItems>,
    progress: EventHub<C, LoadProgress>,
}

impl<C> ResourceRegistry<C> {
    pub fn new(manifest: Manifest, loaders: LoaderSet, policy: LoadPolicy, now: Duration) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let slots = manifest
            .entries()
            .iter()
            .map(|e| (e.name.clone(), Slot::Pending { attempt: 1, started: now }))
            .collect();
        let mut registry = Self {
            manifest,
            loaders,
            policy: LoadPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
            items: AssetItems { slots },
            resolved: 0,
            ready_fired: false,
            unroutable: Vec::new(),
            sender,
            receiver,
            ready: EventHub::new(),
            progress: EventHub::new(),
        };

        tracing::info!(total = registry.total(), "dispatching asset loads");
        let names: Vec<String> = registry.manifest.entries().iter().map(|e| e.name.clone()).collect();
        for name in names {
            if let Err(err) = registry.dispatch(&name, 1) {
                tracing::warn!(%err, "asset cannot be loaded");
                registry.unroutable.push((name, err));
            }
        }
        registry
    }

    /// Apply queued loader results, expire stalled attempts, and fire
    /// `progress`/`ready` as entries resolve. Returns how many entries resolved.
    pub fn poll(&mut self, now: Duration, ctx: &mut C) -> usize {
        let _span = tracing::trace_span!("assets_poll").entered();
        let before = self.resolved;

        for (name, err) in std::mem::take(&mut self.unroutable) {
            self.resolve(&name, Slot::Failed(err), ctx);
        }

        let messages: Vec<LoadMessage> = self.receiver.try_iter().collect();
        for message in messages {
            match message {
                LoadMessage::Progress {
                    name,
                    loaded,
                    total,
                    ..
                } => tracing::trace!(%name, loaded, ?total, "asset progress"),
                LoadMessage::Finished {
                    name,
                    attempt,
                    result,
                } => {
                    self.complete(&name, attempt, result, now, ctx);
                }
            }
        }

        if let Some(timeout) = self.policy.timeout {
            let expired: Vec<(String, u32)> = self
                .items
                .slots
                .iter()
                .filter_map(|(name, slot)| match slot {
                    Slot::Pending { attempt, started } if now.saturating_sub(*started) >= timeout => {
                        Some((name.clone(), *attempt))
                    }
                    _ => None,
                })
                .collect();
            for (name, attempt) in expired {
                tracing::warn!(%name, attempt, ?timeout, "asset load timed out");
                let err = AssetError::TimedOut {
                    name: name.clone(),
                    attempts: attempt,
                    timeout,
                };
                self.retry_or_fail(&name, attempt, err, now, ctx);
            }
        }

        if self.total() == 0 && !self.ready_fired {
            self.fire_ready(ctx);
        }

        self.resolved - before
    }

    /// Apply one loader result for `name`'s attempt number `attempt`.
    ///
    /// Results for undeclared names, already-resolved entries or superseded
    /// attempts are ignored and return `false`; they never double-count.
    pub fn complete(
        &mut self,
        name: &str,
        attempt: u32,
        result: Result<AssetHandle, String>,
        now: Duration,
        ctx: &mut C,
    ) -> bool {
        match self.items.slots.get(name) {
            None => {
                tracing::warn!(%name, "completion for undeclared asset ignored");
                return false;
            }
            Some(Slot::Pending { attempt: current, .. }) if *current == attempt => {}
            Some(_) => {
                tracing::debug!(%name, attempt, "duplicate or stale completion ignored");
                return false;
            }
        }

        match result {
            Ok(handle) => {
                tracing::debug!(%name, id = %handle.id, "asset loaded");
                self.resolve(name, Slot::Loaded(handle), ctx);
            }
            Err(reason) => {
                tracing::warn!(%name, attempt, %reason, "asset load failed");
                let err = AssetError::LoadFailed {
                    name: name.to_string(),
                    attempts: attempt,
                    reason,
                };
                self.retry_or_fail(name, attempt, err, now, ctx);
            }
        }
        true
    }

    fn retry_or_fail(&mut self, name: &str, attempt: u32, err: AssetError, now: Duration, ctx: &mut C) {
        if attempt < self.policy.max_attempts {
            let next = attempt + 1;
            self.items.slots.insert(
                name.to_string(),
                Slot::Pending {
                    attempt: next,
                    started: now,
                },
            );
            tracing::info!(%name, attempt = next, "retrying asset load");
            if let Err(err) = self.dispatch(name, next) {
                self.resolve(name, Slot::Failed(err), ctx);
            }
        } else {
            self.resolve(name, Slot::Failed(err), ctx);
        }
    }

    fn dispatch(&self, name: &str, attempt: u32) -> Result<(), AssetError> {
        let entry = self
            .manifest
            .get(name)
            .ok_or_else(|| AssetError::Undeclared(name.to_string()))?;
        let loader = self.loaders.get(entry.kind).ok_or_else(|| AssetError::NoLoader {
            name: name.to_string(),
            kind: entry.kind,
        })?;
        tracing::debug!(%name, kind = %entry.kind, attempt, "loading asset");
        loader.load(
            entry,
            LoadCompletion::new(name.to_string(), attempt, self.sender.clone()),
        );
        Ok(())
    }

    fn resolve(&mut self, name: &str, slot: Slot, ctx: &mut C) {
        let loaded = matches!(slot, Slot::Loaded(_));
        self.items.slots.insert(name.to_string(), slot);
        self.resolved += 1;

        let progress = LoadProgress {
            name: name.to_string(),
            loaded,
            resolved: self.resolved,
            total: self.total(),
        };
        self.progress.trigger(PROGRESS, ctx, &progress);

        if self.resolved == self.total() && !self.ready_fired {
            self.fire_ready(ctx);
        }
    }

    fn fire_ready(&mut self, ctx: &mut C) {
        self.ready_fired = true;
        let failed = self.items.failed().count();
        tracing::info!(total = self.total(), failed, "assets ready");
        self.ready.trigger(READY, ctx, &self.items);
    }

    pub fn is_ready(&self) -> bool {
        self.ready_fired
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn total(&self) -> usize {
        self.manifest.len()
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Current item table, including entries still pending.
    pub fn items(&self) -> &AssetItems {
        &self.items
    }

    /// The item table, only once `ready` has fired.
    pub fn ready_items(&self) -> Option<&AssetItems> {
        self.ready_fired.then_some(&self.items)
    }

    pub fn ready_events(&mut self) -> &mut EventHub<C, AssetItems> {
        &mut self.ready
    }

    pub fn progress_events(&mut self) -> &mut EventHub<C, LoadProgress> {
        &mut self.progress
    }
}

impl<C> std::fmt::Debug for ResourceRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resolved", &self.resolved)
            .field("total", &self.total())
            .field("ready", &self.ready_fired)
            .field("policy", &self.policy)
            .finish()
    }
}
