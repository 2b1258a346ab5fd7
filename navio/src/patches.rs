//! Runtime option patches (`tabs.updateOptions`, `drawers.updateOptions`).
//!
//! # Responsibilities
//!
//! - [`PatchTable`]: process-lifetime store, written by `updateOptions`. It
//!   outlives every container, so patches issued before mount still apply.
//! - [`LocalPatches`]: a mounted container's own view, seeded from the store
//!   at mount and kept current through the tunnel.
//!
//! Every write merges into the entry for that name; concurrent writers are
//! last-write-wins per key.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::{
    layout::ContainerKind,
    options::{OptionSource, Options},
    tunnel::{NavioTunnel, OptionsPatch, Subscription, TunnelEvent},
};

/// Name-keyed store of option patches for one container kind.
#[derive(Debug, Default)]
pub struct PatchTable {
    entries: DashMap<String, Options>,
}

impl PatchTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `options` into the entry for `name`.
    pub fn apply(&self, name: &str, options: &Options) {
        self.entries
            .entry(name.to_owned())
            .or_default()
            .merge_from(options);
    }

    /// Current patch for `name`.
    pub fn get(&self, name: &str) -> Option<Options> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Persistent copy of the whole table.
    pub fn snapshot(&self) -> im::HashMap<String, Options> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of patched names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was patched yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Patch tables keyed by container kind, created on first use.
#[derive(Debug, Default)]
pub(crate) struct PatchRegistry {
    tables: DashMap<ContainerKind, Arc<PatchTable>>,
}

impl PatchRegistry {
    pub(crate) fn table(&self, kind: ContainerKind) -> Arc<PatchTable> {
        Arc::clone(self.tables.entry(kind).or_default().value())
    }
}

/// A mounted container's patch table.
///
/// Unsubscribes from the tunnel when dropped.
#[derive(Debug)]
pub struct LocalPatches {
    kind: ContainerKind,
    table: RwLock<im::HashMap<String, Options>>,
    revision: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl LocalPatches {
    /// Subscribe to `kind` updates on `tunnel`, then seed from `store`.
    ///
    /// The store is written before every publish, so seeding after
    /// subscribing cannot lose a patch; a patch seen twice merges to the same
    /// result.
    pub(crate) fn mount(kind: ContainerKind, store: &PatchTable, tunnel: &NavioTunnel) -> Arc<Self> {
        let local = Arc::new(Self {
            kind,
            table: RwLock::new(im::HashMap::new()),
            revision: AtomicU64::new(0),
            subscription: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&local);
        let subscription = tunnel.subscribe(TunnelEvent::UpdateOptions(kind), move |patch| {
            if let Some(local) = weak.upgrade() {
                local.receive(patch);
            }
        });
        *local.subscription.lock() = Some(subscription);

        {
            let mut table = local.table.write();
            let mut seeded = store.snapshot();
            for (name, options) in table.iter() {
                seeded
                    .entry(name.clone())
                    .or_insert_with(Options::new)
                    .merge_from(options);
            }
            *table = seeded;
        }
        local
    }

    fn receive(&self, patch: &OptionsPatch) {
        self.table
            .write()
            .entry(patch.name.clone())
            .or_insert_with(Options::new)
            .merge_from(&patch.options);
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Kind of the owning container.
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Patch for item `name`.
    pub fn get(&self, name: &str) -> Option<Options> {
        self.table.read().get(name).cloned()
    }

    /// Bumped on every received patch; hosts re-render when it changes.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Option source reading the current patch for `name` at evaluation time.
    pub fn source_for(self: &Arc<Self>, name: &str) -> OptionSource {
        let local = Arc::clone(self);
        let name = name.to_owned();
        OptionSource::computed(move |_| local.get(&name).unwrap_or_default())
    }
}

impl Drop for LocalPatches {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::options::OptionsContext;

    fn publish(store: &PatchTable, tunnel: &NavioTunnel, name: &str, options: Options) {
        store.apply(name, &options);
        tunnel.publish(
            &TunnelEvent::UpdateOptions(ContainerKind::Tabs),
            &OptionsPatch {
                name: name.to_owned(),
                options,
            },
        );
    }

    #[test]
    fn store_merges_per_name() {
        let store = PatchTable::new();
        store.apply("One", &Options::new().with("badge", 1).with("title", "One"));
        store.apply("One", &Options::new().with("badge", 2));

        let patch = store.get("One").unwrap();
        assert_eq!(patch.get("badge"), Some(&json!(2)));
        assert_eq!(patch.get("title"), Some(&json!("One")));
        assert!(store.get("Two").is_none());
    }

    #[test]
    fn local_table_is_seeded_and_follows_the_tunnel() {
        let store = PatchTable::new();
        let tunnel = NavioTunnel::new();
        publish(&store, &tunnel, "One", Options::new().with("badge", 3));

        let local = LocalPatches::mount(ContainerKind::Tabs, &store, &tunnel);
        assert_eq!(local.get("One").unwrap().get("badge"), Some(&json!(3)));
        assert_eq!(local.revision(), 0);

        publish(&store, &tunnel, "One", Options::new().with("badge", 4));
        assert_eq!(local.get("One").unwrap().get("badge"), Some(&json!(4)));
        assert_eq!(local.revision(), 1);

        let source = local.source_for("One");
        let resolved = source.resolve(&OptionsContext::default());
        assert_eq!(resolved.get("badge"), Some(&json!(4)));
    }

    #[test]
    fn dropping_the_container_unsubscribes() {
        let store = PatchTable::new();
        let tunnel = NavioTunnel::new();
        let event = TunnelEvent::UpdateOptions(ContainerKind::Tabs);

        let local = LocalPatches::mount(ContainerKind::Tabs, &store, &tunnel);
        assert_eq!(tunnel.listener_count(&event), 1);
        drop(local);
        assert_eq!(tunnel.listener_count(&event), 0);
    }
}
