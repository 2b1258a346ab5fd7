//! Definition resolver: expands name and inline references into concrete,
//! ordered entity lists.
//!
//! # Responsibilities
//!
//! - Resolve a [`StackDefinition`] to its screens, following stack aliases.
//! - Resolve tabs/drawer containers to their content, recursing into nested
//!   containers (tabs inside drawers and the other way round).
//! - Memoize every result against the (immutable) layout so that resolving
//!   the same definition twice returns the same `Arc`.
//!
//! Missing names are configuration errors: they are logged and resolve to an
//! empty list. Resolution never fails.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    diagnostics::Diagnostics,
    layout::{
        ContainerData, ContainerKind, ContentTarget, Layout, ScreenComponent, StackDefinition,
        Table,
    },
    options::{OptionSource, Options},
};

/// A screen with its layout-level options.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedScreen {
    pub name: String,
    pub component: ScreenComponent,
    /// Options from the screens table (`{component, options}` form).
    pub options: Option<OptionSource>,
}

/// Screens of a stack, in declaration order, plus its container config.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedStack {
    pub screens: Vec<ResolvedScreen>,
    pub options: Option<OptionSource>,
    pub navigator_props: Options,
}

impl ResolvedStack {
    /// Screen names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.screens.iter().map(|screen| screen.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

/// What a tabs/drawer item renders.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedTarget {
    Stack(Arc<ResolvedStack>),
    Container(Arc<ResolvedContainer>),
}

/// One item of a tabs/drawer container.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEntry {
    pub name: String,
    pub target: ResolvedTarget,
    pub options: Option<OptionSource>,
}

/// A tabs or drawer container with its content resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedContainer {
    pub kind: ContainerKind,
    pub name: String,
    pub entries: Vec<ResolvedEntry>,
    pub options: Option<OptionSource>,
    pub screen_options: Option<OptionSource>,
    pub navigator_props: Options,
}

impl ResolvedContainer {
    fn empty(kind: ContainerKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_owned(),
            entries: Vec::new(),
            options: None,
            screen_options: None,
            navigator_props: Options::new(),
        }
    }

    /// Item names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Item `name`, if it resolved.
    pub fn entry(&self, name: &str) -> Option<&ResolvedEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

type ContainerKey = (ContainerKind, String);

/// Memoizing resolver over one layout.
#[derive(Debug)]
pub struct Resolver {
    layout: Arc<Layout>,
    diagnostics: Diagnostics,
    stacks: Mutex<FxHashMap<StackDefinition, Arc<ResolvedStack>>>,
    containers: Mutex<FxHashMap<ContainerKey, Arc<ResolvedContainer>>>,
    /// Top-level results, including those with an entry dropped by a cycle.
    roots: Mutex<FxHashMap<ContainerKey, Arc<ResolvedContainer>>>,
}

impl Resolver {
    /// Resolver logging through `tracing`.
    pub fn new(layout: Arc<Layout>) -> Self {
        Self::with_diagnostics(layout, Diagnostics::default())
    }

    pub(crate) fn with_diagnostics(layout: Arc<Layout>, diagnostics: Diagnostics) -> Self {
        Self {
            layout,
            diagnostics,
            stacks: Mutex::new(FxHashMap::default()),
            containers: Mutex::new(FxHashMap::default()),
            roots: Mutex::new(FxHashMap::default()),
        }
    }

    /// The layout being resolved.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Resolve a stack reference.
    ///
    /// A bare name is looked up in the stacks table (following aliases); a
    /// screen list or inline object is terminal and never consults the table.
    pub fn resolve_stack(&self, definition: &StackDefinition) -> Arc<ResolvedStack> {
        if let Some(hit) = self.stacks.lock().get(definition) {
            return Arc::clone(hit);
        }
        let resolved = Arc::new(self.expand_stack(definition));
        Arc::clone(
            self.stacks
                .lock()
                .entry(definition.clone())
                .or_insert(resolved),
        )
    }

    /// Resolve the tabs container `name`.
    pub fn resolve_tabs(&self, name: &str) -> Arc<ResolvedContainer> {
        self.resolve_container(ContainerKind::Tabs, name)
    }

    /// Resolve the drawer container `name`.
    pub fn resolve_drawer(&self, name: &str) -> Arc<ResolvedContainer> {
        self.resolve_container(ContainerKind::Drawers, name)
    }

    /// Resolve the stack rendered by modal `name`.
    pub fn resolve_modal(&self, name: &str) -> Arc<ResolvedStack> {
        match self.layout.modals.get(name) {
            Some(modal) => self.resolve_stack(&modal.stack),
            None => {
                self.diagnostics
                    .warn(format!("modal \"{name}\" is not registered"));
                Arc::default()
            }
        }
    }

    fn resolve_container(&self, kind: ContainerKind, name: &str) -> Arc<ResolvedContainer> {
        let key = (kind, name.to_owned());
        if let Some(hit) = self.roots.lock().get(&key) {
            return Arc::clone(hit);
        }
        let container = self
            .container_in(kind, name, &mut Vec::new())
            .map(|(container, _)| container)
            .unwrap_or_else(|| Arc::new(ResolvedContainer::empty(kind, name)));
        Arc::clone(self.roots.lock().entry(key).or_insert(container))
    }

    /// Resolve `(kind, name)` with `path` holding the containers currently
    /// being expanded.
    ///
    /// Returns `None` when the container is already on the path. The flag is
    /// `false` when an entry somewhere below was dropped because of such a
    /// cycle; those results depend on the path and are not memoized.
    fn container_in(
        &self,
        kind: ContainerKind,
        name: &str,
        path: &mut Vec<ContainerKey>,
    ) -> Option<(Arc<ResolvedContainer>, bool)> {
        let key = (kind, name.to_owned());
        if path.contains(&key) {
            return None;
        }
        if let Some(hit) = self.containers.lock().get(&key) {
            return Some((Arc::clone(hit), true));
        }

        let Some(data) = self.container_table(kind).and_then(|table| table.get(name)) else {
            self.diagnostics
                .warn(format!("{kind} \"{name}\" is not registered"));
            let empty = Arc::new(ResolvedContainer::empty(kind, name));
            self.containers.lock().insert(key, Arc::clone(&empty));
            return Some((empty, true));
        };

        path.push(key.clone());
        let (container, clean) = self.expand_container(kind, name, data, path);
        path.pop();

        let container = Arc::new(container);
        if clean {
            let cached = Arc::clone(self.containers.lock().entry(key).or_insert(container));
            return Some((cached, true));
        }
        Some((container, false))
    }

    fn expand_container(
        &self,
        kind: ContainerKind,
        name: &str,
        data: &ContainerData,
        path: &mut Vec<ContainerKey>,
    ) -> (ResolvedContainer, bool) {
        let mut clean = true;
        let mut entries = Vec::with_capacity(data.content.len());

        for (item, entry) in data.content.iter() {
            let Some(target) = entry.target() else {
                self.diagnostics.warn(format!(
                    "either `stack`, `tabs` or `drawer` must be provided for \"{item}\" in {kind} \"{name}\""
                ));
                continue;
            };
            if entry.is_ambiguous() {
                self.diagnostics.warn(format!(
                    "\"{item}\" in {kind} \"{name}\" sets more than one content branch, using {}",
                    branch_name(target)
                ));
            }

            let (nested_kind, nested) = match target {
                ContentTarget::Stack(definition) => {
                    entries.push(ResolvedEntry {
                        name: item.to_owned(),
                        target: ResolvedTarget::Stack(self.resolve_stack(definition)),
                        options: entry.options.clone(),
                    });
                    continue;
                }
                ContentTarget::Tabs(nested) => (ContainerKind::Tabs, nested),
                ContentTarget::Drawer(nested) => (ContainerKind::Drawers, nested),
            };
            let Some((container, nested_clean)) = self.container_in(nested_kind, nested, path) else {
                self.diagnostics.warn(format!(
                    "\"{item}\" in {kind} \"{name}\" nests {nested_kind} \"{nested}\" inside itself, skipping"
                ));
                clean = false;
                continue;
            };
            clean &= nested_clean;

            entries.push(ResolvedEntry {
                name: item.to_owned(),
                target: ResolvedTarget::Container(container),
                options: entry.options.clone(),
            });
        }

        let container = ResolvedContainer {
            kind,
            name: name.to_owned(),
            entries,
            options: data.options.clone(),
            screen_options: data.screen_options.clone(),
            navigator_props: data.navigator_props.clone(),
        };
        (container, clean)
    }

    fn expand_stack(&self, definition: &StackDefinition) -> ResolvedStack {
        let mut visited: Vec<&str> = Vec::new();
        let mut current = definition;

        loop {
            match current {
                StackDefinition::Named(name) => {
                    if visited.contains(&name.as_str()) {
                        self.diagnostics
                            .warn(format!("stack \"{name}\" refers back to itself"));
                        return ResolvedStack::default();
                    }
                    visited.push(name);
                    let Some(next) = self.layout.stacks.get(name) else {
                        self.diagnostics
                            .warn(format!("stack \"{name}\" is not registered"));
                        return ResolvedStack::default();
                    };
                    current = next;
                }
                StackDefinition::Screens(names) => {
                    return ResolvedStack {
                        screens: self.screens(names),
                        ..ResolvedStack::default()
                    };
                }
                StackDefinition::Inline(data) => {
                    return ResolvedStack {
                        screens: self.screens(&data.screens),
                        options: data.options.clone(),
                        navigator_props: data.navigator_props.clone(),
                    };
                }
            }
        }
    }

    fn screens(&self, names: &[String]) -> Vec<ResolvedScreen> {
        names
            .iter()
            .filter_map(|name| match self.layout.screens.get(name) {
                Some(screen) => Some(ResolvedScreen {
                    name: name.clone(),
                    component: screen.component.clone(),
                    options: screen.options.clone(),
                }),
                None => {
                    self.diagnostics
                        .warn(format!("screen \"{name}\" is not registered"));
                    None
                }
            })
            .collect()
    }

    fn container_table(&self, kind: ContainerKind) -> Option<&Table<ContainerData>> {
        match kind {
            ContainerKind::Tabs => Some(&self.layout.tabs),
            ContainerKind::Drawers => Some(&self.layout.drawers),
            ContainerKind::Stacks | ContainerKind::Modals => None,
        }
    }
}

fn branch_name(target: ContentTarget<'_>) -> &'static str {
    match target {
        ContentTarget::Stack(_) => "`stack`",
        ContentTarget::Tabs(_) => "`tabs`",
        ContentTarget::Drawer(_) => "`drawer`",
    }
}
