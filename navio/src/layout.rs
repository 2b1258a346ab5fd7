//! Static layout description: screens, stacks, tabs, drawers and modals.
//!
//! ## Usage
//!
//! Build a [`Layout`] once with [`Layout::builder`] (or load a
//! [`crate::config::LayoutSpec`]) and hand it to [`crate::Navio::build`].
//! The layout is never mutated afterwards.

use std::{fmt, marker::PhantomData, str::FromStr, sync::Arc};

use rustc_hash::FxHashMap;
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};

use crate::{
    error::NavioError,
    navigation::Route,
    options::{DefaultOptions, OptionSource, Options},
    shared::{Callback, Shared},
};

/// Insertion-ordered, name-keyed table.
#[derive(Clone)]
pub struct Table<T> {
    entries: Vec<(String, T)>,
    index: FxHashMap<String, usize>,
}

impl<T> Table<T> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert or replace `name`. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        if let Some(&at) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[at].1, value));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
        None
    }

    /// Look up `name`.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&at| &self.entries[at].1)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map every value, keeping names and order.
    pub fn try_map<U, E>(self, mut f: impl FnMut(&str, T) -> Result<U, E>) -> Result<Table<U>, E> {
        let mut table = Table::new();
        for (name, value) in self.entries {
            let value = f(&name, value)?;
            table.insert(name, value);
        }
        Ok(table)
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for Table<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: fmt::Debug> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Table<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut table = Table::new();
        for (name, value) in iter {
            table.insert(name, value);
        }
        table
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Table<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for TableVisitor<T> {
            type Value = Table<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut table = Table::new();
                while let Some((name, value)) = map.next_entry::<String, T>()? {
                    table.insert(name, value);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

/// Kind of container a layout table describes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum ContainerKind {
    Stacks,
    Tabs,
    Drawers,
    Modals,
}

impl ContainerKind {
    /// Lowercase table name (`"stacks"`, `"tabs"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKind::Stacks => "stacks",
            ContainerKind::Tabs => "tabs",
            ContainerKind::Drawers => "drawers",
            ContainerKind::Modals => "modals",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container kinds that can act as the app root.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RootKind {
    Stacks,
    Tabs,
    Drawers,
}

impl From<RootKind> for ContainerKind {
    fn from(kind: RootKind) -> Self {
        match kind {
            RootKind::Stacks => ContainerKind::Stacks,
            RootKind::Tabs => ContainerKind::Tabs,
            RootKind::Drawers => ContainerKind::Drawers,
        }
    }
}

/// Root pointer, written `"<kind>.<name>"` (e.g. `"tabs.AppTabs"`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RootRoute {
    pub kind: RootKind,
    pub name: String,
}

impl RootRoute {
    /// Root pointing at the stack `name`.
    pub fn stack(name: impl Into<String>) -> Self {
        Self {
            kind: RootKind::Stacks,
            name: name.into(),
        }
    }

    /// Root pointing at the tabs `name`.
    pub fn tabs(name: impl Into<String>) -> Self {
        Self {
            kind: RootKind::Tabs,
            name: name.into(),
        }
    }

    /// Root pointing at the drawer `name`.
    pub fn drawer(name: impl Into<String>) -> Self {
        Self {
            kind: RootKind::Drawers,
            name: name.into(),
        }
    }
}

impl FromStr for RootRoute {
    type Err = NavioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NavioError::InvalidRoot(s.to_owned());
        let (kind, name) = s.split_once('.').ok_or_else(invalid)?;
        let kind = match kind {
            "stacks" => RootKind::Stacks,
            "tabs" => RootKind::Tabs,
            "drawers" => RootKind::Drawers,
            _ => return Err(invalid()),
        };
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            kind,
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RootRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", ContainerKind::from(self.kind), self.name)
    }
}

impl<'de> Deserialize<'de> for RootRoute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Props handed to a screen renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenProps {
    pub route: Route,
}

type RenderScreen = dyn Fn(&ScreenProps) + Send + Sync;

/// A screen renderer, optionally declaring its own options.
///
/// Declared options sit above the layout's per-screen options in the merge
/// order.
#[derive(Clone, PartialEq)]
pub struct ScreenComponent {
    render: Shared<RenderScreen>,
    options: Option<OptionSource>,
}

impl ScreenComponent {
    /// Wrap a render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&ScreenProps) + Send + Sync + 'static,
    {
        Self {
            render: Shared::from_shared(Arc::new(render)),
            options: None,
        }
    }

    /// Attach component-declared options.
    pub fn with_options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Component-declared options.
    pub fn options(&self) -> Option<&OptionSource> {
        self.options.as_ref()
    }

    /// Render the screen.
    pub fn render(&self, props: &ScreenProps) {
        (*self.render)(props);
    }
}

impl fmt::Debug for ScreenComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenComponent")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A screen entry: a bare component or `{component, options}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Screen {
    pub component: ScreenComponent,
    pub options: Option<OptionSource>,
}

impl Screen {
    /// Screen with layout-level options.
    pub fn with_options(component: ScreenComponent, options: impl Into<OptionSource>) -> Self {
        Self {
            component,
            options: Some(options.into()),
        }
    }
}

impl From<ScreenComponent> for Screen {
    fn from(component: ScreenComponent) -> Self {
        Self {
            component,
            options: None,
        }
    }
}

/// Explicit stack object: screens plus container configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackData {
    pub screens: Vec<String>,
    #[serde(default)]
    pub options: Option<OptionSource>,
    #[serde(default)]
    pub navigator_props: Options,
}

impl StackData {
    /// Stack of `screens` with no extra configuration.
    pub fn new<S: Into<String>>(screens: impl IntoIterator<Item = S>) -> Self {
        Self {
            screens: screens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Builder-style container options.
    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Builder-style navigator props.
    pub fn navigator_props(mut self, props: Options) -> Self {
        self.navigator_props = props;
        self
    }
}

/// How a stack is referenced: by name, as a screen list, or inline.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StackDefinition {
    /// Name in the stacks table.
    Named(String),
    /// Inline list of screen names.
    Screens(Vec<String>),
    /// Inline stack object.
    Inline(Shared<StackData>),
}

impl From<&str> for StackDefinition {
    fn from(name: &str) -> Self {
        StackDefinition::Named(name.to_owned())
    }
}

impl From<String> for StackDefinition {
    fn from(name: String) -> Self {
        StackDefinition::Named(name)
    }
}

impl<const N: usize> From<[&str; N]> for StackDefinition {
    fn from(screens: [&str; N]) -> Self {
        StackDefinition::Screens(screens.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl From<Vec<String>> for StackDefinition {
    fn from(screens: Vec<String>) -> Self {
        StackDefinition::Screens(screens)
    }
}

impl From<StackData> for StackDefinition {
    fn from(data: StackData) -> Self {
        StackDefinition::Inline(Shared::new(data))
    }
}

/// Which branch of a content entry is in use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContentTarget<'a> {
    Stack(&'a StackDefinition),
    Tabs(&'a str),
    Drawer(&'a str),
}

/// One tab or drawer item.
///
/// Exactly one of `stack`, `tabs`, `drawer` is expected. An entry with none is
/// skipped at render time; with several, `stack` wins over `drawer` over
/// `tabs`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentEntry {
    pub stack: Option<StackDefinition>,
    pub tabs: Option<String>,
    pub drawer: Option<String>,
    pub options: Option<OptionSource>,
}

impl ContentEntry {
    /// Entry rendering a stack.
    pub fn stack(definition: impl Into<StackDefinition>) -> Self {
        Self {
            stack: Some(definition.into()),
            ..Self::default()
        }
    }

    /// Entry rendering a nested tabs container.
    pub fn tabs(name: impl Into<String>) -> Self {
        Self {
            tabs: Some(name.into()),
            ..Self::default()
        }
    }

    /// Entry rendering a nested drawer container.
    pub fn drawer(name: impl Into<String>) -> Self {
        Self {
            drawer: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builder-style options for this item.
    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// The branch in use, if any.
    pub fn target(&self) -> Option<ContentTarget<'_>> {
        if let Some(stack) = &self.stack {
            return Some(ContentTarget::Stack(stack));
        }
        if let Some(drawer) = &self.drawer {
            return Some(ContentTarget::Drawer(drawer));
        }
        self.tabs.as_deref().map(ContentTarget::Tabs)
    }

    /// Whether more than one branch is set.
    pub fn is_ambiguous(&self) -> bool {
        [
            self.stack.is_some(),
            self.tabs.is_some(),
            self.drawer.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
            > 1
    }
}

impl From<&str> for ContentEntry {
    fn from(name: &str) -> Self {
        ContentEntry::stack(name)
    }
}

impl<const N: usize> From<[&str; N]> for ContentEntry {
    fn from(screens: [&str; N]) -> Self {
        ContentEntry::stack(screens)
    }
}

impl From<StackDefinition> for ContentEntry {
    fn from(definition: StackDefinition) -> Self {
        ContentEntry::stack(definition)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawContentEntry {
    #[serde(default)]
    stack: Option<StackDefinition>,
    #[serde(default)]
    tabs: Option<String>,
    #[serde(default)]
    drawer: Option<String>,
    #[serde(default)]
    options: Option<OptionSource>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Direct(StackDefinition),
    Entry(RawContentEntry),
}

impl<'de> Deserialize<'de> for ContentEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawContent::deserialize(deserializer)? {
            RawContent::Direct(definition) => ContentEntry::stack(definition),
            RawContent::Entry(raw) => ContentEntry {
                stack: raw.stack,
                tabs: raw.tabs,
                drawer: raw.drawer,
                options: raw.options,
            },
        })
    }
}

/// A tabs or drawer container: named content plus container configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerData {
    pub content: Table<ContentEntry>,
    /// Options of the container's own route in the root navigator.
    #[serde(default)]
    pub options: Option<OptionSource>,
    /// Options applied to every item, below per-item options.
    #[serde(default)]
    pub screen_options: Option<OptionSource>,
    /// Opaque props forwarded to the host container factory.
    #[serde(default)]
    pub navigator_props: Options,
}

impl ContainerData {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style content item.
    pub fn item(mut self, name: impl Into<String>, entry: impl Into<ContentEntry>) -> Self {
        self.content.insert(name, entry.into());
        self
    }

    /// Builder-style container options.
    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Builder-style per-item default options.
    pub fn screen_options(mut self, options: impl Into<OptionSource>) -> Self {
        self.screen_options = Some(options.into());
        self
    }

    /// Builder-style navigator props.
    pub fn navigator_props(mut self, props: Options) -> Self {
        self.navigator_props = props;
        self
    }
}

/// A modal: a stack presented modally.
#[derive(Clone, Debug, PartialEq)]
pub struct ModalData {
    pub stack: StackDefinition,
    pub options: Option<OptionSource>,
}

impl ModalData {
    /// Modal rendering `stack`.
    pub fn new(stack: impl Into<StackDefinition>) -> Self {
        Self {
            stack: stack.into(),
            options: None,
        }
    }

    /// Builder-style modal route options.
    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.options = Some(options.into());
        self
    }
}

impl From<StackDefinition> for ModalData {
    fn from(stack: StackDefinition) -> Self {
        ModalData::new(stack)
    }
}

impl From<&str> for ModalData {
    fn from(stack: &str) -> Self {
        ModalData::new(stack)
    }
}

impl<const N: usize> From<[&str; N]> for ModalData {
    fn from(screens: [&str; N]) -> Self {
        ModalData::new(screens)
    }
}

impl From<StackData> for ModalData {
    fn from(data: StackData) -> Self {
        ModalData::new(data)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModalData {
    stack: StackDefinition,
    #[serde(default)]
    options: Option<OptionSource>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawModal {
    Direct(StackDefinition),
    Data(RawModalData),
}

impl<'de> Deserialize<'de> for ModalData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawModal::deserialize(deserializer)? {
            RawModal::Direct(stack) => ModalData::new(stack),
            RawModal::Data(raw) => ModalData {
                stack: raw.stack,
                options: raw.options,
            },
        })
    }
}

/// The whole app layout.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub(crate) screens: Table<Screen>,
    pub(crate) stacks: Table<StackDefinition>,
    pub(crate) tabs: Table<ContainerData>,
    pub(crate) drawers: Table<ContainerData>,
    pub(crate) modals: Table<ModalData>,
    pub(crate) root: Option<RootRoute>,
    pub(crate) hooks: Vec<Callback>,
    pub(crate) default_options: DefaultOptions,
}

impl Layout {
    /// Start building a layout.
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::default()
    }

    pub fn screens(&self) -> &Table<Screen> {
        &self.screens
    }

    pub fn stacks(&self) -> &Table<StackDefinition> {
        &self.stacks
    }

    pub fn tabs(&self) -> &Table<ContainerData> {
        &self.tabs
    }

    pub fn drawers(&self) -> &Table<ContainerData> {
        &self.drawers
    }

    pub fn modals(&self) -> &Table<ModalData> {
        &self.modals
    }

    pub fn root(&self) -> Option<&RootRoute> {
        self.root.as_ref()
    }

    pub fn default_options(&self) -> &DefaultOptions {
        &self.default_options
    }

    /// Whether `name` is registered in the table of `kind`.
    pub fn contains(&self, kind: ContainerKind, name: &str) -> bool {
        match kind {
            ContainerKind::Stacks => self.stacks.contains(name),
            ContainerKind::Tabs => self.tabs.contains(name),
            ContainerKind::Drawers => self.drawers.contains(name),
            ContainerKind::Modals => self.modals.contains(name),
        }
    }

    /// Whether `name` is an item of any container of `kind`.
    pub fn contains_content(&self, kind: ContainerKind, name: &str) -> bool {
        let table = match kind {
            ContainerKind::Tabs => &self.tabs,
            ContainerKind::Drawers => &self.drawers,
            ContainerKind::Stacks | ContainerKind::Modals => return false,
        };
        table.iter().any(|(_, data)| data.content.contains(name))
    }

    /// Names from `names` that are missing in the table of `kind`.
    ///
    /// Run this once at startup against a `route_names!` enum to catch enums
    /// that drifted from the layout.
    pub fn missing_names<'a, N: AsRef<str> + 'a>(
        &self,
        kind: ContainerKind,
        names: impl IntoIterator<Item = &'a N>,
    ) -> Vec<String> {
        names
            .into_iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.contains(kind, name))
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn run_hooks(&self) {
        for hook in &self.hooks {
            hook.call();
        }
    }
}

/// Builder for [`Layout`].
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    layout: Layout,
}

impl LayoutBuilder {
    pub fn screen(mut self, name: impl Into<String>, screen: impl Into<Screen>) -> Self {
        self.layout.screens.insert(name, screen.into());
        self
    }

    pub fn stack(mut self, name: impl Into<String>, stack: impl Into<StackDefinition>) -> Self {
        self.layout.stacks.insert(name, stack.into());
        self
    }

    pub fn tabs(mut self, name: impl Into<String>, tabs: ContainerData) -> Self {
        self.layout.tabs.insert(name, tabs);
        self
    }

    pub fn drawer(mut self, name: impl Into<String>, drawer: ContainerData) -> Self {
        self.layout.drawers.insert(name, drawer);
        self
    }

    pub fn modal(mut self, name: impl Into<String>, modal: impl Into<ModalData>) -> Self {
        self.layout.modals.insert(name, modal.into());
        self
    }

    pub fn root(mut self, root: RootRoute) -> Self {
        self.layout.root = Some(root);
        self
    }

    /// Hook run every time a stack, tabs or drawer container is built.
    pub fn hook(mut self, hook: impl Into<Callback>) -> Self {
        self.layout.hooks.push(hook.into());
        self
    }

    pub fn default_options(mut self, defaults: DefaultOptions) -> Self {
        self.layout.default_options = defaults;
        self
    }

    pub fn build(self) -> Layout {
        self.layout
    }
}
