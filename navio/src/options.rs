//! Option values and the precedence chain that produces effective options.
//!
//! ## Usage
//!
//! Build an [`OptionsChain`] from sources at fixed [`Precedence`] levels and
//! call [`OptionsChain::evaluate`] on every render pass. Sources may be static
//! maps or functions of the current [`OptionsContext`].
//!
//! Merging is shallow: a later source replaces a key wholesale, nested objects
//! are never merged.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::{layout::ContainerKind, navigation::Route, shared::Shared};

/// Key controlling whether the host draws navigator chrome (header/title bar).
pub const HEADER_SHOWN: &str = "headerShown";

/// A flat, host-defined options object (`{"title": "Home", "badge": 3}`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    /// Create an empty options object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow merge: every key of `other` overwrites the same key here.
    pub fn merge_from(&mut self, other: &Options) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Borrow the underlying JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// What an option function gets to look at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionsContext {
    /// Route the options are computed for, when the host knows it.
    pub route: Option<Route>,
}

impl OptionsContext {
    /// Context for a route with no params.
    pub fn for_route(name: impl Into<String>) -> Self {
        Self {
            route: Some(Route::new(name)),
        }
    }

    /// Name of the route, if any.
    pub fn route_name(&self) -> Option<&str> {
        self.route.as_ref().map(|route| route.name.as_str())
    }
}

type ComputeOptions = dyn Fn(&OptionsContext) -> Options + Send + Sync;

/// Either a fixed options object or a function of the render context.
///
/// Functions are never invoked at declaration time, only while a chain is
/// evaluated. Equality is identity, so two separately built sources with the
/// same content are different sources.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum OptionSource {
    /// Options known up front.
    Static(Shared<Options>),
    /// Options derived from the route being rendered.
    Computed(Shared<ComputeOptions>),
}

impl OptionSource {
    /// Wrap a function of the render context.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&OptionsContext) -> Options + Send + Sync + 'static,
    {
        OptionSource::Computed(Shared::from_shared(Arc::new(f)))
    }

    /// Evaluate against `context`.
    pub fn resolve(&self, context: &OptionsContext) -> Options {
        match self {
            OptionSource::Static(options) => (**options).clone(),
            OptionSource::Computed(f) => (**f)(context),
        }
    }

    fn merge_into(&self, acc: &mut Options, context: &OptionsContext) {
        match self {
            OptionSource::Static(options) => acc.merge_from(options),
            OptionSource::Computed(f) => acc.merge_from(&(**f)(context)),
        }
    }
}

impl From<Options> for OptionSource {
    fn from(options: Options) -> Self {
        OptionSource::Static(Shared::new(options))
    }
}

impl fmt::Debug for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSource::Static(options) => f.debug_tuple("Static").field(&**options).finish(),
            OptionSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for OptionSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Options::deserialize(deserializer).map(OptionSource::from)
    }
}

/// Priority of an option source, lowest first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Precedence {
    /// Floor supplied by navio itself (chrome hidden).
    Framework,
    /// `defaultOptions` of the layout, plus a container's `screenOptions`.
    LayoutDefault,
    /// Options attached to the named entity in its layout table.
    Entity,
    /// Options declared by the screen component itself.
    Local,
    /// Runtime patches from `updateOptions`.
    Patch,
}

/// Ordered option sources for one rendered entity.
///
/// Sources are kept sorted by [`Precedence`]; sources at the same level keep
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionsChain {
    sources: SmallVec<[(Precedence, OptionSource); 6]>,
}

impl OptionsChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::push`]; `None` contributes nothing.
    pub fn with(mut self, level: Precedence, source: impl Into<Option<OptionSource>>) -> Self {
        if let Some(source) = source.into() {
            self.push(level, source);
        }
        self
    }

    /// Insert `source` after every source at `level` or below.
    pub fn push(&mut self, level: Precedence, source: OptionSource) {
        let at = self
            .sources
            .iter()
            .position(|(existing, _)| *existing > level)
            .unwrap_or(self.sources.len());
        self.sources.insert(at, (level, source));
    }

    /// Sources in evaluation order.
    pub fn sources(&self) -> impl Iterator<Item = (Precedence, &OptionSource)> {
        self.sources.iter().map(|(level, source)| (*level, source))
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no source at all.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Effective options for `context`.
    pub fn evaluate(&self, context: &OptionsContext) -> Options {
        merge(self.sources.iter().map(|(_, source)| source), context)
    }
}

/// Merge `sources` (lowest priority first) into one options object.
///
/// Each source is evaluated against `context` and shallow-merged over the
/// accumulator, so a later source wins key by key.
pub fn merge<'a>(
    sources: impl IntoIterator<Item = &'a OptionSource>,
    context: &OptionsContext,
) -> Options {
    let mut acc = Options::new();
    for source in sources {
        source.merge_into(&mut acc, context);
    }
    acc
}

/// Which part of a container an options entry applies to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OptionsRole {
    /// The routes rendered inside the container.
    Screen,
    /// The container's own route in its parent navigator.
    Container,
}

/// Screen/container option pair for one container kind.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleOptions {
    #[serde(default)]
    pub screen: Option<OptionSource>,
    #[serde(default)]
    pub container: Option<OptionSource>,
}

impl RoleOptions {
    fn get(&self, role: OptionsRole) -> Option<&OptionSource> {
        match role {
            OptionsRole::Screen => self.screen.as_ref(),
            OptionsRole::Container => self.container.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: OptionsRole) -> &mut Option<OptionSource> {
        match role {
            OptionsRole::Screen => &mut self.screen,
            OptionsRole::Container => &mut self.container,
        }
    }
}

/// Author-declared default options, keyed by container kind and role.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultOptions {
    #[serde(default)]
    pub stacks: RoleOptions,
    #[serde(default)]
    pub tabs: RoleOptions,
    #[serde(default)]
    pub drawers: RoleOptions,
    #[serde(default)]
    pub modals: RoleOptions,
}

impl DefaultOptions {
    /// Empty defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(
        mut self,
        kind: ContainerKind,
        role: OptionsRole,
        source: impl Into<OptionSource>,
    ) -> Self {
        *self.kind_mut(kind).slot_mut(role) = Some(source.into());
        self
    }

    /// Defaults for `kind` and `role`, if declared.
    pub fn get(&self, kind: ContainerKind, role: OptionsRole) -> Option<&OptionSource> {
        self.kind(kind).get(role)
    }

    fn kind(&self, kind: ContainerKind) -> &RoleOptions {
        match kind {
            ContainerKind::Stacks => &self.stacks,
            ContainerKind::Tabs => &self.tabs,
            ContainerKind::Drawers => &self.drawers,
            ContainerKind::Modals => &self.modals,
        }
    }

    fn kind_mut(&mut self, kind: ContainerKind) -> &mut RoleOptions {
        match kind {
            ContainerKind::Stacks => &mut self.stacks,
            ContainerKind::Tabs => &mut self.tabs,
            ContainerKind::Drawers => &mut self.drawers,
            ContainerKind::Modals => &mut self.modals,
        }
    }
}

/// Framework floor for `kind` and `role`.
///
/// Every container route hides its chrome, and so do the screens of tabs and
/// drawers (the nested navigator draws its own). Stack and modal screens have
/// no floor.
pub fn framework_defaults(kind: ContainerKind, role: OptionsRole) -> Option<Options> {
    let hidden = || Options::new().with(HEADER_SHOWN, false);
    match (kind, role) {
        (_, OptionsRole::Container) => Some(hidden()),
        (ContainerKind::Tabs | ContainerKind::Drawers, OptionsRole::Screen) => Some(hidden()),
        (ContainerKind::Stacks | ContainerKind::Modals, OptionsRole::Screen) => None,
    }
}
