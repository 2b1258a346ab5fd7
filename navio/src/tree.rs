//! The renderable navigator tree handed to the host.
//!
//! Every node carries the options chain that produces its effective options;
//! hosts evaluate it on each render pass because sources may depend on the
//! route being rendered.

use std::sync::Arc;

use crate::{
    layout::{ContainerKind, ScreenComponent},
    options::{Options, OptionsChain, OptionsContext},
    patches::LocalPatches,
};

/// How a root group is presented.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Presentation {
    #[default]
    Default,
    Modal,
}

/// The app root: one route per stack, tabs, drawer and modal.
#[derive(Debug)]
pub struct RootNavigator {
    /// Route focused at mount.
    pub initial_route: Option<String>,
    /// Stacks, tabs and drawers in their own groups, then the modal group.
    /// Empty groups are omitted.
    pub groups: Vec<RouteGroup>,
}

impl RootNavigator {
    /// Every route, group by group.
    pub fn routes(&self) -> impl Iterator<Item = &ContainerRoute> {
        self.groups.iter().flat_map(|group| group.routes.iter())
    }

    /// Root route `name`.
    pub fn route(&self, name: &str) -> Option<&ContainerRoute> {
        self.routes().find(|route| route.name == name)
    }
}

/// Routes rendered with the same presentation.
#[derive(Debug)]
pub struct RouteGroup {
    pub presentation: Presentation,
    pub routes: Vec<ContainerRoute>,
}

/// A container mounted as a route of the root navigator.
#[derive(Debug)]
pub struct ContainerRoute {
    pub name: String,
    pub kind: ContainerKind,
    pub options: OptionsChain,
    pub navigator: Navigator,
}

impl ContainerRoute {
    /// Effective options of this route.
    pub fn effective_options(&self) -> Options {
        self.options.evaluate(&OptionsContext::for_route(&self.name))
    }
}

/// A nested navigator, built by the host container factory of its kind.
#[derive(Debug)]
pub enum Navigator {
    Stack(StackNavigator),
    Tabs(ContentNavigator),
    Drawer(ContentNavigator),
}

impl Navigator {
    pub fn as_stack(&self) -> Option<&StackNavigator> {
        match self {
            Navigator::Stack(stack) => Some(stack),
            Navigator::Tabs(_) | Navigator::Drawer(_) => None,
        }
    }

    /// The tabs or drawer navigator, if this is one.
    pub fn as_content(&self) -> Option<&ContentNavigator> {
        match self {
            Navigator::Stack(_) => None,
            Navigator::Tabs(content) | Navigator::Drawer(content) => Some(content),
        }
    }
}

/// Screens of a stack navigator.
#[derive(Debug)]
pub struct StackNavigator {
    pub screens: Vec<ScreenRoute>,
    pub navigator_props: Options,
}

impl StackNavigator {
    /// Screen names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.screens.iter().map(|screen| screen.name.as_str())
    }

    pub fn screen(&self, name: &str) -> Option<&ScreenRoute> {
        self.screens.iter().find(|screen| screen.name == name)
    }
}

/// A screen inside a stack navigator.
#[derive(Debug)]
pub struct ScreenRoute {
    pub name: String,
    pub component: ScreenComponent,
    pub options: OptionsChain,
}

impl ScreenRoute {
    /// Effective options with the route named after the screen.
    pub fn effective_options(&self) -> Options {
        self.options.evaluate(&OptionsContext::for_route(&self.name))
    }
}

/// Items of a tabs or drawer navigator.
#[derive(Debug)]
pub struct ContentNavigator {
    pub name: String,
    pub routes: Vec<ContentRoute>,
    pub navigator_props: Options,
    /// This container's patch table; alive as long as the navigator.
    pub patches: Arc<LocalPatches>,
}

impl ContentNavigator {
    /// Item names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.name.as_str())
    }

    pub fn route(&self, name: &str) -> Option<&ContentRoute> {
        self.routes.iter().find(|route| route.name == name)
    }
}

/// One tab or drawer item.
#[derive(Debug)]
pub struct ContentRoute {
    pub name: String,
    pub options: OptionsChain,
    pub navigator: Navigator,
}

impl ContentRoute {
    /// Effective options, runtime patches included.
    pub fn effective_options(&self) -> Options {
        self.options.evaluate(&OptionsContext::for_route(&self.name))
    }
}
