//! Render pass: walks the layout and builds the [`RootNavigator`] tree.
//!
//! Option chains are assembled here, lowest priority first:
//!
//! - stack screens: framework floor (implicit stack only), `defaultOptions.
//!   stacks.screen`, the screens table entry, component-declared options.
//! - tabs/drawer items: framework floor, `defaultOptions.<kind>.screen`, the
//!   container's `screenOptions`, the item's options, runtime patches.
//! - container routes: framework floor, `defaultOptions.<kind>.container`,
//!   the table entry's options.

use std::time::Instant;

use tracing::debug;

use crate::{
    diagnostics::Diagnostics,
    layout::{ContainerKind, Layout, RootRoute},
    options::{
        HEADER_SHOWN, OptionSource, Options, OptionsChain, OptionsRole, Precedence,
        framework_defaults,
    },
    patches::{LocalPatches, PatchRegistry},
    resolver::{ResolvedContainer, ResolvedStack, ResolvedTarget, Resolver},
    tree::{
        ContainerRoute, ContentNavigator, ContentRoute, Navigator, Presentation, RootNavigator,
        RouteGroup, ScreenRoute, StackNavigator,
    },
    tunnel::NavioTunnel,
};

/// Name of the implicit stack used when a layout declares only screens.
pub const FALLBACK_STACK: &str = "Stack";

pub(crate) struct Renderer<'a> {
    pub(crate) resolver: &'a Resolver,
    pub(crate) patches: &'a PatchRegistry,
    pub(crate) tunnel: &'a NavioTunnel,
    pub(crate) diagnostics: &'a Diagnostics,
}

impl Renderer<'_> {
    fn layout(&self) -> &Layout {
        self.resolver.layout()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn root(&self, root: Option<&RootRoute>) -> RootNavigator {
        let started = Instant::now();
        let layout = self.layout();
        let mut groups = Vec::new();

        let fallback =
            layout.stacks.is_empty() && layout.tabs.is_empty() && layout.drawers.is_empty();
        if fallback {
            self.diagnostics.info(format!(
                "no stacks, tabs or drawers declared, rendering every screen in \"{FALLBACK_STACK}\""
            ));
            groups.push(RouteGroup {
                presentation: Presentation::Default,
                routes: vec![self.fallback_stack()],
            });
        } else {
            let stacks = layout
                .stacks
                .iter()
                .map(|(name, definition)| {
                    let resolved = self.resolver.resolve_stack(definition);
                    self.container_route(
                        name,
                        ContainerKind::Stacks,
                        resolved.options.clone(),
                        Navigator::Stack(self.stack_navigator(&resolved, false)),
                    )
                })
                .collect();
            let tabs = layout
                .tabs
                .names()
                .map(|name| {
                    let resolved = self.resolver.resolve_tabs(name);
                    self.container_route(
                        name,
                        ContainerKind::Tabs,
                        resolved.options.clone(),
                        Navigator::Tabs(self.content_navigator(&resolved)),
                    )
                })
                .collect();
            let drawers = layout
                .drawers
                .names()
                .map(|name| {
                    let resolved = self.resolver.resolve_drawer(name);
                    self.container_route(
                        name,
                        ContainerKind::Drawers,
                        resolved.options.clone(),
                        Navigator::Drawer(self.content_navigator(&resolved)),
                    )
                })
                .collect();
            for routes in [stacks, tabs, drawers] {
                push_group(&mut groups, Presentation::Default, routes);
            }
        }

        let modals = layout
            .modals
            .iter()
            .map(|(name, modal)| {
                let resolved = self.resolver.resolve_stack(&modal.stack);
                self.container_route(
                    name,
                    ContainerKind::Modals,
                    modal.options.clone(),
                    Navigator::Stack(self.stack_navigator(&resolved, false)),
                )
            })
            .collect();
        push_group(&mut groups, Presentation::Modal, modals);

        let tree = RootNavigator {
            initial_route: self.initial_route(root, fallback),
            groups,
        };
        debug!("Root tree built in {:?}", started.elapsed());
        tree
    }

    /// Root route focused at mount.
    ///
    /// An unknown root is reported and replaced by the first declared
    /// container.
    fn initial_route(&self, root: Option<&RootRoute>, fallback: bool) -> Option<String> {
        let layout = self.layout();
        if let Some(root) = root.or(layout.root.as_ref()) {
            if layout.contains(root.kind.into(), &root.name) {
                return Some(root.name.clone());
            }
            self.diagnostics.warn(format!("wrong app root \"{root}\""));
        }
        if fallback {
            return Some(FALLBACK_STACK.to_owned());
        }
        layout
            .stacks
            .names()
            .chain(layout.tabs.names())
            .chain(layout.drawers.names())
            .next()
            .map(str::to_owned)
    }

    fn fallback_stack(&self) -> ContainerRoute {
        let names: Vec<String> = self.layout().screens.names().map(str::to_owned).collect();
        let resolved = self.resolver.resolve_stack(&names.into());
        self.container_route(
            FALLBACK_STACK,
            ContainerKind::Stacks,
            None,
            Navigator::Stack(self.stack_navigator(&resolved, true)),
        )
    }

    fn container_route(
        &self,
        name: &str,
        kind: ContainerKind,
        entity: Option<OptionSource>,
        navigator: Navigator,
    ) -> ContainerRoute {
        let options = OptionsChain::new()
            .with(
                Precedence::Framework,
                framework_defaults(kind, OptionsRole::Container).map(OptionSource::from),
            )
            .with(
                Precedence::LayoutDefault,
                self.layout()
                    .default_options
                    .get(kind, OptionsRole::Container)
                    .cloned(),
            )
            .with(Precedence::Entity, entity);
        ContainerRoute {
            name: name.to_owned(),
            kind,
            options,
            navigator,
        }
    }

    fn stack_navigator(&self, stack: &ResolvedStack, implicit: bool) -> StackNavigator {
        self.layout().run_hooks();

        let layout = self.layout();
        // Only the implicit stack hides screen chrome by default.
        let floor = implicit.then(|| OptionSource::from(Options::new().with(HEADER_SHOWN, false)));
        let author = layout
            .default_options
            .get(ContainerKind::Stacks, OptionsRole::Screen)
            .cloned();

        let screens = stack
            .screens
            .iter()
            .map(|screen| ScreenRoute {
                name: screen.name.clone(),
                component: screen.component.clone(),
                options: OptionsChain::new()
                    .with(Precedence::Framework, floor.clone())
                    .with(Precedence::LayoutDefault, author.clone())
                    .with(Precedence::Entity, screen.options.clone())
                    .with(Precedence::Local, screen.component.options().cloned()),
            })
            .collect();

        StackNavigator {
            screens,
            navigator_props: stack.navigator_props.clone(),
        }
    }

    fn content_navigator(&self, container: &ResolvedContainer) -> ContentNavigator {
        self.layout().run_hooks();

        let kind = container.kind;
        let store = self.patches.table(kind);
        let patches = LocalPatches::mount(kind, &store, self.tunnel);
        let floor = framework_defaults(kind, OptionsRole::Screen).map(OptionSource::from);
        let author = self
            .layout()
            .default_options
            .get(kind, OptionsRole::Screen)
            .cloned();

        let routes = container
            .entries
            .iter()
            .map(|entry| {
                let navigator = match &entry.target {
                    ResolvedTarget::Stack(stack) => {
                        Navigator::Stack(self.stack_navigator(stack, false))
                    }
                    ResolvedTarget::Container(nested) => match nested.kind {
                        ContainerKind::Drawers => {
                            Navigator::Drawer(self.content_navigator(nested))
                        }
                        _ => Navigator::Tabs(self.content_navigator(nested)),
                    },
                };
                ContentRoute {
                    name: entry.name.clone(),
                    options: OptionsChain::new()
                        .with(Precedence::Framework, floor.clone())
                        .with(Precedence::LayoutDefault, author.clone())
                        .with(Precedence::LayoutDefault, container.screen_options.clone())
                        .with(Precedence::Entity, entry.options.clone())
                        .with(Precedence::Patch, patches.source_for(&entry.name)),
                    navigator,
                }
            })
            .collect();

        ContentNavigator {
            name: container.name.clone(),
            routes,
            navigator_props: container.navigator_props.clone(),
            patches,
        }
    }
}

fn push_group(
    groups: &mut Vec<RouteGroup>,
    presentation: Presentation,
    routes: Vec<ContainerRoute>,
) {
    if !routes.is_empty() {
        groups.push(RouteGroup {
            presentation,
            routes,
        });
    }
}
