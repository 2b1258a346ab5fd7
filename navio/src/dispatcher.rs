//! Name-checked navigation actions, gated on controller readiness.
//!
//! Every action first checks readiness: before the host signals ready the
//! call is dropped without a trace. Once ready, names are validated against
//! the layout; an unknown name is logged and the action skipped.

use std::sync::Arc;

use crate::{
    diagnostics::Diagnostics,
    layout::{ContainerKind, Layout, RootKind},
    navigation::{NavigationAction, NavigationController, NavigationRef, Params, Route},
};

/// Default number of routes removed by [`Dispatcher::pop`].
pub const DEFAULT_POP_COUNT: u32 = 1;

/// Thin, validated wrapper over the host action vocabulary.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    navigation: Arc<NavigationRef>,
    layout: Arc<Layout>,
    diagnostics: Diagnostics,
}

impl Dispatcher {
    pub(crate) fn new(
        navigation: Arc<NavigationRef>,
        layout: Arc<Layout>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            navigation,
            layout,
            diagnostics,
        }
    }

    /// Push screen `name` onto the focused stack.
    pub fn push(&self, name: &str, params: Option<Params>) {
        self.checked(self.layout.screens.contains(name), "screen", name, |nav| {
            nav.dispatch(NavigationAction::Push {
                name: name.to_owned(),
                params,
            });
        });
    }

    /// Navigate to any named route (screen, stack, tabs, drawer or modal).
    pub fn navigate(&self, name: &str, params: Option<Params>) {
        let known = self.layout.screens.contains(name)
            || [
                ContainerKind::Stacks,
                ContainerKind::Tabs,
                ContainerKind::Drawers,
                ContainerKind::Modals,
            ]
            .into_iter()
            .any(|kind| self.layout.contains(kind, name));
        self.checked(known, "route", name, |nav| {
            nav.dispatch(NavigationAction::Navigate {
                name: name.to_owned(),
                params,
            });
        });
    }

    pub fn go_back(&self) {
        self.navigation.when_ready(|nav| nav.go_back());
    }

    /// Pop `count` routes (one when `None`).
    pub fn pop(&self, count: Option<u32>) {
        self.navigation.when_ready(|nav| {
            nav.dispatch(NavigationAction::Pop {
                count: count.unwrap_or(DEFAULT_POP_COUNT),
            });
        });
    }

    pub fn pop_to_top(&self) {
        self.navigation
            .when_ready(|nav| nav.dispatch(NavigationAction::PopToTop));
    }

    /// Merge `params` into route `source` (the focused route when `None`).
    pub fn set_params(&self, source: Option<&str>, params: Params) {
        self.navigation.when_ready(|nav| {
            nav.dispatch(NavigationAction::SetParams {
                params,
                source: source.map(str::to_owned),
            });
        });
    }

    /// Reset the whole navigation state to the single root route `name`.
    ///
    /// Back-stack history is discarded. Runtime option patches are kept.
    pub fn set_root(&self, kind: RootKind, name: &str) {
        let kind = ContainerKind::from(kind);
        self.checked(self.layout.contains(kind, name), label(kind), name, |nav| {
            nav.dispatch(NavigationAction::Reset {
                routes: vec![Route::new(name)],
            });
        });
    }

    /// Show stack `name` by navigating to its root route.
    pub fn push_stack(&self, name: &str) {
        self.navigate_to(ContainerKind::Stacks, name);
    }

    /// Present modal `name`.
    pub fn show_modal(&self, name: &str) {
        self.navigate_to(ContainerKind::Modals, name);
    }

    /// Switch the focused tabs container to item `name`.
    pub fn jump_to_tab(&self, name: &str) {
        let known = self.layout.contains_content(ContainerKind::Tabs, name);
        self.checked(known, "tab", name, |nav| {
            nav.dispatch(NavigationAction::JumpTo {
                name: name.to_owned(),
            });
        });
    }

    /// Switch the focused drawer to item `name`.
    pub fn jump_to_drawer(&self, name: &str) {
        let known = self.layout.contains_content(ContainerKind::Drawers, name);
        self.checked(known, "drawer item", name, |nav| {
            nav.dispatch(NavigationAction::DrawerJumpTo {
                name: name.to_owned(),
            });
        });
    }

    pub fn open_drawer(&self) {
        self.navigation
            .when_ready(|nav| nav.dispatch(NavigationAction::OpenDrawer));
    }

    pub fn close_drawer(&self) {
        self.navigation
            .when_ready(|nav| nav.dispatch(NavigationAction::CloseDrawer));
    }

    pub fn toggle_drawer(&self) {
        self.navigation
            .when_ready(|nav| nav.dispatch(NavigationAction::ToggleDrawer));
    }

    fn navigate_to(&self, kind: ContainerKind, name: &str) {
        self.checked(self.layout.contains(kind, name), label(kind), name, |nav| {
            nav.dispatch(NavigationAction::Navigate {
                name: name.to_owned(),
                params: None,
            });
        });
    }

    fn checked(
        &self,
        known: bool,
        what: &str,
        name: &str,
        action: impl FnOnce(&dyn NavigationController),
    ) {
        self.navigation.when_ready(|nav| {
            if known {
                action(nav);
            } else {
                self.diagnostics
                    .warn(format!("unknown {what} \"{name}\", action skipped"));
            }
        });
    }
}

fn label(kind: ContainerKind) -> &'static str {
    match kind {
        ContainerKind::Stacks => "stack",
        ContainerKind::Tabs => "tabs",
        ContainerKind::Drawers => "drawer",
        ContainerKind::Modals => "modal",
    }
}
