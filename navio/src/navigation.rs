//! Host navigation controller boundary and the mount/ready state machine.
//!
//! # Responsibilities
//!
//! - Describe the action vocabulary the host navigation runtime understands.
//! - Hold the (optional) controller handle attached by the host at mount.
//! - Track readiness: `Unmounted -> MountedNotReady -> Ready`, never backwards.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Route parameters.
pub type Params = Map<String, Value>;

/// A route as seen by the host runtime.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    /// Host-assigned unique key, when known.
    pub key: Option<String>,
    /// Route name.
    pub name: String,
    /// Current params.
    pub params: Params,
}

impl Route {
    /// Route with no key and no params.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            params: Params::new(),
        }
    }
}

/// Actions understood by the host navigation runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum NavigationAction {
    /// Navigate to a route by name, reusing an existing one if present.
    Navigate {
        name: String,
        params: Option<Params>,
    },
    /// Push a new route on top of the focused stack.
    Push {
        name: String,
        params: Option<Params>,
    },
    /// Pop `count` routes off the focused stack.
    Pop { count: u32 },
    /// Pop to the first route of the focused stack.
    PopToTop,
    /// Replace the whole navigation state.
    Reset { routes: Vec<Route> },
    /// Merge params into a route; `source` is the route key, `None` means focused.
    SetParams {
        params: Params,
        source: Option<String>,
    },
    /// Switch to a tab of the focused tab navigator.
    JumpTo { name: String },
    /// Open the focused drawer.
    OpenDrawer,
    /// Close the focused drawer.
    CloseDrawer,
    /// Toggle the focused drawer.
    ToggleDrawer,
    /// Switch to a route of the focused drawer navigator.
    DrawerJumpTo { name: String },
}

/// Handle to the host navigation runtime.
pub trait NavigationController: Send + Sync + 'static {
    /// Whether the host currently accepts actions.
    fn is_ready(&self) -> bool {
        true
    }

    /// Dispatch an action.
    fn dispatch(&self, action: NavigationAction);

    /// Go back in history.
    fn go_back(&self);
}

/// Lifecycle of the root container.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MountState {
    /// Nothing attached yet.
    Unmounted,
    /// Controller attached, host has not signaled ready.
    MountedNotReady,
    /// Actions are forwarded to the controller.
    Ready,
}

impl MountState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => MountState::Unmounted,
            1 => MountState::MountedNotReady,
            _ => MountState::Ready,
        }
    }
}

/// Shared, read-mostly reference to the host controller.
///
/// Before the ready transition every action routed through this reference is
/// dropped.
#[derive(Default)]
pub struct NavigationRef {
    controller: RwLock<Option<Arc<dyn NavigationController>>>,
    state: AtomicU8,
}

impl fmt::Debug for NavigationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRef")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl NavigationRef {
    /// Unmounted reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or re-attach) the host controller.
    ///
    /// The first attach moves `Unmounted` to `MountedNotReady`. Re-attaching
    /// after ready swaps the controller and keeps the state.
    pub fn attach(&self, controller: Arc<dyn NavigationController>) {
        *self.controller.write() = Some(controller);
        let _ = self.state.compare_exchange(
            MountState::Unmounted as u8,
            MountState::MountedNotReady as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Ready transition.
    ///
    /// Returns `true` only for the call that actually moved the state from
    /// `MountedNotReady` to `Ready`.
    pub fn mark_ready(&self) -> bool {
        self.state
            .compare_exchange(
                MountState::MountedNotReady as u8,
                MountState::Ready as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MountState {
        MountState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether actions are forwarded right now.
    pub fn is_ready(&self) -> bool {
        self.state() == MountState::Ready
            && self
                .controller
                .read()
                .as_ref()
                .is_some_and(|controller| controller.is_ready())
    }

    /// The attached controller, ready or not.
    pub fn current(&self) -> Option<Arc<dyn NavigationController>> {
        self.controller.read().clone()
    }

    /// Run `f` with the controller when ready; otherwise do nothing.
    pub(crate) fn when_ready(&self, f: impl FnOnce(&dyn NavigationController)) -> bool {
        if self.state() != MountState::Ready {
            return false;
        }
        let Some(controller) = self.current() else {
            return false;
        };
        if !controller.is_ready() {
            return false;
        }
        f(controller.as_ref());
        true
    }
}
