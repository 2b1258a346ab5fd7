//! # Navio
//!
//! Declarative navigation layouts on top of a host navigation container.
//!
//! An app describes its screens, stacks, tabs, drawers and modals once, as a
//! [`Layout`]. [`Navio`] resolves that description into a tree of navigators
//! with fully merged options ([`Navio::render`]) and exposes a small,
//! name-checked imperative API (`push`, `pop`, `jump_to`, `set_root`, ...)
//! that drives the host controller once it is ready.
//!
//! ## Usage
//!
//! ```
//! use navio::{ContainerData, Layout, Navio, Options, ScreenComponent};
//!
//! let navio = Navio::build(
//!     Layout::builder()
//!         .screen("Main", ScreenComponent::new(|_| {}))
//!         .screen("Settings", ScreenComponent::new(|_| {}))
//!         .stack("MainStack", ["Main"])
//!         .tabs(
//!             "AppTabs",
//!             ContainerData::new()
//!                 .item("Home", "MainStack")
//!                 .item("More", ["Settings"]),
//!         )
//!         .build(),
//! );
//!
//! let tree = navio.render(None);
//! navio.tabs().update_options("More", Options::new().with("tabBarBadge", 3));
//!
//! let more = tree
//!     .route("AppTabs")
//!     .and_then(|tabs| tabs.navigator.as_content())
//!     .and_then(|tabs| tabs.route("More"))
//!     .unwrap();
//! assert_eq!(more.effective_options().get("tabBarBadge"), Some(&serde_json::json!(3)));
//! ```
//!
//! ## Modules
//!
//! - [`options`]: option values and the precedence chain.
//! - [`resolver`]: expands stack and container references.
//! - [`tunnel`]: keyed publish/subscribe for runtime option patches.
//! - [`dispatcher`]: readiness-gated, name-checked actions.
//! - [`config`]: layouts loaded from TOML or JSON.

mod app;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
mod error;
pub mod layout;
mod names;
pub mod navigation;
pub mod options;
pub mod patches;
mod render;
pub mod resolver;
pub mod shared;
pub mod tree;
pub mod tunnel;

pub use config::{LayoutSpec, ScreenSpec};
pub use diagnostics::{LogLevel, LogSink, MemorySink, NullSink, TracingSink};
pub use dispatcher::Dispatcher;
pub use error::NavioError;
pub use layout::{
    ContainerData, ContainerKind, ContentEntry, Layout, LayoutBuilder, ModalData, RootKind,
    RootRoute, Screen, ScreenComponent, ScreenProps, StackData, StackDefinition, Table,
};
pub use navigation::{
    MountState, NavigationAction, NavigationController, NavigationRef, Params, Route,
};
pub use app::{App, Drawers, Modals, MountHandle, Navio, RootProps, RootShell, Stacks, Tabs};
pub use options::{
    DefaultOptions, OptionSource, Options, OptionsChain, OptionsContext, OptionsRole, Precedence,
};
pub use render::FALLBACK_STACK;
pub use shared::{Callback, Shared};
pub use tree::{
    ContainerRoute, ContentNavigator, ContentRoute, Navigator, Presentation, RootNavigator,
    RouteGroup, ScreenRoute, StackNavigator,
};
pub use tunnel::{NavioTunnel, OptionsPatch, Subscription, Tunnel, TunnelEvent};
