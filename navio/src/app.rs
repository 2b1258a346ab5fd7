//! The [`Navio`] façade: owns the layout and wires resolver, tunnel, patch
//! tables and dispatcher together.
//!
//! ## Usage
//!
//! ```
//! use navio::{ContainerData, Layout, Navio, ScreenComponent};
//!
//! let navio = Navio::build(
//!     Layout::builder()
//!         .screen("Home", ScreenComponent::new(|_| {}))
//!         .stack("HomeStack", ["Home"])
//!         .tabs("AppTabs", ContainerData::new().item("Home", "HomeStack"))
//!         .build(),
//! );
//!
//! // Safe before mount: dropped until the host signals ready.
//! navio.tabs().jump_to("Home");
//!
//! let tree = navio.render(None);
//! assert_eq!(tree.initial_route.as_deref(), Some("HomeStack"));
//! ```

use std::sync::Arc;

use crate::{
    diagnostics::{Diagnostics, LogSink},
    dispatcher::Dispatcher,
    layout::{ContainerKind, Layout, RootKind, RootRoute},
    navigation::{NavigationController, NavigationRef, Params},
    options::Options,
    patches::PatchRegistry,
    render::Renderer,
    resolver::Resolver,
    shared::Callback,
    tree::RootNavigator,
    tunnel::{NavioTunnel, OptionsPatch, TunnelEvent},
};

/// Layout builder and imperative navigation API.
#[derive(Debug)]
pub struct Navio {
    layout: Arc<Layout>,
    resolver: Resolver,
    navigation: Arc<NavigationRef>,
    dispatcher: Dispatcher,
    tunnel: NavioTunnel,
    patches: PatchRegistry,
    diagnostics: Diagnostics,
}

impl Navio {
    /// Build from `layout`, logging through `tracing`.
    pub fn build(layout: Layout) -> Self {
        Self::with_diagnostics(layout, Diagnostics::default())
    }

    /// Build from `layout`, sending diagnostics to `sink`.
    pub fn with_log_sink(layout: Layout, sink: Arc<dyn LogSink>) -> Self {
        Self::with_diagnostics(layout, Diagnostics::new(sink))
    }

    fn with_diagnostics(layout: Layout, diagnostics: Diagnostics) -> Self {
        let layout = Arc::new(layout);
        let navigation = Arc::new(NavigationRef::new());
        Self {
            resolver: Resolver::with_diagnostics(Arc::clone(&layout), diagnostics.clone()),
            dispatcher: Dispatcher::new(
                Arc::clone(&navigation),
                Arc::clone(&layout),
                diagnostics.clone(),
            ),
            tunnel: NavioTunnel::with_diagnostics(diagnostics.clone()),
            patches: PatchRegistry::default(),
            layout,
            navigation,
            diagnostics,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Raw controller access, for actions outside the name-checked API.
    pub fn navigation(&self) -> &Arc<NavigationRef> {
        &self.navigation
    }

    pub fn tunnel(&self) -> &NavioTunnel {
        &self.tunnel
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The full action vocabulary, `navigate` included.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Push screen `name`.
    pub fn push(&self, name: impl AsRef<str>, params: Option<Params>) {
        self.dispatcher.push(name.as_ref(), params);
    }

    pub fn go_back(&self) {
        self.dispatcher.go_back();
    }

    /// Merge `params` into route `source`, or into the focused route.
    pub fn set_params(&self, source: Option<&str>, params: Params) {
        self.dispatcher.set_params(source, params);
    }

    /// Replace the navigation state with the root container `name` of `kind`.
    pub fn set_root(&self, kind: RootKind, name: impl AsRef<str>) {
        self.dispatcher.set_root(kind, name.as_ref());
    }

    pub fn stacks(&self) -> Stacks<'_> {
        Stacks { navio: self }
    }

    pub fn tabs(&self) -> Tabs<'_> {
        Tabs { navio: self }
    }

    pub fn drawers(&self) -> Drawers<'_> {
        Drawers { navio: self }
    }

    pub fn modals(&self) -> Modals<'_> {
        Modals { navio: self }
    }

    /// Build the root navigator tree.
    ///
    /// `root` overrides the layout's root pointer for this render.
    pub fn render(&self, root: Option<&RootRoute>) -> RootNavigator {
        Renderer {
            resolver: &self.resolver,
            patches: &self.patches,
            tunnel: &self.tunnel,
            diagnostics: &self.diagnostics,
        }
        .root(root)
    }

    /// Render the app and pair it with the handle the host mounts it with.
    pub fn app(&self, props: RootProps) -> App {
        App {
            tree: self.render(props.root.as_ref()),
            container_props: props.container_props,
            handle: MountHandle {
                navigation: Arc::clone(&self.navigation),
                on_ready: props.on_ready,
            },
        }
    }

    /// Hand the rendered app to `shell`.
    pub fn mount(&self, shell: &mut dyn RootShell, props: RootProps) {
        shell.mount(self.app(props));
    }

    /// Patch the options of item `name` of every `kind` container.
    ///
    /// Not gated on readiness: the patch is stored for the session and
    /// containers mounted later pick it up.
    fn update_options(&self, kind: ContainerKind, name: &str, options: Options) {
        if !self.layout.contains_content(kind, name) {
            self.diagnostics
                .warn(format!("unknown {kind} item \"{name}\", options not updated"));
            return;
        }
        self.patches.table(kind).apply(name, &options);
        self.tunnel.publish(
            &TunnelEvent::UpdateOptions(kind),
            &OptionsPatch {
                name: name.to_owned(),
                options,
            },
        );
    }
}

/// Stack actions.
#[derive(Clone, Copy, Debug)]
pub struct Stacks<'a> {
    navio: &'a Navio,
}

impl Stacks<'_> {
    /// Navigate to stack `name`.
    pub fn push(&self, name: impl AsRef<str>) {
        self.navio.dispatcher.push_stack(name.as_ref());
    }

    /// Pop `count` screens (one when `None`).
    pub fn pop(&self, count: Option<u32>) {
        self.navio.dispatcher.pop(count);
    }

    pub fn pop_to_top(&self) {
        self.navio.dispatcher.pop_to_top();
    }

    pub fn set_root(&self, name: impl AsRef<str>) {
        self.navio.set_root(RootKind::Stacks, name);
    }
}

/// Tabs actions.
#[derive(Clone, Copy, Debug)]
pub struct Tabs<'a> {
    navio: &'a Navio,
}

impl Tabs<'_> {
    /// Switch to tab `name`.
    pub fn jump_to(&self, name: impl AsRef<str>) {
        self.navio.dispatcher.jump_to_tab(name.as_ref());
    }

    /// Merge `options` into tab `name` (badges, titles, ...).
    pub fn update_options(&self, name: impl AsRef<str>, options: Options) {
        self.navio
            .update_options(ContainerKind::Tabs, name.as_ref(), options);
    }

    pub fn set_root(&self, name: impl AsRef<str>) {
        self.navio.set_root(RootKind::Tabs, name);
    }
}

/// Drawer actions.
#[derive(Clone, Copy, Debug)]
pub struct Drawers<'a> {
    navio: &'a Navio,
}

impl Drawers<'_> {
    pub fn open(&self) {
        self.navio.dispatcher.open_drawer();
    }

    pub fn close(&self) {
        self.navio.dispatcher.close_drawer();
    }

    pub fn toggle(&self) {
        self.navio.dispatcher.toggle_drawer();
    }

    /// Switch to drawer item `name`.
    pub fn jump_to(&self, name: impl AsRef<str>) {
        self.navio.dispatcher.jump_to_drawer(name.as_ref());
    }

    /// Merge `options` into drawer item `name`.
    pub fn update_options(&self, name: impl AsRef<str>, options: Options) {
        self.navio
            .update_options(ContainerKind::Drawers, name.as_ref(), options);
    }

    pub fn set_root(&self, name: impl AsRef<str>) {
        self.navio.set_root(RootKind::Drawers, name);
    }
}

/// Modal actions.
#[derive(Clone, Copy, Debug)]
pub struct Modals<'a> {
    navio: &'a Navio,
}

impl Modals<'_> {
    /// Present modal `name`.
    pub fn show(&self, name: impl AsRef<str>) {
        self.navio.dispatcher.show_modal(name.as_ref());
    }
}

/// Props of the app entry point.
#[derive(Clone, Debug, Default)]
pub struct RootProps {
    /// Overrides the layout's root pointer.
    pub root: Option<RootRoute>,
    /// Runs once, right after the ready transition.
    pub on_ready: Option<Callback>,
    /// Opaque props for the host's root container.
    pub container_props: Options,
}

/// A rendered app, ready to be mounted by a [`RootShell`].
#[derive(Debug)]
pub struct App {
    pub tree: RootNavigator,
    pub container_props: Options,
    pub handle: MountHandle,
}

/// The host's side of the mount: attach the controller, then signal ready.
#[derive(Debug)]
pub struct MountHandle {
    navigation: Arc<NavigationRef>,
    on_ready: Option<Callback>,
}

impl MountHandle {
    /// Attach the host controller.
    pub fn attach(&self, controller: Arc<dyn NavigationController>) {
        self.navigation.attach(controller);
    }

    /// Signal that the host finished its initial mount.
    ///
    /// Returns `true` for the call that made navio ready; only that call runs
    /// `on_ready`.
    pub fn ready(&self) -> bool {
        if !self.navigation.mark_ready() {
            return false;
        }
        if let Some(on_ready) = &self.on_ready {
            on_ready.call();
        }
        true
    }
}

/// Host root container that mounts a rendered [`App`].
pub trait RootShell {
    fn mount(&mut self, app: App);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::{
        diagnostics::{LogLevel, MemorySink},
        layout::{ContainerData, ScreenComponent},
        navigation::{MountState, NavigationAction},
    };

    #[derive(Default)]
    struct Recorder {
        actions: Mutex<Vec<NavigationAction>>,
    }

    impl NavigationController for Recorder {
        fn dispatch(&self, action: NavigationAction) {
            self.actions.lock().push(action);
        }

        fn go_back(&self) {}
    }

    #[derive(Default)]
    struct Shell {
        app: Option<App>,
    }

    impl RootShell for Shell {
        fn mount(&mut self, app: App) {
            self.app = Some(app);
        }
    }

    fn layout() -> Layout {
        Layout::builder()
            .screen("Main", ScreenComponent::new(|_| {}))
            .stack("MainStack", ["Main"])
            .tabs("AppTabs", ContainerData::new().item("One", "MainStack"))
            .drawer("AppDrawer", ContainerData::new().item("Inbox", ["Main"]))
            .build()
    }

    #[test]
    fn on_ready_runs_once_after_the_ready_transition() {
        let navio = Navio::build(layout());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut shell = Shell::default();

        navio.mount(
            &mut shell,
            RootProps {
                on_ready: Some(Callback::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
                ..RootProps::default()
            },
        );
        let app = shell.app.take().unwrap();
        assert_eq!(navio.navigation().state(), MountState::Unmounted);

        assert!(!app.handle.ready());
        app.handle.attach(Arc::new(Recorder::default()));
        assert!(app.handle.ready());
        assert!(!app.handle.ready());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(navio.navigation().state(), MountState::Ready);
    }

    #[test]
    fn sub_apis_route_through_the_dispatcher() {
        let navio = Navio::build(layout());
        let recorder = Arc::new(Recorder::default());
        let app = navio.app(RootProps::default());
        app.handle.attach(recorder.clone());
        app.handle.ready();

        navio.stacks().push("MainStack");
        navio.tabs().set_root("AppTabs");
        navio.drawers().open();

        assert_eq!(
            *recorder.actions.lock(),
            vec![
                NavigationAction::Navigate {
                    name: "MainStack".into(),
                    params: None
                },
                NavigationAction::Reset {
                    routes: vec![crate::navigation::Route::new("AppTabs")]
                },
                NavigationAction::OpenDrawer,
            ]
        );
    }

    #[test]
    fn update_options_reaches_mounted_containers() {
        let sink = Arc::new(MemorySink::new());
        let navio = Navio::with_log_sink(layout(), sink.clone());
        let tree = navio.render(None);
        let tab = tree
            .route("AppTabs")
            .and_then(|route| route.navigator.as_content())
            .and_then(|tabs| tabs.route("One"))
            .unwrap();
        assert!(tab.effective_options().get("badge").is_none());

        navio
            .tabs()
            .update_options("One", Options::new().with("badge", 5));
        assert_eq!(tab.effective_options().get("badge"), Some(&json!(5)));

        navio
            .drawers()
            .update_options("One", Options::new().with("badge", 1));
        assert!(sink.contains(LogLevel::Warn, "unknown drawers item \"One\""));
    }
}
