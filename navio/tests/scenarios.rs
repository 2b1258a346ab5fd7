//! End-to-end layout scenarios: fallback stack, tab resolution, patches
//! across the mount boundary, readiness gating and broken references.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use navio::{
    Callback, ContainerData, ContainerKind, ContentEntry, DefaultOptions, FALLBACK_STACK, Layout,
    LogLevel, MemorySink, ModalData, NavigationAction, NavigationController, Navio, Navigator,
    Options, OptionsRole, Presentation, RootProps, RootRoute, Route, Screen, ScreenComponent,
    StackData,
};
use parking_lot::Mutex;
use serde_json::json;

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

fn component() -> ScreenComponent {
    ScreenComponent::new(|_| {})
}

fn navio_with_sink(layout: Layout) -> (Navio, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (Navio::with_log_sink(layout, sink.clone()), sink)
}

#[test]
fn screens_only_layout_renders_one_implicit_stack() {
    let (navio, _) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .screen("Details", component())
            .build(),
    );

    let tree = navio.render(None);
    let routes: Vec<_> = tree.routes().collect();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].name, FALLBACK_STACK);
    assert_eq!(tree.initial_route.as_deref(), Some("Stack"));

    let stack = routes[0].navigator.as_stack().unwrap();
    assert_eq!(stack.names().collect::<Vec<_>>(), vec!["Main", "Details"]);
    for screen in &stack.screens {
        assert_eq!(
            screen.effective_options().get("headerShown"),
            Some(&json!(false))
        );
    }
    assert_eq!(
        routes[0].effective_options().get("headerShown"),
        Some(&json!(false))
    );
}

#[test]
fn tab_items_resolve_by_name_or_inline_list() {
    let (navio, _) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .screen("Settings", component())
            // Named like a screen on purpose: the inline list must not look it up.
            .stack("Main", ["Settings"])
            .stack("MainStack", ["Main", "Settings"])
            .tabs(
                "AppTabs",
                ContainerData::new().item("One", "MainStack").item("Two", ["Main"]),
            )
            .build(),
    );

    let tabs = navio.resolver().resolve_tabs("AppTabs");
    let names = |item: &str| match &tabs.entry(item).unwrap().target {
        navio::resolver::ResolvedTarget::Stack(stack) => {
            stack.names().map(str::to_owned).collect::<Vec<_>>()
        }
        other => panic!("expected a stack, got {other:?}"),
    };
    assert_eq!(names("One"), vec!["Main", "Settings"]);
    assert_eq!(names("Two"), vec!["Main"]);

    // Same inputs, same result.
    assert_eq!(*tabs, *navio.resolver().resolve_tabs("AppTabs"));
}

#[test]
fn patch_issued_before_mount_applies_after_mount() {
    let (navio, _) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .stack("MainStack", ["Main"])
            .tabs(
                "AppTabs",
                ContainerData::new().item("One", "MainStack").item("Two", ["Main"]),
            )
            .build(),
    );

    navio
        .tabs()
        .update_options("One", Options::new().with("badge", 3));

    let app = navio.app(RootProps::default());
    let tabs = app
        .tree
        .route("AppTabs")
        .and_then(|route| route.navigator.as_content())
        .unwrap();
    let one = tabs.route("One").unwrap().effective_options();
    assert_eq!(one.get("badge"), Some(&json!(3)));
    assert_eq!(one.get("headerShown"), Some(&json!(false)));
    assert!(tabs.route("Two").unwrap().effective_options().get("badge").is_none());

    // Later patches merge over earlier ones and reach the mounted container.
    navio
        .tabs()
        .update_options("One", Options::new().with("title", "First"));
    let one = tabs.route("One").unwrap().effective_options();
    assert_eq!(one.get("badge"), Some(&json!(3)));
    assert_eq!(one.get("title"), Some(&json!("First")));
    assert_eq!(tabs.patches.revision(), 1);
}

#[test]
fn actions_before_ready_never_reach_the_controller() {
    let (navio, sink) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .screen("Details", component())
            .stack("MainStack", ["Main", "Details"])
            .build(),
    );
    let recorder = Arc::new(Recorder::default());
    let ready_hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ready_hits);

    navio.push("Details", None);
    let app = navio.app(RootProps {
        on_ready: Some(Callback::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..RootProps::default()
    });
    app.handle.attach(recorder.clone());
    navio.push("Details", None);
    navio.stacks().pop(None);
    assert!(recorder.actions.lock().is_empty());

    assert!(app.handle.ready());
    navio.push("Details", None);
    navio.stacks().set_root("MainStack");

    assert_eq!(
        *recorder.actions.lock(),
        vec![
            NavigationAction::Push {
                name: "Details".into(),
                params: None
            },
            NavigationAction::Reset {
                routes: vec![Route::new("MainStack")]
            },
        ]
    );
    assert_eq!(ready_hits.load(Ordering::SeqCst), 1);
    assert!(sink.records().iter().all(|(level, _)| *level != LogLevel::Error));
}

#[test]
fn broken_references_leave_the_rest_of_the_layout_intact() {
    let (navio, sink) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .stack("MainStack", ["Main"])
            .stack("Dangling", "NoSuchStack")
            .tabs(
                "AppTabs",
                ContainerData::new()
                    .item("One", "MainStack")
                    .item("Lost", ContentEntry::drawer("NoSuchDrawer"))
                    .item("Empty", ContentEntry::default()),
            )
            .modal("Sheet", "NoSuchStack")
            .root(RootRoute::tabs("NoSuchTabs"))
            .build(),
    );

    let tree = navio.render(None);
    assert_eq!(
        tree.routes().map(|route| route.name.as_str()).collect::<Vec<_>>(),
        vec!["MainStack", "Dangling", "AppTabs", "Sheet"]
    );
    assert_eq!(tree.initial_route.as_deref(), Some("MainStack"));

    let dangling = tree.route("Dangling").unwrap().navigator.as_stack().unwrap();
    assert!(dangling.screens.is_empty());

    let tabs = tree
        .route("AppTabs")
        .and_then(|route| route.navigator.as_content())
        .unwrap();
    assert_eq!(tabs.names().collect::<Vec<_>>(), vec!["One", "Lost"]);
    let lost = tabs.route("Lost").unwrap();
    assert!(matches!(&lost.navigator, Navigator::Drawer(drawer) if drawer.routes.is_empty()));

    assert!(sink.contains(LogLevel::Warn, "stack \"NoSuchStack\" is not registered"));
    assert!(sink.contains(LogLevel::Warn, "drawers \"NoSuchDrawer\" is not registered"));
    assert!(sink.contains(LogLevel::Warn, "\"Empty\" in tabs \"AppTabs\""));
    assert!(sink.contains(LogLevel::Warn, "wrong app root \"tabs.NoSuchTabs\""));
}

#[test]
fn option_sources_merge_in_precedence_order() {
    let defaults = DefaultOptions::new()
        .with(
            ContainerKind::Stacks,
            OptionsRole::Screen,
            Options::new()
                .with("author", "stacks.screen")
                .with("title", "default"),
        )
        .with(
            ContainerKind::Tabs,
            OptionsRole::Container,
            Options::new().with("headerShown", true),
        )
        .with(
            ContainerKind::Tabs,
            OptionsRole::Screen,
            Options::new().with("tint", "author"),
        );
    let (navio, _) = navio_with_sink(
        Layout::builder()
            .screen(
                "Main",
                Screen::with_options(
                    component().with_options(navio::OptionSource::computed(|ctx| {
                        Options::new()
                            .with("title", format!("{} (local)", ctx.route_name().unwrap_or("?")))
                    })),
                    Options::new()
                        .with("title", "entity")
                        .with("entity", true),
                ),
            )
            .stack(
                "MainStack",
                StackData::new(["Main"]).options(Options::new().with("gestureEnabled", false)),
            )
            .tabs(
                "AppTabs",
                ContainerData::new()
                    .item(
                        "One",
                        ContentEntry::stack("MainStack").options(Options::new().with("tint", "item")),
                    )
                    .item("Two", ["Main"])
                    .screen_options(
                        Options::new()
                            .with("tint", "screenOptions")
                            .with("shape", "round"),
                    ),
            )
            .default_options(defaults)
            .build(),
    );
    let tree = navio.render(None);

    let main_stack = tree.route("MainStack").unwrap();
    let container = main_stack.effective_options();
    assert_eq!(container.get("headerShown"), Some(&json!(false)));
    assert_eq!(container.get("gestureEnabled"), Some(&json!(false)));

    let main = main_stack
        .navigator
        .as_stack()
        .and_then(|stack| stack.screen("Main"))
        .unwrap()
        .effective_options();
    assert_eq!(main.get("author"), Some(&json!("stacks.screen")));
    assert_eq!(main.get("entity"), Some(&json!(true)));
    assert_eq!(main.get("title"), Some(&json!("Main (local)")));
    assert!(main.get("headerShown").is_none());

    let app_tabs = tree.route("AppTabs").unwrap();
    assert_eq!(
        app_tabs.effective_options().get("headerShown"),
        Some(&json!(true))
    );
    let content = app_tabs.navigator.as_content().unwrap();
    let one = content.route("One").unwrap().effective_options();
    assert_eq!(one.get("tint"), Some(&json!("item")));
    assert_eq!(one.get("shape"), Some(&json!("round")));
    let two = content.route("Two").unwrap().effective_options();
    assert_eq!(two.get("tint"), Some(&json!("screenOptions")));

    navio
        .tabs()
        .update_options("One", Options::new().with("tint", "patched"));
    assert_eq!(
        content.route("One").unwrap().effective_options().get("tint"),
        Some(&json!("patched"))
    );
}

#[test]
fn modals_render_in_their_own_group() {
    let hooks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hooks);
    let (navio, _) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .screen("Compose", component())
            .stack("MainStack", ["Main"])
            .modal(
                "ComposeModal",
                ModalData::new(["Compose"]).options(Options::new().with("title", "New")),
            )
            .hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let tree = navio.render(Some(&RootRoute::stack("MainStack")));
    assert_eq!(tree.groups.len(), 2);
    assert_eq!(tree.groups[0].presentation, Presentation::Default);
    assert_eq!(tree.groups[1].presentation, Presentation::Modal);

    let modal = &tree.groups[1].routes[0];
    assert_eq!(modal.kind, ContainerKind::Modals);
    let options = modal.effective_options();
    assert_eq!(options.get("title"), Some(&json!("New")));
    assert_eq!(options.get("headerShown"), Some(&json!(false)));

    // One stack container and one modal stack were built.
    assert_eq!(hooks.load(Ordering::SeqCst), 2);
}

#[test]
fn drawer_patches_reach_root_and_nested_drawers() {
    let (navio, sink) = navio_with_sink(
        Layout::builder()
            .screen("Main", component())
            .screen("Inbox", component())
            .screen("Archive", component())
            .stack("MainStack", ["Main"])
            .drawer(
                "AppDrawer",
                ContainerData::new()
                    .item("Inbox", ["Inbox"])
                    .item("Archive", ["Archive"]),
            )
            .tabs(
                "AppTabs",
                ContainerData::new()
                    .item("Home", "MainStack")
                    .item("Mail", ContentEntry::drawer("AppDrawer")),
            )
            .build(),
    );
    let tree = navio.render(None);

    let root_drawer = tree
        .route("AppDrawer")
        .and_then(|route| route.navigator.as_content())
        .unwrap();
    let tabs = tree
        .route("AppTabs")
        .and_then(|route| route.navigator.as_content())
        .unwrap();
    let nested_drawer = tabs
        .route("Mail")
        .and_then(|route| route.navigator.as_content())
        .unwrap();
    assert_eq!(nested_drawer.names().collect::<Vec<_>>(), vec!["Inbox", "Archive"]);

    navio
        .drawers()
        .update_options("Inbox", Options::new().with("drawerLabel", "Unread (4)"));

    for drawer in [root_drawer, nested_drawer] {
        let inbox = drawer.route("Inbox").unwrap().effective_options();
        assert_eq!(inbox.get("drawerLabel"), Some(&json!("Unread (4)")));
        assert_eq!(inbox.get("headerShown"), Some(&json!(false)));
        assert!(
            drawer
                .route("Archive")
                .unwrap()
                .effective_options()
                .get("drawerLabel")
                .is_none()
        );
        assert_eq!(drawer.patches.revision(), 1);
    }
    // Tab items are a different kind and never see drawer patches.
    assert!(tabs.route("Mail").unwrap().effective_options().get("drawerLabel").is_none());
    assert!(sink.records().iter().all(|(level, _)| *level < LogLevel::Warn));
}
