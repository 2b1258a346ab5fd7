//! Console host for a navio layout.
//!
//! Loads `layout.toml`, mounts it on a host that prints the navigator tree,
//! then drives it through the imperative API. Set `RUST_LOG=navio=debug` to
//! see the render timings.

use std::sync::Arc;

use navio::{
    App, Callback, ContainerKind, Layout, LayoutSpec, NavigationAction, NavigationController,
    Navigator, Navio, Options, RootNavigator, RootProps, RootShell, ScreenComponent,
};
use parking_lot::Mutex;
use tracing::info;

navio::route_names! {
    enum Screen {
        Main,
        Playground,
        Settings,
        SignIn,
    }
}

navio::route_names! {
    enum Stack {
        Main = "MainStack",
        Settings = "SettingsStack",
    }
}

navio::route_names! {
    enum Tab {
        Main = "MainTab",
        Settings = "SettingsTab",
    }
}

/// Stand-in for a real navigation runtime: logs and records every action.
#[derive(Default)]
struct ConsoleController {
    history: Mutex<Vec<NavigationAction>>,
}

impl NavigationController for ConsoleController {
    fn dispatch(&self, action: NavigationAction) {
        info!(?action, "dispatch");
        self.history.lock().push(action);
    }

    fn go_back(&self) {
        info!("go back");
        self.history.lock().push(NavigationAction::Pop { count: 1 });
    }
}

struct ConsoleShell {
    controller: Arc<ConsoleController>,
    mounted: Option<RootNavigator>,
}

impl RootShell for ConsoleShell {
    fn mount(&mut self, app: App) {
        print_tree(&app.tree);
        app.handle.attach(self.controller.clone());
        app.handle.ready();
        self.mounted = Some(app.tree);
    }
}

fn print_tree(tree: &RootNavigator) {
    println!(
        "initial route: {}",
        tree.initial_route.as_deref().unwrap_or("-")
    );
    for group in &tree.groups {
        println!("{:?} group", group.presentation);
        for route in &group.routes {
            let options = json(&route.effective_options());
            println!("  {} {} {options}", route.kind, route.name);
            print_navigator(&route.navigator, 2);
        }
    }
}

fn print_navigator(navigator: &Navigator, depth: usize) {
    let indent = "  ".repeat(depth);
    match navigator {
        Navigator::Stack(stack) => {
            for screen in &stack.screens {
                println!("{indent}{} {}", screen.name, json(&screen.effective_options()));
            }
        }
        Navigator::Tabs(content) | Navigator::Drawer(content) => {
            for route in &content.routes {
                println!("{indent}{} {}", route.name, json(&route.effective_options()));
                print_navigator(&route.navigator, depth + 1);
            }
        }
    }
}

fn json(options: &Options) -> serde_json::Value {
    serde_json::Value::Object(options.as_map().clone())
}

/// Warn when the name enums drifted from the layout file.
fn check_names(layout: &Layout) {
    let stacks = layout.missing_names(ContainerKind::Stacks, Stack::ALL);
    let screens: Vec<_> = Screen::ALL
        .iter()
        .filter(|screen| !layout.screens().contains(screen.as_str()))
        .collect();
    let tabs: Vec<_> = Tab::ALL
        .iter()
        .filter(|tab| !layout.contains_content(ContainerKind::Tabs, tab.as_str()))
        .collect();
    if !stacks.is_empty() || !screens.is_empty() || !tabs.is_empty() {
        tracing::warn!(?stacks, ?screens, ?tabs, "names missing from the layout");
    }
}

fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match tracing_subscriber::EnvFilter::try_new("warn,navio=info,example=info") {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new("warn"),
        },
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let spec = LayoutSpec::from_toml_str(include_str!("layout.toml"))?;
    let layout = spec.into_layout(|name| {
        let name = name.to_owned();
        Some(ScreenComponent::new(move |props| {
            info!(screen = %name, route = %props.route.name, "render");
        }))
    })?;
    check_names(&layout);
    info!(screens = layout.screens().len(), "layout loaded");

    let navio = Navio::build(layout);

    // Dropped: nothing is mounted yet.
    navio.push(Screen::Playground, None);
    navio
        .tabs()
        .update_options(Tab::Settings, Options::new().with("tabBarBadge", 3));

    let mut shell = ConsoleShell {
        controller: Arc::new(ConsoleController::default()),
        mounted: None,
    };
    navio.mount(
        &mut shell,
        RootProps {
            on_ready: Some(Callback::new(|| info!("navigation ready"))),
            ..RootProps::default()
        },
    );

    navio.push(Screen::Playground, None);
    navio.stacks().pop(None);
    navio.tabs().jump_to(Tab::Settings);
    navio.modals().show("SignInModal");
    navio.go_back();
    navio.stacks().set_root(Stack::Main);
    navio
        .tabs()
        .update_options(Tab::Main, Options::new().with("tabBarBadge", 1));
    // Unknown names are reported and skipped.
    navio.tabs().jump_to("Profile");

    if let Some(tree) = &shell.mounted {
        println!();
        print_tree(tree);
    }
    println!(
        "\n{} actions reached the controller",
        shell.controller.history.lock().len()
    );
    Ok(())
}
