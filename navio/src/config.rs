//! Declarative layouts loaded from TOML or JSON.
//!
//! ## Usage
//!
//! ```
//! use navio::{LayoutSpec, ScreenComponent};
//!
//! let spec = LayoutSpec::from_json_str(
//!     r#"{
//!         "screens": {"Home": {}, "Settings": {"options": {"title": "Settings"}}},
//!         "stacks": {"Main": ["Home", "Settings"]},
//!         "root": "stacks.Main"
//!     }"#,
//! )
//! .unwrap();
//! let layout = spec
//!     .into_layout(|_name| Some(ScreenComponent::new(|_| {})))
//!     .unwrap();
//! assert_eq!(layout.screens().len(), 2);
//! ```
//!
//! Renderers cannot live in a file, so every declared screen is bound to a
//! component by name when a `LayoutSpec` is turned into a [`Layout`].

use serde::Deserialize;

use crate::{
    error::NavioError,
    layout::{
        ContainerData, Layout, ModalData, RootRoute, Screen, ScreenComponent, StackDefinition,
        Table,
    },
    options::{DefaultOptions, OptionSource},
};

/// A screen as declared in a layout file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenSpec {
    #[serde(default)]
    pub options: Option<OptionSource>,
}

/// File form of a [`Layout`]. Table order in the file is kept.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LayoutSpec {
    #[serde(default)]
    pub screens: Table<ScreenSpec>,
    #[serde(default)]
    pub stacks: Table<StackDefinition>,
    #[serde(default)]
    pub tabs: Table<ContainerData>,
    #[serde(default)]
    pub drawers: Table<ContainerData>,
    #[serde(default)]
    pub modals: Table<ModalData>,
    #[serde(default)]
    pub root: Option<RootRoute>,
    #[serde(default)]
    pub default_options: DefaultOptions,
}

impl LayoutSpec {
    #[cfg(feature = "toml")]
    pub fn from_toml_str(source: &str) -> Result<Self, NavioError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, NavioError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Bind every declared screen to the component returned by `component`.
    ///
    /// Fails on the first screen the lookup has no component for.
    pub fn into_layout(
        self,
        mut component: impl FnMut(&str) -> Option<ScreenComponent>,
    ) -> Result<Layout, NavioError> {
        let screens = self.screens.try_map(|name, spec| {
            let component =
                component(name).ok_or_else(|| NavioError::MissingComponent(name.to_owned()))?;
            Ok::<_, NavioError>(Screen {
                component,
                options: spec.options,
            })
        })?;

        Ok(Layout {
            screens,
            stacks: self.stacks,
            tabs: self.tabs,
            drawers: self.drawers,
            modals: self.modals,
            root: self.root,
            hooks: Vec::new(),
            default_options: self.default_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        layout::{ContainerKind, ContentTarget, RootKind},
        options::{OptionsContext, OptionsRole},
    };

    fn any_component(_: &str) -> Option<ScreenComponent> {
        Some(ScreenComponent::new(|_| {}))
    }

    #[test]
    fn json_layout_keeps_order_and_forms() {
        let spec = LayoutSpec::from_json_str(
            r#"{
                "screens": {"Main": {}, "Settings": {"options": {"title": "Settings"}}, "About": {}},
                "stacks": {"MainStack": ["Main", "About"], "More": {"screens": ["Settings"]}},
                "tabs": {"AppTabs": {"content": {"One": "MainStack", "Two": ["Main"]}}},
                "modals": {"Sheet": "More"},
                "root": "tabs.AppTabs"
            }"#,
        )
        .unwrap();

        assert_eq!(
            spec.screens.names().collect::<Vec<_>>(),
            vec!["Main", "Settings", "About"]
        );
        let layout = spec.into_layout(any_component).unwrap();
        assert_eq!(layout.root().unwrap().kind, RootKind::Tabs);
        assert!(layout.contains(ContainerKind::Modals, "Sheet"));
        let two = layout.tabs().get("AppTabs").unwrap().content.get("Two").unwrap();
        assert!(matches!(
            two.target(),
            Some(ContentTarget::Stack(StackDefinition::Screens(_)))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(LayoutSpec::from_json_str(r#"{"screen": {}}"#).is_err());
        assert!(LayoutSpec::from_json_str(r#"{"root": "modals.Sheet"}"#).is_err());
    }

    #[test]
    fn missing_component_is_an_error() {
        let spec = LayoutSpec::from_json_str(r#"{"screens": {"Main": {}, "Ghost": {}}}"#).unwrap();
        let err = spec
            .into_layout(|name| (name == "Main").then(|| ScreenComponent::new(|_| {})))
            .unwrap_err();
        assert!(matches!(err, NavioError::MissingComponent(name) if name == "Ghost"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_layout_loads_every_table() {
        let spec = LayoutSpec::from_toml_str(
            r#"
root = "drawers.Side"

[screens.Main]
[screens.Settings]
options = { title = "Settings" }

[stacks]
MainStack = ["Main"]
SettingsStack = { screens = ["Settings"], options = { title = "More" } }

[tabs.AppTabs]
screenOptions = { headerTitleAlign = "center" }

[tabs.AppTabs.content]
One = "MainStack"
Two = { stack = "SettingsStack", options = { title = "Two" } }

[drawers.Side.content]
Home = { tabs = "AppTabs" }

[modals]
Sheet = ["Settings"]

[defaultOptions.tabs.screen]
tabBarActiveTintColor = "red"
"#,
        )
        .unwrap();

        assert_eq!(
            spec.tabs
                .get("AppTabs")
                .unwrap()
                .content
                .names()
                .collect::<Vec<_>>(),
            vec!["One", "Two"]
        );
        let layout = spec.into_layout(any_component).unwrap();
        assert_eq!(layout.root(), Some(&RootRoute::drawer("Side")));
        assert_eq!(
            layout
                .drawers()
                .get("Side")
                .and_then(|side| side.content.get("Home"))
                .and_then(|home| home.target()),
            Some(ContentTarget::Tabs("AppTabs"))
        );
        let defaults = layout
            .default_options()
            .get(ContainerKind::Tabs, OptionsRole::Screen)
            .unwrap()
            .resolve(&OptionsContext::default());
        assert_eq!(defaults.get("tabBarActiveTintColor"), Some(&json!("red")));
    }
}
