//! Closed route-name enums.
//!
//! Layout tables are string keyed. Declaring the names once as an enum lets
//! call sites such as `navio.tabs().jump_to(TabItem::Home)` be checked by the
//! compiler, while [`crate::Layout::missing_names`] checks the enum against
//! the layout at startup.

/// Declare a closed set of route names.
///
/// Each variant maps to its own identifier, or to an explicit string.
///
/// ```
/// navio::route_names! {
///     pub enum StackName {
///         Main,
///         Auth = "AuthFlow",
///     }
/// }
///
/// assert_eq!(StackName::Auth.as_str(), "AuthFlow");
/// assert_eq!(StackName::ALL.len(), 2);
/// assert_eq!(StackName::Main.to_string(), "Main");
/// ```
#[macro_export]
macro_rules! route_names {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident $(= $label:literal)?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            /// Every name, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The route name in the layout.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $crate::__route_label!($variant $(, $label)?)),+
                }
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __route_label {
    ($variant:ident) => {
        stringify!($variant)
    };
    ($variant:ident, $label:literal) => {
        $label
    };
}
