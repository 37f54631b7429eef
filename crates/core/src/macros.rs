// SPDX-License-Identifier: MIT

//! Small declarative macros shared across the workspace.
//!
//! [`simple_display!`] maps enum variants to their wire/log spellings
//! without a hand-written `Display` impl per enum (the kernel has a lot
//! of small closed enums: states, signals, roles, outcomes).
//! [`builder!`] generates the fluent test builders used by this crate's
//! and downstream crates' fixtures; nothing it emits exists outside
//! test builds.

/// `Display` for a closed enum, one string literal per variant.
///
/// Unit variants are listed bare; variants with fields take `(..)` so
/// their data is ignored:
///
/// ```ignore
/// crate::simple_display! {
///     StepKind {
///         Plain => "plain",
///         Detailed(..) => "detailed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $( $var:ident $(( $($skip:tt)* ))? => $text:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $( Self::$var $(( $($skip)* ))? => $text, )+
                };
                f.write_str(text)
            }
        }
    };
}

/// Test-only builder for a record type: a builder struct, defaults,
/// chainable setters, and `build()`, all gated behind
/// `cfg(any(test, feature = "test-support"))`.
///
/// Fields are declared in four groups:
/// - `into { field: Type = default }` — setter takes `impl Into<Type>`
/// - `set { field: Type = default }` — setter takes the type as-is
/// - `option { field: Type = default }` — stored as `Option<Type>`,
///   setter wraps the value in `Some`
/// - `computed { field: Type = expr }` — no setter; evaluated when
///   `build()` runs
///
/// ```ignore
/// crate::builder! {
///     pub struct UserBuilder => User {
///         into { username: String = "alice" }
///         set { created_at_ms: u64 = 0 }
///         option { last_login_at_ms: u64 = None }
///         computed { id: UserId = UserId::new() }
///     }
/// }
/// ```
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $record:ident {
            $(into {
                $( $if_field:ident : $if_ty:ty = $if_default:expr ),* $(,)?
            })?
            $(set {
                $( $sf_field:ident : $sf_ty:ty = $sf_default:expr ),* $(,)?
            })?
            $(option {
                $( $of_field:ident : $of_ty:ty = $of_default:expr ),* $(,)?
            })?
            $(computed {
                $( $cf_field:ident : $cf_ty:ty = $cf_expr:expr ),* $(,)?
            })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $if_field: $if_ty, )*)?
            $($( $sf_field: $sf_ty, )*)?
            $($( $of_field: Option<$of_ty>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $if_field: $if_default.into(), )*)?
                    $($( $sf_field: $sf_default, )*)?
                    $($( $of_field: $of_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $($(
                pub fn $if_field(mut self, value: impl Into<$if_ty>) -> Self {
                    self.$if_field = value.into();
                    self
                }
            )*)?

            $($(
                pub fn $sf_field(mut self, value: $sf_ty) -> Self {
                    self.$sf_field = value;
                    self
                }
            )*)?

            $($(
                pub fn $of_field(mut self, value: impl Into<$of_ty>) -> Self {
                    self.$of_field = Some(value.into());
                    self
                }
            )*)?

            pub fn build(self) -> $record {
                $record {
                    $($( $if_field: self.$if_field, )*)?
                    $($( $sf_field: self.$sf_field, )*)?
                    $($( $of_field: self.$of_field, )*)?
                    $($( $cf_field: $cf_expr, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $record {
            /// Builder preloaded with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
