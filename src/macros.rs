//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display and FromStr implementations for enums
///
/// Parsing is case-insensitive; the string literals must be lowercase.
///
/// # Usage
///
/// ```rust,ignore
/// use crate::error::CasebookError;
/// use crate::macros::enum_display_fromstr;
///
/// enum_display_fromstr!(
///     SortOrder,
///     CasebookError::invalid_value,
///     {
///         Asc => "asc",
///         Desc => "desc",
///     }
/// );
/// ```
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $error_fn:path,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::CasebookError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok($enum_name::$variant),)+
                    _ => Err($error_fn(s.to_string())),
                }
            }
        }
    };
}

/// Macro to generate only Display implementation for enums
///
/// # Usage
///
/// ```rust,ignore
/// enum_display!(
///     DialogMode,
///     {
///         Add => "add",
///         Edit => "edit",
///     }
/// );
/// ```
macro_rules! enum_display {
    (
        $enum_name:ident,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, $str),)+
                }
            }
        }
    };
}

pub(crate) use {enum_display, enum_display_fromstr};
