// Backend path layout and request-shape options.
//
// Deployments of the voucher backend disagree on where the admin routes
// live and on how the voucher list is queried. These enums make each
// choice explicit instead of hard-coding one variant.

use std::fmt;
use std::str::FromStr;

/// Where the admin routes are mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiLayout {
    /// `/admin/{resource}` -- e.g. `POST /admin/login`, `GET /admin/vouchers`.
    #[default]
    Prefixed,
    /// `/admin/api/{resource}` -- e.g. `POST /admin/api/login`.
    Namespaced,
}

impl ApiLayout {
    /// The path prefix prepended to every admin resource.
    pub fn admin_prefix(self) -> &'static str {
        match self {
            Self::Prefixed => "/admin",
            Self::Namespaced => "/admin/api",
        }
    }

    /// Full path for an admin resource, e.g. `vouchers/42`.
    pub fn path(self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.admin_prefix(),
            resource.trim_start_matches('/')
        )
    }
}

/// How the voucher list is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Send `status` and `search` as query parameters; the client still
    /// filters the result locally.
    #[default]
    Query,
    /// Plain GET; all filtering happens client-side.
    Plain,
}

/// Body encoding for bulk voucher upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadEncoding {
    /// `{"vouchers": [{serial, pin, type}, ...]}`
    #[default]
    Json,
    /// `multipart/form-data` with a single `file` part holding CSV text.
    Multipart,
}

/// Error returned when parsing one of the layout enums from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! impl_str_enum {
    ($ty:ty, $kind:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_owned() }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant { return f.write_str($name); })+
                Ok(())
            }
        }
    };
}

impl_str_enum!(ApiLayout, "api layout", {
    "prefixed" => ApiLayout::Prefixed,
    "namespaced" => ApiLayout::Namespaced,
});

impl_str_enum!(ListingMode, "listing mode", {
    "query" => ListingMode::Query,
    "plain" => ListingMode::Plain,
});

impl_str_enum!(UploadEncoding, "upload encoding", {
    "json" => UploadEncoding::Json,
    "multipart" => UploadEncoding::Multipart,
});

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn prefixed_paths() {
        assert_eq!(ApiLayout::Prefixed.path("login"), "/admin/login");
        assert_eq!(ApiLayout::Prefixed.path("/vouchers/7"), "/admin/vouchers/7");
    }

    #[test]
    fn namespaced_paths() {
        assert_eq!(ApiLayout::Namespaced.path("login"), "/admin/api/login");
        assert_eq!(ApiLayout::Namespaced.path("stats"), "/admin/api/stats");
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("Namespaced".parse::<ApiLayout>().unwrap(), ApiLayout::Namespaced);
        assert_eq!(ListingMode::Plain.to_string(), "plain");
        assert_eq!(" multipart ".parse::<UploadEncoding>().unwrap(), UploadEncoding::Multipart);
        assert!("soap".parse::<UploadEncoding>().is_err());
    }
}
