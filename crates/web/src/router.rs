//! Maps a request path to a route name.
//!
//! The route name is the run of ASCII letters and digits directly after the leading `/`.
//! Everything after that run is ignored, so `/Add`, `/Add/` and `/Add.json` all resolve
//! to `Add`. An empty run resolves to [`DEFAULT_ROUTE`].

use crate::error::DispatchError;

/// Route served for the root path.
pub const DEFAULT_ROUTE: &str = "Index";

/// Path answered with a fixed not-found response, bypassing dispatch.
pub const RESERVED_PATH: &str = "/favicon.ico";

/// Extracts the route name from `path`.
///
/// Fails with a `400 Invalid path.` when the path does not start with `/`, e.g. the `*`
/// target of an `OPTIONS` request.
pub fn route_name(path: &str) -> Result<&str, DispatchError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(DispatchError::bad_request("Invalid path."));
    };

    let end = rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len());
    match &rest[..end] {
        "" => Ok(DEFAULT_ROUTE),
        name => Ok(name),
    }
}

/// Whether `name` could ever be produced by [`route_name`].
pub(crate) fn is_routable(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_default_route() {
        assert_eq!(route_name("/").unwrap(), "Index");
    }

    #[test]
    fn first_segment_is_route() {
        assert_eq!(route_name("/Add").unwrap(), "Add");
        assert_eq!(route_name("/Add/").unwrap(), "Add");
        assert_eq!(route_name("/Add/1/2").unwrap(), "Add");
        assert_eq!(route_name("/Add.json").unwrap(), "Add");
        assert_eq!(route_name("/user42").unwrap(), "user42");
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(route_name("/add").unwrap(), "add");
        assert_eq!(route_name("/ADD").unwrap(), "ADD");
    }

    #[test]
    fn leading_special_character_is_default_route() {
        assert_eq!(route_name("/-Add").unwrap(), "Index");
        assert_eq!(route_name("//Add").unwrap(), "Index");
        assert_eq!(route_name("/%41dd").unwrap(), "Index");
    }

    #[test]
    fn path_without_slash_is_rejected() {
        assert!(matches!(route_name("*"), Err(DispatchError::Reported { .. })));
        assert!(matches!(route_name(""), Err(DispatchError::Reported { .. })));
    }

    #[test]
    fn routable_names() {
        assert!(is_routable("Index"));
        assert!(is_routable("Add2"));
        assert!(!is_routable(""));
        assert!(!is_routable("add_numbers"));
        assert!(!is_routable("über"));
    }
}
