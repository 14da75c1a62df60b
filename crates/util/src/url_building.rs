use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

/// Resolves an API path template by replacing `{key}` placeholders with
/// percent-encoded values.
///
/// Placeholders without a matching variable remain unchanged.
///
/// # Examples
/// ```rust
/// use orca_util::build_path;
///
/// let path = build_path("/workflows/instances/{instanceId}/abort", &[("instanceId", "a b")]);
/// assert_eq!(path, "/workflows/instances/a%20b/abort");
/// ```
pub fn build_path(template: &str, variables: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (key, value) in variables {
        let encoded = utf8_percent_encode(value, NON_ALPHANUMERIC).to_string();
        path = path.replace(&format!("{{{key}}}"), &encoded);
    }
    path
}

/// Resolves a client-side route such as `/workflows/:workflowId/execute`.
///
/// Only whole path segments are substituted, so `:workflowId` never matches a
/// prefix of `:workflowIdentifier`.
pub fn resolve_route(template: &str, params: &[(&str, &str)]) -> String {
    template
        .split('/')
        .map(|segment| {
            segment
                .strip_prefix(':')
                .and_then(|name| params.iter().find(|(key, _)| *key == name))
                .map(|(_, value)| utf8_percent_encode(value, NON_ALPHANUMERIC).to_string())
                .unwrap_or_else(|| segment.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Appends query parameters to a route, skipping parameters without a value.
///
/// # Examples
/// ```rust
/// use orca_util::build_url;
///
/// let url = build_url("/execute", &[("instanceId", Some("abc")), ("assessmentInstanceId", None)]);
/// assert_eq!(url, "/execute?instanceId=abc");
/// ```
pub fn build_url(route: &str, query: &[(&str, Option<&str>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut appended = false;
    for (key, value) in query {
        if let Some(value) = value {
            serializer.append_pair(key, value);
            appended = true;
        }
    }
    if !appended {
        return route.to_string();
    }
    let separator = if route.contains('?') { '&' } else { '?' };
    format!("{route}{separator}{}", serializer.finish())
}
