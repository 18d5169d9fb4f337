//! Response header lookup with canned defaults.

use crate::config::SimulatorConfig;
use crate::rules::ResponseSpec;

/// Headers every response reports, in `all_response_headers` order.
pub const CANNED_HEADERS: [&str; 4] = ["last-modified", "server", "content-length", "content-type"];

/// A response header: the response's own headers first (case-insensitive name,
/// empty values ignored), then the canned defaults.
pub(crate) fn response_header(
    response: &ResponseSpec,
    name: &str,
    config: &SimulatorConfig,
) -> Option<String> {
    let custom = response
        .headers
        .iter()
        .find(|(k, v)| k.eq_ignore_ascii_case(name) && !v.is_empty())
        .map(|(_, v)| v.clone());
    if custom.is_some() {
        return custom;
    }

    let canned = CANNED_HEADERS
        .iter()
        .find(|h| h.eq_ignore_ascii_case(name))?;
    Some(match *canned {
        "last-modified" => config.last_modified_header(),
        "server" => config.server.clone(),
        "content-length" => response.body_text().len().to_string(),
        _ => response.response_type().content_type().to_string(),
    })
}

/// Canned headers followed by the response's own in declaration order, one
/// `name: value` per line. Custom headers with empty values are left out, as in
/// [`response_header`].
pub(crate) fn all_response_headers(response: &ResponseSpec, config: &SimulatorConfig) -> String {
    let canned = CANNED_HEADERS.iter().map(|name| {
        let value = response_header(response, name, config).unwrap_or_default();
        format!("{name}: {value}")
    });
    let custom = response
        .headers
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}: {value}"));

    canned.chain(custom).collect::<Vec<_>>().join("\r\n")
}
