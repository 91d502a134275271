use std::collections::BTreeMap;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use url::Url;

use crate::Endpoint;

/// Everything except RFC 3986 unreserved characters gets escaped
const PARAM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Keys keep their `/` separators
const KEY_ESCAPE: &AsciiSet = &PARAM_ESCAPE.remove(b'/');

/// Percent-encodes a key for use as a URL path, so `?`, `#` and `%` stay
/// part of the key.
pub(crate) fn escape_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ESCAPE).to_string()
}

/// Percent-encodes and joins parameters as `k1=v1&k2=v2`, ordered by name.
pub(crate) fn escape_and_join_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, PARAM_ESCAPE),
                utf8_percent_encode(value, PARAM_ESCAPE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Extracts the host and port a `location` redirect header points to.
///
/// Accepts absolute URLs (`http://10.0.0.2:4001/v2/keys/foo`) and bare
/// `host:port` values. The port defaults to the scheme's well-known port.
pub(crate) fn endpoint_from_location(location: &str) -> Option<Endpoint> {
    let location = location.trim();
    let url = if location.contains("://") {
        Url::parse(location).ok()?
    } else {
        Url::parse(&format!("http://{location}")).ok()?
    };

    let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    let port = url.port_or_known_default()?;
    Some(Endpoint::new(host, port))
}

/// Keys denoting directories end in `/`
pub(crate) fn key_is_directory(key: &str) -> bool {
    key.ends_with('/')
}
