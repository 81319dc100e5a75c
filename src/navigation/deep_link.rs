//! Deep-link parsing. Pure string handling, no history access.

use url::{form_urlencoded, Url};

use super::MODULE_PARAM;
use crate::catalog::is_query_safe;

/// Read the `module` query parameter of a URL. Empty values count as absent.
pub fn module_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == MODULE_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Extract the target module from a deep link.
///
/// Accepts, in order:
/// 1. A full URL (`playdeck://local/?module=counter`)
/// 2. A bare query string (`?module=counter`)
/// 3. A bare module id (`counter`)
///
/// Anything else yields `None`, meaning "show the catalog".
pub fn parse_deep_link(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(trimmed) {
        return module_param(&url);
    }

    if let Some(query) = trimmed.strip_prefix('?') {
        return form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == MODULE_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty());
    }

    is_query_safe(trimmed).then(|| trimmed.to_string())
}

/// Return `base` with the `module` parameter set to `id`, or removed when
/// `id` is `None`. Other query parameters are kept in order.
pub fn with_module_param(base: &Url, id: Option<&str>) -> Url {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != MODULE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !retained.is_empty() || id.is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        if let Some(id) = id {
            pairs.append_pair(MODULE_PARAM, id);
        }
    }
    url
}
