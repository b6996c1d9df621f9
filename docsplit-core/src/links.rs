use crate::config::LinkConfig;
use crate::error::DocsplitError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static DOC_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/document/d/([a-zA-Z0-9_-]+)").unwrap());

/// Resolves link-service redirect URLs to the destination they wrap.
#[derive(Debug, Clone)]
pub struct RedirectUnwrapper {
    hosts: Vec<String>,
    params: Vec<String>,
}

impl Default for RedirectUnwrapper {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

impl RedirectUnwrapper {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            hosts: config.redirect_hosts.iter().map(|h| h.to_lowercase()).collect(),
            params: config.redirect_params.clone(),
        }
    }

    /// Return the wrapped destination, or `href` unchanged when it is not a
    /// redirect wrapper (or carries no usable destination).
    pub fn unwrap(&self, href: &str) -> String {
        let href = href.trim();
        self.destination(href).unwrap_or_else(|| href.to_string())
    }

    pub fn is_redirect(&self, href: &str) -> bool {
        self.destination(href.trim()).is_some()
    }

    fn destination(&self, href: &str) -> Option<String> {
        let parsed = Url::parse(href).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        if !self.hosts.contains(&host) && parsed.path() != "/url" {
            return None;
        }

        self.params.iter().find_map(|name| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name.as_str())
                .map(|(_, value)| value.into_owned())
                .filter(|value| is_absolute_http(value))
        })
    }
}

fn is_absolute_http(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Document id from a hosted-document URL (`.../document/d/<id>/edit`).
pub fn extract_doc_id(url: &str) -> Result<String, DocsplitError> {
    DOC_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DocsplitError::InvalidDocumentUrl(url.to_string()))
}

/// Last non-empty path segment, ignoring query and fragment.
/// Scheme-less input like `example.com/a/b` is accepted.
pub fn extract_slug(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    match Url::parse(&with_scheme) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string(),
        Err(_) => String::new(),
    }
}

/// Collection handle: the segment after `/collections/`.
pub fn extract_handle(url: &str) -> String {
    const MARKER: &str = "/collections/";

    let path = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.trim().to_string(),
    };

    let Some(idx) = path.find(MARKER) else {
        return String::new();
    };

    let remainder = &path[idx + MARKER.len()..];
    let end = remainder.find(['/', '?', '#']).unwrap_or(remainder.len());
    remainder[..end].to_string()
}
