//! Relative-URI resolution against a request's source location.
//!
//! References discovered during include expansion or stylesheet
//! autodiscovery are relative to the request's source file, not to whatever
//! the process's working directory happens to be. Resolution is best-effort:
//! anything unparsable comes back unchanged and the caller proceeds with the
//! original reference.

/// A minimally decomposed URI reference. Query and fragment are carried as
/// part of the path; the loader never needs them separated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UriRef {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
}

impl UriRef {
    /// Parses a URI reference. Returns `None` when the reference does not
    /// decompose (e.g. a non-numeric port), which callers treat as
    /// "use the original string unresolved".
    pub fn parse(s: &str) -> Option<Self> {
        let mut out = UriRef::default();
        let mut rest = s;

        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            let scheme_like = !candidate.is_empty()
                && candidate.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if scheme_like && !rest[..colon].contains('/') {
                out.scheme = Some(candidate.to_ascii_lowercase());
                rest = &rest[colon + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let authority_end = after.find('/').unwrap_or(after.len());
            let (authority, path) = after.split_at(authority_end);
            let mut hostinfo = authority;
            if let Some((userinfo, host)) = hostinfo.split_once('@') {
                out.userinfo = Some(userinfo.to_string());
                hostinfo = host;
            }
            if let Some((host, port)) = hostinfo.rsplit_once(':') {
                if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                out.host = Some(host.to_string());
                out.port = Some(port.to_string());
            } else {
                out.host = Some(hostinfo.to_string());
            }
            if !path.is_empty() {
                out.path = Some(path.to_string());
            }
        } else if !rest.is_empty() {
            out.path = Some(rest.to_string());
        }

        Some(out)
    }

    /// Reassembles the reference into a string.
    pub fn unparse(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(host) = &self.host {
            out.push_str("//");
            if let Some(userinfo) = &self.userinfo {
                out.push_str(userinfo);
                out.push('@');
            }
            out.push_str(host);
            if let Some(port) = &self.port {
                out.push(':');
                out.push_str(port);
            }
        }
        if let Some(path) = &self.path {
            out.push_str(path);
        }
        out
    }
}

/// Resolves `reference` against `base`. Returns `None` when the base path is
/// nonsensical (does not begin with a separator), in which case the caller
/// keeps the unresolved reference.
pub fn resolve(base: &UriRef, reference: &UriRef) -> Option<UriRef> {
    let mut out = reference.clone();

    // The interesting bit is the path.
    match &reference.path {
        None => {
            if reference.host.is_none() {
                out.path = Some(base.path.clone().unwrap_or_else(|| "/".to_string()));
            } else {
                out.path = Some("/".to_string());
            }
        }
        Some(path) if !path.starts_with('/') => {
            let basepath = base.path.as_deref().unwrap_or("/");
            if !basepath.starts_with('/') {
                return None;
            }
            let bytes = basepath.as_bytes();
            let mut base_end = basepath.rfind('/').unwrap_or(0);
            let mut path = path.as_str();
            // Each leading "up one level" segment consumes one trailing
            // directory component of the base path.
            while let Some(rest) = path.strip_prefix("../") {
                while base_end > 0 {
                    base_end -= 1;
                    if bytes[base_end] == b'/' {
                        break;
                    }
                }
                path = rest;
            }
            // "This level" segments are dropped with no effect.
            while let Some(rest) = path.strip_prefix("./") {
                path = rest;
            }
            let mut resolved = basepath[..=base_end].to_string();
            resolved.push_str(path);
            out.path = Some(resolved);
        }
        Some(_) => {}
    }

    // The trivial bits are everything-but-path.
    if out.scheme.is_none() {
        out.scheme = base.scheme.clone();
    }
    if out.userinfo.is_none() {
        out.userinfo = base.userinfo.clone();
    }
    if out.host.is_none() {
        out.host = base.host.clone();
    }
    if out.port.is_none() {
        out.port = base.port.clone();
    }
    Some(out)
}

/// Resolves a resource reference against the directory of the request's
/// source path, producing a reference usable by the loader.
///
/// Resolution is fail-open: if anything does not parse or resolve, the
/// original reference is returned unchanged.
pub fn resolve_reference(href: &str, request_path: &str) -> String {
    let Some(reference) = UriRef::parse(href) else {
        return href.to_string();
    };
    let dir = match request_path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir,
        _ => "",
    };
    let base_str = format!("file://{dir}/");
    let Some(base) = UriRef::parse(&base_str) else {
        return href.to_string();
    };
    match resolve(&base, &reference) {
        Some(resolved) => resolved.unparse(),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_uri() {
        let uri = UriRef::parse("file:///site/pages/index.xml").unwrap();
        assert_eq!(uri.scheme.as_deref(), Some("file"));
        assert_eq!(uri.host.as_deref(), Some(""));
        assert_eq!(uri.path.as_deref(), Some("/site/pages/index.xml"));
    }

    #[test]
    fn test_parse_authority_parts() {
        let uri = UriRef::parse("http://user@host:8080/a").unwrap();
        assert_eq!(uri.userinfo.as_deref(), Some("user"));
        assert_eq!(uri.host.as_deref(), Some("host"));
        assert_eq!(uri.port.as_deref(), Some("8080"));
        assert_eq!(uri.path.as_deref(), Some("/a"));
    }

    #[test]
    fn test_parse_bad_port_is_unparsable() {
        assert!(UriRef::parse("http://host:eighty/a").is_none());
    }

    #[test]
    fn test_resolve_plain_relative() {
        let resolved = resolve_reference("img.png", "/site/pages/index.xml");
        assert_eq!(resolved, "file:///site/pages/img.png");
    }

    #[test]
    fn test_resolve_parent_segments() {
        let resolved = resolve_reference("../assets/img.png", "/site/pages/index.xml");
        assert_eq!(resolved, "file:///site/assets/img.png");
    }

    #[test]
    fn test_resolve_here_segments() {
        let resolved = resolve_reference("./img.png", "/site/pages/index.xml");
        assert_eq!(resolved, "file:///site/pages/img.png");
    }

    #[test]
    fn test_resolve_absolute_path_kept() {
        let resolved = resolve_reference("/other/x.xsl", "/site/pages/index.xml");
        assert_eq!(resolved, "file:///other/x.xsl");
    }

    #[test]
    fn test_resolve_keeps_foreign_scheme() {
        let resolved = resolve_reference("http://example.com/s.xsl", "/site/pages/index.xml");
        assert_eq!(resolved, "http://example.com/s.xsl");
    }

    #[test]
    fn test_resolve_unparsable_reference_unchanged() {
        let resolved = resolve_reference("http://host:x7/a", "/site/pages/index.xml");
        assert_eq!(resolved, "http://host:x7/a");
    }

    #[test]
    fn test_resolve_bad_base_returns_reference() {
        let base = UriRef {
            path: Some("relative/base".to_string()),
            ..UriRef::default()
        };
        let reference = UriRef::parse("img.png").unwrap();
        assert!(resolve(&base, &reference).is_none());
    }

    #[test]
    fn test_resolve_empty_reference_inherits_base_path() {
        let base = UriRef::parse("file:///site/pages/").unwrap();
        let reference = UriRef::parse("").unwrap();
        let resolved = resolve(&base, &reference).unwrap();
        assert_eq!(resolved.path.as_deref(), Some("/site/pages/"));
        assert_eq!(resolved.scheme.as_deref(), Some("file"));
    }

    #[test]
    fn test_excess_parent_segments_stop_at_root() {
        let resolved = resolve_reference("../../../../img.png", "/site/pages/index.xml");
        assert_eq!(resolved, "file:///img.png");
    }
}
