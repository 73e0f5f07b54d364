// Object reference helpers.
//
// The controller links objects with URLs of the form
// `https://<host>/api/<type>/<uuid>#<name>`; the `#<name>` suffix is only
// present when the request asked for `include_name`.

/// The display name carried after `#`, if any.
pub fn ref_name(reference: &str) -> Option<&str> {
    reference
        .split_once('#')
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

/// The name after `#`, or an empty string. Mirrors how reports print refs.
pub fn ref_name_or_empty(reference: &str) -> &str {
    ref_name(reference).unwrap_or("")
}

/// The API-relative path (`<type>/<uuid>`), without host and name suffix.
pub fn ref_path(reference: &str) -> Option<&str> {
    let (_, tail) = reference.split_once("/api/")?;
    let path = tail.split('#').next().unwrap_or(tail);
    Some(path.split('?').next().unwrap_or(path))
}

/// The object UUID: last path segment of the reference.
pub fn ref_uuid(reference: &str) -> Option<&str> {
    ref_path(reference).and_then(|p| p.rsplit('/').next())
}

/// Strip an `OPER_`-style enum prefix, returning the input when absent.
pub fn strip_enum_prefix<'a>(value: &'a str, prefix: &str) -> &'a str {
    value.strip_prefix(prefix).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL_REF: &str = "https://10.0.0.1/api/pool/pool-1234#web-pool";

    #[test]
    fn splits_named_reference() {
        assert_eq!(ref_name(POOL_REF), Some("web-pool"));
        assert_eq!(ref_path(POOL_REF), Some("pool/pool-1234"));
        assert_eq!(ref_uuid(POOL_REF), Some("pool-1234"));
    }

    #[test]
    fn unnamed_reference_has_no_name() {
        let r = "https://ctrl/api/tenant/admin";
        assert_eq!(ref_name(r), None);
        assert_eq!(ref_name_or_empty(r), "");
        assert_eq!(ref_path(r), Some("tenant/admin"));
    }

    #[test]
    fn not_a_reference() {
        assert_eq!(ref_path("pool-1234"), None);
        assert_eq!(strip_enum_prefix("OPER_UP", "OPER_"), "UP");
        assert_eq!(strip_enum_prefix("UNKNOWN", "OPER_"), "UNKNOWN");
    }
}
