//! Shared helpers used by the section validators.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error unless `url` starts with one of `schemes` (e.g. `"ws://"`)
/// and has something after it.
pub(crate) fn validate_url(errors: &mut Vec<String>, name: &str, url: &str, schemes: &[&str]) {
    let ok = schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme));
    if !ok {
        errors.push(format!(
            "{name} = {url:?} must start with one of {}",
            schemes.join(", ")
        ));
    }
}

/// Push an error if `value` is empty or only whitespace.
pub(crate) fn validate_not_blank(errors: &mut Vec<String>, name: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{name} must not be empty"));
    }
}
