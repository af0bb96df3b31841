const MAX_DOMAIN_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Whether `name` is acceptable as a server domain name.
///
/// At most 255 characters overall; every dot-separated label is 1 to 63
/// ASCII letters, digits or hyphens and neither starts nor ends with a hyphen.
pub fn is_valid_domain(name: &str) -> bool {
    if name.len() > MAX_DOMAIN_LEN {
        return false;
    }
    name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    (1..=MAX_LABEL_LEN).contains(&label.len())
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}
