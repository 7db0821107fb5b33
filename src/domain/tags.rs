//! Free-form subscriber tags. Order is preserved (first seen wins) so the
//! admin UI shows tags in the order they were attached.

pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

pub fn merge_tags(existing: &[String], added: &[String]) -> Vec<String> {
    normalize_tags(existing.iter().chain(added.iter()))
}

pub fn remove_tags(existing: &[String], removed: &[String]) -> Vec<String> {
    let removed = normalize_tags(removed);
    existing
        .iter()
        .filter(|tag| !removed.iter().any(|r| r == tag.trim()))
        .cloned()
        .collect()
}

/// Parse a comma separated list, e.g. the `tags` query parameter of the import.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}
