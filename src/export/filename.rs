/// Longest slug segment kept in a filename.
pub const MAX_SLUG_LEN: usize = 60;

const SEPARATOR: char = '_';
const PLACEHOLDER: &str = "untitled";

/// Lowercase `text` and collapse every run of characters outside `[a-z0-9]`
/// into a single separator. The result never starts or ends with one.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with(SEPARATOR) {
            slug.push(SEPARATOR);
        }
    }
    let truncated: String = slug.chars().take(MAX_SLUG_LEN).collect();
    truncated.trim_end_matches(SEPARATOR).to_string()
}

/// Slug for a work item title. Titles follow a `Product: Feature` convention,
/// so only the part after the first colon is used when it has any content.
pub fn title_slug(title: &str) -> String {
    let suffix = title.split_once(':').map(|(_, rest)| rest).unwrap_or(title);
    let slug = slugify(suffix);
    if !slug.is_empty() {
        return slug;
    }
    let whole = slugify(title);
    if whole.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        whole
    }
}

/// Default export filename: `{prefix}_{id}_{slug}.us.txt`.
pub fn derive(prefix: &str, id: u32, title: &str) -> String {
    format!("{prefix}_{id}_{}.us.txt", title_slug(title))
}
