/// URL path segment derived from a title, e.g. `"Hello, World!"` → `hello-world`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl Slug {
    pub fn from_title(title: &str) -> Result<Self, String> {
        let mut slug = String::with_capacity(title.len());
        for c in title.trim().to_lowercase().chars() {
            if c.is_whitespace() || c == '-' {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            } else if c.is_ascii_alphanumeric() || c == '_' {
                slug.push(c);
            }
        }
        let slug = slug.trim_end_matches('-').to_string();

        if slug.is_empty() {
            Err(format!("Cannot derive a slug from {title:?}."))
        } else {
            Ok(Self(slug))
        }
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}
