use unicode_segmentation::UnicodeSegmentation;

/// A first or last name of a newsletter contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberName(String);

impl SubscriberName {
    const MIN_GRAPHEMES: usize = 2;
    const MAX_GRAPHEMES: usize = 256;

    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim().to_string();
        let length = s.graphemes(true).count();
        let is_too_short = length < Self::MIN_GRAPHEMES;
        let is_too_long = length > Self::MAX_GRAPHEMES;

        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters = s.chars().any(|g| forbidden_characters.contains(&g));

        if is_too_short || is_too_long || contains_forbidden_characters {
            Err(format!("{s} is not a valid subscriber name."))
        } else {
            Ok(Self(s))
        }
    }

    /// Empty input means "not provided".
    pub fn parse_optional(s: Option<String>) -> Result<Option<Self>, String> {
        match s {
            Some(s) if !s.trim().is_empty() => Self::parse(s).map(Some),
            _ => Ok(None),
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
