use rand::RngCore;
use serde::de;

/// Single-use token mailed to a subscriber (double opt-in) or to a user
/// (password setup and reset). 32 random bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationToken(String);

impl ActivationToken {
    const BYTES: usize = 32;
    const LENGTH: usize = Self::BYTES * 2;

    pub fn new() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self(token)
    }

    pub fn parse(s: String) -> Result<Self, String> {
        let is_wrong_length = s.len() != Self::LENGTH;
        let has_non_hex_chars = !s.chars().all(|c| c.is_ascii_hexdigit());

        if is_wrong_length || has_non_hex_chars {
            Err(format!("{s} is not a valid activation token."))
        } else {
            Ok(Self(s.to_ascii_lowercase()))
        }
    }
}

impl Default for ActivationToken {
    fn default() -> Self {
        Self::new()
    }
}

struct ActivationTokenVisitor;

impl de::Visitor<'_> for ActivationTokenVisitor {
    type Value = ActivationToken;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a 64 character hex encoded token")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        ActivationToken::parse(value.to_string()).map_err(de::Error::custom)
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        ActivationToken::parse(value).map_err(de::Error::custom)
    }
}

impl<'de> serde::Deserialize<'de> for ActivationToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(ActivationTokenVisitor)
    }
}

impl AsRef<str> for ActivationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActivationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
