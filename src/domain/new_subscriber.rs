use std::collections::BTreeMap;

use super::{SubscriberEmail, SubscriberName, normalize_tags};

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub first_name: Option<SubscriberName>,
    pub last_name: Option<SubscriberName>,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl NewSubscriber {
    pub fn parse(
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
        tags: Vec<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, String> {
        let email = SubscriberEmail::parse(email)?;
        let first_name = SubscriberName::parse_optional(first_name)?;
        let last_name = SubscriberName::parse_optional(last_name)?;
        Ok(Self {
            email,
            first_name,
            last_name,
            tags: normalize_tags(tags),
            metadata,
        })
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_ref().map(AsRef::as_ref)
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_ref().map(AsRef::as_ref)
    }
}
