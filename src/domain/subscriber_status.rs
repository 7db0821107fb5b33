#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
    Bounced,
    Complained,
}

impl SubscriberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "ACTIVE",
            SubscriberStatus::Unsubscribed => "UNSUBSCRIBED",
            SubscriberStatus::Bounced => "BOUNCED",
            SubscriberStatus::Complained => "COMPLAINED",
        }
    }
}

impl TryFrom<String> for SubscriberStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "ACTIVE" => Ok(SubscriberStatus::Active),
            "UNSUBSCRIBED" => Ok(SubscriberStatus::Unsubscribed),
            "BOUNCED" => Ok(SubscriberStatus::Bounced),
            "COMPLAINED" => Ok(SubscriberStatus::Complained),
            other => Err(format!("{other} is not a valid subscriber status.")),
        }
    }
}
