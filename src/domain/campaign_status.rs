#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Scheduled => "SCHEDULED",
            CampaignStatus::Sending => "SENDING",
            CampaignStatus::Sent => "SENT",
            CampaignStatus::Failed => "FAILED",
        }
    }

    /// Only drafts can be sent by hand; scheduled campaigns belong to the worker.
    pub fn is_manually_sendable(&self) -> bool {
        matches!(self, CampaignStatus::Draft)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CampaignStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "SCHEDULED" => Ok(CampaignStatus::Scheduled),
            "SENDING" => Ok(CampaignStatus::Sending),
            "SENT" => Ok(CampaignStatus::Sent),
            "FAILED" => Ok(CampaignStatus::Failed),
            other => Err(format!("{other} is not a valid campaign status.")),
        }
    }
}

/// Outcome of one pass over a campaign's recipients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeliveryReport {
    pub total: i32,
    pub delivered: i32,
    pub failed: i32,
}

impl DeliveryReport {
    pub fn record_delivered(&mut self) {
        self.total += 1;
        self.delivered += 1;
    }

    pub fn record_failed(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    pub fn final_status(&self) -> CampaignStatus {
        if self.total > 0 && self.failed == self.total {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Sent
        }
    }
}
