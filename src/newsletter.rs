mod campaigns;
mod delivery;
mod subscribers;

pub use campaigns::{
    Campaign, CampaignStats, EmailTemplate, find_campaign, find_template, list_campaigns,
    list_templates, mark_campaign_failed,
};
pub use delivery::{deliver_campaign, get_active_recipients};
pub use subscribers::{
    Subscriber, SubscriberFilter, find_subscriber, insert_subscriber, list_subscribers,
};
