mod activation_token;
mod campaign_status;
mod new_subscriber;
mod pagination;
mod publish_status;
mod slug;
mod subscriber_email;
mod subscriber_import;
mod subscriber_name;
mod subscriber_status;
mod tags;

pub use activation_token::ActivationToken;
pub use campaign_status::{CampaignStatus, DeliveryReport};
pub use new_subscriber::NewSubscriber;
pub use pagination::Pagination;
pub use publish_status::{PublishStatus, Role};
pub use slug::Slug;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_import::{ImportBatch, ImportRow, ImportRowError, parse_subscriber_import};
pub use subscriber_name::SubscriberName;
pub use subscriber_status::SubscriberStatus;
pub use tags::{merge_tags, normalize_tags, parse_tag_list, remove_tags};
