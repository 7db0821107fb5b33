mod admin;
mod contact;
mod content;
mod newsletter;
mod profile;

pub use admin::*;
pub use contact::contact;
pub use content::{
    get_blog, get_blogs, get_categories, get_category, get_project, get_projects, get_services,
};
pub use newsletter::{subscribe, verify};
pub use profile::update_profile;
