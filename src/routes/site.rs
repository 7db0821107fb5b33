mod blog;
mod home;
mod pages;
mod projects;
mod services;

pub use blog::{blog_index, blog_post};
pub use home::home;
pub use pages::{contact_page, newsletter_verified};
pub use projects::{project_detail, projects_index};
pub use services::{service_detail, services_index};

/// Listing pages of the public site show this many entries.
const PAGE_SIZE: i64 = 9;
