mod dashboard;
mod logout;
mod newsletter;
mod password;
mod users;

pub use dashboard::admin_dashboard;
pub use logout::log_out;
pub use newsletter::{campaigns_page, subscribers_page};
pub use password::{change_password, change_password_form};
pub use users::{create_user, list_users};
