mod admin;
mod api;
mod health_check;
mod helpers;
mod login;
pub(crate) mod password_reset;
pub(crate) mod register;
mod site;

pub use admin::*;
pub use api::*;
pub use health_check::*;
pub use helpers::*;
pub use login::*;
pub use password_reset::{forgot_password, forgot_password_form, reset_password, reset_password_form};
pub use register::{register, register_form};
pub use site::*;
