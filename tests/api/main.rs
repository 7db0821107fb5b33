mod admin_access;
mod campaigns;
mod change_password;
mod contact;
mod health_check;
mod login;
mod newsletter;
mod password_reset;
mod register;
mod subscribers;
mod users;
