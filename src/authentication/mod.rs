mod accounts;
mod middleware;
mod password;

pub use accounts::{Account, find_account};
pub use middleware::{UserId, get_role, reject_non_admin_users, require_admin, require_login};
pub use password::{
    AuthError, Credentials, change_password, check_password_policy, compute_password_hash,
    hash_password, validate_credentials,
};
