pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod me;
pub(crate) mod root;
pub(crate) mod user_login;
pub(crate) mod user_register;
pub(crate) mod users;

// common functions for the handlers
use regex::Regex;

/// Email predicate shared by every create/update path: a single `@` part and
/// a `.com` suffix, the contract the dashboard relies on.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.com$").is_ok_and(|regex| regex.is_match(email))
}

pub(crate) const EMAIL_RULE: &str = "Email must contain '@' and end with '.com'";
