//! Registration, log-in and log-out, server-side sessions, and the auth guard
//! middleware that protects routes.

mod cookie;
mod extract;
mod log_in;
mod log_out;
mod middleware;
mod register_user;
mod session;

pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthContext, auth_guard, auth_guard_api};
pub use register_user::{get_register_page, register_user};
pub use session::{DEFAULT_SESSION_DURATION, SessionID, create_session_table};

#[cfg(test)]
pub(crate) use cookie::COOKIE_SESSION;
