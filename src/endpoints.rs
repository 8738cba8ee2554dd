//! The API endpoints URIs.
//!
//! Static files are served from the root, so these paths must not clash with
//! file names in the static directory.

/// The root route which redirects to the account page.
pub const ROOT: &str = "/";
/// The landing page for logged in users with the expense form and chart.
pub const ACCOUNT_VIEW: &str = "/account";
/// The route for getting the registration page and registering a new user.
pub const REGISTER: &str = "/register";
/// The route for getting the log-in page and logging in a user.
pub const LOG_IN: &str = "/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The route for saving a year of monthly expenses.
pub const SAVE_EXPENSES: &str = "/saveExpenses";
/// The route for getting the current year's saved expenses.
pub const EXPENSES: &str = "/expenses";
/// The route for getting the logged in user's name.
pub const USER: &str = "/user";
