//! Bearer token authentication and the sign up, log-in and current user endpoints.

mod current_user;
mod log_in;
mod me;
mod sign_up;
mod token;

pub use current_user::{AuthState, CurrentUser};
pub use log_in::{AccessToken, LogInForm, log_in};
pub use me::get_me;
pub use sign_up::{SignUpForm, sign_up};
pub use token::{Claims, decode_token, encode_token};
