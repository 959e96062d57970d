// Authentication module
// Manages the bearer token lifecycle against the Taiga auth endpoint

mod clock;
mod credentials;
mod exchange;
mod manager;
mod types;

pub use clock::{Clock, SystemClock};
pub use manager::AuthManager;
pub use types::Credentials;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
