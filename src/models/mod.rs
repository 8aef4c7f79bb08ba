pub mod email;
pub mod tracked_access;

pub use email::{FailedSend, SendDetails, SendResponse};
pub use tracked_access::{AccessVisit, TrackedAccess, UNKNOWN};
