//! Session state and screen hand-off
//!
//! The accepted-value accumulator shared between the scan loop and the
//! "end session" action, and the payload passed to the results screen.

pub mod messages;
pub mod state;

pub use messages::{Navigator, ResultsPayload};
pub use state::{SessionAccumulator, SessionInput};
