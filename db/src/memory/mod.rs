//! In-process storage.
//!
//! Used when `db.backend` is `memory` and by the test suites. Every check
//! that guards an invariant runs under the same write lock as the mutation.

mod forum;
mod message;
mod relationship;
mod user;

pub use forum::*;
pub use message::*;
pub use relationship::*;
pub use user::*;
