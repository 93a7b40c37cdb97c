mod event;
mod forum;
mod message;
mod relationship;
mod search;
mod user;

pub use event::*;
pub use forum::*;
pub use message::*;
pub use relationship::*;
pub use search::*;
pub use user::*;
