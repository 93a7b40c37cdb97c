mod forum;
mod message;
mod relationship;
mod user;

pub use forum::*;
pub use message::*;
pub use relationship::*;
pub use user::*;

/// postgres reports a violated unique index with this sqlstate
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
