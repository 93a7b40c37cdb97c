pub(crate) mod user_handlers;
