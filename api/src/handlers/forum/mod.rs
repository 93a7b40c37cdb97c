pub(crate) mod forum_handlers;
