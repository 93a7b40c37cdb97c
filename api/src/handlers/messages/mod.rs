pub(crate) mod message_handlers;
