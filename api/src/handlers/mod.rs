pub(crate) mod forum;
pub(crate) mod friends;
pub(crate) mod messages;
pub(crate) mod users;
