pub(crate) mod session_user;
