pub mod initiator;
pub mod password;
pub mod session;
