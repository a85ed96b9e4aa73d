mod jid;

pub use jid::{Jid, JidParseError, USER_SERVER};

/// Message ID type (web client serialized ID string).
pub type MessageId = String;
