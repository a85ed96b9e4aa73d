//! Send message types.

use crate::types::MessageId;

/// Response from sending a message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendResponse {
    /// Serialized message ID, when the client reports one.
    pub id: Option<MessageId>,
}

impl SendResponse {
    pub fn new(id: Option<MessageId>) -> Self {
        Self { id }
    }
}
