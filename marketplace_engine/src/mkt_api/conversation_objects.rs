use serde::{Deserialize, Serialize};

use crate::db_types::{Conversation, Message, Participant};

pub const DEFAULT_MESSAGE_PAGE_LIMIT: i64 = 100;

pub const USER_JOINED_NOTICE: &str = "User joined the conversation";
pub const USER_LEFT_NOTICE: &str = "User left the conversation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationWithMessages {
    pub conversation: Conversation,
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
}

impl ConversationWithMessages {
    pub fn participant_ids(&self) -> Vec<i64> {
        self.participants.iter().map(|p| p.user_id).collect()
    }
}

/// A conversation as it appears in a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}
