use std::fmt::Debug;

use log::*;

use crate::{
    config::MarketplaceConfig,
    db_types::{Conversation, Message, NewConversation, NewMessage, Participant},
    mkt_api::{
        conversation_objects::{
            ConversationSummary,
            ConversationWithMessages,
            DEFAULT_MESSAGE_PAGE_LIMIT,
            USER_JOINED_NOTICE,
            USER_LEFT_NOTICE,
        },
        product_objects::Pagination,
    },
    traits::{CatalogManagement, ConversationManagement, MarketplaceError, UserDirectory},
};

/// `ConversationApi` manages buyer/seller conversations: who takes part in them and the messages they exchange.
///
/// Every read and every send is authorized against the conversation's current membership. A user who is not a
/// participant gets [`MarketplaceError::NotAParticipant`].
pub struct ConversationApi<B> {
    db: B,
    participant_notices: bool,
}

impl<B> Debug for ConversationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConversationApi")
    }
}

impl<B> ConversationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, participant_notices: true }
    }

    pub fn from_config(db: B, config: &MarketplaceConfig) -> Self {
        Self { db, participant_notices: config.participant_notices }
    }

    /// Post a system message whenever someone joins or leaves a conversation. On by default.
    pub fn with_participant_notices(mut self, enabled: bool) -> Self {
        self.participant_notices = enabled;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ConversationApi<B>
where B: ConversationManagement + UserDirectory + CatalogManagement
{
    /// Opens a conversation between the given users, optionally about a product.
    ///
    /// Repeated ids are collapsed. At least 2 distinct users are required, and all of them must exist.
    pub async fn create_conversation<I>(
        &self,
        participants: I,
        product_id: Option<i64>,
    ) -> Result<Conversation, MarketplaceError>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut conversation = NewConversation::new(participants);
        if conversation.participants.len() < 2 {
            return Err(MarketplaceError::TooFewParticipants(conversation.participants.len()));
        }
        for &user_id in &conversation.participants {
            if !self.db.user_exists(user_id).await? {
                return Err(MarketplaceError::UserNotFound(user_id));
            }
        }
        if let Some(product_id) = product_id {
            if self.db.fetch_product(product_id).await?.is_none() {
                return Err(MarketplaceError::ProductNotFound(product_id));
            }
            conversation = conversation.for_product(product_id);
        }
        let count = conversation.participants.len();
        let conversation = self.db.create_conversation(conversation).await?;
        debug!("💬️ Conversation #{} opened with {count} participants", conversation.id);
        Ok(conversation)
    }

    /// Posts a message from `sender_id`, who must be a participant of the conversation.
    pub async fn send_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        text: &str,
    ) -> Result<Message, MarketplaceError> {
        if text.trim().is_empty() {
            return Err(MarketplaceError::invalid("Message text cannot be empty"));
        }
        let message = self.db.insert_message(NewMessage::from_user(conversation_id, sender_id, text)).await?;
        trace!("💬️ User #{sender_id} posted message #{} in conversation #{conversation_id}", message.id);
        Ok(message)
    }

    /// Posts a message on behalf of the system. No membership check is made, but a referenced order must exist.
    pub async fn send_system_message(
        &self,
        conversation_id: i64,
        text: &str,
        order_id: Option<i64>,
    ) -> Result<Message, MarketplaceError> {
        if text.trim().is_empty() {
            return Err(MarketplaceError::invalid("Message text cannot be empty"));
        }
        let mut message = NewMessage::system(conversation_id, text);
        if let Some(order_id) = order_id {
            message = message.with_order_id(order_id);
        }
        let message = self.db.insert_message(message).await?;
        trace!("💬️ System message #{} posted in conversation #{conversation_id}", message.id);
        Ok(message)
    }

    pub async fn add_participant(&self, conversation_id: i64, user_id: i64) -> Result<Participant, MarketplaceError> {
        if !self.db.user_exists(user_id).await? {
            return Err(MarketplaceError::UserNotFound(user_id));
        }
        let notice = self.participant_notices.then_some(USER_JOINED_NOTICE);
        let participant = self.db.add_participant(conversation_id, user_id, notice).await?;
        debug!("💬️ User #{user_id} added to conversation #{conversation_id}");
        Ok(participant)
    }

    /// Removes the user from the conversation. A conversation never drops below 2 participants.
    pub async fn remove_participant(&self, conversation_id: i64, user_id: i64) -> Result<(), MarketplaceError> {
        let notice = self.participant_notices.then_some(USER_LEFT_NOTICE);
        self.db.remove_participant(conversation_id, user_id, notice).await?;
        debug!("💬️ User #{user_id} removed from conversation #{conversation_id}");
        Ok(())
    }

    /// The conversation, its participants and its first page of messages, as seen by `requesting_user_id`.
    pub async fn conversation_with_messages(
        &self,
        conversation_id: i64,
        requesting_user_id: i64,
    ) -> Result<ConversationWithMessages, MarketplaceError> {
        let conversation = self.fetch_for_participant(conversation_id, requesting_user_id).await?;
        let participants = self.db.fetch_participants(conversation_id).await?;
        let page = Pagination::normalized(None, None, DEFAULT_MESSAGE_PAGE_LIMIT);
        let messages = self.db.fetch_messages(conversation_id, page).await?;
        Ok(ConversationWithMessages { conversation, participants, messages })
    }

    /// A page of messages in the order they were posted. A missing or non-positive limit means 100.
    pub async fn messages(
        &self,
        conversation_id: i64,
        requesting_user_id: i64,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Message>, MarketplaceError> {
        self.fetch_for_participant(conversation_id, requesting_user_id).await?;
        let page = Pagination::normalized(limit, offset, DEFAULT_MESSAGE_PAGE_LIMIT);
        self.db.fetch_messages(conversation_id, page).await
    }

    /// The user's inbox: every conversation they take part in, with its latest message, most recently active first.
    pub async fn conversations_for_user(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MarketplaceError> {
        if !self.db.user_exists(user_id).await? {
            return Err(MarketplaceError::UserNotFound(user_id));
        }
        let conversations = self.db.conversations_for_user(user_id).await?;
        let mut result = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let last_message = self.db.fetch_last_message(conversation.id).await?;
            result.push(ConversationSummary { conversation, last_message });
        }
        Ok(result)
    }

    pub async fn conversations_for_product(&self, product_id: i64) -> Result<Vec<Conversation>, MarketplaceError> {
        if self.db.fetch_product(product_id).await?.is_none() {
            return Err(MarketplaceError::ProductNotFound(product_id));
        }
        self.db.conversations_for_product(product_id).await
    }

    pub async fn participants(&self, conversation_id: i64) -> Result<Vec<Participant>, MarketplaceError> {
        self.fetch_conversation(conversation_id).await?;
        self.db.fetch_participants(conversation_id).await
    }

    /// Every message, in any live conversation, that refers to the order.
    pub async fn messages_for_order(&self, order_id: i64) -> Result<Vec<Message>, MarketplaceError> {
        self.db.messages_for_order(order_id).await
    }

    /// Soft-deletes the conversation. It disappears from every query, but its rows are kept.
    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<(), MarketplaceError> {
        if !self.db.delete_conversation(conversation_id).await? {
            return Err(MarketplaceError::ConversationNotFound(conversation_id));
        }
        info!("💬️ Conversation #{conversation_id} deleted");
        Ok(())
    }

    pub async fn fetch_conversation(&self, conversation_id: i64) -> Result<Conversation, MarketplaceError> {
        self.db
            .fetch_conversation(conversation_id)
            .await?
            .ok_or(MarketplaceError::ConversationNotFound(conversation_id))
    }

    async fn fetch_for_participant(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> Result<Conversation, MarketplaceError> {
        let conversation = self.fetch_conversation(conversation_id).await?;
        if !self.db.is_participant(conversation_id, user_id).await? {
            debug!("💬️ User #{user_id} asked for conversation #{conversation_id} without being a participant");
            return Err(MarketplaceError::NotAParticipant { conversation_id, user_id });
        }
        Ok(conversation)
    }
}
