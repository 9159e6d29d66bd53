use crate::{
    db_types::{Conversation, Message, NewConversation, NewMessage, Participant},
    mkt_api::product_objects::Pagination,
    traits::MarketplaceError,
};

/// The `ConversationManagement` trait defines behaviour for storing conversations, their membership and their messages.
///
/// Soft-deleted conversations are invisible to every method: they are reported as not found.
#[allow(async_fn_in_trait)]
pub trait ConversationManagement {
    /// Creates the conversation and all of its participants in one transaction.
    async fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation, MarketplaceError>;

    async fn fetch_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>, MarketplaceError>;

    /// Conversations the user participates in, most recently active first.
    async fn conversations_for_user(&self, user_id: i64) -> Result<Vec<Conversation>, MarketplaceError>;

    async fn conversations_for_product(&self, product_id: i64) -> Result<Vec<Conversation>, MarketplaceError>;

    /// Soft-deletes the conversation. Returns `false` if it did not exist or was already deleted.
    async fn delete_conversation(&self, conversation_id: i64) -> Result<bool, MarketplaceError>;

    async fn fetch_participants(&self, conversation_id: i64) -> Result<Vec<Participant>, MarketplaceError>;

    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> Result<bool, MarketplaceError>;

    /// Adds the user to the conversation. If `notice` is given, it is posted as a system message in the same
    /// transaction.
    ///
    /// Fails with [`MarketplaceError::AlreadyParticipant`] if the user is already a member.
    async fn add_participant(
        &self,
        conversation_id: i64,
        user_id: i64,
        notice: Option<&str>,
    ) -> Result<Participant, MarketplaceError>;

    /// Removes the user from the conversation, unless that would leave fewer than 2 participants
    /// ([`MarketplaceError::ParticipantFloor`]). If `notice` is given, it is posted as a system message in the same
    /// transaction.
    async fn remove_participant(
        &self,
        conversation_id: i64,
        user_id: i64,
        notice: Option<&str>,
    ) -> Result<(), MarketplaceError>;

    /// Stores a message. In one transaction, this checks that the conversation exists, that a human sender is a
    /// participant ([`MarketplaceError::NotAParticipant`]) and that a referenced order exists.
    async fn insert_message(&self, message: NewMessage) -> Result<Message, MarketplaceError>;

    /// Messages of the conversation in the order they were posted.
    async fn fetch_messages(&self, conversation_id: i64, page: Pagination) -> Result<Vec<Message>, MarketplaceError>;

    async fn fetch_last_message(&self, conversation_id: i64) -> Result<Option<Message>, MarketplaceError>;

    async fn messages_for_order(&self, order_id: i64) -> Result<Vec<Message>, MarketplaceError>;
}
