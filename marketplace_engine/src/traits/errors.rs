use thiserror::Error;

use crate::db_types::OrderStatusType;

/// The broad class an error belongs to. Callers map these onto their own transport, e.g. HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is malformed or semantically invalid. Retrying the same call will not help.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The acting user may not perform the operation.
    Authorization,
    /// The request is valid, but the current state of the data blocks it.
    Conflict,
    /// Storage or configuration failure.
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Customer #{0} cannot purchase their own product #{1}")]
    SelfPurchase(i64, i64),
    #[error("A conversation needs at least 2 distinct participants, but {0} were given")]
    TooFewParticipants(usize),
    #[error("Reservation quantity must be positive, not {0}")]
    InvalidQuantity(i64),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Conversation #{0} does not exist")]
    ConversationNotFound(i64),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Customer #{0} does not exist")]
    CustomerNotFound(i64),
    #[error("Seller #{0} does not exist")]
    SellerNotFound(i64),
    #[error("Category #{0} does not exist")]
    CategoryNotFound(i64),
    #[error("Product item #{0} does not exist")]
    ProductItemNotFound(i64),
    #[error("User #{user_id} is not a member of conversation #{conversation_id}")]
    ParticipantNotFound { conversation_id: i64, user_id: i64 },
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("User #{user_id} is not a participant of conversation #{conversation_id}")]
    NotAParticipant { conversation_id: i64, user_id: i64 },
    #[error("Product #{0} is unavailable or has reached its sales limit")]
    ProductUnavailable(i64),
    #[error("Product item #{0} has already been delivered")]
    ProductItemUnavailable(i64),
    #[error("Product #{product_id} is no longer available, order #{order_id} has been cancelled")]
    ProductNoLongerAvailable { order_id: i64, product_id: i64 },
    #[error("Order #{order_id} cannot be {action} while it is {status}")]
    OrderStatusConflict { order_id: i64, status: OrderStatusType, action: &'static str },
    #[error("Order #{0} already has status {1}")]
    OrderModificationNoOp(i64, OrderStatusType),
    #[error("User #{user_id} is already a participant of conversation #{conversation_id}")]
    AlreadyParticipant { conversation_id: i64, user_id: i64 },
    #[error("Conversation #{0} cannot have fewer than 2 participants")]
    ParticipantFloor(i64),
    #[error("Product #{0} still has pending or confirmed orders")]
    ActiveOrdersExist(i64),
}

impl MarketplaceError {
    pub fn kind(&self) -> ErrorKind {
        use MarketplaceError::*;
        match self {
            DatabaseError(_) => ErrorKind::Internal,
            ValidationError(_) | SelfPurchase(..) | TooFewParticipants(_) | InvalidQuantity(_) => ErrorKind::Validation,
            ProductNotFound(_) |
            OrderNotFound(_) |
            ConversationNotFound(_) |
            UserNotFound(_) |
            CustomerNotFound(_) |
            SellerNotFound(_) |
            CategoryNotFound(_) |
            ProductItemNotFound(_) |
            ParticipantNotFound { .. } => ErrorKind::NotFound,
            Unauthorized(_) | NotAParticipant { .. } => ErrorKind::Authorization,
            ProductUnavailable(_) |
            ProductItemUnavailable(_) |
            ProductNoLongerAvailable { .. } |
            OrderStatusConflict { .. } |
            OrderModificationNoOp(..) |
            AlreadyParticipant { .. } |
            ParticipantFloor(_) |
            ActiveOrdersExist(_) => ErrorKind::Conflict,
        }
    }

    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}
