use sea_orm::DbErr;

use crate::strings;

/// A rule violation caught before a row is written.
///
/// Single-item writes surface these to the caller; batch operations record
/// them per item in a [`BatchReport`](crate::batch::BatchReport) and keep
/// going.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    /// Tag is empty after lower-casing and trimming
    EmptyTag,

    /// Tag contains one of the forbidden characters
    ForbiddenCharacter { tag: String, ch: char },

    /// The (user, sticker, tag) triple already exists
    DuplicateTag {
        user: i64,
        sticker: String,
        tag: String,
    },

    /// Another user entry already uses this chat
    DuplicateChat(i64),

    /// A user entry with this id already exists
    DuplicateUser(i64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTag => write!(f, "tag is empty after trimming"),
            Self::ForbiddenCharacter { tag, ch } => {
                write!(f, "tag {tag:?} contains forbidden character {ch:?}")
            }
            Self::DuplicateTag { user, sticker, tag } => write!(
                f,
                "tag {tag:?} already exists on sticker {sticker:?} for user {user}"
            ),
            Self::DuplicateChat(chat) => write!(f, "chat {chat} is already registered"),
            Self::DuplicateUser(user) => write!(f, "user {user} is already registered"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum StoreError {
    /// A single-item write violated a validation rule
    Validation(ValidationError),

    /// Referenced user entry does not exist
    UserNotFound(i64),

    /// Referenced tag row does not exist
    EntryNotFound(i32),

    /// No tag rows matched the given sticker(s)
    StickerNotFound,

    /// A required list or field in a batch request was missing or empty.
    /// Raised before any mutation is attempted.
    MissingField(&'static str),

    /// Problem originated from the database library
    Database(DbErr),
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{}", e),
            Self::UserNotFound(user) => write!(f, "user {user} not found"),
            Self::EntryNotFound(id) => write!(f, "sticker tag entry {id} not found"),
            Self::StickerNotFound => write!(f, "{}", strings::STICKER_NOT_FOUND),
            Self::MissingField(msg) => write!(f, "{}", msg),
            Self::Database(e) => write!(f, "{:?}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Database(e) => Some(e),
            _ => None,
        }
    }
}
