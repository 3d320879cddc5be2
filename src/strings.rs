pub const TAG_LIST_MISSING: &str = "tag list not supplied or is empty";
pub const STICKER_LIST_MISSING: &str = "sticker list not supplied or is empty";
pub const STICKER_NOT_FOUND: &str = "sticker not found for that user";
