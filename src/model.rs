pub mod user_entry {
    use sea_orm::entity::prelude::*;

    /// The root record identifying a platform user and their chat.
    ///
    /// `user` is supplied by the messaging platform, never generated here.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "user_entry")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user: i64,

        #[sea_orm(unique)]
        pub chat: i64,

        /// Free text, trimmed on every save. Empty when unset.
        #[sea_orm(column_type = "Text")]
        pub status: String,
    }

    #[derive(Debug, DeriveRelation, EnumIter)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod sticker_tag_entry {
    use sea_orm::entity::prelude::*;

    /// One row per (user, sticker, tag) triple. A sticker with three tags
    /// occupies three rows. Rows are owned by their user entry and are
    /// removed when the user entry is deleted.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "sticker_tag_entry")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,

        #[sea_orm(column_type = "Text")]
        pub sticker: String,

        pub user: i64,

        #[sea_orm(column_type = "Text")]
        pub tag: String,

        /// Reusable media file id, not unique.
        pub file_id: Option<String>,

        /// The set the sticker belongs to, when known.
        pub set_name: Option<String>,
    }

    #[derive(Debug, DeriveRelation, EnumIter)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
