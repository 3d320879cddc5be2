//! All reads and mutations against the sticker records database.
//!
//! Every tag write, single or batched, funnels through the same
//! normalization and duplicate check. Batch operations treat a per-item
//! rejection as "skip and continue" and report the outcome per item;
//! single-item operations surface the rejection to the caller.

use itertools::Itertools;
use log::{info, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, EntityTrait, IntoActiveModel, Order, QueryFilter, QueryOrder, Schema, Set,
};

use crate::batch::{BatchReport, TagOutcome};
use crate::error::{StoreError, ValidationError};
use crate::model::{sticker_tag_entry, user_entry};
use crate::normalize::{normalize_sticker, normalize_status, normalize_tag, normalize_tag_list};
use crate::strings;

/// Fixed window size for paginated sticker filtering.
pub const PAGE_SIZE: usize = 50;

/// Optional, AND-combined predicates for listing user entries.
#[derive(Debug, Default)]
pub struct UserFilter {
    pub user: Option<i64>,
    pub chat: Option<i64>,
    /// Substring match on status
    pub status: Option<String>,
}

/// Optional, AND-combined predicates for listing tag rows.
#[derive(Debug, Default)]
pub struct EntryFilter {
    pub id: Option<i32>,
    /// Substring match
    pub sticker: Option<String>,
    /// Substring match
    pub tag: Option<String>,
    /// Substring match
    pub file_id: Option<String>,
    /// Substring match
    pub set_name: Option<String>,
    /// Exact user id, passed through as text. Unparseable input matches
    /// nothing rather than erroring.
    pub user: Option<String>,
}

/// Partial update for a user entry. `None` leaves the field alone.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub chat: Option<i64>,
    pub status: Option<String>,
}

/// Partial update for a tag row. `None` leaves the field alone.
#[derive(Debug, Default)]
pub struct EntryPatch {
    pub sticker: Option<String>,
    pub tag: Option<String>,
    pub file_id: Option<String>,
    pub set_name: Option<String>,
}

/// Nested user -> stickers -> tags read view.
#[derive(Debug, PartialEq)]
pub struct UserStickerTags {
    pub user: i64,
    pub chat: i64,
    pub status: String,
    pub stickers: Vec<StickerTags>,
}

#[derive(Debug, PartialEq)]
pub struct StickerTags {
    pub sticker: String,
    pub tags: Vec<String>,
}

pub struct DataStore {
    db: DatabaseConnection,
}

impl DataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect and make sure both tables exist.
    pub async fn connect<C>(opts: C) -> Result<Self, StoreError>
    where
        C: Into<ConnectOptions>,
    {
        let db = Database::connect(opts).await?;
        let store = Self::new(db);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.create_table(user_entry::Entity).await?;
        self.create_table(sticker_tag_entry::Entity).await?;
        info!("Database tables are ready");
        Ok(())
    }

    async fn create_table<E: EntityTrait>(&self, entity: E) -> Result<(), StoreError> {
        let builder = self.db.get_database_backend();
        let schema = Schema::new(builder);

        self.db
            .execute(builder.build(schema.create_table_from_entity(entity).if_not_exists()))
            .await?;

        Ok(())
    }

    /* User entries */

    /// Register a user. Both the user id and the chat must be unused.
    pub async fn create_user(
        &self,
        user: i64,
        chat: i64,
        status: Option<&str>,
    ) -> Result<user_entry::Model, StoreError> {
        if user_entry::Entity::find_by_id(user)
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(ValidationError::DuplicateUser(user).into());
        }
        self.check_chat_free(chat, None).await?;

        let status = status.map(normalize_status).unwrap_or_default();
        user_entry::Entity::insert(user_entry::ActiveModel {
            user: Set(user),
            chat: Set(chat),
            status: Set(status),
        })
        .exec(&self.db)
        .await?;

        self.get_user(user).await
    }

    pub async fn get_user(&self, user: i64) -> Result<user_entry::Model, StoreError> {
        user_entry::Entity::find_by_id(user)
            .one(&self.db)
            .await?
            .ok_or(StoreError::UserNotFound(user))
    }

    pub async fn list_users(
        &self,
        filter: &UserFilter,
    ) -> Result<Vec<user_entry::Model>, StoreError> {
        let mut query = user_entry::Entity::find();
        if let Some(user) = filter.user {
            query = query.filter(user_entry::Column::User.eq(user));
        }
        if let Some(chat) = filter.chat {
            query = query.filter(user_entry::Column::Chat.eq(chat));
        }
        if let Some(status) = &filter.status {
            query = query.filter(user_entry::Column::Status.contains(status));
        }

        Ok(query
            .order_by(user_entry::Column::User, Order::Asc)
            .all(&self.db)
            .await?)
    }

    /// Apply a partial update. Chat uniqueness is re-checked, excluding the
    /// entry being updated; status goes through the usual trimming.
    pub async fn update_user(
        &self,
        user: i64,
        patch: &UserPatch,
    ) -> Result<user_entry::Model, StoreError> {
        let existing = self.get_user(user).await?;
        if patch.chat.is_none() && patch.status.is_none() {
            return Ok(existing);
        }

        if let Some(chat) = patch.chat {
            self.check_chat_free(chat, Some(user)).await?;
        }

        let mut active = existing.into_active_model();
        if let Some(chat) = patch.chat {
            active.chat = Set(chat);
        }
        if let Some(status) = &patch.status {
            active.status = Set(normalize_status(status));
        }
        active.update(&self.db).await?;

        self.get_user(user).await
    }

    /// Delete a user entry along with every tag row it owns.
    pub async fn delete_user(&self, user: i64) -> Result<(), StoreError> {
        self.get_user(user).await?;

        sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .exec(&self.db)
            .await?;
        user_entry::Entity::delete_many()
            .filter(user_entry::Column::User.eq(user))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn check_chat_free(
        &self,
        chat: i64,
        exclude_user: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut query = user_entry::Entity::find().filter(user_entry::Column::Chat.eq(chat));
        if let Some(user) = exclude_user {
            query = query.filter(user_entry::Column::User.ne(user));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(ValidationError::DuplicateChat(chat).into());
        }
        Ok(())
    }

    /* Sticker tag entries */

    /// Create one tag row. This is the single-item path: a violated rule
    /// comes back as an error instead of being skipped.
    pub async fn create_entry(
        &self,
        user: i64,
        sticker: &str,
        tag: &str,
        file_id: Option<&str>,
        set_name: Option<&str>,
    ) -> Result<sticker_tag_entry::Model, StoreError> {
        self.get_user(user).await?;

        let sticker = normalize_sticker(sticker);
        let tag = normalize_tag(tag)?;
        self.check_triple_free(user, &sticker, &tag, None).await?;

        let inserted = sticker_tag_entry::Entity::insert(sticker_tag_entry::ActiveModel {
            sticker: Set(sticker),
            user: Set(user),
            tag: Set(tag),
            file_id: Set(file_id.map(|s| s.trim().to_string())),
            set_name: Set(set_name.map(|s| s.trim().to_string())),
            ..Default::default()
        })
        .exec(&self.db)
        .await?;

        self.get_entry(inserted.last_insert_id).await
    }

    pub async fn get_entry(&self, id: i32) -> Result<sticker_tag_entry::Model, StoreError> {
        sticker_tag_entry::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::EntryNotFound(id))
    }

    pub async fn list_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<sticker_tag_entry::Model>, StoreError> {
        let user = match &filter.user {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(user) => Some(user),
                Err(_) => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut query = sticker_tag_entry::Entity::find();
        if let Some(id) = filter.id {
            query = query.filter(sticker_tag_entry::Column::Id.eq(id));
        }
        if let Some(sticker) = &filter.sticker {
            query = query.filter(sticker_tag_entry::Column::Sticker.contains(sticker));
        }
        if let Some(tag) = &filter.tag {
            query = query.filter(sticker_tag_entry::Column::Tag.contains(tag));
        }
        if let Some(file_id) = &filter.file_id {
            query = query.filter(sticker_tag_entry::Column::FileId.contains(file_id));
        }
        if let Some(set_name) = &filter.set_name {
            query = query.filter(sticker_tag_entry::Column::SetName.contains(set_name));
        }
        if let Some(user) = user {
            query = query.filter(sticker_tag_entry::Column::User.eq(user));
        }

        Ok(query
            .order_by(sticker_tag_entry::Column::Sticker, Order::Asc)
            .all(&self.db)
            .await?)
    }

    /// Apply a partial update to one tag row, re-running the normalization
    /// and duplicate check with the row itself excluded.
    pub async fn update_entry(
        &self,
        id: i32,
        patch: &EntryPatch,
    ) -> Result<sticker_tag_entry::Model, StoreError> {
        let existing = self.get_entry(id).await?;

        let sticker = match &patch.sticker {
            Some(raw) => normalize_sticker(raw),
            None => existing.sticker.clone(),
        };
        let tag = match &patch.tag {
            Some(raw) => normalize_tag(raw)?,
            None => existing.tag.clone(),
        };
        self.check_triple_free(existing.user, &sticker, &tag, Some(id))
            .await?;

        let mut active = existing.into_active_model();
        active.sticker = Set(sticker);
        active.tag = Set(tag);
        if let Some(file_id) = &patch.file_id {
            active.file_id = Set(Some(file_id.trim().to_string()));
        }
        if let Some(set_name) = &patch.set_name {
            active.set_name = Set(Some(set_name.trim().to_string()));
        }
        active.update(&self.db).await?;

        self.get_entry(id).await
    }

    pub async fn delete_entry(&self, id: i32) -> Result<(), StoreError> {
        self.get_entry(id).await?;
        sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// The one duplicate check for the (user, sticker, tag) triple.
    /// `exclude_id` skips the row being updated.
    async fn check_triple_free(
        &self,
        user: i64,
        sticker: &str,
        tag: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), StoreError> {
        let mut query = sticker_tag_entry::Entity::find()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .filter(sticker_tag_entry::Column::Sticker.eq(sticker))
            .filter(sticker_tag_entry::Column::Tag.eq(tag));
        if let Some(id) = exclude_id {
            query = query.filter(sticker_tag_entry::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(ValidationError::DuplicateTag {
                user,
                sticker: sticker.to_string(),
                tag: tag.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /* Queries */

    /// Stickers of a user matching any of `tags` (all of them when `tags`
    /// is empty), minus any sticker carrying an excluded tag. The result is
    /// de-duplicated by sticker identity and ordered by sticker. With a
    /// page index the result is windowed at [`PAGE_SIZE`].
    pub async fn filter_stickers(
        &self,
        user: i64,
        tags: &[String],
        exclude_tags: &[String],
        page: Option<usize>,
    ) -> Result<Vec<String>, StoreError> {
        let wanted = normalize_tag_list(tags);

        let mut query =
            sticker_tag_entry::Entity::find().filter(sticker_tag_entry::Column::User.eq(user));
        if !wanted.is_empty() {
            let mut condition = Condition::any();
            for tag in &wanted {
                condition = condition.add(sticker_tag_entry::Column::Tag.eq(tag.as_str()));
            }
            query = query.filter(condition);
        }
        let mut stickers = query
            .order_by(sticker_tag_entry::Column::Sticker, Order::Asc)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|entry| entry.sticker)
            .collect_vec();

        let excluded = normalize_tag_list(exclude_tags);
        if !excluded.is_empty() {
            let shunned = sticker_tag_entry::Entity::find()
                .filter(sticker_tag_entry::Column::User.eq(user))
                .filter(sticker_tag_entry::Column::Tag.is_in(excluded))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|entry| entry.sticker)
                .collect_vec();
            stickers.retain(|sticker| !shunned.contains(sticker));
        }

        let stickers = stickers.into_iter().unique().collect_vec();

        Ok(match page {
            Some(page) => stickers
                .into_iter()
                .skip(page * PAGE_SIZE)
                .take(PAGE_SIZE)
                .collect(),
            None => stickers,
        })
    }

    /// Full user -> stickers -> tags view, stickers in order.
    pub async fn user_sticker_tags(&self, user: i64) -> Result<UserStickerTags, StoreError> {
        let entry = self.get_user(user).await?;

        let rows = sticker_tag_entry::Entity::find()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .order_by(sticker_tag_entry::Column::Sticker, Order::Asc)
            .order_by(sticker_tag_entry::Column::Id, Order::Asc)
            .all(&self.db)
            .await?;

        let grouped = rows.into_iter().group_by(|row| row.sticker.clone());
        let stickers = grouped
            .into_iter()
            .map(|(sticker, group)| StickerTags {
                sticker,
                tags: group.map(|row| row.tag).collect(),
            })
            .collect_vec();

        Ok(UserStickerTags {
            user: entry.user,
            chat: entry.chat,
            status: entry.status,
            stickers,
        })
    }

    /* Batch mutations */

    /// Attach each tag in `tags` to one sticker. Items that fail validation
    /// or already exist are skipped, not fatal.
    pub async fn add_tags(
        &self,
        user: i64,
        sticker: &str,
        tags: &[String],
    ) -> Result<BatchReport, StoreError> {
        self.get_user(user).await?;
        if tags.is_empty() {
            return Err(StoreError::MissingField(strings::TAG_LIST_MISSING));
        }

        let sticker = normalize_sticker(sticker);
        let mut report = BatchReport::default();
        self.add_phase(user, std::slice::from_ref(&sticker), tags, &mut report)
            .await?;
        Ok(report)
    }

    /// Remove every tag row for (user, sticker). Reports how many rows
    /// went away; zero matching rows is a distinct not-found outcome.
    pub async fn delete_sticker(&self, user: i64, sticker: &str) -> Result<u64, StoreError> {
        self.get_user(user).await?;
        let sticker = normalize_sticker(sticker);

        let res = sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .filter(sticker_tag_entry::Column::Sticker.eq(sticker.as_str()))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(StoreError::StickerNotFound);
        }
        Ok(res.rows_affected)
    }

    /// Patch semantics on one sticker: delete the rows whose normalized tag
    /// is in `tags_to_remove`, then run the add phase for `tags_to_add`.
    /// Either list may be empty; the phases are independent.
    pub async fn replace_tags(
        &self,
        user: i64,
        sticker: &str,
        tags_to_remove: &[String],
        tags_to_add: &[String],
    ) -> Result<BatchReport, StoreError> {
        self.get_user(user).await?;
        let sticker = normalize_sticker(sticker);

        let mut report = BatchReport::default();
        if !tags_to_remove.is_empty() {
            let removal = normalize_tag_list(tags_to_remove);
            let res = sticker_tag_entry::Entity::delete_many()
                .filter(sticker_tag_entry::Column::User.eq(user))
                .filter(sticker_tag_entry::Column::Sticker.eq(sticker.as_str()))
                .filter(sticker_tag_entry::Column::Tag.is_in(removal))
                .exec(&self.db)
                .await?;
            report.removed = res.rows_affected;
        }
        if !tags_to_add.is_empty() {
            self.add_phase(user, std::slice::from_ref(&sticker), tags_to_add, &mut report)
                .await?;
        }
        Ok(report)
    }

    /// Tag many stickers with many tags in one call: the full
    /// (sticker x tag) cross product, per-item skips included.
    pub async fn tag_many(
        &self,
        user: i64,
        stickers: &[String],
        tags: &[String],
    ) -> Result<BatchReport, StoreError> {
        self.get_user(user).await?;
        if stickers.is_empty() {
            return Err(StoreError::MissingField(strings::STICKER_LIST_MISSING));
        }
        if tags.is_empty() {
            return Err(StoreError::MissingField(strings::TAG_LIST_MISSING));
        }

        let stickers = stickers.iter().map(|s| normalize_sticker(s)).collect_vec();
        let mut report = BatchReport::default();
        self.add_phase(user, &stickers, tags, &mut report).await?;
        Ok(report)
    }

    /// Delete every tag row for the listed stickers.
    pub async fn delete_many(&self, user: i64, stickers: &[String]) -> Result<u64, StoreError> {
        self.get_user(user).await?;
        if stickers.is_empty() {
            return Err(StoreError::MissingField(strings::STICKER_LIST_MISSING));
        }

        let stickers = stickers.iter().map(|s| normalize_sticker(s)).collect_vec();
        let res = sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .filter(sticker_tag_entry::Column::Sticker.is_in(stickers))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(StoreError::StickerNotFound);
        }
        Ok(res.rows_affected)
    }

    /// Remove a tag set from one sticker. Tags absent from the sticker are
    /// no-ops; the call still succeeds for the rest.
    pub async fn remove_tags(
        &self,
        user: i64,
        sticker: &str,
        tags_to_remove: &[String],
    ) -> Result<u64, StoreError> {
        self.get_user(user).await?;
        if tags_to_remove.is_empty() {
            return Err(StoreError::MissingField(strings::TAG_LIST_MISSING));
        }

        let sticker = normalize_sticker(sticker);
        let removal = normalize_tag_list(tags_to_remove);
        let res = sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .filter(sticker_tag_entry::Column::Sticker.eq(sticker.as_str()))
            .filter(sticker_tag_entry::Column::Tag.is_in(removal))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Remove a tag set from many stickers at once.
    pub async fn remove_tags_many(
        &self,
        user: i64,
        stickers: &[String],
        tags_to_remove: &[String],
    ) -> Result<u64, StoreError> {
        self.get_user(user).await?;
        if tags_to_remove.is_empty() {
            return Err(StoreError::MissingField(strings::TAG_LIST_MISSING));
        }
        if stickers.is_empty() {
            return Err(StoreError::MissingField(strings::STICKER_LIST_MISSING));
        }

        let stickers = stickers.iter().map(|s| normalize_sticker(s)).collect_vec();
        let removal = normalize_tag_list(tags_to_remove);
        let res = sticker_tag_entry::Entity::delete_many()
            .filter(sticker_tag_entry::Column::User.eq(user))
            .filter(sticker_tag_entry::Column::Sticker.is_in(stickers))
            .filter(sticker_tag_entry::Column::Tag.is_in(removal))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Mass replace across many stickers: delete phase over the removal
    /// list, then the (sticker x tag) add phase. An empty addition list
    /// after removal is a no-op success.
    pub async fn mass_replace(
        &self,
        user: i64,
        stickers: &[String],
        tags_to_remove: &[String],
        tags_to_add: &[String],
    ) -> Result<BatchReport, StoreError> {
        self.get_user(user).await?;
        if stickers.is_empty() {
            return Err(StoreError::MissingField(strings::STICKER_LIST_MISSING));
        }

        let stickers = stickers.iter().map(|s| normalize_sticker(s)).collect_vec();
        let mut report = BatchReport::default();
        if !tags_to_remove.is_empty() {
            let removal = normalize_tag_list(tags_to_remove);
            let res = sticker_tag_entry::Entity::delete_many()
                .filter(sticker_tag_entry::Column::User.eq(user))
                .filter(sticker_tag_entry::Column::Sticker.is_in(stickers.clone()))
                .filter(sticker_tag_entry::Column::Tag.is_in(removal))
                .exec(&self.db)
                .await?;
            report.removed = res.rows_affected;
        }
        if !tags_to_add.is_empty() {
            self.add_phase(user, &stickers, tags_to_add, &mut report)
                .await?;
        }
        Ok(report)
    }

    /// Attempt the (sticker x tag) cross product one row at a time.
    /// Validation failures and storage errors are recorded per item;
    /// neither aborts the batch. Stickers must already be trimmed.
    async fn add_phase(
        &self,
        user: i64,
        stickers: &[String],
        tags: &[String],
        report: &mut BatchReport,
    ) -> Result<(), StoreError> {
        for sticker in stickers {
            for raw in tags {
                match self.insert_tag_row(user, sticker, raw).await {
                    Ok(tag) => report.push(sticker.clone(), tag, TagOutcome::Added),
                    Err(StoreError::Validation(e)) => {
                        report.push(sticker.clone(), raw.clone(), TagOutcome::Skipped(e))
                    }
                    Err(StoreError::Database(e)) => {
                        warn!("tag insert failed for user {user}: {e:?}");
                        report.push(sticker.clone(), raw.clone(), TagOutcome::Failed(e.to_string()))
                    }
                    Err(other) => return Err(other),
                }
            }
        }
        Ok(())
    }

    async fn insert_tag_row(
        &self,
        user: i64,
        sticker: &str,
        raw_tag: &str,
    ) -> Result<String, StoreError> {
        let tag = normalize_tag(raw_tag)?;
        self.check_triple_free(user, sticker, &tag, None).await?;

        sticker_tag_entry::Entity::insert(sticker_tag_entry::ActiveModel {
            sticker: Set(sticker.to_string()),
            user: Set(user),
            tag: Set(tag.clone()),
            ..Default::default()
        })
        .exec(&self.db)
        .await?;

        Ok(tag)
    }
}
