//! Chat entity <-> model mapper

use connect_core::{Chat, Snowflake};

use crate::models::ChatModel;

impl From<ChatModel> for Chat {
    fn from(model: ChatModel) -> Self {
        Chat {
            id: Snowflake::new(model.id),
            group: model.is_group,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
