//! Message entity <-> model mappers

use connect_core::{Message, MessageView, Snowflake, UserSummary};

use crate::models::{MessageModel, MessageWithSenderModel};

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            chat_id: Snowflake::new(model.chat_id),
            sender_id: Snowflake::new(model.sender_id),
            content: model.content,
            media: model.media.0,
            created_at: model.created_at,
            read_at: model.read_at,
        }
    }
}

impl From<MessageWithSenderModel> for MessageView {
    fn from(model: MessageWithSenderModel) -> Self {
        let sender = UserSummary {
            id: Snowflake::new(model.sender_id),
            name: model.sender_name,
            handle: model.sender_handle,
            avatar_url: model.sender_avatar_url,
        };

        let message = Message {
            id: Snowflake::new(model.id),
            chat_id: Snowflake::new(model.chat_id),
            sender_id: Snowflake::new(model.sender_id),
            content: model.content,
            media: model.media.0,
            created_at: model.created_at,
            read_at: model.read_at,
        };

        MessageView { message, sender }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    #[test]
    fn test_message_from_model() {
        let model = MessageModel {
            id: 1,
            chat_id: 2,
            sender_id: 3,
            content: "hi".to_string(),
            media: Json(vec![]),
            created_at: Utc::now(),
            read_at: None,
        };

        let message = Message::from(model);
        assert_eq!(message.id, Snowflake::new(1));
        assert_eq!(message.chat_id, Snowflake::new(2));
        assert!(message.media.is_empty());
    }

    #[test]
    fn test_view_from_joined_model() {
        let model = MessageWithSenderModel {
            id: 1,
            chat_id: 2,
            sender_id: 3,
            content: "hi".to_string(),
            media: Json(vec![]),
            created_at: Utc::now(),
            read_at: None,
            sender_name: "Ada".to_string(),
            sender_handle: "ada".to_string(),
            sender_avatar_url: None,
        };

        let view = MessageView::from(model);
        assert_eq!(view.sender.id, view.message.sender_id);
        assert_eq!(view.sender.handle, "ada");
    }
}
