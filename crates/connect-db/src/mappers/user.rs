//! User entity <-> model mapper

use connect_core::{Snowflake, User};

use crate::models::UserModel;

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: Snowflake::new(model.id),
            name: model.name,
            handle: model.handle,
            email: model.email,
            avatar_url: model.avatar_url,
            suspended: model.suspended,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_from_model() {
        let model = UserModel {
            id: 42,
            name: "Ada".to_string(),
            handle: "ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar_url: None,
            suspended: true,
            created_at: Utc::now(),
        };

        let user = User::from(model);
        assert_eq!(user.id, Snowflake::new(42));
        assert_eq!(user.handle, "ada");
        assert!(user.suspended);
    }
}
