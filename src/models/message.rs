use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub url: String,
    pub public_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub attachment: Option<Attachment>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Deterministic id for the conversation between two users, independent
    /// of who sends first.
    pub fn conversation_id(user_a: &Uuid, user_b: &Uuid) -> String {
        let mut ids = [user_a.to_string(), user_b.to_string()];
        ids.sort();
        ids.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            Message::conversation_id(&a, &b),
            Message::conversation_id(&b, &a)
        );
    }

    #[test]
    fn conversation_id_joins_sorted_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let id = Message::conversation_id(&a, &b);
        let mut expected = [a.to_string(), b.to_string()];
        expected.sort();
        assert_eq!(id, expected.join("_"));
    }
}
