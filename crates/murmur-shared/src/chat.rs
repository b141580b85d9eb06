use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// One row of a user's chat list: the other participant as they look right
/// now, plus the latest message of the pair and how many messages arrived
/// since the user last replied.
///
/// Never persisted. Rebuilt from the message store on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub counterparty_id: UserId,
    pub counterparty_username: String,
    pub counterparty_online: bool,
    pub counterparty_display_name: Option<String>,
    pub counterparty_avatar: Option<String>,
    pub last_message_content: String,
    pub last_message_timestamp: DateTime<Utc>,
    pub unread_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_camel_case_wire_format() {
        let summary = ConversationSummary {
            counterparty_id: UserId(2),
            counterparty_username: "bob".into(),
            counterparty_online: true,
            counterparty_display_name: None,
            counterparty_avatar: Some("https://example.org/b.png".into()),
            last_message_content: "hello".into(),
            last_message_timestamp: Utc.timestamp_millis_opt(200).unwrap(),
            unread_count: 1,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["counterpartyId"], 2);
        assert_eq!(json["counterpartyUsername"], "bob");
        assert_eq!(json["counterpartyOnline"], true);
        assert!(json["counterpartyDisplayName"].is_null());
        assert_eq!(json["lastMessageContent"], "hello");
        assert_eq!(json["unreadCount"], 1);
    }
}
