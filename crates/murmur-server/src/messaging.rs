//! Sending messages and reading a two-person thread.

use tracing::info;

use murmur_shared::validation::validate_message_content;
use murmur_shared::{UserId, ValidationError};
use murmur_store::{ChatStore, Message, NewMessage, User};

use crate::error::ServerError;

/// Append a message from `sender_id` to `receiver_id`.
///
/// Nothing is written unless the input validates and both users exist.
/// Sending to yourself is allowed. Content is stored untrimmed.
pub fn send_message(
    store: &dyn ChatStore,
    sender_id: UserId,
    receiver_id: Option<UserId>,
    content: &str,
    max_len: usize,
) -> Result<Message, ServerError> {
    let receiver_id = receiver_id.ok_or(ValidationError::MissingField("receiverId"))?;
    validate_message_content(content, max_len)?;

    require_user(store, sender_id)?;
    require_user(store, receiver_id)?;

    let message = store.append_message(NewMessage {
        sender_id,
        receiver_id,
        content: content.to_string(),
    })?;

    info!(
        message_id = %message.id,
        sender = %sender_id,
        receiver = %receiver_id,
        "message sent"
    );
    Ok(message)
}

/// Every message between the two users, oldest first.
pub fn conversation_thread(
    store: &dyn ChatStore,
    user_id: UserId,
    other_id: UserId,
) -> Result<Vec<Message>, ServerError> {
    require_user(store, user_id)?;
    require_user(store, other_id)?;
    Ok(store.messages_between(user_id, other_id)?)
}

pub(crate) fn require_user(store: &dyn ChatStore, id: UserId) -> Result<User, ServerError> {
    store
        .get_user(id)?
        .ok_or_else(|| ServerError::NotFound(format!("user {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::list_conversations;
    use murmur_store::{MemoryStore, NewUser};

    fn store_with_pair() -> (MemoryStore, UserId, UserId) {
        let store = MemoryStore::new();
        let a = store.create_user(NewUser::named("a")).unwrap().id;
        let b = store.create_user(NewUser::named("b")).unwrap().id;
        (store, a, b)
    }

    #[test]
    fn test_send_then_list_reflects_message() {
        let (store, a, b) = store_with_pair();
        let sent = send_message(&store, a, Some(b), "fresh", 100).unwrap();

        let chats = list_conversations(&store, a).unwrap();
        assert_eq!(chats[0].last_message_content, "fresh");
        assert_eq!(chats[0].last_message_timestamp, sent.timestamp);
    }

    #[test]
    fn test_empty_content_creates_nothing() {
        let (store, a, b) = store_with_pair();
        for content in ["", "   ", "\n\t"] {
            let err = send_message(&store, a, Some(b), content, 100).unwrap_err();
            assert!(matches!(
                err,
                ServerError::Validation(ValidationError::EmptyContent)
            ));
        }
        assert!(store.messages_involving(a).unwrap().is_empty());
    }

    #[test]
    fn test_missing_receiver_is_validation_error() {
        let (store, a, _) = store_with_pair();
        let err = send_message(&store, a, None, "hi", 100).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Validation(ValidationError::MissingField("receiverId"))
        ));
    }

    #[test]
    fn test_too_long_content_rejected() {
        let (store, a, b) = store_with_pair();
        let err = send_message(&store, a, Some(b), "abcdef", 5).unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[test]
    fn test_unknown_users_are_not_found() {
        let (store, a, _) = store_with_pair();
        let ghost = UserId(99);
        assert!(matches!(
            send_message(&store, a, Some(ghost), "hi", 100),
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(
            send_message(&store, ghost, Some(a), "hi", 100),
            Err(ServerError::NotFound(_))
        ));
        assert!(store.messages_involving(a).unwrap().is_empty());
    }

    #[test]
    fn test_content_kept_verbatim() {
        let (store, a, b) = store_with_pair();
        let sent = send_message(&store, a, Some(b), "  padded  ", 100).unwrap();
        assert_eq!(sent.content, "  padded  ");
    }

    #[test]
    fn test_self_message_allowed() {
        let (store, a, _) = store_with_pair();
        let sent = send_message(&store, a, Some(a), "memo", 100).unwrap();
        assert_eq!(sent.sender_id, sent.receiver_id);
    }

    #[test]
    fn test_thread_is_oldest_first() {
        let (store, a, b) = store_with_pair();
        send_message(&store, a, Some(b), "1", 100).unwrap();
        send_message(&store, b, Some(a), "2", 100).unwrap();
        send_message(&store, a, Some(b), "3", 100).unwrap();

        let thread: Vec<_> = conversation_thread(&store, b, a)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(thread, ["1", "2", "3"]);
    }
}
