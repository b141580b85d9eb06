//! Chat list aggregation.
//!
//! A user's chat list is derived from the message log on every request:
//! one entry per counterparty, carrying the counterparty's current profile,
//! the last message exchanged and an unread count. Nothing here writes, and
//! nothing is cached.

use std::collections::HashSet;

use tracing::{debug, warn};

use murmur_shared::{ConversationSummary, UserId};
use murmur_store::{ChatStore, Message};

use crate::error::ServerError;

/// Build the chat list for `user_id`, most recent conversation first.
///
/// Fails with [`ServerError::NotFound`] if `user_id` is not in the
/// directory. Counterparties that have since vanished from the directory
/// are left out rather than failing the call.
pub fn list_conversations(
    store: &dyn ChatStore,
    user_id: UserId,
) -> Result<Vec<ConversationSummary>, ServerError> {
    if store.get_user(user_id)?.is_none() {
        return Err(ServerError::NotFound(format!("user {user_id}")));
    }

    let involving = store.messages_involving(user_id)?;
    let counterparties = counterparties_in_order(&involving, user_id);

    let mut chats = Vec::with_capacity(counterparties.len());
    for other in counterparties {
        let history = store.messages_between(user_id, other)?;
        let Some(last) = history.last() else {
            debug!(user = %user_id, counterparty = %other, "empty history, skipping");
            continue;
        };

        let Some(profile) = store.get_user(other)? else {
            warn!(user = %user_id, counterparty = %other, "counterparty missing from directory, skipping");
            continue;
        };

        chats.push(ConversationSummary {
            counterparty_id: profile.id,
            counterparty_username: profile.username,
            counterparty_online: profile.is_online,
            counterparty_display_name: profile.name,
            counterparty_avatar: profile.profile_picture,
            last_message_content: last.content.clone(),
            last_message_timestamp: last.timestamp,
            unread_count: unread_count(&history, user_id),
        });
    }

    // Stable: equal timestamps keep first-appearance order.
    chats.sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp));

    debug!(user = %user_id, chats = chats.len(), "chat list built");
    Ok(chats)
}

/// Distinct counterparties, in the order they first show up in `messages`.
fn counterparties_in_order(messages: &[Message], user_id: UserId) -> Vec<UserId> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .map(|m| m.counterparty_of(user_id))
        .filter(|other| seen.insert(*other))
        .collect()
}

/// Messages received by `user_id` with a timestamp strictly after the
/// user's own latest sent message. If the user never sent one, every
/// received message counts.
///
/// `history` must be the ordered history of a single pair.
fn unread_count(history: &[Message], user_id: UserId) -> usize {
    let last_sent = history.iter().rev().find(|m| m.sender_id == user_id);

    history
        .iter()
        .filter(|m| m.receiver_id == user_id)
        .filter(|m| last_sent.map_or(true, |sent| m.timestamp > sent.timestamp))
        .count()
}
