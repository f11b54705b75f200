//! Minimal payload shapes for the six typed dispatch helpers (spec §4.4).
//!
//! The spec treats individual event payload schemas as out of scope, but the
//! typed helpers need *some* concrete type to parse `data` into; these are
//! inferred from the event codes' own naming and the worked example in
//! spec §8.5.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageBody {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: MessageContent,
}

/// `kso.app_chat.message.create`
#[derive(Debug, Clone, Deserialize)]
pub struct AppChatMessageCreate {
    pub company_id: String,
    pub chat: ChatRef,
    pub sender: SenderRef,
    pub send_time: i64,
    pub message: MessageBody,
}

/// `kso.app_chat.create`
#[derive(Debug, Clone, Deserialize)]
pub struct AppChatCreate {
    pub company_id: String,
    pub chat: ChatRef,
    pub creator: SenderRef,
}

/// `kso.xz.app.group_chat.delete`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupChatDelete {
    pub company_id: String,
    pub chat: ChatRef,
}

/// Shared body for the group-chat member add/remove events.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupChatMemberChange {
    pub company_id: String,
    pub chat: ChatRef,
    pub member: SenderRef,
}
