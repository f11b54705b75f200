//! Event-code → handler mapping, with an optional fallback and typed
//! registration helpers (spec §4.4).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::event::{Event, TypedEvent};
use crate::payloads::{
    AppChatCreate, AppChatMessageCreate, GroupChatDelete, GroupChatMemberChange,
};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type HandlerFn = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

/// Maps event codes to handlers, with at most one fallback.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerFn>,
    fallback: Option<HandlerFn>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_code`, overwriting any prior entry.
    /// Chainable.
    pub fn on<F, Fut>(mut self, event_code: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers
            .insert(event_code.into(), Arc::new(move |e| Box::pin(handler(e))));
        self
    }

    /// Register a fallback invoked when no specific handler matches.
    /// Chainable.
    pub fn with_fallback<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.fallback = Some(Arc::new(move |e| Box::pin(handler(e))));
        self
    }

    pub fn has_handler(&self, event_code: &str) -> bool {
        self.handlers.contains_key(event_code)
    }

    /// Register a typed handler: the payload is parsed as JSON into `T`
    /// before the callback runs; parse failures propagate (spec §4.4).
    fn on_typed<T, F, Fut>(self, event_code: &'static str, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(TypedEvent<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.on(event_code, move |event| {
            let handler = handler.clone();
            async move {
                let parsed_data: T = serde_json::from_str(&event.data)?;
                handler(TypedEvent { event, parsed_data }).await
            }
        })
    }

    pub fn on_v7_app_chat_message_create<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<AppChatMessageCreate>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.app_chat.message.create", handler)
    }

    pub fn on_v7_app_chat_create<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<AppChatCreate>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.app_chat.create", handler)
    }

    pub fn on_v7_group_chat_delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<GroupChatDelete>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.xz.app.group_chat.delete", handler)
    }

    pub fn on_v7_group_chat_member_user_create<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<GroupChatMemberChange>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.xz.app.group_chat.member.user.create", handler)
    }

    pub fn on_v7_group_chat_member_user_delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<GroupChatMemberChange>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.xz.app.group_chat.member.user.delete", handler)
    }

    pub fn on_v7_group_chat_member_robot_create<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<GroupChatMemberChange>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.xz.app.group_chat.member.robot.create", handler)
    }

    pub fn on_v7_group_chat_member_robot_delete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(TypedEvent<GroupChatMemberChange>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_typed("kso.xz.app.group_chat.member.robot.delete", handler)
    }

    /// Dispatch `event` to its handler (specific code match, else
    /// fallback, else a silent no-op). Handler errors propagate to the
    /// caller, which turns them into a 500 ACK.
    pub(crate) async fn dispatch(&self, event: Event) -> Result<()> {
        if let Some(handler) = self.handlers.get(&event.event_code) {
            return handler(event).await;
        }
        if let Some(fallback) = &self.fallback {
            return fallback(event).await;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.handlers.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Guard used by [`crate::client`] at `start()` time: exactly one of
/// handler/dispatcher must be configured (spec §4.4/§6).
pub(crate) fn require_configured(dispatcher: &Dispatcher) -> Result<()> {
    if dispatcher.handlers.is_empty() && dispatcher.fallback.is_none() {
        return Err(Error::HandlerNotSetError);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn specific_handler_wins_over_fallback() {
        let specific_hits = Arc::new(AtomicUsize::new(0));
        let fallback_hits = Arc::new(AtomicUsize::new(0));
        let s = specific_hits.clone();
        let f = fallback_hits.clone();

        let dispatcher = Dispatcher::new()
            .on("a.b", move |_| {
                let s = s.clone();
                async move {
                    s.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_fallback(move |_| {
                let f = f.clone();
                async move {
                    f.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });

        dispatcher
            .dispatch(Event::new("a".into(), "b".into(), 1, "{}".into()))
            .await
            .unwrap();

        assert_eq!(specific_hits.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unmatched_event_invokes_fallback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let dispatcher = Dispatcher::new().with_fallback(move |_| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        dispatcher
            .dispatch(Event::new("x".into(), "y".into(), 1, "{}".into()))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unmatched_event_with_no_fallback_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .dispatch(Event::new("x".into(), "y".into(), 1, "{}".into()))
            .await
            .unwrap();
    }

    #[test]
    fn has_handler_reflects_registration() {
        let dispatcher = Dispatcher::new().on("a.b", |_| async { Ok(()) });
        assert!(dispatcher.has_handler("a.b"));
        assert!(!dispatcher.has_handler("c.d"));
    }

    #[tokio::test]
    async fn typed_dispatch_parses_payload() {
        let got_chat_id = Arc::new(std::sync::Mutex::new(String::new()));
        let g = got_chat_id.clone();
        let dispatcher = Dispatcher::new().on_v7_app_chat_message_create(move |typed| {
            let g = g.clone();
            async move {
                *g.lock().unwrap() = typed.parsed_data.chat.id.clone();
                Ok(())
            }
        });

        let data = r#"{
            "company_id": "c",
            "chat": {"id": "x", "type": "single"},
            "sender": {"type": "user", "id": "u"},
            "send_time": 1,
            "message": {"id": "m", "type": "text", "content": {"text": "hi"}}
        }"#;
        dispatcher
            .dispatch(Event::new(
                "kso.app_chat.message".into(),
                "create".into(),
                1,
                data.into(),
            ))
            .await
            .unwrap();
        assert_eq!(*got_chat_id.lock().unwrap(), "x");
    }

    #[tokio::test]
    async fn typed_dispatch_parse_error_propagates() {
        let dispatcher =
            Dispatcher::new().on_v7_app_chat_message_create(|_| async { Ok(()) });
        let result = dispatcher
            .dispatch(Event::new(
                "kso.app_chat.message".into(),
                "create".into(),
                1,
                "not json".into(),
            ))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn require_configured_rejects_empty_dispatcher() {
        assert!(require_configured(&Dispatcher::new()).is_err());
    }

    #[test]
    fn require_configured_accepts_fallback_only() {
        let dispatcher = Dispatcher::new().with_fallback(|_| async { Ok(()) });
        assert!(require_configured(&dispatcher).is_ok());
    }
}
