//! Inbound message demultiplexing: event vs. goaway vs. server ping
//! (spec §4.6).

use crate::cipher::decrypt;
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::event::{AckMessage, Event, EventMessage, FrameTag, GoAwayMessage, GoAwayReason};
use crate::logger::LogSink;
use crate::signer::verify_event_signature;

/// Outcome of processing one inbound text frame.
pub(crate) enum FrameOutcome {
    /// Nothing further to do; keep reading.
    Handled,
    /// An ACK should be sent back on the socket.
    Ack(AckMessage),
    /// A GoAway was observed; carries the parsed reason/hint so the
    /// lifecycle controller can update policy and tear down.
    GoAway(GoAwayMessage),
}

/// Process one inbound text frame per spec §4.6. `received_goaway` gates the
/// strict drop-after-goaway semantics this crate adopts (see DESIGN.md).
pub(crate) async fn handle_frame(
    cfg: &ClientConfig,
    dispatcher: &Dispatcher,
    log: &LogSink,
    received_goaway: bool,
    raw: &str,
) -> FrameOutcome {
    if received_goaway {
        log.debug("dropping frame received after goaway");
        return FrameOutcome::Handled;
    }

    let tag: FrameTag = match serde_json::from_str(raw) {
        Ok(tag) => tag,
        Err(e) => {
            log.error(format!("failed to parse inbound frame: {e}"));
            return FrameOutcome::Handled;
        }
    };

    if tag.r#type.as_deref() == Some("goaway") {
        return match serde_json::from_str::<GoAwayMessage>(raw) {
            Ok(goaway) => {
                log.info(format!("received goaway: reason={:?}", goaway.reason));
                FrameOutcome::GoAway(goaway)
            }
            Err(e) => {
                log.error(format!("failed to parse goaway frame: {e}"));
                FrameOutcome::Handled
            }
        };
    }

    let topic = tag.topic.unwrap_or_default();
    let operation = tag.operation.unwrap_or_default();
    if topic.is_empty() || operation.is_empty() {
        log.error("dropping frame with empty topic/operation");
        return FrameOutcome::Handled;
    }

    let wire: EventMessage = match serde_json::from_str(raw) {
        Ok(wire) => wire,
        Err(e) => {
            log.error(format!("failed to parse event frame: {e}"));
            return FrameOutcome::Handled;
        }
    };

    if !verify_event_signature(
        &cfg.app_id,
        &cfg.app_secret,
        &wire.topic,
        &wire.nonce,
        wire.time,
        &wire.encrypted_data,
        &wire.signature,
    ) {
        log.error(format!("signature mismatch for event {topic}.{operation}"));
        return FrameOutcome::Handled;
    }

    let plaintext = match decrypt(&cfg.app_secret, &wire.encrypted_data, &wire.nonce) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            log.error(format!("decrypt failed for event {topic}.{operation}: {e}"));
            return FrameOutcome::Handled;
        }
    };

    let event = Event::new(wire.topic, wire.operation, wire.time, plaintext);
    let dispatch_result = dispatcher.dispatch(event).await;

    if !cfg.ack_mode || wire.nonce.is_empty() {
        if let Err(e) = dispatch_result {
            log.error(format!("handler error (no ack, ack_mode disabled): {e}"));
        }
        return FrameOutcome::Handled;
    }

    let ack = match dispatch_result {
        Ok(()) => AckMessage::ok(wire.nonce),
        Err(e) => AckMessage::error(wire.nonce, e.to_string()),
    };
    FrameOutcome::Ack(ack)
}

/// Whether a GoAway disables further reconnection on this client instance
/// (spec §4.6 step 2 / §7).
pub(crate) fn disables_reconnect(goaway: &GoAwayMessage) -> bool {
    goaway.reason == GoAwayReason::ConnectionReplaced
}
