//! Matching of responses to the requests waiting for them.

use std::collections::HashMap;
use std::future::poll_fn;
use std::time::Duration;

use chatline_protocol::{encode, Message, MessageType, StatusOutcome};
use chatline_transport::Socket;
use tokio::sync::oneshot;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, trace, warn};

use crate::error::{ChatError, Result};

/// Completion handle of one request.
pub(crate) type Reply = oneshot::Sender<Result<Message>>;

struct PendingRequest {
    kind: MessageType,
    reply: Reply,
    deadline: Option<delay_queue::Key>,
}

/// Assigns correlation ids and owns every request waiting for its response.
///
/// An entry leaves the map exactly once, before its reply is sent, so no
/// request can be resolved twice.
pub(crate) struct Correlator {
    next_id: u64,
    pending: HashMap<String, PendingRequest>,
    deadlines: DelayQueue<String>,
    request_timeout: Option<Duration>,
}

impl Correlator {
    pub(crate) fn new(request_timeout: Option<Duration>) -> Self {
        Self {
            next_id: 0,
            pending: HashMap::new(),
            deadlines: DelayQueue::new(),
            request_timeout,
        }
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    fn take(&mut self, id: &str) -> Option<PendingRequest> {
        let entry = self.pending.remove(id)?;
        if let Some(key) = &entry.deadline {
            self.deadlines.remove(key);
        }
        Some(entry)
    }

    /// Assign the next id to `message`, register it and write it to `socket`.
    ///
    /// If the frame cannot be encoded or written, the reply fails right away
    /// and nothing stays pending.
    pub(crate) fn dispatch(&mut self, message: Message, reply: Reply, socket: &Socket) {
        let id = self.next_id.to_string();
        self.next_id += 1;

        let message = message.with_id(id.clone());
        let text = match encode(&message) {
            Ok(text) => text,
            Err(err) => {
                let _ = reply.send(Err(err.into()));
                return;
            }
        };

        let deadline = self
            .request_timeout
            .map(|timeout| self.deadlines.insert(id.clone(), timeout));
        self.pending.insert(
            id.clone(),
            PendingRequest {
                kind: message.kind.clone(),
                reply,
                deadline,
            },
        );

        debug!(%id, kind = %message.kind, pending = self.pending.len(), "sending request");
        trace!(%id, frame = %text, "frame [out]");
        if let Err(err) = socket.send_text(text) {
            warn!(%id, error = %err, "request could not be written");
            self.fail(&id, err.into());
        }
    }

    /// Settle the request `response` answers.
    ///
    /// Responses without an id, or whose id matches nothing pending, are
    /// logged and dropped.
    pub(crate) fn resolve(&mut self, response: Message) {
        let Some(id) = response.id.clone() else {
            warn!(kind = %response.kind, "dropping response without id");
            return;
        };
        let Some(entry) = self.take(&id) else {
            warn!(%id, kind = %response.kind, "dropping unmatched response");
            return;
        };

        let outcome = match response.outcome() {
            StatusOutcome::Ok => Ok(response),
            StatusOutcome::Ko(why) => Err(ChatError::Rejected {
                kind: response.kind.clone(),
                why,
            }),
            StatusOutcome::Unsupported(status) => Err(ChatError::UnsupportedStatus { status }),
        };

        debug!(
            %id,
            request = %entry.kind,
            ok = outcome.is_ok(),
            pending = self.pending.len(),
            "request settled"
        );
        if entry.reply.send(outcome).is_err() {
            trace!(%id, "caller no longer waiting");
        }
    }

    /// Fail one pending request. Returns false if `id` is not pending.
    pub(crate) fn fail(&mut self, id: &str, error: ChatError) -> bool {
        match self.take(id) {
            Some(entry) => {
                let _ = entry.reply.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Fail every pending request with a connection-lost error.
    pub(crate) fn fail_all(&mut self, reason: &str) -> usize {
        self.fail_all_with(|| ChatError::ConnectionLost {
            reason: reason.to_string(),
        })
    }

    pub(crate) fn fail_all_with(&mut self, error: impl Fn() -> ChatError) -> usize {
        let failed = self.pending.len();
        for (_, entry) in self.pending.drain() {
            let _ = entry.reply.send(Err(error()));
        }
        self.deadlines.clear();
        failed
    }

    /// Fail a request whose deadline passed.
    pub(crate) fn expire(&mut self, id: &str) {
        // The deadline key is already spent; only the map entry remains.
        let Some(entry) = self.pending.remove(id) else {
            return;
        };
        let timeout = self.request_timeout.unwrap_or_default();
        warn!(%id, request = %entry.kind, ?timeout, "request timed out");
        let _ = entry.reply.send(Err(ChatError::Timeout(timeout)));
    }

    pub(crate) fn has_deadlines(&self) -> bool {
        !self.deadlines.is_empty()
    }

    /// Wait for the next request deadline to pass.
    ///
    /// Resolves to `None` immediately when no deadline is set; guard with
    /// [`Correlator::has_deadlines`].
    pub(crate) async fn next_expired(&mut self) -> Option<String> {
        poll_fn(|cx| self.deadlines.poll_expired(cx))
            .await
            .map(|expired| expired.into_inner())
    }
}
