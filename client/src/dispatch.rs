use std::time::Instant;

use chatlink_core::{
    AttemptPhase, CandidateSchema, ChatError, ChatResponse, DiagnosticRecord, ErrorKind,
    MessageContext, PayloadInput, Reply, formats,
};
use chrono::Utc;

use crate::ChatClient;
use crate::transport::elapsed_ms;

/// One regular attempt plus at most one retry after a validation rejection.
pub const MAX_SEND_ATTEMPTS: usize = 2;

struct Delivered {
    status: u16,
    latency_ms: u64,
    response: ChatResponse,
}

struct Failed {
    latency_ms: u64,
    error: ChatError,
}

impl ChatClient {
    /// Send one user message and always come back with something displayable.
    ///
    /// Only a blank message or a missing credential return a reply without
    /// text. Every other failure is absorbed: the reply carries fallback text
    /// and `degraded = true`, and the details land in the diagnostic ledger.
    pub async fn send(&mut self, message: &str, context: &MessageContext) -> Reply {
        let message = message.trim();
        if message.is_empty() {
            return Reply::hard_failure(ErrorKind::EmptyMessage);
        }
        let Some(token) = self.tokens.bearer_token() else {
            tracing::info!("no bearer token available; send skipped");
            return Reply::hard_failure(ErrorKind::AuthRequired);
        };

        let started = Instant::now();
        let (mut format, mut unverified) = match self.preference.resolved() {
            Some(format) => (format, false),
            None => (formats::default_format(), true),
        };
        let mut last_error = None;

        for attempt in 0..MAX_SEND_ATTEMPTS {
            match self.send_once(format, message, context, &token).await {
                Ok(delivered) => {
                    return self.finish_success(format, unverified, delivered, started);
                }
                Err(failed) => {
                    tracing::warn!(
                        format = %format.name,
                        attempt,
                        kind = %failed.error.kind(),
                        error = %failed.error,
                        "send attempt failed"
                    );
                    self.ledger.append(DiagnosticRecord::failure(
                        format.name,
                        AttemptPhase::Send,
                        failed.error.http_status(),
                        failed.latency_ms,
                        failed.error.to_string(),
                    ));

                    let may_retry = attempt + 1 < MAX_SEND_ATTEMPTS
                        && failed.error.kind() == ErrorKind::ValidationRejected;
                    let latency_ms = failed.latency_ms;
                    last_error = Some(failed);
                    if !may_retry {
                        break;
                    }

                    match self.renegotiate(format, &token).await {
                        Some(next) => {
                            tracing::info!(
                                from = %format.name,
                                to = %next.name,
                                latency_ms,
                                "retrying send with renegotiated format"
                            );
                            format = next;
                            unverified = false;
                        }
                        None => break,
                    }
                }
            }
        }

        let failed = last_error.unwrap_or(Failed {
            latency_ms: 0,
            error: ChatError::Unknown("send attempts exhausted".to_string()),
        });
        self.finish_failure(format, message, context, failed, started)
    }

    async fn send_once(
        &self,
        format: &'static CandidateSchema,
        message: &str,
        context: &MessageContext,
        token: &str,
    ) -> Result<Delivered, Failed> {
        let payload = format.build_payload(&PayloadInput {
            message,
            client_id: self.identity.client_id(),
            conversation_id: self.session.current(),
            context,
            timestamp: Utc::now(),
        });
        let url = format.endpoint(&self.config.message_endpoint());

        tracing::debug!(
            format = %format.name,
            conversation_id = self.session.current().unwrap_or("-"),
            "sending message"
        );
        let timed = self
            .transport
            .post_json(&url, &payload, Some(token), self.config.send_timeout)
            .await;

        let exchange = timed.result.map_err(|error| Failed {
            latency_ms: timed.latency_ms,
            error,
        })?;
        let status = exchange.status;
        let response = exchange.into_chat_response().map_err(|error| Failed {
            latency_ms: timed.latency_ms,
            error,
        })?;

        Ok(Delivered {
            status,
            latency_ms: timed.latency_ms,
            response,
        })
    }

    /// Re-probe after a validation rejection. Returns a format to retry with
    /// only if the sweep cached one different from the format that just failed.
    async fn renegotiate(
        &mut self,
        failed_format: &'static CandidateSchema,
        token: &str,
    ) -> Option<&'static CandidateSchema> {
        self.probe_all(Some(token)).await;
        self.preference
            .resolved()
            .filter(|candidate| candidate.name != failed_format.name)
    }

    fn finish_success(
        &mut self,
        format: &'static CandidateSchema,
        unverified: bool,
        delivered: Delivered,
        started: Instant,
    ) -> Reply {
        let Delivered {
            status,
            latency_ms,
            response,
        } = delivered;

        if let Some(id) = response.conversation_id.as_deref() {
            self.session.adopt(id);
        }
        if unverified {
            self.preference.set(format.name);
        }
        self.ledger.append(DiagnosticRecord::success(
            format.name,
            AttemptPhase::Send,
            status,
            latency_ms,
        ));
        self.health.record_success(latency_ms);

        Reply {
            success: true,
            text: response.text().unwrap_or_default().to_string(),
            conversation_id: self.session.current().map(str::to_string),
            tokens_used: response.tokens_used,
            latency_ms: elapsed_ms(started),
            degraded: false,
            error: None,
            format: Some(format.name.to_string()),
            confidence_score: response.confidence_score,
            processing_time_ms: response.processing_time_ms,
        }
    }

    fn finish_failure(
        &mut self,
        format: &'static CandidateSchema,
        message: &str,
        context: &MessageContext,
        failed: Failed,
        started: Instant,
    ) -> Reply {
        self.health.record_failure(&failed.error, failed.latency_ms);
        let text = self.fallback.generate(message, context);

        let mut reply = Reply::degraded(text, failed.error.kind().code(), elapsed_ms(started));
        reply.format = Some(format.name.to_string());
        reply.conversation_id = self.session.current().map(str::to_string);
        reply
    }
}
