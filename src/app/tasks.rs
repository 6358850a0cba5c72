//! Running one agent turn on a worker task while the UI stays responsive.
//!
//! The agent's event callback only forwards into a channel. This loop owns
//! the terminal: it renders events, turns input lines into approval answers
//! while a write is pending, and maps Ctrl-C onto the turn's cancel signal.

use crate::app::approval::parse_approval_decision;
use apiprobe::agent::{Agent, AgentEvent, EventCallback};
use apiprobe::error::AgentError;
use apiprobe::ui::Renderer;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::{mpsc, watch};

/// How a turn ended. Answers and model errors are already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnOutcome {
    Answered,
    Failed,
    Cancelled,
}

/// Messages from the worker side to the UI loop.
#[derive(Debug)]
enum TurnMessage {
    Event(AgentEvent),
    ConfirmationTimedOut,
}

/// Run `prompt` to completion, reading approvals from `input`.
///
/// The first Ctrl-C asks the agent to stop after its current step and
/// rejects any pending write; a second one aborts the worker outright.
pub(crate) async fn drive_turn<R>(
    renderer: &Renderer,
    agent: &Arc<Agent>,
    prompt: String,
    input: &mut Lines<R>,
) -> TurnOutcome
where
    R: AsyncBufRead + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let gate = agent.confirmation_gate().clone();

    let timeout_tx = tx.clone();
    gate.set_timeout_callback(Some(Arc::new(move || {
        let _ = timeout_tx.send(TurnMessage::ConfirmationTimedOut);
    })));
    let on_event: EventCallback = Arc::new(move |event| {
        let _ = tx.send(TurnMessage::Event(event));
    });

    let worker = Arc::clone(agent);
    let mut handle = tokio::spawn(async move {
        worker
            .process_message_with_events(&prompt, cancel_rx, on_event)
            .await
    });

    let mut input_open = true;
    let joined = loop {
        tokio::select! {
            biased;
            Some(message) = rx.recv() => render_message(renderer, message),
            joined = &mut handle => break joined,
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => {
                    if gate.is_pending() {
                        match parse_approval_decision(&line) {
                            Some(approved) => gate.send_response(approved),
                            None => {
                                renderer.warn("answer y or n");
                                renderer.prompt(true);
                            }
                        }
                    } else if !line.trim().is_empty() {
                        renderer.warn("a request is still running; press Ctrl-C to cancel it");
                    }
                }
                Ok(None) | Err(_) => {
                    input_open = false;
                    gate.cancel();
                }
            },
            _ = tokio::signal::ctrl_c() => {
                if *cancel_tx.borrow() {
                    handle.abort();
                } else {
                    let _ = cancel_tx.send(true);
                    gate.cancel();
                    renderer.notice("cancelling after the current step (Ctrl-C again to abort)");
                }
            }
        }
    };

    while let Ok(message) = rx.try_recv() {
        render_message(renderer, message);
    }
    gate.set_timeout_callback(None);

    match joined {
        Ok(Ok(_)) => TurnOutcome::Answered,
        Ok(Err(AgentError::Cancelled)) => {
            renderer.warn("request cancelled");
            TurnOutcome::Cancelled
        }
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "turn failed");
            TurnOutcome::Failed
        }
        Err(err) if err.is_cancelled() => {
            renderer.warn("request aborted");
            TurnOutcome::Cancelled
        }
        Err(err) => {
            renderer.error(&format!("agent task failed: {err}"));
            TurnOutcome::Failed
        }
    }
}

fn render_message(renderer: &Renderer, message: TurnMessage) {
    match message {
        TurnMessage::Event(event) => {
            let needs_answer = matches!(event, AgentEvent::ConfirmationRequired(_));
            renderer.render_event(&event);
            if needs_answer {
                renderer.prompt(true);
            }
        }
        TurnMessage::ConfirmationTimedOut => {
            renderer.warn("no answer before the confirmation timeout; the write was rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe::api::LlmClient;
    use apiprobe::config::DisplayConfig;
    use apiprobe::error::ApiError;
    use apiprobe::tools::ToolRegistry;
    use apiprobe::types::Message;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::io::{AsyncBufReadExt, BufReader};

    struct Replies(Mutex<VecDeque<Result<String, ApiError>>>);

    #[async_trait]
    impl LlmClient for Replies {
        async fn chat(&self, _messages: &[Message]) -> Result<String, ApiError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::InvalidResponse("no reply".into())))
        }
    }

    fn agent(replies: Vec<Result<String, ApiError>>) -> Arc<Agent> {
        Arc::new(Agent::new(
            Arc::new(Replies(Mutex::new(replies.into()))),
            Arc::new(ToolRegistry::new()),
        ))
    }

    fn renderer() -> Renderer {
        Renderer::new(&DisplayConfig {
            color: false,
            ..DisplayConfig::default()
        })
    }

    #[tokio::test]
    async fn answered_turn_reports_success() {
        let agent = agent(vec![Ok("Final Answer: 200 OK".into())]);
        let mut input = BufReader::new(&b""[..]).lines();
        let outcome = drive_turn(&renderer(), &agent, "ping".into(), &mut input).await;
        assert_eq!(outcome, TurnOutcome::Answered);
        assert_eq!(agent.history_len(), 2);
    }

    #[tokio::test]
    async fn model_failure_reports_failed() {
        let agent = agent(vec![Err(ApiError::Status {
            code: 500,
            body: "boom".into(),
        })]);
        let mut input = BufReader::new(&b""[..]).lines();
        let outcome = drive_turn(&renderer(), &agent, "ping".into(), &mut input).await;
        assert_eq!(outcome, TurnOutcome::Failed);
    }

    #[tokio::test]
    async fn stray_input_during_a_turn_is_ignored() {
        let agent = agent(vec![Ok("Final Answer: done".into())]);
        let mut input = BufReader::new(&b"what now?\n"[..]).lines();
        let outcome = drive_turn(&renderer(), &agent, "ping".into(), &mut input).await;
        assert_eq!(outcome, TurnOutcome::Answered);
    }
}
