//! One-shot mode: run a single prompt and exit.

use crate::app::tasks::{drive_turn, TurnOutcome};
use apiprobe::agent::Agent;
use apiprobe::ui::Renderer;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run `prompt` as one turn. Exit code 0 only when the turn answered.
pub(crate) async fn run_exec_mode(renderer: &Renderer, agent: &Arc<Agent>, prompt: String) -> i32 {
    // Approvals for file writes still come from stdin.
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    exit_code(drive_turn(renderer, agent, prompt, &mut input).await)
}

fn exit_code(outcome: TurnOutcome) -> i32 {
    match outcome {
        TurnOutcome::Answered => 0,
        TurnOutcome::Failed => 1,
        TurnOutcome::Cancelled => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_answers_exit_cleanly() {
        assert_eq!(exit_code(TurnOutcome::Answered), 0);
        assert_eq!(exit_code(TurnOutcome::Failed), 1);
        assert_eq!(exit_code(TurnOutcome::Cancelled), 130);
    }
}
