use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::game::{Input, Note, Player};
use crate::graph::reference_layout;
use crate::multiplayer::Phase;
use crate::session::{Change, Session};

/// Opponent that presses start when paired and then walks every node to
/// its spot in the reference layout, one move per `delay`.
#[derive(Debug)]
pub struct Autoplayer {
    delay: Duration,
    plan: VecDeque<Input>,
    due: Option<Instant>,
}

impl Autoplayer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            plan: VecDeque::new(),
            due: None,
        }
    }

    fn plan_solution(&mut self, session: &Session) {
        self.plan.clear();
        let nodes = &session.puzzle().nodes;
        for (node, to) in reference_layout().iter() {
            if nodes[node] != to {
                self.plan.push_back(Input::Place { node, to });
            }
        }
        trace!(moves = self.plan.len(), "planned solution");
    }
}

impl Player for Autoplayer {
    async fn next_input(&mut self) -> Option<Input> {
        if self.plan.is_empty() {
            return std::future::pending().await;
        }
        // Keep the deadline across cancellations so events cannot starve us.
        let due = *self.due.get_or_insert_with(|| Instant::now() + self.delay);
        tokio::time::sleep_until(due).await;
        self.due = None;
        self.plan.pop_front()
    }

    fn notify(&mut self, note: Note<'_>) {
        match note {
            Note::Phase(Phase::Ready { local: false, .. }) => {
                if !self.plan.contains(&Input::Start) {
                    self.plan.push_back(Input::Start);
                }
            }
            Note::Dealt(session) | Note::Changed(session, Change::Jumped(_)) => {
                self.plan_solution(session);
            }
            Note::Changed(
                _,
                Change::Solved { .. } | Change::Lost | Change::TimedOut | Change::Abandoned,
            ) => {
                self.plan.clear();
                self.due = None;
            }
            _ => {}
        }
    }
}
