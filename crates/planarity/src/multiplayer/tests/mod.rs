mod wire;

use std::collections::VecDeque;
use std::time::Duration;

use super::MatchSettings;
use super::rendezvous::{Action, Rendezvous, Role};
use crate::graph::{Puzzle, reference_layout, topology};

/// Helper to create a scrambled eleven-edge puzzle.
fn puzzle() -> Puzzle {
    let mut nodes = reference_layout();
    nodes.0.swap(0, 1);
    Puzzle::new(nodes, topology(11)).unwrap()
}

/// Helper to create match settings with a short retry budget.
fn settings(role: Role, max_retries: u32) -> MatchSettings {
    MatchSettings {
        retry_interval: Duration::from_secs(1),
        max_retries,
        ..MatchSettings::new(role)
    }
}

/// Two rendezvous machines wired through a lossy, echoing topic.
struct Pair {
    host: Rendezvous,
    join: Rendezvous,
    /// Prefixes of messages to lose, each once.
    drops: Vec<&'static str>,
    /// Prefixes of messages to delay, each once, until [`Pair::release`].
    holds: Vec<&'static str>,
    held: Vec<String>,
    /// Every message published, lost ones included.
    log: Vec<String>,
    begun: Vec<(Role, Puzzle)>,
    defeated: Vec<Role>,
}

impl Pair {
    fn new() -> Self {
        Self {
            host: Rendezvous::new(Role::Host, 3),
            join: Rendezvous::new(Role::Join, 3),
            drops: Vec::new(),
            holds: Vec::new(),
            held: Vec::new(),
            log: Vec::new(),
            begun: Vec::new(),
            defeated: Vec::new(),
        }
    }

    fn side(&mut self, role: Role) -> &mut Rendezvous {
        match role {
            Role::Host => &mut self.host,
            Role::Join => &mut self.join,
        }
    }

    /// Carry out `actions` taken by `role` and everything they cause.
    fn run(&mut self, role: Role, actions: Vec<Action>) {
        let mut queue: VecDeque<(Role, Action)> =
            actions.into_iter().map(|a| (role, a)).collect();
        while let Some((side, action)) = queue.pop_front() {
            match action {
                Action::Publish(message) => {
                    self.log.push(message.clone());
                    if let Some(i) = self.drops.iter().position(|p| message.starts_with(p)) {
                        self.drops.remove(i);
                        continue;
                    }
                    if let Some(i) = self.holds.iter().position(|p| message.starts_with(p)) {
                        self.holds.remove(i);
                        self.held.push(message);
                        continue;
                    }
                    queue.extend(self.deliver(&message));
                }
                Action::Generate => {
                    let out = self.side(side).offer(puzzle());
                    queue.extend(out.into_iter().map(|a| (side, a)));
                }
                Action::Begin(puzzle) => self.begun.push((side, puzzle)),
                Action::Defeated => self.defeated.push(side),
            }
        }
    }

    /// Hand `message` to both sides, returning what they do about it.
    fn deliver(&mut self, message: &str) -> Vec<(Role, Action)> {
        let mut out = Vec::new();
        for target in [Role::Host, Role::Join] {
            let actions = self.side(target).on_message(message).unwrap();
            out.extend(actions.into_iter().map(|a| (target, a)));
        }
        out
    }

    /// Deliver the delayed messages, oldest first, and carry out the fallout.
    fn release(&mut self) {
        for message in std::mem::take(&mut self.held) {
            for (side, action) in self.deliver(&message) {
                self.run(side, vec![action]);
            }
        }
    }

    fn start(&mut self, role: Role) {
        let actions = self.side(role).start();
        self.run(role, actions);
    }

    fn press_start(&mut self, role: Role) {
        let actions = self.side(role).press_start();
        self.run(role, actions);
    }

    fn retry(&mut self, role: Role) {
        let actions = self.side(role).on_retry().unwrap();
        self.run(role, actions);
    }

    fn solve(&mut self, role: Role) {
        let actions = self.side(role).local_solved();
        self.run(role, actions);
    }

    /// Pair, pass the barrier and exchange the puzzle with nothing lost.
    fn playing() -> Self {
        let mut pair = Self::new();
        pair.start(Role::Join);
        pair.press_start(Role::Host);
        pair.press_start(Role::Join);
        pair
    }

    fn count(&self, message: &str) -> usize {
        self.log.iter().filter(|m| *m == message).count()
    }
}
