use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::events::{Event, EventQueue, EventSender, Ticker};
use crate::geometry::Point;
use crate::graph::NodeId;
use crate::graph::generator::{Generator, GeneratorError};
use crate::multiplayer::rendezvous::Phase;
use crate::session::{Change, Session, SessionState};

/// Something a player asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Touch(Point),
    Lift,
    Place { node: NodeId, to: Point },
    Start,
    Back,
    Show,
}

/// What the loop tells a player.
#[derive(Debug, Clone, Copy)]
pub enum Note<'a> {
    /// A puzzle was dealt and the clock started.
    Dealt(&'a Session),
    Changed(&'a Session, Change),
    /// The player asked to see the board.
    Board(&'a Session),
    /// The multiplayer rendezvous moved on.
    Phase(&'a Phase),
}

/// A source of input: the terminal, or the autoplayer.
pub trait Player {
    /// Wait for the next input. `None` means the player went away.
    ///
    /// Must be cancel-safe: the loop drops this future whenever an event
    /// arrives first.
    fn next_input(&mut self) -> impl Future<Output = Option<Input>>;

    fn notify(&mut self, _note: Note<'_>) {}
}

pub(crate) enum Turn {
    Input(Option<Input>),
    Event(Event),
}

/// Whichever comes first: player input or a queued event.
pub(crate) async fn next_turn<P: Player>(player: &mut P, queue: &mut EventQueue) -> Turn {
    tokio::select! {
        input = player.next_input() => Turn::Input(input),
        Some(event) = queue.next() => Turn::Event(event),
    }
}

/// Game clock for one session: a one-second tick, plus the crazy-mode jump.
pub(crate) struct Clock {
    _tick: Ticker,
    _jump: Option<Ticker>,
}

impl Clock {
    pub(crate) fn attach(session: &Session, sender: EventSender) -> Self {
        let jump = session
            .jump_interval()
            .map(|period| Ticker::attach(sender.clone(), period, Event::Jump));
        Self {
            _tick: Ticker::attach(sender, Duration::from_secs(1), Event::Tick),
            _jump: jump,
        }
    }
}

/// Apply a drag input to the session.
pub(crate) fn apply_input(session: &mut Session, input: Input) -> Change {
    match input {
        Input::Touch(at) => session.touch(at),
        Input::Lift => session.lift(),
        Input::Place { node, to } => session.place(node, to),
        Input::Start | Input::Back | Input::Show => Change::Ignored,
    }
}

/// Apply a timer event to the session.
pub(crate) fn apply_event<R: rand::Rng>(
    session: &mut Session,
    event: &Event,
    generator: &mut Generator<R>,
) -> Change {
    match event {
        Event::Tick => session.tick(),
        Event::Jump if session.is_playing() => {
            let node = generator.random_node();
            let to = generator.random_point();
            debug!(%node, %to, "crazy jump");
            session.jump(node, to)
        }
        _ => Change::Ignored,
    }
}

/// Play one single-player puzzle to the end.
pub async fn run_solo<P: Player, R: rand::Rng>(
    session: &mut Session,
    generator: &mut Generator<R>,
    player: &mut P,
) -> Result<SessionState, GeneratorError> {
    let puzzle = generator.generate()?;
    session.start(puzzle);
    player.notify(Note::Dealt(session));

    let mut queue = EventQueue::new();
    let _clock = Clock::attach(session, queue.sender());

    while session.is_playing() {
        let change = match next_turn(player, &mut queue).await {
            Turn::Input(None | Some(Input::Back)) => session.abandon(),
            Turn::Input(Some(Input::Show)) => {
                player.notify(Note::Board(session));
                Change::Ignored
            }
            Turn::Input(Some(input)) => apply_input(session, input),
            Turn::Event(event) => apply_event(session, &event, generator),
        };
        if change != Change::Ignored {
            player.notify(Note::Changed(session, change));
        }
    }
    Ok(session.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::graph::generator::GeneratorConfig;
    use crate::graph::reference_layout;
    use crate::session::{Level, Mode};

    /// Replays a script, then waits forever.
    struct Scripted {
        script: VecDeque<Input>,
        changes: Vec<Change>,
        dealt: bool,
    }

    impl Scripted {
        fn new(script: impl IntoIterator<Item = Input>) -> Self {
            Self {
                script: script.into_iter().collect(),
                changes: Vec::new(),
                dealt: false,
            }
        }

        fn idle() -> Self {
            Self::new(Vec::<Input>::new())
        }
    }

    impl Player for Scripted {
        async fn next_input(&mut self) -> Option<Input> {
            match self.script.pop_front() {
                Some(input) => Some(input),
                None => std::future::pending().await,
            }
        }

        fn notify(&mut self, note: Note<'_>) {
            match note {
                Note::Dealt(_) => self.dealt = true,
                Note::Changed(_, change) => self.changes.push(change),
                _ => {}
            }
        }
    }

    fn generator(seed: u64) -> Generator {
        Generator::from_seed(seed, GeneratorConfig::default()).unwrap()
    }

    fn solution() -> Vec<Input> {
        reference_layout()
            .iter()
            .map(|(node, to)| Input::Place { node, to })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn placing_reference_layout_solves() {
        let mut session = Session::new(Mode::Classic, Level::Normal);
        let mut player = Scripted::new(solution());
        let state = run_solo(&mut session, &mut generator(11), &mut player)
            .await
            .unwrap();
        assert!(player.dealt);
        assert!(matches!(state, SessionState::Solved { .. }));
        assert!(matches!(
            player.changes.last(),
            Some(Change::Solved { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn back_abandons() {
        let mut session = Session::new(Mode::Crazy, Level::Hard);
        let mut player = Scripted::new([Input::Back]);
        let state = run_solo(&mut session, &mut generator(2), &mut player)
            .await
            .unwrap();
        assert_eq!(state, SessionState::Abandoned);
        assert_eq!(player.changes, vec![Change::Abandoned]);
    }

    #[tokio::test(start_paused = true)]
    async fn race_clock_runs_out() {
        let mut session = Session::new(Mode::RaceAgainstTime, Level::Hard);
        let mut player = Scripted::idle();
        let state = run_solo(&mut session, &mut generator(3), &mut player)
            .await
            .unwrap();
        assert_eq!(state, SessionState::TimedOut);
        let ticks = player
            .changes
            .iter()
            .filter(|c| **c == Change::Tick)
            .count();
        assert_eq!(ticks, 59);
    }

    #[tokio::test(start_paused = true)]
    async fn crazy_mode_jumps() {
        let mut session = Session::new(Mode::Crazy, Level::Hard);
        let mut player = Scripted::idle();
        let mut generator = generator(4);
        let game = run_solo(&mut session, &mut generator, &mut player);
        let _ = tokio::time::timeout(Duration::from_secs(15), game).await;
        let jumps = player
            .changes
            .iter()
            .filter(|c| matches!(c, Change::Jumped(_)))
            .count();
        assert_eq!(jumps, 2);
    }
}
