use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, info};

use super::rendezvous::{Action, Phase, Rendezvous};
use super::transport::Transport;
use super::{MatchSettings, ProtocolError};
use crate::events::{Event, EventQueue, EventSender, Ticker};
use crate::game::{Clock, Input, Note, Player, Turn, apply_event, apply_input, next_turn};
use crate::graph::generator::Generator;
use crate::session::{Change, Level, Mode, Session};

/// How a match ended for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Won { score: u32 },
    Lost,
    /// Backed out before the puzzle exchange.
    Cancelled,
    /// Backed out mid-exchange.
    Abandoned,
    /// Backed out while playing.
    Left,
}

impl MatchOutcome {
    fn from_phase(phase: Phase, session: &Session) -> Option<Self> {
        match phase {
            Phase::Won => Some(Self::Won {
                score: session.score(),
            }),
            Phase::Lost => Some(Self::Lost),
            Phase::Cancelled => Some(Self::Cancelled),
            Phase::Abandoned => Some(Self::Abandoned),
            Phase::Left => Some(Self::Left),
            Phase::Connecting | Phase::Ready { .. } | Phase::Transfer(_) | Phase::Playing => None,
        }
    }
}

struct Peer<'a, T: ?Sized> {
    transport: &'a T,
    topic: &'a str,
    rendezvous: Rendezvous,
    session: Session,
    clock: Option<Clock>,
}

impl<T: Transport + ?Sized> Peer<'_, T> {
    /// Carry out rendezvous actions, including those they trigger.
    fn perform<P: Player, R: Rng>(
        &mut self,
        actions: Vec<Action>,
        generator: &mut Generator<R>,
        sender: &EventSender,
        player: &mut P,
    ) -> Result<(), ProtocolError> {
        let mut work = VecDeque::from(actions);
        while let Some(action) = work.pop_front() {
            match action {
                Action::Publish(payload) => {
                    debug!(role = %self.rendezvous.role(), %payload, "publish");
                    self.transport.publish(self.topic, &payload)?;
                }
                Action::Generate => {
                    let puzzle = generator.generate()?;
                    work.extend(self.rendezvous.offer(puzzle));
                }
                Action::Begin(puzzle) => {
                    self.session.start(puzzle);
                    self.clock = Some(Clock::attach(&self.session, sender.clone()));
                    player.notify(Note::Dealt(&self.session));
                }
                Action::Defeated => {
                    self.clock = None;
                    let change = self.session.lose();
                    if change != Change::Ignored {
                        player.notify(Note::Changed(&self.session, change));
                    }
                }
            }
        }
        Ok(())
    }

    /// Pass a session change on, and announce a local win.
    fn report<P: Player>(&mut self, change: Change, player: &mut P) -> Vec<Action> {
        if change == Change::Ignored {
            return Vec::new();
        }
        player.notify(Note::Changed(&self.session, change));
        match change {
            Change::Solved { .. } => {
                self.clock = None;
                self.rendezvous.local_solved()
            }
            _ => Vec::new(),
        }
    }
}

/// Pair with a peer on `settings.topic`, exchange a puzzle and race to solve it.
///
/// The host generates the puzzle with `generator`; the joining side plays
/// whatever it receives. Both sides play with the classic clock.
pub async fn run_match<T, P, R>(
    transport: &T,
    settings: &MatchSettings,
    generator: &mut Generator<R>,
    player: &mut P,
) -> Result<MatchOutcome, ProtocolError>
where
    T: Transport + ?Sized,
    P: Player,
    R: Rng,
{
    let mut queue = EventQueue::new();
    let sender = queue.sender();
    let inbox = queue.sender();
    transport.subscribe(
        &settings.topic,
        Box::new(move |message| inbox.post(Event::Network(message.to_string()))),
    )?;
    let _retry = Ticker::attach(queue.sender(), settings.retry_interval, Event::Retry);

    let mut peer = Peer {
        transport,
        topic: &settings.topic,
        rendezvous: Rendezvous::new(settings.role, settings.max_retries),
        session: Session::new(Mode::Classic, Level::default()),
        clock: None,
    };
    info!(role = %settings.role, topic = %settings.topic, "joining rendezvous");

    let opening = peer.rendezvous.start();
    peer.perform(opening, generator, &sender, player)?;
    let mut phase = peer.rendezvous.phase();
    player.notify(Note::Phase(&phase));

    loop {
        if let Some(outcome) = MatchOutcome::from_phase(phase, &peer.session) {
            info!(role = %settings.role, ?outcome, "match finished");
            return Ok(outcome);
        }

        let actions = match next_turn(player, &mut queue).await {
            Turn::Input(None | Some(Input::Back)) => {
                peer.rendezvous.press_back();
                peer.clock = None;
                peer.session.abandon();
                Vec::new()
            }
            Turn::Input(Some(Input::Start)) => peer.rendezvous.press_start(),
            Turn::Input(Some(Input::Show)) => {
                if peer.session.is_playing() {
                    player.notify(Note::Board(&peer.session));
                } else {
                    player.notify(Note::Phase(&phase));
                }
                Vec::new()
            }
            Turn::Input(Some(input)) => {
                let change = apply_input(&mut peer.session, input);
                peer.report(change, player)
            }
            Turn::Event(Event::Network(message)) => peer.rendezvous.on_message(&message)?,
            Turn::Event(Event::Retry) => peer.rendezvous.on_retry()?,
            Turn::Event(event) => {
                let change = apply_event(&mut peer.session, &event, generator);
                peer.report(change, player)
            }
        };
        peer.perform(actions, generator, &sender, player)?;

        let next = peer.rendezvous.phase();
        if next != phase {
            phase = next;
            player.notify(Note::Phase(&phase));
        }
    }
}
