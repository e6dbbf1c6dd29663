use std::fmt;

use tracing::{debug, warn};

use super::ProtocolError;
use super::wire::{Token, decode_edges, decode_nodes, encode_edges, encode_nodes};
use crate::graph::{Nodes, Puzzle};

/// Side of the connection, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Role {
    Host,
    Join,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Self::Host => Self::Join,
            Self::Join => Self::Host,
        }
    }

    fn hello(self) -> Token {
        match self {
            Self::Host => Token::Host,
            Self::Join => Token::Join,
        }
    }

    fn ready(self) -> Token {
        match self {
            Self::Host => Token::HostReady,
            Self::Join => Token::JoinReady,
        }
    }

    fn won(self) -> Token {
        match self {
            Self::Host => Token::HostWon,
            Self::Join => Token::JoinWon,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Join => write!(f, "join"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    /// Host: waiting for the puzzle to be generated.
    Preparing,
    SendingNodes,
    SendingEdges,
    AwaitNodes,
    AwaitEdges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Ready { local: bool, remote: bool },
    Transfer(TransferStep),
    Playing,
    Won,
    Lost,
    /// Back pressed before the barrier.
    Cancelled,
    /// Back pressed mid-transfer; the peer gives up after its retry budget.
    Abandoned,
    /// Back pressed while playing.
    Left,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Ready {
                local: false,
                remote: false,
            } => write!(f, "paired, press start"),
            Self::Ready {
                local: false,
                remote: true,
            } => write!(f, "opponent is ready, press start"),
            Self::Ready { local: true, .. } => write!(f, "waiting for opponent"),
            Self::Transfer(_) => write!(f, "exchanging puzzle"),
            Self::Playing => write!(f, "playing"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Left => write!(f, "left"),
        }
    }
}

/// Side effects the driver must carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Publish(String),
    /// Host: generate a puzzle and hand it to [`Rendezvous::offer`].
    Generate,
    /// Start playing this puzzle.
    Begin(Puzzle),
    /// The opponent solved first.
    Defeated,
}

/// The pairing and transfer protocol, without any I/O.
#[derive(Debug, Clone)]
pub struct Rendezvous {
    role: Role,
    phase: Phase,
    max_retries: u32,
    /// Host: retransmissions of the pending payload. Join: retry intervals
    /// spent waiting for a payload with nothing heard from the host.
    retries: u32,
    /// Host: acknowledgements still owed for retransmitted node payloads.
    /// These arrive after the edges are out and must not count for them.
    stale_acks: u32,
    /// Host: the payload awaiting acknowledgement.
    pending: Option<String>,
    /// Host: edge payload queued behind the nodes.
    queued_edges: Option<String>,
    puzzle: Option<Puzzle>,
    /// Join: decoded nodes and their raw payload, to spot retransmissions.
    received_nodes: Option<(Nodes, String)>,
    /// Ready answered since the last retry tick. Stops two peers past the
    /// barrier from answering each other forever.
    ready_answered: bool,
}

impl Rendezvous {
    pub fn new(role: Role, max_retries: u32) -> Self {
        Self {
            role,
            phase: Phase::Connecting,
            max_retries,
            retries: 0,
            stale_acks: 0,
            pending: None,
            queued_edges: None,
            puzzle: None,
            received_nodes: None,
            ready_answered: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(role = %self.role, from = ?self.phase, to = ?phase, "rendezvous phase");
            self.phase = phase;
        }
    }

    fn publish(token: Token) -> Action {
        Action::Publish(token.as_str().to_string())
    }

    /// Opening move: the joining side announces itself.
    pub fn start(&mut self) -> Vec<Action> {
        match (self.role, self.phase) {
            (Role::Join, Phase::Connecting) => vec![Self::publish(self.role.hello())],
            _ => Vec::new(),
        }
    }

    pub fn on_message(&mut self, message: &str) -> Result<Vec<Action>, ProtocolError> {
        let token = Token::parse(message);
        let other = self.role.other();

        if self.role == Role::Join
            && matches!(self.phase, Phase::Transfer(_))
            && token.is_none_or(|t| t == other.hello() || t == other.ready())
        {
            self.retries = 0;
        }

        // A peer past the barrier answers a counterpart still waiting on it.
        if token == Some(other.ready()) && self.past_barrier() {
            if self.ready_answered {
                return Ok(Vec::new());
            }
            self.ready_answered = true;
            return Ok(vec![Self::publish(self.role.ready())]);
        }
        if token == Some(other.won()) {
            return Ok(self.defeated());
        }

        let actions = match (self.role, self.phase, token) {
            (Role::Host, Phase::Connecting, Some(Token::Join)) => {
                self.set_phase(Phase::Ready {
                    local: false,
                    remote: false,
                });
                vec![Self::publish(self.role.hello())]
            }
            // The join side missed our answer.
            (Role::Host, Phase::Ready { .. }, Some(Token::Join)) => {
                vec![Self::publish(self.role.hello())]
            }
            (Role::Join, Phase::Connecting, Some(Token::Host)) => {
                self.set_phase(Phase::Ready {
                    local: false,
                    remote: false,
                });
                Vec::new()
            }
            (Role::Join, Phase::Connecting, Some(Token::HostReady)) => {
                self.set_phase(Phase::Ready {
                    local: false,
                    remote: true,
                });
                Vec::new()
            }
            (_, Phase::Ready { local, .. }, Some(t)) if t == other.ready() => {
                self.set_phase(Phase::Ready {
                    local,
                    remote: true,
                });
                if local {
                    self.enter_transfer()
                } else {
                    Vec::new()
                }
            }
            (Role::Host, Phase::Transfer(step), Some(Token::Received)) => self.acknowledged(step),
            (Role::Join, Phase::Transfer(TransferStep::AwaitNodes), None) => {
                let nodes = decode_nodes(message).inspect_err(|e| warn!("bad node payload: {e}"))?;
                self.received_nodes = Some((nodes, message.to_string()));
                self.set_phase(Phase::Transfer(TransferStep::AwaitEdges));
                vec![Self::publish(Token::Received)]
            }
            (Role::Join, Phase::Transfer(TransferStep::AwaitEdges), None) => {
                self.receive_edges(message)?
            }
            // Our last acknowledgement was lost; the host is retransmitting.
            (Role::Join, Phase::Playing, None) => vec![Self::publish(Token::Received)],
            _ => Vec::new(),
        };
        Ok(actions)
    }

    fn receive_edges(&mut self, message: &str) -> Result<Vec<Action>, ProtocolError> {
        let Some((nodes, raw)) = &self.received_nodes else {
            return Ok(Vec::new());
        };
        if raw == message {
            debug!("node payload retransmitted, acknowledging again");
            return Ok(vec![Self::publish(Token::Received)]);
        }
        let edges = decode_edges(message).inspect_err(|e| warn!("bad edge payload: {e}"))?;
        let puzzle = Puzzle::new(*nodes, edges)?;
        self.set_phase(Phase::Playing);
        Ok(vec![
            Self::publish(Token::Received),
            Action::Begin(puzzle),
        ])
    }

    fn acknowledged(&mut self, step: TransferStep) -> Vec<Action> {
        match step {
            TransferStep::SendingNodes => {
                self.stale_acks = self.retries;
                self.retries = 0;
                self.pending = self.queued_edges.take();
                self.set_phase(Phase::Transfer(TransferStep::SendingEdges));
                self.pending.clone().map(Action::Publish).into_iter().collect()
            }
            TransferStep::SendingEdges if self.stale_acks > 0 => {
                self.stale_acks -= 1;
                debug!(
                    outstanding = self.stale_acks,
                    "acknowledgement of a retransmitted node payload, edges still pending"
                );
                Vec::new()
            }
            TransferStep::SendingEdges => {
                self.pending = None;
                self.set_phase(Phase::Playing);
                self.puzzle.take().map(Action::Begin).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn defeated(&mut self) -> Vec<Action> {
        match self.phase {
            Phase::Transfer(_) | Phase::Playing => {
                self.pending = None;
                self.set_phase(Phase::Lost);
                vec![Action::Defeated]
            }
            _ => Vec::new(),
        }
    }

    fn past_barrier(&self) -> bool {
        matches!(self.phase, Phase::Transfer(_) | Phase::Playing)
            || self.phase
                == Phase::Ready {
                    local: true,
                    remote: true,
                }
    }

    fn enter_transfer(&mut self) -> Vec<Action> {
        match self.role {
            Role::Host => {
                self.set_phase(Phase::Transfer(TransferStep::Preparing));
                vec![Action::Generate]
            }
            Role::Join => {
                self.set_phase(Phase::Transfer(TransferStep::AwaitNodes));
                Vec::new()
            }
        }
    }

    /// The local player pressed start.
    pub fn press_start(&mut self) -> Vec<Action> {
        let Phase::Ready {
            local: false,
            remote,
        } = self.phase
        else {
            return Vec::new();
        };
        self.set_phase(Phase::Ready {
            local: true,
            remote,
        });
        let mut actions = vec![Self::publish(self.role.ready())];
        if remote {
            actions.extend(self.enter_transfer());
        }
        actions
    }

    /// The local player pressed back.
    pub fn press_back(&mut self) {
        let next = match self.phase {
            Phase::Connecting | Phase::Ready { .. } => Phase::Cancelled,
            Phase::Transfer(_) => Phase::Abandoned,
            Phase::Playing => Phase::Left,
            finished => finished,
        };
        self.pending = None;
        self.set_phase(next);
    }

    /// Host: the generated puzzle to send.
    pub fn offer(&mut self, puzzle: Puzzle) -> Vec<Action> {
        if self.phase != Phase::Transfer(TransferStep::Preparing) {
            return Vec::new();
        }
        let nodes = encode_nodes(&puzzle.nodes);
        self.queued_edges = Some(encode_edges(puzzle.edges()));
        self.puzzle = Some(puzzle);
        self.pending = Some(nodes.clone());
        self.retries = 0;
        self.stale_acks = 0;
        self.set_phase(Phase::Transfer(TransferStep::SendingNodes));
        vec![Action::Publish(nodes)]
    }

    /// Retry interval elapsed: republish whatever the peer has not answered.
    pub fn on_retry(&mut self) -> Result<Vec<Action>, ProtocolError> {
        self.ready_answered = false;
        let actions = match self.phase {
            Phase::Connecting if self.role == Role::Join => vec![Self::publish(self.role.hello())],
            Phase::Ready {
                local: true,
                remote: false,
            } => vec![Self::publish(self.role.ready())],
            Phase::Transfer(TransferStep::SendingNodes | TransferStep::SendingEdges) => {
                let Some(payload) = self.pending.clone() else {
                    return Ok(Vec::new());
                };
                if self.retries >= self.max_retries {
                    warn!(attempts = self.retries, "peer never acknowledged");
                    return Err(ProtocolError::Unacknowledged {
                        attempts: self.retries,
                    });
                }
                self.retries += 1;
                debug!(attempt = self.retries, "retransmitting payload");
                vec![Action::Publish(payload)]
            }
            Phase::Transfer(TransferStep::AwaitNodes | TransferStep::AwaitEdges) => {
                if self.retries >= self.max_retries {
                    warn!(intervals = self.retries, "host went silent mid-transfer");
                    return Err(ProtocolError::Silent {
                        intervals: self.retries,
                    });
                }
                self.retries += 1;
                Vec::new()
            }
            _ => Vec::new(),
        };
        Ok(actions)
    }

    /// The local player solved the puzzle first.
    pub fn local_solved(&mut self) -> Vec<Action> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        self.set_phase(Phase::Won);
        vec![Self::publish(self.role.won())]
    }
}
