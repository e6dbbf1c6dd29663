use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Point;
use crate::graph::{NodeId, Puzzle};

/// Seconds on the race clock at level factor 1.
pub const RACE_BASE_SECONDS: u32 = 60;
/// Seconds between crazy-mode jumps at level factor 1.
pub const JUMP_BASE_SECONDS: u32 = 7;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Classic,
    RaceAgainstTime,
    Crazy,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::RaceAgainstTime => "Race against time",
            Self::Crazy => "Crazy",
        }
    }

    pub fn all() -> &'static [Mode] {
        &[Mode::Classic, Mode::RaceAgainstTime, Mode::Crazy]
    }

    pub fn index(self) -> usize {
        match self {
            Self::Classic => 0,
            Self::RaceAgainstTime => 1,
            Self::Crazy => 2,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Level {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
        }
    }

    pub fn all() -> &'static [Level] {
        &[Level::Easy, Level::Normal, Level::Hard]
    }

    /// `4 - level`, where easy is level 1 and hard level 3.
    pub fn factor(self) -> u32 {
        match self {
            Self::Easy => 3,
            Self::Normal => 2,
            Self::Hard => 1,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Setup,
    Playing,
    Solved { score: u32 },
    TimedOut,
    /// The opponent solved first.
    Lost,
    Abandoned,
}

impl SessionState {
    pub fn is_over(self) -> bool {
        !matches!(self, Self::Setup | Self::Playing)
    }
}

/// What a session call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Ignored,
    Grabbed(NodeId),
    Moved(NodeId),
    Released(NodeId),
    Tick,
    Jumped(NodeId),
    Solved { score: u32 },
    TimedOut,
    Lost,
    Abandoned,
}

/// One puzzle being played.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    level: Level,
    puzzle: Puzzle,
    moves: u32,
    seconds: u32,
    state: SessionState,
    held: Option<NodeId>,
    crossings: usize,
}

impl Session {
    pub fn new(mode: Mode, level: Level) -> Self {
        Self {
            mode,
            level,
            puzzle: Puzzle::empty(),
            moves: 0,
            seconds: 0,
            state: SessionState::Setup,
            held: None,
            crossings: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Elapsed seconds, or remaining seconds in race mode.
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn held(&self) -> Option<NodeId> {
        self.held
    }

    pub fn crossings(&self) -> usize {
        self.crossings
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Whether the clock counts down.
    pub fn counts_down(&self) -> bool {
        self.mode == Mode::RaceAgainstTime
    }

    /// Deal `puzzle` and start the clock. Only valid from `Setup`.
    pub fn start(&mut self, puzzle: Puzzle) -> bool {
        if self.state != SessionState::Setup {
            return false;
        }
        self.crossings = puzzle.crossings();
        self.puzzle = puzzle;
        self.moves = 0;
        self.held = None;
        self.seconds = match self.mode {
            Mode::RaceAgainstTime => RACE_BASE_SECONDS * self.level.factor(),
            Mode::Classic | Mode::Crazy => 0,
        };
        self.state = SessionState::Playing;
        debug!(mode = %self.mode, level = %self.level, crossings = self.crossings, "session started");
        true
    }

    /// Period of the crazy-mode jump timer.
    pub fn jump_interval(&self) -> Option<Duration> {
        (self.mode == Mode::Crazy)
            .then(|| Duration::from_secs(u64::from(JUMP_BASE_SECONDS * self.level.factor())))
    }

    /// One touch sample. Grabs a node when nothing is held, drags otherwise.
    pub fn touch(&mut self, at: Point) -> Change {
        if !self.is_playing() {
            return Change::Ignored;
        }
        match self.held {
            None => match self.puzzle.nodes.hit_test(at) {
                Some(node) => self.grab(node),
                None => Change::Ignored,
            },
            Some(node) => self.drag(node, at),
        }
    }

    /// End the current drag gesture.
    pub fn lift(&mut self) -> Change {
        match self.held.take() {
            Some(node) if self.is_playing() => Change::Released(node),
            _ => Change::Ignored,
        }
    }

    /// A whole gesture: grab `node`, drag it to `to`, lift.
    pub fn place(&mut self, node: NodeId, to: Point) -> Change {
        if !self.is_playing() || !to.in_playfield() {
            return Change::Ignored;
        }
        self.held = None;
        self.grab(node);
        let change = self.drag(node, to);
        self.held = None;
        change
    }

    fn grab(&mut self, node: NodeId) -> Change {
        if self.crossings > 0 {
            self.moves += 1;
        }
        self.held = Some(node);
        Change::Grabbed(node)
    }

    fn drag(&mut self, node: NodeId, to: Point) -> Change {
        if !to.in_playfield() {
            return Change::Ignored;
        }
        self.puzzle.nodes[node] = to;
        self.crossings = self.puzzle.crossings();
        if self.crossings == 0 {
            let score = self.score();
            self.held = None;
            self.state = SessionState::Solved { score };
            debug!(score, moves = self.moves, seconds = self.seconds, "puzzle solved");
            return Change::Solved { score };
        }
        Change::Moved(node)
    }

    /// Advance the clock by one second.
    pub fn tick(&mut self) -> Change {
        if !self.is_playing() {
            return Change::Ignored;
        }
        if self.counts_down() {
            self.seconds = self.seconds.saturating_sub(1);
            if self.seconds == 0 {
                self.held = None;
                self.state = SessionState::TimedOut;
                debug!("race clock ran out");
                return Change::TimedOut;
            }
        } else {
            self.seconds += 1;
        }
        Change::Tick
    }

    /// Teleport `node` to `to`. Never solves; the next drag sample does.
    pub fn jump(&mut self, node: NodeId, to: Point) -> Change {
        if !self.is_playing() {
            return Change::Ignored;
        }
        self.puzzle.nodes[node] = to;
        self.crossings = self.puzzle.crossings();
        Change::Jumped(node)
    }

    /// The opponent solved first.
    pub fn lose(&mut self) -> Change {
        if !self.is_playing() {
            return Change::Ignored;
        }
        self.held = None;
        self.state = SessionState::Lost;
        Change::Lost
    }

    pub fn abandon(&mut self) -> Change {
        if self.state.is_over() {
            return Change::Ignored;
        }
        self.held = None;
        self.state = SessionState::Abandoned;
        Change::Abandoned
    }

    /// Score for the current moves and clock. Lower is better.
    pub fn score(&self) -> u32 {
        let factor = self.level.factor();
        match self.mode {
            Mode::Classic => self.seconds + self.moves,
            Mode::RaceAgainstTime => {
                ((RACE_BASE_SECONDS + self.moves) * factor).saturating_sub(self.seconds)
            }
            Mode::Crazy => self.seconds + self.moves * factor,
        }
    }
}
