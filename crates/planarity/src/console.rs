use std::io::BufRead;
use std::sync::mpsc as std_mpsc;

use colored::Colorize;
use tokio::sync::mpsc;

use crate::game::{Input, Note, Player};
use crate::geometry::Point;
use crate::graph::{GraphError, NodeId};
use crate::session::{Change, Session};

const HELP: &str = "\
Commands:
  touch X Y     grab the node under (X, Y), or drag the held node there
  lift          release the held node
  move N X Y    move node N to (X, Y) in one gesture
  start         signal ready (multiplayer)
  show          print the board
  back          leave the current game
  help          print this list";

/// One line typed at the game prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play(Input),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("type a command, or `help`")]
    Empty,

    #[error("unknown command {0:?}, type `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0:?} is not a whole number")]
    BadNumber(String),

    #[error(transparent)]
    Node(#[from] GraphError),
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, CommandError> {
    word.parse()
        .map_err(|_| CommandError::BadNumber(word.to_string()))
}

fn point(x: &str, y: &str) -> Result<Point, CommandError> {
    Ok(Point::new(number(x)?, number(y)?))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };
    let input = match (name.to_ascii_lowercase().as_str(), args) {
        ("help" | "?", _) => return Ok(Command::Help),
        ("touch" | "t", [x, y]) => Input::Touch(point(x, y)?),
        ("touch" | "t", _) => return Err(CommandError::Usage("touch X Y")),
        ("lift" | "l", []) => Input::Lift,
        ("move" | "m", [n, x, y]) => Input::Place {
            node: NodeId::new(number(n)?)?,
            to: point(x, y)?,
        },
        ("move" | "m", _) => return Err(CommandError::Usage("move N X Y")),
        ("start" | "s", []) => Input::Start,
        ("back" | "b" | "quit" | "q", []) => Input::Back,
        ("show", []) => Input::Show,
        _ => return Err(CommandError::Unknown(line.trim().to_string())),
    };
    Ok(Command::Play(input))
}

/// Reads stdin on a helper thread, one line per request, so that nothing
/// is consumed from stdin while an interactive menu owns it.
pub struct Console {
    requests: std_mpsc::Sender<()>,
    lines: mpsc::UnboundedReceiver<String>,
    /// A line has been requested and not yet received.
    pending: bool,
}

impl Console {
    pub fn new() -> Self {
        let (requests, wanted) = std_mpsc::channel::<()>();
        let (tx, lines) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            while wanted.recv().is_ok() {
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            requests,
            lines,
            pending: false,
        }
    }

    /// Next line from stdin, `None` at end of input. Cancel-safe: a line
    /// requested by a cancelled call is handed to the next one.
    pub async fn next_line(&mut self) -> Option<String> {
        if !self.pending {
            self.requests.send(()).ok()?;
            self.pending = true;
        }
        let line = self.lines.recv().await;
        self.pending = false;
        line
    }

    /// Release stdin for the menus. If a line is still being read, ask the
    /// user to finish it.
    pub async fn settle(&mut self) {
        if self.pending {
            println!("{}", "Press Enter to continue".dimmed());
            self.next_line().await;
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// A human at the terminal.
pub struct ConsolePlayer<'a> {
    console: &'a mut Console,
}

impl<'a> ConsolePlayer<'a> {
    pub fn new(console: &'a mut Console) -> Self {
        Self { console }
    }
}

fn clock(session: &Session) -> String {
    let seconds = session.seconds();
    let text = format!("{}:{:02}", seconds / 60, seconds % 60);
    if session.counts_down() {
        format!("{text} left")
    } else {
        text
    }
}

fn status(session: &Session) -> String {
    let crossings = match session.crossings() {
        0 => "0 crossings".green().to_string(),
        1 => "1 crossing".yellow().to_string(),
        n => format!("{n} crossings").yellow().to_string(),
    };
    format!(
        "{crossings} | {} moves | {}",
        session.moves(),
        clock(session)
    )
}

fn print_board(session: &Session) {
    let puzzle = session.puzzle();
    println!("{}", format!("{} ({})", session.mode(), session.level()).bold());
    for (node, point) in puzzle.nodes.iter() {
        let label = format!("  node {node} at {point}");
        if session.held() == Some(node) {
            println!("{} {}", label, "(held)".cyan());
        } else {
            println!("{label}");
        }
    }
    let edges: Vec<String> = puzzle.edges().iter().map(ToString::to_string).collect();
    println!("  edges {}", edges.join(" "));
    println!("  {}", status(session));
}

/// Whether a clock tick deserves a line on the terminal.
fn tick_worth_showing(session: &Session) -> bool {
    let seconds = session.seconds();
    if session.counts_down() {
        seconds <= 5 || seconds % 10 == 0
    } else {
        seconds % 30 == 0
    }
}

impl Player for ConsolePlayer<'_> {
    async fn next_input(&mut self) -> Option<Input> {
        loop {
            let line = self.console.next_line().await?;
            match parse_command(&line) {
                Ok(Command::Play(input)) => return Some(input),
                Ok(Command::Help) => println!("{HELP}"),
                Err(CommandError::Empty) => {}
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
    }

    fn notify(&mut self, note: Note<'_>) {
        match note {
            Note::Dealt(session) => {
                println!();
                print_board(session);
                println!("{}", "Type `help` for commands.".dimmed());
            }
            Note::Board(session) => print_board(session),
            Note::Phase(phase) => println!("{} {phase}", "Multiplayer:".bold()),
            Note::Changed(session, change) => match change {
                Change::Ignored => {}
                Change::Grabbed(node) => println!("Holding node {node}"),
                Change::Moved(node) => println!(
                    "Node {node} at {} | {}",
                    session.puzzle().nodes[node],
                    status(session)
                ),
                Change::Released(node) => println!("Released node {node}"),
                Change::Tick => {
                    if tick_worth_showing(session) {
                        println!("{}", clock(session).dimmed());
                    }
                }
                Change::Jumped(node) => println!(
                    "{} node {node} jumped to {} | {}",
                    "Whoa!".magenta().bold(),
                    session.puzzle().nodes[node],
                    status(session)
                ),
                Change::Solved { score } => println!(
                    "{}",
                    format!("Solved in {} moves! Score {score}", session.moves())
                        .green()
                        .bold()
                ),
                Change::TimedOut => println!("{}", "Time is up.".red().bold()),
                Change::Lost => println!("{}", "Your opponent solved it first.".red().bold()),
                Change::Abandoned => println!("{}", "Game abandoned.".yellow()),
            },
        }
    }
}
