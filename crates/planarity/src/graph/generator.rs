use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{MAX_EDGES, MIN_EDGES, NODE_COUNT, NodeId, Nodes, Puzzle, topology};
use crate::geometry::{MAX_X, MAX_Y, MIN_X, MIN_Y, Point};

/// Slopes closer than this are treated as parallel.
pub const EPSILON: f64 = 0.00001;
/// Lines in every arrangement.
pub const LINE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("gave up after {attempts} rejected draws")]
    Exhausted { attempts: u32 },

    #[error("invalid coefficient range {min}..={max}")]
    InvalidRange { min: i32, max: i32 },
}

/// The line `a·x + b·y + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub a: i32,
    pub b: i32,
    pub c: i32,
}

impl Line {
    pub const fn new(a: i32, b: i32, c: i32) -> Self {
        Self { a, b, c }
    }

    /// `a = b = 0` describes no line at all.
    pub fn is_degenerate(&self) -> bool {
        self.a == 0 && self.b == 0
    }

    /// Slope `-a/b`, or `None` for a vertical line.
    pub fn slope(&self) -> Option<f64> {
        (self.b != 0).then(|| -(self.a as f64) / self.b as f64)
    }

    pub fn is_parallel_to(&self, other: &Line) -> bool {
        match (self.slope(), other.slope()) {
            (None, None) => true,
            (Some(m1), Some(m2)) => (m1 - m2).abs() < EPSILON,
            _ => false,
        }
    }

    fn wide(&self) -> [i128; 3] {
        [self.a.into(), self.b.into(), self.c.into()]
    }

    /// Intersection point by Cramer's rule, `None` when parallel.
    pub fn intersection(&self, other: &Line) -> Option<(f64, f64)> {
        let [a1, b1, c1] = self.wide();
        let [a2, b2, c2] = other.wide();
        let det = a1 * b2 - a2 * b1;
        if det == 0 {
            return None;
        }
        let det = det as f64;
        let x = (b1 * c2 - b2 * c1) as f64 / det;
        let y = (a2 * c1 - a1 * c2) as f64 / det;
        Some((x, y))
    }
}

/// Whether three lines pass through one point (their coefficient determinant is zero).
///
/// Exact for every `i32` coefficient: each term fits in 96 bits.
pub fn are_concurrent(l1: &Line, l2: &Line, l3: &Line) -> bool {
    let [a1, b1, c1] = l1.wide();
    let [a2, b2, c2] = l2.wide();
    let [a3, b3, c3] = l3.wide();
    let det = a1 * (b2 * c3 - b3 * c2) - b1 * (a2 * c3 - a3 * c2) + c1 * (a2 * b3 - a3 * b2);
    det == 0
}

/// Lexicographic `K`-subsets of `0..n`, without allocating.
#[derive(Debug, Clone)]
pub struct Combinations<const K: usize> {
    n: usize,
    next: Option<[usize; K]>,
}

impl<const K: usize> Combinations<K> {
    pub fn new(n: usize) -> Self {
        let next = (K <= n).then(|| std::array::from_fn(|i| i));
        Self { n, next }
    }
}

impl<const K: usize> Iterator for Combinations<K> {
    type Item = [usize; K];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut idx = current;
        self.next = None;
        // Rightmost slot that can still be bumped.
        for i in (0..K).rev() {
            if idx[i] < self.n - K + i {
                idx[i] += 1;
                for j in i + 1..K {
                    idx[j] = idx[j - 1] + 1;
                }
                self.next = Some(idx);
                break;
            }
        }
        Some(current)
    }
}

/// Four lines in general position plus their pairwise intersections.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub lines: [Line; LINE_COUNT],
    pub intersections: [(f64, f64); 6],
}

impl Arrangement {
    /// Accept the lines only if no two are parallel and no three are concurrent.
    pub fn from_lines(lines: [Line; LINE_COUNT]) -> Option<Self> {
        if lines.iter().any(Line::is_degenerate) {
            return None;
        }
        if Combinations::<3>::new(LINE_COUNT)
            .any(|[i, j, k]| are_concurrent(&lines[i], &lines[j], &lines[k]))
        {
            return None;
        }
        if Combinations::<2>::new(LINE_COUNT).any(|[i, j]| lines[i].is_parallel_to(&lines[j])) {
            return None;
        }

        let mut intersections = [(0.0, 0.0); 6];
        for (slot, [i, j]) in intersections.iter_mut().zip(Combinations::<2>::new(LINE_COUNT)) {
            *slot = lines[i].intersection(&lines[j])?;
        }
        Some(Self {
            lines,
            intersections,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub coefficient_min: i32,
    pub coefficient_max: i32,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            coefficient_min: 1,
            coefficient_max: 10,
            max_attempts: Some(10_000),
        }
    }
}

/// One generated puzzle with the work it took.
#[derive(Debug, Clone)]
pub struct Generated {
    pub puzzle: Puzzle,
    pub arrangement: Arrangement,
    /// Rejected draws (arrangements and layouts) before success.
    pub rejections: u32,
}

pub struct Generator<R = StdRng> {
    rng: R,
    config: GeneratorConfig,
}

impl Generator<StdRng> {
    /// Reproducible generator.
    pub fn from_seed(seed: u64, config: GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::new(StdRng::seed_from_u64(seed), config)
    }

    /// Generator seeded from the operating system.
    pub fn from_entropy(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::new(StdRng::from_os_rng(), config)
    }
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R, config: GeneratorConfig) -> Result<Self, GeneratorError> {
        if config.coefficient_min > config.coefficient_max {
            return Err(GeneratorError::InvalidRange {
                min: config.coefficient_min,
                max: config.coefficient_max,
            });
        }
        Ok(Self { rng, config })
    }

    pub fn generate(&mut self) -> Result<Puzzle, GeneratorError> {
        self.generate_detailed().map(|g| g.puzzle)
    }

    /// Deal a puzzle: a valid arrangement, a random layout and a topology
    /// prefix of 10 to 12 edges, redrawing the layout until it has a crossing.
    pub fn generate_detailed(&mut self) -> Result<Generated, GeneratorError> {
        let mut rejections = 0;
        let arrangement = self.arrangement(&mut rejections)?;
        let edges = topology(self.rng.random_range(MIN_EDGES..=MAX_EDGES));

        let puzzle = loop {
            let nodes = self.random_layout();
            let puzzle = Puzzle {
                nodes,
                edges: edges.clone(),
            };
            if puzzle.crossings() > 0 {
                break puzzle;
            }
            trace!("layout has no crossings, redrawing");
            self.reject(&mut rejections)?;
        };

        debug!(
            edges = puzzle.edges().len(),
            crossings = puzzle.crossings(),
            rejections,
            "generated puzzle"
        );
        Ok(Generated {
            puzzle,
            arrangement,
            rejections,
        })
    }

    /// Draw four lines until they are in general position.
    #[cfg(test)]
    pub fn draw_arrangement(&mut self) -> Result<Arrangement, GeneratorError> {
        self.arrangement(&mut 0)
    }

    fn arrangement(&mut self, rejections: &mut u32) -> Result<Arrangement, GeneratorError> {
        loop {
            let lines = std::array::from_fn(|_| self.random_line());
            if let Some(arrangement) = Arrangement::from_lines(lines) {
                return Ok(arrangement);
            }
            trace!(?lines, "rejected line arrangement");
            self.reject(rejections)?;
        }
    }

    fn reject(&self, rejections: &mut u32) -> Result<(), GeneratorError> {
        *rejections += 1;
        match self.config.max_attempts {
            Some(max) if *rejections >= max => Err(GeneratorError::Exhausted {
                attempts: *rejections,
            }),
            _ => Ok(()),
        }
    }

    fn random_line(&mut self) -> Line {
        let range = self.config.coefficient_min..=self.config.coefficient_max;
        Line::new(
            self.rng.random_range(range.clone()),
            self.rng.random_range(range.clone()),
            self.rng.random_range(range),
        )
    }

    fn random_layout(&mut self) -> Nodes {
        Nodes(std::array::from_fn(|_| self.random_point()))
    }

    /// Uniform point inside the playfield.
    pub fn random_point(&mut self) -> Point {
        Point::new(
            self.rng.random_range(MIN_X..=MAX_X),
            self.rng.random_range(MIN_Y..=MAX_Y),
        )
    }

    /// Uniform node over all six.
    pub fn random_node(&mut self) -> NodeId {
        NodeId::fixed(self.rng.random_range(0..NODE_COUNT as u8))
    }
}
