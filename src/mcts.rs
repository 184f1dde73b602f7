//! Monte Carlo Tree Search with UCT selection and random rollouts
//!
//! Nodes live in an arena (`Tree`) and refer to each other by [`NodeId`].
//! The parent link is only followed upwards during backpropagation; the arena
//! owns every node and is dropped as a whole once a move is chosen.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, trace};

use crate::{
    game_state::{GameState, Status},
    grid::Player,
};

/// Exploration constant of the UCT formula; `sqrt(2)` gives `sqrt(2 ln N / n)`
pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// How long a search runs
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Budget {
    /// A fixed number of select/expand/simulate/backpropagate rounds
    Iterations(u32),
    /// As many rounds as fit in the given wall-clock time
    Deadline(Duration),
}

impl Budget {
    fn exhausted(&self, iterations: u32, start: Instant) -> bool {
        match *self {
            Budget::Iterations(limit) => iterations >= limit,
            Budget::Deadline(limit) => start.elapsed() >= limit,
        }
    }
}

/// Index of a node in its [`Tree`]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug)]
pub struct Node {
    pub state: GameState,
    pub parent: Option<NodeId>,
    /// The column played from the parent to reach this node (`None` for the root)
    pub column: Option<usize>,
    /// The player whose move led to this node; `wins` are counted for this player
    pub mover: Player,
    pub children: Vec<NodeId>,
    pub wins: i64,
    pub visits: u32,
    unexplored: Vec<usize>,
}

impl Node {
    fn new(state: GameState, parent: Option<NodeId>, column: Option<usize>, mover: Player) -> Self {
        // popping from the back hands out columns in ascending order
        let mut unexplored = state.valid_columns();
        unexplored.reverse();
        Self {
            state,
            parent,
            column,
            mover,
            children: Vec::new(),
            wins: 0,
            visits: 0,
            unexplored,
        }
    }

    /// Columns not yet turned into children
    pub fn unexplored(&self) -> &[usize] {
        &self.unexplored
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.unexplored.is_empty()
    }

    /// Average result for `mover`, 0 if never visited
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins as f64 / self.visits as f64
        }
    }

    /// UCT score of this node as a child of a node with `parent_visits`
    ///
    /// Unvisited nodes score infinity so they are always tried first.
    pub fn uct_score(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = f64::from(parent_visits.max(1));
        self.mean_value() + exploration * (parent_visits.ln() / f64::from(self.visits)).sqrt()
    }

    /// Plays uniformly random moves from this node to the end of the game
    ///
    /// Returns +1 if `mover` wins, -1 if they lose and 0 for a tie.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let mut grid = *self.state.grid();
        let mut player = self.state.current_player();

        let status = loop {
            match Status::of(&grid) {
                Status::InProgress => {}
                status => break status,
            }
            let columns = grid.valid_columns();
            let column = columns[rng.gen_range(0..columns.len())];
            grid.play(column, player);
            player = player.opponent();
        };

        match status {
            Status::Won(winner) if winner == self.mover => 1,
            Status::Won(_) => -1,
            _ => 0,
        }
    }
}

/// Arena holding every node of one search
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(root: GameState) -> Self {
        let mover = root.current_player().opponent();
        Self {
            nodes: vec![Node::new(root, None, None, mover)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// The child of `id` with the highest UCT score, the first one on ties
    pub fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &node.children {
            let score = self.get(child).uct_score(node.visits, exploration);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child, score)),
            }
        }
        best.map(|(child, _)| child)
    }

    /// Descends from the root while nodes are fully expanded and have children
    pub fn select(&self, exploration: f64) -> NodeId {
        let mut id = self.root();
        loop {
            let node = self.get(id);
            if !node.is_fully_expanded() || node.children.is_empty() {
                return id;
            }
            match self.select_child(id, exploration) {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Turns the next unexplored column of `id` into a child and returns it
    pub fn expand(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.get_mut(id);
        let column = node.unexplored.pop()?;
        let mover = node.state.current_player();
        // the column came from the node's own valid columns
        let state = node.state.with_move(column).ok()?;

        let child = NodeId(self.nodes.len() as u32);
        self.nodes
            .push(Node::new(state, Some(id), Some(column), mover));
        self.get_mut(id).children.push(child);
        Some(child)
    }

    /// Adds one visit and `result` to `leaf`, then walks to the root flipping
    /// the sign of `result` at every step
    pub fn backpropagate(&mut self, leaf: NodeId, result: i64) {
        let mut current = Some(leaf);
        let mut result = result;
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.wins += result;
            result = -result;
            current = node.parent;
        }
    }

    /// The most visited child of the root, the first expanded one on ties
    pub fn best_child(&self) -> Option<&Node> {
        let mut best: Option<&Node> = None;
        for &child in &self.get(self.root()).children {
            let node = self.get(child);
            match best {
                Some(current) if node.visits <= current.visits => {}
                _ => best = Some(node),
            }
        }
        best
    }

    pub fn best_column(&self) -> Option<usize> {
        self.best_child().and_then(|node| node.column)
    }
}

/// A Monte Carlo Tree Search agent
#[derive(Clone, Debug)]
pub struct Mcts {
    exploration: f64,
    rng: StdRng,
}

impl Mcts {
    /// Creates an agent; the same `seed` gives the same rollouts
    pub fn new(exploration: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { exploration, rng }
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    /// One round of selection, expansion, simulation and backpropagation
    pub fn iterate(&mut self, tree: &mut Tree) {
        let mut id = tree.select(self.exploration);
        if let Some(child) = tree.expand(id) {
            id = child;
        }
        let result = tree.get(id).simulate(&mut self.rng);
        trace!(node = id.0, result, "mcts rollout");
        tree.backpropagate(id, result);
    }

    /// Grows a tree from `root` until `budget` runs out
    pub fn run(&mut self, root: &GameState, budget: Budget) -> Tree {
        let mut tree = Tree::new(*root);
        let start = Instant::now();
        let mut iterations = 0;

        while !budget.exhausted(iterations, start) {
            self.iterate(&mut tree);
            iterations += 1;
        }

        debug!(
            iterations,
            nodes = tree.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mcts search finished"
        );
        tree
    }

    /// Picks a column for the player to move in `root`
    ///
    /// The most visited root child wins. Without any children (a zero budget)
    /// a uniformly random legal column is returned. `None` only for a decided game.
    pub fn search(&mut self, root: &GameState, budget: Budget) -> Option<usize> {
        let tree = self.run(root, budget);
        if let Some(best) = tree.best_child() {
            debug!(
                column = ?best.column,
                visits = best.visits,
                wins = best.wins,
                "mcts chose the most visited column"
            );
            return best.column;
        }
        root.valid_columns().choose(&mut self.rng).copied()
    }
}
