use crate::board::{Move, PlayerId};
use crate::game::GameState;
use crate::heuristic::WIN_VALUE;
use crate::rules::RulesSpec;
use std::collections::BTreeSet;

/// Index of a node inside the search arena.
pub type NodeId = usize;

/// A reachable position in the search graph.
///
/// Different move orders can reach the same position, so a node may have
/// several parents; the graph is a DAG rather than a tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Content hash of `state`.
    pub hash: u64,
    /// Set when a win is certain from this position.
    pub definite_winner: Option<PlayerId>,
    /// Per-player desirability, including the win adjustment once decided.
    /// Empty until the node is scored or resolved from its children.
    pub scores: Vec<f64>,
    pub state: GameState,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
    /// `moves_to_children[i]` leads to `children[i]`.
    pub moves_to_children: Vec<Move>,
    /// Encoded moves not yet tried from this position.
    pub moves: BTreeSet<usize>,
    /// Layer the node lives in; equal to plies from the root.
    pub depth: usize,
    /// Move chosen by backward induction.
    pub best_move: Option<Move>,
    /// Cleared when pruning leaves the node without parents.
    pub alive: bool,
}

impl SearchNode {
    pub fn new(state: GameState, hash: u64, moves: BTreeSet<usize>, depth: usize) -> Self {
        SearchNode {
            hash,
            definite_winner: None,
            scores: Vec::new(),
            state,
            parents: Vec::new(),
            children: Vec::new(),
            moves_to_children: Vec::new(),
            moves,
            depth,
            best_move: None,
            alive: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.definite_winner.is_some()
    }

    /// Player who moves from this position.
    pub fn mover(&self) -> PlayerId {
        self.state.player
    }

    /// Stores the heuristic vector, shifted by [`WIN_VALUE`] when decided.
    pub fn set_scores(&mut self, mut heuristic: Vec<f64>) {
        if let Some(winner) = self.definite_winner {
            for (p, score) in heuristic.iter_mut().enumerate() {
                if p == winner {
                    *score += WIN_VALUE;
                } else {
                    *score -= WIN_VALUE;
                }
            }
        }
        self.scores = heuristic;
    }

    /// Score of this node from `player`'s point of view.
    pub fn score_for(&self, player: PlayerId) -> f64 {
        self.scores.get(player).copied().unwrap_or(0.0)
    }

    /// Drops the edge to `child`, keeping the parallel arrays aligned.
    pub fn remove_child(&mut self, child: NodeId) {
        if let Some(i) = self.children.iter().position(|&c| c == child) {
            self.children.remove(i);
            self.moves_to_children.remove(i);
        }
    }
}

/// Candidate moves from the position the search starts at.
///
/// Under gravity, the lowest empty cell of each column. Otherwise an empty
/// board only tries its central cell(s), and any other board every free
/// neighbour of a stone.
pub fn initial_moves(spec: &RulesSpec, state: &GameState) -> BTreeSet<usize> {
    let board = &state.board;
    let width = board.width();
    let height = board.height();

    if spec.board.gravity {
        return (0..width)
            .filter_map(|col| board.lowest_empty(col))
            .map(|m| m.encode(width))
            .collect();
    }

    if board.stone_count() == 0 {
        let rows = [(height - 1) / 2, height / 2];
        let cols = [(width - 1) / 2, width / 2];
        return rows
            .iter()
            .flat_map(|&r| cols.iter().map(move |&c| Move::new(r, c)))
            .filter(|&m| state.is_legal(spec, m))
            .map(|m| m.encode(width))
            .collect();
    }

    board
        .stones()
        .flat_map(|(stone, _)| surrounding_moves(spec, state, stone))
        .collect()
}

/// Legal cells opened up next to `m`: the cell above under gravity, otherwise
/// the eight neighbours.
pub fn surrounding_moves(spec: &RulesSpec, state: &GameState, m: Move) -> Vec<usize> {
    let board = &state.board;
    let width = board.width();
    if spec.board.gravity {
        return board
            .step(m, -1, 0, 1)
            .filter(|&above| state.is_legal(spec, above))
            .map(|above| vec![above.encode(width)])
            .unwrap_or_default();
    }

    let mut moves = Vec::with_capacity(8);
    for dr in -1..=1 {
        for dc in -1..=1 {
            if let Some(cell) = board.step(m, dr, dc, 1) {
                if state.is_legal(spec, cell) {
                    moves.push(cell.encode(width));
                }
            }
        }
    }
    moves
}

/// Frontier of the position reached by playing `m` from a node whose frontier
/// was `parent_moves`.
pub fn child_moves(
    spec: &RulesSpec,
    parent_moves: &BTreeSet<usize>,
    child: &GameState,
    m: Move,
    captured: &[Move],
) -> BTreeSet<usize> {
    let width = child.board.width();
    let mut moves = parent_moves.clone();
    moves.remove(&m.encode(width));
    moves.extend(captured.iter().map(|c| c.encode(width)));
    moves.extend(surrounding_moves(spec, child, m));
    moves
}
