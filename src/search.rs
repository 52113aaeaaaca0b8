use crate::board::{Move, PlayerId};
use crate::error::SearchError;
use crate::game::GameState;
use crate::hash::ZobristTable;
use crate::heuristic::heuristic_scores;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use crate::rules::RulesSpec;
use crate::search_node::{NodeId, SearchNode, child_moves, initial_moves};
use log::{debug, info};
use std::collections::HashMap;

const BASE_DEPTH: usize = 3;

/// Tuning knobs for one search. Pruning constants have no deeper meaning than
/// "keeps the graph small enough".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Fixed depth in plies; `None` uses [`default_depth`].
    pub depth: Option<usize>,
    /// Thin each parent's children once a full round of turns lies below it.
    pub pruning: bool,
    /// Layers kept whole beyond one full round of turns.
    pub prune_offset: usize,
    /// Starting retain denominator: a parent keeps `1 / denominator` of its children.
    pub retain_denominator: usize,
    /// Never thin a parent below this many children.
    pub min_retained: usize,
    /// Adds the one-hot threat term to the heuristic.
    pub threat_bonus: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: None,
            pruning: true,
            prune_offset: 0,
            retain_denominator: 2,
            min_retained: 2,
            threat_bonus: false,
        }
    }
}

/// Plies to search: deeper for more players and for narrow or gravity boards.
pub fn default_depth(spec: &RulesSpec, num_players: usize) -> usize {
    let mut depth = BASE_DEPTH + num_players.saturating_sub(2);
    if spec.board.width < 8 {
        depth += 1;
    }
    if spec.board.width < 5 {
        depth += 2;
    }
    if spec.board.gravity {
        depth += 2;
    }
    depth
}

/// Counters describing one finished search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Layers actually grown; less than the configured depth when the game ends sooner.
    pub depth: usize,
    /// Nodes created, including the root.
    pub nodes_created: usize,
    /// Edges that reused an existing node instead of creating one.
    pub transpositions: usize,
    /// Edges cut by breadth pruning.
    pub pruned_edges: usize,
}

/// What the search settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Move for the player to move at the root.
    pub best_move: Move,
    /// Winner the search proved along the chosen line, if any.
    pub definite_winner: Option<PlayerId>,
    /// Backed-up score vector of the chosen line.
    pub scores: Vec<f64>,
    pub stats: SearchStats,
}

/// Picks a move for the player to move with the default settings.
///
/// `num_players` drives the depth policy.
pub fn choose_ai_move(
    spec: &RulesSpec,
    state: &GameState,
    num_players: usize,
) -> Result<Move, SearchError> {
    GameSearch::from_spec(*spec, num_players).choose_move(state)
}

/// Iterative grow/prune search with transposition merging and backward induction.
pub struct GameSearch<K: RandomGenerator> {
    spec: RulesSpec,
    num_players: usize,
    config: SearchConfig,
    random: K,
}

/// A builder for configuring a [`GameSearch`].
pub struct GameSearchBuilder<K: RandomGenerator> {
    spec: RulesSpec,
    num_players: usize,
    config: SearchConfig,
    random_generator: K,
}

impl<K: RandomGenerator> GameSearchBuilder<K> {
    /// Creates a builder with default settings for `num_players` players under `spec`.
    pub fn new(spec: RulesSpec, num_players: usize) -> Self {
        Self {
            spec,
            num_players,
            config: SearchConfig::default(),
            random_generator: K::default(),
        }
    }

    /// Sets the tie-breaking random source.
    pub fn with_random_generator(mut self, rg: K) -> Self {
        self.random_generator = rg;
        self
    }

    /// Fixes the search depth in plies instead of deriving it from the rules.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.config.depth = Some(depth);
        self
    }

    /// Enables or disables breadth pruning. Enabled by default.
    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.config.pruning = pruning;
        self
    }

    /// Adds the one-hot threat term to the heuristic. Disabled by default.
    pub fn with_threat_bonus(mut self, threat_bonus: bool) -> Self {
        self.config.threat_bonus = threat_bonus;
        self
    }

    /// Replaces every setting at once.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the configured [`GameSearch`].
    pub fn build(self) -> GameSearch<K> {
        GameSearch {
            spec: self.spec,
            num_players: self.num_players,
            config: self.config,
            random: self.random_generator,
        }
    }
}

impl GameSearch<StandardRandomGenerator> {
    /// A search with default settings and a non-deterministic random source.
    pub fn from_spec(spec: RulesSpec, num_players: usize) -> Self {
        GameSearchBuilder::new(spec, num_players).build()
    }
}

impl<K: RandomGenerator> GameSearch<K> {
    /// Returns a builder for configuring a search.
    pub fn builder(spec: RulesSpec, num_players: usize) -> GameSearchBuilder<K> {
        GameSearchBuilder::new(spec, num_players)
    }

    /// The settings this search runs with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Plies to search: the fixed depth if one was set, otherwise [`default_depth`].
    /// Never less than one.
    pub fn depth(&self) -> usize {
        self.config
            .depth
            .unwrap_or_else(|| default_depth(&self.spec, self.num_players))
            .max(1)
    }

    /// Runs a search and returns only the chosen move.
    pub fn choose_move(&mut self, state: &GameState) -> Result<Move, SearchError> {
        self.search(state).map(|outcome| outcome.best_move)
    }

    /// Runs a full search from `state`. The node graph lives only for this call.
    pub fn search(&mut self, state: &GameState) -> Result<SearchOutcome, SearchError> {
        let depth = self.depth();
        let zobrist = ZobristTable::new(self.spec.num_cells(), state.num_players(), &mut self.random);
        let mut graph = SearchGraph::new(&self.spec, &self.config, zobrist, state);

        for layer in 1..=depth {
            let grown = graph.grow();
            if grown > 0 {
                graph.stats.depth = layer;
            }
            if self.config.pruning {
                graph.prune(layer, self.num_players);
            }
            debug!(
                "layer {layer}: {grown} new nodes, {} live, {} transpositions so far",
                graph.layers[layer].len(),
                graph.stats.transpositions
            );
            if grown == 0 {
                break;
            }
        }

        graph.resolve(&mut self.random);
        let root = &graph.nodes[0];
        let best_move = root.best_move.ok_or(SearchError::NoLegalMoves)?;
        info!(
            "player {} plays ({}, {}) after {} nodes, predicted winner {:?}",
            root.mover(),
            best_move.row,
            best_move.col,
            graph.stats.nodes_created,
            root.definite_winner
        );
        Ok(SearchOutcome {
            best_move,
            definite_winner: root.definite_winner,
            scores: root.scores.clone(),
            stats: graph.stats,
        })
    }
}

/// Index-based arena holding the DAG of one search.
struct SearchGraph<'a> {
    spec: &'a RulesSpec,
    config: &'a SearchConfig,
    zobrist: ZobristTable,
    nodes: Vec<SearchNode>,
    /// Hash buckets; a hit is confirmed by comparing states.
    table: HashMap<u64, Vec<NodeId>>,
    layers: Vec<Vec<NodeId>>,
    /// Ply at which each node's `definite_winner` was decided.
    decided_at: Vec<usize>,
    stats: SearchStats,
}

impl<'a> SearchGraph<'a> {
    fn new(
        spec: &'a RulesSpec,
        config: &'a SearchConfig,
        zobrist: ZobristTable,
        state: &GameState,
    ) -> Self {
        let hash = zobrist.hash(state);
        let root = SearchNode::new(state.clone(), hash, initial_moves(spec, state), 0);
        let mut graph = Self {
            spec,
            config,
            zobrist,
            nodes: Vec::new(),
            table: HashMap::new(),
            layers: vec![Vec::new()],
            decided_at: Vec::new(),
            stats: SearchStats::default(),
        };
        graph.insert(root);
        graph
    }

    fn insert(&mut self, node: SearchNode) -> NodeId {
        let id = self.nodes.len();
        self.table.entry(node.hash).or_default().push(id);
        if let Some(layer) = self.layers.get_mut(node.depth) {
            layer.push(id);
        }
        self.decided_at.push(node.depth);
        self.nodes.push(node);
        self.stats.nodes_created += 1;
        id
    }

    fn lookup(&self, hash: u64, state: &GameState) -> Option<NodeId> {
        self.table
            .get(&hash)?
            .iter()
            .copied()
            .find(|&id| self.nodes[id].alive && self.nodes[id].state == *state)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, m: Move) {
        self.nodes[parent].children.push(child);
        self.nodes[parent].moves_to_children.push(m);
        self.nodes[child].parents.push(parent);
    }

    /// Expands every open node of the deepest layer into a new layer.
    /// Returns the number of nodes created.
    fn grow(&mut self) -> usize {
        let depth = self.layers.len();
        let width = self.spec.board.width;
        let frontier = self.layers[depth - 1].clone();
        self.layers.push(Vec::new());
        let mut created = 0;

        for parent in frontier {
            if !self.nodes[parent].alive || self.nodes[parent].is_terminal() {
                continue;
            }
            let moves: Vec<usize> = self.nodes[parent].moves.iter().copied().collect();
            for code in moves {
                let m = Move::decode(code, width);
                if !self.nodes[parent].state.is_legal(self.spec, m) {
                    continue;
                }
                let mut state = self.nodes[parent].state.clone();
                let captured = state.play_unchecked(self.spec, m);
                let hash = self.zobrist.hash(&state);

                if let Some(existing) = self.lookup(hash, &state) {
                    self.link(parent, existing, m);
                    self.stats.transpositions += 1;
                    continue;
                }

                let winner = state.check_victor(self.spec, m);
                let moves = match winner {
                    Some(_) => Default::default(),
                    None => child_moves(self.spec, &self.nodes[parent].moves, &state, m, &captured),
                };
                let scores = heuristic_scores(self.spec, &state, self.config.threat_bonus);
                let mut node = SearchNode::new(state, hash, moves, depth);
                node.definite_winner = winner;
                node.set_scores(scores);

                let child = self.insert(node);
                self.link(parent, child, m);
                created += 1;
            }
        }
        created
    }

    /// Thins the children of every node two layers above the newest one.
    fn prune(&mut self, newest: usize, num_players: usize) {
        let threshold = num_players + self.config.prune_offset;
        if newest < 2 || newest - 1 < threshold {
            return;
        }
        let thinned = newest - 1;
        let denominator = self.config.retain_denominator.max(1) + (thinned - threshold) / num_players.max(1);

        let parents = self.layers[newest - 2].clone();
        for parent in parents {
            if !self.nodes[parent].alive {
                continue;
            }
            let count = self.nodes[parent].children.len();
            if count <= denominator {
                continue;
            }
            let keep = count.div_ceil(denominator).max(self.config.min_retained);
            if keep >= count {
                continue;
            }

            let mover = self.nodes[parent].mover();
            let mut ranked: Vec<(NodeId, f64)> = self.nodes[parent]
                .children
                .iter()
                .map(|&c| (c, self.rank(c, mover)))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            for &(child, _) in &ranked[keep..] {
                self.sever(parent, child);
            }
        }

        for layer in &mut self.layers {
            layer.retain(|&id| self.nodes[id].alive);
        }
    }

    /// Single scalar used for pruning, from `mover`'s point of view.
    fn rank(&self, child: NodeId, mover: PlayerId) -> f64 {
        let node = &self.nodes[child];
        match node.definite_winner {
            Some(w) if w == mover => f64::INFINITY,
            Some(_) => f64::NEG_INFINITY,
            None => node.score_for(mover),
        }
    }

    /// Cuts one parent-child edge. A child left without parents is removed
    /// along with any descendants that become orphaned.
    fn sever(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].remove_child(child);
        self.nodes[child].parents.retain(|&p| p != parent);
        self.stats.pruned_edges += 1;

        let mut orphans = vec![child];
        while let Some(id) = orphans.pop() {
            if !self.nodes[id].parents.is_empty() || !self.nodes[id].alive {
                continue;
            }
            let node = &mut self.nodes[id];
            node.alive = false;
            node.moves_to_children.clear();
            for grandchild in std::mem::take(&mut node.children) {
                self.nodes[grandchild].parents.retain(|&p| p != id);
                orphans.push(grandchild);
            }
        }
    }

    /// Backward induction from the second-deepest layer up to the root.
    fn resolve<K: RandomGenerator>(&mut self, random: &mut K) {
        for depth in (0..self.layers.len().saturating_sub(1)).rev() {
            for i in 0..self.layers[depth].len() {
                let id = self.layers[depth][i];
                if !self.nodes[id].children.is_empty() {
                    self.choose_child(id, random);
                }
            }
        }
    }

    /// Picks the best child for the node's mover and adopts its outcome.
    ///
    /// A win beats everything, then undecided children by score, then losses.
    /// Faster wins and slower losses are preferred; remaining ties are random.
    fn choose_child<K: RandomGenerator>(&mut self, id: NodeId, random: &mut K) {
        let mover = self.nodes[id].mover();
        let children = &self.nodes[id].children;

        let class = |c: NodeId| match self.nodes[c].definite_winner {
            Some(w) if w == mover => 2,
            None => 1,
            Some(_) => 0,
        };
        let best_class = children.iter().map(|&c| class(c)).max().unwrap_or(0);
        let candidates: Vec<usize> = (0..children.len())
            .filter(|&i| class(children[i]) == best_class)
            .collect();

        let key = |i: usize| {
            let c = children[i];
            let urgency = match best_class {
                2 => -(self.decided_at[c] as f64),
                0 => self.decided_at[c] as f64,
                _ => 0.0,
            };
            (urgency, self.nodes[c].score_for(mover))
        };
        let best = candidates
            .iter()
            .map(|&i| key(i))
            .fold((f64::NEG_INFINITY, f64::NEG_INFINITY), |acc, k| {
                if k.0 > acc.0 || (k.0 == acc.0 && k.1 > acc.1) {
                    k
                } else {
                    acc
                }
            });
        let tied: Vec<usize> = candidates.into_iter().filter(|&i| key(i) == best).collect();
        let Some(&pick) = random.pick(&tied) else {
            return;
        };

        let chosen = children[pick];
        let best_move = self.nodes[id].moves_to_children[pick];
        let winner = self.nodes[chosen].definite_winner;
        let scores = self.nodes[chosen].scores.clone();
        self.decided_at[id] = self.decided_at[chosen];

        let node = &mut self.nodes[id];
        node.definite_winner = winner;
        node.scores = scores;
        node.best_move = Some(best_move);
    }
}
