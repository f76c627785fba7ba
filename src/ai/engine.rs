//! AI Engine — trait definition, RandomAi, and MinimaxAi.
//!
//! The `AiEngine` trait defines the interface for all move-selection engines.
//! Two implementations are provided:
//!   - `RandomAi`  — uniform choice among the legal moves (fallback strength).
//!   - `MinimaxAi` — negamax search with alpha-beta pruning.
//!
//! Engines never generate moves themselves at the root: the caller passes the
//! legal-move set it already holds for the ply, and the chosen move is always
//! a member of that set.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::{ChessError, Move, MoveKind};

use super::evaluation::{evaluate_relative, INF, MATE};

// =========================================================================
// AiEngine trait
// =========================================================================

/// The move-selection interface.
pub trait AiEngine: Send + Sync {
    /// Select a move for the side to move. `legal` must be the legal moves of
    /// `pos`; an empty set is a caller error and yields `NoLegalMoves`.
    fn best_move(&self, pos: &Position, legal: &[Move], depth: u32) -> Result<Move, ChessError>;

    /// Human-readable name for this engine.
    fn name(&self) -> &str;
}

// =========================================================================
// Random selection
// =========================================================================

/// Pick a uniformly random legal move using the thread-local RNG.
pub fn find_random_move(legal: &[Move]) -> Result<Move, ChessError> {
    find_random_move_with(legal, &mut rand::thread_rng())
}

/// Pick a uniformly random legal move with a caller-supplied RNG, so tests
/// can seed the choice.
pub fn find_random_move_with<R: Rng>(legal: &[Move], rng: &mut R) -> Result<Move, ChessError> {
    legal.choose(rng).copied().ok_or(ChessError::NoLegalMoves)
}

/// Plays a random legal move. The RNG is owned so repeated calls through a
/// shared reference stay possible (`AiEngine` takes `&self`).
pub struct RandomAi {
    rng: Mutex<StdRng>,
}

impl RandomAi {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded variant for reproducible games.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomAi {
    fn default() -> Self {
        Self::new()
    }
}

impl AiEngine for RandomAi {
    fn best_move(&self, _pos: &Position, legal: &[Move], _depth: u32) -> Result<Move, ChessError> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        find_random_move_with(legal, &mut *rng)
    }

    fn name(&self) -> &str {
        "RandomAi"
    }
}

// =========================================================================
// Move ordering (MVV-LVA)
// =========================================================================

/// Score a move for ordering. Higher = searched first.
///
/// Captures use MVV-LVA (most valuable victim, least valuable attacker);
/// promotions follow, quiet moves last. The move record already carries both
/// the mover and the victim, so no board lookups are needed.
fn move_order_score(mv: &Move) -> i32 {
    let mut score = 0i32;

    if let Some(victim) = mv.captured {
        score += 10_000 + victim.value() * 10 - mv.piece.value();
    }

    if let MoveKind::Promotion(promo) = mv.kind {
        score += 8_000 + promo.value();
    }

    score
}

/// Sort moves best-first for alpha-beta search. The sort is stable, so equal
/// scores keep generation order and ties break deterministically.
fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|m| std::cmp::Reverse(move_order_score(m)));
}

// =========================================================================
// MinimaxAi — Negamax with alpha-beta pruning
// =========================================================================

/// Search statistics.
#[derive(Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub depth: u32,
    pub score: i32,
    pub time_ms: u64,
}

/// Per-search state: budget, clock, node counter.
struct SearchContext {
    max_depth: u32,
    time_limit: Option<Duration>,
    start_time: Instant,
    nodes: u64,
    aborted: bool,
}

impl SearchContext {
    fn new(max_depth: u32, time_limit: Option<Duration>) -> Self {
        Self {
            max_depth,
            time_limit,
            start_time: Instant::now(),
            nodes: 0,
            aborted: false,
        }
    }

    /// Check the time budget every 4096 nodes.
    #[inline]
    fn check_time(&mut self) {
        if self.nodes & 4095 == 0 {
            if let Some(limit) = self.time_limit {
                if self.start_time.elapsed() >= limit {
                    self.aborted = true;
                }
            }
        }
    }
}

/// Negamax with alpha-beta pruning.
///
/// Returns score from the side-to-move's perspective. Pruning never changes
/// the returned value relative to an exhaustive minimax, only the node count.
fn negamax(
    pos: &mut Position,
    depth: u32,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext,
) -> i32 {
    ctx.nodes += 1;
    ctx.check_time();
    if ctx.aborted {
        return 0;
    }

    // Generate legal moves first so checkmate / stalemate is detected at any
    // depth — a depth-1 search calling negamax(depth=0) must not miss
    // mate-in-1.
    let mut moves = legal_moves(pos);

    if moves.is_empty() {
        if pos.in_check(pos.side_to_move) {
            // Mate distance: deeper plies score lower, so faster mates win.
            return -(MATE - (ctx.max_depth - depth) as i32);
        }
        return 0; // Stalemate.
    }

    if depth == 0 {
        return evaluate_relative(pos);
    }

    order_moves(&mut moves);

    let mut best_score = -INF;

    for mv in &moves {
        let undo = pos.make_move(*mv);
        let score = -negamax(pos, depth - 1, -beta, -alpha, ctx);
        pos.undo_move(*mv, &undo);

        if ctx.aborted {
            return best_score.max(score);
        }

        if score > best_score {
            best_score = score;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break; // Beta cutoff.
        }
    }

    best_score
}

/// Minimax engine using negamax with alpha-beta pruning.
pub struct MinimaxAi {
    /// Optional time limit per search (if None, depth alone limits search).
    time_limit: Option<Duration>,
}

impl MinimaxAi {
    pub fn new() -> Self {
        Self { time_limit: None }
    }

    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
        }
    }

    /// Run a fixed-depth search over a non-empty legal-move set.
    /// Returns (best_move, stats).
    ///
    /// Total by construction: the first move in the ordered list is the
    /// incumbent before any search happens, so a move is always returned —
    /// on time-limit expiry it is the best fully evaluated root move so far.
    pub fn search_fixed_depth(
        &self,
        pos: &mut Position,
        legal: &[Move],
        depth: u32,
    ) -> (Move, SearchStats) {
        debug_assert!(!legal.is_empty(), "search requires at least one move");

        let mut ctx = SearchContext::new(depth, self.time_limit);
        let start = Instant::now();

        let mut moves = legal.to_vec();
        order_moves(&mut moves);

        let mut best_move = moves[0];
        let mut best_score = -INF;
        let mut alpha = -INF;

        for mv in &moves {
            let undo = pos.make_move(*mv);
            let score = -negamax(pos, depth.saturating_sub(1), -INF, -alpha, &mut ctx);
            pos.undo_move(*mv, &undo);

            if ctx.aborted {
                // Keep the incumbent from fully evaluated moves.
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = *mv;
            }
            if score > alpha {
                alpha = score;
            }
        }

        let stats = SearchStats {
            nodes: ctx.nodes,
            depth,
            score: best_score,
            time_ms: start.elapsed().as_millis() as u64,
        };
        (best_move, stats)
    }
}

impl Default for MinimaxAi {
    fn default() -> Self {
        Self::new()
    }
}

impl AiEngine for MinimaxAi {
    fn best_move(&self, pos: &Position, legal: &[Move], depth: u32) -> Result<Move, ChessError> {
        if legal.is_empty() {
            return Err(ChessError::NoLegalMoves);
        }

        // Depth 0 degenerates to a one-ply evaluation.
        let depth = depth.max(1);

        let mut scratch = pos.clone();
        let (mv, stats) = self.search_fixed_depth(&mut scratch, legal, depth);
        debug_assert!(legal.contains(&mv));

        debug!(
            mv = %mv,
            depth = stats.depth,
            nodes = stats.nodes,
            score = stats.score,
            time_ms = stats.time_ms,
            "search complete"
        );

        Ok(mv)
    }

    fn name(&self) -> &str {
        "MinimaxAi"
    }
}

/// Depth-bounded best-move search; the usual entry point for a turn loop.
pub fn find_best_move(pos: &Position, legal: &[Move], depth: u32) -> Result<Move, ChessError> {
    MinimaxAi::new().best_move(pos, legal, depth)
}

/// Convenience: create the default engine.
pub fn default_engine() -> MinimaxAi {
    MinimaxAi::new()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::evaluation::is_mate_score;
    use crate::engine::movegen::terminal_status;
    use crate::engine::types::{Color, GameStatus, PieceType, Square};

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    // --- Random selection ---

    #[test]
    fn random_move_is_always_legal() {
        let p = Position::starting();
        let legal = legal_moves(&p);
        for _ in 0..100 {
            let mv = find_random_move(&legal).unwrap();
            assert!(legal.contains(&mv), "illegal random move: {mv:?}");
        }
    }

    #[test]
    fn random_move_errors_on_empty_set() {
        assert!(matches!(
            find_random_move(&[]),
            Err(ChessError::NoLegalMoves)
        ));
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let p = Position::starting();
        let legal = legal_moves(&p);

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let a = find_random_move_with(&legal, &mut rng_a).unwrap();
            let b = find_random_move_with(&legal, &mut rng_b).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn random_ai_from_seed_is_reproducible() {
        let p = Position::starting();
        let legal = legal_moves(&p);
        let a = RandomAi::from_seed(7).best_move(&p, &legal, 0).unwrap();
        let b = RandomAi::from_seed(7).best_move(&p, &legal, 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn random_ai_errors_when_no_moves() {
        // Fool's mate — White has no legal moves.
        let p = pos("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let legal = legal_moves(&p);
        assert!(legal.is_empty());
        assert!(matches!(
            RandomAi::new().best_move(&p, &legal, 0),
            Err(ChessError::NoLegalMoves)
        ));
    }

    // --- Move ordering ---

    #[test]
    fn captures_ordered_before_quiet_moves() {
        let p = pos("r1bqkb1r/pppppppp/2n2n2/4P3/8/8/PPPP1PPP/RNBQKBNR b KQkq - 1 3");
        let mut moves = legal_moves(&p);
        order_moves(&mut moves);

        let first_capture = moves.iter().position(|m| m.is_capture());
        let first_quiet = moves.iter().position(|m| !m.is_capture());
        if let (Some(cap), Some(quiet)) = (first_capture, first_quiet) {
            assert!(cap < quiet, "captures should be searched first");
        }
    }

    #[test]
    fn valuable_victims_ordered_first() {
        let pawn_takes_queen = Move::new(
            Square::from_algebraic("e4").unwrap(),
            Square::from_algebraic("d5").unwrap(),
            PieceType::Pawn,
            Some(PieceType::Queen),
        );
        let queen_takes_pawn = Move::new(
            Square::from_algebraic("d1").unwrap(),
            Square::from_algebraic("d5").unwrap(),
            PieceType::Queen,
            Some(PieceType::Pawn),
        );
        assert!(move_order_score(&pawn_takes_queen) > move_order_score(&queen_takes_pawn));
    }

    #[test]
    fn ordering_is_deterministic() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut a = legal_moves(&p);
        let mut b = legal_moves(&p);
        order_moves(&mut a);
        order_moves(&mut b);
        assert_eq!(a, b);
    }

    // --- MinimaxAi ---

    #[test]
    fn minimax_finds_mate_in_one_white() {
        // Scholar's mate pattern: Qxf7# is available.
        let p = pos("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        let legal = legal_moves(&p);
        let mv = find_best_move(&p, &legal, 2).unwrap();
        assert_eq!(
            mv.to,
            Square::from_algebraic("f7").unwrap(),
            "should find Qxf7# mate-in-1"
        );
    }

    #[test]
    fn minimax_finds_mate_in_one_black() {
        // Fool's mate position: after 1.f3 e5 2.g4, Black plays Qh4#.
        let p = pos("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2");
        let legal = legal_moves(&p);
        let mv = find_best_move(&p, &legal, 2).unwrap();

        let mut after = p.clone();
        after.make_move(mv);
        let reply = legal_moves(&after);
        assert_eq!(
            terminal_status(&after, &reply),
            GameStatus::Checkmate(Color::White),
            "should find a mating move, got {mv}"
        );
    }

    #[test]
    fn minimax_captures_hanging_piece() {
        // White queen can capture an undefended black rook.
        let p = pos("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1");
        let legal = legal_moves(&p);
        let mv = find_best_move(&p, &legal, 3).unwrap();
        assert_eq!(
            mv.to,
            Square::from_algebraic("d5").unwrap(),
            "should capture hanging rook on d5"
        );
    }

    #[test]
    fn minimax_errors_on_empty_legal_set() {
        let p = pos("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(matches!(
            find_best_move(&p, &[], 3),
            Err(ChessError::NoLegalMoves)
        ));
    }

    #[test]
    fn minimax_is_deterministic() {
        let p = pos("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let legal = legal_moves(&p);
        let first = find_best_move(&p, &legal, 3).unwrap();
        for _ in 0..5 {
            assert_eq!(find_best_move(&p, &legal, 3).unwrap(), first);
        }
    }

    #[test]
    fn depth_zero_is_clamped_to_one_ply() {
        let p = pos("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1");
        let legal = legal_moves(&p);
        let mv = find_best_move(&p, &legal, 0).unwrap();
        assert!(legal.contains(&mv));
        // One ply is enough to take the free rook.
        assert_eq!(mv.to, Square::from_algebraic("d5").unwrap());
    }

    #[test]
    fn search_does_not_mutate_the_position() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = p.to_fen();
        let legal = legal_moves(&p);
        find_best_move(&p, &legal, 3).unwrap();
        assert_eq!(p.to_fen(), before);
    }

    #[test]
    fn search_with_time_limit_returns_legal_move() {
        let p = Position::starting();
        let legal = legal_moves(&p);
        let ai = MinimaxAi::with_time_limit(Duration::from_millis(50));
        let mv = ai.best_move(&p, &legal, 8).unwrap();
        assert!(legal.contains(&mv));
    }

    #[test]
    fn search_stats_populated() {
        let p = Position::starting();
        let legal = legal_moves(&p);
        let mut scratch = p.clone();
        let (mv, stats) = MinimaxAi::new().search_fixed_depth(&mut scratch, &legal, 3);
        assert!(legal.contains(&mv));
        assert!(stats.nodes > 0, "should have explored some nodes");
        assert_eq!(stats.depth, 3);
    }

    #[test]
    fn mate_score_prefers_faster_mate() {
        let p = pos("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        let legal = legal_moves(&p);
        let mut scratch = p.clone();
        let (_mv, stats) = MinimaxAi::new().search_fixed_depth(&mut scratch, &legal, 3);
        assert!(
            is_mate_score(stats.score),
            "score should indicate forced mate: {}",
            stats.score
        );
    }

    #[test]
    fn default_engine_works() {
        let engine = default_engine();
        assert_eq!(engine.name(), "MinimaxAi");
        let p = Position::starting();
        let legal = legal_moves(&p);
        let mv = engine.best_move(&p, &legal, 2).unwrap();
        assert!(legal.contains(&mv));
    }
}
