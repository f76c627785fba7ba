//! Move selection: search engines and static evaluation.

pub mod engine;
pub mod evaluation;

pub use engine::{
    default_engine, find_best_move, find_random_move, find_random_move_with, AiEngine, MinimaxAi,
    RandomAi, SearchStats,
};
pub use evaluation::{evaluate, evaluate_relative, is_mate_score, INF, MATE};
