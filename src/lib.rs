//! chesskit — a chess rules engine with legal move generation and minimax
//! move search.
//!
//! The crate is split in two:
//!   - [`engine`] — board representation, move generation with full legality
//!     (check, castling, en passant, promotion), terminal-status detection,
//!     and a [`Game`] session controller with move log and undo.
//!   - [`ai`] — move selection: negamax with alpha-beta pruning over the
//!     legal-move set, plus a seedable uniform-random engine.
//!
//! A typical turn loop:
//!
//! ```
//! use chesskit::{find_best_move, Game};
//!
//! let mut game = Game::new();
//! game.make_move_coords("e2", "e4", None).unwrap();
//!
//! let legal = game.legal_moves();
//! let reply = find_best_move(game.position(), &legal, 3).unwrap();
//! game.make_move(reply).unwrap();
//! ```

pub mod ai;
pub mod engine;

pub use ai::{find_best_move, find_random_move, AiEngine, MinimaxAi, RandomAi};
pub use engine::{
    legal_moves, legal_moves_from, terminal_status, ChessError, Color, Game, GameStatus, Move,
    MoveKind, PieceType, Position, Square,
};
