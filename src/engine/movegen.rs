//! Move generation.
//!
//! Two layers: `pseudo_legal_moves` applies per-piece movement rules without
//! regard for king safety, and `legal_moves` filters those candidates by
//! making each one on a scratch copy, testing whether the mover's king is
//! attacked, and undoing it. The round-trip filter handles pins, discovered
//! checks, and illegal castling uniformly.

use crate::engine::board::{Position, BISHOP_DIRS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRS};
use crate::engine::types::{Color, GameStatus, Move, MoveKind, PieceType, Square};

/// Promotion targets, queen first so default ordering favours it.
const PROMOTION_TARGETS: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// All fully legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    let mut pseudo = Vec::with_capacity(64);
    for idx in 0..64u8 {
        let from = Square(idx);
        if let Some((color, piece)) = pos.piece_at(from) {
            if color == us {
                gen_from_square(pos, from, piece, &mut pseudo);
            }
        }
    }

    // Keep only moves that do not leave our own king attacked.
    let mut scratch = pos.clone();
    pseudo
        .into_iter()
        .filter(|&mv| {
            let undo = scratch.make_move(mv);
            let safe = !scratch.in_check(us);
            scratch.undo_move(mv, &undo);
            safe
        })
        .collect()
}

/// Legal moves originating from a single square. Empty if the square is
/// empty or holds an opponent piece.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    let mut moves = pseudo_legal_moves(pos, from);
    let us = pos.side_to_move;
    let mut scratch = pos.clone();
    moves.retain(|&mv| {
        let undo = scratch.make_move(mv);
        let safe = !scratch.in_check(us);
        scratch.undo_move(mv, &undo);
        safe
    });
    moves
}

/// Pseudo-legal moves from one square: movement rules only, king safety
/// ignored. Empty if the square does not hold a piece of the side to move.
pub fn pseudo_legal_moves(pos: &Position, from: Square) -> Vec<Move> {
    let mut moves = Vec::new();
    if let Some((color, piece)) = pos.piece_at(from) {
        if color == pos.side_to_move {
            gen_from_square(pos, from, piece, &mut moves);
        }
    }
    moves
}

/// Is `color`'s king attacked in this position?
#[inline]
pub fn is_in_check(pos: &Position, color: Color) -> bool {
    pos.in_check(color)
}

/// Classify the position given its legal moves: checkmate if there are none
/// and the side to move is in check, stalemate if there are none and it is
/// not, otherwise still in progress.
pub fn terminal_status(pos: &Position, legal: &[Move]) -> GameStatus {
    if !legal.is_empty() {
        return GameStatus::InProgress;
    }
    if pos.in_check(pos.side_to_move) {
        GameStatus::Checkmate(pos.side_to_move)
    } else {
        GameStatus::Stalemate
    }
}

// ---------------------------------------------------------------------------
// Per-piece generation
// ---------------------------------------------------------------------------

fn gen_from_square(pos: &Position, from: Square, piece: PieceType, moves: &mut Vec<Move>) {
    match piece {
        PieceType::Pawn => gen_pawn(pos, from, moves),
        PieceType::Knight => gen_leaper(pos, from, piece, &KNIGHT_OFFSETS, moves),
        PieceType::Bishop => gen_slider(pos, from, piece, &BISHOP_DIRS, moves),
        PieceType::Rook => gen_slider(pos, from, piece, &ROOK_DIRS, moves),
        PieceType::Queen => {
            gen_slider(pos, from, piece, &ROOK_DIRS, moves);
            gen_slider(pos, from, piece, &BISHOP_DIRS, moves);
        }
        PieceType::King => {
            gen_leaper(pos, from, piece, &KING_OFFSETS, moves);
            gen_castling(pos, from, moves);
        }
    }
}

fn gen_pawn(pos: &Position, from: Square, moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let file = from.file() as i8;
    let rank = from.rank() as i8;
    let fwd = us.forward();
    let (start_rank, promo_rank) = match us {
        Color::White => (1i8, 6i8),
        Color::Black => (6, 1),
    };

    // Single push, with double push from the start rank.
    if let Some(one) = Square::try_from_file_rank(file, rank + fwd) {
        if pos.piece_at(one).is_none() {
            push_pawn_move(from, one, None, rank == promo_rank, moves);
            if rank == start_rank {
                let two = Square::try_from_file_rank(file, rank + 2 * fwd)
                    .filter(|&sq| pos.piece_at(sq).is_none());
                if let Some(two) = two {
                    moves.push(Move::new(from, two, PieceType::Pawn, None));
                }
            }
        }
    }

    // Diagonal captures and en passant.
    for df in [-1i8, 1] {
        let Some(to) = Square::try_from_file_rank(file + df, rank + fwd) else {
            continue;
        };
        match pos.piece_at(to) {
            Some((color, captured)) if color != us => {
                push_pawn_move(from, to, Some(captured), rank == promo_rank, moves);
            }
            None if pos.en_passant == Some(to) => {
                moves.push(Move::with_kind(
                    from,
                    to,
                    PieceType::Pawn,
                    Some(PieceType::Pawn),
                    MoveKind::EnPassant,
                ));
            }
            _ => {}
        }
    }
}

/// Emit a pawn move, fanning out to all four promotion pieces when the pawn
/// reaches the last rank.
fn push_pawn_move(
    from: Square,
    to: Square,
    captured: Option<PieceType>,
    promoting: bool,
    moves: &mut Vec<Move>,
) {
    if promoting {
        for promo in PROMOTION_TARGETS {
            moves.push(Move::with_kind(
                from,
                to,
                PieceType::Pawn,
                captured,
                MoveKind::Promotion(promo),
            ));
        }
    } else {
        moves.push(Move::new(from, to, PieceType::Pawn, captured));
    }
}

fn gen_leaper(
    pos: &Position,
    from: Square,
    piece: PieceType,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    let us = pos.side_to_move;
    let file = from.file() as i8;
    let rank = from.rank() as i8;
    for &(df, dr) in offsets {
        let Some(to) = Square::try_from_file_rank(file + df, rank + dr) else {
            continue;
        };
        match pos.piece_at(to) {
            Some((color, _)) if color == us => {}
            Some((_, captured)) => moves.push(Move::new(from, to, piece, Some(captured))),
            None => moves.push(Move::new(from, to, piece, None)),
        }
    }
}

fn gen_slider(
    pos: &Position,
    from: Square,
    piece: PieceType,
    dirs: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    let us = pos.side_to_move;
    let file = from.file() as i8;
    let rank = from.rank() as i8;
    for &(df, dr) in dirs {
        let mut f = file + df;
        let mut r = rank + dr;
        while let Some(to) = Square::try_from_file_rank(f, r) {
            match pos.piece_at(to) {
                Some((color, _)) if color == us => break,
                Some((_, captured)) => {
                    moves.push(Move::new(from, to, piece, Some(captured)));
                    break;
                }
                None => moves.push(Move::new(from, to, piece, None)),
            }
            f += df;
            r += dr;
        }
    }
}

/// Castling: rights intact, the squares between king and rook empty, the king
/// neither in check nor crossing an attacked square. The destination square
/// is re-checked by the legality filter like any other move.
fn gen_castling(pos: &Position, from: Square, moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let them = !us;
    let rank_base: u8 = match us {
        Color::White => 0,
        Color::Black => 56,
    };

    // King must be on its home square with rights remaining.
    if from.0 != rank_base + 4 {
        return;
    }
    if pos.is_square_attacked(from, them) {
        return;
    }

    if pos.castling_rights.can_castle_kingside(us) {
        let f = Square(rank_base + 5);
        let g = Square(rank_base + 6);
        if pos.piece_at(f).is_none()
            && pos.piece_at(g).is_none()
            && !pos.is_square_attacked(f, them)
            && !pos.is_square_attacked(g, them)
        {
            moves.push(Move::with_kind(
                from,
                g,
                PieceType::King,
                None,
                MoveKind::CastleKingside,
            ));
        }
    }

    if pos.castling_rights.can_castle_queenside(us) {
        let b = Square(rank_base + 1);
        let c = Square(rank_base + 2);
        let d = Square(rank_base + 3);
        if pos.piece_at(b).is_none()
            && pos.piece_at(c).is_none()
            && pos.piece_at(d).is_none()
            && !pos.is_square_attacked(c, them)
            && !pos.is_square_attacked(d, them)
        {
            moves.push(Move::with_kind(
                from,
                c,
                PieceType::King,
                None,
                MoveKind::CastleQueenside,
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn has_move(moves: &[Move], from: &str, to: &str) -> bool {
        moves
            .iter()
            .any(|m| m.from == sq(from) && m.to == sq(to))
    }

    // ===================================================================
    // Counting known positions
    // ===================================================================

    #[test]
    fn starting_position_has_twenty_moves() {
        let moves = legal_moves(&Position::starting());
        assert_eq!(moves.len(), 20);
        // 16 pawn moves + 4 knight moves, no captures.
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test]
    fn kiwipete_has_forty_eight_moves() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(legal_moves(&p).len(), 48);
    }

    #[test]
    fn pinned_endgame_has_fourteen_moves() {
        let p = pos("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(legal_moves(&p).len(), 14);
    }

    #[test]
    fn promotion_heavy_position_has_six_moves() {
        let p = pos("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1");
        assert_eq!(legal_moves(&p).len(), 6);
    }

    #[test]
    fn talkchess_position_has_forty_four_moves() {
        let p = pos("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
        assert_eq!(legal_moves(&p).len(), 44);
    }

    // ===================================================================
    // Pawns
    // ===================================================================

    #[test]
    fn pawn_single_and_double_push() {
        let moves = legal_moves_from(&Position::starting(), sq("e2"));
        assert_eq!(moves.len(), 2);
        assert!(has_move(&moves, "e2", "e3"));
        assert!(has_move(&moves, "e2", "e4"));
    }

    #[test]
    fn pawn_blocked_cannot_push() {
        let p = pos("4k3/8/8/8/4p3/4P3/8/4K3 w - - 0 1");
        assert!(legal_moves_from(&p, sq("e3")).is_empty());
    }

    #[test]
    fn pawn_double_push_blocked_by_piece_on_third() {
        let p = pos("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        // The knight blocks the push and cannot be captured straight ahead.
        assert!(legal_moves_from(&p, sq("e2")).is_empty());
    }

    #[test]
    fn pawn_captures_diagonally_only() {
        let p = pos("4k3/8/8/3p1p2/4P3/8/8/4K3 w - - 0 1");
        let moves = legal_moves_from(&p, sq("e4"));
        assert_eq!(moves.len(), 3);
        assert!(has_move(&moves, "e4", "d5"));
        assert!(has_move(&moves, "e4", "f5"));
        assert!(has_move(&moves, "e4", "e5"));
    }

    #[test]
    fn pawn_promotion_yields_four_moves() {
        let p = pos("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let moves = legal_moves_from(&p, sq("e7"));
        assert_eq!(moves.len(), 4);
        let kinds: Vec<MoveKind> = moves.iter().map(|m| m.kind).collect();
        for promo in [
            PieceType::Queen,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
        ] {
            assert!(kinds.contains(&MoveKind::Promotion(promo)));
        }
    }

    #[test]
    fn en_passant_is_generated() {
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let moves = legal_moves_from(&p, sq("e5"));
        let ep: Vec<&Move> = moves.iter().filter(|m| m.kind == MoveKind::EnPassant).collect();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep[0].to, sq("f6"));
    }

    #[test]
    fn en_passant_expires_after_one_ply() {
        // Same position but the target square has lapsed.
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
        let moves = legal_moves_from(&p, sq("e5"));
        assert!(moves.iter().all(|m| m.kind != MoveKind::EnPassant));
    }

    #[test]
    fn en_passant_refused_when_it_exposes_the_king() {
        // Rook on the fifth rank skewers through both pawns; capturing en
        // passant would remove both blockers at once.
        let p = pos("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
        let moves = legal_moves_from(&p, sq("b5"));
        assert!(moves.iter().all(|m| m.kind != MoveKind::EnPassant));
    }

    // ===================================================================
    // Knights and sliders
    // ===================================================================

    #[test]
    fn knight_in_the_middle_has_eight_moves() {
        let p = pos("4k3/8/8/8/4N3/8/8/4K3 w - - 0 1");
        assert_eq!(legal_moves_from(&p, sq("e4")).len(), 8);
    }

    #[test]
    fn knight_in_the_corner_has_two_moves() {
        let p = pos("4k3/8/8/8/8/8/8/N3K3 w - - 0 1");
        assert_eq!(legal_moves_from(&p, sq("a1")).len(), 2);
    }

    #[test]
    fn rook_stops_at_blockers() {
        // Own pawn on e6 blocks up-file; enemy pawn on b4 can be captured.
        let p = pos("4k3/8/4P3/8/1p2R3/8/8/4K3 w - - 0 1");
        let moves = legal_moves_from(&p, sq("e4"));
        assert!(has_move(&moves, "e4", "e5"));
        assert!(!has_move(&moves, "e4", "e6"));
        assert!(has_move(&moves, "e4", "b4"));
        assert!(!has_move(&moves, "e4", "a4"));
    }

    #[test]
    fn queen_combines_rook_and_bishop() {
        let p = pos("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1");
        let moves = legal_moves_from(&p, sq("d4"));
        assert_eq!(moves.len(), 27);
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        // Knight on e2 is pinned by the rook on e8.
        let p = pos("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(legal_moves_from(&p, sq("e2")).is_empty());
    }

    // ===================================================================
    // Castling
    // ===================================================================

    #[test]
    fn both_castles_available() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleKingside));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleQueenside));
    }

    #[test]
    fn castle_blocked_by_piece() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3KB1R w KQkq - 0 1");
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves.iter().all(|m| m.kind != MoveKind::CastleKingside));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleQueenside));
    }

    #[test]
    fn no_castling_while_in_check() {
        // Black rook on e8 gives check down the open e-file.
        let p = pos("4r2k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(is_in_check(&p, Color::White));
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves
            .iter()
            .all(|m| m.kind != MoveKind::CastleKingside && m.kind != MoveKind::CastleQueenside));
    }

    #[test]
    fn no_castling_through_an_attacked_square() {
        // Black rook on f8 covers f1.
        let p = pos("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves.iter().all(|m| m.kind != MoveKind::CastleKingside));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleQueenside));
    }

    #[test]
    fn queenside_b_file_attack_does_not_block_castling() {
        // The b1 square may be attacked; only c1 and d1 matter for the king.
        let p = pos("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves.iter().any(|m| m.kind == MoveKind::CastleQueenside));
    }

    #[test]
    fn no_castling_without_rights() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w kq - 0 1");
        let moves = legal_moves_from(&p, sq("e1"));
        assert!(moves
            .iter()
            .all(|m| m.kind != MoveKind::CastleKingside && m.kind != MoveKind::CastleQueenside));
    }

    // ===================================================================
    // Check, checkmate, stalemate
    // ===================================================================

    #[test]
    fn all_legal_moves_resolve_check() {
        // Black rook eyes the e-file; only the e2 pawn shields the king.
        let p = pos("4r1k1/8/8/8/8/8/3PPP2/2BQKB2 w - - 0 1");
        let moves = legal_moves(&p);
        assert!(!moves.is_empty());
        let mut scratch = p.clone();
        for mv in moves {
            let undo = scratch.make_move(mv);
            assert!(!scratch.in_check(Color::White), "move {mv} leaves check");
            scratch.undo_move(mv, &undo);
        }
    }

    #[test]
    fn back_rank_mate_is_checkmate() {
        let p = pos("6k1/5ppp/8/8/8/8/8/4K2R b - - 0 1");
        // Not mate yet: rook is on h1.
        assert_eq!(terminal_status(&p, &legal_moves(&p)), GameStatus::InProgress);

        let p = pos("6k1/5ppp/8/8/8/8/8/4K1R1 b - - 0 1");
        assert_eq!(terminal_status(&p, &legal_moves(&p)), GameStatus::InProgress);

        let mated = pos("3R2k1/5ppp/8/8/8/8/8/4K3 b - - 0 1");
        let legal = legal_moves(&mated);
        assert!(legal.is_empty());
        assert_eq!(terminal_status(&mated, &legal), GameStatus::Checkmate(Color::Black));
    }

    #[test]
    fn scholars_mate_is_checkmate() {
        let p = pos("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
        let legal = legal_moves(&p);
        assert!(legal.is_empty());
        assert!(is_in_check(&p, Color::Black));
        assert_eq!(terminal_status(&p, &legal), GameStatus::Checkmate(Color::Black));
    }

    #[test]
    fn cornered_king_stalemate() {
        let p = pos("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
        let legal = legal_moves(&p);
        assert!(legal.is_empty());
        assert!(!is_in_check(&p, Color::Black));
        assert_eq!(terminal_status(&p, &legal), GameStatus::Stalemate);
    }

    #[test]
    fn in_progress_when_moves_remain() {
        let p = Position::starting();
        assert_eq!(
            terminal_status(&p, &legal_moves(&p)),
            GameStatus::InProgress
        );
    }

    // ===================================================================
    // Pseudo-legal layer
    // ===================================================================

    #[test]
    fn pseudo_legal_ignores_king_safety() {
        // Pinned knight still has pseudo-legal moves.
        let p = pos("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(!pseudo_legal_moves(&p, sq("e2")).is_empty());
        assert!(legal_moves_from(&p, sq("e2")).is_empty());
    }

    #[test]
    fn pseudo_legal_empty_for_wrong_side() {
        let p = Position::starting();
        assert!(pseudo_legal_moves(&p, sq("e7")).is_empty());
        assert!(pseudo_legal_moves(&p, sq("e4")).is_empty());
    }

    #[test]
    fn generation_leaves_position_untouched() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = p.to_fen();
        let _ = legal_moves(&p);
        assert_eq!(p.to_fen(), before);
    }
}
