//!===================================================================
//! 手番側の指し手の合法性判定と列挙
//!
//! 駒の動き、行きどころのない駒、二歩を満たす手を疑似合法手とし、
//! そこから自殺手と打ち歩詰めを除いたものを合法手とする。
//! 千日手などは扱わない。
//!===================================================================

use boolinator::Boolinator;

use crate::prelude::*;

//--------------------------------------------------------------------
// 利き
//--------------------------------------------------------------------

/// side の駒が sq に利いているかどうか。
pub fn is_attacked(board: &Board, side: Side, sq: Sq) -> bool {
    attacks(board, side).any(|(_, dst)| dst == sq)
}

/// side の全ての利きを (src, dst) で列挙する。dst には自駒のマスも含む。
fn attacks(board: &Board, side: Side) -> impl Iterator<Item = (Sq, Sq)> + '_ {
    Sq::iter_valid().flat_map(move |src| {
        board[src]
            .piece_of(side)
            .into_iter()
            .flat_map(move |pt| reach(board, side, src, pt).map(move |dst| (src, dst)))
    })
}

/// src にある side の駒 pt が届くマス。
fn reach(board: &Board, side: Side, src: Sq, pt: Piece) -> impl Iterator<Item = Sq> + '_ {
    // 桂が盤外へ跳ぶ場合、壁の外側まで出ることがある
    let steps = pt.steps(side).map(move |d| src + d).filter(|&sq| sq.is_valid());
    let slides = pt.slides(side).flat_map(move |d| ray(board, src, d));
    steps.chain(slides)
}

/// src から d 方向へ、最初に駒に当たるマスまで進む。
fn ray(board: &Board, src: Sq, d: i32) -> impl Iterator<Item = Sq> + '_ {
    let mut blocked = false;
    std::iter::successors(Some(src + d), move |&sq| Some(sq + d)).take_while(move |&sq| {
        !board[sq].is_wall() && !std::mem::replace(&mut blocked, !board[sq].is_empty())
    })
}

//--------------------------------------------------------------------
// 合法性
//--------------------------------------------------------------------

/// 手番側の玉に王手が掛かっているかどうか。
pub fn is_checked(pos: &Position) -> bool {
    let side = pos.side();
    pos.king_sq(side)
        .map_or(false, |sq| is_attacked(pos.board(), side.inv(), sq))
}

/// 直前に指した側の玉が取られる状態かどうか (直前の手が自殺手)。
fn is_king_exposed(pos: &Position) -> bool {
    let side = pos.side();
    pos.king_sq(side.inv())
        .map_or(false, |sq| is_attacked(pos.board(), side, sq))
}

/// 行きどころのない駒にならないかどうか。
fn can_stay(side: Side, pt: Piece, sq: Sq) -> bool {
    match pt {
        Piece::Pawn | Piece::Lance => sq.rel_rank(side) >= 2,
        Piece::Knight => sq.rel_rank(side) >= 3,
        _ => true,
    }
}

fn has_pawn_on_file(board: &Board, side: Side, file: i32) -> bool {
    (1..=9).any(|rank| board[Sq::from_file_rank(file, rank)].is_side_pt(side, Piece::Pawn))
}

/// 指し手の疑似合法性判定。
pub fn is_pseudo_legal(pos: &Position, mv: &Move) -> bool {
    let side = pos.side();
    let board = pos.board();

    match *mv {
        Move::Walk { src, dst, promote } => {
            let pt = unwrap_or_return!(board[src].piece_of(side), false);
            if board[dst].is_side(side) || !reach(board, side, src, pt).any(|sq| sq == dst) {
                return false;
            }

            let pt_dst = if promote {
                // 敵陣に入るか、敵陣から出るときだけ成れる
                if src.rel_rank(side) > 3 && dst.rel_rank(side) > 3 {
                    return false;
                }
                unwrap_or_return!(pt.to_promoted(), false)
            } else {
                pt
            };
            can_stay(side, pt_dst, dst)
        }
        Move::Drop { pt, dst } => {
            pt.is_hand()
                && pos.hand(side)[pt] > 0
                && board[dst].is_empty()
                && can_stay(side, pt, dst)
                && !(pt == Piece::Pawn && has_pawn_on_file(board, side, dst.file()))
        }
    }
}

/// 指し手の合法性判定。
/// 疑似合法であり、自殺手でも打ち歩詰めでもなければ合法。
pub fn is_legal(pos: &Position, mv: &Move) -> bool {
    if !is_pseudo_legal(pos, mv) {
        return false;
    }

    let mut after = pos.clone();
    if after.do_move(mv).is_err() || is_king_exposed(&after) {
        return false;
    }

    !(mv.dropped() == Some(Piece::Pawn) && is_mated(&after))
}

/// 手番側が詰んでいるかどうか。打ち歩詰め判定専用。
fn is_mated(pos: &Position) -> bool {
    is_checked(pos)
        && moves_pseudo_legal(pos).all(|mv| {
            let mut after = pos.clone();
            after.do_move(&mv).is_err() || is_king_exposed(&after)
        })
}

//--------------------------------------------------------------------
// 列挙
//--------------------------------------------------------------------

/// 手番側の合法手を列挙する。
pub fn moves_legal(pos: &Position) -> impl Iterator<Item = Move> + '_ {
    candidates(pos).filter(move |mv| is_legal(pos, mv))
}

/// 手番側の疑似合法手を列挙する。
pub fn moves_pseudo_legal(pos: &Position) -> impl Iterator<Item = Move> + '_ {
    candidates(pos).filter(move |mv| is_pseudo_legal(pos, mv))
}

/// 違法手を含む指し手の候補。疑似合法手は全てここに含まれる。
fn candidates(pos: &Position) -> impl Iterator<Item = Move> + '_ {
    let side = pos.side();

    let walks = attacks(pos.board(), side).flat_map(|(src, dst)| {
        [false, true]
            .iter()
            .map(move |&promote| Move::walk(src, dst, promote))
    });
    let drops = Piece::HANDS
        .iter()
        .copied()
        .filter(move |&pt| pos.hand(side)[pt] > 0)
        .flat_map(move |pt| {
            Sq::iter_valid()
                .filter_map(move |dst| pos.board()[dst].is_empty().as_some(Move::drop(pt, dst)))
        });

    walks.chain(drops)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    fn mv(s: &str) -> Move {
        Move::from_sfen(s).unwrap()
    }

    fn targets(board: &Board, side: Side, src: Sq) -> HashSet<Sq> {
        attacks(board, side)
            .filter(|&(s, _)| s == src)
            .map(|(_, dst)| dst)
            .collect()
    }

    #[test]
    fn test_attacks() {
        let pos = Position::startpos();
        let sq = Sq::from_file_rank;

        // 飛車の利きは自駒のマスで止まる (そのマスも含む)
        let rook = targets(pos.board(), Side::Sente, sq(2, 8));
        let expected: HashSet<_> = [3, 4, 5, 6, 7, 8]
            .iter()
            .map(|&file| sq(file, 8))
            .chain(vec![sq(1, 8), sq(2, 7), sq(2, 9)])
            .collect();
        assert_eq!(rook, expected);

        let knight = targets(pos.board(), Side::Gote, sq(8, 1));
        assert_eq!(knight, [sq(9, 3), sq(7, 3)].iter().copied().collect::<HashSet<_>>());

        // 桂は盤外に跳ばない
        let pos = Position::from_sfen("sfen 4k4/N8/9/9/9/9/9/9/4K4 b - 1").unwrap();
        assert!(targets(pos.board(), Side::Sente, sq(9, 2)).is_empty());

        // 角道が開くと角は３三の歩まで利く
        let mut pos = Position::startpos();
        pos.do_move(&mv("7g7f")).unwrap();
        assert!(is_attacked(pos.board(), Side::Sente, sq(3, 3)));
        assert!(!is_attacked(pos.board(), Side::Sente, sq(2, 2)));
        assert!(!is_checked(&pos));
    }

    #[test]
    fn test_startpos() {
        let pos = Position::startpos();

        // 初期局面の合法手は 30 手
        let mvs: HashSet<_> = moves_legal(&pos).collect();
        assert_eq!(mvs.len(), 30);
        assert!(mvs.contains(&mv("7g7f")));
        assert!(mvs.contains(&mv("2h1h")));
        assert!(mvs.iter().all(|mv| is_legal(&pos, mv)));

        for s in &["7g7e", "2h2f", "8h7g", "5i4i", "3c3d", "7g7f+", "1i1h+"] {
            assert!(!is_legal(&pos, &mv(s)), "{}", s);
        }
    }

    #[test]
    fn test_promotion() {
        let mut pos = Position::startpos();
        for s in &["7g7f", "3c3d"] {
            pos.do_move(&mv(s)).unwrap();
        }
        assert!(is_legal(&pos, &mv("8h2b+")));
        assert!(is_legal(&pos, &mv("8h2b")));

        // 行きどころのない駒
        let pos = Position::from_sfen("sfen 4k4/P8/9/9/9/9/9/9/4K4 b - 1").unwrap();
        assert!(!is_legal(&pos, &mv("9b9a")));
        assert!(is_legal(&pos, &mv("9b9a+")));
    }

    #[test]
    fn test_self_check() {
        // 先手玉５九、後手飛５一。５八の金が横に動くと自殺手
        let pos = Position::from_sfen("sfen 4r4/9/9/9/9/9/9/4G4/4K4 b - 1").unwrap();
        assert!(is_pseudo_legal(&pos, &mv("5h4h")));
        assert!(!is_legal(&pos, &mv("5h4h")));
        assert!(is_legal(&pos, &mv("5h5g")));
    }

    #[test]
    fn test_pawn_drop_mate() {
        // 後手玉１一、先手金１三 (香で支え)。１二歩打は打ち歩詰め
        let pos = Position::from_sfen("sfen 7nk/9/8G/8L/9/9/9/9/K8 b P 1").unwrap();
        let drop = mv("P*1b");
        assert!(is_pseudo_legal(&pos, &drop));
        assert!(!is_legal(&pos, &drop));
        assert!(!moves_legal(&pos).any(|m| m == drop));

        // 玉に逃げ道があれば打てる
        let pos = Position::from_sfen("sfen 8k/9/8G/8L/9/9/9/9/K8 b P 1").unwrap();
        assert!(is_legal(&pos, &drop));
    }

    #[test]
    fn test_nifu() {
        let mut pos = Position::startpos();
        for s in &["7g7f", "3c3d", "8h2b+", "3a2b"] {
            pos.do_move(&mv(s)).unwrap();
        }
        // 先手は角を持っているが歩は持っていない
        assert!(is_legal(&pos, &mv("B*5e")));
        assert!(!is_legal(&pos, &mv("P*5e")));
        assert!(!is_legal(&pos, &mv("B*5g")));

        let pos = Position::from_sfen("sfen 4k4/9/9/9/9/9/4P4/9/4K4 b P 1").unwrap();
        assert!(!is_legal(&pos, &mv("P*5e")));
        assert!(is_legal(&pos, &mv("P*4e")));
        // 一段目には打てない
        assert!(!is_legal(&pos, &mv("P*4a")));
    }
}
