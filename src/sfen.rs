//!===================================================================
//! SFEN/USI 形式の読み込み
//!
//! 局面は `sfen <盤面> <手番> <持駒> [手数]` または `startpos`、
//! 棋譜はその後に `moves <指し手>...` が続く形。先頭の `position` は省略可能。
//!
//! 書き出しは指し手 1 手分だけ (Move の Display 用)。
//!===================================================================

use itertools::Itertools;

use crate::prelude::*;
use crate::{Error, Result};

/// 局面と、それに続く指し手列を読む。
pub fn parse_record(s: &str) -> Result<(Position, Vec<Move>)> {
    let mut tokens = s.split_ascii_whitespace().peekable();
    if tokens.peek() == Some(&"position") {
        tokens.next();
    }

    let pos = match tokens.next() {
        Some("startpos") => Position::startpos(),
        Some("sfen") => {
            let fields: Vec<&str> = tokens.peeking_take_while(|&tok| tok != "moves").collect();
            parse_sfen_fields(&fields)?
        }
        Some(tok) => return Err(Error::invalid_sfen(format!("unknown header: {}", tok))),
        None => return Err(Error::invalid_sfen("empty")),
    };

    let mvs = match tokens.next() {
        None => Vec::new(),
        Some("moves") => tokens.map(parse_move).collect::<Result<_>>()?,
        Some(tok) => return Err(Error::invalid_sfen(format!("expected moves: {}", tok))),
    };

    Ok((pos, mvs))
}

/// 指し手を含まない局面を読む。
pub fn parse_position(s: &str) -> Result<Position> {
    let (pos, mvs) = parse_record(s)?;
    chk!(mvs.is_empty(), Error::invalid_sfen("unexpected moves"));
    Ok(pos)
}

fn parse_sfen_fields(fields: &[&str]) -> Result<Position> {
    let (board, side, hands, ply) = match *fields {
        [board, side, hands] => (board, side, hands, "1"),
        [board, side, hands, ply] => (board, side, hands, ply),
        _ => return Err(Error::invalid_sfen(format!("field count: {}", fields.len()))),
    };

    let side = match side {
        "b" => Side::Sente,
        "w" => Side::Gote,
        _ => return Err(Error::invalid_sfen(format!("side: {}", side))),
    };
    let ply: i32 = ply
        .parse()
        .map_err(|_| Error::invalid_sfen(format!("ply: {}", ply)))?;
    chk!(ply >= 1, Error::invalid_sfen(format!("ply: {}", ply)));

    Ok(Position::new(side, parse_board(board)?, parse_hands(hands)?, ply))
}

fn parse_board(s: &str) -> Result<Board> {
    let err = || Error::invalid_sfen(format!("board: {}", s));

    let rows: Vec<&str> = s.split('/').collect();
    chk!(rows.len() == 9, err());

    let mut board = Board::empty();
    for (rank, row) in (1..).zip(rows) {
        // 各段は 9 筋から並ぶ
        let mut file = 9;
        let mut promoted = false;
        for c in row.chars() {
            if c == '+' {
                chk!(!promoted, err());
                promoted = true;
                continue;
            }
            if let Some(n) = c.to_digit(10) {
                chk!(!promoted && n >= 1, err());
                file -= n as i32;
            } else {
                chk!(file >= 1, err());
                let (side, pt) = parse_piece(c).ok_or_else(err)?;
                let pt = if promoted {
                    pt.to_promoted().ok_or_else(err)?
                } else {
                    pt
                };
                board[Sq::from_file_rank(file, rank)] = Cell::Piece(side, pt);
                file -= 1;
                promoted = false;
            }
            chk!(file >= 0, err());
        }
        chk!(file == 0 && !promoted, err());
    }

    Ok(board)
}

fn parse_hands(s: &str) -> Result<Hands> {
    let mut hands = Hands::default();
    if s == "-" {
        return Ok(hands);
    }

    let overflow = || Error::invalid_sfen(format!("hand count overflow: {}", s));

    // 枚数の前置 (例: 10P) は u8 に収まる範囲でのみ受け付ける
    let mut count: Option<u8> = None;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            let n = count
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|n| n.checked_add(d as u8))
                .ok_or_else(overflow)?;
            count = Some(n);
            continue;
        }

        let (side, pt) =
            parse_piece(c).ok_or_else(|| Error::invalid_sfen(format!("hand: {}", s)))?;
        chk!(pt.is_hand(), Error::invalid_sfen(format!("hand: {}", s)));
        let n = count.take().unwrap_or(1);
        chk!(n > 0, Error::invalid_sfen(format!("hand: {}", s)));

        let slot = &mut hands[side][pt];
        *slot = slot.checked_add(n).ok_or_else(overflow)?;
    }
    chk!(count.is_none(), Error::invalid_sfen(format!("hand: {}", s)));

    Ok(hands)
}

/// USI 形式の指し手を読む。盤上の駒の有無などは見ない。
pub fn parse_move(s: &str) -> Result<Move> {
    let err = || Error::invalid_sfen(format!("move: {}", s));

    let cs: Vec<char> = s.chars().collect();
    match cs[..] {
        [c, '*', file, rank] => {
            // 打つ駒は先手の表記 (大文字) で書く
            let (side, pt) = parse_piece(c).ok_or_else(err)?;
            chk!(side.is_sente() && pt.is_hand(), err());
            let dst = parse_sq(file, rank).ok_or_else(err)?;
            Ok(Move::drop(pt, dst))
        }
        [f0, r0, f1, r1, ref rest @ ..] => {
            let promote = match rest {
                [] => false,
                ['+'] => true,
                _ => return Err(err()),
            };
            let src = parse_sq(f0, r0).ok_or_else(err)?;
            let dst = parse_sq(f1, r1).ok_or_else(err)?;
            chk!(src != dst, err());
            Ok(Move::walk(src, dst, promote))
        }
        _ => Err(err()),
    }
}

fn parse_sq(file: char, rank: char) -> Option<Sq> {
    let file = file.to_digit(10).filter(|f| (1..=9).contains(f))?;
    let rank = ('a'..='i').position(|c| c == rank)?;
    Some(Sq::from_file_rank(file as i32, rank as i32 + 1))
}

/// 大文字なら先手、小文字なら後手の駒。
fn parse_piece(c: char) -> Option<(Side, Piece)> {
    let pt = match c.to_ascii_uppercase() {
        'P' => Piece::Pawn,
        'L' => Piece::Lance,
        'N' => Piece::Knight,
        'S' => Piece::Silver,
        'B' => Piece::Bishop,
        'R' => Piece::Rook,
        'G' => Piece::Gold,
        'K' => Piece::King,
        _ => return None,
    };
    let side = if c.is_ascii_uppercase() {
        Side::Sente
    } else {
        Side::Gote
    };
    Some((side, pt))
}

pub fn move_to_sfen(mv: &Move) -> String {
    let sq = |sq: Sq| format!("{}{}", sq.file(), (b'a' + (sq.rank() - 1) as u8) as char);

    match *mv {
        Move::Walk { src, dst, promote } => {
            format!("{}{}{}", sq(src), sq(dst), if promote { "+" } else { "" })
        }
        Move::Drop { pt, dst } => {
            let c = match pt {
                Piece::Pawn => 'P',
                Piece::Lance => 'L',
                Piece::Knight => 'N',
                Piece::Silver => 'S',
                Piece::Bishop => 'B',
                Piece::Rook => 'R',
                _ => 'G',
            };
            format!("{}*{}", c, sq(dst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move() {
        for s in &["7g7f", "8h2b+", "P*5e", "G*1a"] {
            assert_eq!(parse_move(s).unwrap().to_string(), *s);
        }

        assert_eq!(
            parse_move("8h2b+").unwrap(),
            Move::walk(Sq::from_file_rank(8, 8), Sq::from_file_rank(2, 2), true)
        );
        assert_eq!(
            parse_move("S*4c").unwrap(),
            Move::drop(Piece::Silver, Sq::from_file_rank(4, 3))
        );

        for s in &["", "7g7g", "7g7j", "0a1a", "7g7f=", "p*5e", "K*5e", "+P*5e", "7g7f++"] {
            assert!(parse_move(s).is_err(), "{}", s);
        }
    }

    #[test]
    fn test_position() {
        let pos = parse_position("sfen 4k4/9/9/9/9/9/9/+R8/4K4 w 2Pb 7").unwrap();
        assert_eq!(pos.side(), Side::Gote);
        assert_eq!(pos.ply(), 7);
        assert!(pos.board()[Sq::from_file_rank(5, 1)].is_side_pt(Side::Gote, Piece::King));
        assert!(pos.board()[Sq::from_file_rank(9, 8)].is_side_pt(Side::Sente, Piece::Dragon));
        assert_eq!(pos.hand(Side::Sente)[Piece::Pawn], 2);
        assert_eq!(pos.hand(Side::Gote)[Piece::Bishop], 1);

        // 手数は省略できる
        let pos = parse_position("position sfen 4k4/9/9/9/9/9/9/9/4K4 b -").unwrap();
        assert_eq!(pos.ply(), 1);

        for s in &[
            "sfen 4k4/9/9/9/9/9/9/9 b - 1",
            "sfen 4k5/9/9/9/9/9/9/9/4K4 b - 1",
            "sfen 4k4/9/9/9/9/9/9/9/4K3 b - 1",
            "sfen 4k4/9/9/9/9/9/9/9/4+K4 b - 1",
            "sfen 4k4/9/9/9/9/9/9/9/4K4 x - 1",
            "sfen 4k4/9/9/9/9/9/9/9/4K4 b K 1",
            "sfen 4k4/9/9/9/9/9/9/9/4K4 b 0P 1",
            "sfen 4k4/9/9/9/9/9/9/9/4K4 b 2 1",
            "startpos moves 7g7f",
            "foo",
        ] {
            assert!(parse_position(s).is_err(), "{}", s);
        }
    }

    #[test]
    fn test_hand_count_overflow() {
        let err = parse_position("sfen 4k4/9/9/9/9/9/9/9/4K4 b 300P 1").unwrap_err();
        assert!(matches!(err, Error::InvalidSfen(_)), "{}", err);

        // 1 つずつは収まっても合計で溢れる
        let err = parse_position("sfen 4k4/9/9/9/9/9/9/9/4K4 b 200P60P 1").unwrap_err();
        assert!(matches!(err, Error::InvalidSfen(_)), "{}", err);

        let pos = parse_position("sfen 4k4/9/9/9/9/9/9/9/4K4 b 255P 1").unwrap();
        assert_eq!(pos.hand(Side::Sente)[Piece::Pawn], 255);
    }

    #[test]
    fn test_record() {
        let (pos, mvs) = parse_record("position startpos moves 7g7f 3c3d").unwrap();
        assert_eq!(pos, Position::startpos());
        assert_eq!(mvs.len(), 2);

        let (pos, mvs) = parse_record(
            "sfen lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1 moves 2g2f",
        )
        .unwrap();
        assert!(pos.is_startpos_layout());
        assert_eq!(mvs, vec![parse_move("2g2f").unwrap()]);

        assert!(parse_record("startpos 7g7f").is_err());
        assert!(parse_record("startpos moves 7g7f 3c3x").is_err());
    }
}
