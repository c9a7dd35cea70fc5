//!===================================================================
//! 戦型判定用の述語
//!
//! 述語はすべて (Tracker, 評価する側) を受け取って整数コードを返す純粋関数。
//! どんな軌跡に対しても値が定義されており、失敗しない。
//!
//! マスはすべて「評価する側から見た」相対座標で書く (後手なら 180 度回転)。
//!===================================================================

use crate::piece_id::{PieceId, Wing};
use crate::prelude::*;
use crate::trace::{Location, Tracker, Trajectory};

pub type Predicate = fn(&Tracker, Side) -> i32;

/// 名前付きの述語。CLI での一覧表示や分類木のノードが参照する。
#[derive(Clone, Copy)]
pub struct PredicateDef {
    pub name: &'static str,
    pub func: Predicate,
}

impl PredicateDef {
    pub fn eval(&self, tracker: &Tracker, side: Side) -> i32 {
        (self.func)(tracker, side)
    }
}

impl std::fmt::Debug for PredicateDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PredicateDef").field(&self.name).finish()
    }
}

impl PartialEq for PredicateDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PredicateDef {}

macro_rules! predicate_defs {
    ($($konst:ident => $func:ident),* $(,)?) => {
        $(
            pub const $konst: PredicateDef = PredicateDef {
                name: stringify!($func),
                func: $func,
            };
        )*

        pub const ALL: &[PredicateDef] = &[$($konst),*];
    };
}

predicate_defs! {
    ROOK_ROAD_PAWN => rook_road_pawn,
    RIGHT_SIDE_PAWN => right_side_pawn,
    LEFT_SIDE_PAWN => left_side_pawn,
    OPEN_BISHOP_ROAD_PAWN => open_bishop_road_pawn,
    CLOSE_BISHOP_ROAD_PAWN => close_bishop_road_pawn,
    BISHOP_HEAD_PAWN => bishop_head_pawn,
    STAY_KING => stay_king,
    KING_RIGHTNESS => king_rightness,
    ANAGUMA_KING => anaguma_king,
    STATIC_ROOK_TRACE => static_rook_trace,
    RANGING_ROOK_TRACE => ranging_rook_trace,
    RANGING_ROOK_NORMAL => ranging_rook_normal,
    LEFT_SILVER_POSITION => left_silver_position,
    SNOWROOF_FLAG => snowroof_flag,
    YAGURA_STYLE => yagura_style,
    BISHOP_EXCHANGED => bishop_exchanged,
    TEMPO_LOSS => tempo_loss,
    SIDE_PAWN_PLY => side_pawn_ply,
}

/// side から見た (筋, 段)。持駒なら None。
fn rel_file_rank(loc: Location, side: Side) -> Option<(i32, i32)> {
    loc.rel(side).sq().map(|sq| (sq.file(), sq.rank()))
}

fn visited(traj: &Trajectory, side: Side, file: i32, rank: i32) -> bool {
    traj.locs().any(|loc| loc.is_rel_sq(side, file, rank))
}

//--------------------------------------------------------------------
// 歩
//--------------------------------------------------------------------

/// 歩を何回突いたか (最大 3)。途中で取られていたら -1。
fn pawn_advance(tracker: &Tracker, side: Side, file: i32) -> i32 {
    let traj = tracker.trajectory(PieceId::pawn(side, file));
    let n = traj.len().saturating_sub(1).min(3);
    if n == 0 {
        return 0;
    }

    match traj.loc(n) {
        Some(loc) if loc.is_board() => n as i32,
        _ => -1,
    }
}

/// 飛車先の歩 (２筋) を突いた回数。
pub fn rook_road_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_advance(tracker, side, 2)
}

/// 右端の歩 (１筋)。
pub fn right_side_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_advance(tracker, side, 1)
}

/// 左端の歩 (９筋)。
pub fn left_side_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_advance(tracker, side, 9)
}

/// file 筋の歩の最初の移動先が (dst_file, dst_rank) なら 1。
fn pawn_first_step(tracker: &Tracker, side: Side, file: i32, dst: (i32, i32)) -> i32 {
    let traj = tracker.trajectory(PieceId::pawn(side, file));
    traj.loc(1)
        .map_or(0, |loc| loc.is_rel_sq(side, dst.0, dst.1) as i32)
}

/// 角道を開けたか (７六歩)。
pub fn open_bishop_road_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_first_step(tracker, side, 7, (7, 6))
}

/// 角道を止めたか (６六歩)。
pub fn close_bishop_road_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_first_step(tracker, side, 6, (6, 6))
}

/// 角頭の歩を突いたか (８六歩)。
pub fn bishop_head_pawn(tracker: &Tracker, side: Side) -> i32 {
    pawn_first_step(tracker, side, 8, (8, 6))
}

//--------------------------------------------------------------------
// 玉
//--------------------------------------------------------------------

/// 玉が一度も動いていなければ 1。
pub fn stay_king(tracker: &Tracker, side: Side) -> i32 {
    (tracker.trajectory(PieceId::king(side)).len() == 1) as i32
}

/// 玉の筋。５筋なら 0、右 (１〜４筋) なら 1、左なら -1。
pub fn king_rightness(tracker: &Tracker, side: Side) -> i32 {
    let last = tracker.trajectory(PieceId::king(side)).last();
    match last.and_then(|loc| rel_file_rank(loc, side)) {
        Some((5, _)) => 0,
        Some((file, _)) if file <= 4 => 1,
        _ => -1,
    }
}

/// 穴熊。９九なら -1、１九なら 1、それ以外は 0。
pub fn anaguma_king(tracker: &Tracker, side: Side) -> i32 {
    let last = tracker.trajectory(PieceId::king(side)).last();
    match last.and_then(|loc| rel_file_rank(loc, side)) {
        Some((9, 9)) => -1,
        Some((1, 9)) => 1,
        _ => 0,
    }
}

//--------------------------------------------------------------------
// 飛車
//--------------------------------------------------------------------

/// 居飛車の飛車の動き。
///
///   *  0: 未着手
///   *  1/2/3: 初手が 18/38/48
///   *  4: 初手が 24 (歩交換) で、その後まだ動いていない
///   *  5: 初手が 29/27/25
///   *  6..=11: 24 の後に 34/74/21/28/26/25
///   * 12: 24 の後にその他
///   * -1: 初手がその他
///   * -2: 確定前に取られた
pub fn static_rook_trace(tracker: &Tracker, side: Side) -> i32 {
    let traj = tracker.trajectory(PieceId::rook(side));
    let first = match traj.loc(1) {
        Some(loc) => loc,
        None => return 0,
    };

    match rel_file_rank(first, side) {
        None => -2,
        Some((1, 8)) => 1,
        Some((3, 8)) => 2,
        Some((4, 8)) => 3,
        Some((2, 9)) | Some((2, 7)) | Some((2, 5)) => 5,
        Some((2, 4)) => {
            let second = match traj.loc(2) {
                Some(loc) => loc,
                None => return 4,
            };
            match rel_file_rank(second, side) {
                None => -2,
                Some((3, 4)) => 6,
                Some((7, 4)) => 7,
                Some((2, 1)) => 8,
                Some((2, 8)) => 9,
                Some((2, 6)) => 10,
                Some((2, 5)) => 11,
                Some(_) => 12,
            }
        }
        Some(_) => -1,
    }
}

/// 振り飛車の飛車の動き。
///
///   * 0: 未着手
///   * 1/2/3/5: 初手が 98/88/78/58
///   * 4: 初手が 68 で、その後まだ動いていない
///   * 6/7/8: 68 の後に 78/88/その他
///   * -1: 初手がその他
///   * -2: 確定前に取られた
pub fn ranging_rook_trace(tracker: &Tracker, side: Side) -> i32 {
    let traj = tracker.trajectory(PieceId::rook(side));
    let first = match traj.loc(1) {
        Some(loc) => loc,
        None => return 0,
    };

    match rel_file_rank(first, side) {
        None => -2,
        Some((9, 8)) => 1,
        Some((8, 8)) => 2,
        Some((7, 8)) => 3,
        Some((5, 8)) => 5,
        Some((6, 8)) => {
            let second = match traj.loc(2) {
                Some(loc) => loc,
                None => return 4,
            };
            match rel_file_rank(second, side) {
                None => -2,
                Some((7, 8)) => 6,
                Some((8, 8)) => 7,
                Some(_) => 8,
            }
        }
        Some(_) => -1,
    }
}

/// 振り飛車側 side が角道を止めているか。
///
///   *  1: 止めた (ノーマル振り飛車)
///   *  0: 開けたまま落ち着いた
///   * -1: まだわからない
pub fn ranging_rook_normal(tracker: &Tracker, side: Side) -> i32 {
    let info = tracker.info();
    let ply = tracker.ply();

    let closed = info.close_ply(side).is_some();
    if closed {
        return 1;
    }

    if info.open_ply(side.inv()).is_some() {
        let ply_open = Side::iter()
            .map(|s| info.open_ply(s).unwrap_or(0))
            .max()
            .unwrap_or(0);
        if ply_open + 2 <= ply {
            return 0;
        }
    }

    if info.open_ply(side).is_some() && ply >= 20 {
        return 0;
    }

    -1
}

//--------------------------------------------------------------------
// 銀
//--------------------------------------------------------------------

/// 左銀の現在位置。
///
///   *  0: 79 (初期位置)
///   *  1: 77
///   *  2: 67
///   *  3: 66
///   * -1: その他
///   * -2: 取られている
pub fn left_silver_position(tracker: &Tracker, side: Side) -> i32 {
    let last = tracker.trajectory(PieceId::silver(side, Wing::Left)).last();
    match last {
        None => -1,
        Some(loc) => match rel_file_rank(loc, side) {
            None => -2,
            Some((7, 9)) => 0,
            Some((7, 7)) => 1,
            Some((6, 7)) => 2,
            Some((6, 6)) => 3,
            Some(_) => -1,
        },
    }
}

/// 左銀が一度でも 67 に上がったか (雁木)。
pub fn snowroof_flag(tracker: &Tracker, side: Side) -> i32 {
    visited(tracker.trajectory(PieceId::silver(side, Wing::Left)), side, 6, 7) as i32
}

/// 矢倉の組み方。
///
///   * 2: 左銀が 66 まで出た (急戦)
///   * 1: 左銀が 77 にいて角道を止めている
///   * 0: その他
pub fn yagura_style(tracker: &Tracker, side: Side) -> i32 {
    let traj = tracker.trajectory(PieceId::silver(side, Wing::Left));
    if visited(traj, side, 6, 6) {
        return 2;
    }

    let at_77 = traj.last().map_or(false, |loc| loc.is_rel_sq(side, 7, 7));
    if at_77 && close_bishop_road_pawn(tracker, side) == 1 {
        return 1;
    }

    0
}

//--------------------------------------------------------------------
// 角
//--------------------------------------------------------------------

/// 両者の角が一度ずつ持駒になったか。side は見ない。
pub fn bishop_exchanged(tracker: &Tracker, _side: Side) -> i32 {
    Side::iter()
        .all(|s| tracker.trajectory(PieceId::bishop(s)).first_hand().is_some()) as i32
}

/// 角換わりでの side の手損ポイント。
///
///   * 先に角を取った
///   * 自分の角が取られる前に 77 へ上がっていた
///   * 金が 88 か 77 に上がった
pub fn tempo_loss(tracker: &Tracker, side: Side) -> i32 {
    let mut res = 0;

    let first_capture = Side::iter()
        .filter_map(|s| tracker.trajectory(PieceId::bishop(s)).first_hand())
        .min_by_key(|step| step.ply);
    if let Some(step) = first_capture {
        if matches!(step.loc, Location::Hand(capturer, _) if capturer == side) {
            res += 1;
        }
    }

    let bishop = tracker.trajectory(PieceId::bishop(side));
    let went_77 = bishop
        .locs()
        .take_while(Location::is_board)
        .any(|loc| loc.is_rel_sq(side, 7, 7));
    if went_77 {
        res += 1;
    }

    let gold_up = [Wing::Right, Wing::Left].iter().any(|&wing| {
        let traj = tracker.trajectory(PieceId::gold(side, wing));
        visited(traj, side, 8, 8) || visited(traj, side, 7, 7)
    });
    if gold_up {
        res += 1;
    }

    res
}

/// 横歩を取った手数。横歩取りでなければ -1。
pub fn side_pawn_ply(tracker: &Tracker, side: Side) -> i32 {
    if static_rook_trace(tracker, side) != 6 {
        return -1;
    }
    tracker
        .trajectory(PieceId::rook(side))
        .get(2)
        .map_or(-1, |step| step.ply)
}
