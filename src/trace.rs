//!===================================================================
//! 駒の軌跡の記録
//!
//! Tracker は局面を 1 つ持ち、指し手を適用するたびに駒番号ごとの軌跡
//! (Location の列) を伸ばしていく。成りは区別しない。
//!
//! 軌跡の各要素には、それが追加された時点の手数 (指し手を適用する前の手数) を付ける。
//! 初期位置の手数は 0 とする。
//!===================================================================

use crate::movegen;
use crate::piece_id::{self, IdMap, PieceId, PIECE_ID_COUNT};
use crate::prelude::*;
use crate::{Error, Result};

//--------------------------------------------------------------------
// 位置
//--------------------------------------------------------------------

/// 駒の居場所。盤上のマスか、誰かの持駒か。
/// 持駒の駒種は常にナマ駒。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Location {
    Board(Sq),
    Hand(Side, Piece),
}

impl Location {
    pub fn is_board(&self) -> bool {
        matches!(self, Self::Board(_))
    }

    pub fn is_hand(&self) -> bool {
        matches!(self, Self::Hand(..))
    }

    pub fn sq(&self) -> Option<Sq> {
        match self {
            Self::Board(sq) => Some(*sq),
            Self::Hand(..) => None,
        }
    }

    /// side から見たときの位置を返す。持駒はそのまま。
    pub fn rel(&self, side: Side) -> Self {
        match self {
            Self::Board(sq) => Self::Board(sq.rel(side)),
            loc => *loc,
        }
    }

    /// side から見て file 筋 rank 段のマスかどうか。
    pub fn is_rel_sq(&self, side: Side, file: i32, rank: i32) -> bool {
        *self == Self::Board(Sq::from_file_rank(file, rank).rel(side))
    }
}

//--------------------------------------------------------------------
// 軌跡
//--------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Step {
    pub loc: Location,
    pub ply: i32,
}

/// 1 枚の駒の軌跡。追加のみ可能。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trajectory(Vec<Step>);

impl Trajectory {
    fn push(&mut self, loc: Location, ply: i32) {
        self.0.push(Step { loc, ply });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Step> {
        self.0.get(i)
    }

    pub fn loc(&self, i: usize) -> Option<Location> {
        self.0.get(i).map(|step| step.loc)
    }

    pub fn last(&self) -> Option<Location> {
        self.0.last().map(|step| step.loc)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn locs(&self) -> impl Iterator<Item = Location> + '_ {
        self.0.iter().map(|step| step.loc)
    }

    /// 最初に持駒になった要素を返す。
    pub fn first_hand(&self) -> Option<&Step> {
        self.0.iter().find(|step| step.loc.is_hand())
    }
}

//--------------------------------------------------------------------
// 序盤の補助情報
//--------------------------------------------------------------------

/// 角道を開ける/止める歩を突いた手数。一度設定されたら変わらない。
///
///   * 開ける: ▲７六歩 / △３四歩
///   * 止める: ▲６六歩 / △４四歩
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct OpeningInfo {
    open_ply: [Option<i32>; 2],
    close_ply: [Option<i32>; 2],
}

impl OpeningInfo {
    pub fn open_ply(&self, side: Side) -> Option<i32> {
        self.open_ply[side]
    }

    pub fn close_ply(&self, side: Side) -> Option<i32> {
        self.close_ply[side]
    }

    fn update(&mut self, side: Side, src: Sq, dst: Sq, ply: i32) {
        let is = |from: (i32, i32), to: (i32, i32)| {
            src == Sq::from_file_rank(from.0, from.1).rel(side)
                && dst == Sq::from_file_rank(to.0, to.1).rel(side)
        };

        if is((7, 7), (7, 6)) {
            crate::util::set_once(&mut self.open_ply[side], ply);
        } else if is((6, 7), (6, 6)) {
            crate::util::set_once(&mut self.close_ply[side], ply);
        }
    }
}

//--------------------------------------------------------------------
// Tracker
//--------------------------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tracker {
    pos: Position,
    ids: IdMap,
    trajectories: Vec<Trajectory>,
    info: OpeningInfo,
    prev_move: Option<Move>,
}

impl Tracker {
    /// 平手初期局面で初期化した Tracker を返す。
    pub fn new() -> Result<Self> {
        Self::from_position(Position::startpos())
    }

    /// 任意の局面から始める。駒箱にある駒の軌跡は空になる。
    pub fn from_position(pos: Position) -> Result<Self> {
        let asg = piece_id::assign(&pos)?;

        let mut trajectories = vec![Trajectory::default(); PIECE_ID_COUNT];
        for (traj, start) in trajectories.iter_mut().zip(asg.starts.iter()) {
            if let Some(loc) = start {
                traj.push(*loc, 0);
            }
        }

        Ok(Self {
            pos,
            ids: asg.map,
            trajectories,
            info: OpeningInfo::default(),
            prev_move: None,
        })
    }

    /// 平手初期局面に戻し、駒番号と補助情報を振り直す。
    pub fn initialize(&mut self) -> Result<()> {
        *self = Self::new()?;
        Ok(())
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// 次に指される手の手数。初期局面では 1。
    pub fn ply(&self) -> i32 {
        self.pos.ply()
    }

    pub fn info(&self) -> &OpeningInfo {
        &self.info
    }

    pub fn prev_move(&self) -> Option<&Move> {
        self.prev_move.as_ref()
    }

    pub fn trajectory(&self, id: PieceId) -> &Trajectory {
        &self.trajectories[id.get()]
    }

    pub fn trajectories(&self) -> impl Iterator<Item = (PieceId, &Trajectory)> {
        PieceId::iter().zip(self.trajectories.iter())
    }

    /// sq にある駒の番号を返す。
    pub fn id_at(&self, sq: Sq) -> Option<PieceId> {
        self.ids.at(sq)
    }

    pub fn is_legal(&self, mv: &Move) -> bool {
        movegen::is_legal(&self.pos, mv)
    }

    /// 指し手を適用し、軌跡を更新する。
    /// 違法手の場合は何も変更せずにエラーを返す。
    pub fn apply_move(&mut self, mv: &Move) -> Result<()> {
        chk!(self.is_legal(mv), Error::illegal_move(mv, "not legal"));

        let side = self.pos.side();
        let ply = self.pos.ply();

        // 局面を進める前に、動く駒と取られる駒の番号を引いておく
        let (id, id_capture) = match *mv {
            Move::Walk { src, dst, .. } => (self.ids.at(src), self.ids.at(dst)),
            Move::Drop { pt, .. } => (self.ids.hand(side, pt).last().copied(), None),
        };
        let id = id.ok_or_else(|| Error::illegal_move(mv, "untracked piece"))?;
        let is_pawn = mv
            .src()
            .map_or(false, |src| self.pos.board()[src].is_side_pt(side, Piece::Pawn));

        self.pos.do_move(mv)?;

        match *mv {
            Move::Walk { src, .. } => self.ids.set(src, None),
            Move::Drop { pt, .. } => {
                self.ids.pop_hand(side, pt);
            }
        }
        self.ids.set(mv.dst(), Some(id));
        self.trajectories[id.get()].push(Location::Board(mv.dst()), ply);

        if let Some(id_capture) = id_capture {
            let pt = id_capture.piece();
            self.ids.push_hand(side, pt, id_capture);
            self.trajectories[id_capture.get()].push(Location::Hand(side, pt), ply);
        }

        if is_pawn {
            if let Some(src) = mv.src() {
                self.info.update(side, src, mv.dst(), ply);
            }
        }

        self.prev_move = Some(mv.clone());

        log::trace!("ply {}: {}", ply, mv);

        Ok(())
    }
}
