//!===================================================================
//! 戦型判定
//!
//! 棋譜を平手初期局面から 1 手ずつ Tracker に適用し、そのたびに分類木の
//! 選択規則を安定するまで評価する。1 手で複数段進むこともある。
//!
//! 違法手に出会ったらそこで止め、それまでに到達したノードを返す (エラーではない)。
//!===================================================================

use crate::log::{Event, EventKind, LoggerTrait, NullLogger};
use crate::prelude::*;
use crate::trace::Tracker;
use crate::tree::{self, Node, NodeId, Transition, Tree};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display)]
pub enum Verdict {
    /// 葉に到達したか、途中のノードで打ち切った
    Resolved,
    /// 棋譜が尽きた時点でまだ分岐ノードにいる
    Undetermined,
}

/// 分類結果。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    pub node: NodeId,
    pub name: String,
    pub name_ja: String,
    pub verdict: Verdict,
    pub ply: i32, // 最後にノードが変わった (または確定した) 手数
    pub stopped_at: Option<usize>, // 違法手で止まった場合、その指し手の位置
}

impl Classification {
    pub fn is_resolved(&self) -> bool {
        matches!(self.verdict, Verdict::Resolved)
    }

    /// 表示用のラベル。未確定なら注記を付ける。
    pub fn label(&self) -> String {
        match self.verdict {
            Verdict::Resolved => self.name.clone(),
            Verdict::Undetermined => format!("{} (undetermined)", self.name),
        }
    }

    pub fn label_ja(&self) -> String {
        match self.verdict {
            Verdict::Resolved => self.name_ja.clone(),
            Verdict::Undetermined => format!("{} (未確定)", self.name_ja),
        }
    }
}

/// 1 回の分類の状態。
#[derive(Debug)]
pub struct Analyzer<'a> {
    tree: &'a Tree,
    node: NodeId,
    tracker: Tracker,
    ply: i32,
    finished: bool,
}

impl<'a> Analyzer<'a> {
    pub fn new(tree: &'a Tree) -> Result<Self> {
        let tracker = Tracker::new()?;
        let ply = tracker.ply();
        Ok(Self {
            tree,
            node: tree.root().id(),
            tracker,
            ply,
            finished: false,
        })
    }

    pub fn node(&self) -> &'a Node {
        self.tree.node(self.node)
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// 分類が確定したか。
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 指し手を 1 つ適用し、選択規則を安定するまで評価する。
    /// 違法手なら何も変更せずに IllegalMove を返す。
    pub fn step(&mut self, mv: &Move, logger: &mut impl LoggerTrait) -> Result<()> {
        let ply = self.tracker.ply();
        self.tracker.apply_move(mv)?;
        logger.log_move(ply, mv);

        self.settle(logger);

        Ok(())
    }

    fn settle(&mut self, logger: &mut impl LoggerTrait) {
        while !self.finished {
            let node = self.node();
            match node.select(&self.tracker) {
                Transition::Continue => break,
                Transition::Abandon => {
                    self.finished = true;
                    self.emit(node, EventKind::Abandon, logger);
                }
                Transition::Descend(i) => match self.tree.child(node, i) {
                    Some(child) => {
                        self.node = child.id();
                        self.finished = child.is_leaf();
                        self.emit(child, EventKind::Descend, logger);
                    }
                    None => {
                        debug_assert!(false, "{}: child {} out of range", node.name(), i);
                        self.finished = true;
                        self.emit(node, EventKind::Abandon, logger);
                    }
                },
            }
        }
    }

    fn emit(&mut self, node: &Node, kind: EventKind, logger: &mut impl LoggerTrait) {
        self.ply = self.tracker.ply();

        let event = Event {
            node: node.id(),
            name: node.name().to_owned(),
            name_ja: node.name_ja().to_owned(),
            kind,
            ply: self.ply,
        };
        log::debug!("ply {}: {} {}", event.ply, event.kind, event.name);
        logger.log_transition(&event);
    }

    pub fn into_tracker(self) -> Tracker {
        self.tracker
    }

    pub fn classification(&self, stopped_at: Option<usize>) -> Classification {
        let node = self.node();
        Classification {
            node: node.id(),
            name: node.name().to_owned(),
            name_ja: node.name_ja().to_owned(),
            verdict: if self.finished {
                Verdict::Resolved
            } else {
                Verdict::Undetermined
            },
            ply: self.ply,
            stopped_at,
        }
    }
}

/// 平手初期局面からの棋譜を分類する。
///
/// 違法手はエラーにならない。エラーになるのは駒番号の割り当てに失敗した場合のみ。
pub fn classify(mvs: &[Move]) -> Result<Classification> {
    classify_with_logger(mvs, &mut NullLogger::new())
}

pub fn classify_with_logger(
    mvs: &[Move],
    logger: &mut impl LoggerTrait,
) -> Result<Classification> {
    classify_with_tree(tree::tree(), mvs, logger)
}

pub fn classify_with_tree(
    tree: &Tree,
    mvs: &[Move],
    logger: &mut impl LoggerTrait,
) -> Result<Classification> {
    analyze(tree, mvs, logger).map(|(res, _)| res)
}

/// 分類を行い、結果と最後の Tracker を返す。
pub fn analyze(
    tree: &Tree,
    mvs: &[Move],
    logger: &mut impl LoggerTrait,
) -> Result<(Classification, Tracker)> {
    let mut analyzer = Analyzer::new(tree)?;

    for (i, mv) in mvs.iter().enumerate() {
        if analyzer.is_finished() {
            break;
        }

        match analyzer.step(mv, logger) {
            Ok(()) => {}
            Err(Error::IllegalMove(..)) => {
                log::debug!("illegal move at {}: {}", i, mv);
                logger.log_illegal_move(i, mv);
                let res = analyzer.classification(Some(i));
                return Ok((res, analyzer.into_tracker()));
            }
            Err(e) => return Err(e),
        }
    }

    let res = analyzer.classification(None);
    Ok((res, analyzer.into_tracker()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::log::Logger;

    fn mvs(s: &str) -> Vec<Move> {
        s.split_whitespace()
            .map(|mv| Move::from_sfen(mv).unwrap())
            .collect()
    }

    #[test]
    fn test_empty() {
        let res = classify(&[]).unwrap();
        assert_eq!(res.name, "Undetermined Formation");
        assert_eq!(res.verdict, Verdict::Undetermined);
        assert_eq!(res.ply, 1);
        assert_eq!(res.stopped_at, None);
        assert_eq!(res.label(), "Undetermined Formation (undetermined)");
    }

    #[test]
    fn test_multi_level() {
        // 1 手で相振り飛車 → 相中飛車 → 葉の相中飛車 まで進む
        let mut logger = Logger::new();
        let res = classify_with_logger(&mvs("2h5h 8b5b 7g7f"), &mut logger).unwrap();
        assert_eq!(res.name_ja, "相中飛車");
        assert_eq!(res.verdict, Verdict::Resolved);
        assert_eq!(res.ply, 3);

        let names: Vec<_> = logger.events().iter().map(|e| e.name_ja.as_str()).collect();
        assert_eq!(names, vec!["相振り飛車", "相中飛車", "相中飛車"]);
        assert!(logger.events().iter().all(|e| e.ply == 3));
        assert!(logger.events().iter().all(|e| e.kind == EventKind::Descend));
        // 確定後の指し手は記録しない
        assert_eq!(logger.into_log().moves.len(), 2);
    }

    #[test]
    fn test_resolve_leaf() {
        // 角交換で相居飛車 → 角換わり。30 手を超えたら細分類が決まる。
        let mut s = String::from("7g7f 3c3d 8h2b+ 3a2b 2g2f 8c8d");
        for _ in 0..13 {
            s.push_str(" 6i6h 4a4b 6h6i 4b4a");
        }
        let res = classify(&mvs(&s)).unwrap();
        assert_eq!(res.verdict, Verdict::Resolved);
        assert_eq!(res.name_ja, "先手一手損角換わり");
        assert_eq!(res.ply, 31);
    }

    #[test]
    fn test_illegal_stop() {
        let res = classify(&mvs("7g7f 3c3d 7f7e 7e7d")).unwrap();
        assert_eq!(res.stopped_at, Some(3));
        assert_eq!(res.name, "Undetermined Formation");
    }
}
