//!===================================================================
//! 分類ログ
//!
//! 分類木の遷移をイベントとして受け取る。表示は呼び出し側の仕事。
//!===================================================================

use crate::prelude::*;
use crate::tree::NodeId;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display)]
pub enum EventKind {
    /// 子ノードに進んだ
    Descend,
    /// このノードで打ち切った
    Abandon,
}

/// 分類木の 1 回の遷移。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    pub node: NodeId, // 遷移後のノード
    pub name: String,
    pub name_ja: String,
    pub kind: EventKind,
    pub ply: i32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Log {
    pub moves: Vec<(i32, Move)>,
    pub events: Vec<Event>,
    pub illegal_move: Option<(usize, Move)>, // (棋譜内の位置, 指し手)
}

impl Pretty for Log {
    fn pretty(&self) -> std::borrow::Cow<'static, str> {
        use std::fmt::Write;

        let mut res = String::new();

        // 指し手の間に遷移を挟んで出力する
        let mut events = self.events.iter().peekable();
        for (ply, mv) in self.moves.iter() {
            writeln!(res, "{:>3}: {}", ply, mv.pretty()).unwrap();
            while let Some(event) = events.next_if(|event| event.ply == ply + 1) {
                writeln!(res, "     {} -> {}", event.kind, event.name_ja).unwrap();
            }
        }
        for event in events {
            writeln!(res, "     {} -> {} (ply {})", event.kind, event.name_ja, event.ply).unwrap();
        }

        if let Some((i, mv)) = &self.illegal_move {
            writeln!(res, "違法手: {} 手目 {}", i + 1, mv.pretty()).unwrap();
        }

        res.into()
    }
}

pub trait LoggerTrait {
    fn log_move(&mut self, _ply: i32, _mv: &Move);
    fn log_transition(&mut self, _event: &Event);
    fn log_illegal_move(&mut self, _index: usize, _mv: &Move);
}

#[derive(Debug, Default)]
pub struct Logger {
    log: Log,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.log.events
    }

    pub fn into_log(self) -> Log {
        self.log
    }
}

impl LoggerTrait for Logger {
    fn log_move(&mut self, ply: i32, mv: &Move) {
        self.log.moves.push((ply, mv.clone()));
    }

    fn log_transition(&mut self, event: &Event) {
        self.log.events.push(event.clone());
    }

    fn log_illegal_move(&mut self, index: usize, mv: &Move) {
        self.log.illegal_move = Some((index, mv.clone()));
    }
}

#[derive(Debug)]
pub struct NullLogger;

impl NullLogger {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerTrait for NullLogger {
    fn log_move(&mut self, _ply: i32, _mv: &Move) {}
    fn log_transition(&mut self, _event: &Event) {}
    fn log_illegal_move(&mut self, _index: usize, _mv: &Move) {}
}
