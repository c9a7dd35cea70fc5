//!===================================================================
//! 戦型分類木
//!
//! 各ノードは選択規則 (Tracker を受け取って Transition を返す純粋関数) を持つ。
//! 木はプロセス内で一度だけ構築され、以後は読み取り専用で共有される。
//!
//! 閾値の手数は先手/後手で 1 ずれているものがあるが、これは意図的なもの。
//!===================================================================

use once_cell::sync::Lazy;

use crate::predicate::{self, PredicateDef};
use crate::prelude::*;
use crate::trace::Tracker;

/// 相居飛車/振り飛車などの大分類を打ち切る手数 (この値を超えたら打ち切り)
pub const ROOT_SETTLE_PLY: i32 = 20;

/// 後手の振り飛車の細分類を打ち切る手数
pub const WHITE_RANGING_SETTLE_PLY: i32 = 20;

/// 先手の振り飛車の細分類を打ち切る手数
pub const BLACK_RANGING_SETTLE_PLY: i32 = 19;

/// 相居飛車の細分類を打ち切る手数 (この値を超えたら打ち切り)
pub const STATIC_ROOK_SETTLE_PLY: i32 = 30;

/// 選択規則の結果。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Transition {
    /// まだ決まらない。次の指し手を待つ。
    Continue,
    /// このノードで確定。
    Abandon,
    /// i 番目の子に進む。
    Descend(usize),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, strum_macros::EnumString)]
pub enum NodeKind {
    Root,
    Branch,
    Leaf,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn get(&self) -> usize {
        self.0
    }
}

pub type Rule = fn(&Tracker) -> Transition;

pub struct Node {
    id: NodeId,
    name: String,
    name_ja: String,
    kind: NodeKind,
    children: Vec<NodeId>,
    predicates: Vec<PredicateDef>,
    rule: Option<Rule>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_ja(&self) -> &str {
        &self.name_ja
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 選択規則が参照する述語。
    pub fn predicates(&self) -> &[PredicateDef] {
        &self.predicates
    }

    /// i 番目の述語を side について評価する。
    pub fn eval(&self, i: usize, tracker: &Tracker, side: Side) -> Option<i32> {
        self.predicates.get(i).map(|def| def.eval(tracker, side))
    }

    /// 選択規則を評価する。葉では常に Abandon。
    /// 範囲外の子を指す結果は Abandon として扱う。
    pub fn select(&self, tracker: &Tracker) -> Transition {
        let rule = unwrap_or_return!(self.rule, Transition::Abandon);

        match rule(tracker) {
            Transition::Descend(i) if i >= self.children.len() => {
                debug_assert!(false, "{}: child index out of range: {}", self.name, i);
                Transition::Abandon
            }
            tr => tr,
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("name_ja", &self.name_ja)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("predicates", &self.predicates)
            .finish()
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn root(&self) -> &Node {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn child(&self, node: &Node, i: usize) -> Option<&Node> {
        node.children.get(i).map(|&id| self.node(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// 英語名か日本語名でノードを探す。同名のノードがあれば根に近い方を返す。
    pub fn find(&self, name: &str) -> Option<&Node> {
        // 親は子より後に積まれる
        self.nodes
            .iter()
            .rev()
            .find(|node| node.name == name || node.name_ja == name)
    }
}

/// 葉から順にノードを積み上げて木を作る。
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, name: impl Into<String>, name_ja: impl Into<String>) -> NodeId {
        self.push(name.into(), name_ja.into(), NodeKind::Leaf, vec![], vec![], None)
    }

    pub fn branch(
        &mut self,
        name: impl Into<String>,
        name_ja: impl Into<String>,
        predicates: &[PredicateDef],
        rule: Rule,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.push(
            name.into(),
            name_ja.into(),
            NodeKind::Branch,
            children,
            predicates.to_vec(),
            Some(rule),
        )
    }

    /// root を根として木を完成させる。
    pub fn build(mut self, root: NodeId) -> Tree {
        self.nodes[root.0].kind = NodeKind::Root;
        Tree {
            nodes: self.nodes,
            root,
        }
    }

    fn push(
        &mut self,
        name: String,
        name_ja: String,
        kind: NodeKind,
        children: Vec<NodeId>,
        predicates: Vec<PredicateDef>,
        rule: Option<Rule>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            name,
            name_ja,
            kind,
            children,
            predicates,
            rule,
        });
        id
    }
}

static TREE: Lazy<Tree> = Lazy::new(build_tree);

/// 共有の分類木を返す。
pub fn tree() -> &'static Tree {
    &TREE
}

//--------------------------------------------------------------------
// 木の定義
//--------------------------------------------------------------------

/// 振り飛車の 4 つの型 (英語名, 日本語名)。
/// 順に向かい飛車、三間飛車、四間飛車、中飛車。
const RANGING_STYLES: [(&str, &str); 4] = [
    ("Opposing Rook", "向かい飛車"),
    ("Third File", "三間飛車"),
    ("Fourth File", "四間飛車"),
    ("Central Rook", "中飛車"),
];

const ROOT_PREDICATES: &[PredicateDef] = &[
    predicate::RANGING_ROOK_TRACE,
    predicate::STATIC_ROOK_TRACE,
    predicate::ROOK_ROAD_PAWN,
    predicate::KING_RIGHTNESS,
];

fn build_tree() -> Tree {
    let mut b = TreeBuilder::new();

    let static_rook = build_static_rook(&mut b);
    let white_ranging = build_single_ranging(&mut b, Side::Gote);
    let black_ranging = build_single_ranging(&mut b, Side::Sente);
    let double_ranging = build_double_ranging(&mut b);
    let other = b.leaf("Other", "その他の戦型");

    let root = b.branch(
        "Undetermined Formation",
        "戦型未確定",
        ROOT_PREDICATES,
        rule_root,
        vec![static_rook, white_ranging, black_ranging, double_ranging, other],
    );

    b.build(root)
}

fn rule_root(t: &Tracker) -> Transition {
    use predicate::{king_rightness, ranging_rook_trace, rook_road_pawn, static_rook_trace};

    let ranging_b = ranging_rook_trace(t, Side::Sente);
    let ranging_w = ranging_rook_trace(t, Side::Gote);
    let static_b = static_rook_trace(t, Side::Sente);
    let static_w = static_rook_trace(t, Side::Gote);
    let pawn_b = rook_road_pawn(t, Side::Sente);
    let pawn_w = rook_road_pawn(t, Side::Gote);

    if ranging_b == -2 || ranging_w == -2 {
        return Transition::Descend(4);
    }
    if ranging_b > 0 && ranging_w > 0 {
        return Transition::Descend(3);
    }
    if ranging_w > 0 && ranging_b <= 0 && (king_rightness(t, Side::Sente) == -1 || pawn_b > 0) {
        return Transition::Descend(1);
    }
    if ranging_b > 0 && ranging_w <= 0 && (king_rightness(t, Side::Gote) == -1 || pawn_w > 0) {
        return Transition::Descend(2);
    }
    if static_b > 0 && static_w > 0 {
        return Transition::Descend(0);
    }
    if pawn_b + pawn_w >= 4 {
        return Transition::Descend(0);
    }
    if static_b >= 0 && static_w >= 0 && pawn_b > 0 && pawn_w > 0 && t.ply() > ROOT_SETTLE_PLY {
        return Transition::Descend(0);
    }
    if t.ply() > ROOT_SETTLE_PLY {
        return Transition::Descend(4);
    }

    Transition::Continue
}

//--------------------------------------------------------------------
// 振り飛車 (片側)
//--------------------------------------------------------------------

/// 相振り飛車での型の番号 (0:向かい 1:三間 2:四間 3:中)。
/// 68 から振り直した飛車はどれにも当たらない。
fn ranging_style(trace: i32) -> Option<usize> {
    match trace {
        2..=5 => Some((trace - 2) as usize),
        _ => None,
    }
}

fn build_single_ranging(b: &mut TreeBuilder, side: Side) -> NodeId {
    let (prefix, prefix_ja, normal_rule, style_rule): (_, _, Rule, Rule) = match side {
        Side::Gote => ("", "", rule_white_normal as Rule, rule_white_ranging as Rule),
        Side::Sente => ("Black ", "先手", rule_black_normal as Rule, rule_black_ranging as Rule),
    };

    let mut children: Vec<_> = RANGING_STYLES
        .iter()
        .map(|(style, style_ja)| {
            let open = b.leaf(
                format!("{}Ranging Rook — {}", prefix, style),
                format!("{}{}", prefix_ja, style_ja),
            );
            let normal = b.leaf(
                format!("{}Ranging Rook — Normal {}", prefix, style),
                format!("{}ノーマル{}", prefix_ja, style_ja),
            );
            b.branch(
                format!("{}Ranging Rook — {}", prefix, style),
                format!("{}{}", prefix_ja, style_ja),
                &[predicate::RANGING_ROOK_NORMAL],
                normal_rule,
                vec![open, normal],
            )
        })
        .collect();
    children.push(b.leaf(
        format!("{}Ranging Rook — Other", prefix),
        format!("{}振り飛車力戦", prefix_ja),
    ));

    b.branch(
        format!("{}Ranging Rook", prefix),
        format!("{}振り飛車", prefix_ja),
        &[predicate::RANGING_ROOK_TRACE],
        style_rule,
        children,
    )
}

fn select_ranging_style(t: &Tracker, side: Side, settle_ply: i32) -> Transition {
    let settled = t.ply() >= settle_ply;
    match predicate::ranging_rook_trace(t, side) {
        2 | 7 => Transition::Descend(0),
        5 => Transition::Descend(3),
        3 | 6 => Transition::Descend(1),
        4 if settled => Transition::Descend(2),
        1 | 8 => Transition::Descend(4),
        _ if settled => Transition::Descend(4),
        _ => Transition::Continue,
    }
}

fn rule_white_ranging(t: &Tracker) -> Transition {
    select_ranging_style(t, Side::Gote, WHITE_RANGING_SETTLE_PLY)
}

fn rule_black_ranging(t: &Tracker) -> Transition {
    select_ranging_style(t, Side::Sente, BLACK_RANGING_SETTLE_PLY)
}

fn select_normal(t: &Tracker, side: Side) -> Transition {
    match predicate::ranging_rook_normal(t, side) {
        0 => Transition::Descend(0),
        1 => Transition::Descend(1),
        _ => Transition::Continue,
    }
}

fn rule_white_normal(t: &Tracker) -> Transition {
    select_normal(t, Side::Gote)
}

fn rule_black_normal(t: &Tracker) -> Transition {
    select_normal(t, Side::Sente)
}

//--------------------------------------------------------------------
// 相振り飛車
//--------------------------------------------------------------------

const CENTRAL: usize = 3;

/// 相振り飛車の子の数 (16 通りの組み合わせ + その他)
const DOUBLE_RANGING_OTHER: usize = 16;

fn build_double_ranging(b: &mut TreeBuilder) -> NodeId {
    let mut children = Vec::with_capacity(DOUBLE_RANGING_OTHER + 1);

    for (iw, (style_w, style_w_ja)) in RANGING_STYLES.iter().enumerate() {
        for (ib, (style_b, style_b_ja)) in RANGING_STYLES.iter().enumerate() {
            let (name, name_ja) = if ib == iw {
                (
                    format!("Double Ranging Rook — Mutual {}", style_b),
                    format!("相{}", style_b_ja),
                )
            } else {
                (
                    format!("Double Ranging Rook — Black {} / White {}", style_b, style_w),
                    format!("先手{}後手{}", style_b_ja, style_w_ja),
                )
            };

            let id = match (ib == CENTRAL, iw == CENTRAL) {
                (false, false) => b.leaf(name, name_ja),
                (true, false) => {
                    let plain = b.leaf(name.clone(), name_ja.clone());
                    let left = b.leaf(
                        format!("Double Ranging Rook — Black Left-King Central Rook / White {}", style_w),
                        format!("先手中飛車左後手{}", style_w_ja),
                    );
                    b.branch(
                        name,
                        name_ja,
                        &[predicate::KING_RIGHTNESS],
                        rule_black_central_king,
                        vec![plain, left],
                    )
                }
                (false, true) => {
                    let plain = b.leaf(name.clone(), name_ja.clone());
                    let left = b.leaf(
                        format!("Double Ranging Rook — Black {} / White Left-King Central Rook", style_b),
                        format!("先手{}後手中飛車左", style_b_ja),
                    );
                    b.branch(
                        name,
                        name_ja,
                        &[predicate::KING_RIGHTNESS],
                        rule_white_central_king,
                        vec![plain, left],
                    )
                }
                (true, true) => {
                    let plain = b.leaf(name.clone(), name_ja.clone());
                    let left_b = b.leaf(
                        "Double Ranging Rook — Black Left-King Central Rook / White Central Rook",
                        "先手中飛車左後手中飛車",
                    );
                    let left_w = b.leaf(
                        "Double Ranging Rook — Black Central Rook / White Left-King Central Rook",
                        "先手中飛車後手中飛車左",
                    );
                    let left_both = b.leaf(
                        "Double Ranging Rook — Mutual Left-King Central Rook",
                        "相中飛車左",
                    );
                    b.branch(
                        name,
                        name_ja,
                        &[predicate::KING_RIGHTNESS],
                        rule_mutual_central_king,
                        vec![plain, left_b, left_w, left_both],
                    )
                }
            };
            children.push(id);
        }
    }
    children.push(b.leaf("Double Ranging Rook — Other", "相振り飛車力戦"));

    b.branch(
        "Double Ranging Rook",
        "相振り飛車",
        &[predicate::RANGING_ROOK_TRACE],
        rule_double_ranging,
        children,
    )
}

fn rule_double_ranging(t: &Tracker) -> Transition {
    let trace_b = predicate::ranging_rook_trace(t, Side::Sente);
    let trace_w = predicate::ranging_rook_trace(t, Side::Gote);

    match (ranging_style(trace_b), ranging_style(trace_w)) {
        (Some(ib), Some(iw)) => Transition::Descend(4 * iw + ib),
        _ => Transition::Descend(DOUBLE_RANGING_OTHER),
    }
}

/// 中飛車側の玉が左に寄っていれば中飛車左。
fn select_central_king(t: &Tracker, side: Side) -> Transition {
    if predicate::king_rightness(t, side) == -1 {
        Transition::Descend(1)
    } else {
        Transition::Descend(0)
    }
}

fn rule_black_central_king(t: &Tracker) -> Transition {
    select_central_king(t, Side::Sente)
}

fn rule_white_central_king(t: &Tracker) -> Transition {
    select_central_king(t, Side::Gote)
}

fn rule_mutual_central_king(t: &Tracker) -> Transition {
    let left_b = predicate::king_rightness(t, Side::Sente) == -1;
    let left_w = predicate::king_rightness(t, Side::Gote) == -1;

    match (left_b, left_w) {
        (true, true) => Transition::Descend(3),
        (true, false) => Transition::Descend(1),
        (false, true) => Transition::Descend(2),
        (false, false) => Transition::Descend(0),
    }
}

//--------------------------------------------------------------------
// 相居飛車
//--------------------------------------------------------------------

fn build_static_rook(b: &mut TreeBuilder) -> NodeId {
    let yagura = {
        let rapid = b.leaf("Yagura — Rapid Attack", "急戦矢倉");
        let black_rapid = b.leaf("Yagura — Black Rapid Attack", "先手急戦矢倉");
        let mutual = b.leaf("Yagura — Mutual", "相矢倉");
        let other = b.leaf("Yagura — Other", "矢倉その他");
        b.branch(
            "Yagura",
            "矢倉",
            &[predicate::YAGURA_STYLE, predicate::KING_RIGHTNESS],
            rule_yagura,
            vec![rapid, black_rapid, mutual, other],
        )
    };

    let snowroof = {
        let white = b.leaf("Snowroof", "雁木");
        let black = b.leaf("Snowroof — Black", "先手雁木");
        let mutual = b.leaf("Snowroof — Mutual", "相雁木");
        b.branch(
            "Snowroof",
            "雁木",
            &[predicate::SNOWROOF_FLAG],
            rule_snowroof,
            vec![white, black, mutual],
        )
    };

    let side_pawn = {
        let black = b.leaf("Side Pawn Capture", "横歩取り");
        let white = b.leaf("Side Pawn Capture — White", "後手横歩取り");
        b.branch(
            "Side Pawn Capture",
            "横歩取り",
            &[predicate::SIDE_PAWN_PLY],
            rule_side_pawn,
            vec![black, white],
        )
    };

    let bishop_exchange = {
        let standard = b.leaf("Bishop Exchange", "角換わり");
        let white_loss = b.leaf("Bishop Exchange — One-Tempo Loss", "一手損角換わり");
        let black_loss = b.leaf("Bishop Exchange — Black One-Tempo Loss", "先手一手損角換わり");
        let other = b.leaf("Bishop Exchange — Other", "角換わりその他");
        b.branch(
            "Bishop Exchange",
            "角換わり",
            &[predicate::TEMPO_LOSS],
            rule_bishop_exchange,
            vec![standard, white_loss, black_loss, other],
        )
    };

    let double_wing = b.leaf("Double Wing Attack", "相掛かり");
    let other = b.leaf("Mutual Static Rook — Other", "相居飛車力戦");

    b.branch(
        "Mutual Static Rook",
        "相居飛車",
        &[
            predicate::STATIC_ROOK_TRACE,
            predicate::BISHOP_EXCHANGED,
            predicate::LEFT_SILVER_POSITION,
        ],
        rule_static_rook,
        vec![yagura, snowroof, side_pawn, bishop_exchange, double_wing, other],
    )
}

fn rule_static_rook(t: &Tracker) -> Transition {
    use predicate::{bishop_exchanged, left_silver_position, static_rook_trace};

    let trace_b = static_rook_trace(t, Side::Sente);
    let trace_w = static_rook_trace(t, Side::Gote);
    let silver_b = left_silver_position(t, Side::Sente);
    let silver_w = left_silver_position(t, Side::Gote);

    if trace_b == 6 || trace_w == 6 {
        return Transition::Descend(2);
    }
    if bishop_exchanged(t, Side::Sente) == 1 {
        return Transition::Descend(3);
    }
    if [trace_b, trace_w].iter().any(|c| (9..=11).contains(c)) {
        return Transition::Descend(4);
    }
    if silver_b == 2 || silver_w == 2 {
        return Transition::Descend(1);
    }
    let committed = |c: i32| c == 1 || c == 3;
    if committed(silver_b) && committed(silver_w) {
        return Transition::Descend(0);
    }
    if t.ply() > STATIC_ROOK_SETTLE_PLY {
        if silver_b == 1 || silver_w == 1 {
            return Transition::Descend(0);
        }
        return Transition::Descend(5);
    }

    Transition::Continue
}

fn rule_yagura(t: &Tracker) -> Transition {
    use predicate::{king_rightness, yagura_style};

    let style_b = yagura_style(t, Side::Sente);
    let style_w = yagura_style(t, Side::Gote);

    if style_b == 1 && style_w == 1 {
        return Transition::Descend(2);
    }
    if style_b == 2 && style_w != 2 {
        return Transition::Descend(1);
    }
    if style_w == 2 {
        return Transition::Descend(0);
    }
    if king_rightness(t, Side::Sente) == 1 || king_rightness(t, Side::Gote) == 1 {
        return Transition::Descend(3);
    }
    if t.ply() > STATIC_ROOK_SETTLE_PLY {
        if style_b == 1 || style_w == 1 {
            return Transition::Descend(0);
        }
        return Transition::Descend(3);
    }

    Transition::Continue
}

fn rule_snowroof(t: &Tracker) -> Transition {
    let flag_b = predicate::snowroof_flag(t, Side::Sente) == 1;
    let flag_w = predicate::snowroof_flag(t, Side::Gote) == 1;

    if flag_b && flag_w {
        return Transition::Descend(2);
    }
    if t.ply() > STATIC_ROOK_SETTLE_PLY {
        return Transition::Descend(if flag_b { 1 } else { 0 });
    }

    Transition::Continue
}

fn rule_side_pawn(t: &Tracker) -> Transition {
    let ply_b = predicate::side_pawn_ply(t, Side::Sente);
    let ply_w = predicate::side_pawn_ply(t, Side::Gote);

    if ply_b >= 0 && (ply_w < 0 || ply_b < ply_w) {
        Transition::Descend(0)
    } else {
        Transition::Descend(1)
    }
}

fn rule_bishop_exchange(t: &Tracker) -> Transition {
    if t.ply() <= STATIC_ROOK_SETTLE_PLY {
        return Transition::Continue;
    }

    let loss_b = predicate::tempo_loss(t, Side::Sente);
    let loss_w = predicate::tempo_loss(t, Side::Gote);

    match loss_w - loss_b {
        0 => Transition::Descend(0),
        1 => Transition::Descend(1),
        -1 => Transition::Descend(2),
        _ => Transition::Descend(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    fn tracker(mvs: &str) -> Tracker {
        let mut tracker = Tracker::new().unwrap();
        for mv in mvs.split_whitespace() {
            tracker.apply_move(&Move::from_sfen(mv).unwrap()).unwrap();
        }
        tracker
    }

    #[test]
    fn test_shape() {
        let tree = tree();
        let root = tree.root();
        assert_eq!(root.kind(), NodeKind::Root);
        assert_eq!(root.name_ja(), "戦型未確定");
        assert_eq!(root.children().len(), 5);

        // 名前は一意でなくてもよいが、子の参照はすべて有効
        for node in tree.iter() {
            assert_eq!(node.is_leaf(), node.children().is_empty(), "{}", node.name());
            for &child in node.children() {
                assert!(child.get() < tree.len());
                assert_ne!(tree.node(child).kind(), NodeKind::Root);
            }
        }

        let double = tree.find("相振り飛車").unwrap();
        assert_eq!(double.children().len(), 17);
        assert_eq!(tree.child(double, 16).unwrap().name_ja(), "相振り飛車力戦");
        assert_eq!(tree.child(double, 0).unwrap().name_ja(), "相向かい飛車");
        assert_eq!(tree.child(double, 2).unwrap().name_ja(), "先手四間飛車後手向かい飛車");
        assert_eq!(tree.child(double, 15).unwrap().children().len(), 4);

        // どのノードも根から到達できる
        let mut seen = HashSet::new();
        let mut stack = vec![root.id()];
        while let Some(id) = stack.pop() {
            assert!(seen.insert(id));
            stack.extend(tree.node(id).children().iter().copied());
        }
        assert_eq!(seen.len(), tree.len());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NodeKind::Branch.to_string(), "Branch");
        assert_eq!("Leaf".parse::<NodeKind>().unwrap(), NodeKind::Leaf);
    }

    #[test]
    fn test_root_rule() {
        let root = tree().root();

        assert_eq!(root.select(&tracker("7g7f")), Transition::Continue);
        assert_eq!(
            root.select(&tracker("2g2f 3c3d 2f2e 8c8d 2e2d 2c2d 2h2d")),
            Transition::Descend(0)
        );

        // 後手四間飛車、先手は居飛車で飛車先を突いている
        assert_eq!(root.select(&tracker("2g2f 8b4b")), Transition::Descend(1));
        // 先手中飛車、後手は居飛車で飛車先を突いている
        assert_eq!(root.select(&tracker("2h5h 8c8d")), Transition::Descend(2));
        // 相振り飛車
        assert_eq!(root.select(&tracker("2h5h 8b5b")), Transition::Descend(3));
    }

    #[test]
    fn test_ranging_rules() {
        let tree = tree();
        let white = tree.child(tree.root(), 1).unwrap();
        assert_eq!(white.name_ja(), "振り飛車");

        // 68 に振っただけなら四間飛車はまだ保留
        let t = tracker("2g2f 8b4b");
        assert_eq!(white.select(&t), Transition::Continue);

        let t = tracker("2g2f 8b5b");
        assert_eq!(white.select(&t), Transition::Descend(3));

        let fourth = tree.child(white, 2).unwrap();
        assert_eq!(fourth.name(), "Ranging Rook — Fourth File");
        let t = tracker("7g7f 3c3d 2g2f 4c4d");
        assert_eq!(fourth.select(&t), Transition::Descend(1));
        let t = tracker("7g7f 3c3d");
        assert_eq!(fourth.select(&t), Transition::Continue);
    }

    #[test]
    fn test_ranging_settle_ply() {
        let tree = tree();
        let white = tree.child(tree.root(), 1).unwrap();
        let black = tree.child(tree.root(), 2).unwrap();

        let mut white_mvs = String::from("2g2f 8b4b");
        let mut black_mvs = String::from("2h6h 8c8d");
        for _ in 0..5 {
            white_mvs.push_str(" 6i6h 6a6b 6h6i 6b6a");
            black_mvs.push_str(" 4i4h 4a4b 4h4i 4b4a");
        }
        let prefix = |mvs: &str, n: usize| {
            tracker(&mvs.split_whitespace().take(n).collect::<Vec<_>>().join(" "))
        };

        // 68 に振ったままの飛車は、後手は 20 手目、先手は 19 手目で四間飛車に決める
        let t = prefix(&white_mvs, 18);
        assert_eq!(t.ply(), 19);
        assert_eq!(white.select(&t), Transition::Continue);
        let t = prefix(&white_mvs, 19);
        assert_eq!(t.ply(), 20);
        assert_eq!(white.select(&t), Transition::Descend(2));

        let t = prefix(&black_mvs, 17);
        assert_eq!(t.ply(), 18);
        assert_eq!(black.select(&t), Transition::Continue);
        let t = prefix(&black_mvs, 18);
        assert_eq!(t.ply(), 19);
        assert_eq!(black.select(&t), Transition::Descend(2));
        assert_eq!(tree.child(black, 2).unwrap().name_ja(), "先手四間飛車");
    }

    #[test]
    fn test_ranging_leaf_names() {
        let tree = tree();
        let white = tree.child(tree.root(), 1).unwrap();
        let fourth = tree.child(white, 2).unwrap();
        let names: Vec<_> = fourth
            .children()
            .iter()
            .map(|&id| tree.node(id).name())
            .collect();
        assert_eq!(
            names,
            vec!["Ranging Rook — Fourth File", "Ranging Rook — Normal Fourth File"]
        );
        assert_eq!(tree.child(white, 4).unwrap().name_ja(), "振り飛車力戦");

        // 同名の葉があっても分岐ノードが見つかる
        assert_eq!(tree.find("四間飛車").unwrap().id(), fourth.id());
        assert!(!tree.find("角換わり").unwrap().is_leaf());
    }

    #[test]
    fn test_double_ranging_rule() {
        let double = tree().find("相振り飛車").unwrap();
        let t = tracker("2h5h 8b5b");
        assert_eq!(double.select(&t), Transition::Descend(15));
        let t = tracker("2h7h 8b3b");
        assert_eq!(double.select(&t), Transition::Descend(5));

        // 68 に振った飛車はその場で四間飛車
        let t = tracker("2h6h 8b3b");
        assert_eq!(double.select(&t), Transition::Descend(6));
        // 68 から振り直すと力戦
        let t = tracker("2h6h 8b3b 6h5h");
        assert_eq!(double.select(&t), Transition::Descend(16));
    }

    #[test]
    fn test_central_king_rule() {
        let tree = tree();
        let double = tree.find("相振り飛車").unwrap();
        let central = tree.child(double, 15).unwrap();
        assert_eq!(central.name_ja(), "相中飛車");

        // 玉が５筋にいればそのまま相中飛車
        assert_eq!(central.select(&tracker("2h5h 8b5b")), Transition::Descend(0));
        assert_eq!(central.select(&tracker("2h5h 8b5b 5i6h")), Transition::Descend(1));
        assert_eq!(
            central.select(&tracker("2h5h 8b5b 5i6h 5a4b")),
            Transition::Descend(3)
        );
        assert_eq!(tree.child(central, 3).unwrap().name_ja(), "相中飛車左");

        let black_central = tree.child(double, 3).unwrap();
        assert_eq!(black_central.name_ja(), "先手中飛車後手向かい飛車");
        assert_eq!(black_central.select(&tracker("2h5h 8b5b")), Transition::Descend(0));
        assert_eq!(
            black_central.select(&tracker("2h5h 8b5b 5i6h")),
            Transition::Descend(1)
        );
    }

    #[test]
    fn test_static_rook_rule() {
        let static_rook = tree().find("相居飛車").unwrap();

        let t = tracker("2g2f 3c3d 2f2e 8c8d 2e2d 2c2d 2h2d");
        assert_eq!(static_rook.select(&t), Transition::Continue);

        let t = tracker("7g7f 3c3d 8h2b+ 3a2b");
        assert_eq!(static_rook.select(&t), Transition::Descend(3));

        let t = tracker("7g7f 3c3d 2g2f 8c8d 2f2e 8d8e 2e2d 2c2d 2h2d 8e8f 8g8f 8b8f 2d3d");
        assert_eq!(static_rook.select(&t), Transition::Descend(2));

        let side_pawn = tree().find("横歩取り").unwrap();
        assert_eq!(side_pawn.select(&t), Transition::Descend(0));
    }

    #[test]
    fn test_leaf_abandons() {
        let t = tracker("");
        for node in tree().iter().filter(|node| node.is_leaf()) {
            assert_eq!(node.select(&t), Transition::Abandon);
        }
    }
}
