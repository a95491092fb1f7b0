//! Interactive dragging (§4.6): `generateRoutingStartNodes` classifies every
//! endpoint of a moving segment set `S` against the rest of its connector,
//! and `regenSegments` applies the resulting plan each frame. `dragSegment`
//! ties the two together plus a repair pass, and is itself called both from
//! a bare segment drag and from `moveObj`'s induced drag of whatever wires
//! terminate on the moving object's ports.
//!
//! `ManhattanRouter` is grounded on `layout.rs`'s `SimpleLayoutEngine`,
//! which already produces orthogonal L-shaped edge routes between two
//! fixed points; here the same two-segment routing is re-run from each
//! anchor every time a frame moves.

use crate::engine::Engine;
use crate::geometry::Point;
use crate::model::{ConnId, ObjectId, Segment};
use std::collections::{BTreeMap, HashSet};

/// Whether a routed edge should jump over crossing wires, matching
/// `layout.rs`'s edge-rendering modes. The router itself only threads
/// geometry; jump rendering is an external concern (§1), so this is
/// carried through unused beyond being passed along to callers that do
/// render jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpSeg {
    None,
    Default,
    Plain,
}

/// A pluggable routing strategy between two fixed points. §4.6 names this
/// as an external collaborator the engine calls into, not something the
/// engine owns the only implementation of.
pub trait Router {
    fn generate_segments(&self, from: Point, to: Point, jump: JumpSeg) -> Vec<(Point, Point)>;
}

/// The engine's default: a single straight span when already orthogonal,
/// otherwise one right-angle bend. `JumpSeg::Plain` bends vertical-first
/// instead of horizontal-first, giving callers a second route to pick
/// between when the default one crosses something undesirable.
pub struct ManhattanRouter;

impl Router for ManhattanRouter {
    fn generate_segments(&self, from: Point, to: Point, jump: JumpSeg) -> Vec<(Point, Point)> {
        if from.x == to.x || from.y == to.y {
            return vec![(from, to)];
        }

        match jump {
            JumpSeg::Plain => {
                let bend = Point::new(from.x, to.y);
                vec![(from, bend), (bend, to)]
            }
            _ => {
                let bend = Point::new(to.x, from.y);
                vec![(from, bend), (bend, to)]
            }
        }
    }
}

/// The output of classifying a drag over a segment set `S`: the (possibly
/// grown) final selection, the anchors that must be re-routed and what
/// moving point each anchor has to reach, the neighbor stubs the
/// classification decided are now obsolete, and every connector touched.
#[derive(Debug, Clone, Default)]
pub struct DragPlan {
    pub segments: Vec<(ConnId, usize)>,
    /// `(conn, anchor, moving_point)`: route from `anchor` (unmoved) to
    /// `moving_point + offset` once the frame's offset is known.
    pub drag_nodes: Vec<(ConnId, Point, Point)>,
    pub segs_to_remove: Vec<(ConnId, usize)>,
    pub conn_list: Vec<ConnId>,
}

/// `generateRoutingStartNodes` (§4.6): for each endpoint of each segment in
/// `seg_list`, compute `adj` (same-connector neighbors excluding the
/// segment), `prts` (ports at that point) and `allPortsOwned` (whether
/// every such port belongs to an object in `obj_list`, the objects moving
/// alongside this drag — empty for a bare segment drag), then classify:
///
/// - a junction (`|adj| >= 2`) or a foreign port (`prts != ∅` and not all
///   owned) is a drag node: re-route from here to the segment's moved
///   endpoint.
/// - a single neighbor `t` recurses the same test at `t`'s far endpoint; if
///   everything else there is already in `S`, `t` joins `S` too (the drag
///   grows); otherwise the far endpoint is the drag node and `t` is a stub
///   to remove.
/// - no neighbor and an owned port: the wire moves with the port, nothing
///   to do here.
pub fn generate_routing_start_nodes(
    engine: &Engine,
    seg_list: &[(ConnId, usize)],
    obj_list: &[ObjectId],
) -> DragPlan {
    let mut s: HashSet<(ConnId, usize)> = seg_list.iter().copied().collect();
    let mut drag_nodes: HashSet<(ConnId, Point, Point)> = HashSet::new();
    let mut segs_to_remove: HashSet<(ConnId, usize)> = HashSet::new();

    for &(conn, idx) in seg_list {
        let Some(seg) = engine.drawn.conn(conn).and_then(|c| c.segments.get(idx)) else {
            continue;
        };
        for &pt in &[seg.p1, seg.p2] {
            let mut visiting = HashSet::new();
            classify_endpoint(
                engine,
                conn,
                idx,
                pt,
                pt,
                obj_list,
                &mut s,
                &mut drag_nodes,
                &mut segs_to_remove,
                &mut visiting,
            );
        }
    }

    let mut conn_list: Vec<ConnId> = s.iter().map(|&(c, _)| c).collect();
    conn_list.sort();
    conn_list.dedup();

    DragPlan {
        segments: s.into_iter().collect(),
        drag_nodes: drag_nodes.into_iter().collect(),
        segs_to_remove: segs_to_remove.into_iter().collect(),
        conn_list,
    }
}

/// Classify the endpoint `pt` of `seg_idx`, recursing along a chain of
/// single-neighbor segments when the boundary keeps extending. `chain_root`
/// is the original `S`-boundary point this chain is rooted at — whatever
/// drag node is eventually found routes back to `chain_root`'s post-offset
/// position, not to wherever the recursion currently stands.
#[allow(clippy::too_many_arguments)]
fn classify_endpoint(
    engine: &Engine,
    conn: ConnId,
    seg_idx: usize,
    pt: Point,
    chain_root: Point,
    obj_list: &[ObjectId],
    s: &mut HashSet<(ConnId, usize)>,
    drag_nodes: &mut HashSet<(ConnId, Point, Point)>,
    segs_to_remove: &mut HashSet<(ConnId, usize)>,
    visiting: &mut HashSet<(ConnId, usize)>,
) {
    // The data model forbids cycles in a connector's segment graph (§3
    // invariants 2-4); this guard is only a backstop if that's ever
    // violated, so recursion here always terminates.
    if !visiting.insert((conn, seg_idx)) {
        return;
    }

    let Some(c) = engine.drawn.conn(conn) else { return };

    let adj: Vec<usize> = c
        .segments
        .iter()
        .enumerate()
        .filter(|&(i, seg)| i != seg_idx && seg.has_endpoint(pt))
        .map(|(i, _)| i)
        .collect();
    let prts = engine.ports_at(pt);
    let all_ports_owned = !prts.is_empty()
        && prts.iter().all(|&pid| {
            engine
                .drawn
                .port(pid)
                .map(|p| obj_list.contains(&p.obj))
                .unwrap_or(false)
        });

    let adj_subset_of_s = adj.iter().all(|&i| s.contains(&(conn, i)));
    if adj_subset_of_s && adj.len() != 1 {
        // Either an interior junction already wholly inside S, or a
        // dangling/owned-port end with nothing to reroute.
        return;
    }

    if adj.len() >= 2 || (!prts.is_empty() && !all_ports_owned) {
        drag_nodes.insert((conn, pt, chain_root));
        return;
    }

    if adj.len() == 1 {
        let t = adj[0];
        let Some(far) = c.segments[t].other_end(pt) else { return };

        let others_at_far: Vec<usize> = c
            .segments
            .iter()
            .enumerate()
            .filter(|&(i, seg)| i != t && seg.has_endpoint(far))
            .map(|(i, _)| i)
            .collect();
        let others_all_in_s =
            !others_at_far.is_empty() && others_at_far.iter().all(|&i| s.contains(&(conn, i)));

        if others_all_in_s {
            s.insert((conn, t));
            classify_endpoint(
                engine,
                conn,
                t,
                far,
                chain_root,
                obj_list,
                s,
                drag_nodes,
                segs_to_remove,
                visiting,
            );
        } else {
            drag_nodes.insert((conn, far, chain_root));
            segs_to_remove.insert((conn, t));
        }
    }
}

/// `regenSegments` (§4.6): translate every segment the plan selected by
/// `(dx, dy)`, drop the stubs it marked obsolete, and re-route each drag
/// node to wherever its chain root ended up.
pub fn regen_segments(engine: &mut Engine, plan: &DragPlan, dx: i32, dy: i32, router: &dyn Router) {
    for &(conn, idx) in &plan.segments {
        engine.reindex_segment(conn, idx, |seg| {
            seg.p1 = Point::new(seg.p1.x + dx, seg.p1.y + dy);
            seg.p2 = Point::new(seg.p2.x + dx, seg.p2.y + dy);
        });
    }

    remove_segments(engine, &plan.segs_to_remove);

    for &(conn, anchor, moving_point) in &plan.drag_nodes {
        let new_pt = Point::new(moving_point.x + dx, moving_point.y + dy);
        let spans = router.generate_segments(anchor, new_pt, JumpSeg::Default);
        let new_segments: Vec<Segment> = spans
            .into_iter()
            .map(|(p1, p2)| Segment {
                id: engine.drawn.next_segment_id(),
                p1,
                p2,
                vattr: None,
            })
            .collect();
        let to_register: Vec<_> = new_segments.iter().map(|s| (s.id, s.p1, s.p2)).collect();
        if let Some(c) = engine.drawn.conn_mut(conn) {
            c.segments.extend(new_segments);
        }
        for (id, p1, p2) in to_register {
            engine.matrix.add_segment(id, conn, p1.x, p1.y, p2.x, p2.y);
        }
    }
}

fn remove_segments(engine: &mut Engine, to_remove: &[(ConnId, usize)]) {
    let mut by_conn: BTreeMap<ConnId, Vec<usize>> = BTreeMap::new();
    for &(conn, idx) in to_remove {
        by_conn.entry(conn).or_default().push(idx);
    }
    for (conn, mut idxs) in by_conn {
        idxs.sort_unstable_by(|a, b| b.cmp(a));
        idxs.dedup();
        for idx in idxs {
            let removed = {
                let Some(c) = engine.drawn.conn_mut(conn) else { continue };
                if idx >= c.segments.len() {
                    continue;
                }
                c.segments.remove(idx)
            };
            engine.matrix.remove_segment(removed.id);
        }
    }
}

/// `dragSegment` (§4.6): classify, regenerate, and return every connector
/// touched so the caller (`ops::drag_segment`, or `moveObj`'s induced drag)
/// can assimilate them. `obj_list` names the objects moving alongside this
/// drag — pass `&[]` for a bare interactive segment drag.
pub fn drag_segment(
    engine: &mut Engine,
    seg_list: &[(ConnId, usize)],
    dx: i32,
    dy: i32,
    obj_list: &[ObjectId],
    router: &dyn Router,
) -> Vec<ConnId> {
    let plan = generate_routing_start_nodes(engine, seg_list, obj_list);
    regen_segments(engine, &plan, dx, dy, router);
    plan.conn_list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Canvas;

    fn draw(engine: &mut Engine, spans: &[(i32, i32, i32, i32)]) -> ConnId {
        let segs: Vec<Segment> = spans
            .iter()
            .map(|&(x1, y1, x2, y2)| {
                let id = engine.drawn.next_segment_id();
                Segment {
                    id,
                    p1: Point::new(x1, y1),
                    p2: Point::new(x2, y2),
                    vattr: None,
                }
            })
            .collect();
        let conn_id = engine.drawn.insert_connector(segs, vec![]);
        engine.register_all_segments(conn_id);
        conn_id
    }

    #[test]
    fn manhattan_router_emits_one_segment_when_already_orthogonal() {
        let router = ManhattanRouter;
        let segs = router.generate_segments(Point::new(0, 0), Point::new(10, 0), JumpSeg::Default);
        assert_eq!(segs, vec![(Point::new(0, 0), Point::new(10, 0))]);
    }

    #[test]
    fn manhattan_router_bends_once_for_diagonal_targets() {
        let router = ManhattanRouter;
        let segs = router.generate_segments(Point::new(0, 0), Point::new(10, 10), JumpSeg::Default);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn dragging_middle_segment_stretches_its_neighbors() {
        // A C-shaped connector: (0,0)-(0,10)-(10,10)-(10,0). Dragging the
        // middle span up by 10 should re-route both outer legs to follow,
        // keeping the whole thing connected.
        let mut engine = Engine::new(Canvas::default());
        let conn = draw(
            &mut engine,
            &[(0, 0, 0, 10), (0, 10, 10, 10), (10, 10, 10, 0)],
        );
        let mid = engine
            .drawn
            .conn(conn)
            .unwrap()
            .segments
            .iter()
            .position(|s| s.p1 == Point::new(0, 10) && s.p2 == Point::new(10, 10))
            .unwrap();

        let conn_list = drag_segment(&mut engine, &[(conn, mid)], 0, 10, &[], &ManhattanRouter);
        assert_eq!(conn_list, vec![conn]);

        let c = engine.drawn.conn(conn).unwrap();
        assert!(c
            .segments
            .iter()
            .any(|s| s.p1 == Point::new(0, 20) || s.p2 == Point::new(0, 20)));
        assert!(c
            .segments
            .iter()
            .any(|s| s.p1 == Point::new(10, 20) || s.p2 == Point::new(10, 20)));
        assert!(c
            .segments
            .iter()
            .any(|s| s.has_endpoint(Point::new(0, 0))));
        assert!(c
            .segments
            .iter()
            .any(|s| s.has_endpoint(Point::new(10, 0))));
    }

    #[test]
    fn dragging_a_dangling_leaf_segment_has_no_drag_node() {
        // A single free-floating segment: dragging it has no neighbors or
        // ports to reconcile, so the classification adds nothing.
        let mut engine = Engine::new(Canvas::default());
        let conn = draw(&mut engine, &[(0, 0, 10, 0)]);

        let plan = generate_routing_start_nodes(&engine, &[(conn, 0)], &[]);
        assert!(plan.drag_nodes.is_empty());
        assert!(plan.segs_to_remove.is_empty());
        assert_eq!(plan.segments, vec![(conn, 0)]);
    }

    #[test]
    fn junction_endpoint_becomes_a_drag_node() {
        // A T already split at the junction coordinate: (0,0)-(5,0),
        // (5,0)-(10,0) and a stem (5,0)-(5,10). Dragging the stem must not
        // drag the crossbar along with it — (5,0) is a junction (two
        // neighbors outside S) and becomes a drag node instead.
        let mut engine = Engine::new(Canvas::default());
        let conn = draw(
            &mut engine,
            &[(0, 0, 5, 0), (5, 0, 10, 0), (5, 0, 5, 10)],
        );
        let stem = engine
            .drawn
            .conn(conn)
            .unwrap()
            .segments
            .iter()
            .position(|s| s.p1 == Point::new(5, 0) && s.p2 == Point::new(5, 10))
            .unwrap();

        let plan = generate_routing_start_nodes(&engine, &[(conn, stem)], &[]);
        assert!(plan.drag_nodes.iter().any(|&(c, anchor, _)| c == conn && anchor == Point::new(5, 0)));
    }
}
