//! Top-level interactive operations (§4.7) and the operation state machine
//! that replaces the original callback-stack model (§4.8, Design Notes §9:
//! "prefer an explicit state machine over re-entrant callback stacks").
//!
//! `OpStack` mirrors `mir.rs`'s single-current-builder-state shape (one
//! in-progress thing at a time, entered and exited explicitly) rather than
//! a push-down stack of nested callbacks — there is never more than one
//! interactive operation active, so a single `Option<Operation>` slot is
//! the right amount of state, not a `Vec`.

use crate::drag::{self, JumpSeg, ManhattanRouter};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::geometry::{point_on_segment, Point};
use crate::model::{ConnId, ObjectId, OrderItem, Segment, VisAttr};
use crate::portoverlap;
use crate::repair;
use crate::shorting;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    Idle,
    DrawConn,
    MoveConn,
    DragSeg,
    MoveObj,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub mode: OpMode,
    /// Z-order snapshot taken at `begin_op`, so a caller that aborts mid-op
    /// can restore it rather than leaving `Drawn::order` half-updated.
    pub order_backup: Vec<OrderItem>,
}

#[derive(Debug, Default)]
pub struct OpStack {
    current: Option<Operation>,
}

impl OpStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> OpMode {
        self.current.as_ref().map(|o| o.mode).unwrap_or(OpMode::Idle)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Enter `mode`, snapshotting the current z-order for a possible abort.
    /// Panics (a programmer error, not a user-facing one) if an operation
    /// is already active — interactive operations never nest.
    pub fn begin_op(&mut self, mode: OpMode, order_backup: Vec<OrderItem>) {
        assert!(self.current.is_none(), "an operation is already in progress");
        self.current = Some(Operation { mode, order_backup });
    }

    /// Leave the current operation, discarding its snapshot. Returns it so
    /// a caller can inspect `order_backup` if aborting instead of
    /// committing.
    pub fn end_op(&mut self) -> Option<Operation> {
        self.current.take()
    }
}

/// Re-establish every invariant across a batch of connectors that just had
/// their geometry changed: per-connector repair, then fuse whatever now
/// touches, then reconcile ports along the survivors, then repair once
/// more (fusing and port-splitting can each re-open the other's work).
/// Mirrors `main.rs`'s top-level "parse, then lower, then render" pipeline
/// shape, generalized to this engine's own three-stage reconciliation.
pub fn assimilate(engine: &mut Engine, conn_list: &[ConnId]) -> Vec<ConnId> {
    for &id in conn_list {
        repair::repair_seg_and_junc(engine, id, true);
    }

    let survivors = shorting::short_and_merge_connectors(engine, conn_list);

    let mut touched_ports = vec![];
    for &id in &survivors {
        if let Some(c) = engine.drawn.conn(id) {
            touched_ports.extend(c.ports.iter().copied());
        }
    }
    portoverlap::connect_overlap_ports_many(engine, &touched_ports);

    let mut finalized = vec![];
    for id in survivors {
        if engine.drawn.conn(id).is_some() {
            repair::repair_seg_and_junc(engine, id, true);
            if !finalized.contains(&id) {
                finalized.push(id);
            }
        }
    }
    finalized
}

/// Draw a new connector between two (grid-snapped) points and assimilate
/// it into the model. Returns the id of the connector the new wire ended
/// up belonging to after fusion/splitting.
pub fn draw_connector(engine: &mut Engine, p1: Point, p2: Point, vattr: Option<VisAttr>) -> ConnId {
    let p1 = engine.canvas.snap(p1);
    let p2 = engine.canvas.snap(p2);

    let spans = ManhattanRouter.generate_segments(p1, p2, JumpSeg::Default);
    let segments: Vec<Segment> = spans
        .into_iter()
        .map(|(a, b)| Segment {
            id: engine.drawn.next_segment_id(),
            p1: a,
            p2: b,
            vattr: vattr.clone(),
        })
        .collect();

    let conn_id = engine.drawn.insert_connector(segments, vec![]);
    if let Some(c) = engine.drawn.conn_mut(conn_id) {
        c.vattr = vattr;
    }
    engine.register_all_segments(conn_id);

    assimilate(engine, &[conn_id]).into_iter().next().unwrap_or(conn_id)
}

/// Non-interactive `drawConnector` (§4.7): the caller supplies the literal
/// segment list (already pre-split by the caller). Grid-snaps every
/// endpoint and rejects the call outright if any endpoint of one segment
/// lands strictly inside another segment of the same call — that is the
/// caller's job to pre-split, per spec, not this function's.
pub fn draw_connector_segments(
    engine: &mut Engine,
    spans: &[(Point, Point)],
    vattr: Option<VisAttr>,
) -> Result<ConnId, EngineError> {
    if spans.is_empty() {
        return Err(EngineError::InvalidInput(
            "draw_connector_segments: empty segment list".to_string(),
        ));
    }

    let snapped: Vec<(Point, Point)> = spans
        .iter()
        .map(|&(a, b)| (engine.canvas.snap(a), engine.canvas.snap(b)))
        .collect();

    for (i, &(a1, a2)) in snapped.iter().enumerate() {
        for (j, &(b1, b2)) in snapped.iter().enumerate() {
            if i == j {
                continue;
            }
            for &pt in &[a1, a2] {
                let at_endpoint = pt == b1 || pt == b2;
                if !at_endpoint && point_on_segment(b1.x, b1.y, b2.x, b2.y, pt.x, pt.y) {
                    return Err(EngineError::InvariantViolation(format!(
                        "segment endpoint ({}, {}) lies strictly inside another segment of the same draw call; pre-split required",
                        pt.x, pt.y
                    )));
                }
            }
        }
    }

    let segments: Vec<Segment> = snapped
        .into_iter()
        .map(|(p1, p2)| Segment {
            id: engine.drawn.next_segment_id(),
            p1,
            p2,
            vattr: vattr.clone(),
        })
        .collect();

    let conn_id = engine.drawn.insert_connector(segments, vec![]);
    if let Some(c) = engine.drawn.conn_mut(conn_id) {
        c.vattr = vattr;
    }
    engine.register_all_segments(conn_id);

    Ok(assimilate(engine, &[conn_id]).into_iter().next().unwrap_or(conn_id))
}

/// Translate every segment and junction of `conn` by `(dx, dy)` and
/// re-assimilate, so a connector dragged on top of something else fuses
/// with it exactly as a freshly drawn one would.
pub fn move_conn(engine: &mut Engine, conn: ConnId, dx: i32, dy: i32) -> Vec<ConnId> {
    engine.unregister_all_segments(conn);
    if let Some(c) = engine.drawn.conn_mut(conn) {
        for seg in c.segments.iter_mut() {
            seg.p1 = Point::new(seg.p1.x + dx, seg.p1.y + dy);
            seg.p2 = Point::new(seg.p2.x + dx, seg.p2.y + dy);
        }
        for j in c.junctions.iter_mut() {
            *j = Point::new(j.x + dx, j.y + dy);
        }
    }
    engine.register_all_segments(conn);
    assimilate(engine, &[conn])
}

/// Result of partitioning the connectors named in a `splitConnectorAtSegments`
/// call: which resulting connectors carry the named segments (`connM`) and
/// which carry the remainder (`connNM`).
struct SplitClassified {
    conn_m: Vec<ConnId>,
    conn_nm: Vec<ConnId>,
}

/// `splitConnectorAtSegments(segList)` (§4.7): separate the segments named
/// in `seg_list` (each a `(connector, segment index)` pair, possibly
/// spanning several connectors) away from the remainder of their
/// connectors. Per connector, the named segments are grouped into `connM`
/// partitions (endpoint-adjacency components of just the selected
/// segments) while whatever is left becomes `connNM` partitions
/// (adjacency components of the rest); the original connector's ports are
/// detached and reconciled against whichever partition they land on.
/// Returns every resulting connector id.
pub fn split_connector_at_segments(engine: &mut Engine, seg_list: &[(ConnId, usize)]) -> Vec<ConnId> {
    let classified = split_connector_at_segments_classified(engine, seg_list);
    classified.conn_m.into_iter().chain(classified.conn_nm).collect()
}

fn split_connector_at_segments_classified(
    engine: &mut Engine,
    seg_list: &[(ConnId, usize)],
) -> SplitClassified {
    // Sort by connector id then descending segment index (§4.7), so that
    // removing segments in place within one connector never invalidates
    // an index this call still has to process.
    let mut by_conn: BTreeMap<ConnId, Vec<usize>> = BTreeMap::new();
    for &(conn, idx) in seg_list {
        by_conn.entry(conn).or_default().push(idx);
    }

    let mut conn_m = vec![];
    let mut conn_nm = vec![];
    for (conn, mut idxs) in by_conn {
        idxs.sort_unstable_by(|a, b| b.cmp(a));
        idxs.dedup();
        let (m, nm) = split_one_connector_at_segments(engine, conn, &idxs);
        conn_m.extend(m);
        conn_nm.extend(nm);
    }

    SplitClassified { conn_m, conn_nm }
}

fn split_one_connector_at_segments(
    engine: &mut Engine,
    conn: ConnId,
    sel_idx: &[usize],
) -> (Vec<ConnId>, Vec<ConnId>) {
    let Some(c) = engine.drawn.conn(conn) else {
        return (vec![], vec![]);
    };
    let all_segs = c.segments.clone();
    let ports = c.ports.clone();
    let vattr = c.vattr.clone();

    let sel: HashSet<usize> = sel_idx.iter().copied().collect();
    let selected_segs: Vec<Segment> = all_segs
        .iter()
        .enumerate()
        .filter(|(i, _)| sel.contains(i))
        .map(|(_, s)| s.clone())
        .collect();
    let remainder_segs: Vec<Segment> = all_segs
        .iter()
        .enumerate()
        .filter(|(i, _)| !sel.contains(i))
        .map(|(_, s)| s.clone())
        .collect();

    if selected_segs.is_empty() {
        return (vec![], vec![conn]);
    }

    engine.unregister_all_segments(conn);

    for &pid in &ports {
        if let Some(p) = engine.drawn.port_mut(pid) {
            p.conn.retain(|&cid| cid != conn);
        }
    }

    let conn_m_groups = group_by_adjacency(&selected_segs);
    let conn_nm_groups = group_by_adjacency(&remainder_segs);

    let order_pos = engine
        .drawn
        .order
        .iter()
        .position(|item| *item == OrderItem::Connector(conn));

    let mut conn_m_ids = vec![];
    let mut conn_nm_ids = vec![];
    let mut new_order_ids = vec![];
    let mut first = true;

    for group in &conn_m_groups {
        let new_id = take_or_insert(engine, conn, group.clone(), vattr.clone(), &mut first, &mut new_order_ids);
        engine.register_all_segments(new_id);
        conn_m_ids.push(new_id);
    }
    for group in &conn_nm_groups {
        let new_id = take_or_insert(engine, conn, group.clone(), vattr.clone(), &mut first, &mut new_order_ids);
        engine.register_all_segments(new_id);
        conn_nm_ids.push(new_id);
    }

    if let Some(pos) = order_pos {
        for (offset, &id) in new_order_ids.iter().enumerate() {
            engine.drawn.order.insert(pos + 1 + offset, OrderItem::Connector(id));
        }
    } else {
        for &id in &new_order_ids {
            engine.drawn.order.push(OrderItem::Connector(id));
        }
    }
    engine.drawn.fix_order();

    portoverlap::connect_overlap_ports_many(engine, &ports);

    for &id in conn_m_ids.iter().chain(conn_nm_ids.iter()) {
        if engine.drawn.conn(id).is_some() {
            repair::repair_seg_and_junc(engine, id, true);
        }
    }

    (conn_m_ids, conn_nm_ids)
}

/// The first partition reuses `conn`'s own id (so callers holding onto it
/// keep a valid handle when possible); every later one gets a fresh,
/// unordered connector that `new_order_ids` remembers to splice into the
/// z-order at `conn`'s old position.
fn take_or_insert(
    engine: &mut Engine,
    conn: ConnId,
    group: Vec<Segment>,
    vattr: Option<VisAttr>,
    first: &mut bool,
    new_order_ids: &mut Vec<ConnId>,
) -> ConnId {
    if *first {
        *first = false;
        if let Some(c) = engine.drawn.conn_mut(conn) {
            c.segments = group;
            c.ports = vec![];
            c.vattr = vattr;
        }
        conn
    } else {
        let id = engine.drawn.insert_connector_unordered(group, vec![]);
        if let Some(c) = engine.drawn.conn_mut(id) {
            c.vattr = vattr;
        }
        new_order_ids.push(id);
        id
    }
}

fn group_by_adjacency(segs: &[Segment]) -> Vec<Vec<Segment>> {
    let n = segs.len();
    if n == 0 {
        return vec![];
    }
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            if segments_share_endpoint(&segs[i], &segs[j]) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut groups = vec![];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut stack = vec![start];
        visited[start] = true;
        let mut comp = vec![];
        while let Some(cur) = stack.pop() {
            comp.push(segs[cur].clone());
            for &nb in &adj[cur] {
                if !visited[nb] {
                    visited[nb] = true;
                    stack.push(nb);
                }
            }
        }
        groups.push(comp);
    }
    groups
}

fn segments_share_endpoint(a: &Segment, b: &Segment) -> bool {
    a.p1 == b.p1 || a.p1 == b.p2 || a.p2 == b.p1 || a.p2 == b.p2
}

/// `moveSegment(segList, offx, offy)` (§4.7: `splitConnectorAtSegments`
/// then `moveConn`): isolate the named segments into their own connectors,
/// translate just those (`connM`), and leave the remainder (`connNM`) in
/// place. A moved span that slides back on top of its old neighbor fuses
/// right back in via the `moveConn` it rides on.
pub fn move_segment(engine: &mut Engine, seg_list: &[(ConnId, usize)], dx: i32, dy: i32) -> Vec<ConnId> {
    let classified = split_connector_at_segments_classified(engine, seg_list);

    let mut result: Vec<ConnId> = vec![];
    for id in classified.conn_m {
        if engine.drawn.conn(id).is_some() {
            for moved in move_conn(engine, id, dx, dy) {
                if !result.contains(&moved) {
                    result.push(moved);
                }
            }
        }
    }
    for id in classified.conn_nm {
        if !result.contains(&id) {
            result.push(id);
        }
    }
    result
}

/// `dragSegment(segList, offx, offy, routers…)` (§4.6/§4.7): classify and
/// regenerate via `drag::drag_segment`, then assimilate every connector it
/// touched — the engine calls `assimilate` on drag completion, not just a
/// repair pass, since fusing/splitting can also be triggered by a drag.
pub fn drag_segment(
    engine: &mut Engine,
    seg_list: &[(ConnId, usize)],
    dx: i32,
    dy: i32,
    obj_list: &[ObjectId],
) -> Vec<ConnId> {
    let conn_list = drag::drag_segment(engine, seg_list, dx, dy, obj_list, &ManhattanRouter);
    assimilate(engine, &conn_list)
}

/// `moveObj` (§2, §9): translate an object and its ports by `(dx, dy)`,
/// dragging along whatever segments currently terminate on those ports —
/// via the same §4.6 classification `dragSegment` uses, with this object
/// as the sole member of `objList` — then assimilate the result.
///
/// Design Notes §9 flags `moveObj`'s "first junction" traversal
/// (`checkedSegsCount`) as an open question; resolved here by reusing
/// `drag::generate_routing_start_nodes`'s classification directly rather
/// than a bespoke traversal, which already stops at the first junction or
/// foreign port it finds and (per [[DESIGN.md's acyclicity note]]) is safe
/// because the model forbids cyclic connector graphs.
pub fn move_obj(engine: &mut Engine, obj: ObjectId, dx: i32, dy: i32) -> Vec<ConnId> {
    let Some(o) = engine.drawn.object(obj) else {
        return vec![];
    };
    let port_ids = o.ports.clone();

    let mut seg_list: Vec<(ConnId, usize)> = vec![];
    for &pid in &port_ids {
        let Some(p) = engine.drawn.port(pid) else { continue };
        let pt = p.point();
        let conns = p.conn.clone();
        for conn in conns {
            if let Some(c) = engine.drawn.conn(conn) {
                for (idx, seg) in c.segments.iter().enumerate() {
                    if seg.has_endpoint(pt) && !seg_list.contains(&(conn, idx)) {
                        seg_list.push((conn, idx));
                    }
                }
            }
        }
    }

    let conn_list = if seg_list.is_empty() {
        vec![]
    } else {
        drag::drag_segment(engine, &seg_list, dx, dy, &[obj], &ManhattanRouter)
    };

    if let Some(o) = engine.drawn.object_mut(obj) {
        o.start = Point::new(o.start.x + dx, o.start.y + dy);
        o.end = Point::new(o.end.x + dx, o.end.y + dy);
    }
    for &pid in &port_ids {
        let old_key = engine.drawn.port(pid).map(|p| (p.x, p.y));
        if let Some(p) = engine.drawn.port_mut(pid) {
            p.x += dx;
            p.y += dy;
        }
        let new_key = engine.drawn.port(pid).map(|p| (p.x, p.y));
        if let (Some(ok), Some(nk)) = (old_key, new_key) {
            if let Some(v) = engine.port_index.get_mut(&ok) {
                v.retain(|&id| id != pid);
            }
            engine.port_index.entry(nk).or_default().push(pid);
        }
    }

    assimilate(engine, &conn_list)
}

/// Remove a connector entirely: unregister its geometry, detach every port
/// back-reference, drop its z-order entry, and tombstone its slot.
pub fn remove_conn(engine: &mut Engine, conn: ConnId) {
    engine.unregister_all_segments(conn);

    if let Some(c) = engine.drawn.remove_connector(conn) {
        for pid in c.ports {
            if let Some(port) = engine.drawn.port_mut(pid) {
                port.conn.retain(|&cid| cid != conn);
            }
        }
    }

    if let Some(idx) = engine
        .drawn
        .order
        .iter()
        .position(|item| *item == OrderItem::Connector(conn))
    {
        engine.drawn.order.remove(idx);
    }
    engine.drawn.fix_order();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Canvas;
    use crate::model::ShapeKind;

    #[test]
    fn draw_connector_produces_orthogonal_path() {
        let mut engine = Engine::new(Canvas::default());
        let conn = draw_connector(&mut engine, Point::new(0, 0), Point::new(30, 20), None);
        let c = engine.drawn.conn(conn).unwrap();
        assert!(!c.segments.is_empty());
    }

    #[test]
    fn drawing_two_connectors_that_touch_fuses_them() {
        // spec.md §8 scenario 1: two drawn connectors sharing an endpoint
        // end up as one connector.
        let mut engine = Engine::new(Canvas::default());
        let c1 = draw_connector(&mut engine, Point::new(0, 0), Point::new(10, 0), None);
        let c2 = draw_connector(&mut engine, Point::new(10, 0), Point::new(10, 10), None);

        assert_eq!(c1, c2);
        let merged = engine.drawn.conn(c1).unwrap();
        assert!(merged.segments.len() >= 2);
    }

    #[test]
    fn floating_connector_far_away_stays_separate() {
        // spec.md §8 scenario 2.
        let mut engine = Engine::new(Canvas::default());
        let c1 = draw_connector(&mut engine, Point::new(0, 0), Point::new(10, 0), None);
        let c2 = draw_connector(&mut engine, Point::new(1000, 1000), Point::new(1010, 1000), None);

        assert_ne!(c1, c2);
        assert!(engine.drawn.conn(c1).is_some());
        assert!(engine.drawn.conn(c2).is_some());
    }

    #[test]
    fn remove_conn_detaches_ports_and_order() {
        let mut engine = Engine::new(Canvas::default());
        let obj = engine.insert_object(ShapeKind::Rect, Point::new(-10, -10), Point::new(30, 10));
        let port = engine.insert_port_raw(obj, 0, 0);

        let conn = draw_connector(&mut engine, Point::new(0, 0), Point::new(10, 0), None);
        portoverlap::connect_overlap_ports(&mut engine, port);
        let conn = engine.drawn.port(port).unwrap().conn[0];

        remove_conn(&mut engine, conn);

        assert!(engine.drawn.conn(conn).is_none());
        assert!(engine.drawn.port(port).unwrap().conn.is_empty());
        assert!(!engine.drawn.order.contains(&OrderItem::Connector(conn)));
    }

    #[test]
    fn draw_connector_segments_validates_pre_split_and_snaps() {
        let mut engine = Engine::new(Canvas::default());
        let spans = [(Point::new(0, 0), Point::new(30, 0))];
        let conn = draw_connector_segments(&mut engine, &spans, None).unwrap();
        assert_eq!(engine.drawn.conn(conn).unwrap().segments.len(), 1);
    }

    #[test]
    fn move_segment_isolates_and_translates_only_the_target_span() {
        // A bent two-segment connector: moving the first leg must split it
        // away from the second leg (which keeps its original coordinates)
        // rather than dragging the whole connector along.
        let mut engine = Engine::new(Canvas::default());
        let conn = draw_connector(&mut engine, Point::new(0, 0), Point::new(20, 10), None);
        let seg_idx = engine
            .drawn
            .conn(conn)
            .unwrap()
            .segments
            .iter()
            .position(|s| s.p1 == Point::new(0, 0) || s.p2 == Point::new(0, 0))
            .unwrap();

        let result = move_segment(&mut engine, &[(conn, seg_idx)], 0, 50);

        let moved = result
            .iter()
            .find(|&&id| {
                engine
                    .drawn
                    .conn(id)
                    .map(|c| c.segments.iter().any(|s| s.p1.y == 50 || s.p2.y == 50))
                    .unwrap_or(false)
            })
            .expect("a resulting connector carries the moved span");
        let untouched = result
            .iter()
            .find(|&id| id != moved)
            .expect("the other leg survives as a separate connector");

        assert!(engine
            .drawn
            .conn(*untouched)
            .unwrap()
            .segments
            .iter()
            .any(|s| s.p1 == Point::new(20, 10) || s.p2 == Point::new(20, 10)));
    }

    #[test]
    fn split_connector_at_segments_partitions_into_conn_m_and_conn_nm() {
        // A C-shaped connector: (0,0)-(0,10)-(10,10)-(10,0). Splitting out
        // the middle span leaves the two outer legs, which are no longer
        // adjacent to each other, as two separate remainder connectors.
        let mut engine = Engine::new(Canvas::default());
        let conn = draw_connector_segments(
            &mut engine,
            &[
                (Point::new(0, 0), Point::new(0, 10)),
                (Point::new(0, 10), Point::new(10, 10)),
                (Point::new(10, 10), Point::new(10, 0)),
            ],
            None,
        )
        .unwrap();
        let mid_idx = engine
            .drawn
            .conn(conn)
            .unwrap()
            .segments
            .iter()
            .position(|s| s.p1 == Point::new(0, 10) && s.p2 == Point::new(10, 10))
            .unwrap();

        let ids = split_connector_at_segments(&mut engine, &[(conn, mid_idx)]);

        assert_eq!(ids.len(), 3);
        let carries_mid = ids.iter().any(|&id| {
            engine
                .drawn
                .conn(id)
                .map(|c| c.segments.iter().any(|s| s.p1 == Point::new(0, 10) && s.p2 == Point::new(10, 10)))
                .unwrap_or(false)
        });
        assert!(carries_mid);
        let legs_separate = ids
            .iter()
            .filter(|&&id| {
                engine
                    .drawn
                    .conn(id)
                    .map(|c| c.segments.iter().any(|s| s.has_endpoint(Point::new(0, 0)) || s.has_endpoint(Point::new(10, 0))))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(legs_separate, 2);
    }

    #[test]
    fn move_obj_drags_its_attached_wire_along() {
        let mut engine = Engine::new(Canvas::default());
        let obj = engine.insert_object(ShapeKind::Rect, Point::new(0, 0), Point::new(10, 10));
        let port = engine.insert_port_raw(obj, 10, 5);

        let conn = draw_connector(&mut engine, Point::new(10, 5), Point::new(40, 5), None);
        portoverlap::connect_overlap_ports(&mut engine, port);

        move_obj(&mut engine, obj, 0, 20);

        let moved_port = engine.drawn.port(port).unwrap();
        assert_eq!(moved_port.point(), Point::new(10, 25));
        let conns = moved_port.conn.clone();
        assert!(!conns.is_empty());
        let still_attached = conns.iter().any(|&c| {
            engine
                .drawn
                .conn(c)
                .map(|c| c.segments.iter().any(|s| s.has_endpoint(Point::new(10, 25))))
                .unwrap_or(false)
        });
        assert!(still_attached);
        let _ = conn;
    }

    #[test]
    fn op_stack_rejects_nested_begin() {
        let mut ops = OpStack::new();
        ops.begin_op(OpMode::DrawConn, vec![]);
        assert_eq!(ops.mode(), OpMode::DrawConn);
        assert!(ops.end_op().is_some());
        assert_eq!(ops.mode(), OpMode::Idle);
    }
}
