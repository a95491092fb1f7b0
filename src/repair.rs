//! `repairSegAndJunc` (§4.2): normalises a single connector's segments and
//! junction set to satisfy invariants 2 ("no redundant collinear overlap"),
//! 3 ("T-junction materialisation") and 4 ("junction set correctness").
//!
//! Phase A folds the twelve direction × topology overlap configurations
//! down to three interval cases (disjoint / touching / overlapping) by
//! projecting each collinear pair onto a canonical axis first, per the
//! Design Notes' own suggested reduction (see SPEC_FULL.md §9). The
//! dangling-end scan mirrors `algorithm/low_link.rs`'s "scan all neighbors,
//! classify, recurse" shape; the endpoint-coordinate bucketing in Phase B
//! mirrors `layout.rs`'s `RouteGraph::_add_node` dedup-by-location pattern.

use crate::engine::Engine;
use crate::geometry::{point_on_segment, same_line_equation, Point, SegGeom};
use crate::model::{ConnId, Connector, Segment};

/// Re-establish invariants 2–4 on `conn`. `chkports` controls whether the
/// dangling-end test's port clause is honored (§4.2) — callers that have
/// already detached the relevant ports pass `false`.
pub fn repair_seg_and_junc(engine: &mut Engine, conn: ConnId, chkports: bool) {
    phase_a_coalesce(engine, conn, chkports);
    phase_b_split_and_junctions(engine, conn);
}

// --- Phase A: collinear overlap coalescing ---------------------------------

fn phase_a_coalesce(engine: &mut Engine, conn_id: ConnId, chkports: bool) {
    loop {
        let Some(conn) = engine.drawn.conn(conn_id) else { return };
        let n = conn.segments.len();
        let mut found = None;

        'scan: for i in 0..n {
            for j in (i + 1)..n {
                let gi = conn.segments[i].geom();
                let gj = conn.segments[j].geom();

                if gi.is_degenerate() || gj.is_degenerate() || !same_line_equation(&gi, &gj) {
                    continue;
                }

                if let Some(replacement) =
                    compute_overlap_replacement(engine, conn, i, j, chkports)
                {
                    found = Some((i, j, replacement));
                    break 'scan;
                }
            }
        }

        match found {
            None => return,
            Some((i, j, replacement)) => apply_replacement(engine, conn_id, i, j, replacement),
        }
    }
}

fn axis_val(p: Point, vertical: bool) -> i32 {
    if vertical {
        p.y
    } else {
        p.x
    }
}

/// `None` means: leave the pair untouched (disjoint, or a touching/overlap
/// configuration that resolves to exactly the input pair unchanged). This
/// is the mechanism that satisfies spec.md §9's termination note for the
/// "no overlap but count unchanged" branch — the pair is recognized as a
/// no-op and is simply never flagged as a replacement, so the outer scan
/// moves on to the next pair instead of looping.
fn compute_overlap_replacement(
    engine: &Engine,
    conn: &Connector,
    i: usize,
    j: usize,
    chkports: bool,
) -> Option<Vec<(Point, Point)>> {
    let gi = conn.segments[i].geom();
    let gj = conn.segments[j].geom();
    let vertical = gi.is_vertical();

    let (lo_i, hi_i) = order_by_axis(gi, vertical);
    let (lo_j, hi_j) = order_by_axis(gj, vertical);

    let (a1, b1) = (axis_val(lo_i, vertical), axis_val(hi_i, vertical));
    let (a2, b2) = (axis_val(lo_j, vertical), axis_val(hi_j, vertical));

    // Case A (disjoint): the two non-overlapping trivial configurations.
    if b1 < a2 || b2 < a1 {
        return None;
    }

    // Sorted, deduplicated breakpoints with the owning original segment(s).
    let mut raw = vec![(a1, lo_i, i), (b1, hi_i, i), (a2, lo_j, j), (b2, hi_j, j)];
    raw.sort_by_key(|(axis, _, _)| *axis);

    let mut breakpoints: Vec<(Point, Vec<usize>)> = vec![];
    for (_, pt, owner) in raw {
        if let Some(last) = breakpoints.last_mut() {
            if last.0 == pt {
                if !last.1.contains(&owner) {
                    last.1.push(owner);
                }
                continue;
            }
        }
        breakpoints.push((pt, vec![owner]));
    }

    let k = breakpoints.len();
    if k < 2 {
        return None;
    }
    let last_idx = k - 1;

    let mut keep = vec![true; k];
    for idx in 1..last_idx {
        let (pt, owners) = &breakpoints[idx];
        let others: Vec<usize> = (0..conn.segments.len())
            .filter(|&s| s != i && s != j && conn.segments[s].has_endpoint(*pt))
            .collect();

        let dangling_ab = match others.len() {
            0 => true,
            1 => {
                let owner_geom = conn.segments[owners[0]].geom();
                same_line_equation(&owner_geom, &conn.segments[others[0]].geom())
            }
            _ => false,
        };

        let port_here = !engine.ports_at(*pt).is_empty();
        let dangling = dangling_ab && (!chkports || !port_here);
        keep[idx] = !dangling;
    }

    let survivors: Vec<Point> = (0..k)
        .filter(|&idx| idx == 0 || idx == last_idx || keep[idx])
        .map(|idx| breakpoints[idx].0)
        .collect();

    if survivors.len() < 2 {
        return None;
    }

    let candidate: Vec<(Point, Point)> = survivors.windows(2).map(|w| (w[0], w[1])).collect();

    // No-op check: same unordered span set as the original pair.
    if candidate.len() == 2 {
        let original = [(gi.p1, gi.p2), (gj.p1, gj.p2)];
        let matches_original = |set: &[(Point, Point)]| {
            set.iter().all(|&(x, y)| {
                original
                    .iter()
                    .any(|&(ox, oy)| (x == ox && y == oy) || (x == oy && y == ox))
            })
        };
        if matches_original(&candidate) {
            return None;
        }
    }

    Some(candidate)
}

fn order_by_axis(seg: SegGeom, vertical: bool) -> (Point, Point) {
    if axis_val(seg.p1, vertical) <= axis_val(seg.p2, vertical) {
        (seg.p1, seg.p2)
    } else {
        (seg.p2, seg.p1)
    }
}

fn apply_replacement(
    engine: &mut Engine,
    conn_id: ConnId,
    i: usize,
    j: usize,
    new_spans: Vec<(Point, Point)>,
) {
    let vattr = {
        let Some(conn) = engine.drawn.conn(conn_id) else { return };
        conn.segments[i]
            .vattr
            .clone()
            .or_else(|| conn.segments[j].vattr.clone())
    };

    let (hi, lo) = if i > j { (i, j) } else { (j, i) };

    let removed_hi = {
        let Some(conn) = engine.drawn.conn_mut(conn_id) else { return };
        conn.segments.remove(hi)
    };
    engine.matrix.remove_segment(removed_hi.id);

    let removed_lo = {
        let Some(conn) = engine.drawn.conn_mut(conn_id) else { return };
        conn.segments.remove(lo)
    };
    engine.matrix.remove_segment(removed_lo.id);

    let new_segments: Vec<Segment> = new_spans
        .into_iter()
        .map(|(p1, p2)| {
            let id = engine.drawn.next_segment_id();
            Segment {
                id,
                p1,
                p2,
                vattr: vattr.clone(),
            }
        })
        .collect();

    let to_register: Vec<_> = new_segments.iter().map(|s| (s.id, s.p1, s.p2)).collect();

    if let Some(conn) = engine.drawn.conn_mut(conn_id) {
        for (offset, seg) in new_segments.into_iter().enumerate() {
            conn.segments.insert(lo + offset, seg);
        }
    }

    for (id, p1, p2) in to_register {
        engine.matrix.add_segment(id, conn_id, p1.x, p1.y, p2.x, p2.y);
    }
}

// --- Phase B: T-split and junction regeneration -----------------------------

fn phase_b_split_and_junctions(engine: &mut Engine, conn_id: ConnId) {
    loop {
        let Some(conn) = engine.drawn.conn(conn_id) else { return };

        let mut candidate = None;
        'find: for seg in &conn.segments {
            for &pt in &[seg.p1, seg.p2] {
                for (idx, other) in conn.segments.iter().enumerate() {
                    if other.has_endpoint(pt) {
                        continue;
                    }
                    if point_on_segment(other.p1.x, other.p1.y, other.p2.x, other.p2.y, pt.x, pt.y)
                    {
                        candidate = Some((idx, pt));
                        break 'find;
                    }
                }
            }
        }

        match candidate {
            None => break,
            Some((idx, pt)) => split_segment_at(engine, conn_id, idx, pt),
        }
    }

    regenerate_junctions(engine, conn_id);
}

/// Break `conn.segments[idx]` into two segments meeting at `pt`, updating
/// the routing matrix. Shared with `portoverlap`, which needs the same
/// "split wherever a point lands strictly inside a segment" operation when
/// reconciling a newly placed port against an existing connector.
pub(crate) fn split_segment_at(engine: &mut Engine, conn_id: ConnId, idx: usize, pt: Point) {
    let removed = {
        let Some(conn) = engine.drawn.conn_mut(conn_id) else { return };
        conn.segments.remove(idx)
    };
    engine.matrix.remove_segment(removed.id);

    let id1 = engine.drawn.next_segment_id();
    let id2 = engine.drawn.next_segment_id();
    let seg1 = Segment {
        id: id1,
        p1: removed.p1,
        p2: pt,
        vattr: removed.vattr.clone(),
    };
    let seg2 = Segment {
        id: id2,
        p1: pt,
        p2: removed.p2,
        vattr: removed.vattr,
    };

    if let Some(conn) = engine.drawn.conn_mut(conn_id) {
        conn.segments.insert(idx, seg1.clone());
        conn.segments.insert(idx + 1, seg2.clone());
    }

    engine
        .matrix
        .add_segment(seg1.id, conn_id, seg1.p1.x, seg1.p1.y, seg1.p2.x, seg1.p2.y);
    engine
        .matrix
        .add_segment(seg2.id, conn_id, seg2.p1.x, seg2.p1.y, seg2.p2.x, seg2.p2.y);
}

fn regenerate_junctions(engine: &mut Engine, conn_id: ConnId) {
    let Some(conn) = engine.drawn.conn(conn_id) else { return };

    let mut counts: std::collections::HashMap<Point, i32> = std::collections::HashMap::new();
    for seg in &conn.segments {
        *counts.entry(seg.p1).or_insert(0) += 1;
        *counts.entry(seg.p2).or_insert(0) += 1;
    }

    let mut junctions: Vec<Point> = counts
        .into_iter()
        .filter(|(_, c)| *c > 2)
        .map(|(p, _)| p)
        .collect();
    junctions.sort();

    if let Some(conn) = engine.drawn.conn_mut(conn_id) {
        conn.junctions = junctions;
    }
}

/// An endpoint `e` of `conn.segments[seg_idx]` is dangling iff it matches no
/// other endpoint of `conn`, or matches exactly one other endpoint whose
/// segment is collinear with it — and (when `chkports`) no port sits there.
pub fn is_dangling_end(
    engine: &Engine,
    conn: &Connector,
    seg_idx: usize,
    e: Point,
    chkports: bool,
) -> bool {
    let others: Vec<usize> = (0..conn.segments.len())
        .filter(|&i| i != seg_idx && conn.segments[i].has_endpoint(e))
        .collect();

    let dangling_ab = match others.len() {
        0 => true,
        1 => same_line_equation(&conn.segments[seg_idx].geom(), &conn.segments[others[0]].geom()),
        _ => false,
    };

    if !dangling_ab {
        return false;
    }

    if chkports && !engine.ports_at(e).is_empty() {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Canvas;
    use crate::model::ShapeKind;

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
    fn t_junction_materialises_and_splits_crossing_segment() {
        // spec.md §8 scenario 3.
        let mut engine = Engine::new(Canvas::default());
        let conn_id = draw(&mut engine, &[(0, 0, 10, 0), (5, 0, 5, 10)]);

        repair_seg_and_junc(&mut engine, conn_id, true);

        let conn = engine.drawn.conn(conn_id).unwrap();
        assert_eq!(conn.segments.len(), 3);
        assert_eq!(conn.junctions, vec![Point::new(5, 0)]);
    }

    #[test]
    fn dangling_collinear_pair_coalesces() {
        // spec.md §8 scenario 4.
        let mut engine = Engine::new(Canvas::default());
        let conn_id = draw(&mut engine, &[(0, 0, 5, 0), (5, 0, 10, 0)]);

        repair_seg_and_junc(&mut engine, conn_id, true);

        let conn = engine.drawn.conn(conn_id).unwrap();
        assert_eq!(conn.segments.len(), 1);
        assert_eq!(conn.segments[0].p1, Point::new(0, 0));
        assert_eq!(conn.segments[0].p2, Point::new(10, 0));
        assert!(conn.junctions.is_empty());
    }

    #[test]
    fn touching_pair_with_port_between_stays_split() {
        let mut engine = Engine::new(Canvas::default());
        let obj = engine.insert_object(ShapeKind::Rect, Point::new(0, -10), Point::new(20, 20));
        engine.insert_port_raw(obj, 5, 0);

        let conn_id = draw(&mut engine, &[(0, 0, 5, 0), (5, 0, 10, 0)]);
        repair_seg_and_junc(&mut engine, conn_id, true);

        let conn = engine.drawn.conn(conn_id).unwrap();
        assert_eq!(conn.segments.len(), 2);
    }

    #[test]
    fn overlapping_pair_with_no_dangling_ends_splits_into_three() {
        let mut engine = Engine::new(Canvas::default());
        // A third segment anchors both interior breakpoints so neither end
        // is dangling; the pair should re-express as three touching spans.
        let conn_id = draw(
            &mut engine,
            &[(0, 0, 10, 0), (5, 0, 15, 0), (5, 0, 5, 10), (10, 0, 10, 10)],
        );

        repair_seg_and_junc(&mut engine, conn_id, true);

        let conn = engine.drawn.conn(conn_id).unwrap();
        // Horizontal run is partitioned at both anchor points: [0,5] [5,10] [10,15].
        let horizontals: Vec<_> = conn
            .segments
            .iter()
            .filter(|s| s.p1.y == 0 && s.p2.y == 0)
            .collect();
        assert_eq!(horizontals.len(), 3);
    }
}
