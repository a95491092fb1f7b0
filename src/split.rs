//! `splitConnectorAtCoor` (§4.4): partitions a connector's segment graph
//! into one connector per connected component, treating `pt` as a cut
//! point — two segments meeting only at `pt` are not considered adjacent.
//! Used whenever inserting a port (or dragging a segment away) severs what
//! used to be a single run of wire into independent connectors.
//!
//! The adjacency build + component scan mirrors
//! `algorithm/low_link.rs`'s "build neighbor lists, then scan with a
//! visited set" shape, adapted from Tarjan low-link bookkeeping to plain
//! connected-component labeling since splitting has no articulation-point
//! subtlety: any shared endpoint other than `pt` is a hard edge.

use crate::engine::Engine;
use crate::geometry::{point_on_segment, Point};
use crate::model::{ConnId, PortId, Segment};
use crate::repair;
use std::collections::HashMap;

/// Split `conn` at `pt`. Returns the ids of every resulting connector
/// (`conn`'s own id is reused for the first partition; further partitions
/// are inserted unordered — the caller must push an `OrderItem::Connector`
/// for each and call `fix_order`). A single-element return means nothing
/// was actually disconnected and `conn` was left untouched.
pub fn split_connector_at_coor(engine: &mut Engine, conn: ConnId, pt: Point) -> Vec<ConnId> {
    // §4.4 step 1: if `pt` lies strictly inside one of `conn`'s segments,
    // materialise it as an endpoint first so the adjacency scan below sees
    // it as a cut point rather than the middle of an uninterrupted span.
    let mid_seg_idx = engine.drawn.conn(conn).and_then(|c| {
        c.segments.iter().position(|s| {
            !s.has_endpoint(pt) && point_on_segment(s.p1.x, s.p1.y, s.p2.x, s.p2.y, pt.x, pt.y)
        })
    });
    if let Some(idx) = mid_seg_idx {
        repair::split_segment_at(engine, conn, idx, pt);
    }

    let Some(c) = engine.drawn.conn(conn) else {
        return vec![conn];
    };
    let segs = c.segments.clone();
    let ports = c.ports.clone();
    let vattr = c.vattr.clone();
    let n = segs.len();

    if n == 0 {
        return vec![conn];
    }

    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            if segments_share_endpoint_excluding(&segs[i], &segs[j], pt) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut components: Vec<Vec<usize>> = vec![];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut stack = vec![start];
        visited[start] = true;
        let mut comp = vec![];
        while let Some(cur) = stack.pop() {
            comp.push(cur);
            for &nb in &adj[cur] {
                if !visited[nb] {
                    visited[nb] = true;
                    stack.push(nb);
                }
            }
        }
        components.push(comp);
    }

    debug_assert_eq!(
        components.iter().map(|c| c.len()).sum::<usize>(),
        n,
        "component partition must account for every segment exactly once"
    );

    if components.len() <= 1 {
        return vec![conn];
    }

    engine.unregister_all_segments(conn);

    let mut result_ids = vec![];
    let mut port_membership: HashMap<PortId, Vec<ConnId>> = HashMap::new();

    for (idx, comp) in components.iter().enumerate() {
        let comp_segs: Vec<Segment> = comp.iter().map(|&i| segs[i].clone()).collect();
        let comp_points: Vec<Point> = comp_segs.iter().flat_map(|s| [s.p1, s.p2]).collect();
        let comp_ports: Vec<PortId> = ports
            .iter()
            .copied()
            .filter(|p| {
                engine
                    .drawn
                    .port(*p)
                    .map(|port| comp_points.contains(&port.point()))
                    .unwrap_or(false)
            })
            .collect();

        let new_id = if idx == 0 {
            if let Some(c) = engine.drawn.conn_mut(conn) {
                c.segments = comp_segs;
                c.ports = comp_ports.clone();
                c.vattr = vattr.clone();
            }
            conn
        } else {
            engine.drawn.insert_connector_unordered(comp_segs, comp_ports.clone())
        };

        engine.register_all_segments(new_id);

        for pid in comp_ports {
            port_membership.entry(pid).or_default().push(new_id);
        }

        result_ids.push(new_id);
    }

    for pid in ports {
        let valid = port_membership.get(&pid).cloned().unwrap_or_default();
        if let Some(port) = engine.drawn.port_mut(pid) {
            port.conn.retain(|&c| c != conn || valid.contains(&conn));
            for id in &valid {
                if !port.conn.contains(id) {
                    port.conn.push(*id);
                }
            }
        }
    }

    for &id in &result_ids {
        repair::repair_seg_and_junc(engine, id, true);
    }

    result_ids
}

fn segments_share_endpoint_excluding(a: &Segment, b: &Segment, pt: Point) -> bool {
    let ea = [a.p1, a.p2];
    let eb = [b.p1, b.p2];
    for &x in &ea {
        if x == pt {
            continue;
        }
        for &y in &eb {
            if x == y {
                return true;
            }
        }
    }
    false
}
