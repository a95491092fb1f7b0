//! `connectOverlapPorts` (§4.5): reconciles a newly placed (or moved) port
//! against whatever else now occupies its coordinate.
//!
//! Two independent variants, both grounded on `layout.rs`'s
//! `RouteGraph::_add_node` "does a node already exist here, or do I need to
//! cut an edge in two" dispatch:
//!   - port-to-port: another port already sits at the same point with no
//!     connector linking them yet — link them with a fresh zero-segment
//!     connector (§4.1's special case).
//!   - port-to-connector: an existing connector occupies the point. If a
//!     segment already ends there, just link the port in. If the point is
//!     strictly interior to a segment, split that segment first (reusing
//!     `repair::split_segment_at`) so the port never sits buried mid-wire
//!     (invariant 1).

use crate::engine::Engine;
use crate::geometry::{point_on_segment, Point};
use crate::model::{ConnId, OrderItem, PortId};
use crate::repair;
use crate::split;
use std::collections::HashSet;

/// Reconcile `port` against every port and connector sharing its coordinate.
pub fn connect_overlap_ports(engine: &mut Engine, port: PortId) {
    let Some(p) = engine.drawn.port(port) else { return };
    let pt = p.point();

    let other_ports = engine.ports_at(pt);
    for other in other_ports {
        if other == port || ports_already_linked(engine, port, other) {
            continue;
        }
        create_zero_segment_connector(engine, port, other);
    }

    // Worklist seeded from the connectors currently touching `pt`; a split
    // below may produce further partitions at the same coordinate, which
    // get pushed onto the same queue (the §4.5 "split collection").
    let mut queue: Vec<ConnId> = engine.matrix.connectors_at(pt).into_iter().collect();
    let mut seen: HashSet<ConnId> = queue.iter().copied().collect();
    let mut i = 0;
    while i < queue.len() {
        let conn = queue[i];
        i += 1;
        reconcile_port_with_connector(engine, port, conn, pt, &mut queue, &mut seen);
    }
}

/// Apply `connect_overlap_ports` to a batch of newly placed ports. Each
/// port is reconciled against freshly re-read state, so no explicit
/// bookkeeping of shifted segment indices across ports is needed — the
/// index a later port needs is simply re-derived from the connector as it
/// stands after the earlier port's reconciliation.
pub fn connect_overlap_ports_many(engine: &mut Engine, ports: &[PortId]) {
    for &port in ports {
        connect_overlap_ports(engine, port);
    }
}

fn ports_already_linked(engine: &Engine, a: PortId, b: PortId) -> bool {
    let Some(pa) = engine.drawn.port(a) else { return false };
    let Some(pb) = engine.drawn.port(b) else { return false };
    pa.conn.iter().any(|c| pb.conn.contains(c))
}

fn create_zero_segment_connector(engine: &mut Engine, a: PortId, b: PortId) {
    let conn = engine.drawn.insert_connector(vec![], vec![a, b]);
    if let Some(port) = engine.drawn.port_mut(a) {
        port.conn.push(conn);
    }
    if let Some(port) = engine.drawn.port_mut(b) {
        port.conn.push(conn);
    }
}

/// Decide whether `p` landing on `conn` at `pt` forces a topological split
/// (§4.4 via §4.5's "required iff >1 segment touches p, OR exactly one
/// segment touches p but not at its endpoint") or is simply a dangling
/// endpoint that only needs linking.
fn reconcile_port_with_connector(
    engine: &mut Engine,
    port: PortId,
    conn: ConnId,
    pt: Point,
    queue: &mut Vec<ConnId>,
    seen: &mut HashSet<ConnId>,
) {
    let Some(c) = engine.drawn.conn(conn) else { return };
    if c.ports.contains(&port) {
        return;
    }

    // Detach first so the upcoming split doesn't carry a stale back-reference
    // from `port` to a connector id that's about to disappear.
    if let Some(c) = engine.drawn.conn_mut(conn) {
        c.ports.retain(|&pid| pid != port);
    }
    if let Some(pp) = engine.drawn.port_mut(port) {
        pp.conn.retain(|&cid| cid != conn);
    }

    let Some(c) = engine.drawn.conn(conn) else { return };
    let touching: Vec<usize> = c
        .segments
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.has_endpoint(pt) || point_on_segment(s.p1.x, s.p1.y, s.p2.x, s.p2.y, pt.x, pt.y)
        })
        .map(|(i, _)| i)
        .collect();

    let touches_mid = touching
        .iter()
        .any(|&i| !c.segments[i].has_endpoint(pt));
    let needs_split = touching.len() > 1 || (touching.len() == 1 && touches_mid);

    if !needs_split {
        link_port_conn(engine, port, conn);
        return;
    }

    let order_pos = engine
        .drawn
        .order
        .iter()
        .position(|item| *item == OrderItem::Connector(conn));

    let partitions = split::split_connector_at_coor(engine, conn, pt);

    if let Some(pos) = order_pos {
        for (offset, &pid) in partitions.iter().enumerate().skip(1) {
            engine.drawn.order.insert(pos + offset, OrderItem::Connector(pid));
        }
    } else {
        for &pid in partitions.iter().skip(1) {
            engine.drawn.order.push(OrderItem::Connector(pid));
        }
    }
    engine.drawn.fix_order();

    for &pid in &partitions {
        let touches_pt = engine
            .drawn
            .conn(pid)
            .map(|pc| pc.segments.iter().any(|s| s.has_endpoint(pt)))
            .unwrap_or(false);
        if touches_pt {
            link_port_conn(engine, port, pid);
        }
        if seen.insert(pid) {
            queue.push(pid);
        }
    }
}

fn link_port_conn(engine: &mut Engine, port: PortId, conn: ConnId) {
    if let Some(c) = engine.drawn.conn_mut(conn) {
        if !c.ports.contains(&port) {
            c.ports.push(port);
        }
    }
    if let Some(p) = engine.drawn.port_mut(port) {
        if !p.conn.contains(&conn) {
            p.conn.push(conn);
        }
    }
    repair::repair_seg_and_junc(engine, conn, true);
}
