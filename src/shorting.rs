//! `shortAndMergeConnector`/`shortAndMergeConnectors` (§4.3): fuses any two
//! connectors that now touch at a shared coordinate into one. Mirrors
//! `algorithm/make_biconnected.rs`'s labeled-loop-until-fixpoint shape —
//! here the loop keeps absorbing touching connectors into the running
//! master until no further touch exists, instead of keep adding edges
//! until the graph is biconnected.

use crate::engine::Engine;
use crate::model::{ConnId, OrderItem, PortId};
use crate::repair;

/// Repeatedly fuse `conn` with whatever connector it now touches, returning
/// the id of the surviving (lowest-`ConnId`) connector once no further
/// fusion is possible. `conn` itself may not survive — always use the
/// returned id afterward.
pub fn short_and_merge_connector(engine: &mut Engine, conn: ConnId) -> ConnId {
    let mut current = conn;

    loop {
        match find_touching_connector(engine, current) {
            None => break,
            Some(other) => current = merge_two(engine, current, other),
        }
    }

    repair::repair_seg_and_junc(engine, current, true);
    current
}

/// Apply `short_and_merge_connector` to every id in `conns`, returning the
/// deduplicated set of surviving masters. Ids already absorbed by an
/// earlier fusion in this same batch are skipped.
pub fn short_and_merge_connectors(engine: &mut Engine, conns: &[ConnId]) -> Vec<ConnId> {
    let mut survivors = vec![];
    for &id in conns {
        if engine.drawn.conn(id).is_none() {
            continue;
        }
        let master = short_and_merge_connector(engine, id);
        if !survivors.contains(&master) {
            survivors.push(master);
        }
    }
    survivors
}

fn find_touching_connector(engine: &Engine, conn: ConnId) -> Option<ConnId> {
    let c = engine.drawn.conn(conn)?;

    let mut points = c.endpoint_coords();
    for &port_id in &c.ports {
        if let Some(port) = engine.drawn.port(port_id) {
            points.push(port.point());
        }
    }

    let mut candidates: Vec<ConnId> = vec![];
    for p in points {
        for other in engine.connectors_at(p) {
            if other != conn && !candidates.contains(&other) {
                candidates.push(other);
            }
        }
    }

    candidates.sort();
    candidates.into_iter().next()
}

fn merge_two(engine: &mut Engine, a: ConnId, b: ConnId) -> ConnId {
    let (master, victim) = if a.0 <= b.0 { (a, b) } else { (b, a) };

    let master_order = engine.drawn.conn(master).map(|c| c.order).unwrap_or(0);

    let Some(victim_conn) = engine.drawn.remove_connector(victim) else {
        return master;
    };
    let victim_order = victim_conn.order;

    for seg in &victim_conn.segments {
        engine.matrix.remove_segment(seg.id);
    }

    if let Some(m) = engine.drawn.conn_mut(master) {
        for seg in victim_conn.segments {
            if !m.segments.iter().any(|s| s.same_span(&seg)) {
                m.segments.push(seg);
            }
        }
        for port_id in victim_conn.ports {
            if !m.ports.contains(&port_id) {
                m.ports.push(port_id);
            }
        }
        for junction in victim_conn.junctions {
            if !m.junctions.contains(&junction) {
                m.junctions.push(junction);
            }
        }
        if m.vattr.is_none() {
            m.vattr = victim_conn.vattr;
        }
    }

    register_missing_segments(engine, master);
    fix_port_backreferences(engine, master, victim);

    // §4.3 step 5: drop both order entries, then reinsert the master at
    // maxOrder - (#merged - 1); a two-way merge has #merged == 2, so the
    // master takes over the topmost merged connector's slot minus one.
    let max_order = master_order.max(victim_order);
    engine.drawn.order.retain(|item| {
        *item != OrderItem::Connector(victim) && *item != OrderItem::Connector(master)
    });
    let target = max_order.saturating_sub(1).min(engine.drawn.order.len());
    engine.drawn.order.insert(target, OrderItem::Connector(master));
    engine.drawn.fix_order();

    master
}

fn register_missing_segments(engine: &mut Engine, conn: ConnId) {
    let Some(c) = engine.drawn.conn(conn) else { return };
    let to_register: Vec<_> = c
        .segments
        .iter()
        .filter(|s| !engine.matrix.contains(s.id))
        .map(|s| (s.id, s.p1, s.p2))
        .collect();
    for (id, p1, p2) in to_register {
        engine.matrix.add_segment(id, conn, p1.x, p1.y, p2.x, p2.y);
    }
}

fn fix_port_backreferences(engine: &mut Engine, master: ConnId, victim: ConnId) {
    let Some(c) = engine.drawn.conn(master) else { return };
    let port_ids: Vec<PortId> = c.ports.clone();
    for pid in port_ids {
        if let Some(port) = engine.drawn.port_mut(pid) {
            port.conn.retain(|&c| c != victim);
            if !port.conn.contains(&master) {
                port.conn.push(master);
            }
        }
    }
}
