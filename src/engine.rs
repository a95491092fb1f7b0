//! The `Engine`: owns the canvas model, the routing matrix, the port
//! spatial index, the hook registry and the interactive-operation stack.
//! Every module in this crate that mutates the model takes `&mut Engine`.

use crate::geometry::{snap_x, snap_y, Point};
use crate::hooks::HookRegistry;
use crate::model::{ConnId, Drawn, PortId, SegmentId, ShapeKind};
use crate::ops::OpStack;
use crate::matrix::RoutingMatrix;
use derive_builder::Builder;
use std::collections::{HashMap, HashSet};

/// Per-canvas grid contract (§6). `(grid_x, grid_y)` and `snap_grid`;
/// effective grid is `(1,1)` when `snap_grid` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct Canvas {
    pub grid_x: i32,
    pub grid_y: i32,
    pub snap_grid: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            grid_x: 10,
            grid_y: 10,
            snap_grid: true,
        }
    }
}

impl Canvas {
    pub fn effective_grid(&self) -> (i32, i32) {
        if self.snap_grid {
            (self.grid_x, self.grid_y)
        } else {
            (1, 1)
        }
    }

    pub fn snap(&self, p: Point) -> Point {
        let (gx, gy) = self.effective_grid();
        Point::new(snap_x(p.x, gx), snap_y(p.y, gy))
    }
}

pub struct Engine {
    pub drawn: Drawn,
    pub matrix: RoutingMatrix,
    pub port_index: HashMap<(i32, i32), Vec<PortId>>,
    pub hooks: HookRegistry,
    pub ops: OpStack,
    pub canvas: Canvas,
}

impl Engine {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            drawn: Drawn::new(),
            matrix: RoutingMatrix::new(),
            port_index: HashMap::new(),
            hooks: HookRegistry::new(),
            ops: OpStack::new(),
            canvas,
        }
    }

    // --- Raw model construction (no reconciliation: callers that need
    // invariants restored go through `ops`).

    pub fn insert_object(&mut self, shape: ShapeKind, start: Point, end: Point) -> crate::model::ObjectId {
        let start = self.canvas.snap(start);
        let end = self.canvas.snap(end);
        self.drawn.insert_object(shape, start, end)
    }

    pub fn insert_port_raw(&mut self, obj: crate::model::ObjectId, x: i32, y: i32) -> PortId {
        let p = self.canvas.snap(Point::new(x, y));
        let id = self.drawn.insert_port(obj, p.x, p.y);
        self.port_index.entry((p.x, p.y)).or_default().push(id);
        id
    }

    // --- Spatial queries, backed by the routing matrix and the port index
    // (Design Notes §9).

    pub fn ports_at(&self, p: Point) -> Vec<PortId> {
        self.port_index.get(&(p.x, p.y)).cloned().unwrap_or_default()
    }

    /// Every connector touching `(x,y)`: connectors with a segment endpoint
    /// there (via the routing matrix) unioned with the connectors any port
    /// at `(x,y)` already links to — the latter is how zero-segment
    /// port-port connectors (§4.1), which the matrix never indexes,
    /// participate in shorting/merging.
    pub fn connectors_at(&self, p: Point) -> HashSet<ConnId> {
        let mut set = self.matrix.connectors_at(p);
        for port_id in self.ports_at(p) {
            if let Some(port) = self.drawn.port(port_id) {
                set.extend(port.conn.iter().copied());
            }
        }
        set
    }

    /// Bracket a geometric mutation: unregister `seg` from the matrix using
    /// its last-known coordinates, mutate it via `f`, then re-register
    /// under its new coordinates (§4.1's "bracketing" contract).
    pub fn reindex_segment(
        &mut self,
        conn: ConnId,
        seg_idx: usize,
        f: impl FnOnce(&mut crate::model::Segment),
    ) {
        let Some(c) = self.drawn.conn_mut(conn) else { return };
        let Some(seg) = c.segments.get_mut(seg_idx) else { return };
        let id = seg.id;
        self.matrix.remove_segment(id);

        let Some(c) = self.drawn.conn_mut(conn) else { return };
        let Some(seg) = c.segments.get_mut(seg_idx) else { return };
        f(seg);
        let (p1, p2) = (seg.p1, seg.p2);
        self.matrix.add_segment(id, conn, p1.x, p1.y, p2.x, p2.y);
    }

    /// Register every segment currently on `conn` into the routing matrix.
    /// Used after building a connector's segment list from scratch (a
    /// fresh draw, or a split/merge result) rather than mutating in place.
    pub fn register_all_segments(&mut self, conn: ConnId) {
        let Some(c) = self.drawn.conn(conn) else { return };
        let to_add: Vec<_> = c.segments.iter().map(|s| (s.id, s.p1, s.p2)).collect();
        for (id, p1, p2) in to_add {
            self.matrix.add_segment(id, conn, p1.x, p1.y, p2.x, p2.y);
        }
    }

    pub fn unregister_all_segments(&mut self, conn: ConnId) {
        let Some(c) = self.drawn.conn(conn) else { return };
        let ids: Vec<_> = c.segments.iter().map(|s| s.id).collect();
        for id in ids {
            self.matrix.remove_segment(id);
        }
    }

    pub fn new_segment(&mut self, p1: Point, p2: Point) -> crate::model::Segment {
        let id = self.drawn.next_segment_id();
        crate::model::Segment {
            id,
            p1,
            p2,
            vattr: None,
        }
    }
}
