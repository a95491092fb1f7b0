//! The routing matrix (§4.1): a spatial occupancy index over segments,
//! consulted by the router and used to back the engine's `connectors_at`/
//! `segments_at` spatial queries (Design Notes §9 — "spatial queries should
//! be backed by the routing matrix, not by linear scan").
//!
//! Grounded on `grid.rs`'s cell-indexed node/edge storage, adapted from a
//! dense bounded grid (`Vec<Option<_>>`) to a sparse `HashMap` since the
//! canvas, unlike the teacher's `(m,n)` grid, has no fixed extent.

use crate::geometry::{point_on_segment, Point};
use crate::model::{ConnId, SegmentId};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Most grid cells a routed wire ever passes through carry one segment, a
/// junction a handful more — inline up to 4 before spilling to the heap.
type CellOccupants = SmallVec<[SegmentId; 4]>;

#[derive(Debug, Default)]
pub struct RoutingMatrix {
    cells: HashMap<(i32, i32), CellOccupants>,
    spans: HashMap<SegmentId, Vec<(i32, i32)>>,
    coords: HashMap<SegmentId, (Point, Point)>,
    owner: HashMap<SegmentId, ConnId>,
}

impl RoutingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `seg`'s occupancy along every grid cell between `(x1,y1)`
    /// and `(x2,y2)`. Idempotent in practice because the engine always
    /// pairs this with a prior `remove_segment`, but calling it twice for
    /// the same id without an intervening remove simply grows the cell
    /// lists (callers never do this).
    pub fn add_segment(&mut self, id: SegmentId, owner: ConnId, x1: i32, y1: i32, x2: i32, y2: i32) {
        let cells = walk_cells(x1, y1, x2, y2);

        for &cell in &cells {
            self.cells.entry(cell).or_default().push(id);
        }

        self.spans.insert(id, cells);
        self.coords.insert(id, (Point::new(x1, y1), Point::new(x2, y2)));
        self.owner.insert(id, owner);
    }

    /// No-op if `seg` is absent, per §4.1's contract.
    pub fn remove_segment(&mut self, id: SegmentId) {
        let Some(cells) = self.spans.remove(&id) else {
            return;
        };

        for cell in cells {
            if let Some(list) = self.cells.get_mut(&cell) {
                list.retain(|s| *s != id);
                if list.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }

        self.coords.remove(&id);
        self.owner.remove(&id);
    }

    /// Segments whose registered geometry passes exactly through `(x,y)`
    /// (zero tolerance), narrowed first by the cell index.
    pub fn segments_at(&self, p: Point) -> Vec<SegmentId> {
        let Some(candidates) = self.cells.get(&(p.x, p.y)) else {
            return vec![];
        };

        let mut seen = std::collections::HashSet::new();
        candidates
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| {
                let Some((a, b)) = self.coords.get(id) else {
                    return false;
                };
                point_on_segment(a.x, a.y, b.x, b.y, p.x, p.y)
            })
            .collect()
    }

    pub fn connectors_at(&self, p: Point) -> std::collections::HashSet<ConnId> {
        self.segments_at(p)
            .into_iter()
            .filter_map(|id| self.owner.get(&id).copied())
            .collect()
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.spans.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Every integer cell the segment's bounding box/line crosses. Axis-aligned
/// segments (the router's actual output) walk a straight line; arbitrary
/// slopes (permitted by the data model, §3) fall back to a Bresenham-style
/// walk so no cell along the segment is skipped.
fn walk_cells(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    if x1 == x2 && y1 == y2 {
        return vec![(x1, y1)];
    }

    if x1 == x2 {
        let (lo, hi) = (y1.min(y2), y1.max(y2));
        return (lo..=hi).map(|y| (x1, y)).collect();
    }

    if y1 == y2 {
        let (lo, hi) = (x1.min(x2), x1.max(x2));
        return (lo..=hi).map(|x| (x, y1)).collect();
    }

    bresenham(x1, y1, x2, y2)
}

fn bresenham(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    let mut cells = vec![];
    let (dx, dy) = ((x2 - x1).abs(), -(y2 - y1).abs());
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x1, y1);

    loop {
        cells.push((x, y));
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    cells
}
