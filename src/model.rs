//! The canvas data model (§3): objects, ports, connectors, segments and the
//! global z-order, held in an arena (`Drawn`) keyed by stable handles.
//!
//! Handles are `Copy` newtypes over `usize`, the same shape as `mir.rs`'s
//! `NodeId` in the teacher crate, and slots live in `Vec<Option<T>>` slabs —
//! the same tombstone-on-removal approach `grid.rs`'s `GridGraph` uses for
//! its node/edge storage. Back-references (port → connectors, connector →
//! ports) always store a handle, never a direct reference, per the Design
//! Notes' "model with stable identifiers plus an arena" guidance.

use crate::color::WebColor;
use crate::geometry::{Point, SegGeom};
use derive_builder::Builder;
use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "{}", _0)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "P{}", _0)]
pub struct PortId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "C{}", _0)]
pub struct ConnId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "G{}", _0)]
pub struct GroupId(pub usize);

/// A segment's engine-private identity, used only to key the routing
/// matrix; it has no counterpart in spec.md's data model (which describes
/// segments purely by their endpoints) but is required to give
/// `RoutingMatrix::remove_segment` something stable to look up once a
/// connector's segment vector has been reshuffled by a repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "S{}", _0)]
pub struct SegmentId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Line,
    Ellipse,
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct VisAttr {
    pub stroke: Option<WebColor>,
    pub stroke_width: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub shape: ShapeKind,
    pub start: Point,
    pub end: Point,
    pub group: Option<GroupId>,
    pub ports: Vec<PortId>,
    pub order: usize,
}

impl Object {
    pub fn rect(&self) -> crate::geometry::Rect {
        crate::geometry::Rect::new(self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    pub x: i32,
    pub y: i32,
    pub obj: ObjectId,
    pub conn: Vec<ConnId>,
}

impl Port {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub p1: Point,
    pub p2: Point,
    pub vattr: Option<VisAttr>,
}

impl Segment {
    pub fn geom(&self) -> SegGeom {
        SegGeom::new(self.p1, self.p2)
    }

    pub fn has_endpoint(&self, p: Point) -> bool {
        self.p1 == p || self.p2 == p
    }

    pub fn other_end(&self, p: Point) -> Option<Point> {
        self.geom().other_end(p)
    }

    /// Byte-equal in either orientation — the test `shorting` uses to drop
    /// duplicate segments when fusing connectors (§4.3 step 4).
    pub fn same_span(&self, other: &Segment) -> bool {
        (self.p1 == other.p1 && self.p2 == other.p2) || (self.p1 == other.p2 && self.p2 == other.p1)
    }
}

#[derive(Debug, Clone)]
pub struct Connector {
    pub id: ConnId,
    pub order: usize,
    pub segments: Vec<Segment>,
    pub ports: Vec<PortId>,
    pub junctions: Vec<Point>,
    pub vattr: Option<VisAttr>,
}

impl Connector {
    /// `true` exactly for the §4.1 "zero-segment connector" special case:
    /// two ports coincide and the connector records that fact without any
    /// routed geometry.
    pub fn is_zero_segment(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn endpoint_coords(&self) -> Vec<Point> {
        let mut v = Vec::with_capacity(self.segments.len() * 2);
        for s in &self.segments {
            v.push(s.p1);
            v.push(s.p2);
        }
        v
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub members: Vec<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderItem {
    Object(ObjectId),
    Connector(ConnId),
}

/// The arena root. Owns every object, port and connector; nothing else in
/// the crate holds a `Connector`/`Port`/`Object` by value.
#[derive(Debug, Default)]
pub struct Drawn {
    objects: Vec<Option<Object>>,
    ports: Vec<Option<Port>>,
    conns: Vec<Option<Connector>>,
    groups: Vec<Option<Group>>,
    pub order: Vec<OrderItem>,
    next_segment_id: u64,
}

impl Drawn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_segment_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        id
    }

    // --- Objects

    pub fn insert_object(&mut self, shape: ShapeKind, start: Point, end: Point) -> ObjectId {
        let id = ObjectId(self.objects.len());
        let order = self.order.len();
        self.objects.push(Some(Object {
            id,
            shape,
            start,
            end,
            group: None,
            ports: vec![],
            order,
        }));
        self.order.push(OrderItem::Object(id));
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0).and_then(|o| o.as_ref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0).and_then(|o| o.as_mut())
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter_map(|o| o.as_ref())
    }

    // --- Groups ("glue": grouping has no geometric semantics here)

    pub fn group_objects(&mut self, ids: &[ObjectId]) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Some(Group {
            id,
            members: ids.to_vec(),
        }));
        for oid in ids {
            if let Some(o) = self.object_mut(*oid) {
                o.group = Some(id);
            }
        }
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0).and_then(|g| g.as_ref())
    }

    // --- Ports

    pub fn insert_port(&mut self, obj: ObjectId, x: i32, y: i32) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(Some(Port {
            id,
            x,
            y,
            obj,
            conn: vec![],
        }));
        if let Some(o) = self.object_mut(obj) {
            o.ports.push(id);
        }
        id
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.0).and_then(|p| p.as_ref())
    }

    pub fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(id.0).and_then(|p| p.as_mut())
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter_map(|p| p.as_ref())
    }

    // --- Connectors

    pub fn insert_connector(&mut self, segments: Vec<Segment>, ports: Vec<PortId>) -> ConnId {
        let id = ConnId(self.conns.len());
        let order = self.order.len();
        self.conns.push(Some(Connector {
            id,
            order,
            segments,
            ports,
            junctions: vec![],
            vattr: None,
        }));
        self.order.push(OrderItem::Connector(id));
        id
    }

    /// Insert a connector without adding it to the z-order — used by
    /// `split` which leaves order/`drawn.conn` placement to its caller.
    pub fn insert_connector_unordered(
        &mut self,
        segments: Vec<Segment>,
        ports: Vec<PortId>,
    ) -> ConnId {
        let id = ConnId(self.conns.len());
        self.conns.push(Some(Connector {
            id,
            order: usize::MAX,
            segments,
            ports,
            junctions: vec![],
            vattr: None,
        }));
        id
    }

    pub fn conn(&self, id: ConnId) -> Option<&Connector> {
        self.conns.get(id.0).and_then(|c| c.as_ref())
    }

    pub fn conn_mut(&mut self, id: ConnId) -> Option<&mut Connector> {
        self.conns.get_mut(id.0).and_then(|c| c.as_mut())
    }

    pub fn conn_ids(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.conns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|_| ConnId(i)))
    }

    /// Tombstone a connector's slot. Does not touch `order` — callers that
    /// remove a connector from the model are responsible for also removing
    /// its `OrderItem` (see `ops::remove_order_item`).
    pub fn remove_connector(&mut self, id: ConnId) -> Option<Connector> {
        self.conns.get_mut(id.0).and_then(|c| c.take())
    }

    // --- Order

    /// Re-stamp every item's `order` field to match its index in the order
    /// vector (invariant 7).
    pub fn fix_order(&mut self) {
        for (i, item) in self.order.clone().into_iter().enumerate() {
            match item {
                OrderItem::Object(oid) => {
                    if let Some(o) = self.object_mut(oid) {
                        o.order = i;
                    }
                }
                OrderItem::Connector(cid) => {
                    if let Some(c) = self.conn_mut(cid) {
                        c.order = i;
                    }
                }
            }
        }
    }
}
