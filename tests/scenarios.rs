//! End-to-end scenarios from spec.md §8, exercised through the public
//! `ops`/`portoverlap` entry points rather than by poking the model
//! directly — the same path an interactive edit would take.

use schemacanvas::engine::{Canvas, Engine};
use schemacanvas::geometry::Point;
use schemacanvas::model::ShapeKind;
use schemacanvas::ops;
use schemacanvas::portoverlap;

/// Scenario 1: two objects, two ports, one connector drawn as a multi-bend
/// (8-segment) path between them. After assimilation: exactly one
/// connector, both ports linked to it, no junctions (every bend touches
/// exactly two segments), and no mid-port crossings.
#[test]
fn two_objects_joined_by_an_eight_segment_bend_path_assimilate_to_one_connector() {
    let mut engine = Engine::new(Canvas::default());

    let left = engine.insert_object(ShapeKind::Rect, Point::new(200, 40), Point::new(300, 200));
    let right = engine.insert_object(ShapeKind::Rect, Point::new(700, 300), Point::new(800, 450));
    let left_port = engine.insert_port_raw(left, 300, 130);
    let right_port = engine.insert_port_raw(right, 700, 380);

    // An 8-segment staircase from (300,130) to (700,380): alternating
    // horizontal/vertical spans, no two collinear, so nothing coalesces
    // and every interior bend is touched by exactly two segments.
    let spans: Vec<(Point, Point)> = [
        (300, 130, 400, 130),
        (400, 130, 400, 180),
        (400, 180, 500, 180),
        (500, 180, 500, 230),
        (500, 230, 600, 230),
        (600, 230, 600, 280),
        (600, 280, 700, 280),
        (700, 280, 700, 380),
    ]
    .into_iter()
    .map(|(x1, y1, x2, y2)| (Point::new(x1, y1), Point::new(x2, y2)))
    .collect();

    let conn = ops::draw_connector_segments(&mut engine, &spans, None).unwrap();
    portoverlap::connect_overlap_ports(&mut engine, left_port);
    portoverlap::connect_overlap_ports(&mut engine, right_port);

    // Port reconciliation may have re-split/re-fused the connector the
    // path ended up living on; read it back through the ports.
    let left_conns = engine.drawn.port(left_port).unwrap().conn.clone();
    let right_conns = engine.drawn.port(right_port).unwrap().conn.clone();
    assert_eq!(left_conns.len(), 1);
    assert_eq!(right_conns.len(), 1);
    assert_eq!(left_conns[0], right_conns[0]);

    let c = engine.drawn.conn(left_conns[0]).unwrap();
    assert!(c.ports.contains(&left_port));
    assert!(c.ports.contains(&right_port));
    assert!(c.junctions.is_empty());
    assert_eq!(c.segments.len(), 8);

    // Invariant 1: no segment of any other connector crosses a port that
    // isn't its endpoint — trivially true here since this is the only
    // connector, but check the shape explicitly: every port the connector
    // claims sits at one of its segment endpoints.
    for &pid in &c.ports {
        let p = engine.drawn.port(pid).unwrap().point();
        assert!(c.segments.iter().any(|s| s.has_endpoint(p)));
    }
    assert_eq!(conn, left_conns[0]);
}

/// Scenario 2: a floating connector with no port nearby must stay
/// unattached — drawing it must not spuriously fuse it with a port that
/// merely shares a bounding region, only an exact coordinate.
#[test]
fn floating_connector_with_no_coordinate_overlap_stays_unattached() {
    let mut engine = Engine::new(Canvas::default());

    let obj = engine.insert_object(ShapeKind::Rect, Point::new(200, 300), Point::new(300, 450));
    let port = engine.insert_port_raw(obj, 300, 380);

    let spans: Vec<(Point, Point)> = [
        (400, 130, 500, 130),
        (500, 130, 500, 220),
        (500, 220, 600, 220),
    ]
    .into_iter()
    .map(|(x1, y1, x2, y2)| (Point::new(x1, y1), Point::new(x2, y2)))
    .collect();

    let conn = ops::draw_connector_segments(&mut engine, &spans, None).unwrap();
    portoverlap::connect_overlap_ports(&mut engine, port);

    let c = engine.drawn.conn(conn).unwrap();
    assert!(c.ports.is_empty());
    assert!(engine.drawn.port(port).unwrap().conn.is_empty());
    assert_eq!(c.segments.len(), 3);
    assert!(c.junctions.is_empty());
}

/// `draw_connector_segments` rejects a call whose segments weren't
/// pre-split: an endpoint landing strictly inside another segment of the
/// same call is an invariant violation the caller must fix, not something
/// the engine silently repairs (§4.7).
#[test]
fn draw_connector_segments_rejects_unsplit_mid_touch() {
    // A grid fine enough (1,1) that (5,0) isn't rounded away — otherwise
    // the default (10,10) grid would snap it onto the segment's own
    // endpoint and this scenario couldn't be reproduced.
    let canvas = Canvas {
        grid_x: 1,
        grid_y: 1,
        snap_grid: true,
    };
    let mut engine = Engine::new(canvas);
    let spans = [
        (Point::new(0, 0), Point::new(10, 0)),
        (Point::new(5, 0), Point::new(5, 10)),
    ];

    let result = ops::draw_connector_segments(&mut engine, &spans, None);
    assert!(result.is_err());
}
