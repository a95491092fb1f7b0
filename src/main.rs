use schemacanvas::engine::{Canvas, Engine};
use schemacanvas::error::EngineError;
use schemacanvas::geometry::Point;
use schemacanvas::model::ShapeKind;
use schemacanvas::ops;
use schemacanvas::portoverlap;

/// A small fixed demo: two objects with one port each, joined by a
/// connector. Prints a one-line summary of the resulting model to stdout;
/// any engine error goes to stderr, mirroring the teacher's own practice
/// of keeping `main` as the crate's sole I/O boundary.
fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let mut engine = Engine::new(Canvas::default());

    let left = engine.insert_object(ShapeKind::Rect, Point::new(0, 0), Point::new(20, 20));
    let right = engine.insert_object(ShapeKind::Rect, Point::new(100, 0), Point::new(120, 20));

    let left_port = engine.insert_port_raw(left, 20, 10);
    let right_port = engine.insert_port_raw(right, 100, 10);

    let conn = ops::draw_connector(&mut engine, Point::new(20, 10), Point::new(100, 10), None);
    portoverlap::connect_overlap_ports(&mut engine, left_port);
    portoverlap::connect_overlap_ports(&mut engine, right_port);

    let conn = engine
        .drawn
        .conn(conn)
        .ok_or_else(|| EngineError::NotFound(format!("connector {conn} vanished during assimilation")))?;

    println!(
        "objects={} ports={} connectors={} segments on demo connector={}",
        engine.drawn.objects().count(),
        engine.drawn.ports().count(),
        engine.drawn.conn_ids().count(),
        conn.segments.len(),
    );

    Ok(())
}
