pub mod color;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hooks;
pub mod matrix;
pub mod model;
pub mod ops;
pub mod portoverlap;
pub mod repair;
pub mod shorting;
pub mod split;
