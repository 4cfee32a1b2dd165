pub mod draw;
pub mod lab;
pub mod narrative;
pub mod numeric;
pub mod params;
pub mod scheduler;
pub mod simulation;
