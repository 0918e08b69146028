// BDD test support library for Carewatch
//
// Scenarios drive the classifier and the session segmenter on a virtual
// clock, so watchdog timing is expressed in plain milliseconds.

pub mod poses;
pub mod steps;
pub mod world;

pub use world::SessionWorld;
