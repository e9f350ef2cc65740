//! Sticky position tracking

use crate::gcode::{types::Point3, words::Fields};

/// Feed rate recorded for a seed waypoint, marks continuity without a move
pub const SEED_FEED: f64 = -1.0;

/// Last seen value of every field, carried across lines
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParserState {
    pub position: Point3,
    pub extrusion: f64,
    pub feed: f64,
}

/// One point of the motion stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Point3,
    /// Cumulative extrusion
    pub extrusion: f64,
    /// Extrusion per millimeter travelled since the previous waypoint
    pub rate: f64,
    pub feed: f64,
    /// Distance from the previous waypoint
    pub distance: f64,
}

impl Waypoint {
    /// Value for the `e` buffer, raw extrusion or extrusion rate
    pub fn extrusion_value(&self, rate_mode: bool) -> f64 {
        if rate_mode {
            self.rate
        } else {
            self.extrusion
        }
    }
}

impl ParserState {
    /// Apply the fields of one motion line
    pub fn track(&mut self, fields: &Fields) -> Waypoint {
        let old = *self;

        self.position.x.upd(fields.x);
        self.position.y.upd(fields.y);
        self.position.z.upd(fields.z);
        self.extrusion.upd(fields.e);
        self.feed.upd(fields.f);

        let distance = (self.position - old.position).norm();
        let rate = if distance > 0.0 {
            (self.extrusion - old.extrusion) / distance
        } else {
            0.0
        };

        Waypoint {
            position: self.position,
            extrusion: self.extrusion,
            rate,
            feed: self.feed,
            distance,
        }
    }

    /// Continuity point opening a new segment
    pub fn seed(&self) -> Waypoint {
        Waypoint {
            position: self.position,
            extrusion: self.extrusion,
            rate: 0.0,
            feed: SEED_FEED,
            distance: 0.0,
        }
    }
}

trait Update<T> {
    fn upd(&mut self, other: Option<T>);
}

impl<T> Update<T> for T {
    fn upd(&mut self, other: Option<T>) {
        if let Some(v) = other {
            *self = v;
        }
    }
}
