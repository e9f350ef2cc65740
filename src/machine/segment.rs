//! Segment accumulation state machine

use super::tracker::{ParserState, Waypoint};
use crate::gcode::Marker;
use strum::{Display, EnumIter};

/// Why a flush was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Reason {
    Layer,
    Type,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Motion lines append to the open segment
    Accumulating,
    /// A marker asked for a flush, not executed yet
    FlushPending(Reason),
    /// Segment just closed and reseeded, nothing appended since
    Flushed,
}

/// One buffer per recorded quantity, named by its tag letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Column {
    X,
    Y,
    Z,
    /// Distance from previous point
    D,
    /// Cumulative extrusion or extrusion rate
    E,
    /// Feed rate
    F,
}

/// Six parallel buffers, one value per point
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Buffers {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    d: Vec<f64>,
    e: Vec<f64>,
    f: Vec<f64>,
}

impl Buffers {
    fn push(&mut self, wp: &Waypoint, rate_mode: bool) {
        self.x.push(wp.position.x);
        self.y.push(wp.position.y);
        self.z.push(wp.position.z);
        self.d.push(wp.distance);
        self.e.push(wp.extrusion_value(rate_mode));
        self.f.push(wp.feed);
    }

    pub fn column(&self, c: Column) -> &[f64] {
        use Column::*;
        match c {
            X => &self.x,
            Y => &self.y,
            Z => &self.z,
            D => &self.d,
            E => &self.e,
            F => &self.f,
        }
    }

    /// Number of recorded points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Completed segment ready for emission
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// `<layer><type code>`, e.g. `3fi`
    pub label: String,
    pub buffers: Buffers,
}

/// Outcome of a flush attempt
#[derive(Debug, PartialEq)]
pub enum Flush {
    /// No flush pending
    Idle,
    /// Guard refused the flush; on `Final` the open segment is lost
    Suppressed { reason: Reason, moves: usize },
    /// Flushed a segment holding no motion besides its seed
    Empty,
    Emitted(Segment),
}

#[derive(Debug)]
pub struct Accumulator {
    rate_mode: bool,
    state: State,

    layer: i64,
    type_code: &'static str,
    prev_layer: i64,
    prev_type: &'static str,

    buffers: Buffers,
    moves: usize,
    finished: bool,
}

impl Accumulator {
    pub fn new(rate_mode: bool) -> Self {
        Self {
            rate_mode,
            state: State::Accumulating,
            layer: 0,
            type_code: "",
            prev_layer: 0,
            prev_type: "",
            buffers: Buffers::default(),
            moves: 0,
            finished: false,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> State {
        self.state
    }

    /// True once the end-of-program flush was attempted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append a motion waypoint to the open segment
    pub fn push(&mut self, wp: &Waypoint) {
        self.buffers.push(wp, self.rate_mode);
        self.moves += 1;
        self.state = State::Accumulating;
    }

    /// Record a marker and request a flush
    pub fn mark(&mut self, marker: &Marker) {
        self.prev_layer = self.layer;
        self.prev_type = self.type_code;

        let reason = match marker {
            Marker::Layer(n) => {
                self.layer = *n;
                Reason::Layer
            }
            Marker::Type { code, .. } => {
                self.type_code = *code;
                Reason::Type
            }
            Marker::End => Reason::Final,
        };
        self.state = State::FlushPending(reason);
    }

    /// Only labeled segments, or anything while on layer 0, get flushed
    pub fn flush_allowed(&self) -> bool {
        !self.prev_type.is_empty() || self.layer == 0
    }

    /// Execute a pending flush, reseeding from the current parser state
    pub fn flush(&mut self, state: &ParserState) -> Flush {
        let State::FlushPending(reason) = self.state else {
            return Flush::Idle;
        };
        if reason == Reason::Final {
            self.finished = true;
        }

        if !self.flush_allowed() {
            self.state = State::Accumulating;
            return Flush::Suppressed {
                reason,
                moves: self.moves,
            };
        }

        let label = format!("{}{}", self.prev_layer, self.prev_type);
        let buffers = std::mem::take(&mut self.buffers);
        let moves = std::mem::replace(&mut self.moves, 0);

        self.buffers.push(&state.seed(), self.rate_mode);
        self.state = State::Flushed;

        if moves == 0 {
            Flush::Empty
        } else {
            Flush::Emitted(Segment { label, buffers })
        }
    }
}
