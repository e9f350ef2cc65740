mod segment;
mod tracker;

pub use self::segment::{Accumulator, Column, Flush, Reason, Segment};
pub use self::tracker::ParserState;
