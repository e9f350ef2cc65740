//! Rendering traits

pub use crate::machine::{Column, Segment};
use std::io;

/// Destination of converted segments
pub trait Render {
    /// Banner naming the source and active settings
    fn header(&mut self, source: &str, settings: &str) -> io::Result<()>;

    /// Array declarations and plot statement for one segment
    fn segment(&mut self, segment: &Segment) -> io::Result<()>;

    /// Free-text comment line
    fn comment(&mut self, text: &str) -> io::Result<()>;

    fn finalize(&mut self) -> io::Result<()>;
}
