//! Octave/MATLAB plotting script render

use super::traits::{Column, Render, Segment};
use crate::gcode::types::Fixed;
use std::io::{self, Write};
use strum::IntoEnumIterator;

/// Writes segments as numeric arrays plus one `plot3` call each
#[derive(Debug)]
pub struct Script<W: Write> {
    out: W,
}

impl<W: Write> Script<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Render for Script<W> {
    fn header(&mut self, source: &str, settings: &str) -> io::Result<()> {
        writeln!(self.out, "% gcodeplot {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out, "% source: {source}")?;
        writeln!(self.out, "% {settings}")?;
        writeln!(self.out, "hold on;")
    }

    fn segment(&mut self, segment: &Segment) -> io::Result<()> {
        let label = &segment.label;
        for col in Column::iter() {
            write!(self.out, "{col}{label}=[")?;
            let mut sep = "";
            for v in segment.buffers.column(col) {
                write!(self.out, "{sep}{}", Fixed(*v))?;
                sep = " ";
            }
            writeln!(self.out, "];")?;
        }
        writeln!(
            self.out,
            "plot3(x{label},y{label},z{label},'linewidth',1);"
        )
    }

    fn comment(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "% {text}")
    }

    fn finalize(&mut self) -> io::Result<()> {
        writeln!(self.out, "hold off;")?;
        self.out.flush()
    }
}
