//! G-Code words of a linear move

use super::errors::Diagnostic;
use std::fmt;

/// All words recognized on a `G0`/`G1` line
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    /// X coordinate
    X(f64),
    /// Y coordinate
    Y(f64),
    /// Z coordinate
    Z(f64),
    /// E cumulative extrusion
    E(f64),
    /// F feed rate
    F(f64),
    /// Trailing `;` comment
    Comment(String),
    /// Known tag whose value is not a number
    Malformed(char, String),
    /// Tag this tool does not understand
    Unknown(char, String),
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Word::*;
        match self {
            X(x) => write!(f, "X{x}"),
            Y(x) => write!(f, "Y{x}"),
            Z(x) => write!(f, "Z{x}"),
            E(x) => write!(f, "E{x}"),
            F(x) => write!(f, "F{x}"),
            Comment(c) => write!(f, ";{c}"),
            Malformed(t, s) | Unknown(t, s) => write!(f, "{t}{s}"),
        }
    }
}

/// Words of one line, in order of appearance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Words(pub Vec<Word>);

impl fmt::Display for Words {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sep = "";
        for w in &self.0 {
            write!(f, "{sep}{w}")?;
            sep = " ";
        }
        Ok(())
    }
}

/// Fields given explicitly on one motion line
///
/// Absent fields stay `None` and are resolved from the sticky parser state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
    pub comment: Option<String>,
}

impl Words {
    /// Collect the field set, reporting every word that can't be applied
    pub fn fields(&self) -> (Fields, Vec<Diagnostic>) {
        let mut fields = Fields::default();
        let mut diagnostics = Vec::new();

        for word in &self.0 {
            use Word::*;
            match word {
                X(v) => fields.x = Some(*v),
                Y(v) => fields.y = Some(*v),
                Z(v) => fields.z = Some(*v),
                E(v) => fields.e = Some(*v),
                F(v) => fields.f = Some(*v),
                Comment(c) => fields.comment = Some(c.clone()),
                Malformed(tag, text) => diagnostics.push(Diagnostic::MalformedValue {
                    tag: *tag,
                    text: text.clone(),
                }),
                Unknown(tag, _) => diagnostics.push(Diagnostic::UnknownTag { tag: *tag }),
            }
        }

        (fields, diagnostics)
    }
}
