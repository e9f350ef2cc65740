//! Structural markers embedded by the slicer

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::i64,
    combinator::rest,
    sequence::{pair, preceded},
    IResult,
};

/// Feature label to short code; anything else maps to `""`
const TYPE_CODES: &[(&str, &str)] = &[
    ("SKIN", "sn"),
    ("SKIRT", "st"),
    ("WALL-INNER", "wi"),
    ("WALL-OUTER", "wo"),
    ("FILL", "fi"),
];

/// Short code of a feature label
pub fn type_code(label: &str) -> &'static str {
    TYPE_CODES
        .iter()
        .find(|(l, _)| *l == label)
        .map_or("", |&(_, code)| code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// `LAYER:<n>`
    Layer(i64),
    /// `TYPE:<label>`
    Type { label: String, code: &'static str },
    /// `M84`, end of program
    End,
}

impl Marker {
    /// Find a marker anywhere in the line, layer first, then type, then end
    pub fn classify(line: &str) -> Option<Marker> {
        if let Ok((_, n)) = layer(line) {
            return Some(Marker::Layer(n));
        }
        if let Ok((_, label)) = feature(line) {
            let label = label.trim();
            return Some(Marker::Type {
                label: String::from(label),
                code: type_code(label),
            });
        }
        if line.contains("M84") {
            return Some(Marker::End);
        }
        None
    }
}

fn layer(line: &str) -> IResult<&str, i64> {
    preceded(pair(take_until("LAYER:"), tag("LAYER:")), i64)(line)
}

fn feature(line: &str) -> IResult<&str, &str> {
    preceded(pair(take_until("TYPE:"), tag("TYPE:")), rest)(line)
}
