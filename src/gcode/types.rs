//! Types for G-Code interpreter

use derive_more::{Add, Sub};
use std::fmt;

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map_res, opt, recognize},
    sequence::{preceded, tuple},
    IResult,
};

/// Parse a plain decimal number from `nom`
///
/// No exponent: `E` is a field tag in motion lines.
pub fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(preceded(char('.'), digit1)),
                recognize(tuple((digit1, opt(preceded(char('.'), digit0))))),
            )),
        ))),
        str::parse::<f64>,
    )(input)
}

/// Position in machine space, millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Add, Sub)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[allow(dead_code)]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length of the vector
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Fixed-point rendering with three decimals
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub f64);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // no "-0.000" for values that round to zero
        let v = if (self.0 * 1000.0).round() == 0.0 {
            0.0
        } else {
            self.0
        };
        write!(f, "{v:.3}")
    }
}
