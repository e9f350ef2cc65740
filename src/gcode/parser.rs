//! G-Code line tokenizer

use super::{
    types::number,
    words::{Word, Words},
};
use nom::{
    branch::alt,
    bytes::complete::take_till,
    character::complete::{char, multispace0, satisfy, u8},
    combinator::{all_consuming, map, rest, verify},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Linear move, `G0` or `G1`
    Motion(Words),
    /// Anything else, inert
    Other,
}

impl Line {
    /// Parse program text line
    pub fn parse(line: &str) -> Line {
        match parse_motion(line) {
            Ok((_, words)) => Line::Motion(words),
            Err(_) => Line::Other,
        }
    }
}

fn parse_motion(line: &str) -> IResult<&str, Words> {
    // u8 eats every digit, so G10/G11/G28 fail here
    let command = verify(preceded(char('G'), u8), |n: &u8| *n <= 1);

    all_consuming(preceded(
        pair(multispace0, command),
        map(
            delimited(multispace0, many0(preceded(multispace0, word)), multispace0),
            Words,
        ),
    ))(line)
}

fn word(input: &str) -> IResult<&str, Word> {
    alt((
        map(preceded(char(';'), rest), |c: &str| {
            Word::Comment(String::from(c))
        }),
        map(
            pair(satisfy(|c| !c.is_whitespace() && c != ';'), value_text),
            |(tag, text)| classify(tag, text),
        ),
    ))(input)
}

/// Value runs until blank, comment or the next tag letter
fn value_text(input: &str) -> IResult<&str, &str> {
    take_till(|c: char| c.is_whitespace() || c == ';' || c.is_ascii_uppercase())(input)
}

fn classify(tag: char, text: &str) -> Word {
    let value = all_consuming(number)(text).map(|(_, v)| v);
    match (tag, value) {
        ('X', Ok(v)) => Word::X(v),
        ('Y', Ok(v)) => Word::Y(v),
        ('Z', Ok(v)) => Word::Z(v),
        ('E', Ok(v)) => Word::E(v),
        ('F', Ok(v)) => Word::F(v),
        ('X' | 'Y' | 'Z' | 'E' | 'F', Err(_)) => Word::Malformed(tag, String::from(text)),
        _ => Word::Unknown(tag, String::from(text)),
    }
}
