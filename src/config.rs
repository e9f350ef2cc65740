//! Conversion settings and `key=value` overrides

use std::{fmt, str::FromStr};
use strum::{Display, EnumString};
use thiserror::Error;

/// Trailer of `--help`
pub const OVERRIDE_HELP: &str = "\
OVERRIDES:
    Arguments of the form key=value override the flags above, last one wins.
    debug=on|off          annotate the script with every source line
    lines=on|off          number annotated lines (alias: linenumbers)
    rate=on|off           record extrusion rate instead of extrusion (alias: extrusionrate)
    Values: on/off, 1/0, true/false, yes/no";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("override '{0}' is not of the form key=value")]
    NotKeyValue(String),
    #[error("unknown override key '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for '{key}', expected on or off")]
    BadValue { key: Key, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Key {
    #[strum(to_string = "debug")]
    Debug,
    #[strum(to_string = "lines", serialize = "linenumbers")]
    Lines,
    #[strum(to_string = "rate", serialize = "extrusionrate")]
    Rate,
}

/// Read-only settings of one conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertConfig {
    /// Emit every source line as a comment
    pub debug: bool,
    /// Prefix annotated lines with their 1-based number
    pub line_numbers: bool,
    /// Record extrusion per millimeter instead of cumulative extrusion
    pub extrusion_rate: bool,
}

impl ConvertConfig {
    /// Apply one `key=value` argument
    pub fn apply_override(&mut self, arg: &str) -> Result<(), ConfigError> {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ConfigError::NotKeyValue(arg.into()))?;
        let key = Key::from_str(key.trim()).map_err(|_| ConfigError::UnknownKey(key.into()))?;
        let on = switch(value.trim()).ok_or_else(|| ConfigError::BadValue {
            key,
            value: value.into(),
        })?;

        match key {
            Key::Debug => self.debug = on,
            Key::Lines => self.line_numbers = on,
            Key::Rate => self.extrusion_rate = on,
        }
        Ok(())
    }
}

impl fmt::Display for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = |on: bool| if on { "on" } else { "off" };
        write!(
            f,
            "{}={} {}={} {}={}",
            Key::Debug,
            s(self.debug),
            Key::Lines,
            s(self.line_numbers),
            Key::Rate,
            s(self.extrusion_rate)
        )
    }
}

/// Override arguments are told apart from file names by the `=`
pub fn is_override(arg: &str) -> bool {
    arg.contains('=')
}

fn switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
