pub mod errors;
mod markers;
mod parser;
pub mod types;
pub mod words;

pub use self::errors::{ConvertError, Diagnostic, LineDiagnostic};
pub use self::markers::Marker;
pub use self::parser::Line;
