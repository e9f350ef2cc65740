mod script;
mod traits;

pub use self::script::Script;
pub use self::traits::Render;
