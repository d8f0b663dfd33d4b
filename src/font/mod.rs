//! Font loading
//!
//! TTF/OTF face loading through FreeType

pub mod freetype;

pub use self::freetype::{FontLoader, HintingMode};
