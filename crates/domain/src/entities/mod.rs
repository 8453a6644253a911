//! Domain entities - Core business objects with identity

mod letter;

pub use letter::{Letter, LetterSize, PhysicalProperty};
