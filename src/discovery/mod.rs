mod file_finder;

pub use file_finder::{InputFile, InputFinder, InputKind, InputStats};
