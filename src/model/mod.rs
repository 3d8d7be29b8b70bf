//! Data model shared by the pipeline stages.
//!
//! Raw lines come out of the parser, normalized [`Line`]s feed level
//! assignment, and [`Heading`]s are assembled into an [`Outline`]. Every
//! value is derived per document and never mutated after construction.

mod line;
mod outline;

pub use line::{Line, RawLine, RawSpan, SizeKey};
pub use outline::{Heading, HeadingLevel, JsonFormat, Outline, OutlineEntry};
