//! Mock reader, tag and feedback implementations for testing and
//! development without physical hardware.

mod feedback;
mod reader;
mod tag;

pub use feedback::{MockFeedback, Signal};
pub use reader::{MockReader, MockReaderHandle};
pub use tag::{MockTag, MockTagProbe};
