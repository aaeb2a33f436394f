//! Vision Layer
//!
//! Text recognition results and the scan-box geometry used to filter them.
//! The OCR engine itself is an external collaborator behind [`TextRecognizer`];
//! a replay implementation lets the pipeline run from a recorded script.

pub mod geometry;
pub mod ocr;
pub mod replay;

pub use geometry::{FrameGeometry, GeometryMatcher, Rect};
pub use ocr::{TextBlock, TextRecognizer};
pub use replay::{load_replay, ReplayRecognizer, ReplayScript};
