pub mod classify;
pub mod diff;
pub mod message;

pub use classify::{classify, extract_fenced, scan_code_blocks, ClassifiedContent, CodeBlock, ContentKind};
pub use diff::{Diff, DiffLine, DiffLineKind};
pub use message::{Message, Role};
