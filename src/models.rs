pub mod block;
pub mod page;

pub use block::{BlockStyle, ContentBlock, Segment, SegmentKind};
pub use page::{Page, PageId};
