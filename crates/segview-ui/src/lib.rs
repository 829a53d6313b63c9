//! Coordinators that keep the outer surface, the page surface and the index
//! bar consistent.
//!
//! - `nested` - vertical arbitration between the outer surface and inner lists.
//! - `page_window` - which pages are materialized for the current offset.
//! - `segmented` - index bar items, indicator, and drag/tap selection.
//! - `indicator`, `item`, `layout` - pure geometry used by the above.
//!
//! Coordinators hold `Weak` handles to host surfaces and detach their
//! subscriptions when dropped.

pub mod indicator;
pub mod item;
pub mod layout;
pub mod nested;
pub mod page_window;
pub mod segmented;
pub mod sink;
pub mod tests;

pub use item::{GraphemeMeasure, ItemContent, ItemState, TextMeasure};
pub use layout::{LayoutPlan, plan};
pub use nested::{NestedHandlers, NestedScrollCoordinator};
pub use page_window::{PageSet, PageWindow, materialized_set, visible_range};
pub use segmented::{SegmentHandlers, SegmentedIndexCoordinator, SelectionCursor};
pub use sink::{ItemFrame, LeafEvent, LeafSink, NullSink, RecordingSink};
