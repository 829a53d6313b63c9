//! Host-facing entry point.
//!
//! A `SegmentController` wires one outer surface, one page surface and one
//! index bar to the three coordinators from `segview-ui`, and forwards the
//! host's gesture and frame events to them.
//!
//! ```rust
//! use std::rc::Rc;
//! use segview_controller::*;
//! use segview_core::*;
//! use segview_ui::*;
//!
//! let surfaces = Surfaces::new();
//! let controller =
//!     SegmentController::new(SegmentConfig::default(), &surfaces, Rc::new(NullSink)).unwrap();
//! controller.layout(Size::new(375.0, 800.0)).unwrap();
//! controller
//!     .set_items(vec![ItemContent::new("News"), ItemContent::new("Sports")])
//!     .unwrap();
//!
//! assert!(controller.selected(1, false));
//! assert_eq!(surfaces.page.offset().x, 375.0);
//! ```

pub mod controller;

pub use controller::*;
