//! # Surfaces, subscriptions, and configuration
//!
//! `segview-core` holds the pieces every coordinator shares:
//!
//! - `ScrollSurface` - the host's scrollable region: offset, sizes, insets,
//!   gesture flags, and an observer list.
//! - `Subscription` - handle returned by `observe`; cancelling it detaches the
//!   observer.
//! - `SuppressGuard` - re-entrancy flag for a coordinator that writes back into
//!   a surface it observes.
//! - `SegmentConfig` - the session's policy bag.
//!
//! ## Observing a surface
//!
//! ```rust
//! use segview_core::*;
//!
//! let outer = ScrollSurface::new(SurfaceRole::Outer);
//! let guard = std::rc::Rc::new(SuppressGuard::default());
//! let sub = {
//!     let guard = guard.clone();
//!     outer.observe(move |surface, change| {
//!         if guard.is_suppressed() {
//!             return;
//!         }
//!         if change.new.y < -80.0 {
//!             guard.write(surface, Vec2::new(change.new.x, -80.0));
//!         }
//!     })
//! };
//!
//! outer.set_offset(Vec2::new(0.0, -120.0));
//! assert_eq!(outer.offset().y, -80.0);
//! sub.cancel();
//! ```
//!
//! ## Animated writes
//!
//! Programmatic scrolls are tweens advanced by the host's frame clock. Each
//! step is an ordinary offset change, delivered with the surface's tracking and
//! decelerating flags unset.
//!
//! ```rust
//! use segview_core::*;
//! use web_time::{Duration, Instant};
//!
//! let page = ScrollSurface::new(SurfaceRole::Page);
//! let start = Instant::now();
//! page.animate_offset_to(Vec2::new(300.0, 0.0), AnimationSpec::scroll(), start);
//! while page.tick(start + Duration::from_millis(400)) {}
//! assert_eq!(page.offset().x, 300.0);
//! ```

pub mod animation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod surface;
pub mod tests;

pub use animation::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use surface::*;
