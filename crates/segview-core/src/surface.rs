//! # Scroll surfaces
//!
//! A `ScrollSurface` is the host's scrollable region as the coordinators see
//! it: an offset, content/viewport sizes, content insets, gesture flags, and a
//! change-notification channel.
//!
//! Surfaces are handed around as `Rc<ScrollSurface>`. The host (and the
//! controller on its behalf) owns them; coordinators keep `Weak` handles and
//! cancel their `Subscription`s before letting go.
//!
//! ```rust
//! use segview_core::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let page = ScrollSurface::new(SurfaceRole::Page);
//! let seen = Rc::new(Cell::new(0.0));
//! let sub = {
//!     let seen = seen.clone();
//!     page.observe(move |_, change| seen.set(change.new.x))
//! };
//! page.set_offset(Vec2::new(120.0, 0.0));
//! assert_eq!(seen.get(), 120.0);
//! sub.cancel();
//! ```
//!
//! Observers run synchronously inside `set_offset`, on a snapshot of the
//! observer list, so a handler may write back into the same surface. Whoever
//! writes back into a surface it also observes brackets the write with a
//! [`SuppressGuard`] so it does not see its own write.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};
use web_time::Instant;

use crate::animation::{AnimatedValue, AnimationSpec};
use crate::{EdgeInsets, Size, Vec2};

new_key_type! {
    pub struct SubId;
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SurfaceFlags: u8 {
        /// A finger is on the surface.
        const TRACKING = 1 << 0;
        /// Coasting after the finger lifted.
        const DECELERATING = 1 << 1;
        /// May overscroll past its content edges.
        const BOUNCES = 1 << 2;
        /// Internal wrapper of a table-like container, never a real inner list.
        const WRAPPER = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceRole {
    Outer,
    Inner,
    Page,
    IndexBar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetChange {
    pub surface: SurfaceId,
    pub old: Vec2,
    pub new: Vec2,
}

type Observer = Rc<dyn Fn(&ScrollSurface, OffsetChange)>;
type Observers = Rc<RefCell<SlotMap<SubId, Observer>>>;

/// Handle to an observer registration. Cancelling is idempotent.
#[derive(Clone)]
pub struct Subscription(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Subscription {
    fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Removes the observer. Runs at most once.
    pub fn cancel(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct SurfaceState {
    offset: Vec2,
    content_size: Size,
    viewport: Size,
    inset: EdgeInsets,
    flags: SurfaceFlags,
    animation: Option<AnimatedValue<Vec2>>,
}

pub struct ScrollSurface {
    id: SurfaceId,
    role: SurfaceRole,
    state: RefCell<SurfaceState>,
    observers: Observers,
}

impl fmt::Debug for ScrollSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("ScrollSurface")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("offset", &s.offset)
            .field("content_size", &s.content_size)
            .field("viewport", &s.viewport)
            .field("flags", &s.flags)
            .finish()
    }
}

impl ScrollSurface {
    pub fn new(role: SurfaceRole) -> Rc<Self> {
        Rc::new(Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            role,
            state: RefCell::new(SurfaceState {
                offset: Vec2::ZERO,
                content_size: Size::ZERO,
                viewport: Size::ZERO,
                inset: EdgeInsets::ZERO,
                flags: SurfaceFlags::empty(),
                animation: None,
            }),
            observers: Rc::new(RefCell::new(SlotMap::with_key())),
        })
    }

    /// Convenience constructor for tests and demos.
    pub fn with_geometry(role: SurfaceRole, viewport: Size, content_size: Size) -> Rc<Self> {
        let s = Self::new(role);
        s.set_viewport(viewport);
        s.set_content_size(content_size);
        s
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Identity comparison.
    pub fn is(&self, other: &ScrollSurface) -> bool {
        self.id == other.id
    }

    pub fn offset(&self) -> Vec2 {
        self.state.borrow().offset
    }

    pub fn content_size(&self) -> Size {
        self.state.borrow().content_size
    }

    pub fn viewport(&self) -> Size {
        self.state.borrow().viewport
    }

    pub fn inset(&self) -> EdgeInsets {
        self.state.borrow().inset
    }

    pub fn flags(&self) -> SurfaceFlags {
        self.state.borrow().flags
    }

    pub fn is_tracking(&self) -> bool {
        self.flags().contains(SurfaceFlags::TRACKING)
    }

    pub fn is_decelerating(&self) -> bool {
        self.flags().contains(SurfaceFlags::DECELERATING)
    }

    /// Moved by the user rather than programmatically.
    pub fn is_user_scrolling(&self) -> bool {
        self.flags()
            .intersects(SurfaceFlags::TRACKING | SurfaceFlags::DECELERATING)
    }

    pub fn bounces(&self) -> bool {
        self.flags().contains(SurfaceFlags::BOUNCES)
    }

    pub fn set_content_size(&self, size: Size) {
        self.state.borrow_mut().content_size = Size::new(size.width.max(0.0), size.height.max(0.0));
    }

    pub fn set_viewport(&self, size: Size) {
        self.state.borrow_mut().viewport = Size::new(size.width.max(0.0), size.height.max(0.0));
    }

    pub fn set_inset(&self, inset: EdgeInsets) {
        self.state.borrow_mut().inset = inset;
    }

    pub fn set_flag(&self, flag: SurfaceFlags, on: bool) {
        self.state.borrow_mut().flags.set(flag, on);
    }

    /// Finger down: stops any programmatic animation.
    pub fn begin_drag(&self) {
        let mut s = self.state.borrow_mut();
        s.animation = None;
        s.flags.remove(SurfaceFlags::DECELERATING);
        s.flags.insert(SurfaceFlags::TRACKING);
    }

    pub fn end_drag(&self, will_decelerate: bool) {
        let mut s = self.state.borrow_mut();
        s.flags.remove(SurfaceFlags::TRACKING);
        s.flags.set(SurfaceFlags::DECELERATING, will_decelerate);
    }

    pub fn end_deceleration(&self) {
        self.state
            .borrow_mut()
            .flags
            .remove(SurfaceFlags::DECELERATING);
    }

    /// Writes the offset and notifies observers if it changed. Cancels an
    /// in-flight animation: a direct write wins.
    pub fn set_offset(&self, offset: Vec2) {
        self.state.borrow_mut().animation = None;
        self.apply_offset(offset);
    }

    fn apply_offset(&self, offset: Vec2) {
        let old = {
            let mut s = self.state.borrow_mut();
            let old = s.offset;
            if old == offset {
                return;
            }
            s.offset = offset;
            old
        };
        self.notify(OffsetChange {
            surface: self.id,
            old,
            new: offset,
        });
    }

    /// Starts an animated scroll, or re-targets the one in flight.
    pub fn animate_offset_to(&self, target: Vec2, spec: AnimationSpec, now: Instant) {
        let mut s = self.state.borrow_mut();
        let current = s.offset;
        let anim = s
            .animation
            .get_or_insert_with(|| AnimatedValue::new(current, spec));
        anim.set_target(target, now);
    }

    pub fn is_animating(&self) -> bool {
        self.state.borrow().animation.is_some()
    }

    /// Target of the animation in flight, if any.
    pub fn animation_target(&self) -> Option<Vec2> {
        self.state.borrow().animation.as_ref().map(|a| *a.target())
    }

    /// Advances the in-flight animation; each step is an ordinary offset change.
    /// Returns true while the animation keeps running.
    pub fn tick(&self, now: Instant) -> bool {
        let (value, running) = {
            let mut s = self.state.borrow_mut();
            let Some(anim) = s.animation.as_mut() else {
                return false;
            };
            let running = anim.update_at(now);
            let value = *anim.get();
            if !running {
                s.animation = None;
            }
            (value, running)
        };
        self.apply_offset(value);
        running
    }

    /// Jumps an in-flight animation to its end.
    pub fn finish_animation(&self) {
        let target = self.state.borrow_mut().animation.take().map(|mut a| {
            a.finish();
            *a.get()
        });
        if let Some(t) = target {
            self.apply_offset(t);
        }
    }

    pub fn observe(&self, f: impl Fn(&ScrollSurface, OffsetChange) + 'static) -> Subscription {
        let id = self.observers.borrow_mut().insert(Rc::new(f));
        log::trace!("surface {:?} ({:?}): observer {id:?} added", self.id, self.role);
        let observers: Weak<RefCell<SlotMap<SubId, Observer>>> = Rc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(obs) = observers.upgrade() {
                obs.borrow_mut().remove(id);
                log::trace!("observer {id:?} removed");
            }
        })
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn notify(&self, change: OffsetChange) {
        let snapshot: Vec<Observer> = self.observers.borrow().values().cloned().collect();
        for f in snapshot {
            f(self, change);
        }
    }
}

/// Per-coordinator re-entrancy guard.
///
/// `write` raises the flag for exactly one synchronous offset write; the
/// coordinator's own handler checks `is_suppressed` first and ignores the echo.
#[derive(Debug, Default)]
pub struct SuppressGuard {
    suppressed: Cell<bool>,
}

impl SuppressGuard {
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }

    pub fn write(&self, surface: &ScrollSurface, offset: Vec2) {
        self.run(|| surface.set_offset(offset));
    }

    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = self.suppressed.replace(true);
        let r = f();
        self.suppressed.set(prev);
        r
    }
}
