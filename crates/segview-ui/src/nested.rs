//! # Nested scroll arbitration
//!
//! One outer vertical surface (optionally headed by a parallax header) and
//! zero or more inner lists that were granted simultaneous recognition. The
//! coordinator makes them behave like one scrollable region:
//!
//! - `lock` is true while the active inner list is scrolled past its own top
//!   inset. While locked, the outer surface may not move down: its write is
//!   reverted so the inner list keeps the drag.
//! - In `List` mode the outer surface owns pull-to-refresh and is clamped to
//!   `[-top, bottom + content - viewport]`.
//! - In `Container` mode the outer surface stops at `-minimum_height` (the
//!   header's collapsed height) and may only overscroll past `-top` when it
//!   bounces.
//!
//! Every write back goes through the coordinator's `SuppressGuard`, so the
//! coordinator never reacts to its own writes.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use segview_core::{
    EdgeInsets, OffsetChange, Rect, RefreshType, ScrollSurface, SegmentConfig, SuppressGuard,
    SurfaceFlags, SurfaceId, Subscription, Vec2,
};

use crate::sink::LeafSink;

#[derive(Clone, Default)]
pub struct NestedHandlers {
    /// Overscroll past the header's top, as a positive distance.
    pub on_header_drag: Option<Rc<dyn Fn(&ScrollSurface, f32)>>,
    /// 0 with the header fully open, 1 once collapsed to the minimum height.
    pub on_min_height_progress: Option<Rc<dyn Fn(&ScrollSurface, f32)>>,
    /// Whether the outer surface should cooperate with `candidate`. Without
    /// a policy nothing cooperates.
    pub should_cooperate: Option<Rc<dyn Fn(&ScrollSurface) -> bool>>,
}

struct ObservedInner {
    id: SurfaceId,
    surface: Weak<ScrollSurface>,
    sub: Subscription,
}

pub struct NestedScrollCoordinator {
    config: Rc<SegmentConfig>,
    outer: Weak<ScrollSurface>,
    sink: Rc<dyn LeafSink>,
    guard: SuppressGuard,
    lock: Cell<bool>,
    scroll_to_top_lock: Cell<bool>,
    inner: RefCell<SmallVec<[ObservedInner; 2]>>,
    outer_sub: RefCell<Option<Subscription>>,
    handlers: RefCell<NestedHandlers>,
}

fn observer(weak: Weak<NestedScrollCoordinator>) -> impl Fn(&ScrollSurface, OffsetChange) {
    move |surface: &ScrollSurface, change: OffsetChange| {
        if let Some(c) = weak.upgrade() {
            c.on_offset_change(surface, change);
        }
    }
}

impl NestedScrollCoordinator {
    pub fn attach(
        outer: &Rc<ScrollSurface>,
        config: Rc<SegmentConfig>,
        sink: Rc<dyn LeafSink>,
    ) -> Rc<Self> {
        let c = Rc::new(Self {
            config,
            outer: Rc::downgrade(outer),
            sink,
            guard: SuppressGuard::default(),
            lock: Cell::new(false),
            scroll_to_top_lock: Cell::new(false),
            inner: RefCell::new(SmallVec::new()),
            outer_sub: RefCell::new(None),
            handlers: RefCell::new(NestedHandlers::default()),
        });
        let sub = outer.observe(observer(Rc::downgrade(&c)));
        *c.outer_sub.borrow_mut() = Some(sub);
        c
    }

    pub fn set_handlers(&self, handlers: NestedHandlers) {
        *self.handlers.borrow_mut() = handlers;
    }

    pub fn is_locked(&self) -> bool {
        self.lock.get()
    }

    pub fn observed_count(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_observing(&self, surface: &ScrollSurface) -> bool {
        self.inner.borrow().iter().any(|o| o.id == surface.id())
    }

    /// Places the parallax header above the content and opens it fully.
    /// Bouncing is on only in container mode.
    pub fn layout_header(&self) {
        let Some(outer) = self.outer.upgrade() else {
            return;
        };
        if self.config.header.is_some() {
            let w = outer.viewport().width;
            let h = self.config.header_height();
            let inset = outer.inset();
            outer.set_inset(EdgeInsets { top: h, ..inset });
            self.sink.place_header(Rect::new(0.0, -h, w, h));
            outer.set_offset(Vec2::new(0.0, -h));
        }
        let bounces = self.config.refresh_type == RefreshType::Container;
        outer.set_flag(SurfaceFlags::BOUNCES, bounces);
    }

    /// Starts observing `inner`. Re-adding a surface already observed is a no-op.
    pub fn attach_inner(self: &Rc<Self>, inner: &Rc<ScrollSurface>) {
        if self.is_observing(inner) {
            return;
        }
        let locked = inner.offset().y > -inner.inset().top;
        self.lock.set(locked);
        let sub = inner.observe(observer(Rc::downgrade(self)));
        log::debug!("observe inner {:?} (lock {locked})", inner.id());
        self.inner.borrow_mut().push(ObservedInner {
            id: inner.id(),
            surface: Rc::downgrade(inner),
            sub,
        });
    }

    /// Simultaneous-gesture arbitration for a pan on `candidate`. Vertical
    /// pans on a real inner list are granted when the policy approves, and
    /// the list is observed from then on.
    pub fn should_recognize_simultaneously(
        self: &Rc<Self>,
        candidate: &Rc<ScrollSurface>,
        velocity: Vec2,
    ) -> bool {
        let Some(outer) = self.outer.upgrade() else {
            return false;
        };
        if candidate.is(&outer) {
            return false;
        }
        if velocity.x.abs() > velocity.y.abs() {
            return false;
        }
        if candidate.flags().contains(SurfaceFlags::WRAPPER) {
            return false;
        }
        let policy = self.handlers.borrow().should_cooperate.clone();
        let approved = policy.map(|f| f(candidate)).unwrap_or(false);
        if approved {
            self.attach_inner(candidate);
        }
        approved
    }

    pub fn end_drag(&self, surface: &ScrollSurface, will_decelerate: bool) {
        if !self.owns(surface) {
            return;
        }
        if !will_decelerate || self.config.refresh_type == RefreshType::List {
            self.reset("drag end");
        }
    }

    pub fn end_deceleration(&self, surface: &ScrollSurface) {
        if self.owns(surface) {
            self.reset("deceleration end");
        }
    }

    /// Status-bar tap. Holds write-backs into the outer surface until
    /// `did_scroll_to_top`; grants the system scroll only while the header is
    /// partially collapsed.
    pub fn should_scroll_to_top(&self) -> bool {
        self.scroll_to_top_lock.set(true);
        let Some(outer) = self.outer.upgrade() else {
            return false;
        };
        let y = outer.offset().y;
        let top = outer.inset().top;
        let min_h = self.config.minimum_height;
        y > -(top + min_h) && y < -min_h
    }

    pub fn did_scroll_to_top(&self) {
        self.scroll_to_top_lock.set(false);
    }

    /// Cancels every subscription. Safe to call more than once.
    pub fn detach(&self) {
        if let Some(sub) = self.outer_sub.borrow_mut().take() {
            sub.cancel();
        }
        self.reset("detach");
    }

    fn owns(&self, surface: &ScrollSurface) -> bool {
        let is_outer = self.outer.upgrade().is_some_and(|o| o.is(surface));
        is_outer || self.is_observing(surface)
    }

    fn reset(&self, why: &str) {
        let observed = std::mem::take(&mut *self.inner.borrow_mut());
        if self.lock.replace(false) || !observed.is_empty() {
            log::debug!("nested reset on {why}: released {} inner", observed.len());
        }
        for o in observed {
            o.sub.cancel();
        }
    }

    fn write(&self, outer: &ScrollSurface, target: &ScrollSurface, offset: Vec2) {
        if self.scroll_to_top_lock.get() && target.is(outer) {
            return;
        }
        self.guard.write(target, offset);
    }

    fn on_offset_change(&self, surface: &ScrollSurface, change: OffsetChange) {
        if self.guard.is_suppressed() || change.new.y == change.old.y {
            return;
        }
        let Some(outer) = self.outer.upgrade() else {
            return;
        };
        if surface.is(&outer) {
            match self.config.refresh_type {
                RefreshType::List => self.list_outer(&outer, change),
                RefreshType::Container => self.container_outer(&outer, change),
            }
            self.emit_header_signals(&outer);
        } else {
            self.lock.set(surface.offset().y > -surface.inset().top);
            let y = outer.offset().y;
            let top = outer.inset().top;
            let min_h = -self.config.minimum_height;
            let pin_inner = match self.config.refresh_type {
                RefreshType::List => y > -top && y < min_h,
                RefreshType::Container => y < min_h,
            };
            if pin_inner {
                log::trace!("pin inner {:?} while outer at {y}", surface.id());
                self.write(&outer, surface, Vec2::ZERO);
            }
        }
    }

    fn list_outer(&self, outer: &ScrollSurface, change: OffsetChange) {
        let diff = change.old.y - change.new.y;
        let cur = outer.offset();
        let inset = outer.inset();
        if diff > 0.0 && self.lock.get() {
            log::trace!("outer revert to {} (inner owns the drag)", change.old.y);
            self.write(outer, outer, change.old);
            return;
        }
        if cur.y < -inset.top {
            self.write(outer, outer, Vec2::new(cur.x, -inset.top));
            return;
        }
        let content = outer.content_size();
        let viewport = outer.viewport();
        if content.height <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        let max_y = (inset.bottom + content.height - viewport.height).max(-inset.top);
        if cur.y > max_y {
            self.write(outer, outer, Vec2::new(cur.x, max_y));
        }
    }

    fn container_outer(&self, outer: &ScrollSurface, change: OffsetChange) {
        let diff = change.old.y - change.new.y;
        let cur = outer.offset();
        let top = outer.inset().top;
        let min_h = -self.config.minimum_height;
        if diff > 0.0 && self.lock.get() {
            log::trace!("outer revert to {} (inner owns the drag)", change.old.y);
            self.write(outer, outer, change.old);
        } else if cur.y < -top && !outer.bounces() {
            self.write(outer, outer, Vec2::new(cur.x, -top));
        } else if cur.y > min_h {
            self.write(outer, outer, Vec2::new(cur.x, min_h));
        }
    }

    fn emit_header_signals(&self, outer: &ScrollSurface) {
        if self.config.header.is_none() {
            return;
        }
        let y = outer.offset().y;
        let top = outer.inset().top;
        let min_h = self.config.minimum_height;

        let drag_top = (-(y + top)).max(0.0);
        let span = if top != min_h { -top + min_h } else { 1.0 };
        let progress = 1.0 - ((y + min_h) / span).clamp(0.0, 1.0);

        let handlers = self.handlers.borrow().clone();
        if let Some(f) = handlers.on_header_drag {
            f(outer, drag_top);
        }
        if let Some(f) = handlers.on_min_height_progress {
            f(outer, progress);
        }
    }
}

impl Drop for NestedScrollCoordinator {
    fn drop(&mut self) {
        self.detach();
    }
}
