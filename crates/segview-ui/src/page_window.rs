//! Virtualized paging: which pages exist for the current horizontal offset.
//!
//! The window is recomputed on every offset change of the page surface,
//! including animated ones. Pages entering the window are materialized at
//! `(i * W, 0, W, H)`; pages leaving it are released.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use segview_core::{PreloadRange, Rect, ScrollSurface, Size, Subscription, Vec2, finite_or};

use crate::sink::LeafSink;

pub type PageSet = SmallVec<[usize; 8]>;

/// `(left, right)` page indices straddling `offset_x`, clamped to `[0, count-1]`.
/// Degenerate widths give `(0, 0)`.
pub fn visible_range(offset_x: f32, width: f32, count: usize) -> (usize, usize) {
    let idx = offset_x / width;
    if !idx.is_finite() || count == 0 {
        return (0, 0);
    }
    let max = (count - 1) as f32;
    let left = idx.floor().clamp(0.0, max) as usize;
    let right = idx.ceil().clamp(0.0, max) as usize;
    (left, right)
}

/// `[left - back, right + forward] ∩ [0, count-1]`, ascending.
pub fn materialized_set(left: usize, right: usize, preload: PreloadRange, count: usize) -> PageSet {
    if count == 0 {
        return PageSet::new();
    }
    let lo = left.saturating_sub(preload.back);
    let hi = right.saturating_add(preload.forward).min(count - 1);
    (lo..=hi).collect()
}

pub struct PageWindow {
    surface: Weak<ScrollSurface>,
    sink: Rc<dyn LeafSink>,
    preload: PreloadRange,
    count: Cell<usize>,
    materialized: RefCell<PageSet>,
    subscription: RefCell<Option<Subscription>>,
}

impl PageWindow {
    /// Subscribes to `surface`; the window follows every offset change from now on.
    pub fn attach(
        surface: &Rc<ScrollSurface>,
        preload: PreloadRange,
        sink: Rc<dyn LeafSink>,
    ) -> Rc<Self> {
        let window = Rc::new(Self {
            surface: Rc::downgrade(surface),
            sink,
            preload,
            count: Cell::new(0),
            materialized: RefCell::new(PageSet::new()),
            subscription: RefCell::new(None),
        });
        let weak = Rc::downgrade(&window);
        let sub = surface.observe(move |_, _| {
            if let Some(w) = weak.upgrade() {
                w.refresh();
            }
        });
        *window.subscription.borrow_mut() = Some(sub);
        window
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn materialized(&self) -> PageSet {
        self.materialized.borrow().clone()
    }

    /// Resets the content extent to `count * W` and rebuilds the window.
    pub fn reload(&self, count: usize) {
        let Some(surface) = self.surface.upgrade() else {
            log::warn!("page window reload after its surface was dropped");
            return;
        };
        self.count.set(count);
        let vp = surface.viewport();
        surface.set_content_size(Size::new(count as f32 * vp.width, vp.height));
        // frames depend on W, so everything is re-placed
        self.apply(&surface, true);
    }

    /// Moves the page surface to page `index` without animation.
    pub fn jump_to(&self, index: usize) {
        if let Some(surface) = self.surface.upgrade() {
            let w = surface.viewport().width;
            surface.set_offset(Vec2::new(index as f32 * w, 0.0));
        }
    }

    pub fn refresh(&self) {
        if let Some(surface) = self.surface.upgrade() {
            self.apply(&surface, false);
        }
    }

    fn apply(&self, surface: &ScrollSurface, place_all: bool) {
        let count = self.count.get();
        let vp = surface.viewport();
        let (left, right) = visible_range(surface.offset().x, vp.width, count);
        let next = materialized_set(left, right, self.preload, count);
        let prev = self.materialized.replace(next.clone());
        if prev == next && !place_all {
            return;
        }
        log::trace!("page window [{left}, {right}] -> {next:?}");
        for &i in prev.iter().filter(|i| !next.contains(i)) {
            log::debug!("release page {i}");
            self.sink.release_page(i);
        }
        for &i in next.iter().filter(|i| place_all || !prev.contains(i)) {
            log::debug!("materialize page {i}");
            let frame = Rect::new(i as f32 * vp.width, 0.0, vp.width, vp.height);
            self.sink.materialize_page(i, frame);
        }
    }

    /// A page surface recognizes together with a nested page surface only
    /// when the nested one shows its first page and this one its last.
    pub fn should_recognize_with_nested(&self, nested: &ScrollSurface) -> bool {
        let Some(outer) = self.surface.upgrade() else {
            return false;
        };
        if outer.is(nested) {
            return false;
        }
        let page_of = |s: &ScrollSurface| finite_or((s.offset().x / s.viewport().width).trunc(), 0.0);
        let sub_index = page_of(nested);
        let current = page_of(&outer);
        sub_index == 0.0 && current == self.count.get() as f32 - 1.0
    }

    pub fn detach(&self) {
        if let Some(sub) = self.subscription.borrow_mut().take() {
            sub.cancel();
        }
    }
}

impl Drop for PageWindow {
    fn drop(&mut self) {
        self.detach();
    }
}
