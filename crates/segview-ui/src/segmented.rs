//! # Segmented index bar
//!
//! Keeps the index bar's items, its indicator, and the page surface's
//! horizontal offset consistent through three kinds of input:
//!
//! - tap (or `selected`): a discrete jump from the current item `s` to `d`.
//!   `s` drops to percent 0, `d` rises to 1, the page surface moves to
//!   `d * W` (animated only for neighbours), and the indicator tweens over.
//! - user drag of the page surface: the offset maps to a straddling pair
//!   `(left, right)` with complementary percents. When the pair changes the
//!   bar re-centers on the dominant item, which becomes current.
//! - content changes: re-measure, re-layout, re-center, refresh the indicator.
//!
//! Programmatic page moves (taps, reloads, animation frames) arrive with the
//! page surface neither tracking nor decelerating and are ignored here.
//!
//! All output is buffered while state is borrowed and flushed afterwards, so
//! handlers may call back into the coordinator.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use web_time::Instant;

use segview_core::{
    AnimationSpec, OffsetChange, Rect, ScrollSurface, SegmentConfig, Size, Subscription,
    SuppressGuard, Vec2, finite_or,
};

use crate::indicator::{self, IndicatorStyle};
use crate::item::{ItemContent, ItemState, TextMeasure};
use crate::page_window::visible_range;
use crate::sink::{ItemFrame, LeafSink};

#[derive(Clone, Default)]
pub struct SegmentHandlers {
    /// Veto for a selection `(source, destination)`; `false` cancels it.
    pub should_change: Option<Rc<dyn Fn(usize, usize) -> bool>>,
    /// A tap (or `selected`) passed the veto and is about to switch.
    pub on_tap: Option<Rc<dyn Fn(usize, usize)>>,
    /// Every drag frame that produced a straddling pair.
    pub on_drag_scroll: Option<Rc<dyn Fn(usize, usize)>>,
    /// A drag made a different item current.
    pub on_drag_select: Option<Rc<dyn Fn(usize)>>,
}

/// Which two items straddle the viewport, and which one is current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    pub left: usize,
    pub right: usize,
    pub current: usize,
}

enum Effect {
    ClearItems,
    Item(usize, ItemFrame),
    Highlight(usize, f32, f32),
    Indicator(Rect, Option<AnimationSpec>),
    Bar(Vec2, bool),
    Page(Vec2, bool),
    DragSelect(usize),
    DragScroll(usize, usize),
}

type Effects = SmallVec<[Effect; 8]>;

#[derive(Default)]
struct IndexState {
    items: Vec<ItemState>,
    cursor: SelectionCursor,
    total_percent: f32,
    indicator: Rect,
    style: Option<IndicatorStyle>,
}

pub struct SegmentedIndexCoordinator {
    config: Rc<SegmentConfig>,
    page: Weak<ScrollSurface>,
    bar: Weak<ScrollSurface>,
    sink: Rc<dyn LeafSink>,
    measure: Rc<dyn TextMeasure>,
    guard: SuppressGuard,
    frame_time: Cell<Instant>,
    /// Bumped by every flush; an outer flush stops once a nested one ran.
    flush_epoch: Cell<u64>,
    state: RefCell<IndexState>,
    handlers: RefCell<SegmentHandlers>,
    page_sub: RefCell<Option<Subscription>>,
}

impl SegmentedIndexCoordinator {
    pub fn attach(
        page: &Rc<ScrollSurface>,
        bar: &Rc<ScrollSurface>,
        config: Rc<SegmentConfig>,
        sink: Rc<dyn LeafSink>,
        measure: Rc<dyn TextMeasure>,
    ) -> Rc<Self> {
        let c = Rc::new(Self {
            config,
            page: Rc::downgrade(page),
            bar: Rc::downgrade(bar),
            sink,
            measure,
            guard: SuppressGuard::default(),
            frame_time: Cell::new(Instant::now()),
            flush_epoch: Cell::new(0),
            state: RefCell::new(IndexState::default()),
            handlers: RefCell::new(SegmentHandlers::default()),
            page_sub: RefCell::new(None),
        });
        let weak = Rc::downgrade(&c);
        let sub = page.observe(move |surface: &ScrollSurface, change: OffsetChange| {
            if let Some(c) = weak.upgrade() {
                c.on_page_offset(surface, change);
            }
        });
        *c.page_sub.borrow_mut() = Some(sub);
        c
    }

    pub fn set_handlers(&self, handlers: SegmentHandlers) {
        *self.handlers.borrow_mut() = handlers;
    }

    /// Start time for animations begun from now on.
    pub fn set_frame_time(&self, now: Instant) {
        self.frame_time.set(now);
    }

    pub fn cursor(&self) -> SelectionCursor {
        self.state.borrow().cursor
    }

    pub fn current_index(&self) -> usize {
        self.state.borrow().cursor.current
    }

    pub fn item_count(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn item(&self, index: usize) -> Option<ItemState> {
        self.state.borrow().items.get(index).cloned()
    }

    pub fn percents(&self) -> Vec<f32> {
        self.state.borrow().items.iter().map(|i| i.percent).collect()
    }

    pub fn contents(&self) -> Vec<ItemContent> {
        self.state
            .borrow()
            .items
            .iter()
            .map(|i| i.content.clone())
            .collect()
    }

    /// Last indicator frame, in bar content coordinates.
    pub fn indicator_frame(&self) -> Rect {
        self.state.borrow().indicator
    }

    /// `(offset + W) / content width` of the page surface at the last change.
    pub fn total_percent(&self) -> f32 {
        self.state.borrow().total_percent
    }

    /// Rebuilds every item from the current contents and selects the
    /// configured default.
    pub fn reload_data(&self) {
        let contents = self.contents();
        self.reload_with(contents, self.config.default_selected_index);
    }

    /// Replaces all items, then selects `selected` (clamped) without
    /// animation and snaps the page surface to it.
    pub fn reload_with(&self, contents: Vec<ItemContent>, selected: usize) {
        let (bar_w, bar_h) = self.bar_size();
        let page_w = self.page.upgrade().map(|p| p.viewport().width).unwrap_or(0.0);
        let mut fx = Effects::new();
        let n = contents.len();
        {
            let mut st = self.state.borrow_mut();
            st.items = contents
                .into_iter()
                .enumerate()
                .map(|(i, c)| ItemState::new(i, c, &self.config, self.measure.as_ref()))
                .collect();
            st.style = Some(IndicatorStyle::resolve(&self.config, bar_h));
            st.cursor = SelectionCursor::default();
            st.indicator = Rect::default();
            st.total_percent = 0.0;
            fx.push(Effect::ClearItems);
            self.layout_items(&mut st, &mut fx);

            log::debug!("reload {n} items, select {selected}");
            if n > 0 {
                let d = selected.min(n - 1);
                for item in st.items.iter_mut() {
                    item.set_percent(if item.index == d { 1.0 } else { 0.0 });
                }
                for i in 0..n {
                    self.push_highlight(&st, i, &mut fx);
                }
                st.cursor = SelectionCursor {
                    left: d,
                    right: d,
                    current: d,
                };
                self.push_bar_center(&st, d, bar_w, false, &mut fx);
                fx.push(Effect::Page(Vec2::new(d as f32 * page_w, 0.0), false));
                self.push_indicator(&mut st, d, d, None, bar_h, &mut fx);
            }
        }
        self.flush(fx);
        // the snap above already reported its own progress; a reload starts over
        if n > 0 {
            self.state.borrow_mut().total_percent = 1.0 / n as f32;
        }
    }

    /// Public selection entry. Out-of-range or already-current indices are
    /// ignored; everything else goes through the tap path.
    pub fn selected(&self, index: usize, animated: bool) -> bool {
        let (n, current) = {
            let st = self.state.borrow();
            (st.items.len(), st.cursor.current)
        };
        if index >= n {
            log::warn!("selected({index}) out of range for {n} items");
            return false;
        }
        if index == current {
            return false;
        }
        self.check_out(index, animated)
    }

    /// Tap on item `index`, animated per configuration.
    pub fn tap(&self, index: usize) -> bool {
        if index >= self.item_count() {
            log::warn!("tap on missing item {index}");
            return false;
        }
        self.check_out(index, self.config.tap_animation)
    }

    fn check_out(&self, dest: usize, animated: bool) -> bool {
        let source = self.current_index();
        let veto = self.handlers.borrow().should_change.clone();
        if let Some(f) = veto {
            if !f(source, dest) {
                log::debug!("selection {source} -> {dest} vetoed");
                return false;
            }
        }
        if source == dest {
            return false;
        }
        let on_tap = self.handlers.borrow().on_tap.clone();
        if let Some(f) = on_tap {
            f(source, dest);
        }

        let (bar_w, bar_h) = self.bar_size();
        let page_w = self.page.upgrade().map(|p| p.viewport().width).unwrap_or(0.0);
        let mut fx = Effects::new();
        {
            let mut st = self.state.borrow_mut();
            if dest >= st.items.len() {
                return false;
            }
            // a tap ends any drag pairing: only `dest` keeps a percent
            for i in 0..st.items.len() {
                let p = if i == dest { 1.0 } else { 0.0 };
                if st.items[i].percent != p || i == dest || i == source {
                    st.items[i].set_percent(p);
                    self.push_highlight(&st, i, &mut fx);
                }
            }
            st.cursor = SelectionCursor {
                left: dest,
                right: dest,
                current: dest,
            };
            log::debug!("select {source} -> {dest} (animated {animated})");

            let neighbour = source.abs_diff(dest) == 1;
            fx.push(Effect::Page(
                Vec2::new(dest as f32 * page_w, 0.0),
                neighbour && animated,
            ));
            self.push_bar_center(&st, dest, bar_w, animated, &mut fx);

            let src = source.min(st.items.len() - 1);
            let (l, r) = if st.items[src].frame.x > st.items[dest].frame.x {
                (dest, src)
            } else {
                (src, dest)
            };
            let anim = animated.then(|| AnimationSpec::indicator(self.config.indicator_animation_ms));
            self.push_indicator(&mut st, l, r, anim, bar_h, &mut fx);
        }
        self.flush(fx);
        true
    }

    /// Replaces one item's content; its width (and every origin after it)
    /// follows, the bar re-centers on it, and the indicator is refreshed.
    pub fn update_item(&self, index: usize, content: ItemContent) {
        let (bar_w, bar_h) = self.bar_size();
        let mut fx = Effects::new();
        {
            let mut st = self.state.borrow_mut();
            let Some(item) = st.items.get_mut(index) else {
                log::warn!("update of missing item {index}");
                return;
            };
            item.content = content;
            item.measure(&self.config, self.measure.as_ref());
            self.layout_items(&mut st, &mut fx);
            self.push_bar_center(&st, index, bar_w, true, &mut fx);
            let SelectionCursor { left, right, .. } = st.cursor;
            self.push_indicator(&mut st, left, right, None, bar_h, &mut fx);
        }
        self.flush(fx);
    }

    pub fn set_title(&self, index: usize, title: impl Into<String>) {
        if let Some(mut content) = self.item(index).map(|i| i.content) {
            content.title = title.into();
            self.update_item(index, content);
        }
    }

    pub fn set_badge(&self, index: usize, badge: Option<String>) {
        if let Some(mut content) = self.item(index).map(|i| i.content) {
            content.badge = badge;
            self.update_item(index, content);
        }
    }

    /// Ends a drag episode once the page surface is neither tracking nor
    /// decelerating. The page nearest to the offset becomes the only selected
    /// item and the indicator comes to rest on it.
    pub fn end_episode(&self) {
        let Some(page) = self.page.upgrade() else {
            return;
        };
        let n = self.item_count();
        let w = page.viewport().width;
        if page.is_user_scrolling() || n == 0 || w == 0.0 {
            return;
        }
        let x = page.offset().x;
        let (left, right) = visible_range(x, w, n);
        let idx = finite_or(x / w, 0.0);
        let settled = if left != right && idx - left as f32 >= 0.5 {
            right
        } else {
            left
        };

        let (bar_w, bar_h) = self.bar_size();
        let mut fx = Effects::new();
        {
            let mut st = self.state.borrow_mut();
            let prev = st.cursor;
            let at_rest = SelectionCursor {
                left: settled,
                right: settled,
                current: settled,
            };
            let rest = |i: usize| if i == settled { 1.0 } else { 0.0 };
            let stale = (0..n).any(|i| st.items[i].percent != rest(i));
            if prev == at_rest && !stale {
                return;
            }
            log::debug!("drag episode ends on {settled} (pair was {}, {})", prev.left, prev.right);
            for i in 0..n {
                if st.items[i].percent != rest(i) {
                    st.items[i].set_percent(rest(i));
                    self.push_highlight(&st, i, &mut fx);
                }
            }
            st.cursor = at_rest;
            self.push_bar_center(&st, settled, bar_w, true, &mut fx);
            self.push_indicator(&mut st, settled, settled, None, bar_h, &mut fx);
            if prev.current != settled {
                fx.push(Effect::DragSelect(settled));
            }
        }
        self.flush(fx);
    }

    pub fn detach(&self) {
        if let Some(sub) = self.page_sub.borrow_mut().take() {
            sub.cancel();
        }
    }

    fn on_page_offset(&self, page: &ScrollSurface, change: OffsetChange) {
        if self.item_count() == 0 {
            return;
        }
        let w = page.viewport().width;
        let content_w = page.content_size().width;
        let x = change.new.x;
        self.state.borrow_mut().total_percent = finite_or((x + w) / content_w, 0.0);
        if self.guard.is_suppressed()
            || content_w == 0.0
            || w == 0.0
            || !page.is_user_scrolling()
        {
            return;
        }

        let (bar_w, bar_h) = self.bar_size();
        let mut fx = Effects::new();
        {
            let mut st = self.state.borrow_mut();
            if let Some((left, right)) = self.straddle(&mut st, x, w, content_w, bar_h, &mut fx) {
                self.apply_pair(&mut st, left, right, bar_w, bar_h, &mut fx);
            }
        }
        self.flush(fx);
    }

    /// Maps the page offset to the straddling pair and assigns its percents.
    /// Past either end of the drag envelope the edge item snaps to 1 and no
    /// pair is produced.
    fn straddle(
        &self,
        st: &mut IndexState,
        x: f32,
        w: f32,
        content_w: f32,
        bar_h: f32,
        fx: &mut Effects,
    ) -> Option<(usize, usize)> {
        let base = x / content_w;
        let total = st.total_percent;
        if total < base {
            let l = st.cursor.left;
            st.items[l].set_percent(1.0);
            self.push_highlight(st, l, fx);
            self.push_indicator(st, l, l, None, bar_h, fx);
        }
        if total > 1.0 {
            let r = st.cursor.right;
            self.push_indicator(st, r, r, None, bar_h, fx);
            st.items[r].set_percent(1.0);
            self.push_highlight(st, r, fx);
        }
        if !(base..=1.0).contains(&total) {
            return None;
        }

        let n = st.items.len();
        let max = (n - 1) as f32;
        let idx = x / w;
        let left = idx.floor().clamp(0.0, max) as usize;
        let right = idx.ceil().clamp(0.0, max) as usize;
        let (lp, rp) = if left == right {
            (1.0, 1.0)
        } else {
            let rp = idx - left as f32;
            (1.0 - rp, rp)
        };
        log::trace!("page x {x}: pair ({left}, {right}) {lp:.3}/{rp:.3}");
        st.items[left].set_percent(lp);
        st.items[right].set_percent(rp);
        self.push_highlight(st, left, fx);
        if right != left {
            self.push_highlight(st, right, fx);
        }
        Some((left, right))
    }

    fn apply_pair(
        &self,
        st: &mut IndexState,
        left: usize,
        right: usize,
        bar_w: f32,
        bar_h: f32,
        fx: &mut Effects,
    ) {
        let prev = st.cursor;
        if (left, right) != (prev.left, prev.right) {
            for old in [prev.left, prev.right] {
                if old != left && old != right && old < st.items.len() {
                    st.items[old].set_percent(0.0);
                    self.push_highlight(st, old, fx);
                }
            }
            let target = if st.items[right].percent >= 0.5 { right } else { left };
            self.push_bar_center(st, target, bar_w, true, fx);
            if target != prev.current {
                log::debug!("drag selects {target}");
                st.cursor.current = target;
                fx.push(Effect::DragSelect(target));
            }
        }
        self.push_indicator(st, left, right, None, bar_h, fx);
        st.cursor.left = left;
        st.cursor.right = right;
        fx.push(Effect::DragScroll(left, right));
    }

    fn bar_size(&self) -> (f32, f32) {
        let vp = self.bar.upgrade().map(|b| b.viewport()).unwrap_or(Size::ZERO);
        (vp.width, vp.height)
    }

    fn layout_items(&self, st: &mut IndexState, fx: &mut Effects) {
        let (bar_w, bar_h) = self.bar_size();
        let mut x = 0.0;
        let mut last_max = None;
        for item in st.items.iter_mut() {
            let w = item.item_width(self.config.item_width);
            if let Some(m) = last_max {
                x = m + self.config.item_spacing;
            }
            item.frame = Rect::new(x, 0.0, w, bar_h);
            item.layout_content(&self.config, self.measure.as_ref());
            last_max = Some(item.frame.max_x());
            fx.push(Effect::Item(item.index, ItemFrame::from(&*item)));
        }
        if let Some(bar) = self.bar.upgrade() {
            bar.set_content_size(Size::new(last_max.unwrap_or(bar_w), bar_h));
            bar.set_inset(self.config.item_content_inset);
        }
    }

    fn push_highlight(&self, st: &IndexState, index: usize, fx: &mut Effects) {
        let item = &st.items[index];
        fx.push(Effect::Highlight(
            index,
            item.highlight(self.config.selection_style),
            item.title_scale(&self.config),
        ));
    }

    fn push_indicator(
        &self,
        st: &mut IndexState,
        left: usize,
        right: usize,
        anim: Option<AnimationSpec>,
        bar_h: f32,
        fx: &mut Effects,
    ) {
        let (Some(l), Some(r)) = (st.items.get(left), st.items.get(right)) else {
            return;
        };
        let style = st
            .style
            .unwrap_or_else(|| IndicatorStyle::resolve(&self.config, bar_h));
        let frame = indicator::frame(&style, bar_h, l, r);
        st.indicator = frame;
        fx.push(Effect::Indicator(frame, anim));
    }

    /// Scrolls the bar so `index` sits in the middle, within content bounds.
    fn push_bar_center(
        &self,
        st: &IndexState,
        index: usize,
        bar_w: f32,
        animated: bool,
        fx: &mut Effects,
    ) {
        let Some(item) = st.items.get(index) else {
            return;
        };
        let content_w = self
            .bar
            .upgrade()
            .map(|b| b.content_size().width)
            .unwrap_or(0.0);
        let x = item.frame.center().x - bar_w / 2.0;
        let x = x.min(content_w - bar_w).max(0.0) - self.config.item_content_inset.left;
        fx.push(Effect::Bar(Vec2::new(x, 0.0), animated));
    }

    fn flush(&self, fx: Effects) {
        let now = self.frame_time.get();
        let epoch = self.flush_epoch.get().wrapping_add(1);
        self.flush_epoch.set(epoch);
        for e in fx {
            if self.flush_epoch.get() != epoch {
                // a handler re-entered and published newer state
                log::debug!("dropping effects superseded by a nested update");
                break;
            }
            match e {
                Effect::ClearItems => self.sink.clear_items(),
                Effect::Item(i, f) => self.sink.place_item(i, f),
                Effect::Highlight(i, h, s) => self.sink.item_highlight(i, h, s),
                Effect::Indicator(r, a) => self.sink.place_indicator(r, a),
                Effect::Bar(p, animated) => {
                    if let Some(bar) = self.bar.upgrade() {
                        if animated {
                            bar.animate_offset_to(p, AnimationSpec::scroll(), now);
                        } else {
                            bar.set_offset(p);
                        }
                    }
                }
                Effect::Page(p, animated) => {
                    if let Some(page) = self.page.upgrade() {
                        self.guard.run(|| {
                            if animated {
                                page.animate_offset_to(p, AnimationSpec::scroll(), now);
                            } else {
                                page.set_offset(p);
                            }
                        });
                    }
                }
                Effect::DragSelect(i) => {
                    let f = self.handlers.borrow().on_drag_select.clone();
                    if let Some(f) = f {
                        f(i);
                    }
                }
                Effect::DragScroll(l, r) => {
                    let f = self.handlers.borrow().on_drag_scroll.clone();
                    if let Some(f) = f {
                        f(l, r);
                    }
                }
            }
        }
    }
}

impl Drop for SegmentedIndexCoordinator {
    fn drop(&mut self) {
        self.detach();
    }
}
