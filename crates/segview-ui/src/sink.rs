//! Leaf output. Coordinators never draw; they hand frames to a `LeafSink`
//! supplied by the host.

use std::cell::RefCell;

use segview_core::{AnimationSpec, Rect};

use crate::item::ItemState;

/// Laid-out item as handed to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemFrame {
    pub frame: Rect,
    /// Relative to `frame`.
    pub title: Rect,
    pub badge: Option<Rect>,
}

impl From<&ItemState> for ItemFrame {
    fn from(item: &ItemState) -> Self {
        Self {
            frame: item.frame,
            title: item.title_frame,
            badge: item.badge_frame,
        }
    }
}

/// Every method defaults to a no-op so hosts implement only what they draw.
pub trait LeafSink {
    /// All item leaves are about to be rebuilt.
    fn clear_items(&self) {}
    fn place_item(&self, _index: usize, _frame: ItemFrame) {}
    /// `highlight` is the crossfade amount; `title_scale` the font scale it implies.
    fn item_highlight(&self, _index: usize, _highlight: f32, _title_scale: f32) {}
    /// `animation` is set when the move should be tweened (tap transitions).
    fn place_indicator(&self, _frame: Rect, _animation: Option<AnimationSpec>) {}
    fn place_header(&self, _frame: Rect) {}
    fn materialize_page(&self, _index: usize, _frame: Rect) {}
    fn release_page(&self, _index: usize) {}
}

/// Sink that draws nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LeafSink for NullSink {}

#[derive(Clone, Debug, PartialEq)]
pub enum LeafEvent {
    ClearItems,
    Item(usize, ItemFrame),
    Highlight(usize, f32, f32),
    Indicator(Rect, bool),
    Header(Rect),
    Materialize(usize, Rect),
    Release(usize),
}

/// Records every call, for tests and headless replays.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<LeafEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<LeafEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn events(&self) -> Vec<LeafEvent> {
        self.events.borrow().clone()
    }

    pub fn last_indicator(&self) -> Option<Rect> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            LeafEvent::Indicator(r, _) => Some(*r),
            _ => None,
        })
    }

    pub fn last_highlight(&self, index: usize) -> Option<f32> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            LeafEvent::Highlight(i, h, _) if *i == index => Some(*h),
            _ => None,
        })
    }

    fn push(&self, e: LeafEvent) {
        self.events.borrow_mut().push(e);
    }
}

impl LeafSink for RecordingSink {
    fn clear_items(&self) {
        self.push(LeafEvent::ClearItems);
    }
    fn place_item(&self, index: usize, frame: ItemFrame) {
        self.push(LeafEvent::Item(index, frame));
    }
    fn item_highlight(&self, index: usize, highlight: f32, title_scale: f32) {
        self.push(LeafEvent::Highlight(index, highlight, title_scale));
    }
    fn place_indicator(&self, frame: Rect, animation: Option<AnimationSpec>) {
        self.push(LeafEvent::Indicator(frame, animation.is_some()));
    }
    fn place_header(&self, frame: Rect) {
        self.push(LeafEvent::Header(frame));
    }
    fn materialize_page(&self, index: usize, frame: Rect) {
        self.push(LeafEvent::Materialize(index, frame));
    }
    fn release_page(&self, index: usize) {
        self.push(LeafEvent::Release(index));
    }
}
