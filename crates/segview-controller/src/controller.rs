use std::rc::{Rc, Weak};

use web_time::Instant;

use segview_core::{
    Result, ScrollSurface, SegmentConfig, SegviewError, Size, SurfaceRole, Vec2,
};
use segview_ui::{
    GraphemeMeasure, ItemContent, LayoutPlan, LeafSink, NestedHandlers, NestedScrollCoordinator,
    PageWindow, SegmentHandlers, SegmentedIndexCoordinator, TextMeasure, plan,
};

/// The three host surfaces a controller drives. The host keeps them alive;
/// the controller only holds weak handles.
#[derive(Clone)]
pub struct Surfaces {
    pub outer: Rc<ScrollSurface>,
    pub page: Rc<ScrollSurface>,
    pub bar: Rc<ScrollSurface>,
}

impl Surfaces {
    pub fn new() -> Self {
        Self {
            outer: ScrollSurface::new(SurfaceRole::Outer),
            page: ScrollSurface::new(SurfaceRole::Page),
            bar: ScrollSurface::new(SurfaceRole::IndexBar),
        }
    }
}

impl Default for Surfaces {
    fn default() -> Self {
        Self::new()
    }
}

/// Host callbacks. Every field is optional.
#[derive(Clone, Default)]
pub struct Handlers {
    /// Pull distance past the header's top.
    pub on_header_drag: Option<Rc<dyn Fn(f32)>>,
    /// Header collapse, 0 (open) to 1 (at the minimum height).
    pub on_min_height_progress: Option<Rc<dyn Fn(f32)>>,
    pub on_drag_scroll: Option<Rc<dyn Fn(usize, usize)>>,
    pub on_drag_select: Option<Rc<dyn Fn(usize)>>,
    pub on_tap: Option<Rc<dyn Fn(usize, usize)>>,
    pub should_change: Option<Rc<dyn Fn(usize, usize) -> bool>>,
    /// Whether an inner list may scroll together with the outer surface.
    /// Unset means every vertical list cooperates.
    pub should_cooperate: Option<Rc<dyn Fn(&ScrollSurface) -> bool>>,
}

pub struct SegmentController {
    config: Rc<SegmentConfig>,
    outer: Weak<ScrollSurface>,
    page: Weak<ScrollSurface>,
    bar: Weak<ScrollSurface>,
    nested: Rc<NestedScrollCoordinator>,
    window: Rc<PageWindow>,
    segmented: Rc<SegmentedIndexCoordinator>,
}

impl SegmentController {
    pub fn new(
        config: SegmentConfig,
        surfaces: &Surfaces,
        sink: Rc<dyn LeafSink>,
    ) -> Result<Self> {
        Self::with_measure(config, surfaces, sink, Rc::new(GraphemeMeasure::default()))
    }

    pub fn from_json(json: &str, surfaces: &Surfaces, sink: Rc<dyn LeafSink>) -> Result<Self> {
        Self::new(SegmentConfig::from_json(json)?, surfaces, sink)
    }

    pub fn with_measure(
        config: SegmentConfig,
        surfaces: &Surfaces,
        sink: Rc<dyn LeafSink>,
        measure: Rc<dyn TextMeasure>,
    ) -> Result<Self> {
        config.validate()?;
        if surfaces.page.is(&surfaces.outer) || surfaces.page.is(&surfaces.bar) {
            return Err(SegviewError::InvalidConfig {
                field: "surfaces",
                reason: "page surface must be distinct",
            });
        }
        let config = Rc::new(config);
        let nested = NestedScrollCoordinator::attach(&surfaces.outer, config.clone(), sink.clone());
        let window = PageWindow::attach(&surfaces.page, config.preload, sink.clone());
        let segmented = SegmentedIndexCoordinator::attach(
            &surfaces.page,
            &surfaces.bar,
            config.clone(),
            sink,
            measure,
        );
        let controller = Self {
            config,
            outer: Rc::downgrade(&surfaces.outer),
            page: Rc::downgrade(&surfaces.page),
            bar: Rc::downgrade(&surfaces.bar),
            nested,
            window,
            segmented,
        };
        controller.set_handlers(Handlers::default());
        log::info!("segment controller ready ({:?})", controller.config.position);
        Ok(controller)
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn nested(&self) -> &Rc<NestedScrollCoordinator> {
        &self.nested
    }

    pub fn page_window(&self) -> &Rc<PageWindow> {
        &self.window
    }

    pub fn segmented(&self) -> &Rc<SegmentedIndexCoordinator> {
        &self.segmented
    }

    pub fn current_index(&self) -> usize {
        self.segmented.current_index()
    }

    pub fn item_count(&self) -> usize {
        self.segmented.item_count()
    }

    pub fn set_handlers(&self, handlers: Handlers) {
        let page = self.page.clone();
        let bar = self.bar.clone();
        let policy = handlers.should_cooperate.clone();
        let should_cooperate = move |candidate: &ScrollSurface| {
            let own = |w: &Weak<ScrollSurface>| w.upgrade().is_some_and(|s| s.is(candidate));
            if own(&page) || own(&bar) {
                return false;
            }
            policy.as_ref().map(|f| f(candidate)).unwrap_or(true)
        };
        self.nested.set_handlers(NestedHandlers {
            on_header_drag: handlers
                .on_header_drag
                .map(|f| Rc::new(move |_: &ScrollSurface, d: f32| f(d)) as Rc<dyn Fn(&ScrollSurface, f32)>),
            on_min_height_progress: handlers.on_min_height_progress.map(|f| {
                Rc::new(move |_: &ScrollSurface, p: f32| f(p)) as Rc<dyn Fn(&ScrollSurface, f32)>
            }),
            should_cooperate: Some(Rc::new(should_cooperate)),
        });
        self.segmented.set_handlers(SegmentHandlers {
            should_change: handlers.should_change,
            on_tap: handlers.on_tap,
            on_drag_scroll: handlers.on_drag_scroll,
            on_drag_select: handlers.on_drag_select,
        });
    }

    /// Sizes every surface for `screen`, re-places pages and items, and opens
    /// the header. Returns the frames the host should mount its views at.
    pub fn layout(&self, screen: Size) -> Result<LayoutPlan> {
        let outer = upgrade(&self.outer, "outer")?;
        let page = upgrade(&self.page, "page")?;
        let bar = upgrade(&self.bar, "bar")?;
        let p = plan(&self.config, screen);
        log::debug!("layout {screen:?}: bar {:?}, pages {:?}", p.bar, p.pages);
        outer.set_viewport(p.outer.size());
        outer.set_content_size(p.outer_content);
        bar.set_viewport(p.bar.size());
        page.set_viewport(p.pages.size());

        self.window.reload(self.segmented.item_count());
        if self.segmented.item_count() > 0 {
            let current = self.segmented.current_index();
            self.segmented.reload_with(self.segmented.contents(), current);
        }
        self.nested.layout_header();
        Ok(p)
    }

    /// Replaces every item and selects the configured default.
    pub fn set_items(&self, items: Vec<ItemContent>) -> Result<()> {
        upgrade(&self.page, "page")?;
        self.window.reload(items.len());
        self.segmented
            .reload_with(items, self.config.default_selected_index);
        Ok(())
    }

    pub fn reload_data(&self) {
        self.window.reload(self.segmented.item_count());
        self.segmented.reload_data();
    }

    /// Inserts `item` at `index` (clamped to the item count) and selects it.
    pub fn insert_item(&self, item: ItemContent, index: usize) -> Result<usize> {
        upgrade(&self.page, "page")?;
        let mut contents = self.segmented.contents();
        let index = index.min(contents.len());
        contents.insert(index, item);
        log::debug!("insert item at {index} ({} total)", contents.len());
        self.window.reload(contents.len());
        self.window.jump_to(index);
        self.segmented.reload_with(contents, index);
        Ok(index)
    }

    pub fn selected(&self, index: usize, animated: bool) -> bool {
        self.segmented.selected(index, animated)
    }

    pub fn tap_item(&self, index: usize) -> bool {
        self.segmented.tap(index)
    }

    pub fn set_title(&self, index: usize, title: impl Into<String>) {
        self.segmented.set_title(index, title);
    }

    pub fn set_badge(&self, index: usize, badge: Option<String>) {
        self.segmented.set_badge(index, badge);
    }

    /// Gesture arbitration. A nested page surface is judged by the paging
    /// rule; anything else by the outer surface's cooperation rule.
    pub fn should_recognize_simultaneously(
        &self,
        candidate: &Rc<ScrollSurface>,
        velocity: Vec2,
    ) -> bool {
        let own_page = self.page.upgrade().is_some_and(|p| p.is(candidate));
        if candidate.role() == SurfaceRole::Page && !own_page {
            return self.window.should_recognize_with_nested(candidate);
        }
        self.nested.should_recognize_simultaneously(candidate, velocity)
    }

    pub fn begin_drag(&self, surface: &ScrollSurface) {
        surface.begin_drag();
    }

    pub fn end_drag(&self, surface: &ScrollSurface, will_decelerate: bool) {
        surface.end_drag(will_decelerate);
        self.nested.end_drag(surface, will_decelerate);
        self.settle_if_page(surface);
    }

    pub fn end_deceleration(&self, surface: &ScrollSurface) {
        surface.end_deceleration();
        self.nested.end_deceleration(surface);
        self.settle_if_page(surface);
    }

    fn settle_if_page(&self, surface: &ScrollSurface) {
        if self.page.upgrade().is_some_and(|p| p.is(surface)) {
            self.segmented.end_episode();
        }
    }

    pub fn should_scroll_to_top(&self) -> bool {
        self.nested.should_scroll_to_top()
    }

    pub fn did_scroll_to_top(&self) {
        self.nested.did_scroll_to_top();
    }

    /// Advances programmatic scrolls to `now`. Returns true while any is running.
    pub fn tick(&self, now: Instant) -> bool {
        self.segmented.set_frame_time(now);
        let mut running = false;
        for surface in [&self.outer, &self.page, &self.bar] {
            if let Some(s) = surface.upgrade() {
                running |= s.tick(now);
            }
        }
        running
    }

    pub fn detach(&self) {
        self.nested.detach();
        self.window.detach();
        self.segmented.detach();
    }
}

impl Drop for SegmentController {
    fn drop(&mut self) {
        self.detach();
    }
}

fn upgrade(surface: &Weak<ScrollSurface>, name: &'static str) -> Result<Rc<ScrollSurface>> {
    surface.upgrade().ok_or(SegviewError::SurfaceDropped(name))
}
