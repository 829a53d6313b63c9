use std::rc::Rc;

use anyhow::Context;
use segview_controller::*;
use segview_core::*;
use segview_ui::*;
use web_time::{Duration, Instant};

/// Prints what a real host would mount.
struct LogSink;

impl LeafSink for LogSink {
    fn clear_items(&self) {
        log::info!("bar: clear items");
    }

    fn place_item(&self, index: usize, frame: ItemFrame) {
        log::info!("bar: item {index} at {:?}", frame.frame);
    }

    fn item_highlight(&self, index: usize, highlight: f32, title_scale: f32) {
        log::debug!("bar: item {index} highlight {highlight:.2} scale {title_scale:.2}");
    }

    fn place_indicator(&self, frame: Rect, animation: Option<AnimationSpec>) {
        match animation {
            Some(a) => log::info!("indicator -> {frame:?} over {:?}", a.duration),
            None => log::debug!("indicator at {frame:?}"),
        }
    }

    fn place_header(&self, frame: Rect) {
        log::info!("header at {frame:?}");
    }

    fn materialize_page(&self, index: usize, frame: Rect) {
        log::info!("page {index} materialized at {frame:?}");
    }

    fn release_page(&self, index: usize) {
        log::info!("page {index} released");
    }
}

const CONFIG: &str = r#"{
    "refresh_type": "Container",
    "header": { "height": 180.0 },
    "minimum_height": 64.0,
    "default_selected_index": 1,
    "preload": { "back": 0, "forward": 1 }
}"#;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting segmented drag replay");

    let surfaces = Surfaces::new();
    let controller = SegmentController::from_json(CONFIG, &surfaces, Rc::new(LogSink))
        .context("loading replay config")?;
    controller.set_handlers(Handlers {
        on_drag_select: Some(Rc::new(|i: usize| log::info!("drag selected {i}"))),
        on_tap: Some(Rc::new(|s: usize, d: usize| log::info!("tap {s} -> {d}"))),
        on_min_height_progress: Some(Rc::new(|p: f32| log::info!("header collapse {p:.2}"))),
        ..Default::default()
    });

    let screen = Size::new(390.0, 844.0);
    controller.layout(screen)?;
    let titles = ["Following", "For you", "Live", "Music", "Sports", "Gaming"];
    controller.set_items(titles.iter().map(|t| ItemContent::new(*t)).collect())?;

    // collapse the header
    controller.begin_drag(&surfaces.outer);
    for y in (0..=6).map(|i| -180.0 + i as f32 * 20.0) {
        surfaces.outer.set_offset(Vec2::new(0.0, y));
    }
    controller.end_drag(&surfaces.outer, false);

    // swipe two pages to the right
    let w = surfaces.page.viewport().width;
    let start = surfaces.page.offset().x;
    controller.begin_drag(&surfaces.page);
    for step in 1..=20 {
        surfaces.page.set_offset(Vec2::new(start + step as f32 * w / 10.0, 0.0));
    }
    controller.end_drag(&surfaces.page, false);
    log::info!("after swipe: current {}", controller.current_index());

    // tap back to the neighbour and run the animation to completion
    let mut now = Instant::now();
    controller.tick(now);
    controller.tap_item(controller.current_index().saturating_sub(1));
    while controller.tick(now) {
        now += Duration::from_millis(16);
    }

    controller.set_badge(4, Some("12".into()));
    log::info!(
        "done: current {}, page x {}, materialized {:?}",
        controller.current_index(),
        surfaces.page.offset().x,
        controller.page_window().materialized()
    );
    Ok(())
}
