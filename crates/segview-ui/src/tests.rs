#[cfg(test)]
mod tests {
    use crate::*;
    use segview_core::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use web_time::{Duration, Instant};

    /// 10px per char, whatever the font size.
    struct Fixed;
    impl TextMeasure for Fixed {
        fn measure(&self, text: &str, _font_size: f32) -> Size {
            Size::new(text.chars().count() as f32 * 10.0, 14.0)
        }
    }

    struct Harness {
        page: Rc<ScrollSurface>,
        bar: Rc<ScrollSurface>,
        sink: Rc<RecordingSink>,
        window: Rc<PageWindow>,
        seg: Rc<SegmentedIndexCoordinator>,
    }

    fn config() -> SegmentConfig {
        SegmentConfig {
            item_width: ItemWidthPolicy::EqualToTitleWidth { margin: 0.0 },
            ..SegmentConfig::default()
        }
    }

    fn harness_with(titles: &[&str], config: SegmentConfig) -> Harness {
        let _ = env_logger::builder().is_test(true).try_init();
        let page = ScrollSurface::with_geometry(SurfaceRole::Page, Size::new(100.0, 500.0), Size::ZERO);
        let bar = ScrollSurface::with_geometry(SurfaceRole::IndexBar, Size::new(120.0, 40.0), Size::ZERO);
        let sink = Rc::new(RecordingSink::new());
        let config = Rc::new(config);
        let window = PageWindow::attach(&page, config.preload, sink.clone());
        window.reload(titles.len());
        let seg = SegmentedIndexCoordinator::attach(&page, &bar, config.clone(), sink.clone(), Rc::new(Fixed));
        let contents = titles.iter().map(|t| ItemContent::new(*t)).collect();
        seg.reload_with(contents, config.default_selected_index);
        Harness {
            page,
            bar,
            sink,
            window,
            seg,
        }
    }

    fn harness() -> Harness {
        harness_with(&["abcd", "abcde", "abcdef"], config())
    }

    fn drag(h: &Harness, xs: impl IntoIterator<Item = f32>) {
        h.page.begin_drag();
        for x in xs {
            h.page.set_offset(Vec2::new(x, 0.0));
        }
        h.page.end_drag(false);
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_item_origins_follow_widths() {
        let h = harness();
        let xs: Vec<f32> = (0..3).map(|i| h.seg.item(i).unwrap().frame.x).collect();
        assert_eq!(xs, vec![0.0, 40.0, 90.0]);
        assert_eq!(h.bar.content_size(), Size::new(150.0, 40.0));
    }

    #[test]
    fn test_item_frames_snapshot() {
        let h = harness();
        let frames: Vec<Rect> = (0..3).map(|i| h.seg.item(i).unwrap().frame).collect();
        insta::assert_debug_snapshot!(frames, @r"
        [
            Rect {
                x: 0.0,
                y: 0.0,
                w: 40.0,
                h: 40.0,
            },
            Rect {
                x: 40.0,
                y: 0.0,
                w: 50.0,
                h: 40.0,
            },
            Rect {
                x: 90.0,
                y: 0.0,
                w: 60.0,
                h: 40.0,
            },
        ]
        ");
    }

    #[test]
    fn test_drag_to_45_straddles_first_pair() {
        let h = harness();
        drag(&h, [45.0]);
        assert_eq!(visible_range(45.0, 100.0, 3), (0, 1));
        let c = h.seg.cursor();
        assert_eq!((c.left, c.right), (0, 1));
        let p = h.seg.percents();
        assert!(close(p[0], 0.55) && close(p[1], 0.45), "{p:?}");
        assert!(close(p[0] + p[1], 1.0));
        assert_eq!(h.seg.current_index(), 0);
        assert_eq!(h.window.materialized().as_slice(), &[0, 1]);
    }

    #[test]
    fn test_reload_selects_default() {
        let h = harness_with(
            &["abcd", "abcde", "abcdef"],
            SegmentConfig {
                default_selected_index: 1,
                ..config()
            },
        );
        assert_eq!(h.seg.percents(), vec![0.0, 1.0, 0.0]);
        assert_eq!(h.page.offset().x, 100.0);
        assert_eq!(h.seg.current_index(), 1);
        assert!(close(h.seg.total_percent(), 1.0 / 3.0));
        assert_eq!(h.window.materialized().as_slice(), &[1]);
    }

    #[test]
    fn test_out_of_range_default_is_clamped() {
        let h = harness_with(
            &["a", "b"],
            SegmentConfig {
                default_selected_index: 7,
                ..config()
            },
        );
        assert_eq!(h.seg.current_index(), 1);
        assert_eq!(h.page.offset().x, 100.0);
    }

    #[test]
    fn test_selected_is_idempotent() {
        let h = harness();
        assert!(h.seg.selected(2, false));
        let events = h.sink.take();
        assert!(!events.is_empty());
        assert!(!h.seg.selected(2, false));
        assert!(h.sink.take().is_empty());
        assert!(!h.seg.selected(3, false));
        assert_eq!(h.seg.current_index(), 2);
        assert_eq!(h.page.offset().x, 200.0);
    }

    #[test]
    fn test_drag_and_taps_reach_the_same_state() {
        let dragged = harness();
        let forward = (0..=20).map(|i| i as f32 * 10.0);
        let back = (0..=20).rev().map(|i| i as f32 * 10.0);
        drag(&dragged, forward.chain(back));
        dragged.bar.finish_animation();

        let tapped = harness();
        tapped.seg.selected(0, false);
        tapped.seg.selected(2, false);
        tapped.seg.selected(0, false);

        assert_eq!(dragged.seg.current_index(), tapped.seg.current_index());
        assert_eq!(dragged.seg.percents(), tapped.seg.percents());
        assert_eq!(dragged.seg.indicator_frame(), tapped.seg.indicator_frame());
        assert_eq!(dragged.bar.offset(), tapped.bar.offset());
        for i in 0..3 {
            assert_eq!(
                dragged.seg.item(i).unwrap().is_selected,
                tapped.seg.item(i).unwrap().is_selected
            );
        }
    }

    #[test]
    fn test_neighbour_tap_animates_the_page() {
        let h = harness();
        h.sink.take();
        assert!(h.seg.tap(1));
        assert!(h.page.is_animating());
        assert_eq!(h.page.animation_target(), Some(Vec2::new(100.0, 0.0)));
        assert!(h.sink.events().contains(&LeafEvent::Indicator(h.seg.indicator_frame(), true)));

        // animation frames are not drags
        let later = Instant::now() + Duration::from_secs(1);
        while h.page.tick(later) {}
        h.bar.finish_animation();
        assert_eq!(h.page.offset().x, 100.0);
        assert_eq!(h.seg.percents(), vec![0.0, 1.0, 0.0]);
        assert_eq!(h.window.materialized().as_slice(), &[1]);
    }

    #[test]
    fn test_distant_tap_jumps() {
        let h = harness();
        assert!(h.seg.tap(2));
        assert!(!h.page.is_animating());
        assert_eq!(h.page.offset().x, 200.0);
    }

    #[test]
    fn test_veto_cancels_tap() {
        let h = harness();
        let taps = Rc::new(RefCell::new(Vec::new()));
        {
            let taps = taps.clone();
            h.seg.set_handlers(SegmentHandlers {
                should_change: Some(Rc::new(|_: usize, dest: usize| dest != 2)),
                on_tap: Some(Rc::new(move |s: usize, d: usize| taps.borrow_mut().push((s, d)))),
                ..Default::default()
            });
        }
        assert!(!h.seg.tap(2));
        assert_eq!(h.seg.current_index(), 0);
        assert!(h.seg.tap(1));
        assert!(!h.seg.tap(1));
        assert_eq!(*taps.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_drag_notifications() {
        let h = harness();
        let selects = Rc::new(RefCell::new(Vec::new()));
        let scrolls = Rc::new(RefCell::new(0));
        {
            let selects = selects.clone();
            let scrolls = scrolls.clone();
            h.seg.set_handlers(SegmentHandlers {
                on_drag_select: Some(Rc::new(move |i: usize| selects.borrow_mut().push(i))),
                on_drag_scroll: Some(Rc::new(move |_: usize, _: usize| *scrolls.borrow_mut() += 1)),
                ..Default::default()
            });
        }
        drag(&h, (0..=10).map(|i| i as f32 * 10.0));
        assert_eq!(*selects.borrow(), vec![1]);
        assert_eq!(*scrolls.borrow(), 10);
    }

    #[test]
    fn test_handler_may_select_during_drag() {
        let h = harness();
        {
            let seg = Rc::downgrade(&h.seg);
            h.seg.set_handlers(SegmentHandlers {
                on_drag_select: Some(Rc::new(move |i: usize| {
                    if let Some(seg) = seg.upgrade() {
                        seg.selected(i + 1, false);
                    }
                })),
                ..Default::default()
            });
        }
        drag(&h, [60.0]);
        assert_eq!(h.seg.current_index(), 2);
        // the drag frame queued before the handler ran must not win
        assert_eq!(h.sink.last_indicator(), Some(h.seg.indicator_frame()));
        let item = h.seg.item(2).unwrap();
        assert_eq!(h.seg.indicator_frame().center().x, item.title_center_x());
    }

    #[test]
    fn test_overscroll_past_the_end_snaps_the_edge_item() {
        let h = harness();
        drag(&h, [150.0, 250.0]);
        assert_eq!(h.seg.percents(), vec![0.0, 0.5, 1.0]);
        let c = h.seg.cursor();
        assert_eq!((c.left, c.right, c.current), (1, 2, 2));
        let item = h.seg.item(2).unwrap();
        assert_eq!(h.seg.indicator_frame().center().x, item.title_center_x());
    }

    #[test]
    fn test_programmatic_offsets_are_ignored() {
        let h = harness();
        h.page.set_offset(Vec2::new(150.0, 0.0));
        assert_eq!(h.seg.percents(), vec![1.0, 0.0, 0.0]);
        assert_eq!(h.seg.current_index(), 0);
        assert!(close(h.seg.total_percent(), 250.0 / 300.0));
    }

    #[test]
    fn test_drag_end_settles_on_the_nearest_page() {
        let h = harness();
        h.page.begin_drag();
        h.page.set_offset(Vec2::new(150.0, 0.0));
        assert_eq!(h.seg.percents(), vec![0.0, 0.5, 0.5]);
        h.page.end_drag(false);
        h.seg.end_episode();
        // the host finishes the page snap without a drag
        h.page.set_offset(Vec2::new(200.0, 0.0));
        assert_eq!(h.seg.percents(), vec![0.0, 0.0, 1.0]);
        let c = h.seg.cursor();
        assert_eq!((c.left, c.right, c.current), (2, 2, 2));
        let item = h.seg.item(2).unwrap();
        assert_eq!(h.seg.indicator_frame().center().x, item.title_center_x());
        assert_eq!(h.sink.last_indicator(), Some(h.seg.indicator_frame()));
    }

    #[test]
    fn test_episode_stays_open_while_decelerating() {
        let h = harness();
        h.page.begin_drag();
        h.page.set_offset(Vec2::new(40.0, 0.0));
        h.page.end_drag(true);
        h.seg.end_episode();
        assert_eq!(h.seg.cursor().right, 1);
        assert!(close(h.seg.percents()[1], 0.4));

        h.page.set_offset(Vec2::new(30.0, 0.0));
        assert!(close(h.seg.percents()[1], 0.3));
        h.page.end_deceleration();
        h.seg.end_episode();
        assert_eq!(h.seg.percents(), vec![1.0, 0.0, 0.0]);
        assert_eq!(h.seg.cursor(), SelectionCursor::default());
    }

    #[test]
    fn test_settling_past_half_reports_the_new_selection() {
        let h = harness();
        let selects = Rc::new(RefCell::new(Vec::new()));
        {
            let selects = selects.clone();
            h.seg.set_handlers(SegmentHandlers {
                on_drag_select: Some(Rc::new(move |i: usize| selects.borrow_mut().push(i))),
                ..Default::default()
            });
        }
        drag(&h, [40.0, 60.0]);
        assert_eq!(h.seg.current_index(), 0);
        assert!(selects.borrow().is_empty());

        h.seg.end_episode();
        assert_eq!(h.seg.current_index(), 1);
        assert_eq!(h.seg.percents(), vec![0.0, 1.0, 0.0]);
        assert_eq!(*selects.borrow(), vec![1]);

        // already at rest
        h.seg.end_episode();
        assert_eq!(*selects.borrow(), vec![1]);
    }

    #[test]
    fn test_degenerate_page_geometry_keeps_selection() {
        let h = harness();
        h.page.set_viewport(Size::new(0.0, 500.0));
        drag(&h, [45.0]);
        assert_eq!(h.seg.percents(), vec![1.0, 0.0, 0.0]);
        assert_eq!(h.seg.cursor(), SelectionCursor::default());
        assert!(h.seg.total_percent().is_finite());

        h.page.set_viewport(Size::new(100.0, 500.0));
        h.page.set_content_size(Size::ZERO);
        drag(&h, [60.0]);
        assert_eq!(h.seg.percents(), vec![1.0, 0.0, 0.0]);
        assert_eq!(h.seg.current_index(), 0);
        assert_eq!(h.seg.total_percent(), 0.0);
    }

    #[test]
    fn test_total_percent_follows_own_page_writes() {
        let h = harness();
        assert!(close(h.seg.total_percent(), 1.0 / 3.0));
        assert!(h.seg.tap(2));
        assert!(close(h.seg.total_percent(), 1.0));
        assert!(h.seg.tap(1));
        let later = Instant::now() + Duration::from_secs(1);
        while h.page.tick(later) {}
        assert!(close(h.seg.total_percent(), 2.0 / 3.0));
    }

    #[test]
    fn test_title_change_relayouts() {
        let h = harness();
        h.seg.set_title(0, "abcdefgh");
        assert_eq!(h.seg.item(1).unwrap().frame.x, 80.0);
        assert_eq!(h.bar.content_size().width, 190.0);
        assert_eq!(h.sink.last_indicator(), Some(h.seg.indicator_frame()));
        assert_eq!(h.seg.indicator_frame().w, 80.0);
    }

    #[test]
    fn test_badge_widens_item() {
        let h = harness_with(
            &["abcd", "abcde"],
            SegmentConfig {
                badge: BadgeConfig {
                    style: BadgeStyle::Text,
                    ..BadgeConfig::default()
                },
                ..config()
            },
        );
        h.seg.set_badge(0, Some("99".into()));
        assert_eq!(h.seg.item(0).unwrap().frame.w, 60.0);
        assert_eq!(h.seg.item(1).unwrap().frame.x, 60.0);
        h.seg.set_badge(0, Some("0".into()));
        assert_eq!(h.seg.item(0).unwrap().frame.w, 40.0);
    }

    #[test]
    fn test_bar_recenters_within_bounds() {
        let h = harness();
        h.seg.selected(2, false);
        // center 120 - 60, capped at 150 - 120
        assert_eq!(h.bar.offset().x, 30.0);
        h.seg.selected(1, false);
        assert_eq!(h.bar.offset().x, 5.0);
    }

    #[test]
    fn test_highlight_follows_selection_style() {
        let h = harness_with(
            &["abcd", "abcde", "abcdef"],
            SegmentConfig {
                selection_style: SelectionStyle::Mid,
                ..config()
            },
        );
        drag(&h, [60.0]);
        assert_eq!(h.sink.last_highlight(0), Some(0.0));
        assert_eq!(h.sink.last_highlight(1), Some(1.0));
    }

    #[test]
    fn test_drop_detaches_page_observer() {
        let h = harness();
        assert_eq!(h.page.observer_count(), 2);
        let Harness { page, seg, window, .. } = h;
        drop(seg);
        assert_eq!(page.observer_count(), 1);
        drop(window);
        assert_eq!(page.observer_count(), 0);
    }
}
