#[cfg(test)]
mod tests {
    use crate::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use web_time::{Duration, Instant};

    #[test]
    fn test_lerp_clamps_percent() {
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(10.0, 20.0, -1.0), 10.0);
        assert_eq!(lerp(10.0, 20.0, 3.0), 20.0);
    }

    #[test]
    fn test_finite_or() {
        assert_eq!(finite_or(f32::NAN, 0.0), 0.0);
        assert_eq!(finite_or(f32::INFINITY, 1.0), 1.0);
        assert_eq!(finite_or(2.5, 0.0), 2.5);
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::new(40.0, 8.0, 20.0, 4.0);
        assert_eq!(r.min_x(), 40.0);
        assert_eq!(r.max_x(), 60.0);
        assert_eq!(r.center(), Vec2::new(50.0, 10.0));
        assert_eq!(r.size(), Size::new(20.0, 4.0));
    }

    #[test]
    fn test_animated_value_eases_to_target() {
        let start = Instant::now();
        let mut v = AnimatedValue::new(
            0.0f32,
            AnimationSpec::tween(Duration::from_millis(200), Easing::Linear),
        );
        v.set_target(100.0, start);
        assert!(v.update_at(start + Duration::from_millis(100)));
        assert!((v.get() - 50.0).abs() < 0.01);
        assert!(!v.update_at(start + Duration::from_millis(250)));
        assert_eq!(*v.get(), 100.0);
        assert!(!v.is_animating());
    }

    #[test]
    fn test_zero_duration_snaps() {
        let now = Instant::now();
        let mut v = AnimatedValue::new(
            Rect::default(),
            AnimationSpec::tween(Duration::ZERO, Easing::EaseOut),
        );
        v.set_target(Rect::new(1.0, 2.0, 3.0, 4.0), now);
        assert!(!v.update_at(now));
        assert_eq!(*v.get(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_handler_write_back_reaches_other_observers() {
        let outer = ScrollSurface::new(SurfaceRole::Outer);
        let guard = Rc::new(SuppressGuard::default());
        let log = Rc::new(RefCell::new(Vec::new()));

        let _clamp = {
            let guard = guard.clone();
            outer.observe(move |s, c| {
                if guard.is_suppressed() {
                    return;
                }
                if c.new.y > 0.0 {
                    guard.write(s, Vec2::ZERO);
                }
            })
        };
        let _watch = {
            let log = log.clone();
            outer.observe(move |_, c| log.borrow_mut().push(c.new.y))
        };

        outer.set_offset(Vec2::new(0.0, 30.0));
        assert_eq!(outer.offset().y, 0.0);
        // the watcher sees the clamp first (nested), then the triggering change
        assert_eq!(*log.borrow(), vec![0.0, 30.0]);
    }

    #[test]
    fn test_observer_may_cancel_itself() {
        let s = ScrollSurface::new(SurfaceRole::Inner);
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sub = {
            let hits = hits.clone();
            let slot = slot.clone();
            s.observe(move |_, _| {
                hits.set(hits.get() + 1);
                if let Some(sub) = slot.borrow().as_ref() {
                    sub.cancel();
                }
            })
        };
        *slot.borrow_mut() = Some(sub);
        s.set_offset(Vec2::new(0.0, 1.0));
        s.set_offset(Vec2::new(0.0, 2.0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_subscription_outlives_surface() {
        let s = ScrollSurface::new(SurfaceRole::Page);
        let sub = s.observe(|_, _| {});
        drop(s);
        sub.cancel();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_surface_ids_are_distinct() {
        let a = ScrollSurface::new(SurfaceRole::Page);
        let b = ScrollSurface::new(SurfaceRole::Page);
        assert!(a.is(&a));
        assert!(!a.is(&b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_config_header_height() {
        let mut config = SegmentConfig::default();
        assert_eq!(config.header_height(), 0.0);
        config.header = Some(HeaderConfig { height: 180.0 });
        assert_eq!(config.header_height(), 180.0);
    }
}
