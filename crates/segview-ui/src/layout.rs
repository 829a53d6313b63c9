//! Frames of the outer surface, the index bar and the page surface for a
//! given screen size.

use segview_core::{Rect, SegmentConfig, SegmentPosition, Size};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutPlan {
    /// Outer surface frame in screen coordinates.
    pub outer: Rect,
    pub outer_content: Size,
    /// Bar frame, in outer content coordinates unless `bar_in_nav`.
    pub bar: Rect,
    pub pages: Rect,
    /// The host mounts the bar in its navigation bar.
    pub bar_in_nav: bool,
}

pub fn plan(config: &SegmentConfig, screen: Size) -> LayoutPlan {
    let w = screen.width;
    let h = screen.height;
    let min_h = config.minimum_height;
    let seg_h = config.segment_height;
    let seg_w = config.segment_width.unwrap_or(w);
    let outer = Rect::new(0.0, 0.0, w, h);
    let outer_content = Size::new(w, (h - min_h).max(0.0));

    match config.position {
        SegmentPosition::Nav { size, bar_height } => LayoutPlan {
            outer,
            outer_content,
            bar: Rect::new(0.0, 0.0, size.width, size.height),
            pages: Rect::new(0.0, bar_height, w, (h - min_h - bar_height).max(0.0)),
            bar_in_nav: true,
        },
        SegmentPosition::Top => LayoutPlan {
            outer,
            outer_content,
            bar: Rect::new(0.0, 0.0, seg_w, seg_h),
            pages: Rect::new(0.0, seg_h, w, (h - min_h - seg_h).max(0.0)),
            bar_in_nav: false,
        },
        SegmentPosition::Bottom => {
            let pages_h = (h - min_h - seg_h).max(0.0);
            LayoutPlan {
                outer,
                outer_content,
                bar: Rect::new(0.0, pages_h, seg_w, seg_h),
                pages: Rect::new(0.0, 0.0, w, pages_h),
                bar_in_nav: false,
            }
        }
        SegmentPosition::Custom {
            container,
            bar,
            pages,
        } => LayoutPlan {
            outer: container,
            outer_content: Size::new(w, bar.h + pages.h),
            bar,
            pages,
            bar_in_nav: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_bar_over_pages() {
        let config = SegmentConfig {
            minimum_height: 64.0,
            ..SegmentConfig::default()
        };
        let p = plan(&config, Size::new(375.0, 800.0));
        assert_eq!(p.bar, Rect::new(0.0, 0.0, 375.0, 50.0));
        assert_eq!(p.pages, Rect::new(0.0, 50.0, 375.0, 686.0));
        assert_eq!(p.outer_content, Size::new(375.0, 736.0));
    }

    #[test]
    fn bottom_bar_under_pages() {
        let config = SegmentConfig {
            position: SegmentPosition::Bottom,
            segment_width: Some(200.0),
            ..SegmentConfig::default()
        };
        let p = plan(&config, Size::new(375.0, 800.0));
        assert_eq!(p.pages, Rect::new(0.0, 0.0, 375.0, 750.0));
        assert_eq!(p.bar, Rect::new(0.0, 750.0, 200.0, 50.0));
    }

    #[test]
    fn nav_bar_hosts_the_bar() {
        let config = SegmentConfig {
            position: SegmentPosition::Nav {
                size: Size::new(200.0, 44.0),
                bar_height: 88.0,
            },
            ..SegmentConfig::default()
        };
        let p = plan(&config, Size::new(375.0, 800.0));
        assert!(p.bar_in_nav);
        assert_eq!(p.pages, Rect::new(0.0, 88.0, 375.0, 712.0));
    }

    #[test]
    fn custom_frames_pass_through() {
        let bar = Rect::new(0.0, 10.0, 300.0, 40.0);
        let pages = Rect::new(0.0, 50.0, 300.0, 500.0);
        let container = Rect::new(0.0, 0.0, 300.0, 550.0);
        let config = SegmentConfig {
            position: SegmentPosition::Custom {
                container,
                bar,
                pages,
            },
            ..SegmentConfig::default()
        };
        let p = plan(&config, Size::new(375.0, 800.0));
        assert_eq!((p.outer, p.bar, p.pages), (container, bar, pages));
        assert_eq!(p.outer_content, Size::new(375.0, 540.0));
    }
}
