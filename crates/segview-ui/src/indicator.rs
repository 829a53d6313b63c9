//! Indicator geometry: pure functions of the straddling item pair.
//!
//! The center always interpolates between the two title centers by the right
//! item's percent; the width follows the configured policy.

use segview_core::{
    IndicatorPosition, IndicatorShape, IndicatorWidthPolicy, Rect, SegmentConfig, lerp,
};

use crate::item::ItemState;

/// Width policy and height after resolving the configured shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorStyle {
    pub width: IndicatorWidthPolicy,
    pub height: f32,
    pub position: IndicatorPosition,
}

impl IndicatorStyle {
    /// Shapes that carry their own width policy override the standalone one.
    /// The vertical position is always the configured one.
    pub fn resolve(config: &SegmentConfig, bar_height: f32) -> Self {
        let (width, height) = match config.indicator_shape {
            IndicatorShape::Custom { height } => (config.indicator_width, height),
            IndicatorShape::Triangle { size } => {
                (IndicatorWidthPolicy::Stationary { width: size.width }, size.height)
            }
            IndicatorShape::Ellipse { width, height } => (width, height),
            IndicatorShape::CrossBar { width, height } => (width, height),
            IndicatorShape::Background => (config.indicator_width, bar_height),
        };
        Self {
            width,
            height,
            position: config.indicator_position,
        }
    }
}

pub fn center_x(left: &ItemState, right: &ItemState) -> f32 {
    lerp(left.title_center_x(), right.title_center_x(), right.percent)
}

pub fn width(policy: IndicatorWidthPolicy, left: &ItemState, right: &ItemState) -> f32 {
    let w = match policy {
        IndicatorWidthPolicy::EqualToItemWidth { margin } => {
            lerp(left.title_width, right.title_width, right.percent) - 2.0 * margin
        }
        IndicatorWidthPolicy::ScaleChange {
            base_width,
            change_width,
        } => {
            // 0 at rest, 1 halfway
            let stretch = 1.0 - (0.5 - left.percent).abs() * 2.0;
            let span = right.frame.center().x - left.frame.center().x;
            stretch * (span - change_width) + base_width
        }
        IndicatorWidthPolicy::Stationary { width } => width,
    };
    w.max(0.0)
}

pub fn frame(style: &IndicatorStyle, bar_height: f32, left: &ItemState, right: &ItemState) -> Rect {
    let w = width(style.width, left, right);
    let h = style.height;
    let y = match style.position {
        IndicatorPosition::Top { margin } => margin,
        IndicatorPosition::Center => (bar_height - h) / 2.0,
        IndicatorPosition::Bottom { margin } => bar_height - margin - h,
    };
    Rect::new(center_x(left, right) - w / 2.0, y, w, h)
}
