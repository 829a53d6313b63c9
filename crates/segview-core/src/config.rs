//! # Configuration
//!
//! `SegmentConfig` is the policy bag shared (read-only) by every coordinator.
//! It is built once per session, either in code:
//!
//! ```rust
//! use segview_core::*;
//!
//! let config = SegmentConfig {
//!     refresh_type: RefreshType::Container,
//!     minimum_height: 64.0,
//!     header: Some(HeaderConfig { height: 200.0 }),
//!     ..SegmentConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! or from JSON, where every omitted field keeps its default:
//!
//! ```rust
//! use segview_core::*;
//!
//! let config = SegmentConfig::from_json(r#"{ "item_spacing": 8.0 }"#).unwrap();
//! assert_eq!(config.item_spacing, 8.0);
//! assert_eq!(config.segment_height, 50.0);
//! ```
//!
//! Refresh type and minimum height define the vertical clamping envelope of
//! the outer surface. Nothing reads them mutably after construction.

use serde::{Deserialize, Serialize};

use crate::{EdgeInsets, Rect, Size, SegviewError, Vec2};

/// Which surface owns pull-to-refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshType {
    /// The whole container is pulled down.
    Container,
    /// The inner list is pulled down.
    #[default]
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub height: f32,
}

/// Pages materialized before/after the visible window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadRange {
    pub back: usize,
    pub forward: usize,
}

/// Where the index bar sits relative to the pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SegmentPosition {
    /// Hosted in a navigation bar of `bar_height`; `size` is the bar's own size.
    Nav { size: Size, bar_height: f32 },
    #[default]
    Top,
    Bottom,
    /// Host-chosen frames for the outer surface, the bar and the pages.
    Custom {
        container: Rect,
        bar: Rect,
        pages: Rect,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ItemWidthPolicy {
    /// Title width (at selected scale) plus badge plus `margin`.
    EqualToTitleWidth { margin: f32 },
    Stationary { width: f32 },
}

impl Default for ItemWidthPolicy {
    fn default() -> Self {
        ItemWidthPolicy::EqualToTitleWidth { margin: 10.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndicatorWidthPolicy {
    /// Interpolates between the two titles' widths, minus `2 * margin`.
    EqualToItemWidth { margin: f32 },
    /// Stretches mid-transition; `change_width` damps the stretch.
    ScaleChange { base_width: f32, change_width: f32 },
    Stationary { width: f32 },
}

impl Default for IndicatorWidthPolicy {
    fn default() -> Self {
        IndicatorWidthPolicy::Stationary { width: 10.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndicatorPosition {
    Center,
    Top { margin: f32 },
    Bottom { margin: f32 },
}

impl Default for IndicatorPosition {
    fn default() -> Self {
        IndicatorPosition::Bottom { margin: 0.0 }
    }
}

/// Indicator shape. Only its geometry matters here; the host draws it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndicatorShape {
    /// Uses the standalone width policy and position; `height` is host-chosen.
    Custom { height: f32 },
    Triangle { size: Size },
    Ellipse {
        width: IndicatorWidthPolicy,
        height: f32,
    },
    CrossBar {
        width: IndicatorWidthPolicy,
        height: f32,
    },
    /// Fills the bar height behind the selected title.
    Background,
}

impl Default for IndicatorShape {
    fn default() -> Self {
        IndicatorShape::CrossBar {
            width: IndicatorWidthPolicy::EqualToItemWidth { margin: 0.0 },
            height: 3.0,
        }
    }
}

/// How an item's raw percent becomes a highlight amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStyle {
    /// Flips at 0.5.
    Mid,
    #[default]
    Gradient,
    /// Flips only once fully selected/deselected.
    TotalSelected,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BadgeStyle {
    Dot { size: Size },
    /// Badge text rendered as given, measured like a title.
    Text,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        BadgeStyle::Dot {
            size: Size::new(5.0, 5.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub style: BadgeStyle,
    pub font_size: f32,
    /// Offset from the title's top-right corner.
    pub offset: Vec2,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            style: BadgeStyle::default(),
            font_size: 12.0,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    // Pages
    pub preload: PreloadRange,

    // Outer surface
    pub refresh_type: RefreshType,
    pub header: Option<HeaderConfig>,
    /// Height that stays visible once the header has collapsed (e.g. nav + status bar).
    pub minimum_height: f32,

    // Bar
    pub position: SegmentPosition,
    pub segment_height: f32,
    /// `None` spans the viewport width.
    pub segment_width: Option<f32>,

    // Items
    pub item_spacing: f32,
    pub default_selected_index: usize,
    pub item_content_inset: EdgeInsets,
    pub item_width: ItemWidthPolicy,
    pub title_font_size: f32,
    pub title_selected_scale: f32,
    pub title_center_offset_y: f32,
    pub selection_style: SelectionStyle,
    pub badge: BadgeConfig,

    // Indicator
    pub indicator_position: IndicatorPosition,
    pub indicator_width: IndicatorWidthPolicy,
    pub indicator_shape: IndicatorShape,
    pub indicator_animation_ms: u64,

    /// Whether taps animate the pages, bar, and indicator.
    pub tap_animation: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            preload: PreloadRange::default(),
            refresh_type: RefreshType::List,
            header: None,
            minimum_height: 0.0,
            position: SegmentPosition::Top,
            segment_height: 50.0,
            segment_width: None,
            item_spacing: 0.0,
            default_selected_index: 0,
            item_content_inset: EdgeInsets::ZERO,
            item_width: ItemWidthPolicy::default(),
            title_font_size: 12.0,
            title_selected_scale: 1.2,
            title_center_offset_y: 0.0,
            selection_style: SelectionStyle::Gradient,
            badge: BadgeConfig::default(),
            indicator_position: IndicatorPosition::default(),
            indicator_width: IndicatorWidthPolicy::default(),
            indicator_shape: IndicatorShape::default(),
            indicator_animation_ms: 250,
            tap_animation: true,
        }
    }
}

fn check(field: &'static str, v: f32, allow_negative: bool) -> Result<(), SegviewError> {
    if !v.is_finite() {
        return Err(SegviewError::InvalidConfig {
            field,
            reason: "must be finite",
        });
    }
    if !allow_negative && v < 0.0 {
        return Err(SegviewError::InvalidConfig {
            field,
            reason: "must not be negative",
        });
    }
    Ok(())
}

fn check_width_policy(field: &'static str, p: &IndicatorWidthPolicy) -> Result<(), SegviewError> {
    match *p {
        IndicatorWidthPolicy::EqualToItemWidth { margin } => check(field, margin, true),
        IndicatorWidthPolicy::ScaleChange {
            base_width,
            change_width,
        } => {
            check(field, base_width, false)?;
            check(field, change_width, true)
        }
        IndicatorWidthPolicy::Stationary { width } => check(field, width, false),
    }
}

impl SegmentConfig {
    /// Parses JSON over the defaults, then validates.
    pub fn from_json(json: &str) -> Result<Self, SegviewError> {
        let config: SegmentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }

    pub fn validate(&self) -> Result<(), SegviewError> {
        check("minimum_height", self.minimum_height, false)?;
        check("segment_height", self.segment_height, false)?;
        if let Some(w) = self.segment_width {
            check("segment_width", w, false)?;
        }
        if let Some(h) = &self.header {
            check("header.height", h.height, false)?;
        }
        check("item_spacing", self.item_spacing, true)?;
        check("title_center_offset_y", self.title_center_offset_y, true)?;
        if !(self.title_font_size.is_finite() && self.title_font_size > 0.0) {
            return Err(SegviewError::InvalidConfig {
                field: "title_font_size",
                reason: "must be positive",
            });
        }
        if !(self.title_selected_scale.is_finite() && self.title_selected_scale >= 1.0) {
            return Err(SegviewError::InvalidConfig {
                field: "title_selected_scale",
                reason: "must be at least 1",
            });
        }
        match self.item_width {
            ItemWidthPolicy::EqualToTitleWidth { margin } => check("item_width", margin, true)?,
            ItemWidthPolicy::Stationary { width } => check("item_width", width, false)?,
        }
        check_width_policy("indicator_width", &self.indicator_width)?;
        match &self.indicator_shape {
            IndicatorShape::Ellipse { width, height } | IndicatorShape::CrossBar { width, height } => {
                check_width_policy("indicator_shape", width)?;
                check("indicator_shape", *height, false)?;
            }
            IndicatorShape::Triangle { size } => {
                check("indicator_shape", size.width, false)?;
                check("indicator_shape", size.height, false)?;
            }
            IndicatorShape::Custom { height } => check("indicator_shape", *height, false)?,
            IndicatorShape::Background => {}
        }
        Ok(())
    }

    /// Top inset of the outer surface: the header height, if any.
    pub fn header_height(&self) -> f32 {
        self.header.map(|h| h.height).unwrap_or(0.0)
    }
}
