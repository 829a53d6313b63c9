//! Per-item selection state and the title/badge measurements that size an
//! item in the index bar.

use segview_core::{BadgeStyle, ItemWidthPolicy, Rect, SegmentConfig, SelectionStyle, Size};
use unicode_segmentation::UnicodeSegmentation;

/// What an item shows. Badge text is opaque; `None`, `""` and `"0"` hide it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemContent {
    pub title: String,
    pub badge: Option<String>,
}

impl ItemContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            badge: None,
        }
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn visible_badge(&self) -> Option<&str> {
        match self.badge.as_deref() {
            None | Some("") | Some("0") => None,
            Some(b) => Some(b),
        }
    }
}

/// Text measurement supplied by the host's text stack.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size;
}

/// Estimate without a font: one advance per grapheme, full em for wide
/// (CJK, emoji) graphemes.
#[derive(Clone, Copy, Debug)]
pub struct GraphemeMeasure {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for GraphemeMeasure {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

fn is_wide(g: &str) -> bool {
    g.chars()
        .next()
        .map(|c| (c as u32) >= 0x2E80)
        .unwrap_or(false)
}

impl TextMeasure for GraphemeMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        let ems: f32 = text
            .graphemes(true)
            .map(|g| if is_wide(g) { 1.0 } else { self.advance })
            .sum();
        // whole pixels, like the platform's bounding rects
        Size::new(
            (ems * font_size).ceil(),
            (self.line_height * font_size).ceil(),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemState {
    pub index: usize,
    pub content: ItemContent,
    /// Continuous selection weight in `[0, 1]`.
    pub percent: f32,
    /// Sticky: set when `percent` reaches 1, cleared when it reaches 0.
    pub is_selected: bool,
    /// Frame in bar content coordinates.
    pub frame: Rect,
    /// Title frame relative to `frame`.
    pub title_frame: Rect,
    pub badge_frame: Option<Rect>,
    /// Title width at the selected scale.
    pub title_width: f32,
    badge_width: f32,
}

impl ItemState {
    pub fn new(
        index: usize,
        content: ItemContent,
        config: &SegmentConfig,
        measure: &dyn TextMeasure,
    ) -> Self {
        let mut item = Self {
            index,
            content,
            percent: 0.0,
            is_selected: false,
            frame: Rect::default(),
            title_frame: Rect::default(),
            badge_frame: None,
            title_width: 0.0,
            badge_width: 0.0,
        };
        item.measure(config, measure);
        item
    }

    pub fn set_percent(&mut self, percent: f32) {
        if percent == 1.0 {
            self.is_selected = true;
        } else if percent == 0.0 {
            self.is_selected = false;
        }
        self.percent = percent;
    }

    pub fn highlight(&self, style: SelectionStyle) -> f32 {
        match style {
            SelectionStyle::Gradient => self.percent,
            SelectionStyle::Mid => {
                if self.percent >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            SelectionStyle::TotalSelected => {
                if self.is_selected {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn title_scale(&self, config: &SegmentConfig) -> f32 {
        1.0 + (config.title_selected_scale - 1.0) * self.highlight(config.selection_style)
    }

    /// Title center in bar content coordinates.
    pub fn title_center_x(&self) -> f32 {
        self.frame.min_x() + self.title_frame.center().x
    }

    /// Re-measures title and badge. The caller re-lays out afterwards.
    pub fn measure(&mut self, config: &SegmentConfig, measure: &dyn TextMeasure) {
        let font = config.title_font_size * config.title_selected_scale;
        let title = measure.measure(&self.content.title, font);
        self.title_width = title.width;
        self.title_frame = Rect::new(0.0, 0.0, title.width, title.height);
        self.badge_width = match self.badge_size(config, measure) {
            Some(s) => s.width + config.badge.offset.x,
            None => 0.0,
        };
    }

    fn badge_size(&self, config: &SegmentConfig, measure: &dyn TextMeasure) -> Option<Size> {
        let text = self.content.visible_badge()?;
        Some(match config.badge.style {
            BadgeStyle::Dot { size } => size,
            BadgeStyle::Text => measure.measure(text, config.badge.font_size),
        })
    }

    pub fn item_width(&self, policy: ItemWidthPolicy) -> f32 {
        match policy {
            ItemWidthPolicy::EqualToTitleWidth { margin } => {
                self.title_width + self.badge_width + margin
            }
            ItemWidthPolicy::Stationary { width } => width,
        }
    }

    /// Places the title (and badge) inside an item of `self.frame`'s size.
    /// The title moves left only when that makes room for the badge.
    pub fn layout_content(&mut self, config: &SegmentConfig, measure: &dyn TextMeasure) {
        let w = self.frame.w;
        let h = self.frame.h;
        let tw = self.title_frame.w;
        let th = self.title_frame.h;
        let cy = h / 2.0 + config.title_center_offset_y;

        let badge = self.badge_size(config, measure);
        let cx = match badge {
            None => w / 2.0,
            Some(b) => {
                let badge_max = config.badge.offset.x + b.width;
                if (w - tw) / 2.0 > badge_max || w - badge_max - tw - 4.0 < 0.0 {
                    w / 2.0
                } else {
                    (w - badge_max - 4.0) / 2.0
                }
            }
        };
        self.title_frame = Rect::new(cx - tw / 2.0, cy - th / 2.0, tw, th);
        self.badge_frame = badge.map(|b| {
            let y = match config.badge.style {
                BadgeStyle::Dot { .. } => self.title_frame.y + config.badge.offset.y,
                BadgeStyle::Text => cy - b.height / 2.0,
            };
            Rect::new(self.title_frame.max_x() + config.badge.offset.x, y, b.width, b.height)
        });
    }
}
