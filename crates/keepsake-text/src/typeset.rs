#![forbid(unsafe_code)]

//! Adaptive tribute typesetting.
//!
//! A tribute panel stacks a header (name, dates, rule), a body (the poem or
//! letter), and a footer (rule, nickname, family line) inside a box of fixed
//! height. The engine decides how much whitespace and how large a body font
//! the box can afford, then places every line.
//!
//! # Fallback policy
//!
//! Whitespace shrinks before type does:
//!
//! 1. Walk [`TIERS`] from the most generous margin to the tightest and stop
//!    at the first tier where everything fits at the base body size.
//! 2. If none fits, keep the tightest tier and try body scales from 98%
//!    down to 82% in 2-point steps, re-wrapping each time, and stop at the
//!    first scale whose body fits the remaining budget.
//! 3. If 82% still does not fit, use 82% anyway and report the overflow.
//!    Text is never truncated and the scale never goes lower.
//!
//! # Invariants
//!
//! 1. Same inputs, same plan (line breaks, scale, coordinates).
//! 2. The header is anchored to the top margin and the footer to the bottom
//!    margin; the body is centred in the zone between them.
//! 3. An empty field contributes no line and no height; a rule is present
//!    only when its block has content.
//! 4. `font_percent >= 82` always.
//! 5. At a fixed type scale, a shorter box never gets a looser tier or a
//!    larger body scale.
//!
//! [`TypesetEngine::typeset`] derives the type scale from the box, so
//! invariant 5 only holds through [`TypesetEngine::typeset_scaled`]. Below
//! the reference height every size shrinks with the box, and a fixed size
//! rounding down a whole pixel can free more room than the box lost.

use keepsake_core::{PreviewError, PreviewResult};
use smallvec::SmallVec;

use crate::measure::{FontFamily, FontSpec, TextMeasure};
use crate::wrap::wrap_paragraphs;

/// One (margin, padding) rung of the whitespace ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    /// Top and bottom margin as a fraction of the box height.
    pub margin_fraction: f64,
    /// Gap between blocks, in unscaled pixels.
    pub padding: f64,
}

/// Whitespace ladder, most generous first.
pub const TIERS: [Tier; 4] = [
    Tier {
        margin_fraction: 0.09,
        padding: 14.0,
    },
    Tier {
        margin_fraction: 0.06,
        padding: 10.0,
    },
    Tier {
        margin_fraction: 0.04,
        padding: 6.0,
    },
    Tier {
        margin_fraction: 0.025,
        padding: 3.0,
    },
];

/// Smallest body scale the engine will ever choose.
pub const FONT_SCALE_FLOOR: f64 = 0.82;

const FONT_PERCENT_START: u8 = 98;
const FONT_PERCENT_FLOOR: u8 = 82;
const FONT_PERCENT_STEP: usize = 2;

const BASE_BODY_SIZE: f64 = 13.0;
const NAME_SIZE: f64 = 30.0;
const DATE_SIZE: f64 = 10.5;
const NICKNAME_SIZE: f64 = 10.0;
const FAMILY_SIZE: f64 = 9.0;

const NAME_LEADING: f64 = 1.2;
const DATE_LEADING: f64 = 1.6;
const NICKNAME_LEADING: f64 = 1.6;
const FAMILY_LEADING: f64 = 1.5;
pub(crate) const BODY_LEADING: f64 = 1.55;

const RULE_ALLOWANCE: f64 = 6.0;
const RULE_OFFSET: f64 = 2.0;
const RULE_HALF_WIDTH: f64 = 28.0;

const TEXT_COLUMN: f64 = 0.76;
const WRAP_FRACTION: f64 = 0.92;

/// Scale factor for a panel box: 1.0 at the 400x260 reference size.
#[must_use]
pub fn type_scale(width: f64, height: f64) -> f64 {
    (width / 400.0).min(height / 260.0)
}

/// Resolved tribute strings, ready to paint.
///
/// Empty strings omit their block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TributeText {
    pub name: String,
    pub dates: String,
    pub nickname: String,
    pub family: String,
    pub body: String,
}

impl TributeText {
    #[must_use]
    pub fn has_header(&self) -> bool {
        !self.name.is_empty() || !self.dates.is_empty()
    }

    #[must_use]
    pub fn has_footer(&self) -> bool {
        !self.nickname.is_empty() || !self.family.is_empty()
    }
}

/// Which fixed block a placed string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    Name,
    Dates,
    Nickname,
    Family,
}

/// Vertical anchor of a placed string's `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

/// A header or footer string at its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub slot: TextSlot,
    pub text: String,
    pub font: FontSpec,
    pub y: f64,
    pub anchor: VerticalAnchor,
}

/// One body line. Blank lines keep their slot with empty text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Top of the line box.
    pub y: f64,
    pub height: f64,
}

impl PlacedLine {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// A short horizontal rule centred on the text column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMark {
    pub y: f64,
    pub half_width: f64,
    pub line_width: f64,
}

/// Everything the renderer needs to paint one tribute panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TypesetPlan {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub center_x: f64,
    /// Widest a painted line may be; wider lines are compressed.
    pub max_text_width: f64,
    /// Index into [`TIERS`] of the adopted whitespace rung.
    pub tier_index: usize,
    pub margin: f64,
    pub padding: f64,
    /// Body scale in percent: 100 when no shrinking was needed.
    pub font_percent: u8,
    pub body_font: FontSpec,
    pub header: SmallVec<[PlacedText; 2]>,
    pub footer: SmallVec<[PlacedText; 2]>,
    pub rules: SmallVec<[RuleMark; 2]>,
    pub body: Vec<PlacedLine>,
    pub body_height: f64,
    /// Content is taller than the box even at the floor scale.
    pub overflow: bool,
}

impl TypesetPlan {
    /// Body scale as a fraction.
    #[must_use]
    pub fn font_scale(&self) -> f64 {
        f64::from(self.font_percent) / 100.0
    }

    /// Margin of the adopted tier as a fraction of the box height.
    #[must_use]
    pub fn margin_fraction(&self) -> f64 {
        TIERS[self.tier_index].margin_fraction
    }

    /// Body lines that carry text.
    pub fn visible_lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.body.iter().filter(|line| !line.is_blank())
    }
}

#[derive(Debug)]
struct BodyLayout {
    lines: Vec<String>,
    font: FontSpec,
    line_height: f64,
    blank_height: f64,
    total: f64,
}

impl BodyLayout {
    fn empty(size: f64) -> Self {
        Self {
            lines: Vec::new(),
            font: body_font(size),
            line_height: 0.0,
            blank_height: 0.0,
            total: 0.0,
        }
    }
}

fn body_font(size: f64) -> FontSpec {
    FontSpec::new(FontFamily::Serif, size).weight(300)
}

/// Fixed-size parts of the layout at one scale.
#[derive(Debug, Clone, Copy)]
struct Frame {
    name_size: f64,
    date_size: f64,
    nickname_size: f64,
    family_size: f64,
    header_height: f64,
    footer_height: f64,
}

impl Frame {
    fn new(text: &TributeText, scale: f64) -> Self {
        let name_size = (NAME_SIZE * scale).round();
        let date_size = (DATE_SIZE * scale).round();
        let nickname_size = (NICKNAME_SIZE * scale).round();
        let family_size = (FAMILY_SIZE * scale).round();

        let mut header_height = 0.0;
        if !text.name.is_empty() {
            header_height += name_size * NAME_LEADING;
        }
        if !text.dates.is_empty() {
            header_height += date_size * DATE_LEADING;
        }
        if text.has_header() {
            header_height += RULE_ALLOWANCE * scale;
        }

        let mut footer_height = 0.0;
        if text.has_footer() {
            footer_height += RULE_ALLOWANCE * scale;
        }
        if !text.nickname.is_empty() {
            footer_height += nickname_size * NICKNAME_LEADING;
        }
        if !text.family.is_empty() {
            footer_height += family_size * FAMILY_LEADING;
        }

        Self {
            name_size,
            date_size,
            nickname_size,
            family_size,
            header_height,
            footer_height,
        }
    }
}

/// Lays out tribute panels against a measurement backend.
#[derive(Debug, Clone, Copy)]
pub struct TypesetEngine<'m, M: ?Sized> {
    measure: &'m M,
}

impl<'m, M: TextMeasure + ?Sized> TypesetEngine<'m, M> {
    #[must_use]
    pub fn new(measure: &'m M) -> Self {
        Self { measure }
    }

    /// Typeset for a `width` x `height` box at its natural [`type_scale`].
    pub fn typeset(&self, text: &TributeText, width: f64, height: f64) -> PreviewResult<TypesetPlan> {
        self.typeset_scaled(text, width, height, type_scale(width, height))
    }

    /// Typeset with an explicit type scale.
    pub fn typeset_scaled(
        &self,
        text: &TributeText,
        width: f64,
        height: f64,
        scale: f64,
    ) -> PreviewResult<TypesetPlan> {
        if !self.measure.ready() {
            return Err(PreviewError::MeasurementUnavailable);
        }

        let frame = Frame::new(text, scale);
        let max_text_width = width * TEXT_COLUMN;
        let wrap_width = max_text_width * WRAP_FRACTION;
        let base_size = BASE_BODY_SIZE * scale;
        let fixed = frame.header_height + frame.footer_height;

        let (tier_index, font_percent, body) = if text.body.is_empty() {
            (0, 100, BodyLayout::empty(base_size))
        } else {
            let full = self.measure_body(&text.body, base_size, wrap_width);
            let fitting = TIERS.iter().position(|tier| {
                let margin = height * tier.margin_fraction;
                let padding = tier.padding * scale;
                margin * 2.0 + fixed + padding * 2.0 + full.total <= height
            });
            match fitting {
                Some(index) => (index, 100, full),
                None => {
                    let last = TIERS.len() - 1;
                    let tier = TIERS[last];
                    let available = height
                        - height * tier.margin_fraction * 2.0
                        - tier.padding * scale * 2.0
                        - fixed;
                    let (percent, body) = self.shrink_body(&text.body, base_size, wrap_width, available);
                    tracing::debug!(
                        percent,
                        available,
                        needed = body.total,
                        "tribute body shrunk to fit"
                    );
                    (last, percent, body)
                }
            }
        };

        let tier = TIERS[tier_index];
        let margin = height * tier.margin_fraction;
        let padding = tier.padding * scale;
        let content = margin * 2.0 + fixed + padding * 2.0 + body.total;
        let overflow = content > height + 1e-9;
        if overflow {
            tracing::warn!(content, height, "tribute overflows at the font floor");
        }

        let center_x = width / 2.0;
        let half_width = RULE_HALF_WIDTH * scale;
        let line_width = (0.8 * scale).max(1.0);
        let mut header = SmallVec::new();
        let mut footer = SmallVec::new();
        let mut rules = SmallVec::new();

        let mut y = margin;
        if !text.name.is_empty() {
            header.push(PlacedText {
                slot: TextSlot::Name,
                text: text.name.clone(),
                font: FontSpec::new(FontFamily::Serif, frame.name_size).weight(500),
                y,
                anchor: VerticalAnchor::Top,
            });
            y += frame.name_size * NAME_LEADING;
        }
        if !text.dates.is_empty() {
            header.push(PlacedText {
                slot: TextSlot::Dates,
                text: text.dates.clone(),
                font: FontSpec::new(FontFamily::Serif, frame.date_size).weight(300),
                y,
                anchor: VerticalAnchor::Top,
            });
            y += frame.date_size * DATE_LEADING;
        }
        if text.has_header() {
            rules.push(RuleMark {
                y: y + RULE_OFFSET * scale,
                half_width,
                line_width,
            });
            y += RULE_ALLOWANCE * scale + padding;
        }

        let mut placed = Vec::with_capacity(body.lines.len());
        if !body.lines.is_empty() {
            let footer_top = height - margin - frame.footer_height;
            let zone = footer_top - padding - y;
            let mut line_y = y + ((zone - body.total) / 2.0).max(0.0);
            for line in body.lines {
                let line_height = if line.is_empty() {
                    body.blank_height
                } else {
                    body.line_height
                };
                placed.push(PlacedLine {
                    text: line,
                    y: line_y,
                    height: line_height,
                });
                line_y += line_height;
            }
        }

        let mut footer_y = height - margin;
        if !text.family.is_empty() {
            footer.push(PlacedText {
                slot: TextSlot::Family,
                text: text.family.clone(),
                font: FontSpec::new(FontFamily::Serif, frame.family_size)
                    .weight(300)
                    .italic(),
                y: footer_y,
                anchor: VerticalAnchor::Bottom,
            });
            footer_y -= frame.family_size * FAMILY_LEADING;
        }
        if !text.nickname.is_empty() {
            footer.push(PlacedText {
                slot: TextSlot::Nickname,
                text: text.nickname.clone(),
                font: FontSpec::new(FontFamily::Serif, frame.nickname_size).italic(),
                y: footer_y,
                anchor: VerticalAnchor::Bottom,
            });
            footer_y -= frame.nickname_size * NICKNAME_LEADING;
        }
        if text.has_footer() {
            rules.push(RuleMark {
                y: footer_y,
                half_width,
                line_width,
            });
        }

        Ok(TypesetPlan {
            width,
            height,
            scale,
            center_x,
            max_text_width,
            tier_index,
            margin,
            padding,
            font_percent,
            body_font: body.font,
            header,
            footer,
            rules,
            body: placed,
            body_height: body.total,
            overflow,
        })
    }

    fn measure_body(&self, body: &str, size: f64, wrap_width: f64) -> BodyLayout {
        let font = body_font(size);
        let line_height = size * BODY_LEADING;
        let blank_height = line_height * 0.5;
        let lines = wrap_paragraphs(body, wrap_width, |line| self.measure.measure(&font, line));
        let total = lines
            .iter()
            .map(|line| if line.is_empty() { blank_height } else { line_height })
            .sum();
        BodyLayout {
            lines,
            font,
            line_height,
            blank_height,
            total,
        }
    }

    fn shrink_body(&self, body: &str, base_size: f64, wrap_width: f64, available: f64) -> (u8, BodyLayout) {
        let mut chosen = None;
        for percent in (FONT_PERCENT_FLOOR..=FONT_PERCENT_START)
            .rev()
            .step_by(FONT_PERCENT_STEP)
        {
            let layout = self.measure_body(body, base_size * f64::from(percent) / 100.0, wrap_width);
            let fits = layout.total <= available;
            chosen = Some((percent, layout));
            if fits {
                break;
            }
        }
        chosen.unwrap_or_else(|| {
            let size = base_size * FONT_SCALE_FLOOR;
            (FONT_PERCENT_FLOOR, self.measure_body(body, size, wrap_width))
        })
    }
}
