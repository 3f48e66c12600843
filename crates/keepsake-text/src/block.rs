#![forbid(unsafe_code)]

//! Single-size text for the optional custom message panel.
//!
//! A lighter sibling of the tribute typesetter: one font size derived from
//! the box, word wrap against 80% of the width, and vertical centring. No
//! tier ladder and no shrinking; long messages simply run past the box.

use keepsake_core::{PreviewError, PreviewResult};

use crate::measure::{FontFamily, FontSpec, TextMeasure};
use crate::typeset::{BODY_LEADING, PlacedLine, type_scale};
use crate::wrap::wrap_paragraphs;

const BLOCK_SIZE: f64 = 13.0;
const BLOCK_COLUMN: f64 = 0.8;

/// Placed lines of one text panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlockPlan {
    pub font: FontSpec,
    pub center_x: f64,
    pub max_text_width: f64,
    pub line_height: f64,
    pub lines: Vec<PlacedLine>,
}

/// Lay out `text` centred in a `width` x `height` box.
///
/// Returns `Ok(None)` for empty text so the caller can draw its placeholder.
pub fn layout_text_block<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    width: f64,
    height: f64,
) -> PreviewResult<Option<TextBlockPlan>> {
    if text.is_empty() {
        return Ok(None);
    }
    if !measure.ready() {
        return Err(PreviewError::MeasurementUnavailable);
    }

    let size = BLOCK_SIZE * type_scale(width, height);
    let font = FontSpec::new(FontFamily::Serif, size).weight(300);
    let line_height = size * BODY_LEADING;
    let blank_height = line_height * 0.5;
    let max_text_width = width * BLOCK_COLUMN;

    let wrapped = wrap_paragraphs(text, max_text_width, |line| measure.measure(&font, line));
    let total: f64 = wrapped
        .iter()
        .map(|line| if line.is_empty() { blank_height } else { line_height })
        .sum();

    let mut y = (height - total) / 2.0;
    let lines = wrapped
        .into_iter()
        .map(|text| {
            let line_height = if text.is_empty() { blank_height } else { line_height };
            let line = PlacedLine {
                text,
                y,
                height: line_height,
            };
            y += line_height;
            line
        })
        .collect();

    Ok(Some(TextBlockPlan {
        font,
        center_x: width / 2.0,
        max_text_width,
        line_height,
        lines,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::ApproxMetrics;

    #[test]
    fn empty_text_has_no_plan() {
        let plan = layout_text_block(&ApproxMetrics::default(), "", 400.0, 260.0).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn block_is_vertically_centred() {
        let plan = layout_text_block(&ApproxMetrics::default(), "Always loved", 400.0, 260.0)
            .unwrap()
            .unwrap();
        assert_eq!(plan.lines.len(), 1);
        let line = &plan.lines[0];
        let above = line.y;
        let below = 260.0 - (line.y + line.height);
        assert!((above - below).abs() < 1e-9);
        assert!((plan.max_text_width - 320.0).abs() < 1e-9);
    }

    #[test]
    fn blank_lines_count_half_in_centring() {
        let plan = layout_text_block(&ApproxMetrics::default(), "a\n\nb", 400.0, 260.0)
            .unwrap()
            .unwrap();
        let last = plan.lines.last().unwrap();
        let top = plan.lines[0].y;
        let bottom = last.y + last.height;
        assert!((top - (260.0 - bottom)).abs() < 1e-9);
        assert!((bottom - top - 2.5 * plan.line_height).abs() < 1e-9);
    }
}
