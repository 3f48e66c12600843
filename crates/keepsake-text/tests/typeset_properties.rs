//! Property-based invariant tests for the tribute typesetter.
//!
//! 1. Determinism: identical inputs produce identical plans.
//! 2. Monotonic fallback at a fixed type scale: shrinking the box never
//!    loosens the tier or grows the body scale. With the scale derived from
//!    the box, rounding of the fixed sizes can loosen it.
//! 3. Floor: the body scale never drops below 82%.
//! 4. Placement: visible body lines stay between header and footer whenever
//!    the plan does not overflow.

use keepsake_text::{
    ApproxMetrics, FONT_SCALE_FLOOR, FontSpec, MeasureCache, TIERS, TributeText, TypesetEngine,
    type_scale,
};
use proptest::prelude::*;

const WORDS: [&str; 8] = [
    "stars", "light", "dream", "grace", "heart", "sweet", "quiet", "bloom",
];

fn poem(word_count: usize) -> String {
    WORDS.iter().cycle().take(word_count).copied().collect::<Vec<_>>().join(" ")
}

fn full_tribute(body: String) -> TributeText {
    TributeText {
        name: "Luna".into(),
        dates: "2010 \u{2013} 2024".into(),
        nickname: "\u{201c}Moonpie\u{201d}".into(),
        family: "Beloved companion of the Garcias".into(),
        body,
    }
}

#[test]
fn forty_words_fit_at_second_tier() {
    let metrics = ApproxMetrics::default();
    let plan = TypesetEngine::new(&metrics)
        .typeset(&full_tribute(poem(40)), 400.0, 280.0)
        .unwrap();
    assert!((plan.scale - 1.0).abs() < 1e-12);
    assert_eq!(plan.tier_index, 1);
    assert!((plan.margin_fraction() - 0.06).abs() < 1e-12);
    assert!((plan.padding - 10.0).abs() < 1e-12);
    assert_eq!(plan.font_percent, 100);
    assert_eq!(plan.body.len(), 6);
    assert_eq!(plan.visible_lines().count(), 6);
    assert!(!plan.overflow);
}

#[test]
fn stanza_breaks_take_half_a_line() {
    let metrics = ApproxMetrics::default();
    let text = TributeText {
        body: "first stanza\n\nsecond stanza".into(),
        ..TributeText::default()
    };
    let plan = TypesetEngine::new(&metrics).typeset(&text, 400.0, 520.0).unwrap();
    assert_eq!(plan.body.len(), 3);
    assert!(plan.body[1].is_blank());
    assert!((plan.body[1].height * 2.0 - plan.body[0].height).abs() < 1e-9);
    assert!((plan.body_height - 2.5 * 13.0 * 1.55).abs() < 1e-9);
}

#[test]
fn cached_and_uncached_measurement_agree() {
    let metrics = ApproxMetrics::default();
    let cache = MeasureCache::new(ApproxMetrics::default(), 256);
    let text = full_tribute(poem(90));
    let direct = TypesetEngine::new(&metrics).typeset(&text, 420.0, 300.0).unwrap();
    let cached = TypesetEngine::new(&cache).typeset(&text, 420.0, 300.0).unwrap();
    assert_eq!(direct, cached);
    assert!(cache.stats().hits > 0);
}

#[test]
fn derived_type_scale_can_loosen_the_tier() {
    let flat = |_: &FontSpec, _: &str| 0.0;
    let text = TributeText {
        name: "Luna".into(),
        dates: "2010 \u{2013} 2024".into(),
        body: "a\na\na\n\na\na\na\na".into(),
        ..TributeText::default()
    };
    let engine = TypesetEngine::new(&flat);
    let taller = engine.typeset(&text, 400.0, 135.0).unwrap();
    let shorter = engine.typeset(&text, 400.0, 134.0).unwrap();
    assert_eq!(taller.tier_index, 2);
    assert_eq!(shorter.tier_index, 1);
    // The name drops a whole pixel, which frees more than the lost row.
    assert_eq!(taller.header[0].font.size_px, 16);
    assert_eq!(shorter.header[0].font.size_px, 15);
    assert_eq!(taller.body.len(), 8);

    let fixed = engine.typeset_scaled(&text, 400.0, 134.0, taller.scale).unwrap();
    assert!(fixed.tier_index >= taller.tier_index);
}

proptest! {
    #[test]
    fn identical_inputs_identical_plans(
        words in 0usize..160,
        width in 120.0f64..900.0,
        height in 80.0f64..900.0,
    ) {
        let metrics = ApproxMetrics::default();
        let engine = TypesetEngine::new(&metrics);
        let text = full_tribute(poem(words));
        let a = engine.typeset(&text, width, height).unwrap();
        let b = engine.typeset(&text, width, height).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn fallback_never_jumps_back_up(
        words in 30usize..200,
        a in 60.0f64..700.0,
        b in 60.0f64..700.0,
    ) {
        let (tall, short) = if a >= b { (a, b) } else { (b, a) };
        let metrics = ApproxMetrics::default();
        let engine = TypesetEngine::new(&metrics);
        let text = full_tribute(poem(words));
        let tall_plan = engine.typeset_scaled(&text, 400.0, tall, 1.0).unwrap();
        let short_plan = engine.typeset_scaled(&text, 400.0, short, 1.0).unwrap();
        prop_assert!(short_plan.tier_index >= tall_plan.tier_index);
        prop_assert!(short_plan.margin_fraction() <= tall_plan.margin_fraction());
        prop_assert!(short_plan.font_percent <= tall_plan.font_percent);
    }

    #[test]
    fn typeset_uses_the_box_type_scale(
        words in 0usize..160,
        width in 120.0f64..900.0,
        height in 80.0f64..900.0,
    ) {
        let metrics = ApproxMetrics::default();
        let engine = TypesetEngine::new(&metrics);
        let text = full_tribute(poem(words));
        let derived = engine.typeset(&text, width, height).unwrap();
        let explicit = engine
            .typeset_scaled(&text, width, height, type_scale(width, height))
            .unwrap();
        prop_assert_eq!(derived, explicit);
    }

    #[test]
    fn scale_never_below_floor(
        words in 100usize..600,
        width in 60.0f64..800.0,
        height in 20.0f64..400.0,
    ) {
        let metrics = ApproxMetrics::default();
        let plan = TypesetEngine::new(&metrics)
            .typeset(&full_tribute(poem(words)), width, height)
            .unwrap();
        prop_assert!(plan.font_percent >= 82);
        prop_assert!(plan.font_scale() >= FONT_SCALE_FLOOR - 1e-12);
        prop_assert!(plan.tier_index < TIERS.len());
    }

    #[test]
    fn fitting_body_stays_inside_its_zone(
        words in 1usize..80,
        height in 200.0f64..900.0,
    ) {
        let metrics = ApproxMetrics::default();
        let plan = TypesetEngine::new(&metrics)
            .typeset_scaled(&full_tribute(poem(words)), 400.0, height, 1.0)
            .unwrap();
        prop_assume!(!plan.overflow);
        let header_bottom = plan.rules[0].y;
        let footer_top = plan.rules[1].y;
        for line in &plan.body {
            prop_assert!(line.y >= header_bottom);
            prop_assert!(line.y + line.height <= footer_top + 1e-9);
        }
    }
}
