//! Proof jobs replay persisted previews into PNG bytes.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use tempfile::tempdir;

use image::{ImageFormat, Rgba, RgbaImage};
use keepsake_core::{PanelMode, PreviewError, Viewport};
use keepsake_harness::{HarnessError, PhotoSpec, ProofJob};
use keepsake_runtime::{PreviewRenderer, RenderConfig, TemplateDescriptor};

const TEMPLATE: &str = r##"{
    "id": "pet-memorial",
    "name": "Forever in Our Hearts",
    "styleVariants": {
        "classic-dark": { "tribute": { "background": "#1a1a1a" } }
    },
    "defaultStyle": "classic-dark",
    "memoryFields": [ { "id": "petName", "default": "Luna" } ]
}"##;

fn template() -> TemplateDescriptor {
    TemplateDescriptor::from_json(TEMPLATE).unwrap()
}

fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

fn assert_near(actual: &Rgba<u8>, expected: [u8; 4]) {
    let close = actual.0.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 2);
    assert!(close, "{actual:?} is not close to {expected:?}");
}

#[test]
fn renders_template_defaults() {
    let proof = ProofJob::new(template(), Viewport::new(800.0, 1.0))
        .render()
        .unwrap();
    assert_eq!((proof.width, proof.height), (800, 512));
    assert_eq!(proof.layout, "side-by-side");
    let image = decode(&proof.png);
    assert_eq!(image.dimensions(), (800, 512));
}

#[test]
fn device_scale_multiplies_output() {
    let proof = ProofJob::new(template(), Viewport::new(400.0, 2.0))
        .render()
        .unwrap();
    assert_eq!((proof.width, proof.height), (800, 512));
}

#[test]
fn matches_live_preview_pixels() {
    let mut live = PreviewRenderer::init(template(), Viewport::new(600.0, 1.0)).unwrap();
    live.set_field("petName", "Biscuit");
    live.add_third_panel(PanelMode::Text).unwrap();
    live.set_field("panel2Text", "Good boy, always");
    let expected = live.export_png().unwrap();

    let proof = ProofJob {
        snapshot: Some(live.snapshot()),
        ..ProofJob::new(template(), Viewport::new(600.0, 1.0))
    }
    .render()
    .unwrap();
    assert_eq!(proof.layout, "hero-left");
    assert_eq!(decode(&proof.png), decode(&expected));
}

#[test]
fn photo_lands_in_its_region() {
    let proof = ProofJob::new(template(), Viewport::new(800.0, 1.0))
        .with_config(RenderConfig::default().with_watermark(None))
        .with_photo("photo", png(40, 40, [200, 30, 30, 255]), None)
        .render()
        .unwrap();
    let image = decode(&proof.png);
    assert_near(image.get_pixel(200, 256), [200, 30, 30, 255]);
}

#[test]
fn photo_for_non_photo_region_fails() {
    let err = ProofJob::new(template(), Viewport::default())
        .with_photo("tribute", png(4, 4, [0, 0, 0, 255]), None)
        .render()
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Preview(PreviewError::RegionNotFound { .. })
    ));
}

#[test]
fn sku_sets_print_aspect() {
    let proof = ProofJob::new(template(), Viewport::new(800.0, 1.0))
        .with_sku("framed-11x14")
        .render()
        .unwrap();
    assert_eq!((proof.width, proof.height), (800, 629));
    assert!(proof.frame.is_some());
}

#[test]
fn loads_inputs_from_disk() {
    let scratch = tempdir().unwrap();
    let dir = scratch.path();
    let template_path = dir.join("template.json");
    let snapshot_path = dir.join("snapshot.json");
    let photo_path = dir.join("luna.png");
    fs::write(&template_path, TEMPLATE).unwrap();
    fs::write(&photo_path, png(10, 10, [10, 120, 200, 255])).unwrap();

    let mut live = PreviewRenderer::init(template(), Viewport::default()).unwrap();
    live.set_layout("stacked").unwrap();
    fs::write(&snapshot_path, live.snapshot().to_json().unwrap()).unwrap();

    let spec = PhotoSpec::parse(&format!("photo={}@50% 20%", photo_path.display())).unwrap();
    let job = ProofJob::load(&template_path, Some(&snapshot_path), &[spec], Viewport::default()).unwrap();
    assert_eq!(job.photos.len(), 1);
    assert!(job.photos[0].focal.is_some());

    let proof = job.render().unwrap();
    assert_eq!(proof.layout, "stacked");
    let out = dir.join("proof.png");
    proof.write(&out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), proof.png);
}

#[test]
fn missing_template_is_an_io_error() {
    let err = ProofJob::load(
        &PathBuf::from("/nonexistent/keepsake/template.json"),
        None,
        &[],
        Viewport::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}
