#![forbid(unsafe_code)]

//! Headless proof rendering.
//!
//! A [`ProofJob`] bundles a template, an optional persisted snapshot, and
//! photo bytes per region. [`ProofJob::render`] replays them through a
//! [`PreviewRenderer`] with the block-glyph backend and returns PNG bytes,
//! so a proof produced here matches what the live preview showed.
//!
//! # Failure Modes
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Template or snapshot JSON invalid | `HarnessError::Preview(InvalidSnapshot)` |
//! | Photo targets a region that never holds photos | `HarnessError::Preview(RegionNotFound)` |
//! | Photo bytes undecodable | `HarnessError::Preview(DecodeFailed)` |
//! | File unreadable or unwritable | `HarnessError::Io` |

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use keepsake_core::{FrameSize, PreviewError, Viewport};
use keepsake_render::{FocalPoint, FontGlyphs};
use keepsake_runtime::{FrameOutcome, PreviewRenderer, PreviewSnapshot, RenderConfig, TemplateDescriptor};
use tracing::{debug, info};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from a proof run.
#[derive(Debug)]
pub enum HarnessError {
    /// Reading an input or writing the proof failed.
    Io { path: PathBuf, source: std::io::Error },
    /// The renderer rejected an input.
    Preview(PreviewError),
    /// A command-line photo spec was malformed.
    PhotoSpec(String),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Preview(err) => write!(f, "{err}"),
            Self::PhotoSpec(msg) => write!(f, "invalid photo spec: {msg}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Preview(err) => Some(err),
            Self::PhotoSpec(_) => None,
        }
    }
}

impl From<PreviewError> for HarnessError {
    fn from(err: PreviewError) -> Self {
        Self::Preview(err)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, HarnessError> {
    fs::read(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, HarnessError> {
    fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Photo specs
// ─────────────────────────────────────────────────────────────────────────────

/// A `REGION=PATH[@X% Y%]` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSpec {
    pub region: String,
    pub path: PathBuf,
    pub focal: Option<FocalPoint>,
}

impl PhotoSpec {
    /// Parse `photo=luna.jpg` or `panel2=beach.png@30% 40%`.
    ///
    /// An `@` suffix is read as a focal hint only when it ends in `%`.
    pub fn parse(input: &str) -> Result<Self, HarnessError> {
        let (region, rest) = input
            .split_once('=')
            .ok_or_else(|| HarnessError::PhotoSpec(format!("{input:?} is missing REGION=")))?;
        let region = region.trim();
        if region.is_empty() {
            return Err(HarnessError::PhotoSpec(format!("{input:?} has an empty region")));
        }
        let hinted = rest
            .rsplit_once('@')
            .filter(|(_, hint)| hint.trim_end().ends_with('%'));
        let (path, focal) = match hinted {
            Some((path, hint)) => {
                let focal = FocalPoint::parse(hint).ok_or_else(|| {
                    HarnessError::PhotoSpec(format!("focal hint {hint:?} is not \"X% Y%\""))
                })?;
                (path, Some(focal))
            }
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(HarnessError::PhotoSpec(format!("{input:?} has an empty path")));
        }
        Ok(Self {
            region: region.to_owned(),
            path: PathBuf::from(path),
            focal,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Jobs
// ─────────────────────────────────────────────────────────────────────────────

/// Photo bytes for one region.
#[derive(Debug, Clone)]
pub struct PhotoInput {
    pub region: String,
    pub bytes: Vec<u8>,
    pub focal: Option<FocalPoint>,
}

/// Everything needed to render one proof.
#[derive(Debug, Clone)]
pub struct ProofJob {
    pub template: TemplateDescriptor,
    pub snapshot: Option<PreviewSnapshot>,
    pub photos: Vec<PhotoInput>,
    pub viewport: Viewport,
    pub config: RenderConfig,
    /// Product SKU whose print size overrides the snapshot's frame.
    pub sku: Option<String>,
}

/// A rendered proof.
#[derive(Debug, Clone)]
pub struct Proof {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: &'static str,
    pub frame: Option<FrameSize>,
}

impl ProofJob {
    #[must_use]
    pub fn new(template: TemplateDescriptor, viewport: Viewport) -> Self {
        Self {
            template,
            snapshot: None,
            photos: Vec::new(),
            viewport,
            config: RenderConfig::default(),
            sku: None,
        }
    }

    /// Load the template and snapshot JSON plus every photo file.
    pub fn load(
        template: &Path,
        snapshot: Option<&Path>,
        photos: &[PhotoSpec],
        viewport: Viewport,
    ) -> Result<Self, HarnessError> {
        let mut job = Self::new(TemplateDescriptor::from_json(&read_text(template)?)?, viewport);
        if let Some(path) = snapshot {
            job.snapshot = Some(PreviewSnapshot::from_json(&read_text(path)?)?);
        }
        for spec in photos {
            job.photos.push(PhotoInput {
                region: spec.region.clone(),
                bytes: read_file(&spec.path)?,
                focal: spec.focal,
            });
        }
        Ok(job)
    }

    #[must_use]
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn with_photo(mut self, region: impl Into<String>, bytes: Vec<u8>, focal: Option<FocalPoint>) -> Self {
        self.photos.push(PhotoInput {
            region: region.into(),
            bytes,
            focal,
        });
        self
    }

    /// Replay the job and encode the proof.
    ///
    /// The snapshot is restored before photos are applied. A persisted crop
    /// wins over a photo's focal hint.
    pub fn render(self) -> Result<Proof, HarnessError> {
        let mut preview = PreviewRenderer::with_backend(
            FontGlyphs::bundled(),
            self.template,
            self.viewport,
            self.config,
        )?;
        if let Some(snapshot) = &self.snapshot {
            preview.restore(snapshot)?;
        }
        if let Some(sku) = &self.sku {
            let frame = preview.set_frame_sku(sku);
            debug!(sku = %sku, ?frame, "frame from sku");
        }
        for photo in self.photos {
            preview.set_photo(&photo.region, photo.bytes, photo.focal)?;
        }
        if let FrameOutcome::Rendered(report) = preview.on_frame()? {
            debug!(rendered = report.rendered, skipped = report.skipped, "proof frame");
        }
        let size = preview
            .surface_size()
            .ok_or_else(|| PreviewError::Export("preview surface has no area".to_owned()))?;
        let png = preview.export_png()?;
        info!(
            layout = preview.current_layout(),
            width = size.width,
            height = size.height,
            bytes = png.len(),
            "proof rendered"
        );
        Ok(Proof {
            png,
            width: size.width,
            height: size.height,
            layout: preview.current_layout(),
            frame: preview.frame(),
        })
    }
}

impl Proof {
    /// Write the PNG to `path`.
    pub fn write(&self, path: &Path) -> Result<(), HarnessError> {
        fs::write(path, &self.png).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
