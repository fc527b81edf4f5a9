//! Configuration for a single capture.
//!
//! Every capture knob lives in [`CaptureOptions`], built fresh per capture via
//! [`CaptureOptionsBuilder`] or loaded from a JSON file. Unset fields take the
//! documented defaults, so `{"scale": 2}` is a complete options file.

use crate::error::CaptureError;
use crate::pipeline::encode::sanitize_name;
use crate::surface::display::Color;
use serde::{Deserialize, Serialize};

/// Width in CSS px the surface is pinned to while it is captured.
pub const REFERENCE_WIDTH_PX: f32 = 550.0;

/// Default output pixel density multiplier.
pub const DEFAULT_SCALE: f32 = 3.0;

/// Largest accepted output pixel density multiplier.
pub const MAX_SCALE: f32 = 8.0;

/// Paper colour used where the surface leaves pixels transparent.
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0xf0, 0xf0, 0xeb);

/// File name prefix of exported pages.
pub const DEFAULT_FILE_PREFIX: &str = "BijoyBarta";

/// Name token used when the reporter left the byline empty.
pub const DEFAULT_NAME_TOKEN: &str = "71";

/// Options for one capture call.
///
/// # Example
/// ```rust
/// use vintage_newsprint::{CaptureOptions, CrossOriginMode};
///
/// let options = CaptureOptions::builder()
///     .scale(2.0)
///     .cross_origin(CrossOriginMode::Deny)
///     .build()
///     .unwrap();
/// assert_eq!(options.scale, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Output pixel density multiplier. Range: (0, 8]. Default: 3.
    ///
    /// A 550 px wide page captured at scale 3 yields a 1650 px wide PNG.
    pub scale: f32,

    /// Opaque fill behind the surface. Default: `#f0f0eb`.
    pub background: Color,

    /// How images from other origins are treated. Default: [`CrossOriginMode::Cors`].
    pub cross_origin: CrossOriginMode,

    /// Prefix of the suggested file name. Default: `BijoyBarta`.
    pub file_prefix: String,

    /// Name token used when the surface has no reporter name. Default: `71`.
    pub default_name: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            background: DEFAULT_BACKGROUND,
            cross_origin: CrossOriginMode::default(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            default_name: DEFAULT_NAME_TOKEN.to_string(),
        }
    }
}

impl CaptureOptions {
    /// Create a new builder for `CaptureOptions`.
    pub fn builder() -> CaptureOptionsBuilder {
        CaptureOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Parse options from JSON, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidOptions(format!("options JSON: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(CaptureError::InvalidOptions(format!(
                "scale must be in (0, {MAX_SCALE}], got {}",
                self.scale
            )));
        }
        if !self.background.is_opaque() {
            return Err(CaptureError::InvalidOptions(format!(
                "background must be opaque, got {}",
                self.background
            )));
        }
        for (field, value) in [
            ("file_prefix", &self.file_prefix),
            ("default_name", &self.default_name),
        ] {
            if value.trim().is_empty() {
                return Err(CaptureError::InvalidOptions(format!(
                    "{field} must not be empty"
                )));
            }
            if value.contains(['/', '\\']) {
                return Err(CaptureError::InvalidOptions(format!(
                    "{field} must not contain path separators, got '{value}'"
                )));
            }
            if sanitize_name(value).is_none() {
                return Err(CaptureError::InvalidOptions(format!(
                    "{field} '{value}' leaves nothing usable in a file name"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`CaptureOptions`].
#[derive(Debug)]
pub struct CaptureOptionsBuilder {
    options: CaptureOptions,
}

impl CaptureOptionsBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.options.scale = scale;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.options.background = color;
        self
    }

    pub fn cross_origin(mut self, mode: CrossOriginMode) -> Self {
        self.options.cross_origin = mode;
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.file_prefix = prefix.into();
        self
    }

    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.options.default_name = name.into();
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<CaptureOptions, CaptureError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Policy for images whose pixels came from another origin.
///
/// | Mode    | Remote image with CORS grant | Remote image without |
/// |---------|------------------------------|----------------------|
/// | `Deny`  | rejected                     | rejected             |
/// | `Cors`  | drawn as same-origin         | rejected             |
/// | `Trust` | drawn as same-origin         | drawn as same-origin |
///
/// A rejected image fails the capture with
/// [`CaptureError::TaintedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossOriginMode {
    Deny,
    #[default]
    Cors,
    Trust,
}

impl CrossOriginMode {
    /// Whether an image from `origin` may be read back into the bitmap.
    pub fn permits(&self, origin: &crate::raster::ImageOrigin) -> bool {
        use crate::raster::ImageOrigin;
        match (self, origin) {
            (_, ImageOrigin::Local) => true,
            (CrossOriginMode::Deny, ImageOrigin::Remote { .. }) => false,
            (CrossOriginMode::Cors, ImageOrigin::Remote { cors_granted, .. }) => *cors_granted,
            (CrossOriginMode::Trust, ImageOrigin::Remote { .. }) => true,
        }
    }
}
