//! Renderable surfaces and the geometry overrides capture may touch.
//!
//! A surface owns its content; the capture pipeline only ever changes its
//! [`Geometry`] (transform, width, margin) and always puts the previous
//! values back. [`GeometryOverride`] is the scope guard that does this: it
//! records the surface's geometry, applies an override, and reapplies the
//! recorded values when it is dropped, on every exit path.
//!
//! ```text
//! GeometryOverride::apply(surface, Geometry::canonical())
//!   ├─ saved = surface.geometry()
//!   ├─ surface.set_geometry(canonical)
//!   │     … layout / rasterise / encode …
//!   └─ drop → surface.set_geometry(saved)
//! ```

pub mod display;
pub mod font;
pub mod newspaper;
pub mod text;

use crate::config::REFERENCE_WIDTH_PX;
use display::DisplayList;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// An inline transform override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// `transform: none`
    Identity,
    /// Uniform `scale(s)`.
    Scale(f32),
}

impl Transform {
    pub fn factor(&self) -> f32 {
        match self {
            Transform::Identity => 1.0,
            Transform::Scale(s) => *s,
        }
    }
}

/// The geometry overrides of a surface. `None` means "not overridden".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub transform: Option<Transform>,
    /// Border-box width in CSS px.
    pub width: Option<f32>,
    /// Uniform outer margin in CSS px.
    pub margin: Option<f32>,
}

impl Geometry {
    /// Identity transform, reference width, no margin.
    pub fn canonical() -> Self {
        Self {
            transform: Some(Transform::Identity),
            width: Some(REFERENCE_WIDTH_PX),
            margin: Some(0.0),
        }
    }

    /// Geometry of a surface displayed at a reduced on-screen scale.
    pub fn scaled(scale: f32) -> Self {
        Self {
            transform: Some(Transform::Scale(scale)),
            ..Self::default()
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.transform.map_or(1.0, |t| t.factor())
    }

    pub fn margin_px(&self) -> f32 {
        self.margin.unwrap_or(0.0)
    }
}

/// Something that can be laid out and captured.
pub trait Surface {
    /// The current geometry overrides.
    fn geometry(&self) -> Geometry;

    /// Replace the geometry overrides. Content is untouched.
    fn set_geometry(&mut self, geometry: Geometry);

    /// Lay out the surface at its current geometry.
    fn layout(&self) -> DisplayList;

    /// Name to derive the exported file name from, if any.
    fn suggested_name(&self) -> Option<&str> {
        None
    }
}

/// Scope guard that restores a surface's geometry when dropped.
pub struct GeometryOverride<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    saved: Geometry,
}

impl<'a, S: Surface + ?Sized> GeometryOverride<'a, S> {
    /// Record the surface's geometry, then apply `geometry`.
    pub fn apply(surface: &'a mut S, geometry: Geometry) -> Self {
        let saved = surface.geometry();
        surface.set_geometry(geometry);
        debug!(?saved, applied = ?geometry, "Geometry override applied");
        Self { surface, saved }
    }

    /// The geometry that will be restored.
    pub fn saved(&self) -> Geometry {
        self.saved
    }

    /// Restore now and return the restored geometry.
    pub fn restore(self) -> Geometry {
        self.saved
    }
}

impl<S: Surface + ?Sized> Deref for GeometryOverride<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for GeometryOverride<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.surface
    }
}

impl<S: Surface + ?Sized> Drop for GeometryOverride<'_, S> {
    fn drop(&mut self) {
        self.surface.set_geometry(self.saved);
        debug!(restored = ?self.saved, "Geometry restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        geometry: Geometry,
        writes: Vec<Geometry>,
    }

    impl Surface for RecordingSurface {
        fn geometry(&self) -> Geometry {
            self.geometry
        }

        fn set_geometry(&mut self, geometry: Geometry) {
            self.writes.push(geometry);
            self.geometry = geometry;
        }

        fn layout(&self) -> DisplayList {
            DisplayList::new(self.geometry.width.unwrap_or(100.0), 10.0)
        }
    }

    fn on_screen() -> Geometry {
        Geometry {
            transform: Some(Transform::Scale(0.65)),
            width: None,
            margin: Some(12.0),
        }
    }

    #[test]
    fn override_applies_then_restores_on_drop() {
        let mut surface = RecordingSurface {
            geometry: on_screen(),
            ..Default::default()
        };
        {
            let guard = GeometryOverride::apply(&mut surface, Geometry::canonical());
            assert_eq!(guard.geometry(), Geometry::canonical());
            assert_eq!(guard.layout().width, REFERENCE_WIDTH_PX);
        }
        assert_eq!(surface.geometry, on_screen());
        assert_eq!(surface.writes, vec![Geometry::canonical(), on_screen()]);
    }

    #[test]
    fn explicit_restore_writes_once() {
        let mut surface = RecordingSurface {
            geometry: on_screen(),
            ..Default::default()
        };
        let guard = GeometryOverride::apply(&mut surface, Geometry::canonical());
        assert_eq!(guard.restore(), on_screen());
        assert_eq!(surface.writes.len(), 2);
        assert_eq!(surface.geometry, on_screen());
    }

    #[test]
    fn restores_on_early_return() {
        fn fails(s: &mut RecordingSurface) -> Result<(), &'static str> {
            let _guard = GeometryOverride::apply(s, Geometry::canonical());
            Err("rasteriser refused")
        }
        let mut surface = RecordingSurface {
            geometry: on_screen(),
            ..Default::default()
        };
        assert!(fails(&mut surface).is_err());
        assert_eq!(surface.geometry, on_screen());
    }

    #[test]
    fn restores_on_panic() {
        let mut surface = RecordingSurface {
            geometry: on_screen(),
            ..Default::default()
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = GeometryOverride::apply(&mut surface, Geometry::canonical());
            panic!("layout blew up");
        }));
        assert!(result.is_err());
        assert_eq!(surface.geometry, on_screen());
    }

    #[test]
    fn scale_factor_defaults_to_one() {
        assert_eq!(Geometry::default().scale_factor(), 1.0);
        assert_eq!(Geometry::scaled(0.65).scale_factor(), 0.65);
        assert_eq!(Geometry::canonical().margin_px(), 0.0);
    }
}
