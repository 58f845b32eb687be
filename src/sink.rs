//! Interfaces to the rendering host.
//!
//! The controller never renders or writes images itself. A host implements
//! these traits over its scene graph and screenshot facility.

use crate::geometry::Vec3;
use crate::types::ActiveLayers;
use std::path::Path;

/// Viewpoint and image-layer control. Calls are best-effort.
pub trait RenderSink {
    /// Enable exactly the views and layers in `layers`. Called once at start.
    fn set_active_layers(&mut self, layers: ActiveLayers);

    /// Pin the fixed left/right reference views. Called once at start.
    fn place_reference_views(&mut self, left: Vec3, right: Vec3);

    /// Move the moving viewpoint.
    fn set_viewpoint(&mut self, position: Vec3);

    fn set_left_opacity(&mut self, alpha: f64);

    fn set_right_opacity(&mut self, alpha: f64);
}

/// Persists the currently rendered frame.
pub trait ScreenshotSink {
    /// Capture the current frame to `path`. Must not drop frames in capture mode.
    fn capture(&mut self, path: &Path) -> std::io::Result<()>;
}

impl<T: RenderSink + ?Sized> RenderSink for Box<T> {
    fn set_active_layers(&mut self, layers: ActiveLayers) {
        (**self).set_active_layers(layers)
    }

    fn place_reference_views(&mut self, left: Vec3, right: Vec3) {
        (**self).place_reference_views(left, right)
    }

    fn set_viewpoint(&mut self, position: Vec3) {
        (**self).set_viewpoint(position)
    }

    fn set_left_opacity(&mut self, alpha: f64) {
        (**self).set_left_opacity(alpha)
    }

    fn set_right_opacity(&mut self, alpha: f64) {
        (**self).set_right_opacity(alpha)
    }
}

impl<T: ScreenshotSink + ?Sized> ScreenshotSink for Box<T> {
    fn capture(&mut self, path: &Path) -> std::io::Result<()> {
        (**self).capture(path)
    }
}
