//! View Vectors
//!
//! Screen-space effects rebuild view-space positions from depth with two
//! vectors derived from the projection: the view ray through the
//! bottom-left frustum corner, and the extent from that corner to the
//! right and top edges.

use glam::{Mat4, Vec3, Vec4};

/// Compute `[origin, extent]` for `projection`.
///
/// In perspective the corner rays are scaled to unit view depth so the
/// shader only multiplies by linear depth. In orthographic projection the
/// `z` of the extent holds the near-to-far depth offset.
#[must_use]
pub fn view_vectors(projection: Mat4, is_perspective: bool) -> [Vec4; 2] {
    let inverse = projection.inverse();

    let unproject = |ndc: Vec4| -> Vec3 {
        let v = inverse * ndc;
        let v = v.truncate() / v.w;
        if is_perspective { v / v.z } else { v }
    };

    let corner = unproject(Vec4::new(-1.0, -1.0, -1.0, 1.0));
    let right = unproject(Vec4::new(1.0, -1.0, -1.0, 1.0));
    let top = unproject(Vec4::new(-1.0, 1.0, -1.0, 1.0));

    let mut extent = Vec4::new(right.x - corner.x, top.y - corner.y, right.z, 1.0);

    if !is_perspective {
        let far = inverse * Vec4::new(-1.0, -1.0, 1.0, 1.0);
        extent.z = far.z / far.w - corner.z;
    }

    [corner.extend(1.0), extent]
}
