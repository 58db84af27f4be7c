//! One-shot surface painting by ray.
//!
//! The scene itself is a host collaborator: the engine only needs a nearest
//! hit query and a way to recolor an object and its descendants.

use serde::Deserialize;
use tracing::debug;

use crate::palette::Color;
use crate::pose::{normalize, Point3};

// ════════════════════════════════════════════════════════════════════════════
// Ray / LayerMask / ObjectHandle
// ════════════════════════════════════════════════════════════════════════════

/// A bounded ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Point3,
    pub max_distance: f32,
}

impl Ray {
    /// `None` when `direction` has no length.
    pub fn new(origin: Point3, direction: Point3, max_distance: f32) -> Option<Ray> {
        Some(Ray {
            origin,
            direction: normalize(direction)?,
            max_distance,
        })
    }

    pub fn at(&self, t: f32) -> Point3 {
        [
            self.origin[0] + self.direction[0] * t,
            self.origin[1] + self.direction[1] * t,
            self.origin[2] + self.direction[2] * t,
        ]
    }

    pub fn end(&self) -> Point3 {
        self.at(self.max_distance)
    }
}

/// 32 scene layers; a ray only sees objects whose layer bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn layer(layer: u8) -> LayerMask {
        LayerMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    pub fn contains_layer(&self, layer: u8) -> bool {
        self.0 & LayerMask::layer(layer).0 != 0
    }
}

/// Opaque reference to a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

// ════════════════════════════════════════════════════════════════════════════
// Scene seams
// ════════════════════════════════════════════════════════════════════════════

/// Nearest-hit ray query against scene geometry.
pub trait SceneQuery {
    fn raycast(&self, ray: &Ray, mask: LayerMask) -> Option<ObjectHandle>;
}

/// A scene whose objects can be recolored.
pub trait PaintableScene: SceneQuery {
    /// Every renderable below `root` in the hierarchy (not including `root`).
    fn descendants(&self, root: ObjectHandle) -> Vec<ObjectHandle>;

    fn set_surface_color(&mut self, object: ObjectHandle, color: Color);
}

/// A scene with nothing in it; every ray misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl SceneQuery for EmptyScene {
    fn raycast(&self, _ray: &Ray, _mask: LayerMask) -> Option<ObjectHandle> {
        None
    }
}

impl PaintableScene for EmptyScene {
    fn descendants(&self, _root: ObjectHandle) -> Vec<ObjectHandle> {
        Vec::new()
    }

    fn set_surface_color(&mut self, _object: ObjectHandle, _color: Color) {}
}

// ════════════════════════════════════════════════════════════════════════════
// SurfacePainter
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct SurfacePainter;

impl SurfacePainter {
    pub fn new() -> Self {
        SurfacePainter
    }

    /// Cast `ray`; on the first hit recolor the object and its whole
    /// hierarchy.  Returns whether anything was hit.
    pub fn try_paint(
        &self,
        scene: &mut dyn PaintableScene,
        ray: &Ray,
        mask: LayerMask,
        color: Color,
    ) -> bool {
        let Some(hit) = scene.raycast(ray, mask) else {
            return false;
        };
        scene.set_surface_color(hit, color);
        let children = scene.descendants(hit);
        for child in &children {
            scene.set_surface_color(*child, color);
        }
        debug!(object = hit.0, descendants = children.len(), "painted surface");
        true
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Objects on the +Z axis; a ray hits the nearest one within range whose
    /// layer passes the mask.  Children are listed explicitly.
    #[derive(Default)]
    pub(crate) struct AxisScene {
        pub objects: Vec<(ObjectHandle, f32, u8)>,
        pub children: HashMap<ObjectHandle, Vec<ObjectHandle>>,
        pub colors: HashMap<ObjectHandle, Color>,
    }

    impl SceneQuery for AxisScene {
        fn raycast(&self, ray: &Ray, mask: LayerMask) -> Option<ObjectHandle> {
            if ray.direction[2] <= 0.0 {
                return None;
            }
            self.objects
                .iter()
                .filter(|(_, z, layer)| {
                    let t = z - ray.origin[2];
                    t >= 0.0 && t <= ray.max_distance && mask.contains_layer(*layer)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(h, _, _)| *h)
        }
    }

    impl PaintableScene for AxisScene {
        fn descendants(&self, root: ObjectHandle) -> Vec<ObjectHandle> {
            let mut out = Vec::new();
            let mut stack = vec![root];
            while let Some(h) = stack.pop() {
                if let Some(kids) = self.children.get(&h) {
                    out.extend(kids.iter().copied());
                    stack.extend(kids.iter().copied());
                }
            }
            out
        }

        fn set_surface_color(&mut self, object: ObjectHandle, color: Color) {
            self.colors.insert(object, color);
        }
    }

    fn forward_ray(len: f32) -> Ray {
        Ray::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], len).unwrap()
    }

    #[test]
    fn hit_recolors_whole_hierarchy() {
        let mut scene = AxisScene::default();
        scene.objects.push((ObjectHandle(1), 1.0, 0));
        scene.children.insert(ObjectHandle(1), vec![ObjectHandle(2)]);
        scene.children.insert(ObjectHandle(2), vec![ObjectHandle(3)]);

        let hit = SurfacePainter::new().try_paint(&mut scene, &forward_ray(3.0), LayerMask::ALL, Color::BLUE);
        assert!(hit);
        for h in 1..=3 {
            assert_eq!(scene.colors.get(&ObjectHandle(h)), Some(&Color::BLUE));
        }
    }

    #[test]
    fn miss_is_false_and_paints_nothing() {
        let mut scene = AxisScene::default();
        scene.objects.push((ObjectHandle(1), 5.0, 0));
        let hit = SurfacePainter::new().try_paint(&mut scene, &forward_ray(3.0), LayerMask::ALL, Color::RED);
        assert!(!hit);
        assert!(scene.colors.is_empty());
    }

    #[test]
    fn mask_filters_layers() {
        let mut scene = AxisScene::default();
        scene.objects.push((ObjectHandle(1), 1.0, 3));
        let painter = SurfacePainter::new();
        assert!(!painter.try_paint(&mut scene, &forward_ray(3.0), LayerMask::layer(4), Color::RED));
        assert!(painter.try_paint(&mut scene, &forward_ray(3.0), LayerMask::layer(3), Color::RED));
    }

    #[test]
    fn nearest_hit_wins() {
        let mut scene = AxisScene::default();
        scene.objects.push((ObjectHandle(7), 2.0, 0));
        scene.objects.push((ObjectHandle(8), 1.0, 0));
        SurfacePainter::new().try_paint(&mut scene, &forward_ray(3.0), LayerMask::ALL, Color::GREEN);
        assert!(scene.colors.contains_key(&ObjectHandle(8)));
        assert!(!scene.colors.contains_key(&ObjectHandle(7)));
    }

    #[test]
    fn ray_rejects_zero_direction() {
        assert!(Ray::new([0.0; 3], [0.0; 3], 1.0).is_none());
        let r = Ray::new([0.0; 3], [0.0, 2.0, 0.0], 3.0).unwrap();
        assert_eq!(r.end(), [0.0, 3.0, 0.0]);
    }

    #[test]
    fn layer_mask_bits() {
        assert!(LayerMask::ALL.contains_layer(31));
        assert!(!LayerMask::NONE.contains_layer(0));
        assert_eq!(LayerMask::layer(32), LayerMask::NONE);
    }
}
