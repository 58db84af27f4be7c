//! In-memory paintable scene: a small hierarchy of spheres.

use paint_gesture::pose::Point3;
use paint_gesture::{Color, LayerMask, ObjectHandle, PaintableScene, Ray, SceneQuery};

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub name: String,
    pub center: Point3,
    pub radius: f32,
    pub layer: u8,
    pub parent: Option<ObjectHandle>,
    pub color: Color,
}

impl Sphere {
    pub fn new(name: impl Into<String>, center: Point3, radius: f32, color: Color) -> Self {
        Sphere {
            name: name.into(),
            center,
            radius,
            layer: 0,
            parent: None,
            color,
        }
    }

    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Distance along `ray` to the first surface hit, if within range.
    fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = [
            ray.origin[0] - self.center[0],
            ray.origin[1] - self.center[1],
            ray.origin[2] - self.center[2],
        ];
        let b = oc[0] * ray.direction[0] + oc[1] * ray.direction[1] + oc[2] * ray.direction[2];
        let c = oc[0] * oc[0] + oc[1] * oc[1] + oc[2] * oc[2] - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        // Origin inside the sphere counts as a hit at the far wall.
        let t = if -b - sq >= 0.0 { -b - sq } else { -b + sq };
        (t >= 0.0 && t <= ray.max_distance).then_some(t)
    }
}

/// Spheres addressed by [`ObjectHandle`] (their insertion index).
#[derive(Debug, Clone)]
pub struct SphereScene {
    spheres: Vec<Sphere>,
    /// Hidden objects are neither drawn nor hit by rays.
    visible: bool,
}

impl SphereScene {
    pub fn new() -> Self {
        SphereScene {
            spheres: Vec::new(),
            visible: true,
        }
    }

    /// The scene the host opens with.
    pub fn demo() -> Self {
        let grey = Color::rgb(0.55, 0.55, 0.6);
        let mut scene = SphereScene::new();
        let planet = scene.add(Sphere::new("planet", [0.0, 0.05, 1.6], 0.35, grey));
        scene.add_child(planet, Sphere::new("moon", [0.5, 0.35, 1.7], 0.09, grey));
        scene.add_child(planet, Sphere::new("ring-stone", [-0.42, -0.2, 1.5], 0.06, grey));
        scene.add(Sphere::new("rock", [-0.75, 0.35, 2.2], 0.22, Color::rgb(0.45, 0.4, 0.35)));
        scene.add(Sphere::new("pebble", [0.8, -0.35, 1.3], 0.12, Color::rgb(0.4, 0.45, 0.4)));
        scene
    }

    pub fn add(&mut self, sphere: Sphere) -> ObjectHandle {
        self.spheres.push(sphere);
        ObjectHandle((self.spheres.len() - 1) as u32)
    }

    pub fn add_child(&mut self, parent: ObjectHandle, mut sphere: Sphere) -> ObjectHandle {
        sphere.parent = Some(parent);
        self.add(sphere)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Sphere> {
        self.spheres.get(handle.0 as usize)
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Default for SphereScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneQuery for SphereScene {
    fn raycast(&self, ray: &Ray, mask: LayerMask) -> Option<ObjectHandle> {
        if !self.visible {
            return None;
        }
        self.spheres
            .iter()
            .enumerate()
            .filter(|(_, s)| mask.contains_layer(s.layer))
            .filter_map(|(i, s)| s.intersect(ray).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| ObjectHandle(i as u32))
    }
}

impl PaintableScene for SphereScene {
    fn descendants(&self, root: ObjectHandle) -> Vec<ObjectHandle> {
        let mut out = Vec::new();
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for (i, s) in self.spheres.iter().enumerate() {
                if s.parent == Some(parent) {
                    let h = ObjectHandle(i as u32);
                    out.push(h);
                    frontier.push(h);
                }
            }
        }
        out
    }

    fn set_surface_color(&mut self, object: ObjectHandle, color: Color) {
        if let Some(s) = self.spheres.get_mut(object.0 as usize) {
            s.color = color;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use paint_gesture::SurfacePainter;

    fn ray_z(x: f32, y: f32, len: f32) -> Ray {
        Ray::new([x, y, 0.0], [0.0, 0.0, 1.0], len).unwrap()
    }

    #[test]
    fn ray_hits_nearest_sphere() {
        let mut scene = SphereScene::new();
        let far = scene.add(Sphere::new("far", [0.0, 0.0, 2.0], 0.2, Color::WHITE));
        let near = scene.add(Sphere::new("near", [0.0, 0.0, 1.0], 0.2, Color::WHITE));
        assert_eq!(scene.raycast(&ray_z(0.0, 0.0, 3.0), LayerMask::ALL), Some(near));
        assert_ne!(Some(far), scene.raycast(&ray_z(0.0, 0.0, 3.0), LayerMask::ALL));
    }

    #[test]
    fn ray_range_and_offset_miss() {
        let mut scene = SphereScene::new();
        scene.add(Sphere::new("s", [0.0, 0.0, 2.0], 0.2, Color::WHITE));
        assert_eq!(scene.raycast(&ray_z(0.0, 0.0, 1.0), LayerMask::ALL), None);
        assert_eq!(scene.raycast(&ray_z(0.5, 0.0, 3.0), LayerMask::ALL), None);
    }

    #[test]
    fn layer_mask_is_respected() {
        let mut scene = SphereScene::new();
        scene.add(Sphere::new("ui", [0.0, 0.0, 1.0], 0.2, Color::WHITE).on_layer(5));
        assert_eq!(scene.raycast(&ray_z(0.0, 0.0, 3.0), LayerMask::layer(0)), None);
        assert!(scene.raycast(&ray_z(0.0, 0.0, 3.0), LayerMask::layer(5)).is_some());
    }

    #[test]
    fn hidden_scene_is_not_hit() {
        let mut scene = SphereScene::demo();
        scene.set_visible(false);
        assert_eq!(scene.raycast(&ray_z(0.0, 0.05, 3.0), LayerMask::ALL), None);
    }

    #[test]
    fn painting_planet_recolors_its_moons() {
        let mut scene = SphereScene::demo();
        let hit = SurfacePainter::new().try_paint(&mut scene, &ray_z(0.0, 0.05, 3.0), LayerMask::ALL, Color::RED);
        assert!(hit);
        let painted: Vec<&str> = scene
            .spheres()
            .iter()
            .filter(|s| s.color == Color::RED)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(painted, vec!["planet", "moon", "ring-stone"]);
    }

    #[test]
    fn descendants_are_transitive() {
        let mut scene = SphereScene::new();
        let a = scene.add(Sphere::new("a", [0.0; 3], 0.1, Color::WHITE));
        let b = scene.add_child(a, Sphere::new("b", [0.0; 3], 0.1, Color::WHITE));
        let c = scene.add_child(b, Sphere::new("c", [0.0; 3], 0.1, Color::WHITE));
        let mut d = scene.descendants(a);
        d.sort();
        assert_eq!(d, vec![b, c]);
        assert!(scene.descendants(c).is_empty());
    }
}
