//! CPU rasterizer backend.
//!
//! Draws triangle meshes into an RGBA8 framebuffer with a depth buffer,
//! per-face Lambert or flat shading, face culling and alpha blending.
//! Opaque objects are drawn first; translucent ones follow from far to near
//! and do not write depth.

use glam::{Mat4, Vec2, Vec3, Vec4};
use image::RgbaImage;

use crate::backend::traits::{BackendError, BackendResult, RenderBackend};
use crate::backend::types::RenderSurface;
use crate::resources::{Material, Shading, Side, Vertex};
use crate::scene::{Camera, Primitive, SceneObject, TrackedObject};

/// Triangles with a vertex this close to the eye plane are dropped
const NEAR_W: f32 = 1e-4;

/// CPU rasterizer drawing into an owned framebuffer
#[derive(Debug)]
pub struct SoftwareBackend {
    surface: RenderSurface,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    clear_color: [u8; 4],
    light_direction: Vec3,
    ambient: f32,
    attached: bool,
}

impl SoftwareBackend {
    pub fn new(surface: RenderSurface) -> BackendResult<Self> {
        if surface.width == 0 || surface.height == 0 {
            return Err(BackendError::InvalidDimensions {
                width: surface.width,
                height: surface.height,
            });
        }

        let pixels = surface.pixel_count();
        log::debug!(
            "SoftwareBackend: creating surface {:?} ({}x{})",
            surface.id,
            surface.width,
            surface.height
        );

        Ok(Self {
            surface,
            color: vec![[0, 0, 0, 255]; pixels],
            depth: vec![1.0; pixels],
            clear_color: [0, 0, 0, 255],
            light_direction: Vec3::new(1.0, 1.0, 1.0).normalize(),
            ambient: 0.25,
            attached: true,
        })
    }

    fn clear(&mut self) {
        self.color.fill(self.clear_color);
        self.depth.fill(1.0);
    }

    fn draw_object(&mut self, view_projection: Mat4, object: &SceneObject) {
        let Primitive::Mesh { mesh, material } = &object.primitive else {
            return;
        };

        let model = object.world_matrix();
        let clip_from_local = view_projection * model;
        let write_depth = !material.is_transparent();
        let size = Vec2::new(self.surface.width as f32, self.surface.height as f32);

        for triangle in mesh.triangles() {
            let clip = triangle.map(|v| clip_from_local * v.position.extend(1.0));
            if clip.iter().any(|c| c.w <= NEAR_W) {
                continue;
            }
            let ndc = clip.map(|c| c.truncate() / c.w);

            let winding = (ndc[1].x - ndc[0].x) * (ndc[2].y - ndc[0].y)
                - (ndc[2].x - ndc[0].x) * (ndc[1].y - ndc[0].y);
            let front_facing = winding > 0.0;
            match material.side {
                Side::Front if !front_facing => continue,
                Side::Back if front_facing => continue,
                _ => {}
            }

            let color = self.shade(material, model, triangle, front_facing);
            let screen = ndc.map(|p| {
                Vec3::new(
                    (p.x + 1.0) * 0.5 * size.x,
                    (1.0 - p.y) * 0.5 * size.y,
                    p.z,
                )
            });
            self.rasterize(screen, color, write_depth);
        }
    }

    fn shade(&self, material: &Material, model: Mat4, triangle: [&Vertex; 3], front_facing: bool) -> Vec4 {
        match material.shading {
            Shading::Flat => material.base_color,
            Shading::Lambert => {
                let world = triangle.map(|v| model.transform_point3(v.position));
                let mut normal = (world[1] - world[0])
                    .cross(world[2] - world[0])
                    .normalize_or_zero();
                if !front_facing {
                    normal = -normal;
                }
                let diffuse = normal.dot(self.light_direction).max(0.0);
                let intensity = self.ambient + (1.0 - self.ambient) * diffuse;
                (material.color() * intensity).extend(material.opacity())
            }
        }
    }

    fn rasterize(&mut self, [p0, p1, p2]: [Vec3; 3], color: Vec4, write_depth: bool) {
        let area = edge(p0, p1, p2.truncate());
        if area.abs() < f32::EPSILON {
            return;
        }

        let width = self.surface.width as i64;
        let height = self.surface.height as i64;
        let min_x = (p0.x.min(p1.x).min(p2.x).floor() as i64).max(0);
        let max_x = (p0.x.max(p1.x).max(p2.x).ceil() as i64).min(width - 1);
        let min_y = (p0.y.min(p1.y).min(p2.y).floor() as i64).max(0);
        let max_y = (p0.y.max(p1.y).max(p2.y).ceil() as i64).min(height - 1);

        let rgba = to_rgba8(color);
        let alpha = color.w.clamp(0.0, 1.0);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(p1, p2, p) / area;
                let w1 = edge(p2, p0, p) / area;
                let w2 = edge(p0, p1, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * p0.z + w1 * p1.z + w2 * p2.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let index = (y * width + x) as usize;
                if z >= self.depth[index] {
                    continue;
                }

                if write_depth {
                    self.depth[index] = z;
                    self.color[index] = rgba;
                } else {
                    let dst = &mut self.color[index];
                    for channel in 0..3 {
                        let blended =
                            rgba[channel] as f32 * alpha + dst[channel] as f32 * (1.0 - alpha);
                        dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
                    }
                }
            }
        }
    }
}

impl RenderBackend for SoftwareBackend {
    fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    fn render(&mut self, camera: &Camera, objects: &[TrackedObject]) -> BackendResult<()> {
        if !self.attached {
            return Err(BackendError::SurfaceLost(self.surface.id.clone()));
        }

        self.clear();
        let view_projection = camera.view_projection_matrix();

        let (opaque, mut translucent): (Vec<&TrackedObject>, Vec<&TrackedObject>) =
            objects.iter().partition(|o| {
                !o.object
                    .primitive
                    .material()
                    .is_some_and(Material::is_transparent)
            });

        let eye = camera.position;
        translucent.sort_by(|a, b| {
            let da = a.object.position().distance_squared(eye);
            let db = b.object.position().distance_squared(eye);
            db.total_cmp(&da)
        });

        for object in opaque.iter().chain(translucent.iter()) {
            self.draw_object(view_projection, &object.object);
        }

        log::trace!(
            "SoftwareBackend: rendered {} objects into {:?}",
            objects.len(),
            self.surface.id
        );
        Ok(())
    }

    fn read_pixels(&self) -> BackendResult<RgbaImage> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.color);
        RgbaImage::from_raw(self.surface.width, self.surface.height, bytes.to_vec())
            .ok_or_else(|| BackendError::ReadbackFailed(self.surface.id.clone()))
    }

    fn detach(&mut self) {
        log::debug!("SoftwareBackend: detaching surface {:?}", self.surface.id);
        self.attached = false;
    }
}

/// Signed doubled area of `(a, b, p)` in screen space
#[inline]
fn edge(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Material, Mesh};
    use crate::scene::{ObjectKind, Projection};
    use std::sync::Arc;

    fn backend() -> SoftwareBackend {
        SoftwareBackend::new(RenderSurface::new("test", 64, 64)).unwrap()
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
            .with_projection(Projection::perspective(45.0, 1.0, 0.1, 100.0))
    }

    fn cube(material: Material, position: Vec3) -> TrackedObject {
        TrackedObject::new(
            "cube",
            ObjectKind::Box,
            SceneObject::mesh(Arc::new(Mesh::cuboid(1.0, 1.0, 1.0)), material).with_position(position),
        )
    }

    fn center(image: &RgbaImage) -> [u8; 4] {
        image.get_pixel(image.width() / 2, image.height() / 2).0
    }

    #[test]
    fn rejects_zero_sized_surface() {
        let err = SoftwareBackend::new(RenderSurface::new("bad", 0, 10)).unwrap_err();
        assert!(matches!(err, BackendError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn flat_cube_covers_center() {
        let mut backend = backend();
        let objects = [cube(Material::flat(Vec3::Y), Vec3::ZERO)];
        backend.render(&camera(), &objects).unwrap();
        let image = backend.read_pixels().unwrap();
        assert_eq!(center(&image), [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn nearer_opaque_object_wins() {
        let mut backend = backend();
        let objects = [
            cube(Material::flat(Vec3::Z), Vec3::new(0.0, 0.0, 1.0)),
            cube(Material::flat(Vec3::X), Vec3::ZERO),
        ];
        backend.render(&camera(), &objects).unwrap();
        assert_eq!(center(&backend.read_pixels().unwrap()), [0, 0, 255, 255]);
    }

    #[test]
    fn translucent_blends_over_background() {
        let mut backend = backend();
        let material = Material::flat(Vec3::ONE)
            .with_base_color(Vec4::new(1.0, 1.0, 1.0, 0.5))
            .with_side(Side::Front);
        backend.render(&camera(), &[cube(material, Vec3::ZERO)]).unwrap();
        let [r, g, b, _] = center(&backend.read_pixels().unwrap());
        assert!((126..=129).contains(&r) && r == g && g == b, "got {r}");
    }

    #[test]
    fn back_faces_are_culled_for_front_side() {
        let mut backend = backend();
        let material = Material::flat(Vec3::ONE).with_side(Side::Front);
        let mut object = cube(material, Vec3::ZERO);
        // camera inside the cube only sees back faces
        object.object.transform.scale = Vec3::splat(20.0);
        backend.render(&camera(), &[object]).unwrap();
        assert_eq!(center(&backend.read_pixels().unwrap()), [0, 0, 0, 255]);
    }

    #[test]
    fn detached_surface_is_lost() {
        let mut backend = backend();
        backend.detach();
        let err = backend.render(&camera(), &[]).unwrap_err();
        assert!(matches!(err, BackendError::SurfaceLost(id) if id == "test"));
    }
}
