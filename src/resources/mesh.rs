//! Mesh data structures and generation

use glam::Vec3;

/// A single mesh vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Uniform read access to the vertex positions of a geometry.
///
/// Indexed meshes, bare point lists and scene nodes all expose their
/// positions through this one interface, so consumers such as the bounding
/// box projector never care how the vertices are stored.
pub trait VertexSource {
    fn vertex_count(&self) -> usize;

    /// Position of vertex `index` in local space
    fn vertex(&self, index: usize) -> Vec3;
}

impl VertexSource for [Vec3] {
    fn vertex_count(&self) -> usize {
        self.len()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        self[index]
    }
}

impl VertexSource for Vec<Vec3> {
    fn vertex_count(&self) -> usize {
        self.len()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        self[index]
    }
}

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl VertexSource for Mesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        self.vertices[index].position
    }
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    /// Iterate triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Create an axis-aligned box centered at origin
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let mut mesh = Mesh::new("cuboid");
        let h = Vec3::new(width, height, depth) * 0.5;

        // (normal, u axis, v axis) per face; u x v == normal keeps CCW winding outward
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let local = normal + u * su + v * sv;
                mesh.vertices.push(Vertex {
                    position: local * h,
                    normal,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Mesh::new("sphere");

        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                mesh.vertices.push(Vertex {
                    position: normal * radius,
                    normal,
                });
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    current + 1,
                    next,
                    current + 1,
                    next + 1,
                    next,
                ]);
            }
        }

        mesh
    }

    /// Create a plane on the XY axis facing +Z
    pub fn plane(width: f32, height: f32, subdivisions: u32) -> Self {
        let mut mesh = Mesh::new("plane");
        let subdivisions = subdivisions.max(1);

        let half_width = width / 2.0;
        let half_height = height / 2.0;
        let step_x = width / subdivisions as f32;
        let step_y = height / subdivisions as f32;

        for y in 0..=subdivisions {
            for x in 0..=subdivisions {
                mesh.vertices.push(Vertex {
                    position: Vec3::new(
                        -half_width + x as f32 * step_x,
                        -half_height + y as f32 * step_y,
                        0.0,
                    ),
                    normal: Vec3::Z,
                });
            }
        }

        for y in 0..subdivisions {
            for x in 0..subdivisions {
                let current = y * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    current + 1,
                    next,
                    current + 1,
                    next + 1,
                    next,
                ]);
            }
        }

        mesh
    }
}
