// GPU-side layouts and buffers for a built tree.
//
// The ring table is uploaded once as a position buffer and shared by every
// ring-indexed draw. Colours and the two normal tables ride in their own
// vertex buffers so the same positions serve both bark surfaces:
//
//   slot 0  positions  @location(0) vec3<f32>   ring table or skeleton points
//   slot 1  colours    @location(1) vec3<f32>   one per ring point
//   slot 2  normals    @location(2) vec3<f32>   stick or joint table

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::tree::Tree;

// ============================================================================
// VERTEX LAYOUTS
// ============================================================================

static VEC3_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 3] = [
    wgpu::vertex_attr_array![0 => Float32x3],
    wgpu::vertex_attr_array![1 => Float32x3],
    wgpu::vertex_attr_array![2 => Float32x3],
];

pub const POSITION_LOCATION: u32 = 0;
pub const COLOUR_LOCATION:   u32 = 1;
pub const NORMAL_LOCATION:   u32 = 2;

/// One tightly packed `vec3<f32>` per vertex at the given shader location (0..=2).
pub fn vec3_layout(shader_location: u32) -> wgpu::VertexBufferLayout<'static> {
    let attributes = &VEC3_ATTRIBUTES[shader_location as usize];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

// ============================================================================
// UNIFORMS
// ============================================================================

/// Matches `struct Uniforms` in both shaders. WGSL pads each mat3 column to
/// 16 bytes, hence the `[f32; 4]` columns.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub mvp:           [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 3],
}

impl Uniforms {
    pub fn new(mvp: glam::Mat4, normal_matrix: glam::Mat3) -> Self {
        let column = |c: Vec3| [c.x, c.y, c.z, 0.0];
        Self {
            mvp: mvp.to_cols_array_2d(),
            normal_matrix: [
                column(normal_matrix.x_axis),
                column(normal_matrix.y_axis),
                column(normal_matrix.z_axis),
            ],
        }
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new(glam::Mat4::IDENTITY, glam::Mat3::IDENTITY)
    }
}

// ============================================================================
// TREE BUFFERS
// ============================================================================

/// A `Uint32` index buffer and its length. Empty tables get no buffer at all.
pub struct IndexBuffer {
    pub buffer: wgpu::Buffer,
    pub count:  u32,
}

impl IndexBuffer {
    pub fn new(device: &wgpu::Device, label: &str, indices: &[u32]) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self { buffer, count: indices.len() as u32 })
    }
}

/// Every GPU buffer one tree needs. Replaced wholesale when the tree is regrown.
pub struct TreeBuffers {
    pub skeleton_positions: wgpu::Buffer,
    pub ring_positions:     wgpu::Buffer,
    pub colours:            wgpu::Buffer,
    pub stick_normals:      wgpu::Buffer,
    pub joint_normals:      wgpu::Buffer,

    pub skeleton_lines: Option<IndexBuffer>,
    pub ring_loops:     Option<IndexBuffer>,
    pub stick_lines:    Option<IndexBuffer>,
    pub stick_bark:     Option<IndexBuffer>,
    pub joint_bark:     Option<IndexBuffer>,
}

impl TreeBuffers {
    pub fn upload(device: &wgpu::Device, tree: &Tree) -> Self {
        let skeleton = positions(tree.skeleton.points.iter().map(|p| p.position));
        let rings = positions(tree.rings.points.iter().copied());
        let stick_normals = positions(tree.stick_bark.normals.iter().copied());
        let joint_normals = positions(tree.joint_bark.normals.iter().copied());

        Self {
            skeleton_positions: vertex_buffer(device, "Skeleton Positions", &skeleton),
            ring_positions: vertex_buffer(device, "Ring Positions", &rings),
            colours: vertex_buffer(device, "Ring Colours", &tree.colours),
            stick_normals: vertex_buffer(device, "Stick Normals", &stick_normals),
            joint_normals: vertex_buffer(device, "Joint Normals", &joint_normals),

            skeleton_lines: IndexBuffer::new(device, "Skeleton Lines", &tree.skeleton_lines),
            ring_loops: IndexBuffer::new(device, "Ring Loops", &tree.ring_loops),
            stick_lines: IndexBuffer::new(device, "Stick Lines", &tree.stick_lines),
            stick_bark: IndexBuffer::new(device, "Stick Bark", &tree.stick_bark.indices),
            joint_bark: IndexBuffer::new(device, "Joint Bark", &tree.joint_bark.indices),
        }
    }
}

/// Vectors as plain arrays for GPU upload.
fn positions(points: impl IntoIterator<Item = Vec3>) -> Vec<[f32; 3]> {
    points.into_iter().map(|p| p.to_array()).collect()
}

fn vertex_buffer(device: &wgpu::Device, label: &str, data: &[[f32; 3]]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        // mat4x4<f32> (64) + mat3x3<f32> (3 × 16)
        assert_eq!(std::mem::size_of::<Uniforms>(), 112);
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let m = glam::Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0);
        let u = Uniforms::new(glam::Mat4::IDENTITY, m);
        assert_eq!(u.normal_matrix[1], [0.0, 2.0, 0.0, 0.0]);
        assert_eq!(u.normal_matrix[2], [0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn positions_keep_component_order() {
        let flat = positions([Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.5, 0.0)]);
        assert_eq!(flat, vec![[1.0, 2.0, 3.0], [-4.0, 0.5, 0.0]]);
    }

    #[test]
    fn layouts_pick_their_location() {
        for location in 0..3 {
            let layout = vec3_layout(location);
            assert_eq!(layout.array_stride, 12);
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, location);
        }
    }
}
