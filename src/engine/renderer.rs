// Tree renderer: three pipelines over one shared uniform block.
//
//   line     → LineList over positions only (skeleton, ring loops, stick lines)
//   strip    → TriangleStrip with Uint32 restart (stick bark)
//   triangle → TriangleList (joint bark)
//
// Per frame the bark goes down first (stick, then joint, depth-tested against
// each other), then the line overlays (skeleton, rings, stick lines) on top.
// Overlays neither test nor write depth, so they stay visible inside the bark.

use super::camera::FrameMatrices;
use super::config::DrawFlags;
use super::mesh::{
    vec3_layout, IndexBuffer, TreeBuffers, Uniforms, COLOUR_LOCATION, NORMAL_LOCATION,
    POSITION_LOCATION,
};
use super::tree::Tree;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOUR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.3, b: 0.1, a: 1.0 };

pub struct Renderer {
    line_pipeline:     wgpu::RenderPipeline,
    strip_pipeline:    wgpu::RenderPipeline,
    triangle_pipeline: wgpu::RenderPipeline,

    uniform_buffer:     wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view:         wgpu::TextureView,

    buffers: TreeBuffers,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: (u32, u32),
        tree: &Tree,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tree Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../line.wgsl").into()),
        });
        let bark_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bark Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../bark.wgsl").into()),
        });

        let position_only = [vec3_layout(POSITION_LOCATION)];
        let bark_buffers = [
            vec3_layout(POSITION_LOCATION),
            vec3_layout(COLOUR_LOCATION),
            vec3_layout(NORMAL_LOCATION),
        ];

        let line_pipeline = create_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Line Pipeline",
                shader: &line_shader,
                buffers: &position_only,
                format,
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                cull_mode: None,
                depth_compare: wgpu::CompareFunction::Always,
                depth_write: false,
            },
        );
        let strip_pipeline = create_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Stick Bark Pipeline",
                shader: &bark_shader,
                buffers: &bark_buffers,
                format,
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint32),
                cull_mode: Some(wgpu::Face::Back),
                depth_compare: wgpu::CompareFunction::Less,
                depth_write: true,
            },
        );
        let triangle_pipeline = create_pipeline(
            device,
            &layout,
            PipelineSpec {
                label: "Joint Bark Pipeline",
                shader: &bark_shader,
                buffers: &bark_buffers,
                format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                cull_mode: Some(wgpu::Face::Back),
                depth_compare: wgpu::CompareFunction::Less,
                depth_write: true,
            },
        );

        Self {
            line_pipeline,
            strip_pipeline,
            triangle_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view: create_depth_view(device, size),
            buffers: TreeBuffers::upload(device, tree),
        }
    }

    /// Swap in a freshly grown tree. Old buffers drop with the old `TreeBuffers`.
    pub fn set_tree(&mut self, device: &wgpu::Device, tree: &Tree) {
        self.buffers = TreeBuffers::upload(device, tree);
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        self.depth_view = create_depth_view(device, size);
    }

    pub fn draw_frame(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        matrices: &FrameMatrices,
        flags: DrawFlags,
    ) {
        let uniforms = Uniforms::new(matrices.mvp, matrices.normal_matrix);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Tree Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        let b = &self.buffers;

        for layer in draw_layers(flags) {
            match layer {
                DrawLayer::StickBark => {
                    render_pass.set_pipeline(&self.strip_pipeline);
                    render_pass.set_vertex_buffer(0, b.ring_positions.slice(..));
                    render_pass.set_vertex_buffer(1, b.colours.slice(..));
                    render_pass.set_vertex_buffer(2, b.stick_normals.slice(..));
                    draw_indexed(&mut render_pass, b.stick_bark.as_ref());
                }
                DrawLayer::JointBark => {
                    render_pass.set_pipeline(&self.triangle_pipeline);
                    render_pass.set_vertex_buffer(0, b.ring_positions.slice(..));
                    render_pass.set_vertex_buffer(1, b.colours.slice(..));
                    render_pass.set_vertex_buffer(2, b.joint_normals.slice(..));
                    draw_indexed(&mut render_pass, b.joint_bark.as_ref());
                }
                DrawLayer::Skeleton => {
                    render_pass.set_pipeline(&self.line_pipeline);
                    render_pass.set_vertex_buffer(0, b.skeleton_positions.slice(..));
                    draw_indexed(&mut render_pass, b.skeleton_lines.as_ref());
                }
                DrawLayer::Rings => {
                    render_pass.set_pipeline(&self.line_pipeline);
                    render_pass.set_vertex_buffer(0, b.ring_positions.slice(..));
                    draw_indexed(&mut render_pass, b.ring_loops.as_ref());
                }
                DrawLayer::StickLines => {
                    render_pass.set_pipeline(&self.line_pipeline);
                    render_pass.set_vertex_buffer(0, b.ring_positions.slice(..));
                    draw_indexed(&mut render_pass, b.stick_lines.as_ref());
                }
            }
        }
    }
}

/// One flag-gated draw within the tree pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLayer {
    StickBark,
    JointBark,
    Skeleton,
    Rings,
    StickLines,
}

impl DrawLayer {
    pub fn is_overlay(self) -> bool {
        matches!(self, Self::Skeleton | Self::Rings | Self::StickLines)
    }
}

/// Enabled layers in submission order: bark first, overlays after it.
pub fn draw_layers(flags: DrawFlags) -> Vec<DrawLayer> {
    [
        (flags.stick_bark, DrawLayer::StickBark),
        (flags.joint_bark, DrawLayer::JointBark),
        (flags.skeleton, DrawLayer::Skeleton),
        (flags.rings, DrawLayer::Rings),
        (flags.stick_lines, DrawLayer::StickLines),
    ]
    .into_iter()
    .filter_map(|(on, layer)| on.then_some(layer))
    .collect()
}

fn draw_indexed(render_pass: &mut wgpu::RenderPass<'_>, indices: Option<&IndexBuffer>) {
    if let Some(indices) = indices {
        render_pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..indices.count, 0, 0..1);
    }
}

struct PipelineSpec<'a> {
    label:              &'a str,
    shader:             &'a wgpu::ShaderModule,
    buffers:            &'a [wgpu::VertexBufferLayout<'static>],
    format:             wgpu::TextureFormat,
    topology:           wgpu::PrimitiveTopology,
    strip_index_format: Option<wgpu::IndexFormat>,
    cull_mode:          Option<wgpu::Face>,
    depth_compare:      wgpu::CompareFunction,
    depth_write:        bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: spec.buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: spec.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            strip_index_format: spec.strip_index_format,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: spec.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> DrawFlags {
        DrawFlags { skeleton: true, rings: true, stick_lines: true, stick_bark: true, joint_bark: true }
    }

    #[test]
    fn overlays_are_drawn_after_the_bark() {
        let layers = draw_layers(all_on());
        assert_eq!(layers.len(), 5);
        let first_overlay = layers
            .iter()
            .position(|l| l.is_overlay())
            .expect("overlays enabled");
        assert!(
            layers[first_overlay..].iter().all(|l| l.is_overlay()),
            "bark after an overlay would paint over it: {layers:?}"
        );
    }

    #[test]
    fn default_flags_draw_only_bark() {
        assert_eq!(
            draw_layers(DrawFlags::default()),
            vec![DrawLayer::StickBark, DrawLayer::JointBark]
        );
    }

    #[test]
    fn each_flag_gates_its_own_layer() {
        let off = DrawFlags {
            skeleton: false,
            rings: false,
            stick_lines: false,
            stick_bark: false,
            joint_bark: false,
        };
        assert!(draw_layers(off).is_empty());
        assert_eq!(draw_layers(DrawFlags { rings: true, ..off }), vec![DrawLayer::Rings]);
        assert_eq!(draw_layers(DrawFlags { skeleton: true, ..off }), vec![DrawLayer::Skeleton]);
        assert_eq!(draw_layers(DrawFlags { stick_lines: true, ..off }), vec![DrawLayer::StickLines]);
    }
}
