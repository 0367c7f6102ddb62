use bytemuck::{Pod, Zeroable};
use glam::{Mat2, Vec2};
use tracing::trace;
use wgpu::util::DeviceExt;

use crate::model::{FrameBuffer, ShaderParams};
use crate::view::GpuContext;

const SHADER_SOURCE: &str = include_str!("../shaders/rotozoom.wgsl");

/// Frame texture layout; the compositor writes BGRA bytes
pub const FRAME_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

/// Full-screen quad as a triangle strip
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, 1.0], uv: [0.0, 0.0] },  // top left
    QuadVertex { pos: [1.0, 1.0], uv: [1.0, 0.0] },   // top right
    QuadVertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] }, // bottom left
    QuadVertex { pos: [1.0, -1.0], uv: [1.0, 1.0] },  // bottom right
];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RotozoomUniform {
    pub angle: f32,
    pub scale: f32,
    pub _pad: [f32; 2],
}

impl From<ShaderParams> for RotozoomUniform {
    fn from(params: ShaderParams) -> Self {
        Self {
            angle: params.angle_rad,
            scale: params.scale,
            _pad: [0.0; 2],
        }
    }
}

/// CPU copy of `rotate2d` in rotozoom.wgsl
fn rotate2d(v: Vec2, a: f32) -> Vec2 {
    let (s, c) = a.sin_cos();
    Mat2::from_cols(Vec2::new(c, -s), Vec2::new(s, c)) * v
}

/// Texture coordinate the fragment shader samples for output coordinate `uv`.
/// Host-side mirror of `fs_main`, used to check the mapping without a GPU;
/// rendering never calls it.
pub fn sample_position(uv: Vec2, angle: f32, scale: f32) -> Vec2 {
    let centre = Vec2::splat(0.5);
    let p = rotate2d(scale * (uv - centre), -angle) + centre;
    if p.x > 1.0 || p.x < 0.0 || p.y > 1.0 || p.y < 0.0 {
        Vec2::ZERO
    } else {
        p
    }
}

/// Texture holding one composited frame. Destroyed when dropped.
pub struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl FrameTexture {
    pub fn upload(gpu: &GpuContext, renderer: &RotozoomRenderer, frame: &FrameBuffer) -> Self {
        let size = wgpu::Extent3d {
            width: frame.width(),
            height: frame.height(),
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * frame.width()),
                rows_per_image: Some(frame.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &renderer.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: renderer.uniform_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&renderer.sampler) },
            ],
        });

        Self { texture, bind_group }
    }
}

impl Drop for FrameTexture {
    fn drop(&mut self) {
        trace!("releasing frame texture");
        self.texture.destroy();
    }
}

/// Pipeline and fixed resources for the rotate/zoom pass
pub struct RotozoomRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    quad_buffer: wgpu::Buffer,
}

impl RotozoomRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rotozoom_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("rotozoom_uniform"),
            contents: bytemuck::bytes_of(&RotozoomUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rotozoom_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rotozoom_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("rotozoom_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x2 },
                        wgpu::VertexAttribute { offset: 8, shader_location: 1, format: wgpu::VertexFormat::Float32x2 },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            quad_buffer,
        }
    }

    /// Draw `texture` through the rotozoom shader and present the frame.
    pub fn draw(
        &self,
        gpu: &GpuContext,
        texture: &FrameTexture,
        params: ShaderParams,
    ) -> Result<(), wgpu::SurfaceError> {
        gpu.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&RotozoomUniform::from(params)));

        let output = gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rotozoom_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &texture.bind_group, &[]);
            rp.set_vertex_buffer(0, self.quad_buffer.slice(..));
            rp.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
