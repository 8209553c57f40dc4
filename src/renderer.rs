//! Headless hand renderer
//!
//! [`HandRenderer`] owns a surfaceless wgpu device, one render pipeline, the
//! reusable geometry buffers, and the off-screen targets. Each call to
//! [`HandRenderer::render_hand`] overwrites the vertex buffer in place, draws
//! into a multisampled color target, resolves to a single-sample texture, and
//! reads the pixels back into a fresh [`RgbImage`].

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use image::RgbImage;
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::framing;
use crate::model::MANO_VERTEX_COUNT;

/// Pass-through vertex stage and flat-shaded fragment stage.
///
/// Positions arrive already framed in GL-style clip space; the vertex stage
/// only remaps depth from [-1, 1] to wgpu's [0, 1]. Per-triangle flat normals
/// come from screen-space derivatives, the substitute for a geometry-stage
/// edge cross-product on APIs without geometry shaders. Shading is two fixed
/// directional lights (Lambertian weights 0.8 and 1.0), a Blinn specular lobe
/// contributing at a fixed 0.2 weight, and a constant ambient term over one
/// uniform base color.
pub const HAND_SHADER: &str = r#"
struct HandUniforms {
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> hand: HandUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) position: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = vec4<f32>(position.xy, position.z * 0.5 + 0.5, 1.0);
    output.position = position;
    return output;
}

const LIGHT1: vec3<f32> = vec3<f32>(1.0, 1.0, -1.0);
const LIGHT2: vec3<f32> = vec3<f32>(0.0, 0.0, 1.0);
const VIEW_DIR: vec3<f32> = vec3<f32>(0.0, 0.0, 1.0);
const AMBIENT: vec3<f32> = vec3<f32>(0.13, 0.13, 0.13);
const SHININESS: f32 = 16.0;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(cross(dpdx(input.position), dpdy(input.position)));

    let lambert1 = max(0.0, dot(normal, -normalize(LIGHT1)));
    let lambert2 = max(0.0, dot(normal, -normalize(LIGHT2)));

    let half_dir = normalize(LIGHT2 + VIEW_DIR);
    let specular = pow(max(dot(half_dir, normal), 0.0), SHININESS);

    let shaded = AMBIENT
        + 0.8 * lambert1 * hand.color.rgb
        + 1.0 * lambert2 * hand.color.rgb
        + vec3<f32>(0.2 * specular);
    return vec4<f32>(shaded, 1.0);
}
"#;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Background the multisampled target is cleared to before every draw.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.9,
    g: 0.9,
    b: 0.9,
    a: 1.0,
};

/// Configuration for constructing a [`HandRenderer`]
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Edge length of a single rendered hand image, in pixels
    pub image_size: u32,
    /// Vertex-buffer capacity; every rendered mesh must match it exactly
    pub vertex_count: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            image_size: 128,
            vertex_count: MANO_VERTEX_COUNT,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct HandUniforms {
    color: [f32; 4],
}

/// Headless renderer for a single posed hand mesh
pub struct HandRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    msaa_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    resolve_texture: wgpu::Texture,
    resolve_view: wgpu::TextureView,
    readback_buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
    image_size: u32,
    vertex_count: usize,
}

impl HandRenderer {
    /// Create the graphics context and every GPU resource the renderer needs.
    ///
    /// `faces` is the fixed triangle list of the hand topology; it is uploaded
    /// once into an immutable index buffer. All resources are acquired here
    /// and released together when the renderer is dropped.
    pub fn new(config: &RendererConfig, faces: &[[u32; 3]]) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterNotFound)?;

        log::debug!("rendering on adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("hand renderer device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        // 8x antialiasing where the format supports it, otherwise the
        // universally available 4x.
        let format_flags = adapter.get_texture_format_features(COLOR_FORMAT).flags;
        let sample_count = if format_flags.sample_count_supported(8) { 8 } else { 4 };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("hand shader"),
            source: wgpu::ShaderSource::Wgsl(HAND_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hand uniforms layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("hand pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("hand pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: Default::default(),
                buffers: &[vertex_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hand vertex buffer"),
            size: (config.vertex_count * std::mem::size_of::<[f32; 3]>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hand index buffer"),
            contents: bytemuck::cast_slice(faces),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hand uniform buffer"),
            size: std::mem::size_of::<HandUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hand uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let extent = wgpu::Extent3d {
            width: config.image_size,
            height: config.image_size,
            depth_or_array_layers: 1,
        };

        let msaa_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let resolve_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("resolve target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        // Texture rows must be copied out at 256-byte alignment.
        let unpadded_bytes_per_row = config.image_size * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback buffer"),
            size: (padded_bytes_per_row * config.image_size) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let msaa_view = msaa_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let resolve_view = resolve_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: faces.len() as u32 * 3,
            msaa_view,
            depth_view,
            resolve_texture,
            resolve_view,
            readback_buffer,
            padded_bytes_per_row,
            image_size: config.image_size,
            vertex_count: config.vertex_count,
        })
    }

    /// Edge length of a rendered tile, in pixels.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Vertex-buffer capacity every rendered mesh must match.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Render one posed hand mesh to an image.
    ///
    /// `vertices` must match the configured vertex count exactly; `color` is
    /// an RGB triple in [0, 1]. The vertex buffer is overwritten in place, so
    /// renders are strictly sequential, but the returned image is a fresh copy
    /// that stays valid past the next call.
    pub fn render_hand(&mut self, vertices: &[Vec3], color: [f32; 3]) -> RenderResult<RgbImage> {
        if vertices.len() != self.vertex_count {
            return Err(RenderError::VertexCountMismatch {
                expected: self.vertex_count,
                actual: vertices.len(),
            });
        }

        let framed = framing::frame_vertices(vertices);
        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&framed));

        let uniforms = HandUniforms {
            color: [color[0], color[1], color[2], 1.0],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("hand render encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hand pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.msaa_view,
                    resolve_target: Some(&self.resolve_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
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
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.resolve_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.image_size),
                },
            },
            wgpu::Extent3d {
                width: self.image_size,
                height: self.image_size,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        receiver.recv().map_err(|_| RenderError::ReadbackInterrupted)??;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((self.image_size * self.image_size * 3) as usize);
        for y in 0..self.image_size {
            let row_start = (y * self.padded_bytes_per_row) as usize;
            let row = &data[row_start..row_start + (self.image_size * 4) as usize];
            for rgba in row.chunks_exact(4) {
                pixels.extend_from_slice(&rgba[..3]);
            }
        }
        drop(data);
        self.readback_buffer.unmap();

        RgbImage::from_raw(self.image_size, self.image_size, pixels)
            .ok_or(RenderError::ReadbackInterrupted)
    }
}
