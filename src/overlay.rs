//! 2D overlay rendering: control readouts and in-scene error messages.
//!
//! A single batched pipeline pair (colored rects + glyph quads) drawn over
//! the finished 3D frame. Glyphs come from a [`fontdue`] atlas rasterized
//! once at startup from a system font; when no usable font is found the
//! overlay degrades to rects only and logs a warning, rather than failing
//! the viewer.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::gpu::GpuContext;

/// RGBA color, straight alpha, components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    /// Semi-transparent backing behind readout text.
    pub const PANEL_BG: Color = Color::rgba(1.0, 1.0, 1.0, 0.85);
}

/// Vertex for overlay rects and glyphs, in pixel coordinates.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex2d {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl Vertex2d {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniforms {
    resolution: [f32; 2],
    _pad: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// Candidate system fonts, tried in order.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Pen advance for one character: the glyph's own advance, or half the font
/// size for characters the atlas does not carry. Both the layout and the
/// measurement path go through here so backing rects never under-measure.
fn char_advance(glyphs: &HashMap<char, GlyphInfo>, size: f32, ch: char) -> f32 {
    glyphs.get(&ch).map(|g| g.advance).unwrap_or(size * 0.5)
}

#[derive(Clone, Copy, Debug)]
struct GlyphInfo {
    /// UV rect in the atlas, normalized.
    uv: [f32; 4],
    width: u32,
    height: u32,
    offset_x: f32,
    offset_y: f32,
    advance: f32,
}

/// Pre-rasterized glyphs for the printable ASCII range plus the degree sign.
struct FontAtlas {
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    fn new(gpu: &GpuContext, font_data: &[u8], size: f32) -> Option<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default()).ok()?;

        // The degree sign is part of every rotation/view readout.
        let chars: Vec<char> = (32u8..=126u8).map(|c| c as char).chain(['°']).collect();

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = chars
            .iter()
            .map(|&c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        // Simple row packing; grow the atlas until everything fits.
        let padding = 1u32;
        let mut atlas_width = 256u32;
        let mut atlas_height = 256u32;
        loop {
            let mut x = padding;
            let mut y = padding;
            let mut row_height = 0u32;
            let mut fits = true;

            for (_, metrics, _) in &rasterized {
                let (gw, gh) = (metrics.width as u32, metrics.height as u32);
                if x + gw + padding > atlas_width {
                    x = padding;
                    y += row_height + padding;
                    row_height = 0;
                }
                if y + gh + padding > atlas_height {
                    fits = false;
                    break;
                }
                x += gw + padding;
                row_height = row_height.max(gh);
            }

            if fits {
                break;
            }
            if atlas_width <= atlas_height {
                atlas_width *= 2;
            } else {
                atlas_height *= 2;
            }
        }

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::new();
        let mut x = padding;
        let mut y = padding;
        let mut row_height = 0u32;

        for (c, metrics, bitmap) in &rasterized {
            let (gw, gh) = (metrics.width as u32, metrics.height as u32);
            if x + gw + padding > atlas_width {
                x = padding;
                y += row_height + padding;
                row_height = 0;
            }

            for gy in 0..gh {
                for gx in 0..gw {
                    let src = (gy * gw + gx) as usize;
                    let dst = ((y + gy) * atlas_width + x + gx) as usize;
                    atlas_data[dst] = bitmap[src];
                }
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        gw as f32 / atlas_width as f32,
                        gh as f32 / atlas_height as f32,
                    ],
                    width: gw,
                    height: gh,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );

            x += gw + padding;
            row_height = row_height.max(gh);
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
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
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Atlas Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Some(Self {
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }

    fn from_system(gpu: &GpuContext, size: f32) -> Option<Self> {
        for path in FONT_PATHS {
            if !Path::new(path).exists() {
                continue;
            }
            match std::fs::read(path) {
                Ok(data) => {
                    if let Some(atlas) = Self::new(gpu, &data, size) {
                        log::info!("overlay font: {}", path);
                        return Some(atlas);
                    }
                }
                Err(e) => log::debug!("could not read font {}: {}", path, e),
            }
        }
        None
    }
}

/// Batched overlay renderer.
pub struct Overlay {
    rect_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    atlas_bind_group: Option<wgpu::BindGroup>,
    atlas: Option<FontAtlas>,
    vertex_buffer: wgpu::Buffer,
    rect_vertices: Vec<Vertex2d>,
    text_vertices: Vec<Vertex2d>,
}

impl Overlay {
    pub fn new(gpu: &GpuContext, font_size: f32) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Uniforms"),
            size: std::mem::size_of::<OverlayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Overlay Uniform Layout"),
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
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let atlas_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Overlay Atlas Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let rect_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Rect Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });
        let text_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Text Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &atlas_bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str,
                             layout: &wgpu::PipelineLayout,
                             fs_entry: &str|
         -> wgpu::RenderPipeline {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let rect_pipeline = make_pipeline("Overlay Rect Pipeline", &rect_layout, "fs_color");
        let text_pipeline = make_pipeline("Overlay Text Pipeline", &text_layout, "fs_text");

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let atlas = FontAtlas::from_system(gpu, font_size);
        if atlas.is_none() {
            log::warn!("no usable system font found; overlay text disabled");
        }
        let atlas_bind_group = atlas.as_ref().map(|atlas| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Overlay Atlas Bind Group"),
                layout: &atlas_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&atlas.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                    },
                ],
            })
        });

        Self {
            rect_pipeline,
            text_pipeline,
            uniform_buffer,
            uniform_bind_group,
            atlas_bind_group,
            atlas,
            vertex_buffer,
            rect_vertices: Vec::new(),
            text_vertices: Vec::new(),
        }
    }

    /// Height of one text line, or a sane default when text is disabled.
    pub fn line_height(&self) -> f32 {
        self.atlas.as_ref().map(|a| a.line_height).unwrap_or(20.0)
    }

    /// Pixel width of `text` when drawn.
    pub fn text_width(&self, text: &str) -> f32 {
        let Some(atlas) = &self.atlas else {
            return 0.0;
        };
        text.chars()
            .map(|c| char_advance(&atlas.glyphs, atlas.size, c))
            .sum()
    }

    /// Queues a filled rectangle.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let c = [color.r, color.g, color.b, color.a];
        let quad = [
            ([x, y], [0.0, 0.0]),
            ([x + w, y], [0.0, 0.0]),
            ([x + w, y + h], [0.0, 0.0]),
            ([x, y], [0.0, 0.0]),
            ([x + w, y + h], [0.0, 0.0]),
            ([x, y + h], [0.0, 0.0]),
        ];
        for (position, uv) in quad {
            self.rect_vertices.push(Vertex2d {
                position,
                uv,
                color: c,
            });
        }
    }

    /// Queues a text run with `(x, y)` as the top-left of the line box.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Color) {
        let Some(atlas) = &self.atlas else {
            return;
        };
        let c = [color.r, color.g, color.b, color.a];
        let baseline = y + atlas.size;
        let mut pen_x = x;

        for ch in text.chars() {
            let Some(glyph) = atlas.glyphs.get(&ch) else {
                pen_x += char_advance(&atlas.glyphs, atlas.size, ch);
                continue;
            };

            let gx = pen_x + glyph.offset_x;
            let gy = baseline - glyph.offset_y - glyph.height as f32;
            let (gw, gh) = (glyph.width as f32, glyph.height as f32);
            let [u, v, uw, vh] = glyph.uv;

            if gw > 0.0 && gh > 0.0 {
                let quad = [
                    ([gx, gy], [u, v]),
                    ([gx + gw, gy], [u + uw, v]),
                    ([gx + gw, gy + gh], [u + uw, v + vh]),
                    ([gx, gy], [u, v]),
                    ([gx + gw, gy + gh], [u + uw, v + vh]),
                    ([gx, gy + gh], [u, v + vh]),
                ];
                for (position, uv) in quad {
                    self.text_vertices.push(Vertex2d {
                        position,
                        uv,
                        color: c,
                    });
                }
            }
            pen_x += glyph.advance;
        }
    }

    /// Uploads the queued batches and draws them over `target`.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let total = self.rect_vertices.len() + self.text_vertices.len();
        if total == 0 {
            return;
        }
        if total > MAX_VERTICES {
            log::warn!("overlay vertex budget exceeded ({total}); dropping frame's overlay");
            self.rect_vertices.clear();
            self.text_vertices.clear();
            return;
        }

        let uniforms = OverlayUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _pad: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let rect_count = self.rect_vertices.len() as u32;
        let text_count = self.text_vertices.len() as u32;
        let mut vertices = std::mem::take(&mut self.rect_vertices);
        vertices.append(&mut self.text_vertices);
        gpu.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

        if rect_count > 0 {
            render_pass.set_pipeline(&self.rect_pipeline);
            render_pass.draw(0..rect_count, 0..1);
        }
        if text_count > 0 {
            if let Some(atlas_bind_group) = &self.atlas_bind_group {
                render_pass.set_pipeline(&self.text_pipeline);
                render_pass.set_bind_group(1, atlas_bind_group, &[]);
                render_pass.draw(rect_count..rect_count + text_count, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_glyph_map(ch: char, advance: f32) -> HashMap<char, GlyphInfo> {
        let mut glyphs = HashMap::new();
        glyphs.insert(
            ch,
            GlyphInfo {
                uv: [0.0, 0.0, 0.1, 0.1],
                width: 8,
                height: 12,
                offset_x: 0.0,
                offset_y: 0.0,
                advance,
            },
        );
        glyphs
    }

    #[test]
    fn missing_characters_still_advance_the_pen() {
        let glyphs = one_glyph_map('a', 9.0);
        assert_eq!(char_advance(&glyphs, 16.0, 'a'), 9.0);
        assert_eq!(char_advance(&glyphs, 16.0, 'ß'), 8.0);
    }

    #[test]
    fn measurement_matches_layout_for_unknown_characters() {
        // A failure message can carry characters outside the atlas (e.g. a
        // non-ASCII path); the measured width must include their fallback
        // advance or the backing rect comes up short.
        let glyphs = one_glyph_map('a', 9.0);
        let size = 16.0;

        let text = "aßa";
        let measured: f32 = text.chars().map(|c| char_advance(&glyphs, size, c)).sum();

        let mut pen = 0.0;
        for ch in text.chars() {
            pen += char_advance(&glyphs, size, ch);
        }

        assert_eq!(measured, 9.0 + 8.0 + 9.0);
        assert_eq!(measured, pen);
    }
}
