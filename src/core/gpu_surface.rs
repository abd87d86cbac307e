use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::{BindGroup, BindGroupLayout, Device, Queue, RenderPipeline, Surface, SurfaceConfiguration, Texture};
use winit::window::Window;

use super::surface::{DisplaySurface, SurfaceSize};
use crate::config::SurfaceConfig;
use crate::error::{BridgeError, Result};
use crate::frame::{FrameView, BYTES_PER_PIXEL};

/// Window surface backed by wgpu
///
/// Frames are uploaded into a texture the size of the surface, then drawn
/// with a fullscreen triangle and `BlendState::REPLACE`, so each present is
/// a straight overwrite. The texture keeps its contents between frames;
/// only the region a frame covers changes.
pub struct GpuSurface {
    window: Arc<Window>,
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    render_pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    texture_format: wgpu::TextureFormat,
    /// `None` while the surface is collapsed
    target: Option<(Texture, BindGroup)>,
    size: SurfaceSize,
}

impl GpuSurface {
    /// Create a surface for a window, configured once for the lifetime of the surface
    pub fn new(window: Arc<Window>, config: &SurfaceConfig) -> Result<Self> {
        let inner = window.inner_size();
        let size = SurfaceSize::new(inner.width, inner.height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BridgeError::surface_unavailable(format!("cannot create window surface: {}", e)))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| BridgeError::surface_unavailable(format!("no adapter for surface: {:?}", e)))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Frame Bridge Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: Default::default(),
        }))
        .map_err(|e| BridgeError::surface_unavailable(format!("failed to create device: {:?}", e)))?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| BridgeError::surface_unavailable("surface reports no formats"))?;

        // Matching the encoding on both ends keeps byte values unchanged on screen
        let texture_format = if surface_format.is_srgb() {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let present_mode = choose_present_mode(&caps.present_modes, config.low_latency);
        let alpha_mode = choose_alpha_mode(&caps.alpha_modes, config.opaque);

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: if config.low_latency { 1 } else { 2 },
        };

        let bind_group_layout = Self::create_bind_group_layout(&device);
        let render_pipeline = Self::create_render_pipeline(&device, &bind_group_layout, surface_format);

        info!(
            "Surface ready: {}x{} {:?}, {:?}, {:?}",
            size.width, size.height, surface_format, present_mode, alpha_mode
        );

        let mut gpu_surface = Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            render_pipeline,
            bind_group_layout,
            texture_format,
            target: None,
            size: SurfaceSize::ZERO,
        };
        gpu_surface.set_size(size);
        Ok(gpu_surface)
    }

    /// Window the surface draws into
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        self.surface_config.present_mode
    }

    fn draw(&self) -> Result<()> {
        let Some((_, bind_group)) = &self.target else {
            return Ok(());
        };

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                debug!("Surface outdated, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring surface texture, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(BridgeError::backend(e.to_string())),
        };

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Bridge Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Bridge Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
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

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }

    fn create_target(&self, size: SurfaceSize) -> (Texture, BindGroup) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Bridge Texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bridge Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        (texture, bind_group)
    }

    fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bridge Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        })
    }

    fn create_render_pipeline(
        device: &Device,
        bind_group_layout: &BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Frame Bridge Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../display.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Frame Bridge Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Frame Bridge Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
    }
}

impl DisplaySurface for GpuSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn blit(&mut self, frame: &FrameView<'_>) -> Result<()> {
        let region = self.size.clip(frame.size());
        let Some((texture, _)) = &self.target else {
            return Ok(());
        };
        if region.is_collapsed() {
            return Ok(());
        }

        self.queue.write_texture(
            texture.as_image_copy(),
            frame.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width() * BYTES_PER_PIXEL as u32),
                rows_per_image: Some(frame.height()),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );

        self.draw()
    }

    fn set_size(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        self.size = size;

        // wgpu rejects zero-sized configurations; keep the size and wait
        if size.is_collapsed() {
            self.target = None;
            return;
        }

        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.target = Some(self.create_target(size));
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }
}

/// Lowest-latency mode the surface supports, or vsync when latency does not matter
pub fn choose_present_mode(supported: &[wgpu::PresentMode], low_latency: bool) -> wgpu::PresentMode {
    if !low_latency {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|mode| supported.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

/// Opaque compositing when requested and available, else the surface default
pub fn choose_alpha_mode(supported: &[wgpu::CompositeAlphaMode], opaque: bool) -> wgpu::CompositeAlphaMode {
    if opaque && supported.contains(&wgpu::CompositeAlphaMode::Opaque) {
        return wgpu::CompositeAlphaMode::Opaque;
    }
    supported.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, PresentMode};

    #[test]
    fn test_present_mode_prefers_mailbox() {
        let supported = [PresentMode::Fifo, PresentMode::Immediate, PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&supported, true), PresentMode::Mailbox);
    }

    #[test]
    fn test_present_mode_falls_back_to_immediate_then_fifo() {
        assert_eq!(
            choose_present_mode(&[PresentMode::Fifo, PresentMode::Immediate], true),
            PresentMode::Immediate
        );
        assert_eq!(choose_present_mode(&[PresentMode::Fifo], true), PresentMode::Fifo);
        assert_eq!(choose_present_mode(&[], true), PresentMode::Fifo);
    }

    #[test]
    fn test_present_mode_without_low_latency_is_vsync() {
        let supported = [PresentMode::Mailbox, PresentMode::Fifo];
        assert_eq!(choose_present_mode(&supported, false), PresentMode::Fifo);
    }

    #[test]
    fn test_alpha_mode_opaque_when_available() {
        let supported = [CompositeAlphaMode::PreMultiplied, CompositeAlphaMode::Opaque];
        assert_eq!(choose_alpha_mode(&supported, true), CompositeAlphaMode::Opaque);
        assert_eq!(choose_alpha_mode(&supported, false), CompositeAlphaMode::PreMultiplied);
    }

    #[test]
    fn test_alpha_mode_falls_back_to_first_supported() {
        assert_eq!(
            choose_alpha_mode(&[CompositeAlphaMode::Inherit], true),
            CompositeAlphaMode::Inherit
        );
        assert_eq!(choose_alpha_mode(&[], true), CompositeAlphaMode::Auto);
    }
}
