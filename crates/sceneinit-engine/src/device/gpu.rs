use std::sync::Arc;

use anyhow::{Context, Result, bail};
use nalgebra::Matrix4;
use wgpu::SurfaceError;
use winit::window::Window;

use crate::host::ViewportSize;
use crate::render::{FrameData, RenderSurface, RendererParams};

use super::surface::{self, DEPTH_FORMAT};
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// Camera block shared with scene pipelines (group 0, binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

/// Maps OpenGL clip-space depth (-1..1) onto wgpu's 0..1.
fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Size-dependent attachments, rebuilt on resize.
struct Targets {
    /// Multisampled color target; `None` when rendering straight to the swapchain.
    msaa: Option<wgpu::TextureView>,
    depth: wgpu::TextureView,
}

/// wgpu-backed drawing surface for one window.
///
/// Owns the device, queue and swapchain configuration, plus:
/// - a multisampled color target when anti-aliasing is on and supported
/// - a depth target
/// - a shadow-map depth target while shadows are enabled
/// - the camera uniform buffer, rewritten every frame
pub struct GpuSurface {
    id: String,
    window: Arc<Window>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: ViewportSize,

    sample_count: u32,
    targets: Option<Targets>,

    shadow_map_size: u32,
    shadow_map: Option<wgpu::TextureView>,

    camera_buffer: wgpu::Buffer,
    camera_layout: wgpu::BindGroupLayout,
    camera_bind_group: wgpu::BindGroup,
}

impl GpuSurface {
    /// Creates a surface bound to `window`, identified in the host as `id`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(
        id: impl Into<String>,
        window: Arc<Window>,
        init: &GpuInit,
        params: &RendererParams,
    ) -> Result<Self> {
        let id = id.into();
        let physical = window.inner_size();
        let size = ViewportSize::new(physical.width, physical.height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .with_context(|| format!("failed to create wgpu surface for `{id}`"))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sceneinit device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let sample_count = if params.antialias {
            surface::choose_sample_count(&adapter, format, init.msaa_samples)
        } else {
            1
        };
        if params.antialias && sample_count == 1 {
            log::warn!("anti-aliasing requested but {format:?} has no multisample support");
        }

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sceneinit camera"),
            size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sceneinit camera layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sceneinit camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "surface `{id}`: {}x{} {format:?}, {sample_count}x MSAA, {:?}",
            size.width,
            size.height,
            adapter.get_info().backend
        );

        let mut gpu = Self {
            id,
            window,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            targets: None,
            shadow_map_size: init.shadow_map_size,
            shadow_map: None,
            camera_buffer,
            camera_layout,
            camera_bind_group,
        };
        gpu.rebuild_targets();
        gpu.set_shadow_map_enabled(params.shadow_map_enabled);
        Ok(gpu)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Layout of the camera uniform, for pipelines that draw scene nodes.
    pub fn camera_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_layout
    }

    pub fn camera_bind_group(&self) -> &wgpu::BindGroup {
        &self.camera_bind_group
    }

    /// Shadow-map depth view while shadows are enabled.
    pub fn shadow_map(&self) -> Option<&wgpu::TextureView> {
        self.shadow_map.as_ref()
    }

    fn rebuild_targets(&mut self) {
        let extent = (self.config.width, self.config.height);

        let msaa = (self.sample_count > 1).then(|| {
            surface::create_target(&self.device, "sceneinit msaa color", self.config.format, extent, self.sample_count)
        });
        let depth = surface::create_target(&self.device, "sceneinit depth", DEPTH_FORMAT, extent, self.sample_count);

        self.targets = Some(Targets { msaa, depth });
    }

    fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sceneinit frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Presentation occurs when `surface_texture` is dropped after submission.
    fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        drop(frame.surface_texture);
    }
}

impl RenderSurface for GpuSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        match (enabled, self.shadow_map.is_some()) {
            (true, false) => {
                let edge = self.shadow_map_size;
                self.shadow_map = Some(surface::create_target(
                    &self.device,
                    "sceneinit shadow map",
                    DEPTH_FORMAT,
                    (edge, edge),
                    1,
                ));
            }
            (false, true) => self.shadow_map = None,
            _ => {}
        }
    }

    /// wgpu cannot configure a 0x0 surface; in that case only the size is
    /// recorded and configuration waits for a non-empty size.
    fn resize(&mut self, size: ViewportSize) {
        self.size = size;
        if size.is_empty() {
            return;
        }

        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.rebuild_targets();
    }

    fn draw(&mut self, frame_data: &FrameData) -> Result<()> {
        if self.size.is_empty() {
            return Ok(());
        }

        let mut frame = match self.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = surface::map_surface_error(&self.surface, &self.device, &self.config, err.clone());
                if action == SurfaceErrorAction::Fatal {
                    bail!("surface `{}` lost: {err}", self.id);
                }
                log::debug!("skipping frame on `{}`: {err}", self.id);
                return Ok(());
            }
        };

        let uniform = CameraUniform {
            view_proj: (opengl_to_wgpu() * frame_data.view_proj).into(),
            eye: [frame_data.eye.x, frame_data.eye.y, frame_data.eye.z, 1.0],
        };
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
        log::trace!("`{}`: frame with {} visible nodes", self.id, frame_data.visible_nodes);

        // No lights cast shadows yet; the pass only resets the depth map.
        if let Some(shadow_map) = &self.shadow_map {
            let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sceneinit shadow"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: shadow_map,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let Some(targets) = &self.targets else {
            bail!("surface `{}` has no render targets", self.id);
        };

        let (view, resolve_target, store) = match &targets.msaa {
            Some(msaa) => (msaa, Some(&frame.view), wgpu::StoreOp::Discard),
            None => (&frame.view, None, wgpu::StoreOp::Store),
        };

        {
            let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sceneinit main"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame_data.clear.into()),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.window.pre_present_notify();
        self.submit(frame);
        Ok(())
    }
}
