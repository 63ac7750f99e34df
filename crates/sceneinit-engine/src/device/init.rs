/// Initialization parameters for the GPU layer.
///
/// Renderer-level switches (anti-aliasing, shadows) come from
/// `render::RendererParams`; this covers how the device and swapchain are set up.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is vsynced, which is what a frame-callback driven loop expects.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Sample count used when anti-aliasing is requested and supported.
    pub msaa_samples: u32,

    /// Edge length of the square shadow-map depth target.
    pub shadow_map_size: u32,

    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. A hint.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            msaa_samples: 4,
            shadow_map_size: 2048,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
