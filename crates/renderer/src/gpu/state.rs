use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use slideshow::LensState;
use winit::dpi::PhysicalSize;

use crate::loader::CanvasImage;

use super::context::GpuContext;
use super::pipeline::CrystalPipeline;
use super::slots::SlotPair;
use super::uniforms::CrystalUniforms;

/// Owns every GPU resource the slideshow renders with: surface context,
/// pipeline, the uniform block and the two photo slots.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: CrystalPipeline,
    uniforms: CrystalUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    slots: SlotPair,
    slot_bind_group: wgpu::BindGroup,
}

impl GpuState {
    pub fn new<T>(target: &T, size: PhysicalSize<u32>) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size)?;
        let pipeline = CrystalPipeline::new(&context.device, context.surface_format);

        let uniforms = CrystalUniforms::new(context.size.width as f32, context.size.height as f32);
        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("crystal uniforms"),
            size: std::mem::size_of::<CrystalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        // Letterbox bars end exactly at the canvas edge; clamping keeps
        // the refracted lookups from wrapping to the opposite side.
        let sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("photo sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let slots = SlotPair::new(&context.device, context.size);
        let slot_bind_group = pipeline.create_slot_bind_group(
            &context.device,
            &slots.front().view,
            &slots.back().view,
            &sampler,
        );

        Ok(Self {
            context,
            pipeline,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            sampler,
            slots,
            slot_bind_group,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub fn upload_front(&self, image: &CanvasImage) {
        self.slots.front().upload(&self.context.queue, image);
    }

    pub fn upload_back(&self, image: &CanvasImage) {
        self.slots.back().upload(&self.context.queue, image);
    }

    /// Promotes the back slot to front after a committed dissolve.
    pub fn swap_slots(&mut self) {
        self.slots.swap();
        self.rebuild_slot_bind_group();
    }

    /// Resizes the surface and recreates both slots at the new canvas
    /// size. The caller re-stages photos afterwards.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.slots.recreate(&self.context.device, self.context.size);
        self.uniforms
            .set_resolution(self.context.size.width as f32, self.context.size.height as f32);
        self.rebuild_slot_bind_group();
    }

    pub fn reconfigure(&self) {
        self.context.reconfigure();
    }

    fn rebuild_slot_bind_group(&mut self) {
        self.slot_bind_group = self.pipeline.create_slot_bind_group(
            &self.context.device,
            &self.slots.front().view,
            &self.slots.back().view,
            &self.sampler,
        );
    }

    pub fn render(&mut self, lens: &LensState, fade: f32) -> Result<(), wgpu::SurfaceError> {
        self.uniforms.set_lens(lens);
        self.uniforms.set_fade(fade);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("crystal frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("crystal pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.slot_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
