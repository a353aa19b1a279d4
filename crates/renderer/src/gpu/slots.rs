use winit::dpi::PhysicalSize;

use crate::loader::CanvasImage;

/// One canvas-sized photo texture. Destroy is explicit and idempotent
/// so resize and shutdown can release GPU memory eagerly.
pub(crate) struct TextureSlot {
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    size: PhysicalSize<u32>,
    destroyed: bool,
}

impl TextureSlot {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
            destroyed: false,
        }
    }

    /// Uploads a canvas-sized image. The loader produces images at the
    /// slot's exact dimensions.
    pub fn upload(&self, queue: &wgpu::Queue, image: &CanvasImage) {
        debug_assert_eq!((image.width, image.height), (self.size.width, self.size.height));
        debug_assert!(!self.destroyed);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.texture.destroy();
            self.destroyed = true;
        }
    }
}

impl Drop for TextureSlot {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Double-buffered photo slots: the front slot holds the visible photo,
/// the back slot the dissolve target. `swap` flips the roles without
/// copying texel data.
pub(crate) struct SlotPair {
    slots: [TextureSlot; 2],
    front: usize,
}

impl SlotPair {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        Self {
            slots: [
                TextureSlot::new(device, size, "photo slot 0"),
                TextureSlot::new(device, size, "photo slot 1"),
            ],
            front: 0,
        }
    }

    pub fn front(&self) -> &TextureSlot {
        &self.slots[self.front]
    }

    pub fn back(&self) -> &TextureSlot {
        &self.slots[1 - self.front]
    }

    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    /// Drops both textures and recreates them at the new canvas size.
    pub fn recreate(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        for slot in &mut self.slots {
            slot.destroy();
        }
        self.slots = [
            TextureSlot::new(device, size, "photo slot 0"),
            TextureSlot::new(device, size, "photo slot 1"),
        ];
        self.front = 0;
    }
}
