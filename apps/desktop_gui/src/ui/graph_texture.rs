//! Decodes graph image bytes into egui textures for `GraphImageSlot`.

use client_core::{GraphImage, ImageHandleFactory};
use eframe::egui;
use egui::TextureHandle;

pub struct GraphTexture {
    pub texture: TextureHandle,
    pub size: egui::Vec2,
    /// Original bytes, kept for "Save image as...".
    pub source: GraphImage,
}

pub struct EguiTextureFactory {
    ctx: egui::Context,
    created: u64,
}

impl EguiTextureFactory {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx, created: 0 }
    }
}

impl ImageHandleFactory for EguiTextureFactory {
    type Handle = GraphTexture;
    type Error = image::ImageError;

    fn create(&mut self, image: &GraphImage) -> Result<GraphTexture, image::ImageError> {
        let decoded = image::load_from_memory(&image.bytes)?;
        let rgba = decoded.to_rgba8();
        let [w, h] = [rgba.width() as usize, rgba.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied([w, h], rgba.as_raw());

        self.created += 1;
        let texture = self.ctx.load_texture(
            format!("graph-image:{}", self.created),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        Ok(GraphTexture {
            texture,
            size: egui::vec2(w as f32, h as f32),
            source: image.clone(),
        })
    }

    fn release(&mut self, handle: GraphTexture) {
        tracing::debug!(texture = ?handle.texture.id(), "releasing graph texture");
        // The texture is freed when the last handle clone drops.
        drop(handle);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use client_core::GraphImageSlot;

    use super::*;

    fn png(width: u32, height: u32) -> GraphImage {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        GraphImage::new(bytes, Some("image/png".to_string()))
    }

    #[test]
    fn decodes_png_into_sized_texture() {
        let mut slot = GraphImageSlot::new(EguiTextureFactory::new(egui::Context::default()));
        let shown = slot.show(&png(4, 3)).expect("texture");
        assert_eq!(shown.size, egui::vec2(4.0, 3.0));
        assert_eq!(shown.source.extension(), "png");
    }

    #[test]
    fn undecodable_bytes_keep_previous_texture() {
        let mut slot = GraphImageSlot::new(EguiTextureFactory::new(egui::Context::default()));
        let first_id = slot.show(&png(2, 2)).expect("texture").texture.id();

        let garbage = GraphImage::new(b"<svg/>".to_vec(), Some("image/svg+xml".to_string()));
        assert!(slot.show(&garbage).is_err());
        assert_eq!(slot.active().map(|t| t.texture.id()), Some(first_id));
    }

    #[test]
    fn each_image_gets_a_new_texture() {
        let mut slot = GraphImageSlot::new(EguiTextureFactory::new(egui::Context::default()));
        let first_id = slot.show(&png(2, 2)).expect("texture").texture.id();
        let second_id = slot.show(&png(5, 5)).expect("texture").texture.id();
        assert_ne!(first_id, second_id);
        assert_eq!(slot.factory().created, 2);
    }
}
