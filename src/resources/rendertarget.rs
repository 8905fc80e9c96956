//! Fixed-resolution render target.
//!
//! The whole game renders into a 320×240 texture which is then scaled to
//! the window with letterboxing. Nearest-neighbor filtering keeps the
//! pixels sharp.
//!
//! NonSend resource: the texture is a GPU handle tied to the main thread.

use raylib::ffi::{self, TextureFilter};
use raylib::prelude::*;

/// The framebuffer every map and overlay draws into.
pub struct RenderTarget {
    pub texture: RenderTexture2D,
    pub game_width: u32,
    pub game_height: u32,
}

impl RenderTarget {
    pub fn new(
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        let texture = rl
            .load_render_texture(th, width, height)
            .map_err(|e| format!("failed to create render texture: {e}"))?;
        unsafe {
            ffi::SetTextureFilter(texture.texture, TextureFilter::TEXTURE_FILTER_POINT as i32);
        }
        Ok(RenderTarget {
            texture,
            game_width: width,
            game_height: height,
        })
    }

    /// Source rectangle for blitting; the negative height compensates for
    /// OpenGL's inverted texture coordinates.
    pub fn source_rect(&self) -> Rectangle {
        Rectangle {
            x: 0.0,
            y: 0.0,
            width: self.game_width as f32,
            height: -(self.game_height as f32),
        }
    }
}
