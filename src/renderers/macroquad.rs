use std::cell::RefCell;
use std::rc::Rc;

use ::macroquad::prelude::*;
use rustc_hash::FxHashMap;

use crate::atlas::{Atlas, AtlasId};
use crate::draw::DrawBatch;
use crate::engine::UiContext;

type TextureMap = Rc<RefCell<FxHashMap<AtlasId, Texture2D>>>;

/// Draws batches as macroquad meshes, one scissored mesh per batch.
///
/// Atlases are uploaded as white RGBA textures carrying glyph coverage in
/// alpha, so vertex colors tint text directly. SDF atlases are uploaded the
/// same way; rendering them crisply needs a distance-field material.
pub struct MacroquadRenderer {
    textures: TextureMap,
}

impl MacroquadRenderer {
    /// Hooks the atlas lifecycle callbacks of `ctx`'s font manager. Create the
    /// renderer before loading fonts so every atlas gets a texture.
    pub fn new(ctx: &mut UiContext) -> Self {
        let textures: TextureMap = Rc::default();
        let fonts = ctx.fonts_mut();

        let map = textures.clone();
        fonts.on_atlas_created(move |id, atlas| {
            map.borrow_mut().insert(id, upload(atlas));
        });
        let map = textures.clone();
        fonts.on_atlas_updated(move |id, atlas| {
            let mut map = map.borrow_mut();
            match map.get(&id) {
                Some(texture) => texture.update_from_bytes(atlas.width(), atlas.height(), &expand(atlas)),
                None => {
                    map.insert(id, upload(atlas));
                }
            }
        });
        let map = textures.clone();
        fonts.on_atlas_destroyed(move |id, _| {
            map.borrow_mut().remove(&id);
        });

        for (id, atlas) in ctx.fonts().atlases() {
            textures.borrow_mut().insert(id, upload(atlas));
        }
        Self { textures }
    }

    pub fn texture_count(&self) -> usize {
        self.textures.borrow().len()
    }

    /// Flushes the batches of the last build and draws them in order.
    pub fn draw(&self, ctx: &mut UiContext) {
        let textures = self.textures.borrow();
        ctx.flush(|batch| draw_batch(batch, &textures));
        unsafe {
            get_internal_gl().quad_gl.scissor(None);
        }
    }
}

fn draw_batch(batch: &DrawBatch, textures: &FxHashMap<AtlasId, Texture2D>) {
    let clip = batch.clip;
    unsafe {
        get_internal_gl().quad_gl.scissor(Some((
            clip.x as i32,
            clip.y as i32,
            clip.width.ceil() as i32,
            clip.height.ceil() as i32,
        )));
    }

    let vertices = batch
        .vertices
        .iter()
        .map(|v| Vertex {
            position: Vec3::new(v.pos.x, v.pos.y, 0.0),
            uv: Vec2::new(v.uv.x, v.uv.y),
            color: v.color.to_u8_array(),
            normal: Vec4::new(0.0, 0.0, 1.0, 0.0),
        })
        .collect();

    let texture = batch.atlas.and_then(|id| {
        let texture = textures.get(&id);
        if texture.is_none() {
            ::log::warn!("no texture uploaded for atlas {id:?}");
        }
        texture.cloned()
    });

    draw_mesh(&Mesh {
        vertices,
        indices: batch.indices.to_vec(),
        texture,
    });
}

fn expand(atlas: &Atlas) -> Vec<u8> {
    atlas.pixels().iter().flat_map(|a| [255, 255, 255, *a]).collect()
}

fn upload(atlas: &Atlas) -> Texture2D {
    let width = u16::try_from(atlas.width()).unwrap_or(u16::MAX);
    let height = u16::try_from(atlas.height()).unwrap_or(u16::MAX);
    let texture = Texture2D::from_rgba8(width, height, &expand(atlas));
    texture.set_filter(FilterMode::Linear);
    texture
}
