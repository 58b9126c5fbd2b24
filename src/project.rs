// ============================================================================
// PROJECT FILES — .mrp, bincode-serialized.
//
// Layout: a magic/version field, the base image as PNG bytes, the filter
// toggles, then one record per layer. Image layers embed their pixels as
// PNG bytes; text layers store the string and font size and re-rasterize
// on load, so a project re-renders with whatever fonts the host has.
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::{BlendMode, Layer, LayerContent, Scene};
use crate::error::{EditorError, Result};
use crate::io::{decode_image, encode_png};
use crate::log_info;

const MRP_MAGIC_V1: &str = "MRP1";

/// Hard cap on layer count in a project file. Prevents memory exhaustion
/// from crafted files.
const MAX_LAYERS: usize = 256;

#[derive(Serialize, Deserialize)]
struct ProjectFileV1 {
    magic: String,
    base_png: Vec<u8>,
    cinematic: bool,
    deep_fry: bool,
    layers: Vec<LayerRecordV1>,
}

#[derive(Serialize, Deserialize)]
struct LayerRecordV1 {
    content: ContentRecordV1,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    scale: f32,
    rotation: f32,
    opacity: f32,
    blend_mode: u8,
}

#[derive(Serialize, Deserialize)]
enum ContentRecordV1 {
    Image { png: Vec<u8> },
    Text { text: String, font_size: f32 },
}

/// Serialize the scene to a .mrp project file. Fails when no base image
/// is loaded — an empty project is not a document.
pub fn save_project(scene: &Scene, path: &Path) -> Result<()> {
    let base = scene
        .base
        .as_ref()
        .ok_or(EditorError::InvalidGeometry("no base image to save"))?;

    let layers = scene
        .layers
        .iter()
        .map(|layer| {
            let content = match &layer.content {
                LayerContent::Image { pixels } => ContentRecordV1::Image {
                    png: encode_png(pixels)?,
                },
                LayerContent::Text { text, font_size } => ContentRecordV1::Text {
                    text: text.clone(),
                    font_size: *font_size,
                },
            };
            Ok(LayerRecordV1 {
                content,
                x: layer.x,
                y: layer.y,
                width: layer.width,
                height: layer.height,
                scale: layer.scale,
                rotation: layer.rotation,
                opacity: layer.opacity,
                blend_mode: layer.blend_mode.to_u8(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let project = ProjectFileV1 {
        magic: MRP_MAGIC_V1.to_string(),
        base_png: encode_png(base)?,
        cinematic: scene.cinematic,
        deep_fry: scene.deep_fry,
        layers,
    };

    let file = File::create(path).map_err(|source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &project)
        .map_err(|e| EditorError::Project(e.to_string()))?;
    log_info!("saved project {} ({} layers)", path.display(), scene.layers.len());
    Ok(())
}

/// Load a .mrp project file into a fresh scene. Selection, crop and drag
/// state are not persisted; the loaded scene starts quiescent.
pub fn load_project(path: &Path) -> Result<Scene> {
    let raw = std::fs::read(path).map_err(|source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let project: ProjectFileV1 = bincode::deserialize(&raw)
        .map_err(|e| EditorError::Project(e.to_string()))?;

    if project.magic != MRP_MAGIC_V1 {
        return Err(EditorError::Project(format!(
            "unknown magic '{}'",
            project.magic
        )));
    }
    if project.layers.len() > MAX_LAYERS {
        return Err(EditorError::Project(format!(
            "too many layers ({})",
            project.layers.len()
        )));
    }

    let mut scene = Scene::new();
    scene.base = Some(decode_image(&project.base_png)?);
    scene.cinematic = project.cinematic;
    scene.deep_fry = project.deep_fry;

    for record in project.layers {
        let content = match record.content {
            ContentRecordV1::Image { png } => LayerContent::Image {
                pixels: decode_image(&png)?,
            },
            ContentRecordV1::Text { text, font_size } => LayerContent::Text { text, font_size },
        };
        scene.layers.push(Layer {
            content,
            x: record.x,
            y: record.y,
            width: record.width,
            height: record.height,
            scale: record.scale,
            rotation: record.rotation,
            opacity: record.opacity,
            blend_mode: BlendMode::from_u8(record.blend_mode),
        });
    }

    log_info!("loaded project {} ({} layers)", path.display(), scene.layers.len());
    Ok(scene)
}
