use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

/// Rendered icon pixels, premultiplied RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterIcon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Renders SVG icons from the `svg/` directory and caches the results by
/// name and size.
pub struct IconManager {
    svg_dir: PathBuf,
    cache: HashMap<String, Arc<RasterIcon>>,
}

impl IconManager {
    pub fn new(svg_dir: impl Into<PathBuf>) -> Self {
        Self {
            svg_dir: svg_dir.into(),
            cache: HashMap::new(),
        }
    }

    /// Find the file for `name`: `svg/<name>.svg`, `svg/<name>`, or an
    /// existing path used as is.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let with_ext = self.svg_dir.join(format!("{name}.svg"));
        if with_ext.is_file() {
            return Some(with_ext);
        }
        let plain = self.svg_dir.join(name);
        if plain.is_file() {
            return Some(plain);
        }
        let direct = PathBuf::from(name);
        direct.is_file().then_some(direct)
    }

    pub fn has_icon(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn get(&mut self, name: &str, size: u32) -> Option<Arc<RasterIcon>> {
        let key = format!("{name}_{size}x{size}");
        if let Some(icon) = self.cache.get(&key) {
            return Some(icon.clone());
        }
        let path = self.resolve(name)?;
        match render_svg(&path, size) {
            Ok(icon) => {
                let icon = Arc::new(icon);
                self.cache.insert(key, icon.clone());
                Some(icon)
            }
            Err(e) => {
                tracing::warn!("failed to render icon {}: {e:#}", path.display());
                None
            }
        }
    }

    /// Icon names in the `svg/` directory, sorted.
    pub fn available_icons(&self) -> Vec<String> {
        crate::config_store::list_svg_stems(&self.svg_dir)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Rasterize an SVG file, scaled to fit a `size`×`size` square and centred.
pub fn render_svg(path: &Path, size: u32) -> anyhow::Result<RasterIcon> {
    if size == 0 {
        anyhow::bail!("icon size must be positive");
    }
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &opts).context("failed to parse SVG")?;

    let mut pixmap = tiny_skia::Pixmap::new(size, size).context("failed to create pixmap")?;
    let svg_size = tree.size();
    let scale = (size as f32 / svg_size.width()).min(size as f32 / svg_size.height());
    let dx = (size as f32 - svg_size.width() * scale) / 2.0;
    let dy = (size as f32 - svg_size.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(dx, dy);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(RasterIcon {
        width: size,
        height: size,
        rgba: pixmap.take(),
    })
}
