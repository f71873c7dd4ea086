//! Project generation
//!
//! Renders every file of a layout and writes the result to disk.

use std::path::{Path, PathBuf};

use crate::error::{Result, TemplateError};
use crate::template::layout::Layout;
use crate::template::render::TemplateContext;

/// A rendered file ready to be written
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub path: &'static str,
    pub contents: String,
}

/// Render every file of `layout` without touching the filesystem
pub fn render_layout(layout: Layout, context: &TemplateContext) -> Result<Vec<RenderedFile>> {
    layout
        .files()
        .iter()
        .map(|file| -> Result<RenderedFile> {
            let contents = context.render(file.source).map_err(|e| {
                tracing::error!("Failed to render {}: {}", file.path, e);
                e
            })?;
            Ok(RenderedFile {
                path: file.path,
                contents,
            })
        })
        .collect()
}

/// Generate a project into `out_dir`, returning the written paths
///
/// Nothing is written unless every file renders. An existing, non-empty
/// `out_dir` is refused unless `force` is set.
pub fn generate(
    layout: Layout,
    context: &TemplateContext,
    out_dir: &Path,
    force: bool,
) -> Result<Vec<PathBuf>> {
    let rendered = render_layout(layout, context)?;

    if !force && !is_empty_dir(out_dir)? {
        return Err(TemplateError::OutputNotEmpty {
            path: out_dir.display().to_string(),
        }
        .into());
    }

    let mut written = Vec::with_capacity(rendered.len());
    for file in rendered {
        let path = out_dir.join(file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, file.contents)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    tracing::info!(
        "Generated {} layout for {} in {}",
        layout,
        context.identity().name,
        out_dir.display()
    );
    Ok(written)
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(std::fs::read_dir(path)?.next().is_none())
}
