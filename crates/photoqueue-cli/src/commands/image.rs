//! Image command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use photoqueue_core::{import_photo, Config, EntityId, Rotation, Store};

use crate::commands::item::find_item;
use crate::output::Output;

/// Options for `image add`
#[derive(Debug, Default)]
pub struct AddOptions {
    pub order: Option<i32>,
    pub rotate: i32,
    pub import: bool,
}

/// Attach a photo to an item
///
/// With `--import` (or any rotation) the photo is re-encoded into the
/// catalog's photos directory first; otherwise the original path is recorded.
pub fn add(
    store: &mut Store,
    config: &Config,
    item_id: EntityId,
    path: PathBuf,
    options: AddOptions,
    output: &Output,
) -> Result<()> {
    find_item(store, item_id)?;

    if options.rotate != 0 && Rotation::from_degrees(options.rotate) == Rotation::None {
        output.warning(&format!(
            "Unsupported rotation {}°, keeping original orientation",
            options.rotate
        ));
    }

    let stored_path = if options.import || options.rotate != 0 {
        import_photo(
            &path,
            options.rotate,
            &config.photos_dir(),
            config.jpeg_quality,
        )
        .context("Failed to import photo")?
    } else {
        std::fs::canonicalize(&path)
            .with_context(|| format!("Photo not found: {}", path.display()))?
    };

    let order = options
        .order
        .unwrap_or_else(|| next_order_index(store, item_id));

    let image = store
        .add_image_to_item(item_id, &stored_path.to_string_lossy(), order)
        .context("Failed to add image")?;

    if output.is_quiet() {
        println!("{}", image.id);
    } else if output.is_json() {
        output.print_images(std::slice::from_ref(&image));
    } else {
        output.success(&format!(
            "Added image {} to item {}: {}",
            image.id, item_id, image.image_path
        ));
    }

    Ok(())
}

/// List images of an item in display order
pub fn list(store: &Store, item_id: EntityId, output: &Output) -> Result<()> {
    find_item(store, item_id)?;
    output.print_images(&store.get_images_by_item_id(item_id));
    Ok(())
}

/// Detach an image from its item
///
/// The photo file itself is left on disk.
pub fn delete(store: &mut Store, id: EntityId, output: &Output) -> Result<()> {
    if !store.delete_image(id).context("Failed to delete image")? {
        anyhow::bail!("Image not found: {}", id);
    }

    output.success(&format!("Deleted image: {}", id));
    Ok(())
}

/// One past the highest order index of the item's images
fn next_order_index(store: &Store, item_id: EntityId) -> i32 {
    store
        .get_images_by_item_id(item_id)
        .last()
        .map(|img| img.order_index.saturating_add(1))
        .unwrap_or(0)
}
