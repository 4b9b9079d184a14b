//! Item command handlers

use anyhow::{bail, Context, Result};

use photoqueue_core::{EntityId, Item, Store};

use crate::commands::queue::find_queue;
use crate::output::{ItemDetail, Output};
use crate::prompt::{confirm, prompt_with_default};

/// Add an item to an existing queue
pub fn create(
    store: &mut Store,
    queue_id: EntityId,
    name: String,
    description: Option<String>,
    output: &Output,
) -> Result<()> {
    find_queue(store, queue_id)?;

    let item = store
        .create_item(queue_id, &name, description.and_then(non_blank))
        .context("Failed to create item")?;

    if output.is_quiet() {
        println!("{}", item.id);
    } else if output.is_json() {
        output.print_item(&detail(store, item));
    } else {
        output.success(&format!(
            "Created item {} in queue {}: {}",
            item.id, queue_id, item.name
        ));
    }

    Ok(())
}

/// List items of a queue
pub fn list(store: &Store, queue_id: EntityId, output: &Output) -> Result<()> {
    find_queue(store, queue_id)?;
    output.print_items(&store.get_items_by_queue_id(queue_id));
    Ok(())
}

/// Show an item with its images
pub fn show(store: &Store, id: EntityId, output: &Output) -> Result<()> {
    let item = find_item(store, id)?;
    output.print_item(&detail(store, item));
    Ok(())
}

/// Edit an item's name or description
///
/// Without flags, prompts for each field interactively.
pub fn edit(
    store: &mut Store,
    id: EntityId,
    name: Option<String>,
    description: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut item = find_item(store, id)?;

    let (name, description) = if name.is_none() && description.is_none() {
        if !output.should_prompt() {
            bail!("Nothing to change. Pass --name or --description.");
        }
        println!("Editing item {} (press Enter to keep current value)", item.id);
        let name = prompt_with_default("Name", &item.name)?;
        let description =
            prompt_with_default("Description", item.description.as_deref().unwrap_or(""))?;
        (name, description)
    } else {
        (name, description)
    };

    if let Some(name) = name {
        item.set_name(name);
    }
    if let Some(description) = description {
        item.set_description(non_blank(description));
    }

    let updated = store
        .update_item(&item)
        .context("Failed to update item")?
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;

    if output.is_json() {
        output.print_item(&detail(store, updated));
    } else {
        output.success(&format!("Updated item: {}", updated.id));
    }

    Ok(())
}

/// Delete an item and its images
pub fn delete(store: &mut Store, id: EntityId, yes: bool, output: &Output) -> Result<()> {
    let item = find_item(store, id)?;

    if !yes && output.should_prompt() {
        println!(
            "Delete item {} - {} ({} image(s))",
            item.id,
            item.name,
            store.get_images_by_item_id(id).len()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_item(id).context("Failed to delete item")?;

    output.success(&format!("Deleted item: {}", id));
    Ok(())
}

pub(crate) fn find_item(store: &Store, id: EntityId) -> Result<Item> {
    store
        .get_item_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))
}

fn detail(store: &Store, item: Item) -> ItemDetail {
    ItemDetail {
        images: store.get_images_by_item_id(item.id),
        item,
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
