//! Queue command handlers

use anyhow::{Context, Result};

use photoqueue_core::{EntityId, Queue, Store};

use crate::output::{ItemDetail, Output, QueueSummary};
use crate::prompt::confirm;

/// Create a new queue
pub fn create(store: &mut Store, name: String, output: &Output) -> Result<()> {
    let queue = store
        .create_queue(&name)
        .context("Failed to create queue")?;

    if output.is_quiet() {
        println!("{}", queue.id);
    } else if output.is_json() {
        output.print_queue(&queue);
    } else {
        output.success(&format!("Created queue {}: {}", queue.id, queue.name));
    }

    Ok(())
}

/// List all queues with their counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let summaries: Vec<QueueSummary> = store
        .get_all_queues()
        .into_iter()
        .map(|queue| QueueSummary {
            item_count: store.get_queue_item_count(queue.id),
            image_count: store.get_queue_image_count(queue.id),
            queue,
        })
        .collect();

    output.print_queues(&summaries);
    Ok(())
}

/// Show a queue with its items and their images
pub fn show(store: &Store, id: EntityId, output: &Output) -> Result<()> {
    let queue = find_queue(store, id)?;

    let items: Vec<ItemDetail> = store
        .get_items_by_queue_id(id)
        .into_iter()
        .map(|item| ItemDetail {
            images: store.get_images_by_item_id(item.id),
            item,
        })
        .collect();

    output.print_queue_tree(&queue, &items);
    Ok(())
}

/// Rename a queue
pub fn rename(store: &mut Store, id: EntityId, name: String, output: &Output) -> Result<()> {
    let mut queue = find_queue(store, id)?;
    queue.set_name(name);

    let updated = store
        .update_queue(&queue)
        .context("Failed to rename queue")?
        .ok_or_else(|| anyhow::anyhow!("Queue not found: {}", id))?;

    output.success(&format!("Renamed queue {} to {}", updated.id, updated.name));
    Ok(())
}

/// Delete a queue and everything in it
pub fn delete(store: &mut Store, id: EntityId, yes: bool, output: &Output) -> Result<()> {
    let queue = find_queue(store, id)?;

    if !yes && output.should_prompt() {
        println!(
            "Delete queue {} - {} ({} item(s), {} image(s))",
            queue.id,
            queue.name,
            store.get_queue_item_count(id),
            store.get_queue_image_count(id)
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_queue(id).context("Failed to delete queue")?;

    output.success(&format!("Deleted queue: {}", id));
    Ok(())
}

pub(crate) fn find_queue(store: &Store, id: EntityId) -> Result<Queue> {
    store
        .get_queue_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("Queue not found: {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_create_and_rename() {
        let mut store = Store::in_memory();
        create(&mut store, "Widgets".to_string(), &quiet()).unwrap();

        let id = store.get_all_queues()[0].id;
        rename(&mut store, id, "Gadgets".to_string(), &quiet()).unwrap();

        assert_eq!(store.get_queue_by_id(id).unwrap().name, "Gadgets");
    }

    #[test]
    fn test_create_blank_name_fails() {
        let mut store = Store::in_memory();
        assert!(create(&mut store, "  ".to_string(), &quiet()).is_err());
        assert!(store.get_all_queues().is_empty());
    }

    #[test]
    fn test_delete_without_prompt_in_quiet_mode() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("Widgets").unwrap();
        let item = store.create_item(queue.id, "Bolt", None).unwrap();
        store.add_image_to_item(item.id, "/p/1.jpg", 0).unwrap();

        delete(&mut store, queue.id, false, &quiet()).unwrap();

        assert!(store.get_queue_by_id(queue.id).is_none());
        assert!(store.get_item_by_id(item.id).is_none());
        assert_eq!(store.stats().images, 0);
    }

    #[test]
    fn test_missing_queue_errors() {
        let mut store = Store::in_memory();
        let err = rename(&mut store, 42, "x".to_string(), &quiet()).unwrap_err();
        assert!(err.to_string().contains("Queue not found: 42"));
        assert!(delete(&mut store, 42, true, &quiet()).is_err());
        assert!(show(&store, 42, &quiet()).is_err());
    }
}
