use countdown_domain::{Entity, ID};

/// Useful functions for creating inmemory repositories

pub fn insert<T: Clone + Entity>(val: &T, collection: &mut Vec<T>) -> anyhow::Result<()> {
    if collection.iter().any(|item| item.id() == val.id()) {
        anyhow::bail!("Entity with id: {} already exists", val.id());
    }
    collection.push(val.clone());
    Ok(())
}

/// Replaces the stored entity with the same id when `accept` approves the
/// currently stored value. Returns false when nothing was replaced.
pub fn save_if<T: Clone + Entity, F: Fn(&T) -> bool>(
    val: &T,
    collection: &mut Vec<T>,
    accept: F,
) -> bool {
    match collection.iter_mut().find(|item| item.id() == val.id()) {
        Some(item) if accept(item) => {
            *item = val.clone();
            true
        }
        _ => false,
    }
}

pub fn find<T: Clone + Entity>(val_id: &ID, collection: &[T]) -> Option<T> {
    collection.iter().find(|item| item.id() == val_id).cloned()
}

pub fn find_by<T: Clone, F: FnMut(&T) -> bool>(collection: &[T], mut compare: F) -> Vec<T> {
    collection
        .iter()
        .filter(|item| compare(item))
        .cloned()
        .collect()
}

pub fn delete<T: Clone + Entity>(val_id: &ID, collection: &mut Vec<T>) -> Option<T> {
    let index = collection.iter().position(|item| item.id() == val_id)?;
    Some(collection.remove(index))
}

pub fn find_and_delete_by<T: Clone, F: Fn(&T) -> bool>(
    collection: &mut Vec<T>,
    compare: F,
) -> Vec<T> {
    let (deleted, kept): (Vec<T>, Vec<T>) = collection.drain(..).partition(|item| compare(item));
    *collection = kept;
    deleted
}
