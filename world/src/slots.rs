use std::collections::VecDeque;

use belt_blast_core::{ColumnIndex, SelectionError, ShooterId, SlotIndex};

/// Fixed-capacity set of ready slots shooters wait in between belt passes.
#[derive(Clone, Debug)]
pub(crate) struct ReadySlots {
    slots: Vec<Option<ShooterId>>,
}

impl ReadySlots {
    pub(crate) fn new(capacity: u32) -> Self {
        let capacity = usize::try_from(capacity).unwrap_or(0);
        Self {
            slots: vec![None; capacity],
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn first_empty(&self) -> Option<SlotIndex> {
        let index = self.slots.iter().position(Option::is_none)?;
        u32::try_from(index).ok().map(SlotIndex::new)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Places the shooter into the first empty slot.
    pub(crate) fn register(&mut self, shooter: ShooterId) -> Option<SlotIndex> {
        let slot = self.first_empty()?;
        let index = usize::try_from(slot.get()).ok()?;
        self.slots[index] = Some(shooter);
        Some(slot)
    }

    /// Frees the slot held by the shooter, if any.
    pub(crate) fn unregister(&mut self, shooter: ShooterId) -> Option<SlotIndex> {
        let index = self.slots.iter().position(|slot| *slot == Some(shooter))?;
        self.slots[index] = None;
        u32::try_from(index).ok().map(SlotIndex::new)
    }

    pub(crate) fn slot_of(&self, shooter: ShooterId) -> Option<SlotIndex> {
        let index = self.slots.iter().position(|slot| *slot == Some(shooter))?;
        u32::try_from(index).ok().map(SlotIndex::new)
    }

    pub(crate) fn occupants(&self) -> &[Option<ShooterId>] {
        &self.slots
    }
}

/// Columns of shooters waiting to be picked; only the front of a column is selectable.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShooterTable {
    columns: Vec<VecDeque<ShooterId>>,
}

impl ShooterTable {
    pub(crate) fn new(columns: Vec<VecDeque<ShooterId>>) -> Self {
        Self { columns }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.iter().all(VecDeque::is_empty)
    }

    pub(crate) fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn front(&self, column: ColumnIndex) -> Result<ShooterId, SelectionError> {
        let entries = self.column(column).ok_or(SelectionError::MissingColumn)?;
        entries.front().copied().ok_or(SelectionError::EmptyColumn)
    }

    pub(crate) fn pop_front(&mut self, column: ColumnIndex) -> Option<ShooterId> {
        let index = usize::try_from(column.get()).ok()?;
        self.columns.get_mut(index)?.pop_front()
    }

    /// Removes the shooter wherever it waits, returning the column it left.
    pub(crate) fn remove(&mut self, shooter: ShooterId) -> Option<ColumnIndex> {
        for (index, entries) in self.columns.iter_mut().enumerate() {
            if let Some(position) = entries.iter().position(|entry| *entry == shooter) {
                let _ = entries.remove(position);
                return u32::try_from(index).ok().map(ColumnIndex::new);
            }
        }
        None
    }

    /// Shooters of the column from front to back.
    pub(crate) fn column(&self, column: ColumnIndex) -> Option<&VecDeque<ShooterId>> {
        let index = usize::try_from(column.get()).ok()?;
        self.columns.get(index)
    }

    pub(crate) fn columns(&self) -> &[VecDeque<ShooterId>] {
        &self.columns
    }
}
