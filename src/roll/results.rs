use super::num::Number;
use crate::common::Tag;

pub type EntryId = usize;

/// One rolled face.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub value: Number,
    pub usable: bool,
    pub display: String,
    pub tags: Vec<Tag>,
}

impl ResultEntry {
    pub fn new(value: Number) -> Self {
        Self {
            value,
            usable: true,
            display: value.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn tag(&mut self, tag: Tag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub(crate) fn set_value(&mut self, value: Number) {
        self.value = value;
        self.display = value.to_string();
    }

    pub fn total(&self) -> Number {
        if self.usable {
            self.value
        } else {
            Number::ZERO
        }
    }

    pub fn render(&self) -> String {
        let mut ret = self.display.clone();
        ret.extend(self.tags.iter().map(|t| t.as_char()));
        ret
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    entry: ResultEntry,
    next: Option<EntryId>,
}

/// Entries live in an arena; display order is a singly linked list through
/// it, so inserting right after an entry never renumbers anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSequence {
    slots: Vec<Slot>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
}

impl ResultSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Number>) -> Self {
        let mut ret = Self::new();
        for value in values {
            ret.push(ResultEntry::new(value));
        }
        ret
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, entry: ResultEntry) -> EntryId {
        let id = self.slots.len();
        self.slots.push(Slot { entry, next: None });
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    pub fn insert_after(&mut self, after: EntryId, entry: ResultEntry) -> EntryId {
        let id = self.slots.len();
        let next = self.slots[after].next.replace(id);
        self.slots.push(Slot { entry, next });
        if self.tail == Some(after) {
            self.tail = Some(id);
        }
        id
    }

    pub fn get(&self, id: EntryId) -> &ResultEntry {
        &self.slots[id].entry
    }

    pub fn get_mut(&mut self, id: EntryId) -> &mut ResultEntry {
        &mut self.slots[id].entry
    }

    pub fn first(&self) -> Option<&ResultEntry> {
        self.head.map(|id| self.get(id))
    }

    /// Entry ids in display order.
    pub fn ids(&self) -> Vec<EntryId> {
        let mut ret = Vec::with_capacity(self.slots.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            ret.push(id);
            cursor = self.slots[id].next;
        }
        ret
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            seq: self,
            cursor: self.head,
        }
    }

    pub fn values(&self) -> Vec<Number> {
        self.iter().map(|e| e.value).collect()
    }

    pub fn sum(&self) -> Number {
        self.iter().map(ResultEntry::total).sum()
    }

    pub fn render(&self) -> String {
        let inner = self
            .iter()
            .map(ResultEntry::render)
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", inner)
    }
}

pub struct Iter<'a> {
    seq: &'a ResultSequence,
    cursor: Option<EntryId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ResultEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let slot = &self.seq.slots[id];
        self.cursor = slot.next;
        Some(&slot.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(xs: &[i64]) -> Vec<Number> {
        xs.iter().map(|&x| x.into()).collect()
    }

    #[test]
    fn test_insert_keeps_adjacency() {
        let mut seq = ResultSequence::from_values(nums(&[1, 2, 3]));
        let ids = seq.ids();
        let a = seq.insert_after(ids[0], ResultEntry::new(10.into()));
        seq.insert_after(a, ResultEntry::new(11.into()));
        seq.insert_after(ids[2], ResultEntry::new(30.into()));
        assert_eq!(seq.values(), nums(&[1, 10, 11, 2, 3, 30]));

        seq.push(ResultEntry::new(4.into()));
        assert_eq!(seq.values(), nums(&[1, 10, 11, 2, 3, 30, 4]));
    }

    #[test]
    fn test_render_and_sum() {
        let mut seq = ResultSequence::from_values(nums(&[4, 6, 2]));
        let ids = seq.ids();
        seq.get_mut(ids[0]).tag(Tag::Exploded);
        seq.get_mut(ids[0]).tag(Tag::Rerolled);
        seq.get_mut(ids[2]).usable = false;
        seq.get_mut(ids[2]).tag(Tag::Dropped);
        seq.get_mut(ids[2]).tag(Tag::Dropped);
        assert_eq!(seq.render(), "[4!r, 6, 2d]");
        assert_eq!(seq.sum(), Number::Int(10));
    }
}
