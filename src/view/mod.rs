//! In-memory model of the rendered notes list.
//!
//! Each rendered element gets an [`ElementHandle`] that maps straight back to
//! the note it displays, so delete requests never have to recover an id from
//! rendered text.

mod page;

pub use page::{PageTemplate, render_page};

use std::fmt;

use serde::Deserialize;

use crate::models::{Note, NoteId};

pub const PLACEHOLDER_TEXT: &str = "No notes stored.";

/// Whether delete controls are rendered. Resolved once at startup from the
/// page URL fragment and never changed afterwards. This only affects what is
/// displayed, it does not guard the delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminMode {
    #[default]
    Off,
    On,
}

impl AdminMode {
    /// `#admin` turns admin mode on; any other fragment, or none, leaves it off.
    pub fn from_url(url: &str) -> Self {
        match url.split_once('#') {
            Some((_, "admin")) => Self::On,
            _ => Self::Off,
        }
    }

    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Opaque handle of one rendered list element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
    Entry {
        note_id: NoteId,
        /// `"{id}. {date} "`
        caption: String,
        review: String,
        delete_control: bool,
    },
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub handle: ElementHandle,
    pub content: ItemContent,
}

impl ListItem {
    pub const fn note_id(&self) -> Option<NoteId> {
        match &self.content {
            ItemContent::Entry { note_id, .. } => Some(*note_id),
            ItemContent::Placeholder => None,
        }
    }
}

/// The list container. Handles are never reused within one view, so a handle
/// kept from before a re-render simply stops resolving.
#[derive(Debug, Default)]
pub struct ListView {
    items: Vec<ListItem>,
    next_handle: u64,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn allocate(&mut self) -> ElementHandle {
        self.next_handle += 1;
        ElementHandle(self.next_handle)
    }

    pub fn append_note(&mut self, note: Note, admin: AdminMode) -> ElementHandle {
        let handle = self.allocate();
        self.items.push(ListItem {
            handle,
            content: ItemContent::Entry {
                note_id: note.id,
                caption: format!("{}. {} ", note.id, note.date),
                review: note.review,
                delete_control: admin.is_on(),
            },
        });
        handle
    }

    /// Adds the placeholder when the list is empty.
    pub fn ensure_placeholder(&mut self) {
        if self.items.is_empty() {
            let handle = self.allocate();
            self.items.push(ListItem {
                handle,
                content: ItemContent::Placeholder,
            });
        }
    }

    pub fn note_id(&self, handle: ElementHandle) -> Option<NoteId> {
        self.items
            .iter()
            .find(|item| item.handle == handle)
            .and_then(ListItem::note_id)
    }

    pub fn handle_for(&self, id: NoteId) -> Option<ElementHandle> {
        self.items
            .iter()
            .find(|item| item.note_id() == Some(id))
            .map(|item| item.handle)
    }

    /// Removes exactly the element with `handle`. Returns whether it was present.
    pub fn remove(&mut self, handle: ElementHandle) -> bool {
        match self.items.iter().position(|item| item.handle == handle) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}
