use std::fmt::Write as _;

use chrono::Local;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    error::NotesError,
    models::{NewNote, Note, NoteId},
    repository::Repository,
    view::{AdminMode, ElementHandle, ListItem, ListView, render_page},
};

/// What the page currently shows: the notes list and the form input.
#[derive(Debug, Default)]
pub struct Page {
    pub view: ListView,
    pub input: String,
}

/// Shared context for the form, list and delete controllers.
///
/// Lock order is always page, then store. The page lock is held for a whole
/// operation, so a write and the render it triggers are never interleaved with
/// another request.
pub struct NoteService {
    store: Option<Mutex<Repository>>,
    page: Mutex<Page>,
    admin: AdminMode,
    date_format: String,
}

impl NoteService {
    pub fn new(
        store: Option<Repository>,
        admin: AdminMode,
        date_format: impl Into<String>,
    ) -> Self {
        Self {
            store: store.map(Mutex::new),
            page: Mutex::new(Page::default()),
            admin,
            date_format: date_format.into(),
        }
    }

    /// Opens the configured database. A connection failure is logged and
    /// leaves the service without storage rather than aborting.
    pub fn open(config: &Config) -> Self {
        let store = match Repository::open(&config.database_path) {
            Ok(repo) => Some(repo),
            Err(e) => {
                tracing::error!("Database failed to open: {e}");
                None
            }
        };

        Self::new(store, config.admin_mode(), config.date_format.clone())
    }

    pub const fn admin_mode(&self) -> AdminMode {
        self.admin
    }

    pub const fn has_storage(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Mutex<Repository>, NotesError> {
        self.store.as_ref().ok_or(NotesError::Unavailable)
    }

    fn timestamp(&self) -> String {
        let mut date = String::new();
        if write!(date, "{}", Local::now().format(&self.date_format)).is_err() {
            tracing::warn!("Invalid date format '{}', using RFC 3339", self.date_format);
            date = Local::now().to_rfc3339();
        }
        date
    }

    /// Stores `text` as a new note. On commit the input is cleared and the list
    /// re-rendered; on failure the input keeps the submitted text.
    pub async fn submit(&self, text: String) -> Result<Note, NotesError> {
        let mut page = self.page.lock().await;
        page.input.clone_from(&text);

        let new_note = NewNote {
            review: text,
            date: self.timestamp(),
        };

        let added = match self.store() {
            Ok(store) => store.lock().await.add_note(new_note),
            Err(e) => Err(e),
        };

        match added {
            Ok(note) => {
                tracing::info!("Transaction completed: note {} added", note.id);
                page.input.clear();
                // The note is committed; a failed re-render is logged inside.
                let _ = self.render_into(&mut page).await;
                Ok(note)
            }
            Err(e) => {
                tracing::error!("Failed to add note: {e}");
                Err(e)
            }
        }
    }

    /// Rebuilds the list from the store, newest note first.
    pub async fn render(&self) -> Result<usize, NotesError> {
        let mut page = self.page.lock().await;
        self.render_into(&mut page).await
    }

    async fn render_into(&self, page: &mut Page) -> Result<usize, NotesError> {
        page.view.clear();

        let store = self.store().inspect_err(|e| {
            tracing::error!("Failed to display notes: {e}");
        })?;

        let admin = self.admin;
        let view = &mut page.view;
        let scanned = store.lock().await.for_each_note_desc(|note| {
            view.append_note(note, admin);
        });

        // A cursor that fails partway must not leave a partial list behind.
        let displayed = match scanned {
            Ok(displayed) => displayed,
            Err(e) => {
                view.clear();
                tracing::error!("Failed to display notes: {e}");
                return Err(e);
            }
        };

        view.ensure_placeholder();
        tracing::debug!("Notes all displayed ({displayed})");

        Ok(displayed)
    }

    /// Deletes the note `id` and, once the transaction committed, removes its
    /// rendered element. When `element` is `None` the element currently bound
    /// to `id` is used. Returns whether a stored note was removed.
    ///
    /// A failed delete re-renders the list from the store before returning
    /// the error, so the view never keeps showing a stale state.
    pub async fn delete_note(
        &self,
        id: NoteId,
        element: Option<ElementHandle>,
    ) -> Result<bool, NotesError> {
        let mut page = self.page.lock().await;
        let element = element.or_else(|| page.view.handle_for(id));
        self.delete_locked(&mut page, id, element).await
    }

    /// Deletes the note bound to a rendered element and returns its id along
    /// with whether a stored note was removed. Returns `Ok(None)` when the
    /// handle no longer resolves, for example after a re-render.
    pub async fn delete_element(
        &self,
        handle: ElementHandle,
    ) -> Result<Option<(NoteId, bool)>, NotesError> {
        let mut page = self.page.lock().await;

        let Some(id) = page.view.note_id(handle) else {
            tracing::warn!("No note is bound to element {handle}");
            return Ok(None);
        };

        let removed = self.delete_locked(&mut page, id, Some(handle)).await?;
        Ok(Some((id, removed)))
    }

    async fn delete_locked(
        &self,
        page: &mut Page,
        id: NoteId,
        element: Option<ElementHandle>,
    ) -> Result<bool, NotesError> {
        let store = self.store().inspect_err(|e| {
            tracing::error!("Failed to delete note {id}: {e}");
        })?;

        let deleted = store.lock().await.delete_note(id);

        match deleted {
            Ok(removed) => {
                if element.is_some_and(|handle| page.view.remove(handle)) {
                    page.view.ensure_placeholder();
                }
                tracing::info!("Note {id} deleted");
                Ok(removed)
            }
            Err(e) => {
                tracing::error!("Failed to delete note {id}: {e}");
                let _ = self.render_into(page).await;
                Err(e)
            }
        }
    }

    pub async fn get_all_notes(&self) -> Result<Vec<Note>, NotesError> {
        self.store()?.lock().await.get_all_notes()
    }

    /// Renders the current page state to HTML without touching the store.
    pub async fn page_html(&self) -> Result<String, askama::Error> {
        let page = self.page.lock().await;
        render_page(&page.view, &page.input)
    }

    pub async fn displayed_items(&self) -> Vec<ListItem> {
        self.page.lock().await.view.items().to_vec()
    }

    pub async fn input(&self) -> String {
        self.page.lock().await.input.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ItemContent;

    fn service(admin: AdminMode) -> NoteService {
        let repo = Repository::open_in_memory().unwrap();
        NoteService::new(Some(repo), admin, "%-d/%-m/%Y, %H:%M:%S")
    }

    fn entries(items: &[ListItem]) -> Vec<(i64, String)> {
        items
            .iter()
            .filter_map(|item| match &item.content {
                ItemContent::Entry {
                    note_id, review, ..
                } => Some((note_id.0, review.clone())),
                ItemContent::Placeholder => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_render_empty_store_shows_placeholder() {
        for admin in [AdminMode::Off, AdminMode::On] {
            let service = service(admin);

            assert_eq!(service.render().await.unwrap(), 0);

            let items = service.displayed_items().await;
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].content, ItemContent::Placeholder);
        }
    }

    #[tokio::test]
    async fn test_submit_then_render_scenario() {
        let service = service(AdminMode::Off);
        service.render().await.unwrap();

        let first = service.submit("Great product".to_string()).await.unwrap();
        assert_eq!(first.id, NoteId(1));
        assert!(!first.date.is_empty());

        let items = service.displayed_items().await;
        assert_eq!(items.len(), 1);
        match &items[0].content {
            ItemContent::Entry {
                caption, review, ..
            } => {
                assert_eq!(caption, &format!("1. {} ", first.date));
                assert_eq!(review, "Great product");
            }
            ItemContent::Placeholder => panic!("expected an entry"),
        }

        service.submit("Terrible".to_string()).await.unwrap();
        assert_eq!(
            entries(&service.displayed_items().await),
            vec![(2, "Terrible".to_string()), (1, "Great product".to_string())]
        );
    }

    #[tokio::test]
    async fn test_n_submissions_render_n_entries_descending() {
        let service = service(AdminMode::Off);

        for n in 1..=5 {
            service.submit(format!("review {n}")).await.unwrap();

            let shown = entries(&service.displayed_items().await);
            assert_eq!(shown.len(), n);
            let ids: Vec<i64> = shown.iter().map(|(id, _)| *id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            assert_eq!(ids, sorted);
        }
    }

    #[tokio::test]
    async fn test_submit_clears_input() {
        let service = service(AdminMode::Off);

        service.submit("hello".to_string()).await.unwrap();

        assert_eq!(service.input().await, "");
    }

    #[tokio::test]
    async fn test_submit_accepts_empty_text() {
        let service = service(AdminMode::Off);

        let note = service.submit(String::new()).await.unwrap();

        assert_eq!(note.review, "");
        assert_eq!(entries(&service.displayed_items().await), vec![(1, String::new())]);
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let service = service(AdminMode::On);
        service.submit("one".to_string()).await.unwrap();
        service.submit("two".to_string()).await.unwrap();

        service.render().await.unwrap();
        let first: Vec<ItemContent> = service
            .displayed_items()
            .await
            .into_iter()
            .map(|item| item.content)
            .collect();

        service.render().await.unwrap();
        let second: Vec<ItemContent> = service
            .displayed_items()
            .await
            .into_iter()
            .map(|item| item.content)
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_admin_mode_adds_delete_controls() {
        let service = service(AdminMode::On);
        service.submit("with control".to_string()).await.unwrap();

        let items = service.displayed_items().await;
        assert!(matches!(
            items[0].content,
            ItemContent::Entry {
                delete_control: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_element_removes_one_entry() {
        let service = service(AdminMode::On);
        service.submit("first".to_string()).await.unwrap();
        service.submit("second".to_string()).await.unwrap();

        let items = service.displayed_items().await;
        let target = items[1].handle;

        let deleted = service.delete_element(target).await.unwrap();

        assert_eq!(deleted, Some((NoteId(1), true)));
        let remaining = service.displayed_items().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].handle, items[0].handle);
        assert_eq!(service.get_all_notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_last_note_shows_placeholder() {
        let service = service(AdminMode::On);
        let note = service.submit("only".to_string()).await.unwrap();

        assert!(service.delete_note(note.id, None).await.unwrap());

        let items = service.displayed_items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, ItemContent::Placeholder);
    }

    #[tokio::test]
    async fn test_delete_missing_note_is_noop() {
        let service = service(AdminMode::On);
        service.submit("stays".to_string()).await.unwrap();
        let before = service.displayed_items().await;

        assert!(!service.delete_note(NoteId(99), None).await.unwrap());

        assert_eq!(service.displayed_items().await, before);
        assert_eq!(service.get_all_notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_handle_is_ignored() {
        let service = service(AdminMode::On);
        service.submit("a".to_string()).await.unwrap();
        let stale = service.displayed_items().await[0].handle;

        service.render().await.unwrap();

        assert_eq!(service.delete_element(stale).await.unwrap(), None);
        assert_eq!(service.get_all_notes().await.unwrap().len(), 1);
    }

    /// Service over an on-disk database plus a second connection to the same
    /// file, used to change the store behind the service's back.
    fn on_disk_service(dir: &tempfile::TempDir) -> (NoteService, rusqlite::Connection) {
        let path = dir.path().join("notes.db");
        let repo = Repository::open(&path).unwrap();
        let service = NoteService::new(Some(repo), AdminMode::On, "%H:%M:%S");
        let side = rusqlite::Connection::open(&path).unwrap();
        (service, side)
    }

    #[tokio::test]
    async fn test_failed_delete_rerenders_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let (service, side) = on_disk_service(&dir);
        service.submit("first".to_string()).await.unwrap();
        service.submit("second".to_string()).await.unwrap();
        side.execute_batch(
            "CREATE TRIGGER keep_notes BEFORE DELETE ON notes \
             BEGIN SELECT RAISE(ABORT, 'deletes disabled'); END;",
        )
        .unwrap();

        let target = service.displayed_items().await[0].handle;
        let result = service.delete_element(target).await;

        assert!(matches!(result, Err(NotesError::Transaction(_))));
        assert_eq!(
            entries(&service.displayed_items().await),
            vec![(2, "second".to_string()), (1, "first".to_string())]
        );
        assert_eq!(service.get_all_notes().await.unwrap().len(), 2);
        assert_eq!(service.delete_element(target).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_input_and_view() {
        let dir = tempfile::tempdir().unwrap();
        let (service, side) = on_disk_service(&dir);
        service.submit("existing".to_string()).await.unwrap();
        side.execute_batch(
            "CREATE TRIGGER no_new_notes BEFORE INSERT ON notes \
             BEGIN SELECT RAISE(ABORT, 'inserts disabled'); END;",
        )
        .unwrap();
        let before = service.displayed_items().await;

        let result = service.submit("kept".to_string()).await;

        assert!(matches!(result, Err(NotesError::Transaction(_))));
        assert_eq!(service.input().await, "kept");
        assert_eq!(service.displayed_items().await, before);
        assert_eq!(service.get_all_notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_row_leaves_view_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let (service, side) = on_disk_service(&dir);
        // Read last in descending order, after the two valid notes were shown.
        side.execute("INSERT INTO notes (review, date) VALUES (X'00', 'now')", [])
            .unwrap();
        service.submit("two".to_string()).await.unwrap();
        service.submit("three".to_string()).await.unwrap();

        let result = service.render().await;

        assert!(matches!(result, Err(NotesError::Transaction(_))));
        assert!(service.displayed_items().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_element_reports_missing_row() {
        let dir = tempfile::tempdir().unwrap();
        let (service, side) = on_disk_service(&dir);
        service.submit("gone elsewhere".to_string()).await.unwrap();
        side.execute("DELETE FROM notes WHERE id = 1", []).unwrap();

        let handle = service.displayed_items().await[0].handle;
        let deleted = service.delete_element(handle).await.unwrap();

        assert_eq!(deleted, Some((NoteId(1), false)));
        let items = service.displayed_items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, ItemContent::Placeholder);
    }

    #[tokio::test]
    async fn test_without_storage_operations_fail() {
        let service = NoteService::new(None, AdminMode::On, "%H:%M");

        assert!(matches!(service.render().await, Err(NotesError::Unavailable)));
        assert!(matches!(
            service.submit("lost".to_string()).await,
            Err(NotesError::Unavailable)
        ));
        assert_eq!(service.input().await, "lost");
        assert!(service.displayed_items().await.is_empty());
        assert!(matches!(
            service.delete_note(NoteId(1), None).await,
            Err(NotesError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_open_with_bad_path_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("missing").join("notes.db"),
            ..Config::default()
        };

        let service = NoteService::open(&config);

        assert!(!service.has_storage());
        assert!(service.page_html().await.is_ok());
    }
}
