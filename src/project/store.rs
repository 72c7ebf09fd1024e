use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

use super::record::{
    BufferKind, DocumentSnapshot, Patch, ProjectDocument, ProjectRecord, SharedProject,
};
use super::storage::{StorageAdapter, CURRENT_PROJECT_KEY, PROJECTS_INDEX_KEY};
use crate::bus::{ChangeBus, ChangeEvent};
use crate::error::{AppError, Result};
use crate::util::{now, slugify};

/// Sole writer of persisted project state and owner of the current project.
pub struct ProjectStore {
    storage: Box<dyn StorageAdapter>,
    bus: Rc<ChangeBus>,
    current: RefCell<SharedProject>,
}

impl ProjectStore {
    /// Restores the last current project from storage, or starts a new one
    /// when nothing usable was persisted.
    pub fn open(storage: Box<dyn StorageAdapter>, bus: Rc<ChangeBus>) -> Self {
        let restored = match read_json::<ProjectRecord>(storage.as_ref(), CURRENT_PROJECT_KEY) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable current project");
                None
            }
        };

        let store = Self {
            storage,
            bus,
            current: RefCell::new(ProjectRecord::from_template().into_shared()),
        };
        match restored {
            Some(record) => {
                store.load_project(record);
            }
            None => {
                store.create_project();
            }
        }
        store
    }

    /// The live record. Callers share it; they never get a copy.
    pub fn current(&self) -> SharedProject {
        self.current.borrow().clone()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.current().borrow().snapshot()
    }

    pub fn create_project(&self) -> SharedProject {
        let project = self.replace_current(ProjectRecord::from_template());
        if let Err(e) = self.save_project(&project) {
            warn!(error = %e, "new project was not persisted");
        }
        info!(id = %project.borrow().id, "created project");
        self.publish_project_changed(&project);
        project
    }

    /// Stamps `modified`, persists the record as the current pointer and
    /// upserts it into the index. The in-memory record keeps the new
    /// timestamp even when persistence fails.
    pub fn save_project(&self, project: &SharedProject) -> Result<()> {
        let record = {
            let mut record = project.borrow_mut();
            record.modified = now();
            record.clone()
        };

        write_json(self.storage.as_ref(), CURRENT_PROJECT_KEY, &record)?;
        let mut index = self.read_index()?;
        upsert_index(&mut index, record.clone());
        write_json(self.storage.as_ref(), PROJECTS_INDEX_KEY, &index)?;

        info!(id = %record.id, name = %record.name, "saved project");
        Ok(())
    }

    pub fn save_current(&self) -> Result<()> {
        self.save_project(&self.current())
    }

    /// Makes `record` the current project, replacing the previous one
    /// wholesale.
    pub fn load_project(&self, record: ProjectRecord) -> SharedProject {
        let project = self.replace_current(record);
        if let Err(e) = write_json(self.storage.as_ref(), CURRENT_PROJECT_KEY, &*project.borrow()) {
            warn!(error = %e, "current project pointer was not persisted");
        }
        info!(id = %project.borrow().id, "loaded project");
        self.publish_project_changed(&project);
        project
    }

    /// Loads an indexed project. Unknown ids leave everything untouched.
    pub fn load_from_index(&self, id: &str) -> Option<SharedProject> {
        let index = match self.read_index() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "cannot read project index");
                return None;
            }
        };
        let record = index.into_iter().find(|p| p.id == id)?;
        Some(self.load_project(record))
    }

    /// Removes `id` from the index. The current project stays loaded even
    /// when it is the one being deleted.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let mut index = self.read_index()?;
        let before = index.len();
        index.retain(|p| p.id != id);
        if index.len() == before {
            return Ok(false);
        }
        write_json(self.storage.as_ref(), PROJECTS_INDEX_KEY, &index)?;
        info!(%id, "deleted project from index");
        Ok(true)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        self.read_index()
    }

    pub fn rename_project(&self, name: &str) -> Result<()> {
        let project = self.current();
        project.borrow_mut().name = name.to_string();
        self.save_project(&project)
    }

    /// Parses a project file and loads it. A rejected file leaves the
    /// current project as it was.
    pub fn import_project(&self, bytes: &[u8]) -> Result<SharedProject> {
        let record = ProjectDocument::parse(bytes)?.into_record()?;
        Ok(self.load_project(record))
    }

    pub fn export_project(&self, record: &ProjectRecord) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(record)?)
    }

    /// Replaces one buffer of the live record and announces the edit.
    pub fn write_buffer(&self, kind: BufferKind, text: impl Into<String>) {
        let project = self.current();
        project.borrow_mut().set_buffer(kind, text.into());
        self.publish_document_changed(&project);
    }

    /// Applies the present fields of `patch` in place. Returns false, and
    /// publishes nothing, for an empty patch.
    pub fn apply_patch(&self, patch: &Patch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let project = self.current();
        {
            let mut record = project.borrow_mut();
            for (kind, text) in patch.fields() {
                record.set_buffer(kind, text.to_string());
            }
        }
        self.publish_document_changed(&project);
        true
    }

    fn replace_current(&self, record: ProjectRecord) -> SharedProject {
        let project = record.into_shared();
        *self.current.borrow_mut() = project.clone();
        project
    }

    fn read_index(&self) -> Result<Vec<ProjectRecord>> {
        Ok(read_json(self.storage.as_ref(), PROJECTS_INDEX_KEY)?.unwrap_or_default())
    }

    fn publish_project_changed(&self, project: &SharedProject) {
        self.bus.publish(&ChangeEvent::ProjectChanged(project.clone()));
    }

    fn publish_document_changed(&self, project: &SharedProject) {
        let snapshot = project.borrow().snapshot();
        self.bus.publish(&ChangeEvent::DocumentChanged(snapshot));
    }
}

/// File name offered when a project is exported.
pub fn export_file_name(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "project.ccxr.json".to_string()
    } else {
        format!("{slug}.ccxr.json")
    }
}

/// Replaces the entry with the same id in place, or appends. Returns true
/// when the record was new to the index.
pub fn upsert_index(index: &mut Vec<ProjectRecord>, record: ProjectRecord) -> bool {
    if let Some(existing) = index.iter_mut().find(|p| p.id == record.id) {
        *existing = record;
        false
    } else {
        index.push(record);
        true
    }
}

fn read_json<T: DeserializeOwned>(storage: &dyn StorageAdapter, key: &str) -> Result<Option<T>> {
    match storage.get(key)? {
        Some(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("'{key}' is unreadable: {e}"))),
        None => Ok(None),
    }
}

fn write_json<T: serde::Serialize + ?Sized>(
    storage: &dyn StorageAdapter,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use crate::project::storage::MemoryStorage;
    use std::cell::Cell;

    type SharedStorage = Rc<MemoryStorage>;

    fn open_store() -> (ProjectStore, SharedStorage, Rc<ChangeBus>) {
        let storage = SharedStorage::new(MemoryStorage::new());
        let bus = Rc::new(ChangeBus::new());
        let store = ProjectStore::open(Box::new(storage.clone()), bus.clone());
        (store, storage, bus)
    }

    fn count_events(bus: &ChangeBus, topic: Topic) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.subscribe(topic, move |_| h.set(h.get() + 1));
        hits
    }

    fn persisted_current(storage: &SharedStorage) -> ProjectRecord {
        let json = storage.get(CURRENT_PROJECT_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    fn persisted_index(storage: &SharedStorage) -> Vec<ProjectRecord> {
        let json = storage.get(PROJECTS_INDEX_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_open_creates_and_persists_default() {
        let (store, storage, _) = open_store();
        let current = store.current().borrow().clone();
        assert_eq!(current.name, "New Project");
        assert_eq!(persisted_current(&storage).id, current.id);
        assert_eq!(persisted_index(&storage).len(), 1);
    }

    #[test]
    fn test_open_restores_persisted_project() {
        let (store, storage, _) = open_store();
        store.rename_project("Restored").unwrap();
        let id = store.current().borrow().id.clone();

        let reopened = ProjectStore::open(Box::new(storage.clone()), Rc::new(ChangeBus::new()));
        assert_eq!(reopened.current().borrow().id, id);
        assert_eq!(reopened.current().borrow().name, "Restored");
    }

    #[test]
    fn test_open_recovers_from_corrupt_pointer() {
        let storage = SharedStorage::new(MemoryStorage::new());
        storage.set(CURRENT_PROJECT_KEY, "{not json").unwrap();
        let store = ProjectStore::open(Box::new(storage.clone()), Rc::new(ChangeBus::new()));
        assert_eq!(store.current().borrow().name, "New Project");
        assert_eq!(persisted_current(&storage).id, store.current().borrow().id);
    }

    #[test]
    fn test_create_publishes_one_project_changed() {
        let (store, _, bus) = open_store();
        let projects = count_events(&bus, Topic::ProjectChanged);
        let docs = count_events(&bus, Topic::DocumentChanged);

        let first = store.current();
        let created = store.create_project();
        assert_eq!(projects.get(), 1);
        assert_eq!(docs.get(), 0);
        assert!(Rc::ptr_eq(&created, &store.current()));
        assert_ne!(first.borrow().id, created.borrow().id);
    }

    #[test]
    fn test_save_roundtrips_through_storage() {
        let (store, storage, _) = open_store();
        let project = store.current();
        project.borrow_mut().css.push_str("\np { margin: 0; }");

        let before = now();
        store.save_project(&project).unwrap();
        let persisted = persisted_current(&storage);
        assert_eq!(persisted, *project.borrow());
        assert!(persisted.modified >= before);
    }

    #[test]
    fn test_save_upserts_without_duplicates() {
        let (store, storage, _) = open_store();
        let project = store.current();
        store.save_project(&project).unwrap();
        store.save_project(&project).unwrap();
        assert_eq!(persisted_index(&storage).len(), 1);

        store.create_project();
        assert_eq!(persisted_index(&storage).len(), 2);
    }

    #[test]
    fn test_upsert_keeps_insertion_order() {
        let a = ProjectRecord::from_template();
        let b = ProjectRecord::from_template();
        let mut index = vec![a.clone(), b.clone()];

        let mut renamed = a.clone();
        renamed.name = "Renamed".into();
        assert!(!upsert_index(&mut index, renamed));
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].name, "Renamed");
        assert_eq!(index[1].id, b.id);

        assert!(upsert_index(&mut index, ProjectRecord::from_template()));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let (store, storage, _) = open_store();
        storage.set_quota(Some(10));
        let project = store.current();
        project.borrow_mut().html = "<p>kept</p>".into();

        let err = store.save_project(&project).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(store.current().borrow().html, "<p>kept</p>");
    }

    #[test]
    fn test_create_survives_storage_failure() {
        let (store, storage, bus) = open_store();
        storage.set_quota(Some(0));
        let projects = count_events(&bus, Topic::ProjectChanged);
        let created = store.create_project();
        assert!(Rc::ptr_eq(&created, &store.current()));
        assert_eq!(projects.get(), 1);
    }

    #[test]
    fn test_load_replaces_pointer() {
        let (store, storage, bus) = open_store();
        let projects = count_events(&bus, Topic::ProjectChanged);
        let old = store.current();

        let mut record = ProjectRecord::from_template();
        record.name = "Other".into();
        let loaded = store.load_project(record.clone());

        assert!(!Rc::ptr_eq(&old, &loaded));
        assert_eq!(*store.current().borrow(), record);
        assert_eq!(persisted_current(&storage), record);
        assert_eq!(projects.get(), 1);
    }

    #[test]
    fn test_load_from_index_unknown_id() {
        let (store, _, bus) = open_store();
        let projects = count_events(&bus, Topic::ProjectChanged);
        let current = store.current();
        assert!(store.load_from_index("project-missing").is_none());
        assert!(Rc::ptr_eq(&current, &store.current()));
        assert_eq!(projects.get(), 0);
    }

    #[test]
    fn test_load_from_index_switches_back() {
        let (store, _, _) = open_store();
        let first_id = store.current().borrow().id.clone();
        store.create_project();
        let loaded = store.load_from_index(&first_id).unwrap();
        assert_eq!(loaded.borrow().id, first_id);
        assert!(Rc::ptr_eq(&loaded, &store.current()));
    }

    #[test]
    fn test_delete_keeps_current_project() {
        let (store, storage, _) = open_store();
        let id = store.current().borrow().id.clone();

        assert!(store.delete_project(&id).unwrap());
        assert!(!store.delete_project(&id).unwrap());
        assert!(persisted_index(&storage).is_empty());
        assert_eq!(store.current().borrow().id, id);
    }

    #[test]
    fn test_import_rejects_missing_js() {
        let (store, _, bus) = open_store();
        let projects = count_events(&bus, Topic::ProjectChanged);
        let before = store.current().borrow().clone();

        let err = store
            .import_project(br#"{"html": "<p></p>", "css": "p {}"}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(*store.current().borrow(), before);
        assert_eq!(projects.get(), 0);
    }

    #[test]
    fn test_import_accepts_empty_buffers() {
        let (store, _, bus) = open_store();
        let projects = count_events(&bus, Topic::ProjectChanged);
        let docs = count_events(&bus, Topic::DocumentChanged);
        let project = store
            .import_project(br#"{"html": "", "css": "", "js": ""}"#)
            .unwrap();
        assert_eq!(project.borrow().html, "");
        assert!(Rc::ptr_eq(&project, &store.current()));
        assert_eq!(projects.get(), 1);
        assert_eq!(docs.get(), 0);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (store, _, _) = open_store();
        let original = {
            let project = store.current();
            let mut record = project.borrow_mut();
            record.html = "<main>\n  <p>ünïcode ✓</p>\n</main>".into();
            record.js = "const x = `a\\nb`;".into();
            record.clone()
        };

        let bytes = store.export_project(&original).unwrap();
        let imported = store.import_project(&bytes).unwrap();
        let imported = imported.borrow();
        assert_eq!(imported.html, original.html);
        assert_eq!(imported.css, original.css);
        assert_eq!(imported.js, original.js);
        assert_eq!(imported.id, original.id);
        assert_eq!(imported.created, original.created);
        assert!(imported.modified >= original.modified);
    }

    #[test]
    fn test_write_buffer_mutates_in_place() {
        let (store, _, bus) = open_store();
        let docs = count_events(&bus, Topic::DocumentChanged);
        let held = store.current();

        store.write_buffer(BufferKind::Css, "h1 { color: red; }");
        assert_eq!(held.borrow().css, "h1 { color: red; }");
        assert_eq!(docs.get(), 1);
    }

    #[test]
    fn test_apply_patch_touches_only_present_fields() {
        let (store, _, bus) = open_store();
        let docs = count_events(&bus, Topic::DocumentChanged);
        let before = store.current().borrow().clone();

        let applied = store.apply_patch(&Patch {
            css: Some("p {}".into()),
            ..Default::default()
        });
        assert!(applied);
        let after = store.current().borrow().clone();
        assert_eq!(after.css, "p {}");
        assert_eq!(after.html.as_bytes(), before.html.as_bytes());
        assert_eq!(after.js.as_bytes(), before.js.as_bytes());
        assert_eq!(docs.get(), 1);

        assert!(!store.apply_patch(&Patch::default()));
        assert_eq!(docs.get(), 1);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("My XR  App"), "my-xr-app.ccxr.json");
        assert_eq!(export_file_name("   "), "project.ccxr.json");
    }
}
