use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Surface;
use crate::project::{BufferKind, DocumentSnapshot, ProjectRecord, ProjectStore};

/// The three code panels. Each view mirrors one buffer of the live record
/// and feeds user edits back through the store.
pub struct EditorSurface {
    store: Rc<ProjectStore>,
    views: RefCell<DocumentSnapshot>,
    reloads: Cell<usize>,
}

impl EditorSurface {
    pub fn new(store: Rc<ProjectStore>) -> Rc<Self> {
        Rc::new(Self {
            store,
            views: RefCell::new(DocumentSnapshot::default()),
            reloads: Cell::new(0),
        })
    }

    /// Text currently shown in the view for `kind`.
    pub fn content(&self, kind: BufferKind) -> String {
        self.views.borrow().get(kind).to_string()
    }

    /// Change callback for the code widget: the user typed in a panel.
    pub fn on_change(&self, kind: BufferKind, text: impl Into<String>) {
        let text = text.into();
        self.views.borrow_mut().set(kind, &text);
        self.store.write_buffer(kind, text);
    }

    /// Reads a buffer straight from the live record.
    pub fn get_code(&self, kind: BufferKind) -> String {
        self.store.current().borrow().buffer(kind).to_string()
    }

    /// Replaces a buffer programmatically, as if the user had typed it.
    pub fn set_code(&self, kind: BufferKind, code: impl Into<String>) {
        self.on_change(kind, code);
    }

    /// Number of views whose text had to be replaced by re-renders so far.
    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }
}

impl Surface for EditorSurface {
    fn name(&self) -> &'static str {
        "editor"
    }

    fn render(&self, project: &ProjectRecord) {
        let mut views = self.views.borrow_mut();
        for kind in BufferKind::ALL {
            let text = project.buffer(kind);
            if views.get(kind) != text {
                views.set(kind, text);
                self.reloads.set(self.reloads.get() + 1);
            }
        }
    }
}
