use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Surface;
use crate::project::{ProjectRecord, ProjectStore};

/// Composes the renderable preview: markup first, then the stylesheet in a
/// `<style>` block, then the script in a `<script>` block.
pub fn compose_preview(html: &str, css: &str, js: &str) -> String {
    format!("{html}\n<style>{css}</style>\n<script>{js}</script>\n")
}

/// Live preview panel.
pub struct PreviewSurface {
    store: Rc<ProjectStore>,
    document: RefCell<String>,
    renders: Cell<usize>,
}

impl PreviewSurface {
    pub fn new(store: Rc<ProjectStore>) -> Rc<Self> {
        Rc::new(Self {
            store,
            document: RefCell::new(String::new()),
            renders: Cell::new(0),
        })
    }

    /// The document last handed to the preview frame.
    pub fn document(&self) -> String {
        self.document.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    /// Forces a re-render from the live record.
    pub fn refresh(&self) {
        let project = self.store.current();
        let record = project.borrow();
        self.render(&record);
    }
}

impl Surface for PreviewSurface {
    fn name(&self) -> &'static str {
        "preview"
    }

    fn render(&self, project: &ProjectRecord) {
        *self.document.borrow_mut() = compose_preview(&project.html, &project.css, &project.js);
        self.renders.set(self.renders.get() + 1);
        tracing::trace!(renders = self.renders.get(), "preview rendered");
    }
}
