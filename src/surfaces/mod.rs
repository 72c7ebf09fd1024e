//! Surfaces render the current project and originate edits to it. None of
//! them own project state: they re-render from the store's live record
//! whenever the bus announces a change.

use std::rc::Rc;

use crate::bus::{ChangeBus, SubscriptionId, Topic};
use crate::project::{ProjectRecord, ProjectStore};

pub mod assistant;
pub mod deploy;
pub mod editor;
pub mod preview;
pub mod xr;

pub use assistant::AssistantSurface;
pub use deploy::DeploySurface;
pub use editor::EditorSurface;
pub use preview::PreviewSurface;
pub use xr::XrMirrorSurface;

pub trait Surface {
    fn name(&self) -> &'static str;

    /// Bus topics this surface re-renders on.
    fn topics(&self) -> &'static [Topic] {
        &[Topic::DocumentChanged, Topic::ProjectChanged]
    }

    /// Redraws from the authoritative record. Must be idempotent.
    fn render(&self, project: &ProjectRecord);
}

/// Renders `surface` once and re-renders it on every event of its topics.
///
/// The subscriptions hold weak handles, so dropping the surface or the
/// store silences them instead of keeping either alive.
pub fn mount<S: Surface + 'static>(
    bus: &ChangeBus,
    store: &Rc<ProjectStore>,
    surface: &Rc<S>,
) -> Vec<SubscriptionId> {
    surface.render(&store.current().borrow());

    let ids: Vec<SubscriptionId> = surface
        .topics()
        .iter()
        .map(|&topic| {
            let weak_surface = Rc::downgrade(surface);
            let weak_store = Rc::downgrade(store);
            bus.subscribe(topic, move |_event| {
                let (Some(surface), Some(store)) = (weak_surface.upgrade(), weak_store.upgrade())
                else {
                    return;
                };
                let project = store.current();
                let record = project.borrow();
                surface.render(&record);
            })
        })
        .collect();
    tracing::debug!(surface = surface.name(), subscriptions = ids.len(), "mounted surface");
    ids
}
