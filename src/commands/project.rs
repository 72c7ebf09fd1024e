use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{print_json, write_output};
use crate::app::App;
use crate::error::{AppError, Result};
use crate::project::{export_file_name, BufferKind, ProjectRecord};

/// One row of `list`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub modified: String,
    pub current: bool,
}

impl ProjectSummary {
    fn from_record(record: &ProjectRecord, current_id: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            modified: record.modified.to_rfc3339(),
            current: record.id == current_id,
        }
    }
}

pub fn new_project(app: &App, name: Option<&str>) -> Result<()> {
    let store = app.store();
    let project = store.create_project();
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        store.rename_project(name)?;
    }
    let record = project.borrow();
    println!("Created {} ({})", record.name, record.id);
    Ok(())
}

pub fn list(app: &App) -> Result<()> {
    let store = app.store();
    let current_id = store.current().borrow().id.clone();
    let summaries: Vec<ProjectSummary> = store
        .list_projects()?
        .iter()
        .map(|record| ProjectSummary::from_record(record, &current_id))
        .collect();
    print_json(&summaries)
}

pub fn show(app: &App, kind: Option<BufferKind>) -> Result<()> {
    match kind {
        Some(kind) => {
            println!("{}", app.editor.get_code(kind));
            Ok(())
        }
        None => {
            let project = app.store().current();
            let record = project.borrow();
            print_json(&*record)
        }
    }
}

pub fn load(app: &App, id: &str) -> Result<()> {
    match app.store().load_from_index(id) {
        Some(project) => {
            println!("Loaded {}", project.borrow().name);
            Ok(())
        }
        None => Err(AppError::Custom(format!("No saved project with id '{id}'"))),
    }
}

pub fn delete(app: &App, id: &str) -> Result<()> {
    if !app.store().delete_project(id)? {
        return Err(AppError::Custom(format!("No saved project with id '{id}'")));
    }
    if app.store().current().borrow().id == id {
        println!("Deleted {id} from the saved list (it stays open until another is loaded)");
    } else {
        println!("Deleted {id}");
    }
    Ok(())
}

pub fn rename(app: &App, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("project name cannot be empty".into()));
    }
    app.store().rename_project(name)?;
    println!("Renamed to {name}");
    Ok(())
}

pub fn import(app: &App, file: &Path) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let project = app.store().import_project(&bytes)?;
    // Imports are not added to the saved list until the project is saved.
    app.store().save_current()?;
    println!("Imported {}", project.borrow().name);
    Ok(())
}

pub fn export(app: &App, out: Option<PathBuf>) -> Result<()> {
    let record = app.store().current().borrow().clone();
    let bytes = app.store().export_project(&record)?;
    let path = write_output(out, &export_file_name(&record.name), &bytes)?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub fn edit(
    app: &App,
    kind: BufferKind,
    file: Option<PathBuf>,
    text: Option<String>,
) -> Result<()> {
    let text = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(path)?,
        (None, Some(text)) => text,
        (None, None) => return Err(AppError::Validation("nothing to write".into())),
    };
    app.editor.on_change(kind, text);
    app.store().save_current()?;
    println!("Updated {kind}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Collaborators;
    use crate::config::AppConfig;
    use crate::project::FileStorage;
    use crate::services::{CannedAssistant, SimulatedPublisher};
    use std::rc::Rc;
    use std::time::Duration;

    fn file_app(dir: &Path) -> App {
        let config = AppConfig::default();
        let collaborators = Collaborators {
            storage: Box::new(FileStorage::new(dir)),
            assistant: Rc::new(CannedAssistant::new(Duration::ZERO)),
            publisher: Rc::new(SimulatedPublisher::new(&config.deploy)),
        };
        App::bootstrap(config, collaborators).unwrap()
    }

    #[test]
    fn test_edit_persists_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = file_app(dir.path());
            edit(&app, BufferKind::Css, None, Some("p { margin: 0; }".into())).unwrap();
        }
        let app = file_app(dir.path());
        assert_eq!(app.store().current().borrow().css, "p { margin: 0; }");
        assert_eq!(app.editor.content(BufferKind::Css), "p { margin: 0; }");
    }

    #[test]
    fn test_new_with_name_is_listed() {
        let dir = tempfile::tempdir().unwrap();
        let app = file_app(dir.path());
        new_project(&app, Some("Gallery")).unwrap();
        let names: Vec<String> = app
            .store()
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["New Project", "Gallery"]);
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = file_app(&dir.path().join("storage"));
        rename(&app, "Round Trip").unwrap();
        let target = dir.path().join("round-trip.ccxr.json");
        export(&app, Some(target.clone())).unwrap();

        new_project(&app, None).unwrap();
        import(&app, &target).unwrap();
        assert_eq!(app.store().current().borrow().name, "Round Trip");
        assert_eq!(app.store().list_projects().unwrap().len(), 2);
    }

    #[test]
    fn test_show_kind_reads_live_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let app = file_app(dir.path());
        edit(&app, BufferKind::Js, None, Some("go();".into())).unwrap();
        assert_eq!(app.editor.get_code(BufferKind::Js), "go();");
        show(&app, Some(BufferKind::Js)).unwrap();
        show(&app, None).unwrap();
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = file_app(dir.path());
        assert!(load(&app, "project-nope").is_err());
        assert!(delete(&app, "project-nope").is_err());
        assert!(matches!(rename(&app, "  "), Err(AppError::Validation(_))));
    }
}
