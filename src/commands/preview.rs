use std::path::PathBuf;

use super::write_output;
use crate::app::App;
use crate::error::Result;

/// Prints the preview document, or writes it when `out` is given.
pub fn preview(app: &App, out: Option<PathBuf>) -> Result<()> {
    app.preview.refresh();
    let document = app.preview.document();
    match out {
        Some(path) => {
            let path = write_output(Some(path), "preview.html", document.as_bytes())?;
            println!("Wrote {}", path.display());
        }
        None => print!("{document}"),
    }
    Ok(())
}
