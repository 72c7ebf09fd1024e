use regex::Regex;
use std::sync::LazyLock;

/// Name given to freshly created projects.
pub const DEFAULT_PROJECT_NAME: &str = "New Project";

/// Returns the starter markup for a new project.
pub fn default_html() -> &'static str {
    "<!DOCTYPE html>\n<html>\n<head>\n  <title>My XR Web App</title>\n</head>\n<body>\n  <h1>Hello World</h1>\n</body>\n</html>"
}

/// Returns the starter stylesheet for a new project.
pub fn default_css() -> &'static str {
    "body {\n  font-family: Arial, sans-serif;\n  margin: 20px;\n}\n\nh1 {\n  color: blue;\n}"
}

/// Returns the starter script for a new project.
pub fn default_js() -> &'static str {
    "document.addEventListener(\"DOMContentLoaded\", function() {\n  console.log(\"App loaded!\");\n});"
}

/// Returns the instructional message the assistant transcript starts with.
pub fn assistant_intro() -> &'static str {
    r#"I can help you build your web app by generating HTML, CSS, and JavaScript code.
Try asking me to:
- "Make a red button that says 'Click me'"
- "Add a header with a gradient background"
- "Create a function that shows an alert when a button is clicked""#
}

/// Builds the standalone page used for downloads and deploy archives.
///
/// The user's markup usually carries its own document wrapper, so the
/// doctype, `<html>`/`<body>` tags and the whole `<head>` element are
/// stripped before it is placed in the generated body.
pub fn standalone_document(html: &str, css: &str, js: &str) -> String {
    let body = strip_document_wrapper(html);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>CodeCrafter XR Project</title>
  <style>
{css}
  </style>
</head>
<body>
{body}
  <script>
{js}
  </script>
</body>
</html>
"#
    )
}

/// The user's own document wrapper: doctype, `<html>`/`<body>` tags with
/// or without attributes, and the whole `<head>` element.
static DOCUMENT_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<!doctype\s+html\s*>",
        r"|</?html(?:\s[^>]*)?>",
        r"|<head(?:\s[^>]*)?>.*?</head\s*>",
        r"|</?body(?:\s[^>]*)?>",
    ))
    .expect("valid document wrapper regex")
});

fn strip_document_wrapper(html: &str) -> String {
    DOCUMENT_WRAPPER.replace_all(html, "").trim().to_string()
}
