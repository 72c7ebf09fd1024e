use chrono::{DateTime, Utc};
use rand::Rng;

/// Expands a leading `~` in a path to the user's home directory.
/// Also normalizes path separators for the current OS.
pub fn expand_tilde(path: &str) -> String {
    let result = if path.starts_with("~/") || path == "~" {
        match dirs::home_dir() {
            Some(home) if path.len() > 2 => home.join(&path[2..]).to_string_lossy().to_string(),
            Some(home) => home.to_string_lossy().to_string(),
            None => path.to_string(),
        }
    } else {
        path.to_string()
    };
    if cfg!(windows) {
        result.replace('/', "\\")
    } else {
        result
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates an id of the form `<prefix>-<unix millis>-<9 base-36 chars>`.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{millis}-{suffix}")
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Lower-cases a project name and collapses whitespace runs into `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
