use std::path::Path;

use super::STDIN;

pub fn simplify_file_name(path: &str) -> String {
    if path == STDIN {
        return "stdin".to_string();
    }
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Ids given to the ballots that do not carry a voter id.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
