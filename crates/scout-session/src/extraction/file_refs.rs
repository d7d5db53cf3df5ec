use std::path::Path;

use super::rule_pattern;

/// Tool input fields that carry paths.
pub const PATH_FIELDS: &[&str] = &[
    "file_path",
    "path",
    "filePath",
    "notebook_path",
    "directory",
    "command",
];

rule_pattern!(
    RE_COMMAND_PATH,
    r"(?:^|\s)((?:\.{1,2}/|/|~/)?[\w@.\-]+(?:/[\w@.\-]+)+/?|[\w\-]+\.[A-Za-z][A-Za-z0-9]{0,5})(?:\s|$)"
);

/// Files and directories referenced by one tool input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRefs {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

impl FileRefs {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

pub fn extract_file_refs(input: &serde_json::Value) -> FileRefs {
    let mut refs = FileRefs::default();
    let Some(obj) = input.as_object() else {
        return refs;
    };

    for field in PATH_FIELDS {
        let Some(value) = obj.get(*field).and_then(|v| v.as_str()) else {
            continue;
        };
        match *field {
            "directory" => push_unique(&mut refs.directories, value.trim_end_matches('/')),
            "command" => {
                for candidate in command_paths(value) {
                    add_path(&mut refs, &candidate);
                }
            }
            _ => add_path(&mut refs, value),
        }
    }
    refs
}

fn command_paths(command: &str) -> Vec<String> {
    let Some(re) = RE_COMMAND_PATH.as_ref() else {
        return Vec::new();
    };
    // Separators are consumed by each match, so pad tokens apart.
    let spaced = command.replace(' ', "  ");
    re.captures_iter(&spaced)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|p| !p.starts_with('-') && !p.contains("://"))
        .collect()
}

fn add_path(refs: &mut FileRefs, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    let path = Path::new(raw);
    let looks_like_file = !raw.ends_with('/') && path.extension().is_some();
    if looks_like_file {
        push_unique(&mut refs.files, raw);
        if let Some(parent) = path.parent().and_then(|p| p.to_str()) {
            if !parent.is_empty() {
                push_unique(&mut refs.directories, parent);
            }
        }
    } else {
        push_unique(&mut refs.directories, raw.trim_end_matches('/'));
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Final path component, used as the focus area.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
