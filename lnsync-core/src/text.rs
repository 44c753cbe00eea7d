//! Small text helpers shared by the normalizer and the renderer.

pub const MAX_SUBJECT_CHARS: usize = 1000;
pub const MAX_DESCRIPTION_CHARS: usize = 8000;

/// Truncate to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Trim, drop carriage returns and cap at the subject limit.
pub fn clean_subject(s: &str) -> String {
    truncate(s.replace('\r', "").trim(), MAX_SUBJECT_CHARS)
}

/// Remove control characters, which the destination refuses in locations.
pub fn strip_control(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// Turn a list of Notes names into readable ones.
///
/// `CN=Ann Smith/OU=Sales/O=Acme;Bob Jones/Acme` becomes
/// `Ann Smith, Bob Jones`. Internet addresses are kept as they are.
pub fn plain_names(list: &str) -> String {
    list.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(plain_name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn plain_name(name: &str) -> &str {
    let name = match name.find("CN=") {
        Some(idx) => &name[idx + 3..],
        None => name,
    };
    match name.split_once('/') {
        Some((common, _)) => common.trim(),
        None => name,
    }
}
