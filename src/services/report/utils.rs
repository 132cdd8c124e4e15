use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid file stem pattern"));

/// Turns a column name into a file-system friendly stem that is unique
/// within `existing_names`.
pub fn clean_file_stem(name: &str, existing_names: &mut HashSet<String>) -> String {
    let base_name = NON_WORD
        .replace_all(name, "_")
        .trim_matches('_')
        .to_lowercase();

    let mut cleaned = if base_name.is_empty() {
        "column".to_string()
    } else {
        base_name
    };

    // If the name already exists, add a numeric suffix
    let mut counter = 1;
    let original_name = cleaned.clone();
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", original_name, counter);
        counter += 1;
    }

    cleaned
}

pub fn format_share(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}
