// src/banner.rs

//! License header prepended to every compiled file.

use crate::config::ProjectMetadata;

/// Build the four-line comment block:
///
/// ```text
/// /*
///  My App v1.0.0
///  (c) Jane
///  License: MIT
///  */
/// ```
///
/// Dashes in the project name become spaces and each word is capitalized.
/// Blank metadata yields blank segments, never an error.
pub fn format(meta: &ProjectMetadata) -> String {
    let app = format!(" {} v{}", display_name(&meta.name), meta.version);
    let author = format!(" (c) {} ", meta.author);
    let license = format!(" License: {}", meta.license);

    ["/*", &app, &author, &license, " */", ""].join("\n")
}

/// `"my-app"` → `"My App"`.
pub fn display_name(name: &str) -> String {
    name.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Identifier under which the UMD bundle registers itself as a browser
/// global: `"my-app"` → `"myApp"`. Falls back to `"bundle"`.
pub fn global_name(name: &str) -> String {
    let mut out = String::new();
    let mut upper_next = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if out.is_empty() && c.is_ascii_digit() {
                continue;
            }
            if upper_next && !out.is_empty() {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }
    if out.is_empty() {
        "bundle".to_string()
    } else {
        out
    }
}
