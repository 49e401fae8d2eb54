//! English inflection for default table, class and key names.
//!
//! Covers the regular suffix rules plus the irregular nouns that show up in
//! training schemas; anything else should be spelled out in the descriptor.

use convert_case::{Case, Casing};

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("quiz", "quizzes"),
    ("status", "statuses"),
    ("address", "addresses"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "series", "species", "news"];

/// Plural form of a lowercase snake_case word (last segment only).
pub fn pluralize(word: &str) -> String {
    let (head, last) = split_last_segment(word);

    if UNCOUNTABLE.contains(&last) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == last) {
        return format!("{head}{plural}");
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == last) {
        return word.to_string();
    }

    let plural = if let Some(stem) = last.strip_suffix('y').filter(|s| ends_with_consonant(s)) {
        format!("{stem}ies")
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| last.ends_with(s)) {
        format!("{last}es")
    } else {
        format!("{last}s")
    };

    format!("{head}{plural}")
}

/// Singular form of a lowercase snake_case word (last segment only).
pub fn singularize(word: &str) -> String {
    let (head, last) = split_last_segment(word);

    if UNCOUNTABLE.contains(&last) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == last) {
        return format!("{head}{singular}");
    }
    if IRREGULAR.iter().any(|(singular, _)| *singular == last) {
        return word.to_string();
    }

    let singular = if let Some(stem) = last.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = ["ches", "shes", "sses", "xes", "zes"]
        .iter()
        .find_map(|suffix| last.strip_suffix(suffix).map(|stem| (stem, suffix)))
        .map(|(stem, suffix)| format!("{stem}{}", &suffix[..suffix.len() - 2]))
    {
        stem
    } else if last.ends_with("ss") || last.ends_with("us") {
        last.to_string()
    } else if let Some(stem) = last.strip_suffix('s') {
        stem.to_string()
    } else {
        last.to_string()
    };

    format!("{head}{singular}")
}

/// `CourseModule` -> `course_modules`.
pub fn tableize(type_name: &str) -> String {
    pluralize(&type_name.to_case(Case::Snake))
}

/// `lesson_completions` -> `LessonCompletion`.
pub fn classify(name: &str) -> String {
    singularize(&name.to_case(Case::Snake)).to_case(Case::Pascal)
}

/// `DiscussionReply` -> `discussion_reply_id`.
pub fn foreign_key(type_name: &str) -> String {
    format!("{}_id", type_name.to_case(Case::Snake))
}

fn split_last_segment(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(pos) => (&word[..=pos], &word[pos + 1..]),
        None => ("", word),
    }
}

fn ends_with_consonant(stem: &str) -> bool {
    stem.chars()
        .last()
        .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}
