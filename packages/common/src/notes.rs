//! Display helpers for the free-text notes a grading run leaves behind.
//!
//! The error guess is a text heuristic: it picks the last word that looks like
//! an exception name. It never affects grading and is only used to label
//! results for display.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Error-looking words, one pattern per marker, tried in order.
static ERROR_WORDS: LazyLock<[(&str, Regex); 3]> = LazyLock::new(|| {
    ["Error", "Exception", "error"].map(|marker| {
        let pattern = Regex::new(&format!(r"\w*{marker}\w*")).expect("valid error pattern");
        (marker, pattern)
    })
});

/// Guess the error name mentioned in grader notes.
///
/// Markers are tried in order; for the first marker present anywhere in the
/// notes, the last word containing it is returned.
pub fn guess_error(notes: &str) -> Option<String> {
    let notes = notes.replace("\\n", " ");
    let (_, pattern) = ERROR_WORDS
        .iter()
        .find(|(marker, _)| notes.contains(marker))?;
    pattern
        .find_iter(&notes)
        .last()
        .map(|m| m.as_str().to_owned())
}

/// Split a CamelCase identifier into words: `ValueError` -> `Value Error`.
pub fn make_space(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let after_lower = chars[i - 1].is_ascii_lowercase();
            let before_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if after_lower || before_lower {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Render points without a trailing `.0` for whole numbers.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 && points.abs() < i64::MAX as f64 {
        format!("{}", points as i64)
    } else {
        format!("{points}")
    }
}

/// One-line result label for a submission.
///
/// Structured notes carrying an `error` object produce the error type;
/// otherwise the points (or `N/A`) are shown, followed by any error name
/// guessed from the raw notes.
pub fn summary(points: Option<f64>, notes: Option<&str>) -> String {
    let guessed = notes.and_then(guess_error);
    let data = notes
        .and_then(|n| serde_json::from_str::<Value>(n).ok())
        .unwrap_or(Value::Null);

    if let Some(error) = data.get("error") {
        let kind = error
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or(guessed)
            .unwrap_or_else(|| "Error".into());
        return make_space(&kind);
    }

    let shown = points.map_or_else(|| "N/A".to_string(), format_points);
    match guessed {
        Some(name) => format!("{shown} ({})", make_space(&name)),
        None => shown,
    }
}
