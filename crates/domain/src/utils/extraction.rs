//! Field extraction out of the upstream portal's free-text event payload.
//!
//! The portal does not expose discipline code, instructor, class group, or
//! location as structured fields — they are embedded in `title`,
//! `hoverInfo`, and `descricao` strings and must be pulled out with simple
//! delimiter splits.

use crate::constants::UNKNOWN_LOCATION;

/// Split `text` on `delimiter` and return the trimmed, non-empty part at
/// `position`.
pub fn extract_by_delimiter(text: &str, delimiter: &str, position: usize) -> Option<String> {
    text.split(delimiter)
        .nth(position)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Like `extract_by_delimiter`, but the extracted part must also satisfy
/// `filter` or the result is discarded.
pub fn extract_with_filter<F>(text: &str, delimiter: &str, position: usize, filter: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    extract_by_delimiter(text, delimiter, position).filter(|s| filter(s))
}

/// Discipline code: the second line of `title` when it contains a newline;
/// otherwise `None`.
#[must_use]
pub fn discipline_code_from_title(title: &str) -> Option<String> {
    extract_by_delimiter(title, "\n", 1)
}

/// Instructor: the substring after `"Docente: "` in `hover_info`; otherwise
/// `None`.
#[must_use]
pub fn instructor_from_hover_info(hover_info: &str) -> Option<String> {
    extract_by_delimiter(hover_info, "Docente: ", 1)
}

/// Class group: the substring after `"Turma: "` in `descricao`, up to the
/// next `" |"` delimiter; otherwise `None`.
#[must_use]
pub fn class_group_from_descricao(descricao: &str) -> Option<String> {
    let after = extract_by_delimiter(descricao, "Turma: ", 1)?;
    extract_by_delimiter(&after, " |", 0)
}

/// Location: the substring after `"Dependencia: "` in `descricao`; otherwise
/// the literal `"NÃO INFORMADA"`.
#[must_use]
pub fn location_from_descricao(descricao: &str) -> String {
    extract_by_delimiter(descricao, "Dependencia: ", 1).unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}
