//! Output filename sanitization.
//!
//! Caller-supplied names end up in response headers and on disk, so they are
//! reduced to `[A-Za-z0-9._-]` and always carry the `.pdf` extension.

use std::fmt;

pub const DEFAULT_BASENAME: &str = "document";
pub const PDF_EXTENSION: &str = ".pdf";

/// A filename that is safe to use in `Content-Disposition` and as a path component.
///
/// The extension check ignores ASCII case: `THESIS.PDF` is kept as is rather
/// than becoming `THESIS.PDF.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputFilename(String);

impl OutputFilename {
    pub fn sanitize(hint: Option<&str>) -> Self {
        let mut name: String = hint
            .unwrap_or_default()
            .trim()
            .chars()
            .map(|ch| if is_allowed(ch) { ch } else { '_' })
            .collect();

        if name.is_empty() {
            name.push_str(DEFAULT_BASENAME);
        }
        if !name.to_ascii_lowercase().ends_with(PDF_EXTENSION) {
            name.push_str(PDF_EXTENSION);
        }

        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OutputFilename {
    fn default() -> Self {
        Self::sanitize(None)
    }
}

impl fmt::Display for OutputFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(hint: &str) -> String {
        OutputFilename::sanitize(Some(hint)).as_str().to_string()
    }

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize("My Report!.pdf"), "My_Report_.pdf");
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd.pdf");
        assert_eq!(sanitize("résumé"), "r_sum_.pdf");
    }

    #[test]
    fn falls_back_to_default_name() {
        assert_eq!(OutputFilename::sanitize(None).as_str(), "document.pdf");
        assert_eq!(sanitize(""), "document.pdf");
        assert_eq!(sanitize(" \t\n "), "document.pdf");
    }

    #[test]
    fn trims_surrounding_whitespace_only() {
        assert_eq!(sanitize("  notes v2  "), "notes_v2.pdf");
    }

    #[test]
    fn keeps_existing_extension() {
        assert_eq!(sanitize("thesis.pdf"), "thesis.pdf");
        assert_eq!(sanitize("THESIS.PDF"), "THESIS.PDF");
        assert_eq!(sanitize("archive.tar"), "archive.tar.pdf");
    }

    #[test]
    fn output_uses_only_the_safe_alphabet() {
        for hint in ["a/b\\c", "quote\"name", "semi;colon", "emoji 📄", "tab\tname"] {
            let name = sanitize(hint);
            assert!(name.chars().all(is_allowed), "{hint:?} -> {name:?}");
            assert!(name.ends_with(PDF_EXTENSION), "{hint:?} -> {name:?}");
        }
    }
}
