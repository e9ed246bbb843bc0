// Output formatting — terminal display for dataset commands.

pub mod terminal;

/// Shorten `text` to fit a table column of `width` characters.
///
/// Counts characters, not bytes, so accented speaker names and topic labels
/// are cut cleanly. A cut value ends in a single `…`.
pub fn fit_column(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_column_short_text_unchanged() {
        assert_eq!(fit_column("Labor", 12), "Labor");
    }

    #[test]
    fn test_fit_column_cuts_to_width() {
        let out = fit_column("Financial Stability", 12);
        assert_eq!(out.chars().count(), 12);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_fit_column_multibyte() {
        assert_eq!(fit_column("Évolution des taux", 4), "Évo…");
        assert_eq!(fit_column("abc", 0), "");
    }
}
