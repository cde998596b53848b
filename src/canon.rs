use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::schema::Difficulty;
use crate::textnorm::normalize_text;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionType {
    Tf,
    Mcq,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Tf => "tf",
            QuestionType::Mcq => "mcq",
        }
    }
}

/// Map loose type spellings onto tf/mcq. Generators emit a surprising
/// variety here (underscores, slashes, spaced words).
pub fn canon_type(raw: &str) -> Option<QuestionType> {
    match normalize_text(raw).to_lowercase().as_str() {
        "mcq" | "multiple_choice" | "multiple choice" => Some(QuestionType::Mcq),
        "tf" | "truefalse" | "true_false" | "true/false" | "true-false" => Some(QuestionType::Tf),
        _ => None,
    }
}

/// Map loose difficulty spellings (including severity synonyms and Arabic
/// labels) onto the four tiers.
pub fn canon_difficulty(raw: &str) -> Option<Difficulty> {
    match normalize_text(raw).to_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        "extreme" => Some(Difficulty::Extreme),
        "very_hard" | "very hard" | "veryhard" | "vhard" | "very-hard" => Some(Difficulty::Extreme),
        "سهل" | "سهله" => Some(Difficulty::Easy),
        "متوسط" | "متوسطه" => Some(Difficulty::Medium),
        "صعب" => Some(Difficulty::Hard),
        "صعب جدا" | "صعب جداً" | "صعب جداَ" | "صعب جدًا" => Some(Difficulty::Extreme),
        _ => None,
    }
}

// Synonym table onto the canonical category labels. Keys are lower-case;
// lookup retries with underscores folded to spaces.
static CATEGORY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("general_culture", "الثقافة العامة"),
        ("general culture", "الثقافة العامة"),
        ("ثقافة عامة", "الثقافة العامة"),
        ("الثقافة العامة", "الثقافة العامة"),
        ("جغرافيا", "الجغرافيا"),
        ("الجغرافيا", "الجغرافيا"),
        ("السيرة النبوية", "السيرة"),
        ("السيرة", "السيرة"),
        ("إسلامية", "معلومات إسلامية"),
        ("اسلامية", "معلومات إسلامية"),
        ("معلومات إسلامية", "معلومات إسلامية"),
        ("التفسير", "القرآن الكريم"),
        ("الحديث", "الحديث الشريف"),
        ("التاريخ", "التاريخ الإسلامي"),
        ("علوم", "العلوم"),
        ("العلوم", "العلوم"),
        ("رياضيات", "الرياضيات"),
        ("الرياضيات", "الرياضيات"),
    ])
});

/// Canonicalize a category label via the synonym table. An unmapped label
/// passes through as its normalized self: the corpus intentionally accepts
/// categories outside the fixed list rather than over-filtering.
pub fn canon_category(raw: &str) -> String {
    let c = normalize_text(raw);
    let k1 = c.to_lowercase();
    let k2 = k1.replace('_', " ");
    CATEGORY_MAP
        .get(k1.as_str())
        .or_else(|| CATEGORY_MAP.get(k2.as_str()))
        .map(|s| s.to_string())
        .unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_synonyms() {
        assert_eq!(canon_type("MCQ"), Some(QuestionType::Mcq));
        assert_eq!(canon_type(" multiple_choice "), Some(QuestionType::Mcq));
        assert_eq!(canon_type("True/False"), Some(QuestionType::Tf));
        assert_eq!(canon_type("true-false"), Some(QuestionType::Tf));
        assert_eq!(canon_type("essay"), None);
        assert_eq!(canon_type(""), None);
    }

    #[test]
    fn difficulty_synonyms_and_arabic() {
        assert_eq!(canon_difficulty("hard"), Some(Difficulty::Hard));
        assert_eq!(canon_difficulty("Very Hard"), Some(Difficulty::Extreme));
        assert_eq!(canon_difficulty("سهل"), Some(Difficulty::Easy));
        assert_eq!(canon_difficulty("صعب جدًا"), Some(Difficulty::Extreme));
        assert_eq!(canon_difficulty("impossible"), None);
    }

    #[test]
    fn category_table_and_fallthrough() {
        assert_eq!(canon_category("General_Culture"), "الثقافة العامة");
        assert_eq!(canon_category("جغرافيا"), "الجغرافيا");
        assert_eq!(canon_category("التفسير"), "القرآن الكريم");
        // Unknown labels survive normalized instead of being rejected.
        assert_eq!(canon_category("  الفلك   الحديث "), "الفلك الحديث");
    }
}
