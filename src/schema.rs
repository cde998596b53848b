use serde::{Deserialize, Serialize};

/// The sixteen canonical category labels used across the question bank.
/// Free-text categories outside this list are tolerated (see `canon`), but
/// generation prompts only ever ask for these.
pub const CATEGORIES: [&str; 16] = [
    "القرآن الكريم",
    "السيرة",
    "الفقه",
    "الحديث الشريف",
    "الصحابة",
    "العقيدة",
    "التاريخ الإسلامي",
    "الثقافة العامة",
    "الجغرافيا",
    "اللغة العربية",
    "العلوم",
    "الرياضيات",
    "معلومات إسلامية",
    "الأحياء",
    "علوم الفضاء",
    "من القائل",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "easy")]
    Easy,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "hard")]
    Hard,
    #[serde(rename = "extreme")]
    Extreme,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }
}

/// One validated question. The `type` tag on the wire selects the payload,
/// so a tf question can never carry options and an mcq can never carry a
/// boolean answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Question {
    #[serde(rename = "tf")]
    Tf(TfQuestion),
    #[serde(rename = "mcq")]
    Mcq(McqQuestion),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TfQuestion {
    pub category: String,
    pub difficulty: Difficulty,
    pub question_ar: String,
    #[serde(rename = "correctBoolean")]
    pub correct_boolean: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ar: Option<String>,
    /// Dense 1-based position in the corpus. Assigned only when a merge is
    /// applied; recomputed on every apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub category: String,
    pub difficulty: Difficulty,
    pub question_ar: String,
    pub options_ar: Vec<String>,
    #[serde(rename = "correctIndex")]
    pub correct_index: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl Question {
    pub fn type_str(&self) -> &'static str {
        match self {
            Question::Tf(_) => "tf",
            Question::Mcq(_) => "mcq",
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Question::Tf(q) => &q.category,
            Question::Mcq(q) => &q.category,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        match self {
            Question::Tf(q) => q.difficulty,
            Question::Mcq(q) => q.difficulty,
        }
    }

    pub fn question_ar(&self) -> &str {
        match self {
            Question::Tf(q) => &q.question_ar,
            Question::Mcq(q) => &q.question_ar,
        }
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            Question::Tf(q) => q.id,
            Question::Mcq(q) => q.id,
        }
    }
}
