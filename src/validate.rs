use std::collections::HashSet;

use serde_json::Value;

use crate::canon::{canon_category, canon_difficulty, canon_type, QuestionType};
use crate::schema::{McqQuestion, Question, TfQuestion};
use crate::textnorm::{has_arabic, normalize_text};

/// Terminal rejection reason for one candidate. Reasons are counted and
/// reported per batch; a rejected candidate is dropped, never patched up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reject {
    NotObject,
    BadType,
    MissingQuestionAr,
    MissingCategory,
    BadDifficulty,
    BadOptionsAr,
    BadCorrectIndex,
    BadCorrectBoolean,
    NoArabicText,
}

impl Reject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reject::NotObject => "not_object",
            Reject::BadType => "bad_type",
            Reject::MissingQuestionAr => "missing_question_ar",
            Reject::MissingCategory => "missing_category",
            Reject::BadDifficulty => "bad_difficulty",
            Reject::BadOptionsAr => "bad_options_ar",
            Reject::BadCorrectIndex => "bad_correct_index",
            Reject::BadCorrectBoolean => "bad_correct_boolean",
            Reject::NoArabicText => "no_arabic_text",
        }
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(normalize_text)
}

/// Validate one raw candidate object and produce the canonical question.
///
/// Canonicalization order: text normalization, then type, difficulty and
/// category mapping, then shape checks. `id` on incoming candidates is
/// ignored; identifiers exist only in the persisted corpus.
pub fn validate_question(raw: &Value) -> Result<Question, Reject> {
    if !raw.is_object() {
        return Err(Reject::NotObject);
    }

    let qtype = str_field(raw, "type")
        .as_deref()
        .and_then(canon_type)
        .ok_or(Reject::BadType)?;

    let question_ar = str_field(raw, "question_ar")
        .filter(|s| !s.is_empty())
        .ok_or(Reject::MissingQuestionAr)?;

    let category = str_field(raw, "category")
        .filter(|s| !s.is_empty())
        .map(|s| canon_category(&s))
        .ok_or(Reject::MissingCategory)?;

    let difficulty = str_field(raw, "difficulty")
        .as_deref()
        .and_then(canon_difficulty)
        .ok_or(Reject::BadDifficulty)?;

    if !has_arabic(&question_ar) {
        return Err(Reject::NoArabicText);
    }

    let source_ar = str_field(raw, "source_ar").filter(|s| !s.is_empty());

    match qtype {
        QuestionType::Tf => {
            let correct_boolean = raw
                .get("correctBoolean")
                .and_then(Value::as_bool)
                .ok_or(Reject::BadCorrectBoolean)?;
            Ok(Question::Tf(TfQuestion {
                category,
                difficulty,
                question_ar,
                correct_boolean,
                source_ar,
                id: None,
            }))
        }
        QuestionType::Mcq => {
            let options = raw
                .get("options_ar")
                .and_then(Value::as_array)
                .ok_or(Reject::BadOptionsAr)?;
            if options.len() != 4 {
                return Err(Reject::BadOptionsAr);
            }
            let mut options_ar: Vec<String> = Vec::with_capacity(4);
            for opt in options {
                let o = opt.as_str().map(normalize_text).ok_or(Reject::BadOptionsAr)?;
                if o.is_empty() {
                    return Err(Reject::BadOptionsAr);
                }
                options_ar.push(o);
            }
            let distinct: HashSet<String> =
                options_ar.iter().map(|o| o.to_lowercase()).collect();
            if distinct.len() != options_ar.len() {
                return Err(Reject::BadOptionsAr);
            }
            let correct_index = raw
                .get("correctIndex")
                .and_then(Value::as_i64)
                .ok_or(Reject::BadCorrectIndex)?;
            if !(0..=3).contains(&correct_index) {
                return Err(Reject::BadCorrectIndex);
            }
            Ok(Question::Mcq(McqQuestion {
                category,
                difficulty,
                question_ar,
                options_ar,
                correct_index: correct_index as u8,
                source_ar,
                id: None,
            }))
        }
    }
}

/// Generation-path validation: everything `validate_question` enforces,
/// plus an Arabic-letter requirement on every mcq option. The merge tool
/// keeps the base rules only; externally supplied corpora may carry options
/// like bare years or formula names.
pub fn validate_generated(raw: &Value) -> Result<Question, Reject> {
    let q = validate_question(raw)?;
    if let Question::Mcq(mcq) = &q {
        if !mcq.options_ar.iter().all(|o| has_arabic(o)) {
            return Err(Reject::NoArabicText);
        }
    }
    Ok(q)
}
