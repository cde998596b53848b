use std::collections::HashSet;

use crate::schema::Question;
use crate::textnorm::{normalize_text, strip_punct_lower};

/// Identity signature for generation-time dedup: type, category, difficulty
/// and the punctuation-stripped lowercased question stem. Option text and
/// correctness fields are excluded on purpose, so the same stem with
/// reshuffled answers still collides. Paraphrases do not collide; this is
/// text-shape dedup, not semantic dedup.
pub fn signature(q: &Question) -> String {
    format!(
        "{}::{}::{}::{}",
        q.type_str(),
        q.category(),
        q.difficulty().as_str(),
        strip_punct_lower(q.question_ar())
    )
}

/// Legacy merge key: type + normalized lowercased question text only. The
/// merge/normalize tools have always keyed on this narrower form, and the
/// shipped corpus was deduplicated under it.
pub fn merge_key(q: &Question) -> String {
    format!(
        "{}|{}",
        q.type_str(),
        normalize_text(q.question_ar()).to_lowercase()
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seen {
    Fresh,
    BatchDuplicate,
    CorpusDuplicate,
}

/// Two concurrent dedup scopes: the accumulated corpus (seeded once per
/// run) and the current batch (cleared per iteration).
#[derive(Default)]
pub struct DedupIndex {
    corpus: HashSet<String>,
    batch: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_corpus(&mut self, questions: &[Question]) {
        for q in questions {
            self.corpus.insert(signature(q));
        }
    }

    pub fn begin_batch(&mut self) {
        self.batch.clear();
    }

    /// Record one candidate. A fresh signature lands in both scopes, so
    /// later batches in the same run see it as a corpus duplicate.
    pub fn insert(&mut self, q: &Question) -> Seen {
        let sig = signature(q);
        if self.batch.contains(&sig) {
            return Seen::BatchDuplicate;
        }
        if self.corpus.contains(&sig) {
            return Seen::CorpusDuplicate;
        }
        self.batch.insert(sig.clone());
        self.corpus.insert(sig);
        Seen::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Difficulty, McqQuestion, Question, TfQuestion};

    fn tf(question: &str, category: &str, difficulty: Difficulty) -> Question {
        Question::Tf(TfQuestion {
            category: category.to_string(),
            difficulty,
            question_ar: question.to_string(),
            correct_boolean: true,
            source_ar: None,
            id: None,
        })
    }

    #[test]
    fn signature_ignores_punctuation_but_not_category() {
        let a = tf("هل السماء زرقاء؟", "العلوم", Difficulty::Easy);
        let b = tf("هل السماء زرقاء", "العلوم", Difficulty::Easy);
        let c = tf("هل السماء زرقاء؟", "الجغرافيا", Difficulty::Easy);
        assert_eq!(signature(&a), signature(&b));
        assert_ne!(signature(&a), signature(&c));
    }

    #[test]
    fn signature_ignores_answer_formatting() {
        let mk = |opts: [&str; 4], idx: u8| {
            Question::Mcq(McqQuestion {
                category: "العلوم".to_string(),
                difficulty: Difficulty::Hard,
                question_ar: "ما أثقل عنصر طبيعي؟".to_string(),
                options_ar: opts.iter().map(|s| s.to_string()).collect(),
                correct_index: idx,
                source_ar: None,
                id: None,
            })
        };
        let a = mk(["أ", "ب", "ج", "د"], 0);
        let b = mk(["د", "ج", "ب", "أ"], 3);
        assert_eq!(signature(&a), signature(&b));
    }

    #[test]
    fn paraphrases_are_not_caught() {
        // Stated limitation: semantically equal stems with different wording
        // stay distinct.
        let a = tf("هل الشمس نجم؟", "العلوم", Difficulty::Easy);
        let b = tf("هل تعد الشمس نجماً؟", "العلوم", Difficulty::Easy);
        assert_ne!(signature(&a), signature(&b));
    }

    #[test]
    fn scopes_report_batch_and_corpus_duplicates() {
        let seeded = tf("هل؟ سؤال قديم", "الفقه", Difficulty::Medium);
        let mut index = DedupIndex::new();
        index.seed_corpus(std::slice::from_ref(&seeded));

        index.begin_batch();
        let fresh = tf("هل؟ سؤال جديد", "الفقه", Difficulty::Medium);
        assert_eq!(index.insert(&seeded), Seen::CorpusDuplicate);
        assert_eq!(index.insert(&fresh), Seen::Fresh);
        assert_eq!(index.insert(&fresh), Seen::BatchDuplicate);

        // Accepted items from an earlier batch count as corpus duplicates in
        // the next one.
        index.begin_batch();
        assert_eq!(index.insert(&fresh), Seen::CorpusDuplicate);
    }
}
