use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::Value;

use crate::config::RunConfig;
use crate::dedup::{DedupIndex, Seen};
use crate::extract::{extract_array_span, parse_candidates};
use crate::progress::ConsoleProgress;
use crate::prompt::build_prompt;
use crate::provider::{generate_with_fallback, GenBackend};
use crate::schema::Question;
use crate::store::{try_load_corpus, write_pretty};
use crate::validate::{validate_generated, validate_question};

/// Summary of one generation run, for the caller and for tests.
#[derive(Debug)]
pub struct RunReport {
    pub corpus_size: usize,
    pub added: usize,
    pub batches_accepted: u32,
}

/// Batch generation loop. Drives the backends through the orchestrator,
/// validates and dedups every batch, and rewrites the checkpoint file after
/// each accepted batch so an interrupted run loses at most one batch.
pub struct GenPipeline {
    cfg: RunConfig,
    backends: Vec<Box<dyn GenBackend>>,
    progress: ConsoleProgress,
    sleep: Box<dyn Fn(Duration)>,
}

impl GenPipeline {
    pub fn new(cfg: RunConfig, backends: Vec<Box<dyn GenBackend>>, progress: ConsoleProgress) -> Self {
        Self {
            cfg,
            backends,
            progress,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the sleeping primitive. Tests inject a recorder here so that
    /// cooldown and pacing decisions are observable without real waits.
    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn run(&mut self) -> anyhow::Result<RunReport> {
        anyhow::ensure!(!self.backends.is_empty(), "لا يوجد مزود مهيأ بمفتاح API");

        // Raw entries: the checkpoint may hold hand-edited or legacy items
        // that no longer validate, and those must survive the run too.
        let mut corpus: Vec<Value> = try_load_corpus(&self.cfg.out_file).unwrap_or_default();
        let mut index = DedupIndex::new();
        let prior_valid: Vec<Question> = corpus
            .iter()
            .filter_map(|v| validate_question(v).ok())
            .collect();
        index.seed_corpus(&prior_valid);

        let mut tf_count = corpus.iter().filter(|v| v["type"] == "tf").count();
        let mut mcq_count = corpus.iter().filter(|v| v["type"] == "mcq").count();

        self.progress.log(
            "START",
            format!("الهدف: {} سؤال، حجم الدفعة: {}", self.cfg.total, self.cfg.batch),
        );
        self.progress.log(
            "CFG",
            format!(
                "المزودون: {} | الملف: {}",
                self.backends
                    .iter()
                    .map(|b| b.name())
                    .collect::<Vec<_>>()
                    .join(" → "),
                self.cfg.out_file.display()
            ),
        );
        if !corpus.is_empty() {
            self.progress.log(
                "RESUME",
                format!(
                    "استئناف: {} سؤال محمّل من {}",
                    corpus.len(),
                    self.cfg.out_file.display()
                ),
            );
        }

        let mut consecutive_fails: u32 = 0;
        let mut batch_no: u32 = 0;
        let mut batches_accepted: u32 = 0;
        let mut added_total: usize = 0;

        while corpus.len() < self.cfg.total {
            batch_no += 1;
            let ask = self.cfg.batch.min(self.cfg.total - corpus.len());
            self.progress.rule("BATCH");
            self.progress.log(
                "BATCH",
                format!(
                    "دفعة {batch_no}: طلب {ask} سؤال (المجموع الحالي {}/{})",
                    corpus.len(),
                    self.cfg.total
                ),
            );

            let prompt = build_prompt(ask, tf_count, mcq_count);
            let t0 = Instant::now();
            let raw = match generate_with_fallback(&self.backends, &prompt, &self.progress) {
                Ok(raw) => raw,
                Err(err) => {
                    // All-backends rate limit gets a cooldown and does not
                    // burn the failure budget. A cooldown of 0 disables this
                    // path entirely.
                    if err.is_rate_limited() && !self.cfg.retry_after_429.is_zero() {
                        self.progress.log(
                            "RETRY",
                            format!(
                                "حد الحصة لدى جميع المزودين — انتظار {} ثانية...",
                                self.cfg.retry_after_429.as_secs()
                            ),
                        );
                        (self.sleep)(self.cfg.retry_after_429);
                        continue;
                    }
                    consecutive_fails += 1;
                    self.progress.log(
                        "ERROR",
                        format!(
                            "فشل توليد الدفعة ({consecutive_fails}/{}): {err}",
                            self.cfg.max_consecutive_fails
                        ),
                    );
                    if consecutive_fails >= self.cfg.max_consecutive_fails {
                        anyhow::bail!(
                            "توقف: {consecutive_fails} إخفاقات متتالية، آخر خطأ: {err}"
                        );
                    }
                    continue;
                }
            };
            self.progress.log(
                "API",
                format!(
                    "استجابة خلال {:.1}ث ({} حرف)",
                    t0.elapsed().as_secs_f64(),
                    raw.chars().count()
                ),
            );

            // A mangled response costs this iteration only, never the
            // failure budget.
            let candidates = match extract_array_span(&raw).and_then(parse_candidates) {
                Ok(items) => items,
                Err(err) => {
                    self.progress
                        .log("ERROR", format!("فشل استخراج JSON: {err}"));
                    continue;
                }
            };
            self.progress
                .log("PARSE", format!("{} عنصر مرشح", candidates.len()));

            index.begin_batch();
            let mut accepted: Vec<Question> = Vec::new();
            let mut rejects: HashMap<&'static str, usize> = HashMap::new();
            let mut batch_dups = 0usize;
            let mut corpus_dups = 0usize;
            for candidate in &candidates {
                match validate_generated(candidate) {
                    Ok(q) => match index.insert(&q) {
                        Seen::Fresh => accepted.push(q),
                        Seen::BatchDuplicate => batch_dups += 1,
                        Seen::CorpusDuplicate => corpus_dups += 1,
                    },
                    Err(reason) => {
                        *rejects.entry(reason.as_str()).or_insert(0) += 1;
                    }
                }
            }

            self.progress.log(
                "VALIDATE",
                format!(
                    "صالح {}/{}{}",
                    accepted.len() + batch_dups + corpus_dups,
                    candidates.len(),
                    reject_summary(&rejects)
                ),
            );
            self.progress.log(
                "DEDUPE",
                format!("مكرر: داخل الدفعة {batch_dups} | سابق {corpus_dups}"),
            );

            if accepted.is_empty() {
                self.progress
                    .log("RETRY", "لا جديد في هذه الدفعة — إعادة المحاولة...");
                continue;
            }

            consecutive_fails = 0;
            batches_accepted += 1;
            added_total += accepted.len();
            let new_tf = accepted.iter().filter(|q| q.type_str() == "tf").count();
            tf_count += new_tf;
            mcq_count += accepted.len() - new_tf;
            self.progress.log(
                "ADDED",
                format!(
                    "+{} (tf {} | mcq {}) — {}",
                    accepted.len(),
                    new_tf,
                    accepted.len() - new_tf,
                    difficulty_histogram(accepted.iter().map(|q| q.difficulty().as_str()))
                ),
            );

            for q in accepted {
                corpus.push(serde_json::to_value(q).context("serialize question")?);
            }
            write_pretty(&self.cfg.out_file, &corpus, false)
                .with_context(|| format!("حفظ {}", self.cfg.out_file.display()))?;
            self.progress.log(
                "SAVE",
                format!(
                    "حُفظ {} سؤال → {} ({})",
                    corpus.len(),
                    self.cfg.out_file.display(),
                    difficulty_histogram(corpus.iter().filter_map(|v| v["difficulty"].as_str()))
                ),
            );

            if corpus.len() < self.cfg.total && !self.cfg.delay_between_batches.is_zero() {
                self.progress.log(
                    "WAIT",
                    format!(
                        "انتظار {} ث قبل الدفعة التالية...",
                        self.cfg.delay_between_batches.as_secs_f64()
                    ),
                );
                (self.sleep)(self.cfg.delay_between_batches);
            }
        }

        self.progress.rule("DONE");
        self.progress.log(
            "DONE",
            format!("اكتمل: {} سؤال في {}", corpus.len(), self.cfg.out_file.display()),
        );
        self.progress.log(
            "NEXT",
            format!(
                "للدمج: qbank --merge {} --apply",
                self.cfg.out_file.display()
            ),
        );
        Ok(RunReport {
            corpus_size: corpus.len(),
            added: added_total,
            batches_accepted,
        })
    }
}

fn reject_summary(rejects: &HashMap<&'static str, usize>) -> String {
    if rejects.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<_> = rejects.iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    let body = pairs
        .iter()
        .map(|(reason, n)| format!("{reason}({n})"))
        .collect::<Vec<_>>()
        .join("، ");
    format!("؛ مرفوض: {body}")
}

fn difficulty_histogram<'a>(difficulties: impl Iterator<Item = &'a str>) -> String {
    let mut counts = [0usize; 4];
    for d in difficulties {
        match d {
            "easy" => counts[0] += 1,
            "medium" => counts[1] += 1,
            "hard" => counts[2] += 1,
            "extreme" => counts[3] += 1,
            _ => {}
        }
    }
    format!(
        "easy {} | medium {} | hard {} | extreme {}",
        counts[0], counts[1], counts[2], counts[3]
    )
}
