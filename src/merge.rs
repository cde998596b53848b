use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use crate::canon::{canon_category, canon_difficulty, canon_type};
use crate::dedup::merge_key;
use crate::progress::ConsoleProgress;
use crate::schema::Question;
use crate::store::{read_raw_collection, write_pretty};
use crate::validate::validate_question;

#[derive(Clone, Copy, Debug, Default)]
pub struct MergeOptions {
    pub apply: bool,
    /// Truncate each add-file to an empty array after a successful apply.
    pub clear_after: bool,
}

#[derive(Debug, Default)]
pub struct MergeReport {
    pub main_total: usize,
    pub main_invalid: usize,
    pub add_total: usize,
    pub add_valid: usize,
    pub add_invalid: usize,
    pub add_duplicates: usize,
    pub add_added: usize,
    pub invalid_reasons: Vec<(&'static str, usize)>,
    pub merged_size: usize,
    pub applied: bool,
}

/// Merge one or more add-files into the main corpus.
///
/// Dry-run (the default) only reports. Apply refuses to write anything while
/// a single incoming item is invalid; on success the whole merged corpus is
/// renumbered 1..=N and rewritten. Invalid entries already in the main file
/// are kept as-is (and renumbered too), only warned about.
pub fn merge(
    main_file: &Path,
    add_files: &[PathBuf],
    opts: MergeOptions,
    progress: &ConsoleProgress,
) -> anyhow::Result<MergeReport> {
    anyhow::ensure!(!add_files.is_empty(), "لا يوجد ملف إضافة للدمج");
    let mut main_items = read_raw_collection(main_file)
        .with_context(|| format!("الملف الرئيسي: {}", main_file.display()))?;

    let mut report = MergeReport {
        main_total: main_items.len(),
        ..Default::default()
    };

    // Seed dedup with the valid part of the main corpus. Invalid main
    // entries cannot produce a key; they are counted and kept.
    let mut seen: HashSet<String> = HashSet::new();
    for item in &main_items {
        match validate_question(item) {
            Ok(q) => {
                seen.insert(merge_key(&q));
            }
            Err(_) => report.main_invalid += 1,
        }
    }
    progress.log(
        "MERGE",
        format!(
            "الملف الرئيسي: {} عنصر ({} غير صالح)",
            report.main_total, report.main_invalid
        ),
    );

    let mut reasons: HashMap<&'static str, usize> = HashMap::new();
    let mut incoming: Vec<Question> = Vec::new();
    for path in add_files {
        let items = read_raw_collection(path)
            .with_context(|| format!("ملف الإضافة: {}", path.display()))?;
        let mut file_added = 0usize;
        let mut file_dups = 0usize;
        let mut file_invalid = 0usize;
        for item in &items {
            report.add_total += 1;
            match validate_question(item) {
                Ok(q) => {
                    report.add_valid += 1;
                    if seen.insert(merge_key(&q)) {
                        file_added += 1;
                        incoming.push(q);
                    } else {
                        file_dups += 1;
                    }
                }
                Err(reason) => {
                    file_invalid += 1;
                    *reasons.entry(reason.as_str()).or_insert(0) += 1;
                }
            }
        }
        report.add_duplicates += file_dups;
        report.add_invalid += file_invalid;
        report.add_added += file_added;
        progress.log(
            "MERGE",
            format!(
                "{}: {} عنصر — جديد {file_added} | مكرر {file_dups} | غير صالح {file_invalid}",
                path.display(),
                items.len()
            ),
        );
    }

    report.invalid_reasons = sorted_reasons(&reasons);
    report.merged_size = report.main_total + report.add_added;
    progress.log(
        "MERGE",
        format!(
            "الحصيلة: جديد {} | مكرر {} | غير صالح {}{} — الحجم بعد الدمج: {}",
            report.add_added,
            report.add_duplicates,
            report.add_invalid,
            reasons_suffix(&report.invalid_reasons),
            report.merged_size
        ),
    );

    if !opts.apply {
        progress.log("MERGE", "وضع المعاينة — لم يُكتب شيء. أضف --apply للتطبيق.");
        return Ok(report);
    }
    if report.add_invalid > 0 {
        anyhow::bail!(
            "رفض التطبيق: {} عنصر غير صالح في ملفات الإضافة — لم يُكتب شيء",
            report.add_invalid
        );
    }

    for q in incoming {
        main_items.push(serde_json::to_value(q).context("serialize question")?);
    }
    renumber(&mut main_items);
    write_pretty(main_file, &main_items, true)
        .with_context(|| format!("كتابة {}", main_file.display()))?;
    progress.log(
        "MERGE",
        format!("كُتب {} عنصر → {}", main_items.len(), main_file.display()),
    );

    if opts.clear_after {
        for path in add_files {
            std::fs::write(path, "[]\n")
                .with_context(|| format!("تفريغ {}", path.display()))?;
            progress.log("MERGE", format!("أُفرغ {}", path.display()));
        }
    }
    report.applied = true;
    Ok(report)
}

/// Dense 1-based ids over the final order, valid and invalid entries alike.
fn renumber(items: &mut [Value]) {
    for (i, item) in items.iter_mut().enumerate() {
        if let Value::Object(map) = item {
            map.insert("id".to_string(), Value::from(i as u64 + 1));
        }
    }
}

#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub total: usize,
    pub changed_type: usize,
    pub changed_difficulty: usize,
    pub changed_category: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub applied: bool,
}

/// Re-canonicalize the main corpus in place: type and difficulty aliases are
/// folded to canonical spellings, categories mapped through the synonym
/// table. Ids are never touched. Apply refuses to write while the result
/// still contains an invalid or duplicate item.
pub fn normalize(
    main_file: &Path,
    apply: bool,
    progress: &ConsoleProgress,
) -> anyhow::Result<NormalizeReport> {
    let mut items = read_raw_collection(main_file)
        .with_context(|| format!("الملف الرئيسي: {}", main_file.display()))?;

    let mut report = NormalizeReport {
        total: items.len(),
        ..Default::default()
    };

    for item in &mut items {
        let Value::Object(map) = item else { continue };
        if let Some(old) = map.get("type").and_then(Value::as_str) {
            if let Some(t) = canon_type(old.trim()) {
                if t.as_str() != old {
                    report.changed_type += 1;
                }
                map.insert("type".to_string(), Value::from(t.as_str()));
            }
        }
        if let Some(old) = map.get("difficulty").and_then(Value::as_str) {
            if let Some(d) = canon_difficulty(old.trim()) {
                if d.as_str() != old {
                    report.changed_difficulty += 1;
                }
                map.insert("difficulty".to_string(), Value::from(d.as_str()));
            }
        }
        if let Some(old) = map.get("category").and_then(Value::as_str) {
            let mapped = canon_category(old);
            if mapped != old {
                report.changed_category += 1;
            }
            map.insert("category".to_string(), Value::from(mapped));
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    for item in &items {
        match validate_question(item) {
            Ok(q) => {
                if !seen.insert(merge_key(&q)) {
                    report.duplicates += 1;
                }
            }
            Err(_) => report.invalid += 1,
        }
    }

    progress.log(
        "NORMALIZE",
        format!(
            "{} عنصر — تغييرات: type {} | difficulty {} | category {} — غير صالح {} | مكرر {}",
            report.total,
            report.changed_type,
            report.changed_difficulty,
            report.changed_category,
            report.invalid,
            report.duplicates
        ),
    );

    if !apply {
        progress.log("NORMALIZE", "وضع المعاينة — لم يُكتب شيء. أضف --apply للتطبيق.");
        return Ok(report);
    }
    if report.invalid > 0 || report.duplicates > 0 {
        anyhow::bail!(
            "رفض الكتابة: {} غير صالح و{} مكرر بعد التطبيع — لم يُكتب شيء",
            report.invalid,
            report.duplicates
        );
    }

    write_pretty(main_file, &items, true)
        .with_context(|| format!("كتابة {}", main_file.display()))?;
    progress.log(
        "NORMALIZE",
        format!("كُتب {} عنصر → {}", items.len(), main_file.display()),
    );
    report.applied = true;
    Ok(report)
}

fn sorted_reasons(reasons: &HashMap<&'static str, usize>) -> Vec<(&'static str, usize)> {
    let mut pairs: Vec<_> = reasons.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    pairs
}

fn reasons_suffix(reasons: &[(&'static str, usize)]) -> String {
    if reasons.is_empty() {
        return String::new();
    }
    let body = reasons
        .iter()
        .map(|(reason, n)| format!("{reason}({n})"))
        .collect::<Vec<_>>()
        .join("، ");
    format!(" [{body}]")
}
