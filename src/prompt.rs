use crate::schema::CATEGORIES;

/// Difficulty targets for one batch: heavily skewed toward the two hardest
/// tiers. Pure function of the batch size.
pub fn difficulty_targets(batch_size: usize) -> (usize, usize, usize, usize) {
    let easy = ((batch_size as f64) * 0.02).round() as usize;
    let medium = ((batch_size as f64) * 0.08).round() as usize;
    let hard = (((batch_size as f64) * 0.40).round() as usize).max(4);
    let spent = easy + medium + hard;
    // The extreme share absorbs the remainder but never drops below 5, even
    // for tiny batches; the prompt may over-ask, the validator does not care.
    let extreme = batch_size.saturating_sub(spent).max(5);
    (easy, medium, hard, extreme)
}

/// tf/mcq split for one batch: push toward whichever type is currently
/// under-represented in the accumulated corpus.
pub fn type_targets(batch_size: usize, tf_count: usize, mcq_count: usize) -> (usize, usize) {
    let want_tf = tf_count < mcq_count;
    let target_tf = if want_tf {
        ((batch_size as f64) * 0.55).ceil() as usize
    } else {
        ((batch_size as f64) * 0.45).floor() as usize
    };
    (target_tf, batch_size - target_tf)
}

/// Build the generation prompt for one batch. The prompt itself is not
/// safety-critical; the resulting corpus distribution is, so the targets it
/// embeds come from the two pure functions above.
pub fn build_prompt(batch_size: usize, tf_count: usize, mcq_count: usize) -> String {
    let (target_tf, target_mcq) = type_targets(batch_size, tf_count, mcq_count);
    let (easy_n, med_n, hard_n, ext_n) = difficulty_targets(batch_size);
    let categories = CATEGORIES.join("، ");

    format!(
        r#"أنت خبير مسابقات "مرتفعة الصعوبة جداً" باللغة العربية. المطلوب: إنشاء {batch_size} سؤال صعبة جداً بصيغة JSON فقط.

# قيود صارمة
- أخرج JSON فقط (مصفوفة تبدأ بـ [ وتنتهي بـ ]) بدون أي نص إضافي.
- لا تضف id إطلاقًا.
- اللغة عربية فقط.
- التصنيفات: {categories}
- ممنوع التكرار. ممنوع أسئلة سطحية أو بديهية.
- الخيارات في MCQ مضللة جداً وقريبة من الصواب.

# الصعوبة (أولوية قصوى — رفع المستوى الفعلي لكل فئة)
- easy: المستوى الفعلي = صعب. لا يقدر عليها إلا من قرأ في التخصص.
- medium: المستوى الفعلي = أصعب من المتوسط. يتطلب حفظ تفاصيل من مراجع أو تمييز مصطلحات متشابهة.
- hard: المستوى الفعلي = صعب جداً. مستوى طالب ماجستير أو متخصص. أرقام/تواريخ/فروق دقيقة من كتب متخصصة.
- extreme: المستوى الفعلي = مستحيل على غير المتخصص. الإجابة لا تُعرف إلا بحفظ دقيق أو مراجعة نادرة.

# ممنوع منعاً باتاً (أي مستوى)
- أسئلة تعتمد على حقائق عامة أو أرقام تقريبية.
- أسئلة يمكن الإجابة عنها دون دراسة مسبقة في نفس المجال.

# التوزيع المطلوب داخل هذه الدفعة
- عدد tf تقريبًا: {target_tf}
- عدد mcq تقريبًا: {target_mcq}
- توزيع الصعوبة: easy: {easy_n} | medium: {med_n} | hard: {hard_n} | extreme: {ext_n}

# شكل كل عنصر:
tf:
{{"type":"tf","category":"...","difficulty":"...","question_ar":"...","correctBoolean":true}}

mcq:
{{"type":"mcq","category":"...","difficulty":"...","question_ar":"...","options_ar":["...","...","...","..."],"correctIndex":2}}

اطبع المصفوفة كاملة الآن."#
    )
}
