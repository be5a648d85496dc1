use super::{TaskId, TaskSummary};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TitleMatch {
    pub is_match: bool,
    pub score: f64,
}

impl TitleMatch {
    const MISS: Self = Self {
        is_match: false,
        score: 0.0,
    };

    fn hit(score: f64) -> Self {
        Self {
            is_match: true,
            score,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub id: TaskId,
    pub title: String,
    pub score: f64,
}

/// Scores a title against a free-text query. Rules are tried in order and the first that applies
/// decides the score; they are not cumulative.
pub fn match_title(text: &str, query: &str) -> TitleMatch {
    let query = query.trim().to_lowercase();
    let text = text.trim().to_lowercase();
    if query.is_empty() || text.is_empty() {
        return TitleMatch::MISS;
    }

    if query == text {
        return TitleMatch::hit(1.0);
    }

    if text.contains(&query) {
        return TitleMatch::hit(0.95);
    }

    let query_words = query.split_whitespace().collect::<Vec<_>>();
    let text_words = text.split_whitespace().collect::<Vec<_>>();

    match query_words.as_slice() {
        [word] => match_single_word(word, &text_words),
        _ => match_multi_word(&query_words, &text_words),
    }
}

/// Filters `candidates` to titles matching `query`, best first. The sort is stable, so equal
/// scores keep the input order (newest task first). A blank query keeps every candidate.
pub fn search(query: &str, candidates: &[TaskSummary]) -> Vec<MatchResult> {
    if query.trim().is_empty() {
        return candidates
            .iter()
            .map(|task| MatchResult {
                id: task.id.clone(),
                title: task.title.clone(),
                score: 0.0,
            })
            .collect();
    }

    let mut results = candidates
        .iter()
        .filter_map(|task| {
            let matched = match_title(&task.title, query);
            matched.is_match.then(|| MatchResult {
                id: task.id.clone(),
                title: task.title.clone(),
                score: matched.score,
            })
        })
        .collect::<Vec<_>>();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
}

// Whatever this accepts is also a substring of the text, which `match_title` scores first.
fn match_single_word(query: &str, text_words: &[&str]) -> TitleMatch {
    if text_words.contains(&query) {
        return TitleMatch::hit(0.9);
    }

    let query_len = char_len(query);
    if query_len >= 3 {
        if let Some(word) = text_words.iter().find(|word| word.starts_with(query)) {
            let ratio = query_len as f64 / char_len(word) as f64;
            return TitleMatch::hit(0.7 + (ratio * 0.2).min(0.2));
        }
    }

    if query_len >= 4
        && text_words
            .iter()
            .any(|word| word.contains(query) && char_len(word) > query_len)
    {
        return TitleMatch::hit(0.6);
    }

    TitleMatch::MISS
}

fn match_multi_word(query_words: &[&str], text_words: &[&str]) -> TitleMatch {
    let significant = query_words
        .iter()
        .copied()
        .filter(|word| is_significant(word))
        .collect::<Vec<_>>();
    if significant.is_empty() {
        return TitleMatch::MISS;
    }

    let mut total = 0.0;
    for query_word in &significant {
        if text_words.contains(query_word) {
            total += 1.0;
            continue;
        }
        if text_words.iter().any(|word| word.starts_with(query_word)) {
            total += 0.5;
            continue;
        }
        let query_len = char_len(query_word);
        if query_len >= 4
            && text_words
                .iter()
                .any(|word| word.contains(query_word) && char_len(word) > query_len)
        {
            total += 0.3;
        }
    }

    let score = total / significant.len() as f64;
    if score < 0.5 {
        return TitleMatch::MISS;
    }
    TitleMatch::hit(score.min(0.9))
}

fn is_significant(word: &str) -> bool {
    char_len(word) > 2
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str) -> TaskSummary {
        TaskSummary {
            id: TaskId::new(id.to_string()),
            title: title.to_string(),
            modified: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identical_titles_score_one() {
        for title in ["Deploy", "fix the login bug", "  Mixed Case  "] {
            let matched = match_title(title, title);
            assert!(matched.is_match);
            assert_close(matched.score, 1.0);
        }
        let matched = match_title("Refactor Parser", "refactor parser ");
        assert_close(matched.score, 1.0);
    }

    #[test]
    fn empty_inputs_never_match() {
        assert_eq!(match_title("", "deploy"), TitleMatch::MISS);
        assert_eq!(match_title("deploy", ""), TitleMatch::MISS);
        assert_eq!(match_title("deploy", "   "), TitleMatch::MISS);
    }

    #[test]
    fn contained_phrase_scores_095() {
        let matched = match_title("deploy the service", "deploy");
        assert!(matched.is_match);
        assert_close(matched.score, 0.95);

        let matched = match_title("Fix the login bug", "LOGIN BUG");
        assert!(matched.is_match);
        assert_close(matched.score, 0.95);
    }

    #[test]
    fn raw_substring_wins_over_word_rules() {
        for (text, query) in [
            ("fix the login bug", "login bu"),
            ("refactoring module", "factor"),
            ("refactoring module", "refact"),
            ("fix the login bug", "login"),
        ] {
            let matched = match_title(text, query);
            assert!(matched.is_match, "{query}");
            assert_close(matched.score, 0.95);
        }
    }

    #[test]
    fn single_word_ladder_scores() {
        let words = ["refactoring", "module"];
        assert_close(match_single_word("module", &words).score, 0.9);

        let matched = match_single_word("refact", &words);
        assert!(matched.is_match);
        assert!(matched.score > 0.7 && matched.score <= 0.9);
        assert_close(matched.score, 0.7 + 6.0 / 11.0 * 0.2);

        let matched = match_single_word("fact", &["unrefactored", "code"]);
        assert!(matched.is_match);
        assert_close(matched.score, 0.6);

        assert_eq!(match_single_word("act", &["unrefactored", "code"]), TitleMatch::MISS);
        assert_eq!(match_title("refactoring module", "zzz"), TitleMatch::MISS);
    }

    #[test]
    fn multi_word_half_match_is_inclusive() {
        let matched = match_title("fix the login bug", "login crash");
        assert!(matched.is_match);
        assert_close(matched.score, 0.5);
    }

    #[test]
    fn multi_word_below_threshold_is_reset() {
        assert_eq!(
            match_title("fix the login bug", "payment crash"),
            TitleMatch::MISS
        );
    }

    #[test]
    fn multi_word_partial_credit_and_cap() {
        // "auth" prefixes "authentication" (0.5), "bug" is exact (1.0): 1.5 / 2.
        let matched = match_title("fix authentication bug today", "auth bug");
        assert_close(matched.score, 0.75);

        // Every significant word matches exactly but out of order: capped below 0.95.
        let matched = match_title("bug in login flow", "login bug");
        assert_close(matched.score, 0.9);
    }

    #[test]
    fn multi_word_infix_contributes_three_tenths() {
        // "factor" sits inside "refactoring" (0.3), "parser" is exact (1.0): 1.3 / 2.
        let matched = match_title("refactoring parser", "factor parser");
        assert!(matched.is_match);
        assert_close(matched.score, 0.65);
    }

    #[test]
    fn multi_word_infix_only_stays_below_threshold() {
        // 0.3 + 0.3 over two words is 0.3, reset to a miss.
        assert_eq!(
            match_title("refactoring module", "factor dule"),
            TitleMatch::MISS
        );
    }

    #[test]
    fn multi_word_ignores_short_words() {
        assert_eq!(match_title("a b c d", "to be"), TitleMatch::MISS);
        let matched = match_title("write parser tests", "a parser of tests");
        assert!(matched.is_match);
        assert_close(matched.score, 0.9);
    }

    #[test]
    fn search_sorts_by_score_and_keeps_recency_for_ties() {
        let tasks = vec![
            task("newest", "add login page"),
            task("middle", "login"),
            task("older", "rework login flow"),
            task("oldest", "unrelated cleanup"),
        ];

        let results = search("login", &tasks);
        let ids = results
            .iter()
            .map(|result| result.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["middle", "newest", "older"]);
        assert_close(results[0].score, 1.0);
        assert_close(results[1].score, 0.95);
    }

    #[test]
    fn search_with_blank_query_returns_everything_in_order() {
        let tasks = vec![task("a", "first"), task("b", "second")];
        let results = search("  ", &tasks);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id.to_string(), "a");
    }
}
