use std::borrow::Cow;

/// Line comparison passes, from strictest to loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Exact,
    TrimEnd,
    Trim,
    Normalized,
}

const PASSES: [Comparison; 4] = [
    Comparison::Exact,
    Comparison::TrimEnd,
    Comparison::Trim,
    Comparison::Normalized,
];

impl Comparison {
    fn key<'a>(self, line: &'a str) -> Cow<'a, str> {
        match self {
            Self::Exact => Cow::Borrowed(line),
            Self::TrimEnd => Cow::Borrowed(line.trim_end()),
            Self::Trim => Cow::Borrowed(line.trim()),
            Self::Normalized => Cow::Owned(normalize_for_match(line)),
        }
    }
}

fn is_unicode_space(c: char) -> bool {
    matches!(c, '\u{00A0}' | '\u{1680}' | '\u{202F}' | '\u{205F}' | '\u{3000}')
        || ('\u{2000}'..='\u{200A}').contains(&c)
}

/// Fold typographic punctuation and Unicode spaces to ASCII, then trim.
pub fn normalize_for_match(line: &str) -> String {
    let folded: String = line
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            c if is_unicode_space(c) => ' ',
            c => c,
        })
        .collect();
    folded.trim().to_string()
}

/// Find `needle` inside `haystack` at or after `start`.
///
/// With `prefer_end` the only candidate position is the tail of the haystack. Each comparison
/// pass is a full KMP scan, so a pass costs O(haystack + needle).
pub fn seek_sequence<H, N>(haystack: &[H], needle: &[N], start: usize, prefer_end: bool) -> Option<usize>
where
    H: AsRef<str>,
    N: AsRef<str>,
{
    if needle.is_empty() {
        return Some(start);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    let last_start = haystack.len() - needle.len();
    let window_start = if prefer_end { last_start } else { start };
    if window_start > last_start {
        return None;
    }

    for pass in PASSES {
        let needle_keys: Vec<Cow<'_, str>> = needle.iter().map(|l| pass.key(l.as_ref())).collect();
        let found = if prefer_end {
            haystack[last_start..]
                .iter()
                .zip(&needle_keys)
                .all(|(line, key)| pass.key(line.as_ref()) == *key)
                .then_some(last_start)
        } else {
            let hay_keys: Vec<Cow<'_, str>> = haystack[window_start..]
                .iter()
                .map(|l| pass.key(l.as_ref()))
                .collect();
            kmp_find(&hay_keys, &needle_keys).map(|idx| idx + window_start)
        };
        if let Some(idx) = found {
            if pass != Comparison::Exact {
                log::debug!("matched {} line(s) at {idx} with {pass:?} comparison", needle.len());
            }
            return Some(idx);
        }
    }
    None
}

fn failure_table<T: PartialEq>(needle: &[T]) -> Vec<usize> {
    let mut table = vec![0usize; needle.len()];
    let mut k = 0usize;
    for i in 1..needle.len() {
        while k > 0 && needle[i] != needle[k] {
            k = table[k - 1];
        }
        if needle[i] == needle[k] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

fn kmp_find<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    let table = failure_table(needle);
    let mut k = 0usize;
    for (i, item) in haystack.iter().enumerate() {
        while k > 0 && *item != needle[k] {
            k = table[k - 1];
        }
        if *item == needle[k] {
            k += 1;
        }
        if k == needle.len() {
            return Some(i + 1 - needle.len());
        }
    }
    None
}
