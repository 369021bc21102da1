//! Glob-pattern compilation and ordered entry matching.
//!
//! Patterns accept `/` and `:` interchangeably as path separators and match
//! case-insensitively. `*` matches within one path segment, `?` matches a
//! single character. Matching preserves the container's catalog order, so a
//! hierarchical container's pre-order survives into the match set.

use regex::Regex;

use crate::container::FileEntry;
use crate::error::NestArcError;

/// One compiled glob pattern, retaining the user's original spelling for
/// diagnostics.
pub struct CompiledPattern {
    raw: String,
    re: Regex,
}

impl CompiledPattern {
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Compiles a set of glob patterns. Fails on the first malformed pattern.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<CompiledPattern>, NestArcError> {
    patterns
        .iter()
        .map(|p| {
            let re_src = glob_to_regex(p);
            let re = Regex::new(&re_src).map_err(|source| NestArcError::BadPattern {
                pattern: p.clone(),
                source,
            })?;
            Ok(CompiledPattern { raw: p.clone(), re })
        })
        .collect()
}

/// Matches compiled patterns against a container's entry list.
///
/// Returns the match set in catalog order (no duplicates even when several
/// patterns hit the same entry) plus the raw text of every pattern that
/// matched nothing. With `recursive` set, a pattern naming a directory also
/// claims everything beneath it.
pub fn match_entries(
    patterns: &[CompiledPattern],
    entries: &[FileEntry],
    recursive: bool,
) -> (Vec<FileEntry>, Vec<String>) {
    let mut hit = vec![false; patterns.len()];
    let mut matched = Vec::new();

    for entry in entries {
        let path = normalize(&entry.full_path, entry.separator);
        let mut claimed = false;
        for (i, pat) in patterns.iter().enumerate() {
            if pattern_matches(pat, &path, recursive) {
                hit[i] = true;
                claimed = true;
            }
        }
        if claimed {
            matched.push(entry.clone());
        }
    }

    let unmatched = patterns
        .iter()
        .zip(&hit)
        .filter(|(_, &h)| !h)
        .map(|(p, _)| p.raw.clone())
        .collect();
    (matched, unmatched)
}

/// Strict variant: every pattern must match at least one entry.
pub fn match_entries_strict(
    patterns: &[CompiledPattern],
    entries: &[FileEntry],
    recursive: bool,
) -> Result<Vec<FileEntry>, NestArcError> {
    let (matched, unmatched) = match_entries(patterns, entries, recursive);
    if let Some(p) = unmatched.into_iter().next() {
        return Err(NestArcError::NoMatch(p));
    }
    Ok(matched)
}

fn pattern_matches(pat: &CompiledPattern, normalized_path: &str, recursive: bool) -> bool {
    if pat.re.is_match(normalized_path) {
        return true;
    }
    if recursive {
        // A pattern naming an ancestor directory claims the whole subtree.
        for (i, c) in normalized_path.char_indices() {
            if c == '/' && pat.re.is_match(&normalized_path[..i]) {
                return true;
            }
        }
    }
    false
}

fn normalize(path: &str, separator: char) -> String {
    if separator == '/' {
        path.to_string()
    } else {
        path.replace(separator, "/")
    }
}

/// Translates one glob pattern into an anchored, case-insensitive regex.
fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() + 8);
    re.push_str("(?i)^");
    for c in glob.chars() {
        match c {
            // Both separators are accepted in patterns.
            '/' | ':' => re.push('/'),
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            _ => {
                if regex_syntax_char(c) {
                    re.push('\\');
                }
                re.push(c);
            }
        }
    }
    re.push('$');
    re
}

fn regex_syntax_char(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<FileEntry> {
        paths.iter().map(|p| FileEntry::file(p, '/')).collect()
    }

    fn compile(pats: &[&str]) -> Vec<CompiledPattern> {
        compile_patterns(&pats.iter().map(|s| s.to_string()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn literal_match_is_case_insensitive() {
        let pats = compile(&["README.TXT"]);
        let ents = entries(&["readme.txt", "other.txt"]);
        let (matched, unmatched) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].full_path, "readme.txt");
        assert!(unmatched.is_empty());
    }

    #[test]
    fn colon_and_slash_separators_are_interchangeable() {
        let pats = compile(&["docs:notes.txt"]);
        let ents = entries(&["docs/notes.txt"]);
        let (matched, _) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);

        // Entries with a colon separator normalize the same way.
        let colon_entry = vec![FileEntry::file("docs:notes.txt", ':')];
        let pats = compile(&["docs/notes.txt"]);
        let (matched, _) = match_entries(&pats, &colon_entry, false);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn star_does_not_cross_separators() {
        let pats = compile(&["*.txt"]);
        let ents = entries(&["a.txt", "docs/b.txt"]);
        let (matched, _) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].full_path, "a.txt");
    }

    #[test]
    fn recursive_pattern_claims_subtree() {
        let pats = compile(&["docs"]);
        let ents = vec![
            FileEntry::directory("docs", '/'),
            FileEntry::file("docs/a.txt", '/'),
            FileEntry::file("docs/sub/b.txt", '/'),
            FileEntry::file("other.txt", '/'),
        ];
        let (matched, _) = match_entries(&pats, &ents, true);
        let names: Vec<_> = matched.iter().map(|e| e.full_path.as_str()).collect();
        assert_eq!(names, ["docs", "docs/a.txt", "docs/sub/b.txt"]);

        let (matched, _) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn no_duplicates_when_patterns_overlap() {
        let pats = compile(&["*.txt", "a.*"]);
        let ents = entries(&["a.txt"]);
        let (matched, unmatched) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn unmatched_patterns_are_reported() {
        let pats = compile(&["a.txt", "missing.*"]);
        let ents = entries(&["a.txt"]);
        let (_, unmatched) = match_entries(&pats, &ents, false);
        assert_eq!(unmatched, ["missing.*"]);

        let err = match_entries_strict(&pats, &ents, false).unwrap_err();
        assert!(matches!(err, NestArcError::NoMatch(p) if p == "missing.*"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let pats = compile(&["file?.bin"]);
        let ents = entries(&["file1.bin", "file.bin", "file12.bin"]);
        let (matched, _) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].full_path, "file1.bin");
    }

    #[test]
    fn regex_metacharacters_in_patterns_are_literal() {
        let pats = compile(&["notes (v1).txt"]);
        let ents = entries(&["notes (v1).txt", "notes xv1y.txt"]);
        let (matched, _) = match_entries(&pats, &ents, false);
        assert_eq!(matched.len(), 1);
    }
}
