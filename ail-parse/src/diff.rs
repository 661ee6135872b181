#![forbid(unsafe_code)]

/// One line of a line-oriented diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Same(String),
    Removed(String),
    Added(String),
}

/// Longest-common-subsequence diff of two texts, line by line.
pub fn line_diff(before: &str, after: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = before.lines().collect();
    let b: Vec<&str> = after.lines().collect();

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(DiffLine::Same(a[i].to_string()));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(DiffLine::Removed(a[i].to_string()));
            i += 1;
        } else {
            out.push(DiffLine::Added(b[j].to_string()));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| DiffLine::Removed(l.to_string())));
    out.extend(b[j..].iter().map(|l| DiffLine::Added(l.to_string())));
    out
}

/// Unified-style rendering: `-` for source lines, `+` for canonical lines.
pub fn render_diff(lines: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let (prefix, text) = match line {
            DiffLine::Same(t) => (' ', t),
            DiffLine::Removed(t) => ('-', t),
            DiffLine::Added(t) => ('+', t),
        };
        out.push(prefix);
        out.push_str(text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identical_texts_have_no_changes() {
        let d = line_diff("a\nb\n", "a\nb\n");
        assert!(d.iter().all(|l| matches!(l, DiffLine::Same(_))));
    }

    #[test]
    fn changed_line_is_removed_then_added() {
        let d = line_diff("a\nx\nc\n", "a\ny\nc\n");
        assert_eq!(render_diff(&d), " a\n-x\n+y\n c\n");
    }

    #[test]
    fn trailing_additions() {
        let d = line_diff("a\n", "a\n\nb\n");
        assert_eq!(render_diff(&d), " a\n+\n+b\n");
    }
}
