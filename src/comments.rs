//! Comment removal for layout files.
//!
//! `/* ... */` blocks go first (non-greedy, may span lines, an unterminated block runs to the
//! end of input), then everything from the first `//` to the end of each line. Newlines inside
//! a block comment are kept so that parser positions still point at the right source line.

/// Strip block and line comments from layout source.
pub fn strip_comments(source: &str) -> String {
    strip_line_comments(&strip_block_comments(source))
}

fn strip_block_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let (comment, tail) = match body.find("*/") {
            Some(end) => (&body[..end], &body[end + 2..]),
            None => (body, ""),
        };
        out.extend(comment.chars().filter(|&c| c == '\n'));
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn strip_line_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| match line.find("//") {
            Some(i) => &line[..i],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_comment_removed() {
        let out = strip_comments("struct Foo { // trailing\n  BYTE A[1];\n}");
        assert!(!out.contains("//"));
        assert!(out.contains("struct Foo {"));
        assert!(out.contains("BYTE A[1];"));
    }

    #[test]
    fn block_comment_spanning_lines_keeps_line_count() {
        let src = "struct Foo {\n/* multi\nline\ncomment */\nBYTE A[1];\n}";
        let out = strip_comments(src);
        assert!(!out.contains("multi"));
        assert!(!out.contains("line"));
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn block_comment_is_non_greedy() {
        let out = strip_comments("a /* x */ b /* y */ c");
        assert_eq!(out, "a  b  c");
    }

    #[test]
    fn unterminated_block_consumes_rest() {
        let out = strip_comments("BYTE A[1]; /* open\nBYTE B[2];");
        assert_eq!(out, "BYTE A[1]; ");
    }

    #[test]
    fn line_comment_inside_block_is_gone() {
        let out = strip_comments("/* // not a line comment */BYTE A[1];");
        assert_eq!(out, "BYTE A[1];");
    }

    #[test]
    fn stripping_is_idempotent() {
        let src = "struct A { /* c */ BYTE X[2]; // d\n} txt; /* open";
        let once = strip_comments(src);
        assert_eq!(strip_comments(&once), once);
    }
}
