//! Layout for nested provenance traces.

/// Breaks a one-line trace at `(`, `)`, `;` and `||`, indenting one tab per
/// open parenthesis. `;` is shown as `,`.
pub fn prettify(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    let mut depth = 0usize;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                out.push('(');
                newline(&mut out, depth);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(')');
            }
            ';' => {
                out.push(',');
                newline(&mut out, depth);
            }
            '|' if chars.peek() == Some(&'|') => {
                chars.next();
                out.push_str("||");
                newline(&mut out, depth);
            }
            c => out.push(c),
        }
    }
    out
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    out.extend(std::iter::repeat('\t').take(depth));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat() {
        assert_eq!(prettify("1d6 --> [4]"), "1d6 --> [4]");
        assert_eq!(prettify("a ;b"), "a ,\nb");
    }

    #[test]
    fn test_nested() {
        assert_eq!(
            prettify("T ==> (2 rows --> [row 1] ||2 rows --> [row 2] > (1d4 --> [3]))"),
            "T ==> (\n\t2 rows --> [row 1] ||\n\t2 rows --> [row 2] > (\n\t\t1d4 --> [3]\n\t)\n)"
        );
    }

    #[test]
    fn test_single_pipe_is_kept() {
        assert_eq!(prettify("1d6 --> [4] | Name"), "1d6 --> [4] | Name");
    }

    #[test]
    fn test_unbalanced_close() {
        assert_eq!(prettify("a)"), "a\n)");
    }
}
