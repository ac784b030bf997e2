//! Token-wise, line-by-line output comparison.
//!
//! Lines are split on ASCII whitespace plus `\x0b` and `\x1c..=\x1f`, so
//! trailing spaces and runs of blanks never matter, while the number of fields
//! and their exact contents do.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use super::{result::*, runner::io_outcome};

/// Compare the expected answer with the actual output of a program.
pub fn compare(expected: impl AsRef<Path>, actual: impl AsRef<Path>) -> Outcome {
    let (expected, actual) = (expected.as_ref(), actual.as_ref());
    let open = |path: &Path| File::open(path).map_err(|e| io_outcome(path, e));

    let readers = open(expected).and_then(|e| Ok((e, open(actual)?)));
    let (expected_file, actual_file) = match readers {
        Ok(files) => files,
        Err(outcome) => return outcome,
    };

    compare_readers(BufReader::new(expected_file), BufReader::new(actual_file))
        .unwrap_or_else(|e| {
            Outcome::with_message(
                Verdict::UnknownError,
                format!(
                    "Failed to compare '{}' with '{}': {}",
                    expected.to_string_lossy(),
                    actual.to_string_lossy(),
                    e
                ),
            )
        })
}

/// The comparison stops at the first line that is empty (no fields) on either
/// side, after that line itself has been checked.
pub fn compare_readers<E, A>(mut expected: E, mut actual: A) -> io::Result<Outcome>
where
    E: BufRead,
    A: BufRead,
{
    let mut expected_line = Vec::new();
    let mut actual_line = Vec::new();

    for line_no in 1usize.. {
        expected_line.clear();
        actual_line.clear();
        actual.read_until(b'\n', &mut actual_line)?;
        expected.read_until(b'\n', &mut expected_line)?;

        let ans = tokenize(&expected_line);
        let out = tokenize(&actual_line);

        if ans != out {
            let width = ans.len().max(out.len());
            for i in 0..width {
                let a = ans.get(i).copied().unwrap_or_default();
                let o = out.get(i).copied().unwrap_or_default();
                if a != o {
                    return Ok(wrong_answer(line_no, a, o));
                }
            }
        }

        if ans.is_empty() || out.is_empty() {
            break;
        }
    }
    Ok(Outcome::new(Verdict::Accepted))
}

fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    line.split(|b| b.is_ascii_whitespace() || matches!(*b, b'\x0b' | b'\x1c'..=b'\x1f'))
        .filter(|token| !token.is_empty())
        .collect()
}

fn wrong_answer(line_no: usize, expected: &[u8], actual: &[u8]) -> Outcome {
    Outcome::with_message(
        Verdict::WrongAnswer,
        format!(
            "on line {}: '{}' <-> '{}'",
            line_no,
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(actual),
        ),
    )
}
