//! Console confirmation prompt

use crate::reconcile::ReconcileStatus;
use std::io::{self, BufRead, Write};

/// Tokens accepted as an affirmative answer (case-insensitive)
const AFFIRMATIVES: [&str; 7] = ["y", "yes", "true", "t", "1", "sure", "okay"];

/// Tokens accepted as a negative answer (case-insensitive)
const NEGATIVES: [&str; 7] = ["n", "no", "false", "f", "0", "nope", "cancel"];

/// Default number of unrecognized answers tolerated before declining
pub const DEFAULT_FAIL_THRESHOLD: u32 = 5;

/// Standard yes/no query on stdin.
///
/// Returns false once `fail_threshold` unrecognized answers have been given.
pub fn ask_boolean(message: &str, fail_threshold: u32) -> bool {
    let stdin = io::stdin();
    ask_boolean_from(stdin.lock(), io::stdout(), message, fail_threshold)
}

/// Yes/no query over explicit input and output streams.
///
/// Retries on unrecognized input with a bounded attempt counter; read
/// failures count as failed attempts. Exhausting the threshold declines.
pub fn ask_boolean_from<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    message: &str,
    fail_threshold: u32,
) -> bool {
    let mut prompt = message.to_string();
    if !prompt.ends_with(' ') {
        prompt.push(' ');
    }

    let mut fails = 0;
    while fails < fail_threshold {
        let _ = write!(output, "{}", prompt);
        let _ = output.flush();

        let mut line = String::new();
        if input.read_line(&mut line).is_err() {
            fails += 1;
            continue;
        }
        let answer = line.trim().to_lowercase();

        if AFFIRMATIVES.contains(&answer.as_str()) {
            return true;
        }
        if NEGATIVES.contains(&answer.as_str()) {
            return false;
        }

        fails += 1;
        let _ = writeln!(output, "Please answer 'yes' or 'no'");
    }

    let _ = writeln!(output, "Exiting...");
    false
}

/// Render the classification counts as console output
pub fn render_status(status: &ReconcileStatus) -> String {
    format!(
        "The following operations will be performed:\n\
         \x20 * added            {}\n\
         \x20 * updated          {}\n\
         \x20 * deleted          {}\n\
         \x20 * value unchanged  {}\n\
         \x20 * ignored zero     {}",
        status.added, status.updated, status.deleted, status.value_unchanged, status.ignored_zero
    )
}

/// Show the plan summary and ask whether to proceed
pub fn confirm_plan(status: &ReconcileStatus) -> bool {
    println!("{}", render_status(status));
    ask_boolean("Do you wish to continue?", DEFAULT_FAIL_THRESHOLD)
}
