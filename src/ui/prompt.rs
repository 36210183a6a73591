use anyhow::Result;
use std::io::{BufRead, Write};

use crate::core::error::LabelError;
use crate::dataset::{normalize_rater_name, Rating};
use crate::shared::constants;

/// Prints `prompt` and reads one line without its line ending.
fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    what: &'static str,
) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(LabelError::InputClosed(what).into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Blocks until the rater presses enter.
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<()> {
    ask(input, output, constants::PROMPT_CONTINUE, "enter")?;
    Ok(())
}

/// Asks for a score until the answer is exactly -1, 0 or 1.
pub fn collect_rating<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Rating> {
    loop {
        let answer = ask(input, output, constants::PROMPT_RATING, "a rating")?;
        let answer = answer.trim();

        match answer.parse::<i64>() {
            Ok(value) => match Rating::try_from(value) {
                Ok(rating) => return Ok(rating),
                Err(_) => writeln!(output, "\t{} is out of range, enter -1, 0 or 1.", value)?,
            },
            Err(_) => {
                crate::utils::logger::debug(&format!("rejected rating input '{}'", answer));
                writeln!(output, "\t'{}' is not a number, enter -1, 0 or 1.", answer)?;
            }
        }
    }
}

/// Asks for the rater's first name until it is usable as a file name.
pub fn ask_rater_name<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    loop {
        let answer = ask(input, output, constants::PROMPT_RATER_NAME, "the rater's name")?;
        match normalize_rater_name(&answer) {
            Ok(name) => return Ok(name),
            Err(err) => writeln!(output, "{}, try again.", err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run<T>(
        script: &str,
        f: impl FnOnce(&mut Cursor<Vec<u8>>, &mut Vec<u8>) -> Result<T>,
    ) -> (Result<T>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = f(&mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn first_valid_rating_is_returned() {
        for (script, expected) in [("-1\n", -1), ("0\n", 0), ("1\n", 1), (" 1 \r\n", 1)] {
            let (rating, out) = run(script, |i, o| collect_rating(i, o));
            assert_eq!(rating.unwrap().value(), expected);
            assert_eq!(out.matches("How would you rate").count(), 1);
        }
    }

    #[test]
    fn invalid_answers_reprompt() {
        let (rating, out) = run("2\nyes\n\n-5\n0\n1\n", |i, o| collect_rating(i, o));
        assert_eq!(rating.unwrap().value(), 0);
        assert_eq!(out.matches("How would you rate").count(), 5);
        assert!(out.contains("2 is out of range"));
        assert!(out.contains("'yes' is not a number"));
    }

    #[test]
    fn closed_input_is_reported() {
        let (rating, _) = run("7\n", |i, o| collect_rating(i, o));
        let err = rating.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LabelError>(),
            Some(LabelError::InputClosed(_))
        ));
    }

    #[test]
    fn enter_prompt() {
        let (result, out) = run("\n", |i, o| wait_for_enter(i, o));
        result.unwrap();
        assert_eq!(out, "\nPress enter to watch next video: ");
    }

    #[test]
    fn rater_name_is_lowercased_and_checked() {
        let (name, out) = run("\n../x\n  Ana \n", |i, o| ask_rater_name(i, o));
        assert_eq!(name.unwrap(), "ana");
        assert_eq!(out.matches("What is your first name?").count(), 3);
        assert!(out.contains("is empty"));
        assert!(out.contains("cannot contain path separators"));
    }
}
