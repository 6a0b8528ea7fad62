use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::error::{Result, SyncError};

/// Operator interaction needed before a page overwrite: a free-text
/// description of the changes and a yes/no confirmation. A trait so the
/// pipeline runs headless in tests.
pub trait ChangePrompt {
    fn request_description(&mut self, page_title: &str, version_number: i64) -> Result<String>;
    fn confirm(&mut self, description: &str, version_number: i64) -> Result<bool>;
}

/// Ask for a description and echo it back until the operator confirms it.
/// A `no` answer restarts the description prompt; this never gives up on
/// its own.
pub fn confirmed_description(
    prompt: &mut dyn ChangePrompt,
    page_title: &str,
    version_number: i64,
) -> Result<String> {
    loop {
        let description = prompt.request_description(page_title, version_number)?;
        if prompt.confirm(&description, version_number)? {
            return Ok(description);
        }
        println!(
            "Please try again and confirm the updates made to the '{page_title}' page."
        );
    }
}

/// Blocking prompt over a line-oriented reader and writer, stdin/stdout in
/// production.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    pub fn from_stdio() -> Self {
        Self {
            input: BufReader::new(io::stdin()),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|error| SyncError::io("<stdin>", error))?;
        if read == 0 {
            return Err(SyncError::validation(
                "input closed while waiting for operator response",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn write_prompt(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{text}").map_err(|error| SyncError::io("<stdout>", error))?;
        self.output
            .flush()
            .map_err(|error| SyncError::io("<stdout>", error))
    }
}

impl<R: BufRead, W: Write> ChangePrompt for TerminalPrompt<R, W> {
    fn request_description(&mut self, page_title: &str, _version_number: i64) -> Result<String> {
        self.write_prompt(&format!(
            "Please enter what updates have been made to the '{page_title}' page: "
        ))?;
        self.read_line()
    }

    fn confirm(&mut self, description: &str, version_number: i64) -> Result<bool> {
        loop {
            self.write_prompt(&format!(
                "You entered '{description} [{version_number}]'. Is this correct? (y/n): "
            ))?;
            let answer = self.read_line()?;
            if answer.eq_ignore_ascii_case("y") {
                return Ok(true);
            }
            if answer.eq_ignore_ascii_case("n") {
                return Ok(false);
            }
            self.write_prompt("Invalid input. Please try again.\n")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt_with(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn confirm_accepts_case_insensitive_yes_and_no() {
        let mut prompt = prompt_with("Y\n");
        assert!(prompt.confirm("added Proj1", 4).expect("confirm"));

        let mut prompt = prompt_with("N\n");
        assert!(!prompt.confirm("added Proj1", 4).expect("confirm"));
    }

    #[test]
    fn confirm_reprompts_on_anything_else() {
        let mut prompt = prompt_with("maybe\nyes\ny\n");
        assert!(prompt.confirm("added Proj1", 4).expect("confirm"));
        let output = String::from_utf8(prompt.output.clone()).expect("utf8");
        assert_eq!(output.matches("Invalid input").count(), 2);
    }

    #[test]
    fn confirmed_description_loops_until_yes() {
        let mut prompt = prompt_with("first try\nn\nsecond try\ny\n");
        let description =
            confirmed_description(&mut prompt, "File Inventory", 4).expect("description");
        assert_eq!(description, "second try");
    }

    #[test]
    fn description_prompt_names_the_page() {
        let mut prompt = prompt_with("added Proj1\n");
        let description = prompt
            .request_description("File Inventory", 4)
            .expect("description");
        assert_eq!(description, "added Proj1");
        let output = String::from_utf8(prompt.output.clone()).expect("utf8");
        assert!(output.contains("'File Inventory'"));
    }

    #[test]
    fn closed_input_is_an_error_not_a_hang() {
        let mut prompt = prompt_with("");
        let error = prompt
            .request_description("File Inventory", 1)
            .expect_err("must fail");
        assert!(matches!(error, SyncError::Validation { .. }));
    }
}
