use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no more input data")]
    InputExhausted,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where a session reads answers from and writes everything it shows.
pub trait IoChannel {
    /// Shows `prompt`, then returns the next input line with surrounding
    /// whitespace trimmed.
    fn read_line(&mut self, prompt: &str) -> Result<String, ChannelError>;

    fn write_line(&mut self, text: &str) -> Result<(), ChannelError>;

    /// Flushes and releases the channel. Called once, when a session completes.
    fn close(&mut self) -> Result<(), ChannelError>;
}

/// Interactive channel on the process's stdin/stdout.
#[derive(Debug, Default)]
pub struct TerminalChannel;

impl TerminalChannel {
    pub fn new() -> Self {
        Self
    }
}

impl IoChannel for TerminalChannel {
    fn read_line(&mut self, prompt: &str) -> Result<String, ChannelError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            error!("Standard input closed");
            return Err(ChannelError::InputExhausted);
        }
        Ok(line.trim().to_string())
    }

    fn write_line(&mut self, text: &str) -> Result<(), ChannelError> {
        writeln!(io::stdout().lock(), "{text}")?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        io::stdout().flush()?;
        Ok(())
    }
}

/// Replays answers from an input source and records the whole exchange,
/// prompts and echoed answers included, to an output sink.
#[derive(Debug)]
pub struct TranscriptChannel<R, W> {
    input: R,
    output: W,
}

impl TranscriptChannel<BufReader<File>, BufWriter<File>> {
    pub fn open(input: impl AsRef<Path>, output: impl AsRef<Path>) -> io::Result<Self> {
        let input = File::open(input)?;
        let output = File::create(output)?;
        Ok(Self::new(BufReader::new(input), BufWriter::new(output)))
    }
}

impl<R: BufRead, W: Write> TranscriptChannel<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> IoChannel for TranscriptChannel<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String, ChannelError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            error!("No more input data.");
            return Err(ChannelError::InputExhausted);
        }

        self.output.write_all(prompt.as_bytes())?;
        self.output.write_all(line.as_bytes())?;
        if !line.ends_with('\n') {
            self.output.write_all(b"\n")?;
        }
        Ok(line.trim().to_string())
    }

    fn write_line(&mut self, text: &str) -> Result<(), ChannelError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn transcript(input: &str) -> TranscriptChannel<Cursor<Vec<u8>>, Vec<u8>> {
        TranscriptChannel::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn echoes_prompt_and_line() {
        let mut channel = transcript("First input\n  Second input  \n");

        assert_eq!(channel.read_line("> ").unwrap(), "First input");
        channel.write_line("Correct!").unwrap();
        assert_eq!(channel.read_line("? ").unwrap(), "Second input");
        channel.close().unwrap();

        let output = String::from_utf8(channel.into_output()).unwrap();
        assert_eq!(output, "> First input\nCorrect!\n?   Second input  \n");
    }

    #[test]
    fn last_line_without_newline_is_terminated() {
        let mut channel = transcript("2");
        assert_eq!(channel.read_line("Answer: ").unwrap(), "2");
        let output = String::from_utf8(channel.into_output()).unwrap();
        assert_eq!(output, "Answer: 2\n");
    }

    #[test]
    fn exhausted_input_is_an_error() {
        let mut channel = transcript("only\n");
        channel.read_line("").unwrap();
        assert!(matches!(
            channel.read_line("more? "),
            Err(ChannelError::InputExhausted)
        ));

        let output = String::from_utf8(channel.into_output()).unwrap();
        assert_eq!(output, "only\n");
    }

    #[test]
    fn open_reads_and_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.txt");
        std::fs::write(&input, "First input\nSecond input\n").unwrap();

        let mut channel = TranscriptChannel::open(&input, &output).unwrap();
        assert_eq!(channel.read_line("Prompt: ").unwrap(), "First input");
        channel.write_line("Test output").unwrap();
        channel.close().unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "Prompt: First input\nTest output\n");
    }

    #[test]
    fn open_fails_for_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            TranscriptChannel::open(dir.path().join("nope.txt"), dir.path().join("out.txt"));
        assert!(result.is_err());
    }
}
