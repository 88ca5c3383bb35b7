use log::{debug, info};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::quiz::channel::{ChannelError, IoChannel};
use crate::quiz::command::Command;
use crate::quiz::{Question, Quiz, QuizMetadata};

/// Longest answer line (in characters) that is looked at.
pub const MAX_INPUT_LEN: usize = 100;

const ANSWER_PROMPT: &str = "Your answer (or command): ";
const INVALID_SIZE: &str = "Invalid input size. Please try again.";
const INVALID_INPUT: &str = "Invalid input. Please enter a valid option number or command.";
const INVALID_OPTION: &str = "Invalid option number. Please try again.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every question was answered or skipped.
    Completed(Summary),
    /// The quiz had no questions to ask.
    NoQuestions,
    /// The user quit; no results were shown.
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub correct: usize,
    pub total: usize,
    /// Prompts of incorrectly answered questions, in the order they were asked.
    pub missed: Vec<String>,
    pub skipped: usize,
}

/// Progress through the current pass. Question references are positions in
/// the shuffled sequence, which only changes when this is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SessionState {
    cursor: usize,
    correct: usize,
    incorrect: Vec<usize>,
    skipped: Vec<usize>,
}

enum Step {
    Answered,
    Skipped,
    Restart,
    Quit,
}

pub struct Session<C, R = ThreadRng> {
    metadata: QuizMetadata,
    questions: Vec<Question>,
    channel: C,
    rng: R,
    state: SessionState,
}

impl<C: IoChannel> Session<C> {
    pub fn new(quiz: Quiz, channel: C) -> Self {
        Self::with_rng(quiz, channel, rand::thread_rng())
    }
}

impl<C: IoChannel, R: Rng> Session<C, R> {
    pub fn with_rng(quiz: Quiz, channel: C, rng: R) -> Self {
        Self {
            metadata: quiz.metadata,
            questions: quiz.questions,
            channel,
            rng,
            state: SessionState::default(),
        }
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Runs the quiz to completion or until the user quits.
    ///
    /// The channel is closed on completion. On quit it is left as is and the
    /// caller decides what to do with it.
    pub fn run(&mut self) -> Result<SessionOutcome, SessionError> {
        self.show_metadata()?;

        if self.questions.is_empty() {
            info!("No questions to ask");
            self.channel.write_line("No questions available.")?;
            self.channel.close()?;
            return Ok(SessionOutcome::NoQuestions);
        }

        self.state = SessionState::default();
        self.questions.shuffle(&mut self.rng);
        info!("Starting quiz with {} questions", self.questions.len());

        while self.state.cursor < self.questions.len() {
            self.show_question()?;
            match self.acquire_answer()? {
                Step::Answered | Step::Skipped => self.state.cursor += 1,
                Step::Restart => self.restart(),
                Step::Quit => {
                    info!("Quiz abandoned at question {}", self.state.cursor + 1);
                    return Ok(SessionOutcome::Quit);
                }
            }
        }

        let summary = self.summary();
        self.show_results(&summary)?;
        self.channel.close()?;
        info!("Quiz completed: {}/{}", summary.correct, summary.total);
        Ok(SessionOutcome::Completed(summary))
    }

    fn show_metadata(&mut self) -> Result<(), ChannelError> {
        let metadata = &self.metadata;
        if let Some(title) = present(&metadata.title) {
            self.channel.write_line(&format!("=== {title} ==="))?;
        }
        if let Some(subtitle) = present(&metadata.subtitle) {
            self.channel.write_line(subtitle)?;
        }
        if let Some(description) = present(&metadata.description) {
            self.channel.write_line(description)?;
        }
        Ok(())
    }

    fn show_question(&mut self) -> Result<(), ChannelError> {
        let question = &self.questions[self.state.cursor];
        if let Some(title) = question.title().filter(|t| !t.is_empty()) {
            self.channel.write_line(&format!("\n{title}"))?;
        }
        if let Some(subtitle) = question.subtitle().filter(|s| !s.is_empty()) {
            self.channel.write_line(subtitle)?;
        }
        self.channel.write_line(&format!(
            "\nQuestion {}: {}",
            self.state.cursor + 1,
            question.prompt()
        ))?;
        for (i, option) in question.options().iter().enumerate() {
            self.channel.write_line(&format!("{}. {option}", i + 1))?;
        }
        Ok(())
    }

    /// Reads input until the current question is answered or a command moves
    /// the session on. Malformed input never changes state.
    fn acquire_answer(&mut self) -> Result<Step, ChannelError> {
        let cursor = self.state.cursor;
        let question = &self.questions[cursor];

        loop {
            let input = self.channel.read_line(ANSWER_PROMPT)?;

            if !(1..=MAX_INPUT_LEN).contains(&input.chars().count()) {
                self.channel.write_line(INVALID_SIZE)?;
                continue;
            }

            if let Some(command) = Command::resolve(&input) {
                debug!("Command `{command}` at question {}", cursor + 1);
                match command {
                    Command::Help => self.channel.write_line(&Command::help_text())?,
                    Command::Skip => {
                        self.state.skipped.push(cursor);
                        self.channel.write_line("Question skipped.")?;
                        return Ok(Step::Skipped);
                    }
                    Command::Restart => {
                        self.channel.write_line("Restarting quiz...")?;
                        return Ok(Step::Restart);
                    }
                    Command::Quit => {
                        self.channel.write_line("Exiting quiz.")?;
                        return Ok(Step::Quit);
                    }
                }
                continue;
            }

            if !input.bytes().all(|b| b.is_ascii_digit()) {
                self.channel.write_line(INVALID_INPUT)?;
                continue;
            }

            let choice = input
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=question.options().len()).contains(n));
            let Some(choice) = choice else {
                self.channel.write_line(INVALID_OPTION)?;
                continue;
            };

            if question.is_correct(choice) {
                self.channel.write_line("Correct!")?;
                self.state.correct += 1;
            } else {
                self.channel.write_line("Incorrect.")?;
                self.state.incorrect.push(cursor);
            }
            return Ok(Step::Answered);
        }
    }

    /// Clears all progress and reshuffles. The next pass starts at the first
    /// question of the new order.
    fn restart(&mut self) {
        info!("Restarting quiz");
        self.state = SessionState::default();
        self.questions.shuffle(&mut self.rng);
    }

    fn summary(&self) -> Summary {
        Summary {
            correct: self.state.correct,
            total: self.questions.len(),
            missed: self
                .state
                .incorrect
                .iter()
                .map(|&i| self.questions[i].prompt().to_string())
                .collect(),
            skipped: self.state.skipped.len(),
        }
    }

    fn show_results(&mut self, summary: &Summary) -> Result<(), ChannelError> {
        self.channel.write_line("\nQuiz Completed!")?;
        self.channel
            .write_line(&format!("Your score: {}/{}", summary.correct, summary.total))?;
        if !summary.missed.is_empty() {
            self.channel.write_line("\nYou missed the following questions:")?;
            for prompt in &summary.missed {
                self.channel.write_line(&format!("- {prompt}"))?;
            }
        }
        if summary.skipped > 0 {
            self.channel
                .write_line(&format!("\nSkipped questions: {}", summary.skipped))?;
        }
        Ok(())
    }
}

/// Empty text counts as absent.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|text| !text.is_empty())
}
