pub mod channel;
pub mod command;
pub mod loader;
pub mod sanitize;
pub mod session;

use thiserror::Error;

/// Descriptive fields shown once before the first question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

/// A loaded quiz: metadata plus the questions that survived sanitization and validation.
#[derive(Debug, Clone, Default)]
pub struct Quiz {
    pub metadata: QuizMetadata,
    pub questions: Vec<Question>,
    /// Number of source questions that were rejected or failed validation.
    pub dropped: usize,
}

impl Quiz {
    pub fn new(metadata: QuizMetadata, questions: Vec<Question>) -> Self {
        Self {
            metadata,
            questions,
            dropped: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be text")]
    NotText(&'static str),
    #[error("`options` must be a non-empty list")]
    EmptyOptions,
    #[error("option {0} is not text")]
    NonTextOption(usize),
    #[error("`correct` must be an integer")]
    CorrectNotInteger,
    #[error("`correct` is {correct} but there are {options} options")]
    CorrectOutOfRange { correct: i64, options: usize },
}

/// A multiple-choice question. The correct index is 1-based and always
/// within `1..=options.len()`; construction is the only way to get one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    title: Option<String>,
    subtitle: Option<String>,
    prompt: String,
    options: Vec<String>,
    correct: usize,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: i64,
    ) -> Result<Self, InvalidQuestion> {
        if options.is_empty() {
            return Err(InvalidQuestion::EmptyOptions);
        }
        let out_of_range = InvalidQuestion::CorrectOutOfRange {
            correct,
            options: options.len(),
        };
        let correct = usize::try_from(correct).map_err(|_| out_of_range.clone())?;
        if !(1..=options.len()).contains(&correct) {
            return Err(out_of_range);
        }

        Ok(Self {
            title: None,
            subtitle: None,
            prompt: prompt.into(),
            options,
            correct,
        })
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// 1-based index of the correct option.
    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn is_correct(&self, option_number: usize) -> bool {
        option_number == self.correct
    }
}
