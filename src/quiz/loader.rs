use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::quiz::sanitize::SanitizationPolicy;
use crate::quiz::{InvalidQuestion, Question, Quiz, QuizMetadata};

/// Fatal load failures. A single bad question is never one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read quiz source {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("quiz source is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("quiz source has an unexpected shape: {0}")]
    InvalidStructure(&'static str),
}

/// Turns an untrusted quiz document into sanitized, validated questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizLoader {
    policy: SanitizationPolicy,
    max_questions: usize,
}

impl QuizLoader {
    pub fn new(policy: SanitizationPolicy) -> Self {
        Self {
            policy,
            max_questions: 0,
        }
    }

    /// Keep at most `max` accepted questions. Zero disables the cap.
    pub fn with_max_questions(mut self, max: usize) -> Self {
        self.max_questions = max;
        self
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Quiz, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_reader(BufReader::new(file))
    }

    pub fn load_reader(&self, reader: impl Read) -> Result<Quiz, LoadError> {
        let document: Value = serde_json::from_reader(reader)?;
        self.load_value(document)
    }

    pub fn load_str(&self, source: &str) -> Result<Quiz, LoadError> {
        let document: Value = serde_json::from_str(source)?;
        self.load_value(document)
    }

    pub fn load_value(&self, document: Value) -> Result<Quiz, LoadError> {
        let Value::Object(mut document) = document else {
            return Err(LoadError::InvalidStructure("top level must be an object"));
        };

        let metadata = QuizMetadata {
            title: text_field(&document, "title"),
            subtitle: text_field(&document, "subtitle"),
            description: text_field(&document, "description"),
        };

        let raw_questions = match document.remove("questions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(questions)) => questions,
            Some(_) => return Err(LoadError::InvalidStructure("`questions` must be a list")),
        };

        let mut quiz = Quiz::new(metadata, Vec::with_capacity(raw_questions.len()));
        for raw in raw_questions {
            match self.accept(&raw) {
                Ok(question) => quiz.questions.push(question),
                Err(reason) => {
                    warn!("Invalid question skipped: {} ({reason})", describe(&raw));
                    quiz.dropped += 1;
                }
            }
        }

        if self.max_questions > 0 && quiz.questions.len() > self.max_questions {
            info!(
                "Keeping the first {} of {} questions",
                self.max_questions,
                quiz.questions.len()
            );
            quiz.questions.truncate(self.max_questions);
        }

        info!(
            "Loaded {} questions ({} dropped)",
            quiz.questions.len(),
            quiz.dropped
        );
        Ok(quiz)
    }

    fn accept(&self, raw: &Value) -> Result<Question, Rejection> {
        let Value::Object(fields) = raw else {
            return Err(Rejection::NotAnObject);
        };
        let sanitized = self.sanitize_fields(fields).ok_or(Rejection::Sanitization)?;
        Ok(validate(&sanitized)?)
    }

    /// Sanitizes every string and every string inside a list. Other values
    /// pass through untouched. `None` when the policy rejects any text.
    fn sanitize_fields(&self, fields: &Map<String, Value>) -> Option<Map<String, Value>> {
        let mut sanitized = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let value = match value {
                Value::String(text) => Value::String(self.policy.sanitize(text)?),
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(text) => self.policy.sanitize(text).map(Value::String),
                            other => Some(other.clone()),
                        })
                        .collect::<Option<Vec<_>>>()?,
                ),
                other => other.clone(),
            };
            sanitized.insert(key.clone(), value);
        }
        Some(sanitized)
    }
}

#[derive(Debug, Error)]
enum Rejection {
    #[error("not an object")]
    NotAnObject,
    #[error("rejected by sanitization policy")]
    Sanitization,
    #[error(transparent)]
    Invalid(#[from] InvalidQuestion),
}

fn validate(fields: &Map<String, Value>) -> Result<Question, InvalidQuestion> {
    let prompt = match fields.get("question") {
        None => return Err(InvalidQuestion::MissingField("question")),
        Some(Value::String(prompt)) => prompt.clone(),
        Some(_) => return Err(InvalidQuestion::NotText("question")),
    };

    let options = match fields.get("options") {
        None => return Err(InvalidQuestion::MissingField("options")),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(InvalidQuestion::NonTextOption(i + 1))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(InvalidQuestion::EmptyOptions),
    };

    let correct = match fields.get("correct") {
        None => return Err(InvalidQuestion::MissingField("correct")),
        Some(value) => value.as_i64().ok_or(InvalidQuestion::CorrectNotInteger)?,
    };

    Ok(Question::new(prompt, options, correct)?
        .with_title(text_field(fields, "title"))
        .with_subtitle(text_field(fields, "subtitle")))
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn describe(raw: &Value) -> &str {
    raw.get("question").and_then(Value::as_str).unwrap_or("Unknown")
}
