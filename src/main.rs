use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use log::LevelFilter;

use mcq_quiz::config::{ChannelSettings, Cli, Settings};
use mcq_quiz::quiz::channel::{IoChannel, TerminalChannel, TranscriptChannel};
use mcq_quiz::quiz::loader::QuizLoader;
use mcq_quiz::quiz::session::{Session, SessionOutcome};

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn main() -> ExitCode {
    // A .env file is optional; its values only fill in QUIZ_* variables.
    dotenv().ok();

    let settings = match Settings::resolve(Cli::parse()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(settings.logging_enabled);
    log::info!("Starting quiz from {}", settings.quiz_file.display());

    match run(&settings) {
        Ok(SessionOutcome::Quit) => {
            log::info!("Quiz exited by user");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(enabled: bool) {
    if !enabled {
        log::set_max_level(LevelFilter::Off);
        return;
    }

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn run(settings: &Settings) -> AppResult<SessionOutcome> {
    match &settings.channel {
        ChannelSettings::Terminal => play(TerminalChannel::new(), settings),
        ChannelSettings::Transcript { input, output } => {
            let channel = TranscriptChannel::open(input, output)
                .map_err(|e| format!("error opening transcript files: {e}"))?;
            play(channel, settings)
        }
    }
}

fn play<C: IoChannel>(channel: C, settings: &Settings) -> AppResult<SessionOutcome> {
    let quiz = QuizLoader::new(settings.policy)
        .with_max_questions(settings.quiz_length)
        .load_path(&settings.quiz_file)?;

    let mut session = Session::new(quiz, channel);
    Ok(session.run()?)
}
