//! Interactive terminal front end.
//!
//! Reads a dream, walks the user through the clarifying questions, prints
//! the analysis and exports the panorama for the viewer. Ctrl-C while a
//! request is pending abandons the dream and starts over.

pub mod colors;
pub mod input;
pub mod render;

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::{DreamController, StageTask};
use crate::domain::clarify::ClarifyingQuestion;
use crate::domain::session::{SessionError, Stage};
use crate::ports::{AIProvider, DreamExporter};
use input::AnswerInput;

#[derive(Debug, Parser)]
#[command(name = "dreamscape")]
#[command(version, about = "Turn a dream description into an analysed, explorable panorama")]
pub struct Args {
    /// Dream description; read from the terminal when omitted
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Go straight to analysis without clarifying questions
    #[arg(long)]
    pub skip_questions: bool,

    /// Directory for exported panoramas and scene files
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Exit after one dream instead of offering another
    #[arg(long)]
    pub once: bool,
}

/// Line reader over stdin.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `prompt` and reads one line. `None` at end of input.
    pub async fn prompt(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{} ", colors::label(prompt));
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// How one pass through a dream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Finished,
    Interrupted,
    EndOfInput,
}

/// Runs dreams until the user stops, input ends, or `--once` is set.
pub async fn run<P, E>(
    args: &Args,
    controller: &mut DreamController<P>,
    exporter: &E,
    console: &mut Console,
) -> anyhow::Result<()>
where
    P: ?Sized + AIProvider + 'static,
    E: DreamExporter,
{
    let mut preset = args.description.clone();

    loop {
        let text = match preset.take() {
            Some(text) => text,
            None => match console.prompt("Describe your dream:").await? {
                Some(text) => text,
                None => return Ok(()),
            },
        };

        let first = match controller.submit(&text) {
            Ok(task) => task,
            Err(SessionError::Rejected(e)) => {
                println!("{}", render::dream_error(e));
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match dream(controller, exporter, console, first).await? {
            Ending::EndOfInput => return Ok(()),
            Ending::Interrupted => {
                println!("{}", colors::warning("Interrupted, starting over."));
                continue;
            }
            Ending::Finished => {}
        }

        if args.once {
            return Ok(());
        }
        match console.prompt("Dream again? [Y/n]").await? {
            Some(line) if input::is_yes(&line) => controller.dream_again(),
            _ => return Ok(()),
        }
    }
}

async fn dream<P, E>(
    controller: &mut DreamController<P>,
    exporter: &E,
    console: &mut Console,
    first: Option<StageTask>,
) -> anyhow::Result<Ending>
where
    P: ?Sized + AIProvider + 'static,
    E: DreamExporter,
{
    let mut next = first;

    loop {
        while let Some(task) = next.take() {
            if let Some(message) = waiting_message(task.stage()) {
                println!("{}", colors::status(message));
            }
            tokio::select! {
                result = task.run() => {
                    next = controller.commit(result)?;
                }
                _ = tokio::signal::ctrl_c() => {
                    controller.dream_again();
                    return Ok(Ending::Interrupted);
                }
            }
        }

        let session = controller.session();
        match session.stage() {
            Stage::Clarify => {
                let questions = session.questions().to_vec();
                match ask(controller, console, &questions).await? {
                    Some(task) => next = task,
                    None => return Ok(Ending::EndOfInput),
                }
            }
            Stage::Done => {
                if let Some(error) = session.error() {
                    println!("{}", render::dream_error(error));
                }
                if let Some(analysis) = session.analysis() {
                    println!("\n{}\n", render::analysis(analysis));
                }
                if let Some(generated) = session.generated() {
                    let exported = match exporter.export(generated, session.analysis()).await {
                        Ok(exported) => Some(exported),
                        Err(e) => {
                            tracing::error!(error = %e, "Export failed");
                            println!("{}", colors::error(&format!("Could not save the dream: {}", e)));
                            None
                        }
                    };
                    println!("{}", render::dream(generated, exported.as_ref()));
                }
                return Ok(Ending::Finished);
            }
            _ => {
                if let Some(error) = session.error() {
                    println!("{}", render::dream_error(error));
                }
                return Ok(Ending::Finished);
            }
        }
    }
}

/// Collects answers. Returns `None` at end of input, otherwise the task
/// that follows clarification.
async fn ask<P>(
    controller: &mut DreamController<P>,
    console: &mut Console,
    questions: &[ClarifyingQuestion],
) -> anyhow::Result<Option<Option<StageTask>>>
where
    P: ?Sized + AIProvider + 'static,
{
    println!(
        "\n{}\n{}",
        colors::heading("A few questions about your dream"),
        colors::status("Press Enter to pass, or type skip to go straight to the analysis.")
    );

    for (index, question) in questions.iter().enumerate() {
        println!("\n{}", render::question(index, question));
        loop {
            let Some(line) = console.prompt(">").await? else {
                return Ok(None);
            };
            match input::parse_answer(&line, question) {
                AnswerInput::Pass => break,
                AnswerInput::SkipAll => return Ok(Some(controller.skip_clarification()?)),
                AnswerInput::Text(text) => {
                    controller.answer_text(&question.id, &text)?;
                    break;
                }
                AnswerInput::Choices(choices) => {
                    for choice in &choices {
                        controller.select(&question.id, choice)?;
                    }
                    break;
                }
                AnswerInput::Invalid(hint) => println!("{}", colors::warning(&hint)),
            }
        }
    }

    Ok(Some(controller.submit_answers()?))
}

fn waiting_message(stage: Stage) -> Option<&'static str> {
    if !stage.awaits_remote() {
        return None;
    }
    Some(match stage {
        Stage::Clarify => "Thinking of questions...",
        Stage::Analyzing => "Analyzing your dream...",
        _ => "Bringing your dream to life...",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "dreamscape",
            "--description",
            "A staircase into the sea",
            "--skip-questions",
            "--output-dir",
            "/tmp/out",
            "--once",
        ])
        .unwrap();

        assert_eq!(args.description.as_deref(), Some("A staircase into the sea"));
        assert!(args.skip_questions);
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(args.once);
    }

    #[test]
    fn flags_default_off() {
        let args = Args::try_parse_from(["dreamscape"]).unwrap();
        assert!(args.description.is_none());
        assert!(!args.skip_questions);
        assert!(!args.once);
    }

    #[test]
    fn waiting_messages_per_stage() {
        assert_eq!(waiting_message(Stage::Analyzing), Some("Analyzing your dream..."));
        assert_eq!(waiting_message(Stage::Visualizing), Some("Bringing your dream to life..."));
        assert_eq!(waiting_message(Stage::Clarify), Some("Thinking of questions..."));
    }

    #[test]
    fn settled_stages_print_no_waiting_line() {
        assert_eq!(waiting_message(Stage::Input), None);
        assert_eq!(waiting_message(Stage::Done), None);
    }
}
