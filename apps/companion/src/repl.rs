//! Line-oriented terminal front end over the command layer.

use crate::commands::{self, CommandError};
use crate::controller::{BoardView, QuizView};
use crate::events::FlowEvent;
use crate::state::AppState;
use std::fmt::Write as _;
use study_core::{QuestionStatus, StudyGuide, TileStatus};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

pub const HELP: &str = "\
commands:
  topics                   list suggested topics
  study <topic>            generate a study guide
  guide                    show the loaded guide
  home                     back to the home view
  quiz [easy|medium|hard]  start a quiz on the loaded topic
  pick <n>                 choose option n for the current question
  check | skip | next | prev | goto <n>
  finish | close           record or abandon the quiz
  match <section>          open a section's matching board
  tile <term-N|def-N>      click a tile on the open board
  reset                    reshuffle the open board
  diagram <section>        generate a section diagram
  hide <section>           toggle a diagram's visibility
  speak <section>          read a section aloud
  ask <message>            ask the tutor
  chat                     show the tutor transcript
  stats | mood <1-5>
  help | quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Topics,
    Study(String),
    Guide,
    Home,
    Quiz(Option<String>),
    Pick(usize),
    Check,
    Skip,
    Next,
    Prev,
    Goto(usize),
    Finish,
    Close,
    Match(String),
    Tile(String),
    Reset,
    Diagram(String),
    Hide(String),
    Speak(String),
    Ask(String),
    Chat,
    Stats,
    Mood(u8),
}

impl ReplCommand {
    /// Parse one line. Question and option numbers are 1-based.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let text = |name: &str| {
            if rest.is_empty() {
                Err(format!("usage: {} <text>", name))
            } else {
                Ok(rest.to_string())
            }
        };
        let number = |name: &str| {
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| n - 1)
                .ok_or_else(|| format!("usage: {} <number>", name))
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "topics" => Self::Topics,
            "study" => Self::Study(text("study")?),
            "guide" => Self::Guide,
            "home" => Self::Home,
            "quiz" => Self::Quiz((!rest.is_empty()).then(|| rest.to_string())),
            "pick" => Self::Pick(number("pick")?),
            "check" => Self::Check,
            "skip" => Self::Skip,
            "next" => Self::Next,
            "prev" => Self::Prev,
            "goto" => Self::Goto(number("goto")?),
            "finish" => Self::Finish,
            "close" => Self::Close,
            "match" => Self::Match(text("match")?),
            "tile" => Self::Tile(text("tile")?),
            "reset" => Self::Reset,
            "diagram" => Self::Diagram(text("diagram")?),
            "hide" => Self::Hide(text("hide")?),
            "speak" => Self::Speak(text("speak")?),
            "ask" => Self::Ask(text("ask")?),
            "chat" => Self::Chat,
            "stats" => Self::Stats,
            "mood" => Self::Mood(
                rest.parse::<u8>()
                    .map_err(|_| "usage: mood <1-5>".to_string())?,
            ),
            other => return Err(format!("unknown command: {} (try help)", other)),
        };
        Ok(Some(command))
    }
}

/// Terminal session state that is not part of the flow itself.
#[derive(Default)]
struct Session {
    board: Option<String>,
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let mut events = state.controller.events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(FlowEvent::Alert { message }) => eprintln!("! {}", message),
                Ok(FlowEvent::TileReverted { tiles, .. }) => {
                    eprintln!("  ({} and {} flipped back)", tiles[0], tiles[1])
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::default();

    stdout
        .write_all(b"MedRecap study companion. Type 'help' for commands.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match ReplCommand::parse(&line) {
            Ok(None) => continue,
            Ok(Some(ReplCommand::Quit)) => break,
            Ok(Some(command)) => execute(command, &state, &mut session)
                .await
                .unwrap_or_else(|e| format!("error: {}", e)),
            Err(usage) => usage,
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

async fn execute(
    command: ReplCommand,
    state: &AppState,
    session: &mut Session,
) -> Result<String, CommandError> {
    let output = match command {
        ReplCommand::Help | ReplCommand::Quit => HELP.to_string(),
        ReplCommand::Topics => commands::suggested_topics()
            .iter()
            .map(|t| format!("  - {}", t))
            .collect::<Vec<_>>()
            .join("\n"),
        ReplCommand::Study(topic) => {
            commands::select_topic(topic, state).await?;
            session.board = None;
            match commands::current_guide(state).await? {
                Some(guide) => render_guide(&guide),
                None => String::new(),
            }
        }
        ReplCommand::Guide => match commands::current_guide(state).await? {
            Some(guide) => render_guide(&guide),
            None => "no guide loaded".to_string(),
        },
        ReplCommand::Home => {
            commands::go_home(state).await?;
            "home".to_string()
        }
        ReplCommand::Quiz(difficulty) => {
            let quiz = commands::start_quiz(difficulty, state).await?;
            render_quiz(&quiz)
        }
        ReplCommand::Pick(option) => {
            let index = commands::quiz_snapshot(state).await?.progress.current_index;
            render_quiz(&commands::select_option(index, option, state).await?)
        }
        ReplCommand::Check => {
            let index = commands::quiz_snapshot(state).await?.progress.current_index;
            render_quiz(&commands::check_answer(index, state).await?)
        }
        ReplCommand::Skip => {
            let index = commands::quiz_snapshot(state).await?.progress.current_index;
            render_quiz(&commands::skip_question(index, state).await?)
        }
        ReplCommand::Next => render_quiz(&commands::next_question(state).await?.quiz),
        ReplCommand::Prev => render_quiz(&commands::previous_question(state).await?),
        ReplCommand::Goto(index) => render_quiz(&commands::jump_to_question(index, state).await?),
        ReplCommand::Finish => {
            let reward = commands::finish_quiz(state).await?;
            let mut out = format!("+{} points", reward.points_awarded);
            if reward.mastered {
                out.push_str(", topic mastered!");
            }
            out
        }
        ReplCommand::Close => {
            commands::close_quiz(state).await?;
            "quiz closed".to_string()
        }
        ReplCommand::Match(section) => {
            let board = commands::start_matching(section.clone(), state).await?;
            session.board = Some(section);
            render_board(&board)
        }
        ReplCommand::Tile(tile) => {
            let section = session.board.clone().ok_or_else(|| CommandError {
                message: "open a board with 'match <section>' first".to_string(),
            })?;
            let response = commands::select_tile(section, tile, state).await?;
            render_board(&response.board)
        }
        ReplCommand::Reset => {
            let section = session.board.clone().ok_or_else(|| CommandError {
                message: "no board open".to_string(),
            })?;
            render_board(&commands::reset_matching(section, state).await?)
        }
        ReplCommand::Diagram(section) => {
            let view = commands::section_diagram(section, state).await?;
            match view.image {
                Some(image) => format!("diagram ready ({} base64 chars)", image.len()),
                None => view.error.unwrap_or_else(|| "no diagram".to_string()),
            }
        }
        ReplCommand::Hide(section) => {
            let view = commands::toggle_diagram(section, state).await?;
            if view.hidden {
                "diagram hidden".to_string()
            } else {
                "diagram shown".to_string()
            }
        }
        ReplCommand::Speak(section) => {
            let clip = commands::read_aloud(section, state).await?;
            format!(
                "{} ms of {} Hz audio",
                clip.duration_ms(),
                clip.sample_rate
            )
        }
        ReplCommand::Ask(message) => commands::send_chat_message(message, state)
            .await?
            .iter()
            .map(|m| {
                let mut out = m.text.clone();
                for citation in &m.citations {
                    let _ = write!(out, "\n  [{}] {}", citation.title, citation.uri);
                }
                out
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ReplCommand::Chat => commands::chat_transcript(state)
            .await?
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.text))
            .collect::<Vec<_>>()
            .join("\n"),
        ReplCommand::Stats => {
            let stats = commands::get_stats(state).await?;
            format!(
                "points {} | streak {} days | mastered {} | mood {}",
                stats.points,
                stats.streak_days,
                stats.topics_mastered,
                stats
                    .mood_score
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string())
            )
        }
        ReplCommand::Mood(score) => {
            commands::record_mood(score, state).await?;
            "mood saved".to_string()
        }
    };
    Ok(output)
}

fn render_guide(guide: &StudyGuide) -> String {
    let mut out = format!("# {}\n{}\n", guide.topic, guide.overview);
    for section in &guide.sections {
        let _ = write!(
            out,
            "\n## {}\n{}\nClinical: {}\n",
            section.title, section.foundational, section.clinical
        );
        for point in &section.key_points {
            let _ = writeln!(out, "  * {}", point);
        }
        for mnemonic in &section.mnemonics {
            let _ = writeln!(out, "  mnemonic: {}", mnemonic);
        }
    }
    if !guide.related_topics.is_empty() {
        let _ = write!(out, "\nRelated: {}", guide.related_topics.join(", "));
    }
    out
}

fn render_quiz(quiz: &QuizView) -> String {
    let progress = &quiz.progress;
    if progress.showing_results {
        return format!(
            "results: {} correct, {} incorrect of {} (type 'finish')",
            progress.correct, progress.incorrect, progress.total
        );
    }

    let navigator: String = quiz
        .states
        .iter()
        .map(|s| match s.status {
            QuestionStatus::Unanswered => '.',
            QuestionStatus::Skipped => '?',
            QuestionStatus::Correct => '+',
            QuestionStatus::Incorrect => 'x',
        })
        .collect();

    let Some(question) = &quiz.question else {
        return "no questions".to_string();
    };
    let state = quiz.current_state().copied().unwrap_or_default();

    let mut out = format!(
        "[{}] question {}/{}\n{}\n",
        navigator,
        progress.current_index + 1,
        progress.total,
        question.question
    );
    for (i, option) in question.options.iter().enumerate() {
        let marker = if state.selected_option == Some(i) { '>' } else { ' ' };
        let _ = writeln!(out, "{} {}. {}", marker, i + 1, option);
    }
    if state.status.is_graded() {
        let verdict = if state.status == QuestionStatus::Correct {
            "Correct."
        } else {
            "Incorrect."
        };
        let _ = write!(out, "{} {}", verdict, question.explanation);
    }
    out
}

fn render_board(board: &BoardView) -> String {
    let mut out = format!(
        "{}: {}/{} matched\n",
        board.section, board.matched_pairs, board.total_pairs
    );
    for tile in &board.tiles {
        let marker = match tile.status {
            TileStatus::Unselected => ' ',
            TileStatus::Selected => '>',
            TileStatus::Matched => '=',
            TileStatus::Mismatched => '!',
        };
        let _ = writeln!(out, "{} {:<8} {}", marker, tile.id.to_string(), tile.text);
    }
    if board.complete && board.total_pairs > 0 {
        out.push_str("All pairs matched!");
    }
    out
}
