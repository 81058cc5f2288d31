mod event;

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use tracing_subscriber::EnvFilter;

use event::{AppEvent, EventHandler};
use handtype::app::Trainer;
use handtype::config::Config;
use handtype::engine::scoring;
use handtype::session::practice::PracticeSource;
use handtype::session::{HandMode, TestMode, TestStatus};
use handtype::store::json_store::JsonStore;
use handtype::store::schema::ExportData;

#[derive(Parser)]
#[command(
    name = "handtype",
    version,
    about = "Terminal typing trainer with hand-aware drills and problem-word practice"
)]
struct Cli {
    #[arg(short, long, value_enum, help = "Run length unit")]
    mode: Option<ModeArg>,

    #[arg(short = 'H', long, value_enum, help = "Which hand the words exercise")]
    hand: Option<HandArg>,

    #[arg(short, long, help = "Seconds (time mode) or words (words mode)")]
    duration: Option<u32>,

    #[arg(long, help = "Directory for history and problem words")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a practice run instead of a normal test
    Practice {
        #[arg(value_enum, default_value = "problem-words")]
        source: PracticeArg,
        #[arg(long, help = "Words to practice, for the custom source")]
        text: Option<String>,
    },
    /// Print lifetime statistics and the worst problem words
    Stats,
    /// Write all data to a JSON file
    Export { path: PathBuf },
    /// Replace all data with a previously exported file
    Import { path: PathBuf },
    /// Delete history and problem words
    ResetData,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Time,
    Words,
}

#[derive(Clone, Copy, ValueEnum)]
enum HandArg {
    Both,
    Left,
    Right,
    Alternating,
}

#[derive(Clone, Copy, ValueEnum)]
enum PracticeArg {
    ProblemWords,
    LeftHand,
    RightHand,
    Custom,
}

impl From<ModeArg> for TestMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Time => TestMode::Time,
            ModeArg::Words => TestMode::Words,
        }
    }
}

impl From<HandArg> for HandMode {
    fn from(arg: HandArg) -> Self {
        match arg {
            HandArg::Both => HandMode::Both,
            HandArg::Left => HandMode::Left,
            HandArg::Right => HandMode::Right,
            HandArg::Alternating => HandMode::Alternating,
        }
    }
}

fn practice_source(arg: PracticeArg, text: Option<String>) -> PracticeSource {
    match arg {
        PracticeArg::ProblemWords => PracticeSource::ProblemWords,
        PracticeArg::LeftHand => PracticeSource::LeftHand,
        PracticeArg::RightHand => PracticeSource::RightHand,
        PracticeArg::Custom => PracticeSource::Custom(text.unwrap_or_default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    });
    if let Some(mode) = cli.mode {
        config.test_mode = mode.into();
    }
    if let Some(hand) = cli.hand {
        config.hand_mode = hand.into();
    }
    if let Some(duration) = cli.duration {
        config.duration = duration;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    config.validate();

    let practice = match cli.command {
        Some(Command::Stats) => return print_stats(&Trainer::new(config)?),
        Some(Command::Export { path }) => return export(&config, &path),
        Some(Command::Import { path }) => return import(&config, &path),
        Some(Command::ResetData) => {
            let mut trainer = Trainer::new(config)?;
            trainer.reset_all_data();
            trainer.flush()?;
            println!("All history and problem words deleted.");
            return Ok(());
        }
        Some(Command::Practice { source, text }) => Some(practice_source(source, text)),
        None => None,
    };

    let mut trainer = Trainer::new(config)?;
    match &practice {
        Some(source) => {
            if !trainer.start_practice(source) {
                println!("Nothing to practice for {}.", source.label());
                return Ok(());
            }
        }
        None => trainer.start_test(),
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let events = EventHandler::new(Duration::from_secs(1));
    let result = run(&mut stdout, &mut trainer, &events, practice.as_ref());

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    trainer.flush()?;
    Ok(())
}

fn run(
    out: &mut Stdout,
    trainer: &mut Trainer,
    events: &EventHandler,
    practice: Option<&PracticeSource>,
) -> Result<()> {
    loop {
        render(out, trainer)?;
        match events.next()? {
            AppEvent::Tick => trainer.tick(),
            AppEvent::Key(key) => {
                if !handle_key(trainer, key, practice) {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns false when the user asked to quit.
fn handle_key(trainer: &mut Trainer, key: KeyEvent, practice: Option<&PracticeSource>) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return false;
    }
    if !trainer.test.is_running() && practice.is_none() && change_setting(trainer, key.code) {
        return true;
    }
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Tab => match practice {
            Some(source) => {
                trainer.start_practice(source);
            }
            None => trainer.start_test(),
        },
        KeyCode::Backspace => trainer.backspace(),
        KeyCode::Char(' ') => trainer.space(),
        KeyCode::Char(ch) => trainer.type_char(ch),
        _ => {}
    }
    true
}

/// Between runs: m toggles the mode, h cycles the hand mode, +/- adjust the
/// duration. Returns false for any other key.
fn change_setting(trainer: &mut Trainer, code: KeyCode) -> bool {
    let step = match trainer.config.test_mode {
        TestMode::Time => 15,
        TestMode::Words => 10,
    };
    match code {
        KeyCode::Char('m') => trainer.set_test_mode(match trainer.config.test_mode {
            TestMode::Time => TestMode::Words,
            TestMode::Words => TestMode::Time,
        }),
        KeyCode::Char('h') => trainer.set_hand_mode(match trainer.config.hand_mode {
            HandMode::Both => HandMode::Left,
            HandMode::Left => HandMode::Right,
            HandMode::Right => HandMode::Alternating,
            HandMode::Alternating => HandMode::Both,
        }),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            trainer.set_duration(trainer.config.duration.saturating_add(step))
        }
        KeyCode::Char('-') => trainer.set_duration(trainer.config.duration.saturating_sub(step)),
        _ => return false,
    }
    true
}

fn settings_line(trainer: &Trainer) -> String {
    let unit = match trainer.config.test_mode {
        TestMode::Time => "s",
        TestMode::Words => " words",
    };
    format!(
        "{} {}{}  hand {}   m: mode  h: hand  +/-: length\r\n",
        trainer.config.test_mode.as_str(),
        trainer.config.duration,
        unit,
        trainer.config.hand_mode.as_str()
    )
}

fn render(out: &mut Stdout, trainer: &Trainer) -> Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    let test = &trainer.test;

    match test.status() {
        TestStatus::Finished => {
            if let Some(session) = trainer.last_session() {
                let r = &session.results;
                queue!(
                    out,
                    Print(format!(
                        "wpm {}  raw {}  acc {}%  consistency {}%  burst {}\r\n",
                        r.wpm,
                        r.raw_wpm,
                        r.accuracy,
                        r.consistency,
                        session.burst_wpm()
                    )),
                    Print(format!(
                        "words {}/{}  chars {}/{}\r\n",
                        r.correct_words, r.total_words, r.correct_chars, r.total_chars
                    )),
                )?;
                let slowest = session
                    .words
                    .iter()
                    .map(|w| (w, scoring::word_performance(w)))
                    .max_by_key(|(_, perf)| perf.time_ms);
                if let Some((word, perf)) = slowest {
                    queue!(
                        out,
                        Print(format!(
                            "slowest: {} ({}ms, {} wpm, {}%)\r\n",
                            word.expected, perf.time_ms, perf.wpm, perf.accuracy
                        ))
                    )?;
                }
                if !r.problem_words.is_empty() {
                    queue!(
                        out,
                        Print(format!("problem words: {}\r\n", r.problem_words.join(" ")))
                    )?;
                }
                if session.is_practice {
                    queue!(out, Print("practice run, not counted in lifetime stats\r\n"))?;
                }
            }
            queue!(out, Print(format!("sync: {}\r\n", trainer.sync_status())))?;
            if !trainer.test.live.is_practice {
                queue!(out, Print(settings_line(trainer)))?;
            }
            queue!(out, Print("\r\ntab: again   esc: quit\r\n"))?;
        }
        TestStatus::Idle => {
            queue!(out, Print(settings_line(trainer)), Print("tab: start   esc: quit\r\n"))?;
        }
        TestStatus::Running => {
            let header = match test.live.time_remaining {
                Some(secs) => format!("{secs}s  {} wpm\r\n\r\n", test.live_wpm()),
                None => format!(
                    "{}/{}  {} wpm\r\n\r\n",
                    test.live.current_word_index,
                    test.live.words.len(),
                    test.live_wpm()
                ),
            };
            queue!(out, Print(header))?;

            let start = test.live.current_word_index.saturating_sub(3);
            for (i, word) in test.live.words.iter().enumerate().skip(start).take(12) {
                let color = match i.cmp(&test.live.current_word_index) {
                    std::cmp::Ordering::Less => {
                        let correct = test.live.word_results.get(i).is_some_and(|w| w.correct);
                        if correct { Color::Green } else { Color::Red }
                    }
                    std::cmp::Ordering::Equal => Color::Yellow,
                    std::cmp::Ordering::Greater => Color::Grey,
                };
                queue!(out, SetForegroundColor(color), Print(word), Print(" "))?;
            }
            queue!(
                out,
                ResetColor,
                Print(format!("\r\n\r\n> {}", test.live.current_input))
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

fn print_stats(trainer: &Trainer) -> Result<()> {
    let stats = trainer.lifetime_stats();
    println!("tests        {}", stats.total_tests);
    println!("time typing  {:.0}s", stats.total_time_secs);
    println!("avg wpm      {}", stats.avg_wpm);
    println!("best wpm     {}", stats.best_wpm);
    println!("avg accuracy {}%", stats.avg_accuracy);
    println!("word acc     {}%", stats.word_accuracy);
    println!("trend        {:?}", stats.recent_trend);
    for mode in &stats.by_hand_mode {
        println!(
            "  {:<12} {:>3} tests  {:>3} wpm  {:>3}%",
            mode.hand_mode.as_str(),
            mode.tests,
            mode.avg_wpm,
            mode.avg_accuracy
        );
    }

    let worst = trainer.problem_words.ranked();
    if !worst.is_empty() {
        println!("\nproblem words");
        for word in worst.iter().take(10) {
            let tags: Vec<&str> = word.tags.iter().map(|t| t.as_str()).collect();
            println!(
                "  {:<16} severity {:>3}  typo {:>3.0}%  {:>5.0}ms  {}",
                word.word,
                word.severity_score,
                word.typo_rate * 100.0,
                word.avg_time,
                tags.join(",")
            );
        }
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<JsonStore> {
    match &config.data_dir {
        Some(dir) => Ok(JsonStore::with_base_dir(dir.clone())?),
        None => JsonStore::new(),
    }
}

fn export(config: &Config, path: &PathBuf) -> Result<()> {
    let data = open_store(config)?.export_all(config);
    let json = serde_json::to_string_pretty(&data)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn import(config: &Config, path: &PathBuf) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data: ExportData = serde_json::from_str(&content)?;
    open_store(config)?.import_all(&data)?;
    println!("Imported from {}", path.display());
    Ok(())
}
