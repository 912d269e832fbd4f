//! moodvoice CLI
//!
//! Usage:
//!   moodvoice --text "bugün çok yorgunum"      # One-shot analysis
//!   moodvoice --interactive                    # Simulated live check-in
//!   moodvoice --serve                          # HTTP API server
//!   moodvoice --text "text" --json             # JSON output

use clap::Parser;
use colored::{ColoredString, Colorize};
use log::{error, info};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use moodvoice::config::EstimatorConfig;
use moodvoice::core::{run_server, CheckinSlot, CrisisDetector, IncrementalAnalyzer};
use moodvoice::types::{AnalysisResult, CrisisResult, SessionEvent, TranscriptChunk};
use moodvoice::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "moodvoice",
    version = VERSION,
    about = "Real-time mood estimation from a spoken check-in transcript",
    long_about = "moodvoice turns a growing speech transcript into a live mood estimate.\n\n\
                  Each new stretch of text is scored for mood, energy and anxiety cues,\n\
                  smoothed into a running state and mapped onto a valence/arousal plane.\n\
                  Crisis language is flagged once per session.\n\n\
                  Modes:\n  \
                  --text         One-shot analysis of a transcript\n  \
                  --interactive  Each line extends the transcript; 'done' saves, 'cancel' discards\n  \
                  --serve        HTTP + WebSocket API server"
)]
struct Args {
    /// Transcript to analyze (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Simulated live check-in from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file (defaults when absent)
    #[arg(short, long)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show debug logging and per-chunk gate decisions
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => match EstimatorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("config rejected: {}", e);
                eprintln!("Config error: {}", e);
                std::process::exit(2);
            }
        },
        None => EstimatorConfig::default(),
    };

    if args.serve {
        run_serve(&args, &config).await;
        return;
    }

    let analyzer = match CrisisDetector::from_patterns(&config.crisis.patterns) {
        Ok(crisis) => IncrementalAnalyzer::with_config(&config, crisis),
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    if let Some(ref text) = args.text {
        run_single(text, &analyzer, &args);
    } else {
        if !args.interactive {
            info!("no mode selected, defaulting to interactive");
        }
        run_interactive(analyzer, &config, &args);
    }
}

/// One-shot analysis of a whole transcript
fn run_single(text: &str, analyzer: &IncrementalAnalyzer, args: &Args) {
    let (_, result) = analyzer.analyze_transcript(text);
    let crisis = analyzer.detect_crisis(text);

    if args.json {
        #[derive(Serialize)]
        struct SingleOutput<'a> {
            result: &'a AnalysisResult,
            crisis: &'a CrisisResult,
        }
        print_json(&SingleOutput { result: &result, crisis: &crisis });
        return;
    }

    print_result(&result, args.verbose);
    if crisis.flagged {
        print_crisis(&crisis);
    }
}

/// Simulated live check-in: every line extends the transcript like a new
/// recognizer hypothesis. A virtual clock steps past the debounce window per
/// line so each line is analyzed once.
fn run_interactive(analyzer: IncrementalAnalyzer, config: &EstimatorConfig, args: &Args) {
    let mut slot = CheckinSlot::new(Arc::new(analyzer), config.gate.clone());
    let step_ms = config.gate.debounce_ms + 1;

    print_header();
    println!("Speak by typing. Each line extends the transcript.");
    println!("Commands: 'done' saves the check-in, 'cancel' discards it, 'quit' exits.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut clock_ms = 0u64;
    let mut transcript = String::new();

    loop {
        if !slot.is_active() {
            transcript.clear();
            match slot.begin() {
                Ok(session) => info!("interactive check-in {}", session.id()),
                Err(e) => {
                    eprintln!("{}", e);
                    return;
                }
            }
        }
        let id = match slot.active() {
            Some(session) => session.id().to_string(),
            None => return,
        };

        print!("{} ", "🎙 >".bold());
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            let _ = slot.cancel(&id);
            println!("\nBye.");
            break;
        }
        if line.eq_ignore_ascii_case("cancel") {
            let _ = slot.cancel(&id);
            println!("{}", "Check-in discarded.".dimmed());
            continue;
        }
        if line.eq_ignore_ascii_case("done") {
            match slot.finalize(&id) {
                Ok(finalized) => {
                    if args.json {
                        print_json(&finalized);
                    } else {
                        if let Some(crisis) = &finalized.late_crisis {
                            print_crisis(crisis);
                        }
                        print_result(&finalized.result, args.verbose);
                        let record = &finalized.record;
                        println!(
                            "{} mood={}% energy={} anxiety={} triggers={:?}",
                            "Saved:".green().bold(),
                            record.mood_score,
                            record.energy_level,
                            record.anxiety_level,
                            record.triggers
                        );
                    }
                }
                Err(e) => println!("{} {}", "Not saved:".red().bold(), e),
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(line);

        let session = match slot.session_mut(&id) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        let mut events = session.on_transcript(&TranscriptChunk::partial(transcript.clone(), clock_ms));
        clock_ms += step_ms;
        events.extend(session.tick(clock_ms));

        for event in &events {
            print_event(event, args);
        }
    }
}

fn print_event(event: &SessionEvent, args: &Args) {
    if args.json {
        print_json(event);
        return;
    }
    match event {
        SessionEvent::Update { result } => print_result(result, args.verbose),
        SessionEvent::Held { result, reason } => {
            if args.verbose {
                println!("{} {} ({})", "held".yellow(), result.summary(), reason.code());
            } else {
                println!("{}", format!("… {}", reason.description()).as_str().dimmed());
            }
        }
        SessionEvent::Skipped { reason } => {
            if args.verbose {
                println!("{}", format!("skipped: {} {}", reason.code(), reason.description()).as_str().dimmed());
            }
        }
        SessionEvent::Crisis { result } => print_crisis(result),
        SessionEvent::SpeechFailed { message } => println!("{} {}", "Speech failed:".red(), message),
    }
}

fn mood_color(result: &AnalysisResult, text: String) -> ColoredString {
    match result.mood_score {
        7..=10 => text.as_str().green(),
        5..=6 => text.as_str().yellow(),
        _ => text.as_str().red(),
    }
}

fn print_result(result: &AnalysisResult, verbose: bool) {
    let line = format!(
        "mood {}/10 · energy {}/10 · anxiety {}/10 · {}",
        result.mood_score, result.energy_level, result.anxiety_level, result.dominant_emotion
    );
    println!("{}", mood_color(result, line).bold());
    if verbose {
        println!("{}", format!("  {}", result.summary()).as_str().dimmed());
        if !result.triggers.is_empty() {
            println!("{}", format!("  triggers: {:?}", result.triggers).as_str().dimmed());
        }
    }
}

fn print_crisis(crisis: &CrisisResult) {
    println!(
        "{}",
        "⚠ It sounds like you may be going through something very hard. You don't have to face it alone; please reach out to someone you trust or a local crisis line."
            .red()
            .bold()
    );
    if !crisis.categories.is_empty() {
        println!("{}", format!("  categories: {:?}", crisis.categories).as_str().dimmed());
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("JSON encode failed: {}", e),
    }
}

fn print_header() {
    println!("{}", format!("moodvoice v{} - live check-in", VERSION).bold());
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: &EstimatorConfig) {
    print_header();
    if let Err(e) = run_server(&args.addr, config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
