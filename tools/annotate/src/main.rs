//! Command-line front end for the annotation core.
//!
//! Every subcommand is a thin wrapper: it resolves configuration, calls one
//! core operation and prints the outcome as JSON on stdout. Logs go to stderr.

use annot_core::annotation::model::{Intensity, Label};
use annot_core::config::AnnotationConfig;
use annot_core::eligibility::assignment::{AssignmentStrategy, SessionCursor};
use annot_core::error::CoreError;
use annot_core::export::DEFAULT_EXPORT_FILE_NAME;
use annot_core::identity::AnnotatorId;
use annot_core::service::AnnotationService;
use annot_core::session::AnnotatorSession;
use annot_core::submission::validator::{Accepted, Submission};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Exit code for declined actions (rejection, forbidden, missing identity).
const EXIT_DECLINED: u8 = 3;

#[derive(Parser)]
#[command(name = "annotate")]
#[command(about = "Assign comments to annotators and collect abuse labels", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Comment dataset (CSV with a `text` column)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Shared annotation log
    #[arg(long = "log", global = true)]
    log_file: Option<PathBuf>,

    /// Hash-chained decision journal
    #[arg(long, global = true)]
    journal: Option<PathBuf>,

    /// Maximum annotations per comment
    #[arg(long, global = true)]
    quota: Option<usize>,

    /// Identity allowed to export the log
    #[arg(long, global = true)]
    admin: Option<String>,

    /// Assignment strategy: stateless-first | cursor
    #[arg(long, global = true)]
    strategy: Option<AssignmentStrategy>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next comment for an annotator
    Next {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,

        /// Session cursor returned by the previous call (cursor strategy)
        #[arg(long, default_value_t = 0)]
        cursor: usize,
    },

    /// Submit one label
    Submit {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,

        #[arg(long)]
        comment_id: String,

        /// abusive | non-abusive
        #[arg(long)]
        label: Label,

        /// faible|moyenne|élevée (or low|medium|high); abusive only
        #[arg(long)]
        intensity: Option<Intensity>,

        /// Cursor the comment was assigned at; the advanced one is printed
        #[arg(long, default_value_t = 0)]
        cursor: usize,
    },

    /// Interactive labeling loop on stdin/stdout
    Label {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,
    },

    /// Annotator progress
    Status {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,
    },

    /// Write the full log as CSV (privileged identity only)
    Export {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,

        #[arg(long, default_value = DEFAULT_EXPORT_FILE_NAME)]
        out: PathBuf,
    },

    /// Progress across all comments (privileged identity only)
    Summary {
        #[arg(long, env = "ANNOT_EMAIL", default_value = "")]
        email: String,
    },

    /// Verify log invariants (and the journal chain, if configured)
    Check,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = build_config(&cli)?;
    debug!(?cfg, "configuration resolved");
    let service = AnnotationService::open(&cfg)
        .with_context(|| format!("loading dataset {}", cfg.data_file.display()))?;

    match run(&service, cli.command) {
        Ok(code) => Ok(code),
        Err(e) => match e.downcast_ref::<CoreError>() {
            Some(core) if core.is_recoverable() => {
                print_json(&declined(core));
                Ok(ExitCode::from(EXIT_DECLINED))
            }
            _ => Err(e),
        },
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<AnnotationConfig> {
    let mut cfg = AnnotationConfig::from_env()?;
    if let Some(p) = &cli.data {
        cfg.data_file = p.clone();
    }
    if let Some(p) = &cli.log_file {
        cfg.log_file = p.clone();
    }
    if let Some(p) = &cli.journal {
        cfg.journal_file = Some(p.clone());
    }
    if let Some(q) = cli.quota {
        cfg.quota = q;
    }
    if let Some(a) = &cli.admin {
        cfg.admin_email = Some(a.clone());
    }
    if let Some(s) = cli.strategy {
        cfg.strategy = s;
    }
    cfg.policy()?;
    Ok(cfg)
}

fn run(service: &AnnotationService, command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Next { email, cursor } => {
            let who = AnnotatorId::parse(&email)?;
            let (pick, cursor) = service.next_for(&who, SessionCursor { position: cursor })?;
            match pick {
                Some(c) => print_json(&json!({
                    "status": "ASSIGNED",
                    "comment_id": c.comment_id,
                    "text": c.text,
                    "cursor": cursor.position,
                })),
                None => print_json(&json!({ "status": "DONE" })),
            }
        }
        Commands::Submit {
            email,
            comment_id,
            label,
            intensity,
            cursor,
        } => {
            let who = AnnotatorId::parse(&email)?;
            let accepted = service.submit(
                &who,
                &Submission {
                    comment_id,
                    label,
                    intensity,
                },
            )?;
            let next = service.advance(SessionCursor { position: cursor });
            print_json(&accepted_payload(&accepted, next));
        }
        Commands::Label { email } => {
            let mut session = AnnotatorSession::begin(&email)?;
            let stdin = std::io::stdin();
            label_loop(service, &mut session, &mut stdin.lock(), &mut std::io::stdout())?;
        }
        Commands::Status { email } => {
            let who = AnnotatorId::parse(&email)?;
            print_json(&serde_json::to_value(service.progress(&who)?)?);
        }
        Commands::Export { email, out } => {
            let who = AnnotatorId::parse(&email)?;
            let csv = service.export_csv(&who)?;
            std::fs::write(&out, csv.as_bytes())
                .with_context(|| format!("writing {}", out.display()))?;
            print_json(&json!({
                "status": "EXPORTED",
                "path": out.to_string_lossy(),
                "bytes": csv.len(),
            }));
        }
        Commands::Summary { email } => {
            let who = AnnotatorId::parse(&email)?;
            print_json(&serde_json::to_value(service.summary(&who)?)?);
        }
        Commands::Check => {
            let summary = service.check()?;
            print_json(&serde_json::to_value(&summary)?);
            if !summary.passed() {
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn accepted_payload(accepted: &Accepted, cursor: SessionCursor) -> serde_json::Value {
    json!({
        "status": "ACCEPTED",
        "comment_id": accepted.annotation.comment_id,
        "comment_count": accepted.comment_count,
        "cursor": cursor.position,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Label(Label, Option<Intensity>),
    Skip,
    Quit,
    Invalid,
}

fn parse_choice(line: &str) -> Choice {
    let mut parts = line.split_whitespace().peekable();
    let mut head = parts.next().unwrap_or("").to_lowercase();
    let second = parts.peek().map(|s| s.to_lowercase());
    if head == "non" && second.as_deref() == Some("abusive") {
        parts.next();
        head = "non abusive".to_string();
    }
    let intensity = parts.next().and_then(|s| match s.to_lowercase().as_str() {
        "f" | "l" => Some(Intensity::Low),
        "m" => Some(Intensity::Medium),
        "e" | "h" => Some(Intensity::High),
        other => other.parse().ok(),
    });
    match head.as_str() {
        "a" | "abusive" => match intensity {
            Some(i) => Choice::Label(Label::Abusive, Some(i)),
            None => Choice::Invalid,
        },
        "n" | "non abusive" | "non-abusive" | "non_abusive" => {
            Choice::Label(Label::NonAbusive, None)
        }
        "s" | "skip" => Choice::Skip,
        "q" | "quit" => Choice::Quit,
        _ => Choice::Invalid,
    }
}

fn label_loop<R: BufRead, W: Write>(
    service: &AnnotationService,
    session: &mut AnnotatorSession,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()> {
    loop {
        let Some(comment) = session.next(service)? else {
            writeln!(out, "Nothing left to annotate for {}.", session.annotator())?;
            return Ok(());
        };
        let comment_id = comment.comment_id.clone();
        writeln!(out, "\n[{}]\n{}", comment_id, comment.text)?;
        write!(
            out,
            "a <f|m|e> = abusive + intensity, n = non abusive, s = skip, q = quit > "
        )?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        match parse_choice(&line) {
            Choice::Quit => return Ok(()),
            Choice::Skip => session.skip(service),
            Choice::Invalid => writeln!(out, "Unrecognised answer, try again.")?,
            Choice::Label(label, intensity) => {
                let submission = Submission {
                    comment_id,
                    label,
                    intensity,
                };
                match session.submit(service, &submission) {
                    Ok(accepted) => writeln!(
                        out,
                        "Saved ({} of {}).",
                        accepted.comment_count,
                        service.policy().quota()
                    )?,
                    Err(CoreError::Rejected(reason)) => {
                        writeln!(out, "Not saved: {}. Fetching another comment.", reason)?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

fn declined(e: &CoreError) -> serde_json::Value {
    let reason = match e {
        CoreError::Rejected(r) => r.code(),
        CoreError::Forbidden => "FORBIDDEN",
        CoreError::NoIdentity => "NO_IDENTITY",
        _ => "ERROR",
    };
    json!({ "status": "DECLINED", "reason": reason, "message": e.to_string() })
}

fn print_json(v: &serde_json::Value) {
    println!("{}", v);
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_core::annotation::log::AnnotationLog;
    use annot_core::comments::model::Comment;
    use annot_core::comments::store::CommentStore;
    use annot_core::policy::types::AnnotationPolicy;

    #[test]
    fn choices_parse() {
        assert_eq!(
            parse_choice("a e\n"),
            Choice::Label(Label::Abusive, Some(Intensity::High))
        );
        assert_eq!(
            parse_choice("abusive moyenne"),
            Choice::Label(Label::Abusive, Some(Intensity::Medium))
        );
        assert_eq!(parse_choice("a"), Choice::Invalid);
        assert_eq!(parse_choice("N"), Choice::Label(Label::NonAbusive, None));
        assert_eq!(
            parse_choice("non abusive\n"),
            Choice::Label(Label::NonAbusive, None)
        );
        assert_eq!(
            parse_choice("Non-Abusive"),
            Choice::Label(Label::NonAbusive, None)
        );
        assert_eq!(parse_choice("non sense"), Choice::Invalid);
        assert_eq!(parse_choice("s"), Choice::Skip);
        assert_eq!(parse_choice("q"), Choice::Quit);
        assert_eq!(parse_choice(""), Choice::Invalid);
    }

    #[test]
    fn label_loop_drains_until_nothing_left() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnnotationService::new(
            CommentStore::from_comments(vec![
                Comment::from_text("first"),
                Comment::from_text("second"),
            ]),
            AnnotationLog::open_or_create(dir.path().join("a.csv")).unwrap(),
            AnnotationPolicy::new(3, None).unwrap(),
            AssignmentStrategy::StatelessFirst,
        );
        let mut session = AnnotatorSession::begin("tty@x").unwrap();
        let mut input = "bogus\nn\na f\n".as_bytes();
        let mut out = Vec::new();
        label_loop(&service, &mut session, &mut input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unrecognised answer"));
        assert!(text.contains("Nothing left to annotate for tty@x."));
        let snap = service.log().snapshot().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.annotations()[1].intensity, Some(Intensity::Low));
    }

    #[test]
    fn accepted_payload_carries_the_advanced_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnnotationService::new(
            CommentStore::from_comments(vec![Comment::from_text("only")]),
            AnnotationLog::open_or_create(dir.path().join("a.csv")).unwrap(),
            AnnotationPolicy::new(3, None).unwrap(),
            AssignmentStrategy::Cursor,
        );
        let cid = service.store().comments()[0].comment_id.clone();
        let accepted = service
            .submit(
                &AnnotatorId::parse("c@x").unwrap(),
                &Submission {
                    comment_id: cid.clone(),
                    label: Label::NonAbusive,
                    intensity: None,
                },
            )
            .unwrap();
        let next = service.advance(SessionCursor { position: 4 });
        let v = accepted_payload(&accepted, next);
        assert_eq!(v["status"], "ACCEPTED");
        assert_eq!(v["comment_id"], cid.as_str());
        assert_eq!(v["cursor"], 5);
    }

    #[test]
    fn declined_maps_reason_codes() {
        let v = declined(&CoreError::Forbidden);
        assert_eq!(v["reason"], "FORBIDDEN");
        let v = declined(&CoreError::Rejected(
            annot_core::error::Rejection::QuotaExceeded,
        ));
        assert_eq!(v["reason"], "QUOTA_EXCEEDED");
    }
}
