use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use colloscope::export::{DEFAULT_OUTPUT, per_group_jobs};
use colloscope::{
    ColleGroup, ExportOptions, SourcePaths, StaticGroup, Student, TermCalendar, TermConfig,
    export, export_batch, load_source_tables, load_term_config_from_json,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

const STATIC_GROUP_HELP: &str = "Groupe incorrect. Valeurs possibles : A, B ou C";
const COLLE_GROUP_HELP: &str = "Groupe de colle incorrect. Valeurs possibles : 1 à 18";
const ALL_WITH_GROUP: &str =
    "L'option --all génère les groupes A, B et C : n'indiquez pas de groupe";
const ALL_WITHOUT_SCHEDULE: &str = "Les options --all et --no-schedule sont incompatibles";

/// Generates an iCalendar file from the weekly timetables and the colle roster.
#[derive(Parser)]
#[command(name = "colloscope", version)]
struct Cli {
    /// Group letter (A, B or C) and/or colle group number (1 to 18).
    groups: Vec<String>,

    /// Directory holding 0.csv, 1.csv, 2.csv and collometre.csv.
    #[arg(short, long, default_value = ".")]
    input_dir: PathBuf,

    /// Output .ics path.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// JSON term configuration overriding the built-in term.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave colles out.
    #[arg(long)]
    no_colles: bool,

    /// Leave the weekly timetable out.
    #[arg(long)]
    no_schedule: bool,

    /// Do not attach rooms to events.
    #[arg(long)]
    no_rooms: bool,

    /// Write one calendar per group (A, B and C).
    #[arg(long)]
    all: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Maps the `-v` count to a default filter; `RUST_LOG` wins when set.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("colloscope={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

enum Token {
    Group(StaticGroup),
    Colle(ColleGroup),
}

fn classify(token: &str) -> Result<Token, &'static str> {
    if let Ok(group) = token.parse::<StaticGroup>() {
        return Ok(Token::Group(group));
    }
    if token.trim().chars().all(|c| c.is_ascii_digit()) && !token.trim().is_empty() {
        return token
            .parse::<ColleGroup>()
            .map(Token::Colle)
            .map_err(|_| COLLE_GROUP_HELP);
    }
    Err(STATIC_GROUP_HELP)
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Reads the student from the command line, or asks for it.
fn resolve_student(cli: &Cli) -> Result<Student, &'static str> {
    if cli.all && cli.no_schedule {
        return Err(ALL_WITHOUT_SCHEDULE);
    }
    let mut student = Student::default();
    if cli.groups.is_empty() {
        if !cli.all {
            let answer = prompt("Veuillez indiquer votre groupe: ").map_err(|_| STATIC_GROUP_HELP)?;
            student.group = Some(answer.parse().map_err(|_| STATIC_GROUP_HELP)?);
        }
        if !cli.no_colles {
            let answer = prompt("Veuillez indiquer votre groupe de colle (vide pour ignorer): ")
                .map_err(|_| COLLE_GROUP_HELP)?;
            if !answer.is_empty() {
                student.colle_group = Some(answer.parse().map_err(|_| COLLE_GROUP_HELP)?);
            }
        }
        return Ok(student);
    }

    for token in &cli.groups {
        match classify(token)? {
            Token::Group(_) if cli.all => return Err(ALL_WITH_GROUP),
            Token::Group(group) => student.group = Some(group),
            Token::Colle(colle) => student.colle_group = Some(colle),
        }
    }
    Ok(student)
}

fn load_term(cli: &Cli) -> Result<TermCalendar> {
    let config = match &cli.config {
        Some(path) => load_term_config_from_json(path)
            .with_context(|| format!("lecture de {}", path.display()))?,
        None => TermConfig::default(),
    };
    TermCalendar::from_config(&config).context("configuration du trimestre invalide")
}

fn run(cli: &Cli, student: Student) -> Result<()> {
    let options = ExportOptions {
        include_colles: !cli.no_colles,
        include_schedule: !cli.no_schedule,
        include_room_planning: !cli.no_rooms,
        output_path: cli.output.clone(),
    };
    if !cli.all && student.group.is_none() && student.colle_group.is_none() {
        bail!("aucun groupe indiqué");
    }

    let term = load_term(cli)?;
    let with_roster = options.include_colles && student.colle_group.is_some();
    let sources = load_source_tables(
        &SourcePaths::in_dir(&cli.input_dir),
        term.slot_table(),
        with_roster,
    )
    .with_context(|| format!("lecture des tableaux dans {}", cli.input_dir.display()))?;
    let stamp = Utc::now();

    if cli.all {
        println!("Génération des calendriers pour les groupes A, B et C...");
        let jobs = per_group_jobs(&options, student.colle_group);
        for result in export_batch(&sources, &term, &jobs, stamp) {
            let summary = result?;
            println!(
                "Calendrier enregistré dans {} ({} cours, {} colles)",
                summary.output_path.display(),
                summary.lessons,
                summary.colles
            );
        }
        return Ok(());
    }

    match (student.group, student.colle_group) {
        (Some(group), _) => println!("Génération du calendrier pour le groupe {group}..."),
        (None, Some(colle)) => {
            println!("Génération du calendrier des colles pour le groupe {colle}...")
        }
        (None, None) => {}
    }
    let summary = export(&sources, &term, &student, &options, stamp)?;
    println!(
        "Calendrier enregistré dans {} ({} cours, {} colles)",
        summary.output_path.display(),
        summary.lessons,
        summary.colles
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let student = match resolve_student(&cli) {
        Ok(student) => student,
        Err(message) => {
            println!("{message}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli, student) {
        eprintln!("Erreur : {e:#}");
        process::exit(1);
    }
}
