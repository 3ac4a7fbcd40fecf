use std::fmt;

use chrono::{DateTime, Utc};
use portal_core::model::{Course, CourseDraft, CourseId, LessonDraft, PhoneNumber, Pin, User};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    phone: String,
    course_title: String,
    lessons: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidLessons { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PORTAL_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut phone =
            std::env::var("PORTAL_SEED_PHONE").unwrap_or_else(|_| "+911234567890".into());
        let mut course_title = std::env::var("PORTAL_SEED_COURSE")
            .unwrap_or_else(|_| "Electronics Basics".into());
        let mut lessons = std::env::var("PORTAL_SEED_LESSONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--phone" => {
                    phone = require_value(&mut args, "--phone")?;
                }
                "--course-title" => {
                    course_title = require_value(&mut args, "--course-title")?;
                }
                "--lessons" => {
                    let value = require_value(&mut args, "--lessons")?;
                    lessons = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            phone,
            course_title,
            lessons,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --phone <e164>            Demo user phone (default: +911234567890)");
    eprintln!("  --course-title <name>     Demo course title (default: Electronics Basics)");
    eprintln!("  --lessons <n>             Number of demo lessons (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PORTAL_DB_URL, PORTAL_SEED_PHONE, PORTAL_SEED_COURSE, PORTAL_SEED_LESSONS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let phone = PhoneNumber::new(&args.phone)?;
    if storage.users.get_user(&phone).await?.is_none() {
        let user = User::new(
            phone.clone(),
            "Demo",
            "Learner",
            "demo.learner@example.com",
            Pin::new("1234")?,
            now,
        )?;
        storage.users.insert_user(&user).await?;
    }

    let topics = [
        ("Voltage and Current", "What the numbers on a multimeter mean"),
        ("Resistors in Practice", "Reading color bands and picking values"),
        ("Capacitors", "Charge, discharge, and smoothing"),
        ("Your First Circuit", "A blinking LED on a breadboard"),
    ];
    let lesson_drafts: Vec<LessonDraft> = (0..args.lessons)
        .map(|i| {
            let (title, description) = topics[(i as usize) % topics.len()];
            LessonDraft {
                title: format!("{} ({})", title, i + 1),
                description: description.to_owned(),
                video_url: format!("https://youtu.be/demo{:03}", i + 1),
                duration_mins: 8 + (i % 5),
            }
        })
        .collect();

    let draft = CourseDraft {
        title: args.course_title.clone(),
        description: "A gentle, hands-on introduction.".to_owned(),
        category: "Electronics".to_owned(),
        language: "English".to_owned(),
        owner: "Demo Academy".to_owned(),
        learning_points: "Read schematics\nUse a multimeter\nBuild a first circuit".to_owned(),
        lessons: lesson_drafts,
    };

    let (course, lessons): (Course, _) = draft.validate(CourseId::new_random(), now)?;
    let lesson_ids = storage.courses.insert_course(&course, &lessons).await?;

    println!(
        "Seeded user {} and course {} ({}) with {} lessons into {}",
        phone,
        course.title(),
        course.id(),
        lesson_ids.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
