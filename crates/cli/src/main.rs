use clap::{Parser, Subcommand};
use medai_core::{
    derive_events, expand_course, normalize, parse_medicine_guesses, CalendarEvent, CoreConfig,
    GoogleImageSearch, HttpOcrClient, ReminderSession, ReminderStore, ReminderUpdate,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medai")]
#[command(about = "MedAI prescription and reminder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Strip OCR noise from text
    Normalize {
        /// Text to clean up
        text: String,
    },
    /// Parse OCR output into medicine records
    Parse {
        /// JSON file holding either the full OCR response or just its `medicine_data` array
        file: PathBuf,
    },
    /// Read a prescription photo and print the seeded reminders
    Extract {
        /// Image file to send to the OCR service
        image: PathBuf,
        /// Do not wait for image lookups before printing
        #[arg(long)]
        no_images: bool,
    },
    /// Print calendar events for a reminder list
    Calendar {
        /// JSON array of reminders (`medicine`, `dosage`, `time`, `daysToTake`)
        file: PathBuf,
        /// Day to place events on (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Expand every daily dose over each reminder's course
        #[arg(long)]
        course: bool,
    },
}

/// One reminder as written in a calendar input file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderInput {
    #[serde(default)]
    medicine: String,
    #[serde(default)]
    dosage: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    days_to_take: Option<u32>,
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Accepts a full OCR response or a bare guesses array.
fn guesses_from(value: &Value) -> &Value {
    value.get("medicine_data").unwrap_or(value)
}

fn build_store(inputs: Vec<ReminderInput>) -> Result<ReminderStore, Box<dyn std::error::Error>> {
    let mut store = ReminderStore::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let id = store.add();
        let mut updates = vec![
            ReminderUpdate::Medicine(input.medicine),
            ReminderUpdate::Dosage(input.dosage),
            ReminderUpdate::Time(input.time),
        ];
        if let Some(days) = input.days_to_take {
            updates.push(ReminderUpdate::DaysToTake(days));
        }
        for update in updates {
            store
                .update(id, update)
                .map_err(|e| format!("reminder {}: {}", index, e))?;
        }
    }
    Ok(store)
}

fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("No scheduled reminders.");
        return;
    }
    for event in events {
        println!("{}  {}  [{}]", event.start.format("%Y-%m-%d %H:%M"), event.title, event.id);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medai_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalize { text }) => {
            println!("{}", normalize(&text));
        }
        Some(Commands::Parse { file }) => {
            let value = read_json(&file)?;
            let records = parse_medicine_guesses(guesses_from(&value));
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Some(Commands::Extract { image, no_images }) => {
            let cfg = CoreConfig::resolve(|key| std::env::var(key).ok())?;
            let ocr = HttpOcrClient::new(&cfg)?;
            let session = ReminderSession::new(GoogleImageSearch::from_config(&cfg)?);

            let bytes = std::fs::read(&image)
                .map_err(|e| format!("failed to read {}: {}", image.display(), e))?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "prescription.jpg".into());

            match session.extract(&ocr, bytes, &file_name).await {
                Ok(summary) => {
                    println!("Text: {}", summary.extracted_text);
                    if !no_images {
                        session.settle().await;
                    }
                    println!("{}", serde_json::to_string_pretty(&session.snapshot().await)?);
                }
                Err(e) => eprintln!("Error reading prescription: {}", e),
            }
        }
        Some(Commands::Calendar { file, date, course }) => {
            let inputs: Vec<ReminderInput> = serde_json::from_value(read_json(&file)?)?;
            let store = build_store(inputs)?;
            let day = date.unwrap_or_else(|| chrono::Local::now().date_naive());

            let events = if course {
                expand_course(store.entries(), day)
            } else {
                derive_events(store.entries(), day)
            };
            print_events(&events);
        }
        None => {
            println!("Use 'medai --help' for commands");
        }
    }

    Ok(())
}
