use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::Path;
use gesta_core::{
    classify,
    gestational::parse_formatted,
    projector::ideal_date,
    record::read_batch_file,
    run_batch,
    store::InMemoryBookingStore,
    DateParser, GaReference, GestationalAge, ParsedDate, SchedulingContext, YamlCapacityStore,
    YearPolicy,
};

#[derive(Parser)]
#[command(name = "gesta")]
#[command(about = "Gestational age and obstetric scheduling CLI")]
struct Cli {
    /// Run date (defaults to today); also anchors year-less dates
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a spreadsheet date cell
    ParseDate {
        /// Raw cell text (e.g. "05/12/2024", "2025-01-01", "25/12")
        text: String,
    },
    /// Gestational age from a DUM or an ultrasound
    Ga {
        #[command(flatten)]
        reference: ReferenceArgs,
        /// Date to compute GA at (defaults to the run date)
        #[arg(long)]
        at: Option<String>,
    },
    /// Classify diagnosis text into a protocol
    Classify {
        /// Diagnosis text
        diagnosis: String,
        #[arg(long, default_value = "")]
        medication: String,
        #[arg(long, default_value = "")]
        procedure: String,
    },
    /// Ideal scheduling date for a diagnosis and GA reference
    IdealDate {
        /// Diagnosis text
        diagnosis: String,
        #[command(flatten)]
        reference: ReferenceArgs,
        #[arg(long, default_value = "")]
        medication: String,
    },
    /// Schedule a batch file against a capacity table
    Schedule {
        /// Batch of patient records (YAML or JSON)
        batch_file: String,
        /// Capacity table (YAML)
        #[arg(long, default_value = gesta_core::constants::DEFAULT_CAPACITY_FILE)]
        capacity: String,
        /// Existing bookings (YAML or JSON)
        #[arg(long)]
        bookings: Option<String>,
    },
}

#[derive(clap::Args)]
struct ReferenceArgs {
    /// DUM (last menstrual period) date
    #[arg(long, conflicts_with = "usg_date")]
    dum: Option<String>,
    /// First ultrasound date
    #[arg(long, requires = "usg_ga")]
    usg_date: Option<String>,
    /// GA reported by the ultrasound (e.g. "12s 3d")
    #[arg(long)]
    usg_ga: Option<String>,
}

fn parse_date(parser: &DateParser, text: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    parser
        .parse(text)
        .into_result(text)?
        .ok_or_else(|| format!("{text:?} is an empty or placeholder date").into())
}

fn build_reference(
    parser: &DateParser,
    args: &ReferenceArgs,
) -> Result<GaReference, Box<dyn std::error::Error>> {
    match (&args.dum, &args.usg_date, &args.usg_ga) {
        (Some(dum), _, _) => Ok(GaReference::dum(parse_date(parser, dum)?)),
        (None, Some(date), Some(ga)) => {
            let (weeks, days) = parse_formatted(ga)?;
            Ok(GaReference::ultrasound(parse_date(parser, date)?, weeks, days)?)
        }
        _ => Err("either --dum or --usg-date with --usg-ga is required".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let policy = YearPolicy::for_run_date(today);
    let parser = DateParser::new(policy);

    match cli.command {
        Some(Commands::ParseDate { text }) => match parser.parse(&text) {
            ParsedDate::Date(d) => println!("{d}"),
            ParsedDate::Absent => println!("absent"),
            ParsedDate::Failure(reason) => eprintln!("Error parsing {text:?}: {reason}"),
        },
        Some(Commands::Ga { reference, at }) => {
            let reference = build_reference(&parser, &reference)?;
            let at = match at {
                Some(text) => parse_date(&parser, &text)?,
                None => today,
            };
            match GestationalAge::at(&reference, at) {
                Ok(ga) => println!("GA on {at}: {ga}"),
                Err(e) => eprintln!("Error computing GA: {e}"),
            }
            if let Some(due) = reference.due_date() {
                println!("Due date: {due}");
            }
        }
        Some(Commands::Classify {
            diagnosis,
            medication,
            procedure,
        }) => {
            let protocol = classify(&diagnosis, &medication, &procedure);
            println!(
                "{}: {} (ideal {}{})",
                protocol.key,
                protocol.display_name,
                protocol.window_label(),
                if protocol.is_urgent { ", urgent" } else { "" }
            );
        }
        Some(Commands::IdealDate {
            diagnosis,
            reference,
            medication,
        }) => {
            let reference = build_reference(&parser, &reference)?;
            let protocol = classify(&diagnosis, &medication, "");
            match ideal_date(&reference, protocol) {
                Some(date) => println!(
                    "{date} ({} at {}s)",
                    protocol.display_name,
                    protocol.target_weeks()
                ),
                None => eprintln!("Error: ideal date out of range"),
            }
        }
        Some(Commands::Schedule {
            batch_file,
            capacity,
            bookings,
        }) => {
            let ctx = SchedulingContext::load(&YamlCapacityStore::new(capacity), today, policy)?;
            let records = read_batch_file(Path::new(&batch_file))?;
            let mut store = match bookings {
                Some(path) => InMemoryBookingStore::from_yaml(&std::fs::read_to_string(path)?)?,
                None => InMemoryBookingStore::default(),
            };
            let report = run_batch(&ctx, &records, &mut store);
            println!("{}", report.to_json()?);
        }
        None => {
            println!("Use 'gesta --help' for commands");
        }
    }

    Ok(())
}
