use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use leafwise_report::history::{self, HistoryStore};
use leafwise_report::{AttributeRecord, Error, ReportConfig, SourceImage, summary};

#[derive(Parser, Debug)]
#[command(version, about = "Compose printable plant identification reports")]
struct Cli {
    /// Report configuration (JSON); missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font used for body text instead of Helvetica
    #[arg(long, global = true)]
    body_font: Option<PathBuf>,

    /// History file [default: $XDG_DATA_HOME/leafwise/history.json]
    #[arg(long, global = true)]
    history_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a PDF report
    Export {
        /// Attribute record (JSON)
        #[arg(long, conflicts_with = "from_history")]
        record: Option<PathBuf>,

        /// Plant photo (JPEG, PNG, GIF or WebP)
        #[arg(long, conflicts_with = "from_history")]
        image: Option<PathBuf>,

        /// Export a history entry instead; 0 is the most recent
        #[arg(long)]
        from_history: Option<usize>,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Also add the record and photo to the history
        #[arg(long, conflicts_with = "from_history")]
        remember: bool,
    },
    /// Inspect or change the identification history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Print a record as plain text
    Text {
        #[arg(long)]
        record: PathBuf,

        #[arg(long, value_enum, default_value_t = TextStyle::Speech)]
        style: TextStyle,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    Clear,
    Add {
        #[arg(long)]
        record: PathBuf,
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TextStyle {
    Speech,
    Clipboard,
}

fn load_config(cli: &Cli) -> Result<ReportConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(font) = &cli.body_font {
        config.body_font = Some(font.clone());
    }
    Ok(config)
}

fn open_history(cli: &Cli) -> Result<HistoryStore, Error> {
    let path = cli.history_file.clone().unwrap_or_else(history::default_path);
    HistoryStore::open(&path)
}

fn read_optional<T>(
    path: Option<&Path>,
    read: impl FnOnce(&Path) -> Result<T, Error>,
) -> Result<Option<T>, Error> {
    path.map(read).transpose()
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Command::Export {
            record,
            image,
            from_history,
            out_dir,
            remember,
        } => {
            let config = load_config(cli)?;
            let (record, image) = match from_history {
                Some(index) => {
                    let store = open_history(cli)?;
                    let entry = store.get(*index).ok_or_else(|| {
                        Error::History(format!(
                            "no entry {index}; the history holds {}",
                            store.len()
                        ))
                    })?;
                    (Some(entry.result.clone()), Some(entry.source_image()))
                }
                None => (
                    read_optional(record.as_deref(), AttributeRecord::from_file)?,
                    read_optional(image.as_deref(), SourceImage::from_file)?,
                ),
            };
            let path = leafwise_report::export_report_to_dir(
                record.as_ref(),
                image.as_ref(),
                &config,
                out_dir,
            )?;
            if *remember
                && let (Some(record), Some(image)) = (&record, &image)
            {
                open_history(cli)?.add(image, record)?;
            }
            println!("{}", path.display());
        }
        Command::History { action } => {
            let mut store = open_history(cli)?;
            match action {
                HistoryAction::List => {
                    if store.is_empty() {
                        println!("history is empty");
                    }
                    for (i, entry) in store.entries().iter().enumerate() {
                        println!(
                            "{i}  {}  {} ({})",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.result.common_name,
                            entry.result.scientific_name
                        );
                    }
                }
                HistoryAction::Clear => {
                    store.clear()?;
                    println!("history cleared");
                }
                HistoryAction::Add { record, image } => {
                    let record = AttributeRecord::from_file(record)?;
                    let image = SourceImage::from_file(image)?;
                    let entry = store.add(&image, &record)?;
                    println!("added {}", entry.id);
                }
            }
        }
        Command::Text { record, style } => {
            let record = AttributeRecord::from_file(record)?;
            let text = match style {
                TextStyle::Speech => summary::speech_text(&record),
                TextStyle::Clipboard => summary::clipboard_text(&record),
            };
            println!("{text}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
