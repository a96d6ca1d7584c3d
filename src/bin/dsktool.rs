/// Capture and restore console for CPC floppy disks

use dsktools::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process::ExitCode;

/// Environment variable overriding the default floppy device
const DEVICE_ENV: &str = "DSKTOOL_DEVICE";

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "device", "exit", "format", "help", "info", "quit", "read", "tracks", "write",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".dsktool_history");
        p
    })
}

/// Settings that persist between console commands
struct Session {
    device: String,
    preset: String,
    geometry: Geometry,
}

impl Session {
    fn new() -> Self {
        Self {
            device: std::env::var(DEVICE_ENV).unwrap_or_else(|_| DEFAULT_DEVICE.to_string()),
            preset: "data".to_string(),
            geometry: Geometry::cpc_data(),
        }
    }
}

/// What the console should do after a command
enum Flow {
    Continue,
    Quit,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut session = Session::new();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return match run_command(&mut session, &args) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    println!("=== dsktool ===");
    println!("Capture and restore Amstrad CPC floppy disks.");
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    // Load history if available
    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }

        match run_command(&mut session, &parts) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("Error: {}", e),
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    println!("Goodbye!");
    ExitCode::SUCCESS
}

fn run_command(session: &mut Session, parts: &[String]) -> Result<Flow> {
    let command = parts[0].to_lowercase();
    let arg = |index: usize| parts.get(index).map(String::as_str);

    match command.as_str() {
        "help" => print_help(),
        "quit" | "exit" => return Ok(Flow::Quit),
        "read" => match arg(1) {
            Some(path) => {
                let device = arg(2).unwrap_or(session.device.as_str()).to_string();
                capture(&session.geometry, &device, path)?;
            }
            None => println!("Usage: read <file> [device]"),
        },
        "write" => match arg(1) {
            Some(path) => {
                let device = arg(2).unwrap_or(session.device.as_str()).to_string();
                restore(&device, path)?;
            }
            None => println!("Usage: write <file> [device]"),
        },
        "info" => match arg(1) {
            Some(path) => print_info(&DiskImage::open(path)?),
            None => println!("Usage: info <file>"),
        },
        "tracks" => match arg(1) {
            Some(path) => list_tracks(&DiskImage::open(path)?),
            None => println!("Usage: tracks <file>"),
        },
        "device" => match arg(1) {
            Some(path) => {
                session.device = path.to_string();
                println!("Device: {}", session.device);
            }
            None => println!("Device: {}", session.device),
        },
        "format" => match arg(1) {
            Some(name) => match Geometry::preset(name) {
                Some(geometry) => {
                    session.geometry = geometry;
                    session.preset = name.to_lowercase();
                    print_geometry(&session.preset, &session.geometry);
                }
                None => println!("Unknown format '{}'. Use data, system or ibm.", name),
            },
            None => print_geometry(&session.preset, &session.geometry),
        },
        _ => println!(
            "Unknown command: '{}'. Type 'help' for available commands.",
            command
        ),
    }

    Ok(Flow::Continue)
}

fn capture(geometry: &Geometry, device: &str, path: &str) -> Result<()> {
    let report = with_drive(device, |drive| {
        let file = create_file(path)?;
        TransferEngine::new(drive).capture(geometry, BufWriter::new(file))
    })?;

    println!("Captured {} from {}: {}", path, device, report);
    for failure in &report.failed {
        println!("  unreadable: {}", failure);
    }
    Ok(())
}

fn restore(device: &str, path: &str) -> Result<()> {
    let file = open_file(path)?;
    let report = with_drive(device, |drive| {
        TransferEngine::new(drive).restore(BufReader::new(file))
    })?;

    println!("Wrote {} to {}: {}", path, device, report);
    Ok(())
}

#[cfg(target_os = "linux")]
fn with_drive<T>(device: &str, f: impl FnOnce(&mut dyn Drive) -> Result<T>) -> Result<T> {
    let mut drive = FloppyDevice::open(device)?;
    f(&mut drive)
}

#[cfg(not(target_os = "linux"))]
fn with_drive<T>(device: &str, _f: impl FnOnce(&mut dyn Drive) -> Result<T>) -> Result<T> {
    Err(DskError::DeviceUnavailable {
        path: device.into(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "raw floppy access is only available on Linux",
        ),
    })
}

fn open_file(path: &str) -> Result<File> {
    File::open(path).map_err(|source| DskError::DeviceUnavailable {
        path: Path::new(path).to_path_buf(),
        source,
    })
}

fn create_file(path: &str) -> Result<File> {
    File::create(path).map_err(|source| DskError::DeviceUnavailable {
        path: Path::new(path).to_path_buf(),
        source,
    })
}

fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(current.clone());
                    current.clear();
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  read <file> [device]     - Capture the disk in the drive to a DSK file");
    println!("  write <file> [device]    - Format the disk in the drive and write a DSK file to it");
    println!("  info <file>              - Show DSK header information");
    println!("  tracks <file>            - List tracks and sector IDs of a DSK file");
    println!("  device [path]            - Show or set the floppy device (default {})", DEFAULT_DEVICE);
    println!("  format [data|system|ibm] - Show or set the layout used by read");
    println!("  help                     - Show this help");
    println!("  quit, exit               - Exit");
}

fn print_geometry(name: &str, geometry: &Geometry) {
    println!("Format: {}", name);
    println!("Tracks: {}", geometry.num_tracks);
    println!("Sectors per track: {}", geometry.sectors_per_track);
    println!("Sector size: {} bytes", geometry.sector_size());
    println!("First sector ID: {:02X}", geometry.first_sector_id);
    println!("Gap: {:02X}  Filler: {:02X}", geometry.gap3_length, geometry.filler_byte);
}

fn print_info(image: &DiskImage) {
    println!("{}", image.info());
    println!("Format: {}", image.format().name());
    println!("Track records: {}", image.track_count());
    println!("Total data: {} KB", image.total_size() / 1024);
}

fn list_tracks(image: &DiskImage) {
    println!(
        "{:<6} {:<5} {:<5} {:<8} {:<4} {:<7} {}",
        "Track", "Side", "Size", "Sectors", "Gap", "Filler", "IDs"
    );
    println!("{}", "-".repeat(69));

    for track in image.tracks() {
        let info = &track.info;
        let ids: Vec<String> = info
            .sectors
            .iter()
            .map(|s| {
                let mark = if s.is_deleted() {
                    "d"
                } else if s.has_error() {
                    "!"
                } else {
                    ""
                };
                format!("{:02X}{}", s.id.sector, mark)
            })
            .collect();
        println!(
            "{:<6} {:<5} {:<5} {:<8} {:<4} {:<7} {}",
            info.track_number,
            info.side_number,
            info.size_code,
            info.sector_count(),
            format!("{:02X}", info.gap3_length),
            format!("{:02X}", info.filler_byte),
            ids.join(" ")
        );
    }
}
