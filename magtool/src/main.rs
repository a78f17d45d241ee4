// magtool -- command line utility for MSR605-family magnetic stripe
// reader/writers.
//
// Usage:
//   magtool read
//   magtool read --format iso
//   magtool write --data 'TRACK ONE|123|456'
//   echo 'TRACK ONE|123|456' | magtool write
//   magtool erase --tracks 1,3
//   magtool --device usb read
//   MAGTOOL_DEV=/dev/ttyUSB1 magtool --hico write --format hex --data '1b2c|<|>'
//   magtool raw v
//   magtool version

use std::io::Read as _;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use maglib::convert::{self, Format};
use maglib::msr::{MsrBuilder, MsrDevice};
use maglib::transport::{HidTransport, SerialTransport};
use maglib::{Coercivity, Track, TrackSelection, Transport};

/// Default serial device when neither --device nor $MAGTOOL_DEV is set.
const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Environment variable overriding the default device.
const DEVICE_ENV: &str = "MAGTOOL_DEV";

/// Reserved device value selecting the USB HID transport (MSR605X).
const USB_DEVICE: &str = "usb";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Read, write and erase MSR605-family magnetic stripe cards.
#[derive(Parser)]
#[command(name = "magtool", version, about)]
struct Cli {
    /// Device to use: a serial port path, or "usb" for the MSR605X HID
    /// transport. Defaults to $MAGTOOL_DEV, then /dev/ttyUSB0.
    #[arg(long, short = 'D')]
    device: Option<String>,

    /// Do NOT issue a reset before the main command.
    #[arg(long, short = 'R')]
    no_reset: bool,

    /// Run the command in high-coercivity mode, returning to low
    /// coercivity afterwards.
    #[arg(long, short = 'H')]
    hico: bool,

    /// Reply timeout in milliseconds. Reads and writes wait this long for
    /// a card swipe.
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the card and print its tracks as a '|'-delimited line.
    Read {
        /// Output data format.
        #[arg(long, short = 't', value_enum, default_value_t = CliFormat::Ascii)]
        format: CliFormat,
    },

    /// Write the card from '|'-delimited track data (stdin or --data).
    ///
    /// An empty field preserves that track.
    Write {
        /// Data to write; read from stdin when omitted.
        #[arg(long, short = 'd')]
        data: Option<String>,

        /// Input data format.
        #[arg(long, short = 't', value_enum, default_value_t = CliFormat::Ascii)]
        format: CliFormat,
    },

    /// Erase tracks.
    Erase {
        /// Tracks to erase, e.g. "1,3".
        #[arg(long, short = 't', default_value = "1,2,3")]
        tracks: String,
    },

    /// Send a raw escape command and print the reply as hex.
    Raw {
        /// Command payload; sent as ESC + payload.
        data: String,
    },

    /// Query the device firmware version.
    Version,
}

/// Track data format, as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliFormat {
    /// 7-bit clean text (ASCII data mode).
    Ascii,
    /// Lowercase hex of the raw track bytes (raw data mode).
    Hex,
    /// The track's ISO 7811 alphabet (raw data mode).
    Iso,
}

impl From<CliFormat> for Format {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Ascii => Format::Ascii,
            CliFormat::Hex => Format::Hex,
            CliFormat::Iso => Format::Iso,
        }
    }
}

// ---------------------------------------------------------------------------
// Device selection
// ---------------------------------------------------------------------------

/// Resolve the device address: --device flag, then $MAGTOOL_DEV, then the
/// fixed default path.
fn resolve_device(cli: &Cli) -> String {
    cli.device
        .clone()
        .or_else(|| std::env::var(DEVICE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_DEVICE.to_string())
}

/// Open the transport named by the device address. The reserved value
/// "usb" selects the MSR605X HID transport; anything else is a serial
/// port path.
fn open_transport(device: &str) -> Result<Box<dyn Transport>> {
    if device == USB_DEVICE {
        Ok(Box::new(HidTransport::open()?))
    } else {
        Ok(Box::new(SerialTransport::open(device)?))
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

/// Convert and validate a '|'-delimited write input line into per-track
/// wire payloads. Empty fields preserve their track.
fn prepare_write(input: &str, format: Format) -> Result<[Option<Vec<u8>>; 3]> {
    let fields = convert::split_tracks(input)?;
    let mut tracks: [Option<Vec<u8>>; 3] = [None, None, None];
    for (track, field) in Track::ALL.iter().zip(fields) {
        if !field.is_empty() {
            tracks[track.index()] = Some(convert::to_raw(format, field, *track)?);
        }
    }
    Ok(tracks)
}

fn read_stdin_line() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading track data from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn do_read(msr: &mut MsrDevice, format: Format) -> Result<()> {
    let card = msr.read()?;
    let mut fields: [String; convert::TRACK_COUNT] = Default::default();
    for track in Track::ALL {
        fields[track.index()] = convert::from_raw(format, card.track(track), track)?;
    }
    println!("{}", convert::join_tracks(&fields));
    Ok(())
}

fn do_erase(msr: &mut MsrDevice, tracks: &str) -> Result<()> {
    let selection: TrackSelection = tracks.parse()?;
    msr.erase(selection)?;
    Ok(())
}

fn do_raw(msr: &mut MsrDevice, data: &str) -> Result<()> {
    let reply = msr.raw_command(data.as_bytes())?;
    println!("{}", hex::encode(&reply));
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Validate and convert write input before any device I/O, so malformed
    // data never reaches (or resets) the device.
    let write_payload = match &cli.command {
        Command::Write { data, format } => {
            let input = match data {
                Some(data) => data.clone(),
                None => read_stdin_line()?,
            };
            Some(prepare_write(&input, Format::from(*format))?)
        }
        _ => None,
    };

    let mode = match &cli.command {
        Command::Read { format } | Command::Write { format, .. } => {
            Format::from(*format).implied_mode()
        }
        _ => maglib::DataMode::Ascii,
    };

    let device = resolve_device(&cli);
    let transport = open_transport(&device).with_context(|| format!("opening device {device}"))?;
    let mut msr = MsrBuilder::new()
        .mode(mode)
        .command_timeout(Duration::from_millis(cli.timeout_ms))
        .build_with_transport(transport);

    if !cli.no_reset {
        msr.reset()?;
    }
    if cli.hico {
        msr.set_coercivity(Coercivity::High)?;
    }

    match &cli.command {
        Command::Read { format } => do_read(&mut msr, Format::from(*format))?,
        Command::Write { .. } => {
            if let Some(tracks) = &write_payload {
                msr.write(tracks)?;
            }
        }
        Command::Erase { tracks } => do_erase(&mut msr, tracks)?,
        Command::Raw { data } => do_raw(&mut msr, data)?,
        Command::Version => println!("{}", msr.firmware_version()?),
    }

    // Return to low coercivity once the command has succeeded.
    if cli.hico {
        msr.set_coercivity(Coercivity::Low)?;
    }

    Ok(())
}
