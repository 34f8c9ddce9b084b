//! Command-line access to a B15F lab board: every driver operation as a
//! subcommand, with optional port pinning through a config file.
//!
//! The port to talk to is resolved in this order: the `--port` flag, the
//! `default_port` from the config file, then auto-discovery across all
//! serial ports.

use b15f::config;
use b15f::{discover_with_timeout, list_ports, AnalogPort, B15F, DigitalPort, NativePort};
use clap::{Parser, Subcommand};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "b15fctl")]
#[command(about = "Control a B15F lab board over its serial link")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Serial port to use, overriding the config file and auto-discovery
    #[arg(long, short = 'p')]
    port: Option<String>,

    /// Log filter: error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// List candidate serial ports, most promising first
    Ports,
    /// Scan for the board and report where it answered
    Probe,
    /// Run the echo handshake against the resolved port
    Test,
    /// Trigger the board's built-in self test
    SelfTest,
    /// Resynchronise a wedged connection
    Discard,
    /// Write a byte to a digital port
    Dw {
        /// Digital port index
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        port: u8,
        /// Value to write
        value: u8,
    },
    /// Read a byte from a digital port
    Dr {
        /// Digital port index
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        port: u8,
    },
    /// Read the DIP switch bank
    Dip,
    /// Write a 10-bit value to a DAC output
    Aw {
        /// DAC output index
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        port: u8,
        /// Value to write
        #[arg(value_parser = clap::value_parser!(u16).range(0..=1023))]
        value: u16,
    },
    /// Sample an ADC channel
    Ar {
        /// ADC channel
        #[arg(value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: u8,
    },
    /// Set the PWM base frequency in hertz
    PwmFreq {
        /// Requested frequency
        hz: f32,
    },
    /// Set the PWM duty cycle value
    Pwm {
        /// Duty cycle value
        value: u8,
    },
    /// Servo control
    Servo {
        #[command(subcommand)]
        action: ServoAction,
    },
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ServoAction {
    /// Power the servo output
    Enable,
    /// Cut power to the servo output
    Disable,
    /// Move to a pulse width in microseconds
    Pos {
        /// Pulse width in microseconds
        #[arg(value_parser = clap::value_parser!(u16).range(0..=19000))]
        us: u16,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the stored configuration and its location
    Show,
    /// Pin the serial port used by default
    SetPort {
        /// Port name, e.g. /dev/ttyUSB0
        name: String,
    },
    /// Forget the pinned serial port
    ClearPort,
    /// Set the per-port probe timeout in milliseconds
    SetTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn init_logging(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> b15f::Result<()> {
    match cli.command {
        Command::Ports => cmd_ports(),
        Command::Probe => cmd_probe(),
        Command::Config { action } => cmd_config(action),
        command => {
            let mut board = resolve_board(cli.port.as_deref())?;
            cmd_board(&mut board, command)
        }
    }
}

fn cmd_ports() -> b15f::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    for info in ports {
        println!("{}\t{}", info.port_name, describe_port_type(&info.port_type));
    }
    Ok(())
}

fn cmd_probe() -> b15f::Result<()> {
    let config = config::load()?;
    let board = discover_with_timeout(Duration::from_millis(config.probe_timeout_ms))?;
    match board.port_name() {
        Some(name) => println!("B15F board found on {}", name),
        None => println!("B15F board found"),
    }
    Ok(())
}

fn cmd_config(action: ConfigAction) -> b15f::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = config::load()?;
            println!("# {}", config::config_path().display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetPort { name } => {
            let mut config = config::load()?;
            config.default_port = Some(name);
            config::save(&config)?;
        }
        ConfigAction::ClearPort => {
            let mut config = config::load()?;
            config.default_port = None;
            config::save(&config)?;
        }
        ConfigAction::SetTimeout { ms } => {
            let mut config = config::load()?;
            config.probe_timeout_ms = ms;
            config::save(&config)?;
        }
    }
    Ok(())
}

fn cmd_board(board: &mut B15F<NativePort>, command: Command) -> b15f::Result<()> {
    match command {
        Command::Test => {
            if board.test_connection()? {
                println!("echo test passed");
            } else {
                println!("echo test failed: device answered with a wrong byte");
                process::exit(1);
            }
        }
        Command::SelfTest => {
            board.self_test()?;
            println!("self test started");
        }
        Command::Discard => {
            board.discard()?;
            println!("connection resynchronised");
        }
        Command::Dw { port, value } => {
            board.digital_write(digital_port(port), value)?;
        }
        Command::Dr { port } => {
            let value = board.digital_read(digital_port(port))?;
            println!("{:#010b} ({})", value, value);
        }
        Command::Dip => {
            let value = board.read_dip_switch()?;
            println!("{:#010b} ({})", value, value);
        }
        Command::Aw { port, value } => {
            board.analog_write(analog_port(port), value)?;
        }
        Command::Ar { channel } => {
            let value = board.analog_read(channel)?;
            println!("{}", value);
        }
        Command::PwmFreq { hz } => {
            let prescaler = board.set_pwm_frequency(hz)?;
            println!("prescaler code {}", prescaler);
        }
        Command::Pwm { value } => {
            board.set_pwm_value(value)?;
        }
        Command::Servo { action } => match action {
            ServoAction::Enable => board.servo_enable()?,
            ServoAction::Disable => board.servo_disable()?,
            ServoAction::Pos { us } => board.servo_set_position(us)?,
        },
        // Handled in run() before a board is resolved.
        Command::Ports | Command::Probe | Command::Config { .. } => unreachable!(),
    }
    Ok(())
}

fn resolve_board(flag_port: Option<&str>) -> b15f::Result<B15F<NativePort>> {
    let config = config::load()?;
    let timeout = Duration::from_millis(config.probe_timeout_ms);
    if let Some(name) = flag_port {
        return B15F::connect_with_timeout(name, timeout);
    }
    if let Some(name) = &config.default_port {
        return B15F::connect_with_timeout(name, timeout);
    }
    discover_with_timeout(timeout)
}

// Indices are range-checked by clap before they reach these.
fn digital_port(index: u8) -> DigitalPort {
    match index {
        0 => DigitalPort::Port0,
        _ => DigitalPort::Port1,
    }
}

fn analog_port(index: u8) -> AnalogPort {
    match index {
        0 => AnalogPort::Port0,
        _ => AnalogPort::Port1,
    }
}

fn describe_port_type(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(usb) => {
            format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
        }
        serialport::SerialPortType::PciPort => "PCI".to_string(),
        serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        serialport::SerialPortType::Unknown => "unknown".to_string(),
    }
}
