use thiserror::Error;

#[derive(Error, Debug)]
pub enum B15FError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Board rejected request 0x{request:02X} with response 0x{response:02X}")]
    Nak { request: u8, response: u8 },

    #[error("No B15F board found on any serial port")]
    DeviceNotFound,

    #[error("Device on {port} is not a B15F board")]
    DeviceNotSupported { port: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, B15FError>;
