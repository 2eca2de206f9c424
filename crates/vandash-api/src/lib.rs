// vandash-api: Async Rust client for the vehicle dashboard backend

pub mod app;
pub mod client;
pub mod error;
pub mod files;
pub mod inverter;
pub mod leds;
pub mod models;
pub mod sensors;
pub mod transport;

pub use client::ApiClient;
pub use error::{Error, ServerErrorBody};
pub use files::UploadFile;
pub use models::{
    FileItem, FileKind, FolderResponse, InverterStatus, LedConfigureRequest, LedPreset, LedStatus,
    LevelRating, LevelSensorData, Reading, Rgb, ShuntData, SuccessResponse, ToggleResponse,
    UploadResponse,
};
pub use transport::{TlsMode, TransportConfig};
