pub mod contribution;
pub mod error;
pub mod export;
mod id;
pub mod identity;
pub mod jobs;
pub mod library;
pub mod logging;
pub mod model;
pub mod report;
pub mod sample_size;
pub mod schedule;
pub mod session;
pub mod store;
mod time;

pub use error::{AppError, AppResult};
pub use export::{ReportPayload, FORMAT_VERSION};
pub use jobs::{JobDirectory, JobStatus, MemoryJobDirectory, RemoteJob, SqliteJobDirectory};
pub use model::{
    Board, Classification, Defect, InspectionMeta, InspectionState, Instrument, LibraryDefect,
    Measurements, MeasurementsPatch, MetaPatch,
};
pub use session::InspectionSession;
pub use store::StoreHandle;
pub use time::{now_ms, today};
