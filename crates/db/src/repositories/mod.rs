//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that must commit
//! together with other writes take a caller-owned `sqlx::Transaction`
//! instead and are suffixed `_in_tx`.

pub mod assignment_repo;
pub mod availability_repo;
pub mod event_repo;
pub mod instrument_repo;
pub mod musician_repo;
pub mod notification_job_repo;
pub mod song_repo;
pub mod user_repo;

pub use assignment_repo::AssignmentRepo;
pub use availability_repo::AvailabilityRepo;
pub use event_repo::EventRepo;
pub use instrument_repo::InstrumentRepo;
pub use musician_repo::MusicianRepo;
pub use notification_job_repo::NotificationJobRepo;
pub use song_repo::SongRepo;
pub use user_repo::UserRepo;
