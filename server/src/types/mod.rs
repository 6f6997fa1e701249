pub mod domain;
pub mod ids;

pub use domain::{MediaProfile, MediaStatus, PosterType, ReadStatus, SeriesStatus};
pub use ids::{CollectionId, LibraryId, ReadListId, SeriesId, UserId};
