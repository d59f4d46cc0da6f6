pub mod youtube;

pub use youtube::{UploadMetadata, YoutubeUploader};
