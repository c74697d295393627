pub mod error;
pub mod formats;

pub use error::{StudioError, StudioResult, ValidationError};
pub use formats::ImageFormat;
