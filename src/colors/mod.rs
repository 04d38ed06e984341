pub mod contrast;
pub mod store;
pub mod prefs;

pub use contrast::{contrast_ratio, ensure_contrast, ColorError, Rgb, MIN_CONTRAST};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use prefs::{ColorPair, ColorPrefs};
