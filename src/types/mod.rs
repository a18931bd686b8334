mod bitmap;
mod event;
mod key;

pub use bitmap::{Bitmap, BitmapOrigin, PixelFormat};
pub use event::{Lookup, ThumbnailPayload, ThumbnailReady};
pub use key::CacheKey;
