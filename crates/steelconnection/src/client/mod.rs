// SteelConnect Manager connection
//
// `connection` owns transport and the request verbs. The remaining modules add
// inherent methods for bootstrap, controller information, lookups and the
// image workflow.

mod bootstrap;
pub mod connection;
pub mod image;
pub mod lookup;
pub mod system;

pub use connection::{Body, ByteStream, CHUNK_SIZE, Namespace, Params, SConnect, SConnectBuilder};
pub use image::{DownloadOptions, ImageProgress, PrintProgress, SilentProgress};
pub use lookup::LookUp;
