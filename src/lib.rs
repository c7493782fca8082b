pub use hashmark_core::*;

#[cfg(feature = "fs")]
pub mod fs {
    pub use hashmark_fs::*;
}

#[cfg(feature = "memory")]
pub mod memory {
    pub use hashmark_memory::*;
}

#[cfg(feature = "stream")]
pub mod stream {
    pub use hashmark_stream::*;
}

pub mod prelude {
    pub use hashmark_core::prelude::*;

    #[cfg(feature = "fs")]
    pub use hashmark_fs::FileSystemStorage;

    #[cfg(feature = "memory")]
    pub use hashmark_memory::MemoryStorage;

    #[cfg(feature = "stream")]
    pub use hashmark_stream::{AssetFile, hash_files, hash_stream, save_manifest_stage};
}
