pub mod image_io;
pub mod npy;
pub mod pickle;
