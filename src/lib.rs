pub mod caveat;
pub mod debug;
pub mod decode;
pub mod error;
pub mod render;
pub mod resolver;
pub mod token;
