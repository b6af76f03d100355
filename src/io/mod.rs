// Purpose - input collaborators that turn device events into note identities

pub mod keyboard;

pub use keyboard::KeyboardMapping;
