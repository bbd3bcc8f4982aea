pub mod animation;
pub mod banner;
pub mod config;
pub mod content;
pub mod error;
pub mod input;
pub mod models;
pub mod net;
pub mod renderer;
pub mod state;
pub mod util;

// Convenient re-exports (so call sites can do `joecowin::Registry`, etc.)
pub use content::Site;
pub use state::{
    registry::Registry,
    session::{Protocol, Session},
};
