#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Direction, Distribution, LayoutOptions, load_options, parse_options};
pub use ir::{EdgeRef, GraphInput, HandleId, NodeRef, Point};
pub use layout::{
    Bounds, LayoutError, LayoutGeneration, LayoutResult, LayoutSource, LayoutTicket,
    compute_hierarchical_layout, compute_hierarchical_layout_with, compute_layout,
};
pub use viewport::{ViewportCoordinator, ViewportSurface};
