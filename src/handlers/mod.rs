//! Host-facing handlers

pub mod turn_handler;

pub use turn_handler::DialogTurnHandler;
