//! Adapters that plug external clients into the engine's ports.
mod gateway;
