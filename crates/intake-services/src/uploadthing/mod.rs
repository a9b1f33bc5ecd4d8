//! UploadThing remote storage.

mod client;
mod types;

pub use client::UploadThingClient;
