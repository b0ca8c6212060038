//! Microphone capture adapters

mod cpal_microphone;

pub use cpal_microphone::CpalMicrophone;
