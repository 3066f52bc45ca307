//! Name → factory table for pluggable USB device types.
//!
//! The machine configuration refers to devices by type name (for example `usb-xblc`) and hands a
//! JSON property bag to the factory. Device modules install themselves with a `register` function.

use std::collections::HashMap;
use std::sync::Arc;

use aero_audio::AudioHost;
use thiserror::Error;

use crate::usb::UsbDeviceModel;

pub type UsbDeviceFactory = Box<
    dyn Fn(&serde_json::Value, Arc<dyn AudioHost>) -> Result<Box<dyn UsbDeviceModel>, RegistryError>
        + Send
        + Sync,
>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown USB device type `{0}`")]
    UnknownType(String),

    #[error("USB device type `{0}` is already registered")]
    DuplicateType(&'static str),

    #[error("invalid properties for `{type_name}`: {source}")]
    InvalidProperties {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsbDeviceTypeInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// Audio model name used when the device is selected through an audio front-end option.
    pub audio_model: Option<&'static str>,
}

struct Entry {
    info: UsbDeviceTypeInfo,
    factory: UsbDeviceFactory,
}

#[derive(Default)]
pub struct UsbDeviceRegistry {
    types: HashMap<&'static str, Entry>,
}

impl UsbDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, info: UsbDeviceTypeInfo, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(
                &serde_json::Value,
                Arc<dyn AudioHost>,
            ) -> Result<Box<dyn UsbDeviceModel>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        if self.types.contains_key(info.name) {
            return Err(RegistryError::DuplicateType(info.name));
        }
        tracing::debug!(type_name = info.name, "registered USB device type");
        self.types.insert(
            info.name,
            Entry {
                info,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn create(
        &self,
        type_name: &str,
        props: &serde_json::Value,
        audio: Arc<dyn AudioHost>,
    ) -> Result<Box<dyn UsbDeviceModel>, RegistryError> {
        let entry = self
            .types
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;
        (entry.factory)(props, audio)
    }

    pub fn info(&self, type_name: &str) -> Option<UsbDeviceTypeInfo> {
        self.types.get(type_name).map(|e| e.info)
    }

    /// Device type backing the audio model `model`, if any.
    pub fn type_for_audio_model(&self, model: &str) -> Option<&'static str> {
        self.types
            .values()
            .find(|e| e.info.audio_model == Some(model))
            .map(|e| e.info.name)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
