//! Turbo mode: block whole resource classes to simulate bandwidth savings

use crate::model::ResourceType;
use serde::{Deserialize, Serialize};

/// Profile of resource classes to suppress while turbo mode is on.
/// Blocking keys off the request's type, never its URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurboConfig {
    pub enabled: bool,
    pub block_images: bool,
    pub block_scripts: bool,
    pub block_stylesheets: bool,
    pub block_fonts: bool,
}

pub fn should_block_resource(config: &TurboConfig, resource: ResourceType) -> bool {
    if !config.enabled {
        return false;
    }
    match resource {
        ResourceType::Image => config.block_images,
        ResourceType::Script => config.block_scripts,
        ResourceType::Stylesheet => config.block_stylesheets,
        ResourceType::Font => config.block_fonts,
        ResourceType::Document | ResourceType::Xhr | ResourceType::Fetch => false,
    }
}
