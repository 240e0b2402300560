// SPDX-License-Identifier: MIT

mod cloud_config;
mod health;

pub use cloud_config::cloud_config;
pub use health::health_check;
