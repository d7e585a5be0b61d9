//! DashScope (Alibaba Cloud Model Studio) integration.

mod client;
mod dto;

pub use client::{api_key_from_env, DashScopeClient, PROVIDER_NAME};
