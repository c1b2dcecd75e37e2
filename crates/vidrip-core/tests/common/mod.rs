#![allow(dead_code)]

pub mod cdn_server;
pub mod tar_builder;
