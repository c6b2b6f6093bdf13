#![allow(dead_code)]

pub mod engine;
pub mod integration;
pub mod utils;
