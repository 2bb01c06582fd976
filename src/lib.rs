pub mod config;
pub mod content;
pub mod costsim;
pub mod decision;
pub mod output;
pub mod scoring;
