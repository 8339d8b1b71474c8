//! Catalog Admin library.
//!
//! The admin panel as a library, so routes and the resource engine can be
//! tested and reused by the CLI.
//!
//! Resources are described in [`resources`] and rendered by the generic
//! engine in [`resource`] and [`routes`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod resource;
pub mod resources;
pub mod routes;
pub mod services;
pub mod state;
pub mod widgets;
