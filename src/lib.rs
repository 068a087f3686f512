// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod guard;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod resource;
pub mod route;
pub mod session;
pub mod storage;
pub mod utils;

pub use context::AppContext;
pub use error::{ClientError, ClientResult, ServerRejection, ValidationError};
