//! # CLI Module
//!
//! Command-line access to mapping documents: validate them, decode payloads
//! against a bean, and bind action parameters.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load and validate a mapping document, then list what it declares:
//!
//! ```bash
//! brutos check --mapping mapping.yaml
//! ```
//!
//! ### `decode`
//!
//! Decode a payload with one bean and print the instance as JSON:
//!
//! ```bash
//! brutos decode --mapping mapping.yaml --bean person --payload person.json
//! echo 'name=Ana&age=31' | brutos decode --mapping mapping.yaml --bean person --payload - --form
//! ```
//!
//! Options:
//! - `--payload <FILE>` - payload file, `-` for stdin (default: `{}`)
//! - `--form` - read the payload as `application/x-www-form-urlencoded`
//! - `--param <NAME>` - decode the sub-object under `NAME` instead of the
//!   whole payload
//! - `--scopes <FILE>` - JSON object of scope name to values, e.g.
//!   `{"session": {"user": "ana"}}`
//!
//! ### `bind`
//!
//! Bind every parameter of an action and print the argument list:
//!
//! ```bash
//! brutos bind --mapping mapping.yaml --action save --payload body.json
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brutos::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands, PayloadArgs};
