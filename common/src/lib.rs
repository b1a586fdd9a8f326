//! Shared ledger primitives for the TokenBank tooling.
//!
//! `storage` projects raw contract storage words into typed records without
//! going through contract getters, `rpc` defines the node collaborator the rest
//! of the workspace talks to, and `abi` encodes the static calls both sides need.

pub mod abi;
pub mod config;
pub mod crypto;
pub mod rpc;
pub mod storage;
pub mod units;

#[cfg(feature = "logger")]
pub mod logger;

#[cfg(feature = "clap")]
// Colored help output for the binaries
pub fn get_cli_styles() -> clap::builder::Styles {
    use clap::builder::styling::*;

    let heading = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    let failure = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));

    clap::builder::Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(failure)
        .error(failure)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
}
